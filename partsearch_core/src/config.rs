//! Configuration surface consumed from the host application.
//!
//! The surrounding plugin loads its settings file and hands the relevant
//! slice here; this crate never reads configuration from disk itself.

use serde::{Deserialize, Serialize};

use crate::types::SupplierId;

/// Default per-adapter timeout for outbound supplier calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Digi-Key OAuth2 client-credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigikeyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Mouser API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouserCredentials {
    pub api_key: String,
}

/// Optional API base-URL overrides, for suppliers reached through a proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jlcpcb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digikey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouser: Option<String>,
}

/// Everything a [`crate::session::PartSearchSession`] needs at construction.
///
/// Credentials left as `None` leave that supplier unconfigured; it still
/// appears in results with a `not_configured` outcome so the UI can tell the
/// user which credential is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digikey: Option<DigikeyCredentials>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouser: Option<MouserCredentials>,

    #[serde(default)]
    pub base_urls: BaseUrls,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Restrict searches to this subset of suppliers. `None` enables all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_suppliers: Option<Vec<SupplierId>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            digikey: None,
            mouser: None,
            base_urls: BaseUrls::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            selected_suppliers: None,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms.max(1))
    }
}

/// Declarative description of the credential fields one supplier needs.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigSchema {
    pub fields: Vec<Field>,
}

impl ConfigSchema {
    /// Actionable text for a `not_configured` outcome, naming the missing
    /// credential fields.
    pub fn missing_credentials_hint(&self, supplier: SupplierId) -> String {
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        if required.is_empty() {
            format!("{} is not configured", supplier.display_name())
        } else {
            format!(
                "{} is not configured: set {}",
                supplier.display_name(),
                required.join(", ")
            )
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum FieldType {
    Text,
    Secret, // API keys, client secrets - anything sensitive
}

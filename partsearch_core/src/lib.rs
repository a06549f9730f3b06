//! partsearch_core - concurrent BOM part lookup across supplier catalogs.
//!
//! Resolves a single component descriptor (value + footprint, optional type
//! hint) against multiple parts-sourcing backends at once and returns one
//! normalized, priority-ordered result set with a per-supplier status, even
//! when some backends are slow, unavailable, or unauthorized.
//!
//! The only entry point the host application needs is
//! [`session::PartSearchSession`]:
//!
//! ```ignore
//! use partsearch_core::{PartQuery, SearchConfig, PartSearchSession};
//!
//! let session = PartSearchSession::new(SearchConfig::default())?;
//! let result = session.search(&PartQuery::new("100K", "0402")).await?;
//! for outcome in &result.outcomes {
//!     println!("{}: {:?} ({} records)", outcome.supplier, outcome.status, outcome.records.len());
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod suppliers;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::config::{ConfigSchema, SearchConfig, DEFAULT_TIMEOUT_MS};
pub use crate::error::SupplierError;
pub use crate::session::PartSearchSession;
pub use crate::types::{
    AggregatedResult, CanonicalQuery, OutcomeStatus, PartQuery, PartRecord, SupplierId,
    SupplierOutcome,
};

/// One searchable supplier catalog.
///
/// Adapters are stateless beyond their credential configuration (Digi-Key
/// additionally caches its OAuth token); they hold no shared mutable state
/// and need no external locking. `fetch` issues exactly one outbound search
/// request - retries are the caller's decision, not the adapter's.
#[async_trait]
pub trait Supplier: Send + Sync {
    fn id(&self) -> SupplierId;

    fn description(&self) -> &'static str;

    /// False when required credentials are absent. The aggregator never
    /// calls [`Supplier::fetch`] on an unconfigured adapter.
    fn is_configured(&self) -> bool;

    /// Search the supplier catalog for the canonical query.
    ///
    /// Zero records with a parseable response body is `Ok(vec![])`, not an
    /// error. Individually malformed records are skipped during parsing; an
    /// error here means the whole call failed.
    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<PartRecord>, SupplierError>;

    /// Credential fields this supplier needs, for config UIs and for the
    /// actionable `not_configured` outcome text.
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default()
    }
}

/// Holds one adapter per supplier and hands them out in priority order.
pub struct SupplierRegistry {
    suppliers: Vec<Arc<dyn Supplier>>,
}

impl SupplierRegistry {
    pub fn new() -> Self {
        Self {
            suppliers: Vec::new(),
        }
    }

    /// Register an adapter, replacing any previous adapter for the same
    /// supplier.
    pub fn register(&mut self, supplier: Arc<dyn Supplier>) {
        self.suppliers.retain(|s| s.id() != supplier.id());
        self.suppliers.push(supplier);
    }

    pub fn get(&self, id: SupplierId) -> Option<&Arc<dyn Supplier>> {
        self.suppliers.iter().find(|s| s.id() == id)
    }

    /// Registered adapters in [`SupplierId::PRIORITY`] order.
    pub fn in_priority_order(&self) -> Vec<Arc<dyn Supplier>> {
        let mut ordered = self.suppliers.clone();
        ordered.sort_by_key(|s| s.id().priority_index());
        ordered
    }

    /// Supplier ids of adapters that currently hold credentials.
    pub fn configured(&self) -> Vec<SupplierId> {
        self.in_priority_order()
            .iter()
            .filter(|s| s.is_configured())
            .map(|s| s.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

impl Default for SupplierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry with every known supplier adapter wired from `config`.
///
/// Unconfigured credentialed suppliers are still registered so their
/// `not_configured` outcome shows up in results.
pub fn build_registry(config: &SearchConfig) -> Result<SupplierRegistry, SupplierError> {
    let mut registry = SupplierRegistry::new();

    registry.register(Arc::new(suppliers::jlcpcb::JlcpcbSupplier::new(
        config.base_urls.jlcpcb.clone(),
    )?));
    registry.register(Arc::new(suppliers::digikey::DigikeySupplier::new(
        config.digikey.clone(),
        config.base_urls.digikey.clone(),
    )?));
    registry.register(Arc::new(suppliers::mouser::MouserSupplier::new(
        config.mouser.clone(),
        config.base_urls.mouser.clone(),
    )?));

    Ok(registry)
}

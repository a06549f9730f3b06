//! Core types for part search queries and aggregated results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A supplier catalog that can be searched.
///
/// The variant order here is not significant; the fixed result ordering is
/// declared by [`SupplierId::PRIORITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierId {
    Jlcpcb,
    Digikey,
    Mouser,
}

impl SupplierId {
    /// Fixed priority order for aggregated outcomes. The free catalog comes
    /// first since it needs no credentials, followed by the credentialed
    /// suppliers in a stable order.
    pub const PRIORITY: [SupplierId; 3] =
        [SupplierId::Jlcpcb, SupplierId::Digikey, SupplierId::Mouser];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierId::Jlcpcb => "jlcpcb",
            SupplierId::Digikey => "digikey",
            SupplierId::Mouser => "mouser",
        }
    }

    /// Human-facing supplier name, as rendered by the BOM page.
    pub fn display_name(&self) -> &'static str {
        match self {
            SupplierId::Jlcpcb => "JLCPCB",
            SupplierId::Digikey => "Digi-Key",
            SupplierId::Mouser => "Mouser",
        }
    }

    /// Position within [`SupplierId::PRIORITY`].
    pub fn priority_index(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

impl std::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw part lookup as extracted from a BOM row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartQuery {
    pub value: String,
    pub footprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
}

impl PartQuery {
    pub fn new(value: impl Into<String>, footprint: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            footprint: footprint.into(),
            component_type: None,
        }
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    /// Canonicalize for request building and cache keying: trimmed,
    /// case-folded, inner whitespace collapsed. An empty component type
    /// collapses to absent.
    pub fn canonical(&self) -> CanonicalQuery {
        let component_type = self
            .component_type
            .as_deref()
            .map(canonicalize_field)
            .filter(|s| !s.is_empty());
        CanonicalQuery {
            value: canonicalize_field(&self.value),
            footprint: canonicalize_field(&self.footprint),
            component_type,
        }
    }
}

fn canonicalize_field(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The normalized form of a [`PartQuery`], used as the cache key and as the
/// input to every supplier adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalQuery {
    pub value: String,
    pub footprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
}

impl CanonicalQuery {
    /// Joined free-text search term for suppliers with a single keyword
    /// parameter. Type hint first, then value, then footprint; empty fields
    /// are omitted.
    pub fn keyword(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(t) = self.component_type.as_deref() {
            parts.push(t);
        }
        if !self.value.is_empty() {
            parts.push(&self.value);
        }
        if !self.footprint.is_empty() {
            parts.push(&self.footprint);
        }
        parts.join(" ")
    }

    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.value,
            self.footprint,
            self.component_type.as_deref().unwrap_or("")
        )
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.footprint.is_empty()
    }
}

/// A normalized part from any supplier catalog.
///
/// Every field except `supplier` and `purchase_url` is optional: absence
/// means the supplier did not report it, which is distinct from a confirmed
/// zero (e.g. `stock_quantity: Some(0)` is "out of stock", `None` is
/// "stock unknown"). Prices are fixed-precision USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub supplier: SupplierId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_part_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Supplier-native order code (e.g. the LCSC "C..." code, the Digi-Key
    /// part number). Only some suppliers expose one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_part_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,

    pub purchase_url: String,
}

impl PartRecord {
    pub fn new(supplier: SupplierId, purchase_url: impl Into<String>) -> Self {
        Self {
            supplier,
            manufacturer_part_number: None,
            manufacturer: None,
            catalog_part_number: None,
            description: None,
            footprint: None,
            stock_quantity: None,
            unit_price: None,
            datasheet_url: None,
            purchase_url: purchase_url.into(),
        }
    }

    pub fn with_manufacturer_part_number(mut self, mpn: impl Into<String>) -> Self {
        self.manufacturer_part_number = Some(mpn.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_catalog_part_number(mut self, number: impl Into<String>) -> Self {
        self.catalog_part_number = Some(number.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_footprint(mut self, footprint: impl Into<String>) -> Self {
        self.footprint = Some(footprint.into());
        self
    }

    pub fn with_stock_quantity(mut self, stock: u64) -> Self {
        self.stock_quantity = Some(stock);
        self
    }

    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.unit_price = Some(price);
        self
    }

    pub fn with_datasheet_url(mut self, url: impl Into<String>) -> Self {
        self.datasheet_url = Some(url.into());
        self
    }
}

/// Terminal state of one supplier's search attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The supplier answered with a parseable body; zero records is still Ok.
    Ok,
    /// Required credentials are absent. Expected, not an error.
    NotConfigured,
    /// Bad or expired credentials (HTTP 401/403).
    Unauthorized,
    /// HTTP 429 or a supplier-specific rate-limit signal. No automatic retry.
    RateLimited,
    /// No response within the per-adapter timeout.
    TimedOut,
    /// Connection, DNS, or protocol failure, or a fully unparsable body.
    TransportError,
}

/// The per-supplier result of one search. Always present for every enabled
/// supplier, carrying a status even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOutcome {
    pub supplier: SupplierId,
    pub status: OutcomeStatus,

    /// Non-empty only when `status == Ok`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<PartRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Time taken by this supplier's fetch (ms). Absent for outcomes that
    /// were synthesized without a network attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl SupplierOutcome {
    pub fn ok(supplier: SupplierId, records: Vec<PartRecord>) -> Self {
        Self {
            supplier,
            status: OutcomeStatus::Ok,
            records,
            error_detail: None,
            duration_ms: None,
        }
    }

    pub fn failed(
        supplier: SupplierId,
        status: OutcomeStatus,
        detail: impl Into<String>,
    ) -> Self {
        debug_assert!(status != OutcomeStatus::Ok);
        Self {
            supplier,
            status,
            records: Vec::new(),
            error_detail: Some(detail.into()),
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}

/// Complete result of one aggregated search across all enabled suppliers.
///
/// `outcomes` is always in [`SupplierId::PRIORITY`] order regardless of
/// which adapter finished first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub query: CanonicalQuery,
    pub outcomes: Vec<SupplierOutcome>,
    pub fetched_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AggregatedResult {
    pub fn outcome_for(&self, supplier: SupplierId) -> Option<&SupplierOutcome> {
        self.outcomes.iter().find(|o| o.supplier == supplier)
    }

    /// Total normalized records across all suppliers.
    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.records.len()).sum()
    }

    /// True when at least one enabled supplier could not be searched.
    /// `NotConfigured` counts: the caller renders it as an actionable badge.
    pub fn is_partial(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_ok())
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalization() {
        let query = PartQuery::new("  100K ", " 0402\t0402 ").with_component_type("Resistor");
        let canonical = query.canonical();
        assert_eq!(canonical.value, "100k");
        assert_eq!(canonical.footprint, "0402 0402");
        assert_eq!(canonical.component_type.as_deref(), Some("resistor"));
        assert_eq!(canonical.cache_key(), "100k|0402 0402|resistor");
    }

    #[test]
    fn test_canonical_queries_share_cache_key() {
        let a = PartQuery::new("100K", "0402").canonical();
        let b = PartQuery::new(" 100k ", "0402 ").canonical();
        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_keyword_omits_empty_fields() {
        let query = PartQuery::new("1uF", "").canonical();
        assert_eq!(query.keyword(), "1uf");

        let query = PartQuery::new("1uF", "0603")
            .with_component_type("capacitor")
            .canonical();
        assert_eq!(query.keyword(), "capacitor 1uf 0603");

        let empty = PartQuery::new("  ", "").canonical();
        assert!(empty.is_empty());
        assert_eq!(empty.keyword(), "");
    }

    #[test]
    fn test_part_record_builder() {
        let record = PartRecord::new(SupplierId::Jlcpcb, "https://jlcpcb.com/part/C106224")
            .with_manufacturer("YAGEO")
            .with_catalog_part_number("C106224")
            .with_stock_quantity(5000)
            .with_unit_price(Decimal::new(3, 3));

        assert_eq!(record.supplier, SupplierId::Jlcpcb);
        assert_eq!(record.catalog_part_number.as_deref(), Some("C106224"));
        assert_eq!(record.stock_quantity, Some(5000));
        assert_eq!(record.unit_price, Some(Decimal::new(3, 3)));
        // Absent fields stay absent, not placeholder strings.
        assert!(record.manufacturer_part_number.is_none());
        assert!(record.datasheet_url.is_none());
    }

    #[test]
    fn test_absent_stock_is_distinct_from_zero() {
        let unknown = PartRecord::new(SupplierId::Mouser, "https://example.com");
        let out_of_stock =
            PartRecord::new(SupplierId::Mouser, "https://example.com").with_stock_quantity(0);
        assert_ne!(unknown.stock_quantity, out_of_stock.stock_quantity);

        let json = serde_json::to_string(&unknown).unwrap();
        assert!(!json.contains("stock_quantity"));
        let json = serde_json::to_string(&out_of_stock).unwrap();
        assert!(json.contains("\"stock_quantity\":0"));
    }

    #[test]
    fn test_outcome_records_empty_unless_ok() {
        let outcome = SupplierOutcome::failed(
            SupplierId::Digikey,
            OutcomeStatus::Unauthorized,
            "HTTP 401",
        );
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.status, OutcomeStatus::Unauthorized);
        assert_eq!(outcome.error_detail.as_deref(), Some("HTTP 401"));

        // Zero records is a valid Ok outcome, not an error.
        let empty_ok = SupplierOutcome::ok(SupplierId::Jlcpcb, Vec::new());
        assert!(empty_ok.is_ok());
        assert!(empty_ok.error_detail.is_none());
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(SupplierId::Jlcpcb.priority_index(), 0);
        assert_eq!(SupplierId::Digikey.priority_index(), 1);
        assert_eq!(SupplierId::Mouser.priority_index(), 2);
    }

    #[test]
    fn test_aggregated_result_helpers() {
        let query = PartQuery::new("100k", "0402").canonical();
        let result = AggregatedResult {
            query,
            outcomes: vec![
                SupplierOutcome::ok(
                    SupplierId::Jlcpcb,
                    vec![PartRecord::new(SupplierId::Jlcpcb, "https://jlcpcb.com/part/C1")],
                ),
                SupplierOutcome::failed(
                    SupplierId::Digikey,
                    OutcomeStatus::NotConfigured,
                    "missing client_id",
                ),
            ],
            fetched_at: Utc::now(),
            duration_ms: Some(12),
        };

        assert_eq!(result.total_records(), 1);
        assert!(result.is_partial());
        assert!(!result.all_failed());
        assert!(result.outcome_for(SupplierId::Digikey).is_some());
        assert!(result.outcome_for(SupplierId::Mouser).is_none());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OutcomeStatus::NotConfigured).unwrap();
        assert_eq!(json, "\"not_configured\"");
        let json = serde_json::to_string(&SupplierId::Digikey).unwrap();
        assert_eq!(json, "\"digikey\"");
    }
}

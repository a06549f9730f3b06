//! Session façade: the single entry point the host UI calls.

use std::time::Duration;

use crate::aggregator::Aggregator;
use crate::cache::SessionCache;
use crate::config::SearchConfig;
use crate::error::SupplierError;
use crate::types::{AggregatedResult, PartQuery, SupplierId};
use crate::{build_registry, SupplierRegistry};

/// Owns the supplier registry, the session cache, and the search settings.
///
/// `search` is cache-first and never fails on supplier trouble - partial and
/// total supplier failure is represented in the returned outcomes, not as an
/// error. The only error it returns is a malformed query.
pub struct PartSearchSession {
    registry: SupplierRegistry,
    cache: SessionCache,
    timeout: Duration,
    selected: Option<Vec<SupplierId>>,
}

impl PartSearchSession {
    pub fn new(config: SearchConfig) -> Result<Self, SupplierError> {
        let registry = build_registry(&config)?;
        Ok(Self::with_registry(registry, &config))
    }

    /// Build a session around an existing registry. Useful for custom or
    /// test adapters.
    pub fn with_registry(registry: SupplierRegistry, config: &SearchConfig) -> Self {
        Self {
            registry,
            cache: SessionCache::new(),
            timeout: config.timeout(),
            selected: config.selected_suppliers.clone(),
        }
    }

    /// Resolve a BOM-row descriptor against every enabled supplier.
    ///
    /// Cache-first: a repeated query within the session returns the
    /// memoized result verbatim with zero outbound calls. Concurrent
    /// searches for the same canonical query share one dispatch.
    pub async fn search(&self, query: &PartQuery) -> Result<AggregatedResult, SupplierError> {
        let canonical = query.canonical();
        if canonical.is_empty() {
            return Err(SupplierError::InvalidInput(
                "search requires a value or a footprint".into(),
            ));
        }

        let key = canonical.cache_key();
        let aggregator = Aggregator::new(&self.registry, self.timeout);
        let selected = self.selected.as_deref();
        let result = self
            .cache
            .get_or_search(&key, || async {
                tracing::debug!(key = %key, "Cache miss, dispatching supplier search");
                aggregator.search(&canonical, selected).await
            })
            .await;
        Ok(result)
    }

    /// Drop all memoized results. The next search for any query re-dispatches
    /// to every enabled adapter.
    pub async fn reset(&self) {
        self.cache.reset().await;
    }

    /// Suppliers that currently hold credentials, in priority order.
    pub fn configured_suppliers(&self) -> Vec<SupplierId> {
        self.registry.configured()
    }

    /// Suppliers a search will actually touch: the registered set in
    /// priority order, filtered by the configured selection.
    pub fn enabled_suppliers(&self) -> Vec<SupplierId> {
        self.registry
            .in_priority_order()
            .iter()
            .map(|s| s.id())
            .filter(|id| {
                self.selected
                    .as_ref()
                    .map(|ids| ids.contains(id))
                    .unwrap_or(true)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let session = PartSearchSession::new(SearchConfig::default()).unwrap();
        let err = session
            .search(&PartQuery::new("   ", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SupplierError::InvalidInput(_)));
    }

    #[test]
    fn test_unconfigured_session_has_free_catalog_only() {
        let session = PartSearchSession::new(SearchConfig::default()).unwrap();
        assert_eq!(session.configured_suppliers(), vec![SupplierId::Jlcpcb]);
        assert_eq!(session.enabled_suppliers(), SupplierId::PRIORITY.to_vec());
    }

    #[test]
    fn test_selection_narrows_enabled_suppliers() {
        let config = SearchConfig {
            selected_suppliers: Some(vec![SupplierId::Mouser, SupplierId::Jlcpcb]),
            ..SearchConfig::default()
        };
        let session = PartSearchSession::new(config).unwrap();
        // Priority order is preserved regardless of selection order.
        assert_eq!(
            session.enabled_suppliers(),
            vec![SupplierId::Jlcpcb, SupplierId::Mouser]
        );
    }
}

//! Fan-out search execution across supplier adapters.
//!
//! Dispatches one logical query to every enabled adapter concurrently,
//! bounds each call with the per-adapter timeout, and composes the outcomes
//! in the fixed supplier priority order. One supplier's failure never
//! aborts the others; it becomes that supplier's outcome.

use std::time::{Duration, Instant};

use chrono::Utc;

use crate::types::{
    AggregatedResult, CanonicalQuery, OutcomeStatus, SupplierId, SupplierOutcome,
};
use crate::SupplierRegistry;

pub struct Aggregator<'a> {
    registry: &'a SupplierRegistry,
    timeout: Duration,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a SupplierRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Search every enabled supplier and wait for all of them to settle.
    ///
    /// `selected` filters the enabled set; `None` enables every registered
    /// supplier. Unconfigured adapters get a synthesized `not_configured`
    /// outcome without any network attempt. The join is structured: a late
    /// response after its timeout is discarded with the cancelled future
    /// and cannot touch the returned result.
    pub async fn search(
        &self,
        query: &CanonicalQuery,
        selected: Option<&[SupplierId]>,
    ) -> AggregatedResult {
        let start = Instant::now();

        let enabled: Vec<_> = self
            .registry
            .in_priority_order()
            .into_iter()
            .filter(|s| selected.map(|ids| ids.contains(&s.id())).unwrap_or(true))
            .collect();

        // join_all keeps input order, so outcomes land in priority order no
        // matter which adapter finishes first.
        let futures: Vec<_> = enabled
            .iter()
            .map(|supplier| {
                let supplier = supplier.clone();
                let query = query.clone();
                let timeout = self.timeout;

                async move {
                    let id = supplier.id();
                    if !supplier.is_configured() {
                        return SupplierOutcome::failed(
                            id,
                            OutcomeStatus::NotConfigured,
                            supplier.config_schema().missing_credentials_hint(id),
                        );
                    }

                    let started = Instant::now();
                    let outcome = match tokio::time::timeout(timeout, supplier.fetch(&query)).await
                    {
                        Ok(Ok(records)) => SupplierOutcome::ok(id, records),
                        Ok(Err(err)) => {
                            tracing::warn!(
                                supplier = id.as_str(),
                                error = %err,
                                "Supplier search failed"
                            );
                            SupplierOutcome::failed(id, err.status(), err.to_string())
                        }
                        Err(_) => SupplierOutcome::failed(
                            id,
                            OutcomeStatus::TimedOut,
                            format!("no response within {}ms", timeout.as_millis()),
                        ),
                    };
                    outcome.with_duration_ms(started.elapsed().as_millis() as u64)
                }
            })
            .collect();

        let outcomes = futures::future::join_all(futures).await;

        AggregatedResult {
            query: query.clone(),
            outcomes,
            fetched_at: Utc::now(),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}

//! Latency-ranked registry selection.

use tracing::info;

use crate::latency::LatencyResult;
use crate::manager::PackageManagerKind;
use crate::types::RegistryEntry;

use super::{RegistryError, RegistryResolver};

/// Outcome of picking and applying the fastest registry
#[derive(Debug, Clone)]
pub struct SelectionReport {
    /// Every probe result, best first
    pub ranked: Vec<LatencyResult>,
    pub winner: RegistryEntry,
    pub applied: Vec<PackageManagerKind>,
}

/// Order results best first.
///
/// Results without an error come first, fastest first; errored results
/// follow in input order. The sort is stable, so equal latencies
/// keep their input order.
pub fn rank_results(mut results: Vec<LatencyResult>) -> Vec<LatencyResult> {
    results.sort_by_key(|result| match result.error {
        None => (false, result.latency),
        Some(_) => (true, std::time::Duration::ZERO),
    });
    results
}

/// First ranked result without an error.
pub fn pick_winner(ranked: &[LatencyResult]) -> Option<&LatencyResult> {
    ranked.iter().find(|result| result.error.is_none())
}

impl RegistryResolver {
    /// Probe every registry and use the fastest reachable one.
    ///
    /// All probes run to completion before a winner is chosen.
    pub async fn use_fastest(&self) -> Result<SelectionReport, RegistryError> {
        let ranked = rank_results(self.test(&[]).await);
        let winner = pick_winner(&ranked).ok_or(RegistryError::NoReachableRegistry {
            tested: ranked.len(),
        })?;
        info!(
            name = %winner.name,
            latency_ms = winner.latency.as_millis() as u64,
            "selected fastest registry"
        );

        let usage = self.use_registry(&winner.name)?;
        Ok(SelectionReport {
            ranked,
            winner: usage.registry,
            applied: usage.applied,
        })
    }
}

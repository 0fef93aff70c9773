//! Concurrent latency prober.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::transport::{ProbeRequest, ProbeTransport, ReqwestTransport};
use super::types::{LatencyResult, LatencyTarget, ProbeOptions};

/// Measures reachability and latency of registry URLs.
///
/// Cheap to clone; clones share the transport and its connection pool.
#[derive(Debug, Clone)]
pub struct LatencyProber {
    transport: Arc<dyn ProbeTransport>,
    options: Arc<ProbeOptions>,
}

impl LatencyProber {
    /// Create a prober backed by a pooled `reqwest` client.
    pub fn new(options: ProbeOptions) -> anyhow::Result<Self> {
        Ok(Self::with_transport(
            Arc::new(ReqwestTransport::new()?),
            options,
        ))
    }

    pub fn with_transport(transport: Arc<dyn ProbeTransport>, options: ProbeOptions) -> Self {
        Self {
            transport,
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Probe every target, at most `concurrency` at a time.
    ///
    /// Returns exactly one result per target, `results[i]` belonging to
    /// `targets[i]`. Individual failures are recorded in the results and
    /// never fail the batch. Dropping the returned future aborts all
    /// in-flight probes.
    pub async fn probe_all(&self, targets: &[LatencyTarget]) -> Vec<LatencyResult> {
        if targets.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.options.effective_concurrency()));
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            let transport = Arc::clone(&self.transport);
            let options = Arc::clone(&self.options);

            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => probe_target(transport.as_ref(), &options, &target).await,
                    Err(_) => LatencyResult::pending(&target).fail("probe cancelled"),
                };
                (index, result)
            });
        }

        // Slots are addressed by input index, not completion order
        let mut slots: Vec<Option<LatencyResult>> = vec![None; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "latency probe task failed"),
            }
        }

        slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| LatencyResult::pending(target).fail("probe task aborted"))
            })
            .collect()
    }

    /// Probe a single target.
    pub async fn probe_one(&self, target: &LatencyTarget) -> LatencyResult {
        probe_target(self.transport.as_ref(), &self.options, target).await
    }
}

async fn probe_target(
    transport: &dyn ProbeTransport,
    options: &ProbeOptions,
    target: &LatencyTarget,
) -> LatencyResult {
    let mut result = LatencyResult::pending(target);
    let timeout = target.timeout.unwrap_or(options.timeout);

    let request = ProbeRequest {
        url: target.test_url(),
        headers: target.headers.clone(),
        user_agent: options.user_agent.clone(),
    };
    debug!(name = %target.name, url = %request.url, "probing registry");

    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, transport.get(request)).await;
    result.latency = start.elapsed();

    let response = match outcome {
        Err(_) => {
            return result.fail(format!(
                "request timed out after {}ms",
                timeout.as_millis()
            ));
        }
        Ok(Err(e)) => return result.fail(format!("request failed: {:#}", e)),
        Ok(Ok(response)) => response,
    };

    if response.status != 200 {
        let reason = response.reason.as_deref().unwrap_or("unexpected status");
        return result.fail(format!("HTTP {}: {}", response.status, reason));
    }

    if let Some(max_latency) = options.max_latency
        && result.latency > max_latency
    {
        let message = format!(
            "latency too high: {}ms > {}ms",
            result.latency.as_millis(),
            max_latency.as_millis()
        );
        return result.fail(message);
    }

    if let Some(validator) = &target.validator
        && let Err(reason) = validator.check(&result)
    {
        return result.fail(format!("validation failed: {}", reason));
    }

    result.is_online = true;
    debug!(
        name = %result.name,
        latency_ms = result.latency.as_millis() as u64,
        "registry online"
    );
    result
}

//! Probe targets, options and results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_secs(3);

/// Caller-supplied acceptance check run on otherwise successful probes.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&LatencyResult) -> Result<(), String> + Send + Sync>);

impl Validator {
    pub fn new(
        check: impl Fn(&LatencyResult) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(check))
    }

    pub fn check(&self, result: &LatencyResult) -> Result<(), String> {
        (self.0)(result)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// A URL to probe.
///
/// Optional settings are plain fields; build with struct-update syntax
/// from [`LatencyTarget::new`].
#[derive(Debug, Clone)]
pub struct LatencyTarget {
    pub name: String,
    pub url: String,
    /// Path appended to `url` to form the probed URL
    pub test_path: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Overrides [`ProbeOptions::timeout`] for this target
    pub timeout: Option<Duration>,
    pub validator: Option<Validator>,
}

impl LatencyTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            test_path: None,
            headers: Vec::new(),
            timeout: None,
            validator: None,
        }
    }

    /// The URL actually requested: base URL joined with the test path.
    pub fn test_url(&self) -> String {
        match self.test_path.as_deref().map(|p| p.trim_start_matches('/')) {
            None | Some("") => self.url.clone(),
            Some(path) if self.url.ends_with('/') => format!("{}{}", self.url, path),
            Some(path) => format!("{}/{}", self.url, path),
        }
    }
}

/// Outcome of probing one target
#[derive(Debug, Clone)]
pub struct LatencyResult {
    pub name: String,
    pub url: String,
    pub is_online: bool,
    pub latency: Duration,
    pub error: Option<String>,
    pub tested_at: DateTime<Utc>,
}

impl LatencyResult {
    pub(crate) fn pending(target: &LatencyTarget) -> Self {
        Self {
            name: target.name.clone(),
            url: target.url.clone(),
            is_online: false,
            latency: Duration::ZERO,
            error: None,
            tested_at: Utc::now(),
        }
    }

    /// Offline result that never reached the network.
    pub fn failed(
        name: impl Into<String>,
        url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            is_online: false,
            latency: Duration::ZERO,
            error: Some(error.into()),
            tested_at: Utc::now(),
        }
    }

    pub(crate) fn fail(mut self, error: impl Into<String>) -> Self {
        self.is_online = false;
        self.error = Some(error.into());
        self
    }

    pub fn latency_ms(&self) -> u128 {
        self.latency.as_millis()
    }
}

/// Prober configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Per-request timeout unless the target sets its own
    pub timeout: Duration,
    /// Successful responses slower than this are still reported offline
    pub max_latency: Option<Duration>,
    /// Simultaneous in-flight probes, clamped to 1..=10
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_latency: Some(DEFAULT_MAX_LATENCY),
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: format!("regmux-latency/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProbeOptions {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

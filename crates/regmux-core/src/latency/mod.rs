//! Registry reachability and latency probing
//!
//! Probes run concurrently under a fixed permit budget; every target is
//! always probed to completion and results come back in input order.

pub mod prober;
pub mod transport;
pub mod types;

pub use prober::LatencyProber;
pub use transport::{ProbeRequest, ProbeResponse, ProbeTransport, ReqwestTransport};
pub use types::{
    DEFAULT_CONCURRENCY, LatencyResult, LatencyTarget, MAX_CONCURRENCY, ProbeOptions, Validator,
};

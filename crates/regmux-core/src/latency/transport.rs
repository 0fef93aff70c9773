//! HTTP transport used by the prober.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

/// A single GET issued by a probe
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub user_agent: String,
}

/// Status line of the probed response; the body is never read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub reason: Option<String>,
}

impl ProbeResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            reason: Some("OK".to_string()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            reason: None,
        }
    }
}

/// Issues probe requests. Resolves once response headers are received.
///
/// Timeouts are enforced by the prober, not the transport.
#[async_trait]
pub trait ProbeTransport: Send + Sync + std::fmt::Debug {
    async fn get(&self, request: ProbeRequest) -> anyhow::Result<ProbeResponse>;
}

/// `reqwest`-backed transport sharing one pooled client across probes
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeTransport for ReqwestTransport {
    async fn get(&self, request: ProbeRequest) -> anyhow::Result<ProbeResponse> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, &request.user_agent);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();

        Ok(ProbeResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(String::from),
        })
    }
}

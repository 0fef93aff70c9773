#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use regmux_core::config::{ConfigError, DocumentStore, RegistryDocument};
use regmux_core::latency::{ProbeRequest, ProbeResponse, ProbeTransport};
use regmux_core::manager::{
    ActiveRegistryUrl, PackageManagerAdapter, PackageManagerInfo, PackageManagerKind,
};

/// Document store kept in memory; saves can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<RegistryDocument>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new(document: RegistryDocument) -> Arc<Self> {
        Arc::new(Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(RegistryDocument::new())
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Option<RegistryDocument> {
        self.document.lock().unwrap().clone()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<RegistryDocument, ConfigError> {
        self.document
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ConfigError::NotFound {
                path: "memory://config.toml".into(),
            })
    }

    fn save(&self, document: &RegistryDocument) -> Result<(), ConfigError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ConfigError::Write {
                path: "memory://config.toml".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.document.lock().unwrap() = Some(document.clone());
        Ok(())
    }
}

/// Adapter that records every call instead of touching files.
#[derive(Debug)]
pub struct RecordingAdapter {
    installed: Vec<PackageManagerKind>,
    urls: Mutex<BTreeMap<PackageManagerKind, String>>,
    fail_on: Option<PackageManagerKind>,
    calls: Mutex<Vec<String>>,
}

impl RecordingAdapter {
    pub fn new(installed: Vec<PackageManagerKind>) -> Arc<Self> {
        Arc::new(Self {
            installed,
            urls: Mutex::new(BTreeMap::new()),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(
        installed: Vec<PackageManagerKind>,
        fail_on: PackageManagerKind,
    ) -> Arc<Self> {
        Arc::new(Self {
            installed,
            urls: Mutex::new(BTreeMap::new()),
            fail_on: Some(fail_on),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_url(&self, kind: PackageManagerKind, url: &str) {
        self.urls.lock().unwrap().insert(kind, url.to_string());
    }

    pub fn url(&self, kind: PackageManagerKind) -> Option<String> {
        self.urls.lock().unwrap().get(&kind).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PackageManagerAdapter for RecordingAdapter {
    fn detect(&self) -> Vec<PackageManagerInfo> {
        self.record("detect".to_string());
        PackageManagerKind::ALL
            .into_iter()
            .map(|kind| PackageManagerInfo {
                kind,
                installed: self.installed.contains(&kind),
                version: Some("1.0.0".to_string()),
                registry_url: self.url(kind),
                config_path: None,
                config_exists: false,
                error: None,
            })
            .collect()
    }

    fn active_registry(&self, kind: PackageManagerKind) -> anyhow::Result<ActiveRegistryUrl> {
        self.record(format!("get {}", kind));
        let url = self.url(kind);
        Ok(ActiveRegistryUrl {
            config_exists: url.is_some(),
            url: url.unwrap_or_else(|| kind.default_registry().to_string()),
            config_path: format!("/home/test/{}", kind.rc_file()).into(),
        })
    }

    fn set_active_registry(&self, kind: PackageManagerKind, url: &str) -> anyhow::Result<()> {
        self.record(format!("set {} {}", kind, url));
        if self.fail_on == Some(kind) {
            anyhow::bail!("permission denied");
        }
        self.set_url(kind, url);
        Ok(())
    }
}

/// Transport whose responses are scripted per URL.
///
/// Tracks how many requests are in flight at once and how many ran to the end.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: BTreeMap<String, (Duration, Result<u16, String>)>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
    seen: Mutex<Vec<ProbeRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `url` after `delay` with `status`.
    pub fn route(mut self, url: &str, delay: Duration, status: u16) -> Self {
        self.routes.insert(url.to_string(), (delay, Ok(status)));
        self
    }

    /// Fail requests to `url` with a transport error after `delay`.
    pub fn route_error(mut self, url: &str, delay: Duration, error: &str) -> Self {
        self.routes
            .insert(url.to_string(), (delay, Err(error.to_string())));
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn get(&self, request: ProbeRequest) -> anyhow::Result<ProbeResponse> {
        self.seen.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (delay, outcome) = self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(200)));
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        match outcome {
            Ok(status) => Ok(ProbeResponse::status(status)),
            Err(error) => Err(anyhow::anyhow!(error)),
        }
    }
}

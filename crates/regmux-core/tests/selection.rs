mod support;

use std::sync::Arc;
use std::time::Duration;

use regmux_core::config::CustomRegistry;
use regmux_core::latency::{LatencyProber, ProbeOptions};
use regmux_core::manager::PackageManagerKind;
use regmux_core::registry::{BuiltinCatalog, RegistryError, RegistryResolver};
use regmux_core::types::RegistryEntry;

use support::{MemoryStore, RecordingAdapter, ScriptedTransport};

fn catalog() -> BuiltinCatalog {
    BuiltinCatalog::from_entries(vec![
        RegistryEntry::custom("alpha", "https://alpha.example/"),
        RegistryEntry::custom("beta", "https://beta.example/"),
        RegistryEntry::custom("gamma", "https://gamma.example/"),
    ])
}

fn resolver(
    transport: ScriptedTransport,
) -> (RegistryResolver, Arc<ScriptedTransport>, Arc<RecordingAdapter>) {
    let transport = Arc::new(transport);
    let adapter = RecordingAdapter::new(vec![PackageManagerKind::Npm, PackageManagerKind::Bun]);
    let options = ProbeOptions {
        max_latency: None,
        ..ProbeOptions::default()
    };
    let resolver = RegistryResolver::open(catalog(), MemoryStore::empty(), adapter.clone())
        .unwrap()
        .with_prober(LatencyProber::with_transport(transport.clone(), options));
    (resolver, transport, adapter)
}

#[tokio::test]
async fn test_measures_all_registries_with_fixed_path() {
    let (resolver, transport, _) = resolver(ScriptedTransport::new());

    let results = resolver.test(&[]).await;

    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    let mut urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "https://alpha.example/package.json",
            "https://beta.example/package.json",
            "https://gamma.example/package.json",
        ]
    );
    assert!(transport.requests().iter().all(|r| r
        .headers
        .contains(&("Accept".to_string(), "application/json".to_string()))));
}

#[tokio::test]
async fn test_named_subset_keeps_request_order() {
    let (resolver, transport, _) = resolver(ScriptedTransport::new());
    resolver
        .add("corp", CustomRegistry::new("https://npm.corp.example/"))
        .unwrap();

    let names = vec![
        "gamma".to_string(),
        "missing".to_string(),
        "corp".to_string(),
    ];
    let results = resolver.test(&names).await;

    let got: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(got, vec!["gamma", "missing", "corp"]);
    assert!(results[0].is_online);
    assert!(!results[1].is_online);
    assert_eq!(results[1].error.as_deref(), Some("registry not found"));
    assert!(results[2].is_online);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn use_fastest_applies_winner() {
    let transport = ScriptedTransport::new()
        .route(
            "https://alpha.example/package.json",
            Duration::from_millis(150),
            200,
        )
        .route(
            "https://beta.example/package.json",
            Duration::from_millis(10),
            200,
        )
        .route_error(
            "https://gamma.example/package.json",
            Duration::ZERO,
            "refused",
        );
    let (resolver, _, adapter) = resolver(transport);

    let report = resolver.use_fastest().await.unwrap();

    assert_eq!(report.winner.name, "beta");
    assert_eq!(
        report.applied,
        vec![PackageManagerKind::Npm, PackageManagerKind::Bun]
    );
    let ranked: Vec<&str> = report.ranked.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(ranked, vec!["beta", "alpha", "gamma"]);
    assert_eq!(
        adapter.url(PackageManagerKind::Bun).as_deref(),
        Some("https://beta.example/")
    );
}

#[tokio::test]
async fn use_fastest_fails_when_nothing_reachable() {
    let transport = ScriptedTransport::new()
        .route("https://alpha.example/package.json", Duration::ZERO, 500)
        .route("https://beta.example/package.json", Duration::ZERO, 404)
        .route_error("https://gamma.example/package.json", Duration::ZERO, "dns");
    let (resolver, _, adapter) = resolver(transport);

    let err = resolver.use_fastest().await.unwrap_err();

    assert!(matches!(err, RegistryError::NoReachableRegistry { tested: 3 }));
    assert!(
        adapter
            .calls()
            .iter()
            .all(|call| !call.starts_with("set "))
    );
}

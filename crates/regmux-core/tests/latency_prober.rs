mod support;

use std::sync::Arc;
use std::time::Duration;

use regmux_core::latency::{LatencyProber, LatencyTarget, ProbeOptions};
use regmux_core::registry::rank_results;

use support::ScriptedTransport;

fn options(concurrency: usize) -> ProbeOptions {
    ProbeOptions {
        max_latency: None,
        ..ProbeOptions::with_concurrency(concurrency)
    }
}

fn target(name: &str) -> LatencyTarget {
    LatencyTarget::new(name, format!("https://{name}.example/"))
}

#[tokio::test]
async fn results_follow_input_order() {
    // Later targets finish first
    let transport = ScriptedTransport::new()
        .route("https://a.example/", Duration::from_millis(120), 200)
        .route_error("https://b.example/", Duration::from_millis(60), "connection reset")
        .route("https://c.example/", Duration::from_millis(30), 503)
        .route("https://d.example/", Duration::ZERO, 200);
    let prober = LatencyProber::with_transport(Arc::new(transport), options(4));
    let targets: Vec<_> = ["a", "b", "c", "d"].into_iter().map(target).collect();

    let results = prober.probe_all(&targets).await;

    assert_eq!(results.len(), targets.len());
    for (result, target) in results.iter().zip(&targets) {
        assert_eq!(result.name, target.name);
        assert_eq!(result.url, target.url);
    }
    assert!(results[0].is_online);
    assert!(results[1].error.as_deref().unwrap().contains("connection reset"));
    assert!(results[2].error.as_deref().unwrap().starts_with("HTTP 503"));
    assert!(results[3].is_online);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let mut transport = ScriptedTransport::new();
    for name in ["a", "b", "c", "d", "e"] {
        transport = transport.route(
            &format!("https://{name}.example/"),
            Duration::from_millis(40),
            200,
        );
    }
    let transport = Arc::new(transport);
    let prober = LatencyProber::with_transport(transport.clone(), options(2));
    let targets: Vec<_> = ["a", "b", "c", "d", "e"].into_iter().map(target).collect();

    let results = prober.probe_all(&targets).await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.is_online));
    assert_eq!(transport.peak(), 2);
}

#[tokio::test]
async fn every_target_measured_even_after_success() {
    let transport = Arc::new(ScriptedTransport::new());
    let prober = LatencyProber::with_transport(transport.clone(), options(1));
    let targets: Vec<_> = ["a", "b", "c"].into_iter().map(target).collect();

    prober.probe_all(&targets).await;

    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn ranking_orders_by_latency_with_errors_last() {
    let transport = ScriptedTransport::new()
        .route("https://slow.example/", Duration::from_millis(150), 200)
        .route("https://mid.example/", Duration::from_millis(60), 200)
        .route_error("https://down.example/", Duration::ZERO, "refused")
        .route("https://fast.example/", Duration::from_millis(10), 200);
    let prober = LatencyProber::with_transport(Arc::new(transport), options(4));
    let targets: Vec<_> = ["slow", "mid", "down", "fast"]
        .into_iter()
        .map(target)
        .collect();

    let ranked = rank_results(prober.probe_all(&targets).await);

    let order: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(order, vec!["fast", "mid", "slow", "down"]);
}

#[tokio::test]
async fn slow_response_over_ceiling_is_offline() {
    let transport = ScriptedTransport::new().route(
        "https://slow.example/",
        Duration::from_millis(80),
        200,
    );
    let options = ProbeOptions {
        max_latency: Some(Duration::from_millis(20)),
        ..ProbeOptions::default()
    };
    let prober = LatencyProber::with_transport(Arc::new(transport), options);

    let result = prober.probe_one(&target("slow")).await;

    assert!(!result.is_online);
    assert!(result.error.unwrap().starts_with("latency too high"));
}

#[tokio::test]
async fn request_carries_path_headers_and_user_agent() {
    let transport = Arc::new(ScriptedTransport::new());
    let prober = LatencyProber::with_transport(transport.clone(), ProbeOptions::default());
    let target = LatencyTarget {
        test_path: Some("package.json".to_string()),
        headers: vec![("Accept".to_string(), "application/json".to_string())],
        ..target("npm")
    };

    prober.probe_one(&target).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://npm.example/package.json");
    assert_eq!(
        requests[0].headers,
        vec![("Accept".to_string(), "application/json".to_string())]
    );
    assert!(requests[0].user_agent.starts_with("regmux-latency/"));
}

#[tokio::test]
async fn dropping_batch_cancels_in_flight_requests() {
    let mut transport = ScriptedTransport::new();
    for name in ["a", "b", "c", "d"] {
        transport = transport.route(
            &format!("https://{name}.example/"),
            Duration::from_millis(300),
            200,
        );
    }
    let transport = Arc::new(transport);
    let prober = LatencyProber::with_transport(transport.clone(), options(4));
    let targets: Vec<_> = ["a", "b", "c", "d"].into_iter().map(target).collect();

    let outcome =
        tokio::time::timeout(Duration::from_millis(50), prober.probe_all(&targets)).await;
    assert!(outcome.is_err());
    assert_eq!(transport.started(), 4);

    // Long enough for every request to have finished had it kept running
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.completed(), 0);
}

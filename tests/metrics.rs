// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;

// Build full in-process app (includes /metrics).
async fn build_app() -> Router {
    std::env::remove_var("INFLATION_CONFIG_PATH");
    std::env::remove_var("INFLATION_REMOTE_URL");
    std::env::set_var(
        "INFLATION_DATA_DIR",
        concat!(env!("CARGO_MANIFEST_DIR"), "/data"),
    );
    inflation_consensus::app()
        .await
        .expect("app() should build Router in tests")
}

async fn body_text(resp: axum::response::Response) -> String {
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_contains_expected_series() {
    let app = build_app().await;

    // GBP exercises the fallback path, USD the per-measure path.
    for currency in ["GBP", "USD"] {
        let req = Request::post("/api/v1/consensus")
            .header("content-type", "application/json")
            .body(Body::from(format!(
                r#"{{"currency":"{currency}","from_year":1990,"to_year":2020,"amount":"250"}}"#
            )))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_text(resp).await;

    for needle in [
        "consensus_requests_total",
        "measure_resolutions_total",
        "measure_fallback_total",
        "consensus_compute_ms",
        "dataset_parse_ms",
    ] {
        assert!(
            text.contains(needle),
            "missing metric `{needle}` in /metrics output:\n{text}"
        );
    }
}

#[tokio::test]
#[serial]
async fn app_can_be_built_twice_in_one_process() {
    let a = build_app().await;
    let b = build_app().await;
    for app in [a, b] {
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

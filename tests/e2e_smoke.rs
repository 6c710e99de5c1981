// tests/e2e_smoke.rs
//
// Full app against the datasets shipped in `data/`.

use serial_test::serial;
use shuttle_axum::axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for `oneshot` (tower 0.5 with features=["util"])

pub async fn shipped_app() -> Router {
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

async fn consensus(app: &Router, currency: &str) -> serde_json::Value {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/consensus")
        .header("content-type", "application/json")
        .body(Body::from(format!(
            r#"{{"currency":"{currency}","from_year":2000,"to_year":2024,"amount":100}}"#
        )))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[serial]
async fn smoke_usd_uses_published_measures() {
    let app = shipped_app().await;
    let v = consensus(&app, "USD").await;
    assert_eq!(v["has_real_data"], true);
    assert_eq!(v["quality"]["score"], 100);
    assert_eq!(
        v["consensus"]["individual_measures"]
            .as_array()
            .unwrap()
            .len(),
        6
    );
    let adjusted = v["consensus"]["consensus_adjusted_amount"].as_f64().unwrap();
    assert!(adjusted > 150.0 && adjusted < 200.0, "adjusted = {adjusted}");
}

#[tokio::test]
#[serial]
async fn smoke_gbp_falls_back_to_simulation() {
    let app = shipped_app().await;
    let v = consensus(&app, "GBP").await;
    assert_eq!(v["has_real_data"], false);
    assert_eq!(v["fallback_used"], true);
    assert_eq!(v["quality"]["score"], 0);
}

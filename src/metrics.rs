use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "consensus_requests_total",
            "Consensus computations requested."
        );
        describe_histogram!(
            "consensus_compute_ms",
            "Consensus computation time in milliseconds."
        );
        describe_counter!(
            "measure_resolutions_total",
            "Measure-set resolutions attempted."
        );
        describe_counter!(
            "measure_fallback_total",
            "Resolutions that fell back to the base index."
        );
        describe_counter!(
            "measure_fetch_errors_total",
            "Dataset fetches that failed after all retries."
        );
        describe_counter!(
            "measure_fetch_retries_total",
            "Dataset fetch attempts that were retried."
        );
        describe_histogram!("dataset_parse_ms", "Dataset read+parse time in milliseconds.");
    });
}

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")
            })?
            .clone();
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::{build_source, AppConfig};
use crate::consensus::{amount_from_json, compute_consensus_with, ConsensusResult, WeightingMode};
use crate::currency::Currency;
use crate::loader::retry::RetryPolicy;
use crate::loader::types::SeriesSource;
use crate::measures::{Confidence, MeasureKey, MeasureSet};
use crate::metrics::Metrics;
use crate::quality::{score_data_quality, DataQualityScore};
use crate::resolve::{resolve_measures, Resolution};
use crate::series::{MAX_YEAR, MIN_YEAR};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn SeriesSource>,
    pub policy: RetryPolicy,
    pub weighting: WeightingMode,
}

impl AppState {
    pub fn new(source: Arc<dyn SeriesSource>) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
            weighting: WeightingMode::default(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            source: build_source(cfg),
            policy: cfg.retry,
            weighting: cfg.weighting,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/v1/currencies", get(list_currencies))
        .route("/api/v1/measures/{currency}", get(measures_for))
        .route("/api/v1/quality/{currency}", get(quality_for))
        .route("/api/v1/consensus", post(consensus))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Full in-process app: config, data source, `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    let metrics = Metrics::init()?;
    Ok(router(AppState::from_config(&cfg)).merge(metrics.router()))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

fn error_response(status: StatusCode, error: String, retryable: bool) -> Response {
    (status, Json(ErrorBody { error, retryable })).into_response()
}

fn parse_currency(raw: &str) -> Result<Currency, Response> {
    raw.parse::<Currency>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string(), false))
}

async fn list_currencies() -> Json<Vec<&'static str>> {
    Json(Currency::ALL.iter().map(|c| c.code()).collect())
}

#[derive(Serialize)]
struct MeasureSummary {
    key: MeasureKey,
    name: String,
    description: String,
    weight: f64,
    confidence: Confidence,
    is_real_data: bool,
    earliest_year: Option<i32>,
    latest_year: Option<i32>,
}

#[derive(Serialize)]
struct ResolutionSummary {
    currency: Currency,
    kind: &'static str,
    has_real_data: bool,
    fallback_used: bool,
    resolved_at: chrono::DateTime<chrono::Utc>,
    failed_measures: Vec<MeasureKey>,
    measures: Vec<MeasureSummary>,
}

impl From<&Resolution> for ResolutionSummary {
    fn from(r: &Resolution) -> Self {
        let kind = match r.set {
            MeasureSet::Real(_) => "real",
            MeasureSet::Simulated(_) => "simulated",
            MeasureSet::Unavailable => "unavailable",
        };
        Self {
            currency: r.currency,
            kind,
            has_real_data: r.has_real_data,
            fallback_used: r.fallback_used,
            resolved_at: r.resolved_at,
            failed_measures: r.failed_measures.clone(),
            measures: r
                .measures()
                .values()
                .map(|m| MeasureSummary {
                    key: m.key,
                    name: m.name.clone(),
                    description: m.description.clone(),
                    weight: m.weight,
                    confidence: m.confidence,
                    is_real_data: m.is_real_data,
                    earliest_year: m.series.earliest_year(),
                    latest_year: m.series.latest_year(),
                })
                .collect(),
        }
    }
}

async fn resolve(state: &AppState, currency: Currency) -> Resolution {
    resolve_measures(state.source.as_ref(), currency, &state.policy).await
}

async fn measures_for(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let currency = match parse_currency(&raw) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let resolution = resolve(&state, currency).await;
    Json(ResolutionSummary::from(&resolution)).into_response()
}

async fn quality_for(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let currency = match parse_currency(&raw) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let resolution = resolve(&state, currency).await;
    Json(score_data_quality(resolution.measures())).into_response()
}

#[derive(Deserialize)]
struct ConsensusReq {
    currency: String,
    from_year: i32,
    to_year: i32,
    /// Number or numeric string.
    amount: serde_json::Value,
}

#[derive(Serialize)]
struct ConsensusResp {
    consensus: ConsensusResult,
    quality: DataQualityScore,
    has_real_data: bool,
    fallback_used: bool,
}

async fn consensus(State(state): State<AppState>, Json(body): Json<ConsensusReq>) -> Response {
    let currency = match parse_currency(&body.currency) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let from_year = body.from_year.clamp(MIN_YEAR, MAX_YEAR);
    let to_year = body.to_year.clamp(MIN_YEAR, MAX_YEAR);

    let resolution = resolve(&state, currency).await;
    if resolution.is_empty() {
        tracing::warn!(target: "api", %currency, "no measures loadable");
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("No inflation data could be loaded for {currency}. Please try again."),
            true,
        );
    }

    let consensus = match amount_from_json(&body.amount) {
        Some(amount) => compute_consensus_with(
            state.weighting,
            resolution.measures(),
            currency,
            from_year,
            to_year,
            amount,
        ),
        None => ConsensusResult::empty(currency, from_year, to_year),
    };

    Json(ConsensusResp {
        consensus,
        quality: score_data_quality(resolution.measures()),
        has_real_data: resolution.has_real_data,
        fallback_used: resolution.fallback_used,
    })
    .into_response()
}

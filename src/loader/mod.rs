// src/loader/mod.rs
//! Dataset loading: fetch with retry, normalize, derive year bounds.

pub mod providers;
pub mod retry;
pub mod types;

use anyhow::Result;
use metrics::counter;
use serde::Serialize;

use crate::currency::Currency;
use crate::loader::retry::{retry_with_backoff, RetryPolicy};
use crate::loader::types::SeriesSource;
use crate::measures::{InflationMeasure, MeasureKey};
use crate::series::{IndexSeries, SeriesMetadata};

pub use crate::loader::providers::{file::FileSource, http::HttpSource};

/// A currency's base index, normalized, with its year bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexData {
    pub currency: Currency,
    pub series: IndexSeries,
    pub earliest_year: i32,
    pub latest_year: i32,
    #[serde(skip)]
    pub metadata: SeriesMetadata,
}

impl IndexData {
    pub fn contains_year(&self, year: i32) -> bool {
        (self.earliest_year..=self.latest_year).contains(&year)
    }
}

/// Load the base index for `currency`.
///
/// Transient failures are retried per `policy`; the final error is returned
/// once attempts are exhausted. `Ok(None)` when the currency publishes no
/// base index or the published one has no usable points.
pub async fn load_index(
    source: &dyn SeriesSource,
    currency: Currency,
    policy: &RetryPolicy,
) -> Result<Option<IndexData>> {
    crate::metrics::ensure_metrics_described();

    let what = format!("{} base index ({})", currency, source.name());
    let fetched = retry_with_backoff(policy, &what, || source.fetch_base(currency))
        .await
        .inspect_err(|_| {
            counter!("measure_fetch_errors_total").increment(1);
        })?;

    let Some(file) = fetched else {
        tracing::debug!(target: "loader", %currency, "no base index published");
        return Ok(None);
    };

    let series = file.normalize();
    let Some((earliest_year, latest_year)) = series.bounds() else {
        tracing::warn!(target: "loader", %currency, "base index has no usable points");
        return Ok(None);
    };

    if let (Some(declared_lo), Some(declared_hi)) = (file.earliest_year, file.latest_year) {
        if declared_lo != earliest_year || declared_hi != latest_year {
            tracing::debug!(
                target: "loader",
                %currency,
                declared = ?(declared_lo, declared_hi),
                derived = ?(earliest_year, latest_year),
                "declared year bounds differ from data"
            );
        }
    }

    Ok(Some(IndexData {
        currency,
        series,
        earliest_year,
        latest_year,
        metadata: file.metadata,
    }))
}

/// Load one per-measure dataset and turn it into an `InflationMeasure`.
///
/// Metadata may override weight, confidence, description and the real-data
/// flag; anything absent falls back to the canonical table. Published files
/// count as real data unless they say otherwise.
pub async fn load_measure(
    source: &dyn SeriesSource,
    currency: Currency,
    key: MeasureKey,
    policy: &RetryPolicy,
) -> Result<Option<InflationMeasure>> {
    let what = format!("{} {} ({})", currency, key, source.name());
    let fetched = retry_with_backoff(policy, &what, || source.fetch_measure(currency, key))
        .await
        .inspect_err(|_| {
            counter!("measure_fetch_errors_total").increment(1);
        })?;

    let Some(file) = fetched else {
        return Ok(None);
    };

    let series = file.normalize();
    if series.is_empty() {
        tracing::warn!(target: "loader", %currency, measure = %key, "measure dataset has no usable points");
        return Ok(None);
    }

    let meta = file.metadata;
    let mut m = InflationMeasure::standard(key, series, meta.is_real_data.unwrap_or(true));
    if let Some(w) = meta.weight {
        m = m.with_weight(w);
    }
    if let Some(c) = meta.confidence {
        m = m.with_confidence(c);
    }
    if let Some(d) = meta.description.filter(|d| !d.trim().is_empty()) {
        m.description = d;
    }
    Ok(Some(m))
}

//! # Measure resolution
//! Currency → the set of measures a consensus can be computed over.
//!
//! Order of preference:
//! 1. Per-measure datasets, loaded concurrently; one failing measure only
//!    drops that measure.
//! 2. Simulated measures derived from the base index.
//! 3. Nothing: an empty `Unavailable` set, never an error.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::currency::Currency;
use crate::loader::retry::RetryPolicy;
use crate::loader::types::SeriesSource;
use crate::loader::{load_index, load_measure};
use crate::measures::{simulate_from_base, MeasureKey, MeasureSet, Measures};

static NO_MEASURES: Measures = BTreeMap::new();

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub currency: Currency,
    pub set: MeasureSet,
    pub has_real_data: bool,
    pub fallback_used: bool,
    pub resolved_at: DateTime<Utc>,
    /// Measures whose fetch failed transiently (not merely unpublished).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_measures: Vec<MeasureKey>,
}

impl Resolution {
    pub fn new(currency: Currency, set: MeasureSet) -> Self {
        Self {
            currency,
            has_real_data: set.has_real_data(),
            fallback_used: set.fallback_used(),
            set,
            resolved_at: Utc::now(),
            failed_measures: Vec::new(),
        }
    }

    pub fn unavailable(currency: Currency) -> Self {
        Self::new(currency, MeasureSet::Unavailable)
    }

    /// Resolved measures; empty when nothing could be loaded.
    pub fn measures(&self) -> &Measures {
        self.set.measures().unwrap_or(&NO_MEASURES)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Resolve the measures usable for `currency`. Never fails.
pub async fn resolve_measures(
    source: &dyn SeriesSource,
    currency: Currency,
    policy: &RetryPolicy,
) -> Resolution {
    crate::metrics::ensure_metrics_described();
    counter!("measure_resolutions_total").increment(1);

    // Loads are independent; run them together so retries overlap.
    let loads = MeasureKey::ALL.map(|key| async move {
        (key, load_measure(source, currency, key, policy).await)
    });

    let mut real = Measures::new();
    let mut failed = Vec::new();
    for (key, loaded) in join_all(loads).await {
        match loaded {
            Ok(Some(m)) => {
                real.insert(m.key, m);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(target: "resolve", %currency, measure = %key, error = %e, "measure unavailable");
                failed.push(key);
            }
        }
    }

    if !real.is_empty() {
        tracing::info!(target: "resolve", %currency, measures = real.len(), "resolved real measures");
        let mut r = Resolution::new(currency, MeasureSet::Real(real));
        r.failed_measures = failed;
        return r;
    }

    counter!("measure_fallback_total").increment(1);
    let set = match load_index(source, currency, policy).await {
        Ok(Some(index)) => {
            tracing::info!(
                target: "resolve",
                %currency,
                earliest = index.earliest_year,
                latest = index.latest_year,
                "no per-measure data; simulating from base index"
            );
            MeasureSet::Simulated(simulate_from_base(&index.series))
        }
        Ok(None) => {
            tracing::warn!(target: "resolve", %currency, "no base index published");
            MeasureSet::Unavailable
        }
        Err(e) => {
            tracing::warn!(target: "resolve", %currency, error = %e, "base index unavailable");
            MeasureSet::Unavailable
        }
    };

    let mut r = Resolution::new(currency, set);
    r.failed_measures = failed;
    r
}

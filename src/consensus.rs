//! # Consensus Engine
//! Pure, testable logic that maps `(measures, years, amount)` → `ConsensusResult`.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! For every measure with a usable value at both years:
//!   adjusted = amount × series[to] / series[from]
//!   percent  = (adjusted − amount) / amount × 100
//! Measures missing either endpoint are left out entirely. The consensus is
//! the weight-scaled sum over the measures that remain, using each measure's
//! weight as given (`WeightingMode::AsGiven`). When measures drop out those
//! weights no longer sum to 1 and the consensus is not a true weighted
//! average; `WeightingMode::Renormalized` divides by the included weight
//! instead.
//!
//! Year order is not checked: `from > to` yields the reverse ratio.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::measures::{clamp_weight, Confidence, InflationMeasure, MeasureKey, Measures};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    /// Σ value × weight over included measures, weights untouched.
    #[default]
    AsGiven,
    /// Same sum divided by the total weight of included measures.
    Renormalized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureResult {
    pub key: MeasureKey,
    pub measure_name: String,
    pub adjusted_amount: f64,
    pub total_inflation_percent: f64,
    pub weight: f64,
    pub confidence: Confidence,
    pub is_real_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub currency: Currency,
    pub from_year: i32,
    pub to_year: i32,
    pub amount: f64,
    pub individual_measures: Vec<MeasureResult>,
    pub consensus_adjusted_amount: f64,
    pub consensus_total_inflation_percent: f64,
    /// Σ weight of the measures that made it into `individual_measures`.
    pub included_weight: f64,
}

impl ConsensusResult {
    /// Zero/empty sentinel returned for unusable input.
    pub fn empty(currency: Currency, from_year: i32, to_year: i32) -> Self {
        Self {
            currency,
            from_year,
            to_year,
            amount: 0.0,
            individual_measures: Vec::new(),
            consensus_adjusted_amount: 0.0,
            consensus_total_inflation_percent: 0.0,
            included_weight: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.individual_measures.is_empty()
    }

    pub fn measure(&self, key: MeasureKey) -> Option<&MeasureResult> {
        self.individual_measures.iter().find(|m| m.key == key)
    }
}

/// A usable principal: finite and strictly positive.
pub fn valid_amount(amount: f64) -> Option<f64> {
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Parse user-entered amount text ("1,250.50", " 100 ").
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().and_then(valid_amount)
}

/// Amount from a JSON number or numeric string.
pub fn amount_from_json(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64().and_then(valid_amount),
        serde_json::Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Adjusted amount and percent change for one measure, if both endpoints exist.
pub fn adjust_measure(
    measure: &InflationMeasure,
    from_year: i32,
    to_year: i32,
    amount: f64,
) -> Option<(f64, f64)> {
    let from = measure.series.value_at(from_year)?;
    let to = measure.series.value_at(to_year)?;
    let adjusted = amount * (to / from);
    let percent = (adjusted - amount) / amount * 100.0;
    (adjusted.is_finite() && percent.is_finite()).then_some((adjusted, percent))
}

/// Consensus with weights as given.
pub fn compute_consensus(
    measures: &Measures,
    currency: Currency,
    from_year: i32,
    to_year: i32,
    amount: f64,
) -> ConsensusResult {
    compute_consensus_with(
        WeightingMode::AsGiven,
        measures,
        currency,
        from_year,
        to_year,
        amount,
    )
}

pub fn compute_consensus_with(
    mode: WeightingMode,
    measures: &Measures,
    currency: Currency,
    from_year: i32,
    to_year: i32,
    amount: f64,
) -> ConsensusResult {
    crate::metrics::ensure_metrics_described();
    counter!("consensus_requests_total").increment(1);
    let t0 = std::time::Instant::now();

    let Some(amount) = valid_amount(amount) else {
        tracing::debug!(target: "consensus", %currency, amount, "unusable amount, returning empty result");
        return ConsensusResult::empty(currency, from_year, to_year);
    };

    // 1) Per-measure results, canonical order.
    let mut individual = Vec::with_capacity(measures.len());
    for key in MeasureKey::ALL {
        let Some(m) = measures.get(&key) else {
            continue;
        };
        if m.key != key {
            tracing::warn!(target: "consensus", slot = %key, measure = %m.key, "measure filed under wrong key, skipped");
            continue;
        }
        let Some((adjusted, percent)) = adjust_measure(m, from_year, to_year, amount) else {
            tracing::debug!(target: "consensus", measure = %key, from_year, to_year, "missing endpoint, excluded");
            continue;
        };
        individual.push(MeasureResult {
            key,
            measure_name: m.name.clone(),
            adjusted_amount: adjusted,
            total_inflation_percent: percent,
            weight: clamp_weight(m.weight),
            confidence: m.confidence,
            is_real_data: m.is_real_data,
        });
    }

    // 2) Weighted sums.
    let included_weight: f64 = individual.iter().map(|r| r.weight).sum();
    let mut adjusted_sum: f64 = individual.iter().map(|r| r.adjusted_amount * r.weight).sum();
    let mut percent_sum: f64 = individual
        .iter()
        .map(|r| r.total_inflation_percent * r.weight)
        .sum();

    if mode == WeightingMode::Renormalized {
        if included_weight > 0.0 {
            adjusted_sum /= included_weight;
            percent_sum /= included_weight;
        } else {
            adjusted_sum = 0.0;
            percent_sum = 0.0;
        }
    }

    let result = ConsensusResult {
        currency,
        from_year,
        to_year,
        amount,
        individual_measures: individual,
        consensus_adjusted_amount: finite_or_zero(adjusted_sum),
        consensus_total_inflation_percent: finite_or_zero(percent_sum),
        included_weight: finite_or_zero(included_weight),
    };

    histogram!("consensus_compute_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    tracing::debug!(
        target: "consensus",
        %currency,
        from_year,
        to_year,
        included = result.individual_measures.len(),
        consensus = result.consensus_adjusted_amount,
        "consensus computed"
    );
    result
}

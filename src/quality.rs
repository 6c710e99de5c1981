//! Data-quality summary for a resolved measure set. Display-only; never
//! feeds back into the consensus arithmetic.

use serde::{Deserialize, Serialize};

use crate::measures::Measures;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityDetails {
    pub total_measures: usize,
    pub real_data_measures: usize,
    pub estimated_measures: usize,
    /// Mean of (latest year − earliest year) across measures.
    pub average_years_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityScore {
    /// 0–100, share of measures backed by real data.
    pub score: u8,
    pub details: DataQualityDetails,
}

pub fn score_data_quality(measures: &Measures) -> DataQualityScore {
    let total = measures.len();
    if total == 0 {
        return DataQualityScore::default();
    }

    let real = measures.values().filter(|m| m.is_real_data).count();
    let coverage_sum: f64 = measures.values().map(|m| m.series.span_years() as f64).sum();

    let score = (100.0 * real as f64 / total as f64).round().clamp(0.0, 100.0) as u8;

    DataQualityScore {
        score,
        details: DataQualityDetails {
            total_measures: total,
            real_data_measures: real,
            estimated_measures: total - real,
            average_years_coverage: coverage_sum / total as f64,
        },
    }
}

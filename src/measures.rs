//! # Measures
//!
//! The six standard inflation measures, their canonical display order,
//! default weights/confidence labels, and the resolved measure set a
//! consensus is computed over.
//!
//! - `MeasureKey` orders canonically: CPI, Core CPI, Chained CPI, PCE, PPI,
//!   GDP Deflator. Any `BTreeMap<MeasureKey, _>` therefore iterates in
//!   display order.
//! - `MeasureSet` is selected once at resolution time (real data, simulated
//!   fallback, or nothing) and consumed uniformly afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::series::IndexSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKey {
    Cpi,
    CoreCpi,
    ChainedCpi,
    Pce,
    Ppi,
    GdpDeflator,
}

impl MeasureKey {
    /// Canonical display order.
    pub const ALL: [MeasureKey; 6] = [
        MeasureKey::Cpi,
        MeasureKey::CoreCpi,
        MeasureKey::ChainedCpi,
        MeasureKey::Pce,
        MeasureKey::Ppi,
        MeasureKey::GdpDeflator,
    ];

    /// Stable machine key; also the dataset file stem.
    pub fn slug(self) -> &'static str {
        match self {
            MeasureKey::Cpi => "cpi",
            MeasureKey::CoreCpi => "core_cpi",
            MeasureKey::ChainedCpi => "chained_cpi",
            MeasureKey::Pce => "pce",
            MeasureKey::Ppi => "ppi",
            MeasureKey::GdpDeflator => "gdp_deflator",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MeasureKey::Cpi => "CPI",
            MeasureKey::CoreCpi => "Core CPI",
            MeasureKey::ChainedCpi => "Chained CPI",
            MeasureKey::Pce => "PCE",
            MeasureKey::Ppi => "PPI",
            MeasureKey::GdpDeflator => "GDP Deflator",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MeasureKey::Cpi => {
                "Consumer Price Index: the cost of a fixed basket of goods and services bought by urban consumers."
            }
            MeasureKey::CoreCpi => {
                "CPI excluding food and energy, which strips out the most volatile prices."
            }
            MeasureKey::ChainedCpi => {
                "CPI variant that accounts for consumers substituting between goods as relative prices change."
            }
            MeasureKey::Pce => {
                "Personal Consumption Expenditures price index, the central bank's preferred inflation gauge."
            }
            MeasureKey::Ppi => {
                "Producer Price Index: prices received by domestic producers, often a leading indicator."
            }
            MeasureKey::GdpDeflator => {
                "Price level of all domestically produced final goods and services in the economy."
            }
        }
    }

    /// Weight used for simulated sets and for real datasets that omit one.
    pub fn default_weight(self) -> f64 {
        match self {
            MeasureKey::Cpi => 0.25,
            MeasureKey::CoreCpi => 0.20,
            MeasureKey::ChainedCpi => 0.15,
            MeasureKey::Pce => 0.15,
            MeasureKey::Ppi => 0.10,
            MeasureKey::GdpDeflator => 0.15,
        }
    }

    pub fn default_confidence(self) -> Confidence {
        match self {
            MeasureKey::Cpi => Confidence::VeryHigh,
            MeasureKey::CoreCpi => Confidence::High,
            MeasureKey::ChainedCpi => Confidence::High,
            MeasureKey::Pce => Confidence::High,
            MeasureKey::Ppi => Confidence::Medium,
            MeasureKey::GdpDeflator => Confidence::Medium,
        }
    }

    /// Multiplier applied to the base series when simulating this measure.
    pub fn simulation_factor(self) -> f64 {
        match self {
            MeasureKey::Cpi => 1.00,
            MeasureKey::CoreCpi => 0.98,
            MeasureKey::ChainedCpi => 0.96,
            MeasureKey::Pce => 0.97,
            MeasureKey::Ppi => 1.02,
            MeasureKey::GdpDeflator => 0.99,
        }
    }

    /// Accepts slugs and display names, case-insensitively.
    pub fn lookup(key: &str) -> Option<MeasureKey> {
        let k = key.trim();
        MeasureKey::ALL
            .into_iter()
            .find(|m| m.slug().eq_ignore_ascii_case(k) || m.display_name().eq_ignore_ascii_case(k))
    }
}

impl fmt::Display for MeasureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for MeasureKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasureKey::lookup(s).ok_or_else(|| anyhow::anyhow!("unknown measure '{s}'"))
    }
}

/// Display name for a measure key; unknown keys are returned unchanged.
pub fn display_name(key: &str) -> String {
    MeasureKey::lookup(key)
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Human-readable description for a measure key; empty for unknown keys.
pub fn description(key: &str) -> &'static str {
    MeasureKey::lookup(key).map(MeasureKey::description).unwrap_or("")
}

/// Qualitative trust label. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "Very High", alias = "VeryHigh", alias = "very_high")]
    VeryHigh,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::VeryHigh => "Very High",
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One named economic index with its weight in the consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationMeasure {
    pub key: MeasureKey,
    pub name: String,
    pub description: String,
    pub series: IndexSeries,
    pub weight: f64,
    pub confidence: Confidence,
    pub is_real_data: bool,
}

impl InflationMeasure {
    /// A measure with the canonical name, description, weight and confidence.
    pub fn standard(key: MeasureKey, series: IndexSeries, is_real_data: bool) -> Self {
        Self {
            key,
            name: key.display_name().to_string(),
            description: key.description().to_string(),
            series,
            weight: key.default_weight(),
            confidence: key.default_confidence(),
            is_real_data,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = clamp_weight(weight);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A weight in [0, 1]; NaN and infinities become 0.
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Measures keyed canonically.
pub type Measures = BTreeMap<MeasureKey, InflationMeasure>;

/// Where a resolved set of measures came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "measures", rename_all = "snake_case")]
pub enum MeasureSet {
    /// At least one per-measure dataset was published for the currency.
    Real(Measures),
    /// Derived from the base index because no per-measure dataset exists.
    Simulated(Measures),
    /// Neither per-measure nor base data could be loaded.
    Unavailable,
}

impl MeasureSet {
    pub fn measures(&self) -> Option<&Measures> {
        match self {
            MeasureSet::Real(m) | MeasureSet::Simulated(m) => Some(m),
            MeasureSet::Unavailable => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measures().map_or(true, |m| m.is_empty())
    }

    pub fn has_real_data(&self) -> bool {
        matches!(self, MeasureSet::Real(m) if !m.is_empty())
    }

    pub fn fallback_used(&self) -> bool {
        !matches!(self, MeasureSet::Real(_))
    }

    pub fn total_weight(&self) -> f64 {
        self.measures()
            .map(|m| m.values().map(|x| x.weight).sum())
            .unwrap_or(0.0)
    }
}

/// Simulated measures derived from one base series using the fixed
/// multipliers and weights.
pub fn simulate_from_base(base: &IndexSeries) -> Measures {
    MeasureKey::ALL
        .into_iter()
        .map(|key| {
            let m = InflationMeasure::standard(key, base.scaled(key.simulation_factor()), false);
            (key, m)
        })
        .collect()
}

//! # Index series
//! Year → index-value series and the JSON dataset shape they are read from.
//!
//! Two value shapes are accepted per year:
//! - flat: `"1990": 130.7`
//! - record: `"1990": { "index_value": 130.7, "inflation_factor": 2.41, "year_over_year_change": 5.4 }`
//!
//! `inflation_factor` is "multiply by this to reach the latest year", so it
//! runs inversely to the index. A file is read in one unit only: if every
//! record carries a usable `index_value` the series is the index values;
//! otherwise the whole series is rebuilt as `100 / inflation_factor`, and
//! flat numbers in that file are dropped. Anything else (nulls, strings,
//! non-year keys, years outside the domain, zero or negative values) is
//! dropped during normalization, so a present point is always a finite
//! positive number.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::measures::Confidence;

/// Earliest year any published index covers.
pub const MIN_YEAR: i32 = 1913;
/// Latest year the datasets are generated for.
pub const MAX_YEAR: i32 = 2026;

pub fn year_in_domain(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

fn usable(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Ordered year → index mapping holding only usable points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSeries(BTreeMap<i32, f64>);

impl IndexSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<I: IntoIterator<Item = (i32, f64)>>(points: I) -> Self {
        let mut s = Self::new();
        for (year, value) in points {
            s.insert(year, value);
        }
        s
    }

    /// Insert a point; unusable values and out-of-domain years are ignored.
    /// Returns whether the point was kept.
    pub fn insert(&mut self, year: i32, value: f64) -> bool {
        if year_in_domain(year) && usable(value) {
            self.0.insert(year, value);
            true
        } else {
            false
        }
    }

    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.0.get(&year).copied().filter(|v| usable(*v))
    }

    pub fn earliest_year(&self) -> Option<i32> {
        self.0.keys().next().copied()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.0.keys().next_back().copied()
    }

    pub fn bounds(&self) -> Option<(i32, i32)> {
        Some((self.earliest_year()?, self.latest_year()?))
    }

    /// Years between the first and last point (0 when fewer than two points).
    pub fn span_years(&self) -> i32 {
        self.bounds().map(|(lo, hi)| hi - lo).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.0.iter().map(|(y, v)| (*y, *v))
    }

    /// Every point multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_points(self.iter().map(|(y, v)| (y, v * factor)))
    }
}

/// Optional per-file descriptors. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub is_real_data: Option<bool>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexRecord {
    #[serde(default)]
    pub index_value: Option<f64>,
    #[serde(default)]
    pub inflation_factor: Option<f64>,
    #[serde(default)]
    pub year_over_year_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    Value(f64),
    Record(IndexRecord),
    Other(serde_json::Value),
}

impl RawPoint {
    /// The point read as an index level.
    pub fn index_value(&self) -> Option<f64> {
        match self {
            RawPoint::Value(v) => Some(*v).filter(|v| usable(*v)),
            RawPoint::Record(r) => r.index_value.filter(|v| usable(*v)),
            RawPoint::Other(_) => None,
        }
    }

    /// The point's inflation factor, records only.
    pub fn inflation_factor(&self) -> Option<f64> {
        match self {
            RawPoint::Record(r) => r.inflation_factor.filter(|v| usable(*v)),
            _ => None,
        }
    }

    fn needs_factor(&self) -> bool {
        matches!(self, RawPoint::Record(_)) && self.index_value().is_none()
    }
}

/// One dataset file as published: `{ metadata, data, earliest_year, latest_year }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesFile {
    #[serde(default)]
    pub metadata: SeriesMetadata,
    #[serde(default)]
    pub data: BTreeMap<String, RawPoint>,
    #[serde(default)]
    pub earliest_year: Option<i32>,
    #[serde(default)]
    pub latest_year: Option<i32>,
}

impl SeriesFile {
    /// Parse either the wrapped dataset shape or a bare `year → value` object.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let v: serde_json::Value = serde_json::from_str(s).context("parsing series json")?;
        let wrapped = v.as_object().is_some_and(|o| o.contains_key("data"));
        if wrapped {
            serde_json::from_value(v).context("decoding series file")
        } else {
            let data: BTreeMap<String, RawPoint> =
                serde_json::from_value(v).context("decoding flat series map")?;
            Ok(Self {
                data,
                ..Self::default()
            })
        }
    }

    /// Normalize to a single numeric series.
    pub fn normalize(&self) -> IndexSeries {
        let points = self
            .data
            .iter()
            .filter_map(|(key, raw)| key.trim().parse::<i32>().ok().map(|y| (y, raw)));

        if self.uses_factors() {
            IndexSeries::from_points(
                points.filter_map(|(y, raw)| raw.inflation_factor().map(|f| (y, 100.0 / f))),
            )
        } else {
            IndexSeries::from_points(points.filter_map(|(y, raw)| raw.index_value().map(|v| (y, v))))
        }
    }

    /// True when some year's record has no usable `index_value`.
    pub fn uses_factors(&self) -> bool {
        self.data
            .iter()
            .any(|(key, raw)| key.trim().parse::<i32>().is_ok() && raw.needs_factor())
    }
}

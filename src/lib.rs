// src/lib.rs
// Public library surface for integration tests and the binaries.

pub mod api;
pub mod calculator;
pub mod config;
pub mod consensus;
pub mod currency;
pub mod loader;
pub mod measures;
pub mod metrics;
pub mod quality;
pub mod resolve;
pub mod series;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::{app, router, AppState};
pub use crate::consensus::{compute_consensus, compute_consensus_with, ConsensusResult, WeightingMode};
pub use crate::currency::Currency;
pub use crate::measures::{Confidence, InflationMeasure, MeasureKey, MeasureSet, Measures};
pub use crate::quality::{score_data_quality, DataQualityScore};
pub use crate::resolve::{resolve_measures, Resolution};

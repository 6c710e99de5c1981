// tests/consensus_scenarios.rs
//
// End-to-end properties of the consensus engine over hand-built measure sets.

use rand::{rngs::StdRng, Rng, SeedableRng};

use inflation_consensus::consensus::{parse_amount, ConsensusResult};
use inflation_consensus::measures::simulate_from_base;
use inflation_consensus::series::{IndexSeries, MAX_YEAR, MIN_YEAR};
use inflation_consensus::{
    compute_consensus, compute_consensus_with, Currency, InflationMeasure, MeasureKey, Measures,
    WeightingMode,
};

fn base() -> IndexSeries {
    IndexSeries::from_points([(2000, 172.2), (2024, 310.3)])
}

fn six_measures() -> Measures {
    simulate_from_base(&base())
}

fn assert_sentinel(r: &ConsensusResult) {
    assert!(r.individual_measures.is_empty());
    assert_eq!(r.consensus_adjusted_amount, 0.0);
    assert_eq!(r.consensus_total_inflation_percent, 0.0);
}

#[test]
fn scenario_single_cpi() {
    let mut m = Measures::new();
    m.insert(
        MeasureKey::Cpi,
        InflationMeasure::standard(MeasureKey::Cpi, base(), true).with_weight(1.0),
    );
    let r = compute_consensus(&m, Currency::Usd, 2000, 2024, 100.0);
    let cpi = r.measure(MeasureKey::Cpi).expect("cpi included");
    assert!((cpi.adjusted_amount - 180.19).abs() < 0.01);
    assert!((cpi.total_inflation_percent - 80.19).abs() < 0.01);
}

#[test]
fn scenario_six_measures_weighted_sum() {
    let measures = six_measures();
    let r = compute_consensus(&measures, Currency::Usd, 2000, 2024, 100.0);
    assert_eq!(r.individual_measures.len(), 6);

    let hand: f64 = MeasureKey::ALL
        .iter()
        .map(|k| {
            let s = &measures[k].series;
            let adjusted = 100.0 * s.value_at(2024).unwrap() / s.value_at(2000).unwrap();
            adjusted * k.default_weight()
        })
        .sum();
    assert!((r.consensus_adjusted_amount - hand).abs() < 0.01);
    assert!((r.included_weight - 1.0).abs() < 1e-9);
}

#[test]
fn scenario_invalid_amounts_yield_sentinel() {
    let measures = six_measures();
    let r = compute_consensus(&measures, Currency::Usd, 2000, 2024, -5.0);
    assert_sentinel(&r);

    assert_eq!(parse_amount("abc"), None);
    let r = match parse_amount("abc") {
        Some(a) => compute_consensus(&measures, Currency::Usd, 2000, 2024, a),
        None => ConsensusResult::empty(Currency::Usd, 2000, 2024),
    };
    assert_sentinel(&r);
}

#[test]
fn identity_when_years_match() {
    let r = compute_consensus(&six_measures(), Currency::Usd, 2024, 2024, 1234.56);
    for m in &r.individual_measures {
        assert_eq!(m.adjusted_amount, 1234.56);
        assert_eq!(m.total_inflation_percent, 0.0);
    }
}

#[test]
fn rising_index_strictly_inflates() {
    let series = IndexSeries::from_points((1990..=2024).map(|y| (y, 100.0 + (y - 1990) as f64 * 3.5)));
    let measures = simulate_from_base(&series);
    for from in (1990..2024).step_by(5) {
        let r = compute_consensus(&measures, Currency::Cad, from, 2024, 50.0);
        assert_eq!(r.individual_measures.len(), 6);
        for m in &r.individual_measures {
            assert!(m.adjusted_amount > 50.0, "{} {from}", m.measure_name);
            assert!(m.total_inflation_percent > 0.0, "{} {from}", m.measure_name);
        }
    }
}

#[test]
fn falling_index_strictly_deflates() {
    let series = IndexSeries::from_points((1920..=1940).map(|y| (y, 200.0 - (y - 1920) as f64 * 4.0)));
    let measures = simulate_from_base(&series);
    for from in 1920..1940 {
        let r = compute_consensus(&measures, Currency::Usd, from, 1940, 50.0);
        assert_eq!(r.individual_measures.len(), 6);
        for m in &r.individual_measures {
            assert!(m.adjusted_amount < 50.0, "{} {from}", m.measure_name);
            assert!(m.total_inflation_percent < 0.0, "{} {from}", m.measure_name);
        }
    }
}

#[test]
fn missing_endpoint_excludes_only_that_measure() {
    let mut measures = six_measures();
    measures.get_mut(&MeasureKey::ChainedCpi).unwrap().series =
        IndexSeries::from_points([(2024, 300.0)]);

    let r = compute_consensus(&measures, Currency::Usd, 2000, 2024, 100.0);
    assert!(r.measure(MeasureKey::ChainedCpi).is_none());
    assert_eq!(r.individual_measures.len(), 5);
    assert!((r.included_weight - 0.85).abs() < 1e-9);

    let full = 100.0 * 310.3 / 172.2;
    assert!((r.consensus_adjusted_amount - full * 0.85).abs() < 1e-6);

    let n = compute_consensus_with(
        WeightingMode::Renormalized,
        &measures,
        Currency::Usd,
        2000,
        2024,
        100.0,
    );
    assert!((n.consensus_adjusted_amount - full).abs() < 1e-6);
}

#[test]
fn randomized_inputs_never_produce_nan() {
    let mut rng = StdRng::seed_from_u64(0x1F1A);
    for _ in 0..200 {
        let mut series = IndexSeries::new();
        for y in MIN_YEAR..=MAX_YEAR {
            if rng.random_bool(0.7) {
                series.insert(y, rng.random_range(0.001..1_000.0));
            }
        }
        let measures = simulate_from_base(&series);
        let from = rng.random_range(MIN_YEAR..=MAX_YEAR);
        let to = rng.random_range(MIN_YEAR..=MAX_YEAR);
        let amount = rng.random_range(-10.0..1e9);
        for mode in [WeightingMode::AsGiven, WeightingMode::Renormalized] {
            let r = compute_consensus_with(mode, &measures, Currency::Jpy, from, to, amount);
            assert!(r.consensus_adjusted_amount.is_finite());
            assert!(r.consensus_total_inflation_percent.is_finite());
            for m in &r.individual_measures {
                assert!(m.adjusted_amount.is_finite() && m.total_inflation_percent.is_finite());
            }
        }
    }
}

#[test]
fn result_serializes_with_snake_case_keys() {
    let r = compute_consensus(&six_measures(), Currency::Gbp, 2000, 2024, 10.0);
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["currency"], "GBP");
    assert_eq!(v["individual_measures"][0]["key"], "cpi");
    assert_eq!(v["individual_measures"][0]["confidence"], "Very High");
}

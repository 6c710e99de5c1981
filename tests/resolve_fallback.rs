// tests/resolve_fallback.rs
//
// Measure resolution against mock sources: fallback to simulation,
// retry/backoff accounting, and total unavailability.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use inflation_consensus::loader::retry::RetryPolicy;
use inflation_consensus::loader::types::SeriesSource;
use inflation_consensus::measures::MeasureSet;
use inflation_consensus::series::SeriesFile;
use inflation_consensus::{resolve_measures, Currency, MeasureKey};

const BASE: &str = r#"{"data":{"2000":172.2,"2024":310.3}}"#;

/// Counts calls; optionally fails the first `flaky` base fetches.
#[derive(Default)]
struct Counting {
    base_calls: AtomicU32,
    measure_calls: AtomicU32,
    flaky: u32,
    publish_base: bool,
    measures_error: bool,
}

#[async_trait]
impl SeriesSource for Counting {
    async fn fetch_base(&self, _c: Currency) -> Result<Option<SeriesFile>> {
        let n = self.base_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.flaky {
            return Err(anyhow!("503 from upstream (call {n})"));
        }
        if self.publish_base {
            SeriesFile::from_json_str(BASE).map(Some)
        } else {
            Ok(None)
        }
    }

    async fn fetch_measure(&self, _c: Currency, _k: MeasureKey) -> Result<Option<SeriesFile>> {
        self.measure_calls.fetch_add(1, Ordering::SeqCst);
        if self.measures_error {
            Err(anyhow!("connection reset"))
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::default().with_initial_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn no_real_measures_falls_back_to_simulated_table() {
    let src = Counting {
        publish_base: true,
        ..Default::default()
    };
    let r = resolve_measures(&src, Currency::Gbp, &fast_policy()).await;

    assert!(!r.has_real_data);
    assert!(r.fallback_used);
    let MeasureSet::Simulated(ms) = &r.set else {
        panic!("expected simulated set, got {:?}", r.set);
    };
    assert_eq!(ms.len(), 6);
    for key in MeasureKey::ALL {
        let m = &ms[&key];
        assert_eq!(m.weight, key.default_weight());
        assert!(!m.is_real_data);
        let expected = 172.2 * key.simulation_factor();
        assert!((m.series.value_at(2000).unwrap() - expected).abs() < 1e-9);
    }
    // Unpublished measures are not retried.
    assert_eq!(src.measure_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn transient_base_failures_are_retried_then_succeed() {
    let src = Counting {
        publish_base: true,
        flaky: 2,
        ..Default::default()
    };
    let r = resolve_measures(&src, Currency::Aud, &fast_policy()).await;
    assert_eq!(src.base_calls.load(Ordering::SeqCst), 3);
    assert!(matches!(r.set, MeasureSet::Simulated(_)));
}

#[tokio::test]
async fn exhausted_retries_yield_empty_resolution() {
    let src = Counting {
        publish_base: true,
        flaky: 10,
        measures_error: true,
        ..Default::default()
    };
    let r = resolve_measures(&src, Currency::Nzd, &fast_policy()).await;
    assert_eq!(src.base_calls.load(Ordering::SeqCst), 3);
    assert_eq!(src.measure_calls.load(Ordering::SeqCst), 18);
    assert!(r.is_empty());
    assert!(matches!(r.set, MeasureSet::Unavailable));
    assert_eq!(r.failed_measures, MeasureKey::ALL.to_vec());
}

#[tokio::test]
async fn source_is_usable_behind_arc_dyn() {
    let src: Arc<dyn SeriesSource> = Arc::new(Counting::default());
    let r = resolve_measures(src.as_ref(), Currency::Chf, &RetryPolicy::no_retry()).await;
    assert!(r.is_empty());
    assert!(!r.has_real_data);
}

#[tokio::test]
async fn failing_measures_retry_in_parallel_before_fallback() {
    let src = Counting {
        publish_base: true,
        measures_error: true,
        ..Default::default()
    };
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_delay_ms: 100,
        multiplier: 2.0,
    };

    let t0 = Instant::now();
    let r = resolve_measures(&src, Currency::Eur, &policy).await;
    let elapsed = t0.elapsed();

    assert!(matches!(r.set, MeasureSet::Simulated(_)));
    assert_eq!(src.measure_calls.load(Ordering::SeqCst), 18);
    // One 100 + 200 ms backoff chain, not six of them back to back (1.8 s).
    assert!(elapsed < Duration::from_millis(1_000), "took {elapsed:?}");
}

//! Drives the calculator against the configured datasets and prints the result.
//!
//! Usage: `consensus_demo [CURRENCY] [FROM] [TO] [AMOUNT]`
//! A currency switch mid-load is simulated to show that only the last
//! requested currency is reported.

use anyhow::{Context, Result};
use inflation_consensus::calculator::{reduce, Event, State};
use inflation_consensus::config::{build_source, AppConfig};
use inflation_consensus::session::MeasureSession;
use inflation_consensus::Currency;
use tokio::sync::mpsc;

fn parse_year(arg: Option<String>, default: i32) -> Result<i32> {
    Ok(arg.map(|s| s.parse::<i32>()).transpose()?.unwrap_or(default))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let _ = dotenvy::dotenv();

    let cfg = AppConfig::load_default()?;
    let mut args = std::env::args().skip(1);
    let currency = match args.next() {
        Some(c) => c.parse::<Currency>()?,
        None => cfg.default_currency,
    };
    let from_year = parse_year(args.next(), 2000).context("from year")?;
    let to_year = parse_year(args.next(), 2024).context("to year")?;
    let amount = args.next().unwrap_or_else(|| "100".to_string());

    let (tx, mut rx) = mpsc::channel(8);
    let session = MeasureSession::new(build_source(&cfg), cfg.retry, tx);

    // Start on a different currency, then switch: the first load is superseded.
    let decoy = if currency == Currency::Eur { Currency::Usd } else { Currency::Eur };
    let mut state = State::new(decoy, from_year, to_year, amount).with_weighting(cfg.weighting);
    if let Some((id, cur)) = state.pending_fetch() {
        session.request(id, cur);
    }
    state = reduce(state, Event::CurrencyChanged(currency));
    if let Some((id, cur)) = state.pending_fetch() {
        session.request(id, cur);
    }

    while state.is_loading() {
        let Some(event) = rx.recv().await else {
            break;
        };
        state = reduce(state, event);
    }

    if let Some(err) = &state.error {
        println!("error: {} (retryable: {})", err.message, err.retryable);
        return Ok(());
    }

    let result = state.consensus();
    let quality = state.quality();
    println!(
        "{} {} in {} ≈ {:.2} in {} ({:+.2}%)",
        result.currency,
        result.amount,
        result.from_year,
        result.consensus_adjusted_amount,
        result.to_year,
        result.consensus_total_inflation_percent
    );
    for m in &result.individual_measures {
        println!(
            "  {:<14} {:>10.2}  w={:.2}  {}{}",
            m.measure_name,
            m.adjusted_amount,
            m.weight,
            m.confidence.label(),
            if m.is_real_data { "" } else { " (estimated)" }
        );
    }
    println!(
        "data quality: {}/100 ({} real of {})",
        quality.score, quality.details.real_data_measures, quality.details.total_measures
    );
    Ok(())
}

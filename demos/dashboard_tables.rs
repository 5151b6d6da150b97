use std::{path::Path, time::Instant};

use anyhow::{Context, Result};
use orderlens::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Computes every table the dashboard renders and prints/exports them:
/// the universe-wide EQS ranking, one instrument's weekly/daily breakdowns
/// and the baseline overlay values.
fn main() -> Result<()> {
    init_tracing();

    let config = LensConfig::from_env();
    println!("Source: {}", config.parquet_path.display());

    let load_start = Instant::now();
    let dataset = load_parquet(&config.parquet_path).context("Failed to load source parquet")?;
    let load_time = load_start.elapsed();

    let (start, end) = dataset
        .date_span()?
        .context("Source dataset contains no trading days")?;
    println!("Coverage: {start} -> {end} ({} rows)", dataset.height());

    // ------------------------------------------------------------------
    // 1) Universe-wide comparison
    // ------------------------------------------------------------------
    let universe = Universe::bist100();
    let available = universe.available_in(&dataset)?;
    info!(instruments = available.len(), "Comparison universe resolved");

    let metric = MetricKind::Eqs;
    let scope = PeriodScope::for_instruments(available.clone()).with_dates(start, end);

    let rank_start = Instant::now();
    let ranking = match Ranking::compute(&dataset, &scope, metric)? {
        ScopeOutcome::Data(ranking) => ranking,
        ScopeOutcome::Empty => {
            println!("No data in the selected scope.");
            return Ok(());
        }
    };
    let rank_time = rank_start.elapsed();

    println!("\n=== {} ===", metric.label());
    println!(
        "{} instruments, {} orders in scope",
        ranking.instrument_count(),
        ranking.total_orders()?
    );
    println!("{}", ranking.as_df().head(Some(10)));

    let report_dir = Path::new("demos/reports");
    ranking.to_csv(report_dir, None, None)?;

    // ------------------------------------------------------------------
    // 2) Single-instrument detail with baseline overlays
    // ------------------------------------------------------------------
    let instrument = available.first().context("No instrument available")?;
    let detail = dataset.select(&PeriodScope::single_instrument(instrument))?;

    let layout = WeekLayout::default();
    let view = match BucketedView::compute(&detail, layout)? {
        ScopeOutcome::Data(view) => view,
        ScopeOutcome::Empty => {
            println!("No detail data for {instrument}.");
            return Ok(());
        }
    };

    let baseline = Baseline::compute(&detail)?;
    let state_order = baseline.state_order()?;

    println!("\n=== {instrument} weekly breakdown ===");
    let weekly = view.weekly()?;
    println!("{}", weekly.as_df());

    println!("Period reference (pct):      {:?}", baseline.pct_values(&state_order)?);
    println!(
        "Expected per week (counts):  {:?}",
        baseline.expected_weekly_values(&state_order, layout.days_per_week())?
    );

    for week in view.weeks()? {
        let daily = view.daily(week)?;
        println!("\n--- Week {week} ({} days) ---", view.dates_in_week(week)?.len());
        println!("{}", daily.as_df());
    }

    if config.show_table {
        println!("\n=== Raw aggregated rows for {instrument} ===");
        println!("{}", detail.as_df());
    }

    println!("\n--- Timings ---");
    println!("1. Dataset load:    {load_time:?}");
    println!("2. Ranking compute: {rank_time:?}");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use smacross::prelude::*;

/// Backtest a moving-average crossover against buy-and-hold.
#[derive(Parser, Debug)]
#[command(name = "smacross")]
struct Args {
    /// Instrument identifier.
    #[arg(long, default_value = "NVDA")]
    ticker: String,

    /// First date taken into account.
    #[arg(long, default_value = "2010-01-01")]
    start: NaiveDate,

    /// Short moving-average window.
    #[arg(long, default_value_t = 50)]
    fast: usize,

    /// Long moving-average window.
    #[arg(long, default_value_t = 200)]
    slow: usize,

    /// Cost per position change (0.001 = 0.1%).
    #[arg(long, default_value_t = 0.001)]
    cost: f64,

    /// JSON file of `{date, close}` records. Synthetic prices are used when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Number of synthetic bars.
    #[arg(long, default_value_t = 3000)]
    synthetic: usize,

    /// Seed of the synthetic prices.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the signal rows as JSON to this file.
    #[arg(long)]
    rows: Option<PathBuf>,

    /// Save the equity chart (`.svg` or `.png`). Needs the `draws` feature.
    #[arg(long)]
    chart: Option<String>,

    /// Also sweep a window grid and print the best pairs. Needs the `optimizer` feature.
    #[arg(long)]
    sweep: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::default()
        .ticker(&args.ticker)
        .start(args.start)
        .windows(args.fast, args.slow)
        .cost(args.cost);

    let series = match &args.input {
        Some(path) => get_data_from_file(path)?,
        None => {
            tracing::info!(bars = args.synthetic, seed = args.seed, "no input file, using synthetic prices");
            generate_sample_prices(args.synthetic, args.seed, 100.0)?
        }
    };

    println!("{config}");
    let backtest = Backtest::new(series, config)?;
    let report = backtest.run()?;

    println!("\n{}", report.perf());
    println!(
        "Buy & hold final equity: {:.3}",
        report.performance().baseline_final_equity()
    );
    println!("Trades: {}", report.trades());

    if let Some(path) = &args.rows {
        save_rows_to_file(path, report.rows())?;
        println!("Rows → {} (table: {})", path.display(), report.config().table_name());
    }

    if let Some(path) = &args.chart {
        draw_chart(&report, path)?;
    }

    if args.sweep {
        sweep(&backtest)?;
    }

    Ok(())
}

#[cfg(feature = "draws")]
fn draw_chart(report: &Report, path: &str) -> Result<()> {
    let output = if path.ends_with(".svg") {
        DrawOutput::Svg(path.to_string())
    } else {
        DrawOutput::Png(path.to_string())
    };
    Draw::with_report(report)
        .with_options(DrawOptions::default().draw_output(output))
        .plot()?;
    println!("Chart → {path}");
    Ok(())
}

#[cfg(not(feature = "draws"))]
fn draw_chart(_report: &Report, _path: &str) -> Result<()> {
    anyhow::bail!("charts need the `draws` feature")
}

#[cfg(feature = "optimizer")]
fn sweep(backtest: &Backtest) -> Result<()> {
    let grid = WindowGrid::new(10..=100, 50..=250, 10);
    let mut results = Optimizer::from(backtest).with(&grid)?;
    results.sort_by(|(_, a), (_, b)| {
        b.sharpe()
            .partial_cmp(&a.sharpe())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("\n=== TOP 5 WINDOWS (Sharpe) ===");
    for ((fast, slow), perf) in results.iter().take(5) {
        let sharpe = perf.sharpe().map_or("n/a".to_string(), |s| format!("{s:.2}"));
        println!("fast: {fast} slow: {slow} sharpe: {sharpe} final equity: {:.3}", perf.final_equity());
    }
    Ok(())
}

#[cfg(not(feature = "optimizer"))]
fn sweep(_backtest: &Backtest) -> Result<()> {
    anyhow::bail!("window sweeps need the `optimizer` feature")
}

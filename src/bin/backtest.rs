use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use trailstop_backtester::backtesting::data_loader;
use trailstop_backtester::backtesting::sweep;
use trailstop_backtester::backtesting::{BacktestReport, BacktestRunner};
use trailstop_backtester::config::{Config, HighWaterReset};

/// Replay hourly history through the trailing-stop / catch-low strategy.
#[derive(Debug, Parser)]
#[command(name = "backtest", version)]
struct Args {
    /// Hourly CSV export (defaults to DATA_FILE)
    #[arg(long)]
    data: Option<String>,

    /// Simulation start, RFC 3339 (defaults to START_TIME)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Stop level as a fraction of the high-water mark
    #[arg(long)]
    trailing_stop: Option<f64>,

    /// Re-entry limit as a fraction of the stop level
    #[arg(long)]
    catch_low: Option<f64>,

    /// Starting quote-asset balance
    #[arg(long)]
    balance: Option<f64>,

    /// Commission fraction per fill
    #[arg(long)]
    commission: Option<f64>,

    /// High-water-mark reset policy: never | on_entry
    #[arg(long)]
    high_water_reset: Option<String>,

    /// Write the report as JSON to this path
    #[arg(long)]
    json: Option<String>,

    /// Comma-separated trailing stops to sweep
    #[arg(long, value_delimiter = ',')]
    sweep_trailing_stop: Vec<f64>,

    /// Comma-separated catch lows to sweep
    #[arg(long, value_delimiter = ',')]
    sweep_catch_low: Vec<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = Config::from_env().context("failed to read configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    apply_overrides(&mut cfg, &args)?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          TRAILING STOP BACKTESTER                        ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Symbol:     {:<44}║", cfg.symbol);
    println!("║  Data:       {:<44}║", cfg.data_file);
    println!("║  Start:      {:<44}║", cfg.settings.start_time.format("%Y-%m-%d %H:00"));
    println!("║  Balance:    {:<44}║", format!("{:.2} {}", cfg.settings.start_balance, cfg.quote_asset));
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let quotes = data_loader::load_csv(&cfg.data_file)
        .with_context(|| format!("failed to load quotes from {}", cfg.data_file))?;

    if !args.sweep_trailing_stop.is_empty() || !args.sweep_catch_low.is_empty() {
        let trailing = non_empty_or(&args.sweep_trailing_stop, cfg.settings.trailing_stop);
        let catch_low = non_empty_or(&args.sweep_catch_low, cfg.settings.catch_low);
        let sets = sweep::grid(cfg.settings, &trailing, &catch_low);

        println!("  {:>8} {:>9} {:>8} {:>16}", "trail", "catch", "trades", "final value");
        for result in sweep::run_sweep(&quotes, &sets) {
            match &result.outcome {
                Ok(report) => println!(
                    "  {:>8} {:>9} {:>8} {:>16}",
                    result.settings.trailing_stop,
                    result.settings.catch_low,
                    report.transactions.len(),
                    report
                        .final_value
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
                Err(e) => println!(
                    "  {:>8} {:>9} error: {}",
                    result.settings.trailing_stop, result.settings.catch_low, e
                ),
            }
        }
        return Ok(());
    }

    let runner = BacktestRunner::new(&quotes, cfg.settings);
    let report = runner.run()?;

    report.print_summary(&cfg.base_asset, &cfg.quote_asset);

    if let Some(path) = &args.json {
        save_report_to_file(&report, path)?;
        println!("\nReport saved to: {}", path);
    }

    Ok(())
}

fn apply_overrides(cfg: &mut Config, args: &Args) -> Result<()> {
    if let Some(data) = &args.data {
        cfg.data_file = data.clone();
    }
    if let Some(start) = args.start {
        cfg.settings.start_time = start;
    }
    if let Some(v) = args.trailing_stop {
        cfg.settings.trailing_stop = v;
    }
    if let Some(v) = args.catch_low {
        cfg.settings.catch_low = v;
    }
    if let Some(v) = args.balance {
        cfg.settings.start_balance = v;
    }
    if let Some(v) = args.commission {
        cfg.settings.commission = v;
    }
    if let Some(raw) = &args.high_water_reset {
        cfg.settings.high_water_reset = HighWaterReset::from_str_loose(raw)
            .with_context(|| format!("unknown high-water reset policy '{}'", raw))?;
    }
    Ok(())
}

fn non_empty_or(values: &[f64], fallback: f64) -> Vec<f64> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

fn save_report_to_file(report: &BacktestReport, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path))?;
    Ok(())
}

use rayon::prelude::*;
use tracing::info;

use crate::config::BacktestSettings;
use crate::models::QuoteSeries;

use super::report::BacktestReport;
use super::runner::{BacktestError, BacktestRunner};

pub struct SweepResult {
    pub settings: BacktestSettings,
    pub outcome: Result<BacktestReport, BacktestError>,
}

impl SweepResult {
    pub fn final_value(&self) -> Option<f64> {
        self.outcome.as_ref().ok().and_then(|r| r.final_value)
    }
}

/// Every (trailing stop, catch low) pair applied to `base`.
pub fn grid(base: BacktestSettings, trailing_stops: &[f64], catch_lows: &[f64]) -> Vec<BacktestSettings> {
    trailing_stops
        .iter()
        .flat_map(|&trailing_stop| {
            catch_lows.iter().map(move |&catch_low| BacktestSettings {
                trailing_stop,
                catch_low,
                ..base
            })
        })
        .collect()
}

/// Run independent backtests in parallel over one shared series.
/// Results come back in the same order as `settings`.
pub fn run_sweep(quotes: &QuoteSeries, settings: &[BacktestSettings]) -> Vec<SweepResult> {
    info!("Sweeping {} parameter sets", settings.len());
    settings
        .par_iter()
        .map(|s| SweepResult {
            settings: *s,
            outcome: BacktestRunner::new(quotes, *s).run(),
        })
        .collect()
}

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BacktestSettings, ConfigError};
use crate::models::quote::hour_key;
use crate::models::{Quote, QuoteSeries, TradeKind};
use crate::trading::{ExecutionPrice, Position};

use super::report::BacktestReport;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] ConfigError),

    #[error("no quotes at or after {start}")]
    NoQuotesInWindow { start: DateTime<Utc> },
}

/// Walks a quote series oldest to newest, running the trailing-stop /
/// catch-low rules against a single `Position`.
pub struct BacktestRunner<'a> {
    quotes: &'a QuoteSeries,
    settings: BacktestSettings,
}

impl<'a> BacktestRunner<'a> {
    pub fn new(quotes: &'a QuoteSeries, settings: BacktestSettings) -> Self {
        Self { quotes, settings }
    }

    /// Run the full backtest. Returns a report.
    pub fn run(&self) -> Result<BacktestReport, BacktestError> {
        self.settings.validate()?;

        let start_key = hour_key(self.settings.start_time);
        let window: Vec<&Quote> = self
            .quotes
            .chronological()
            .filter(|q| q.hour_key() >= start_key)
            .collect();

        let (first, rest) = match window.split_first() {
            Some((first, rest)) => (*first, rest),
            None => {
                return Err(BacktestError::NoQuotesInWindow {
                    start: self.settings.start_time,
                })
            }
        };
        let end = window.last().map(|q| q.timestamp).unwrap_or(first.timestamp);

        let total_bars = window.len();
        let log_interval = total_bars / 20; // Log ~20 progress updates

        info!("=== BACKTEST START ===");
        info!(
            "Period: {} to {} ({} bars, source stored {})",
            first.timestamp.format("%Y-%m-%d %H:00"),
            end.format("%Y-%m-%d %H:00"),
            total_bars,
            self.quotes.order(),
        );
        info!(
            "Initial balance: {:.2} | trailing stop {} | catch low {} | commission {} | high-water reset {}",
            self.settings.start_balance,
            self.settings.trailing_stop,
            self.settings.catch_low,
            self.settings.commission,
            self.settings.high_water_reset,
        );

        let mut position = Position::new(self.quotes, self.settings, first.timestamp);
        let mut equity_curve: Vec<(DateTime<Utc>, f64)> = Vec::with_capacity(total_bars);

        // Opening market buy, then the first bar gets the same rules as every other bar
        position.buy(ExecutionPrice::Market);
        position.observe_high(first.high);
        evaluate_orders(&mut position, first);
        if let Some(value) = position.portfolio_value() {
            equity_curve.push((first.timestamp, value));
        }

        for (i, quote) in rest.iter().enumerate() {
            apply_bar(&mut position, quote);

            if let Some(value) = position.portfolio_value() {
                equity_curve.push((quote.timestamp, value));
            }

            let step = i + 2;
            if log_interval > 0 && step % log_interval == 0 {
                info!(
                    "  Progress: {:.0}% | {} | {} | Value: {:.2} | Trades: {}",
                    step as f64 / total_bars as f64 * 100.0,
                    quote.timestamp.format("%Y-%m-%d %H:00"),
                    position.state(),
                    position.portfolio_value().unwrap_or(0.0),
                    position.ledger().len(),
                );
            }
        }

        info!("=== BACKTEST COMPLETE ===");

        Ok(BacktestReport::from_run(
            position,
            first.timestamp,
            end,
            total_bars,
            equity_curve,
        ))
    }
}

/// Advance `position` to `quote` and apply the rules for that bar.
/// At most one trade executes; returns its kind.
pub fn apply_bar(position: &mut Position<'_>, quote: &Quote) -> Option<TradeKind> {
    position.advance_to(quote.timestamp);
    position.observe_high(quote.high);
    evaluate_orders(position, quote)
}

fn evaluate_orders(position: &mut Position<'_>, quote: &Quote) -> Option<TradeKind> {
    if !position.is_long() {
        let limit = position.limit_buy()?;
        if quote.spans(limit) && position.buy(ExecutionPrice::Limit(limit)).is_some() {
            return Some(TradeKind::Buy);
        }
        return None;
    }

    let stop = position.trailing_stop_level();
    if quote.close < stop {
        if position.sell(ExecutionPrice::Limit(stop)).is_some() {
            let limit = stop * position.settings().catch_low;
            position.arm_limit_buy(limit);
            debug!(
                "[BT {}] Stopped out at {:.2}, limit buy armed at {:.2}",
                quote.timestamp.format("%m-%d %H:00"),
                stop,
                limit
            );
            return Some(TradeKind::Sell);
        }
        return None;
    }

    position.set_stop_loss(stop);
    None
}

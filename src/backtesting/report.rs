use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BacktestSettings;
use crate::models::transaction::trim_decimals;
use crate::models::{Ledger, Transaction};
use crate::trading::{Position, PositionState};

/// Final state of one run: balances, order levels, ledger and the
/// portfolio value after every bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub settings: BacktestSettings,

    // Period
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bars: usize,

    // Balances
    pub initial_balance: f64,
    pub final_base_balance: f64,
    pub final_quote_balance: f64,
    pub final_value: Option<f64>,
    pub final_state: PositionState,

    // Order levels
    pub high_water_mark: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub limit_buy: Option<f64>,

    pub transactions: Ledger,
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
}

impl BacktestReport {
    pub fn from_run(
        position: Position<'_>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bars: usize,
        equity_curve: Vec<(DateTime<Utc>, f64)>,
    ) -> Self {
        let settings = *position.settings();
        let final_value = position.portfolio_value();

        Self {
            settings,
            start,
            end,
            bars,
            initial_balance: settings.start_balance,
            final_base_balance: position.base_balance(),
            final_quote_balance: position.quote_balance(),
            final_value,
            final_state: position.state(),
            high_water_mark: position.high_water_mark(),
            stop_loss: position.stop_loss(),
            take_profit: position.take_profit(),
            limit_buy: position.limit_buy(),
            transactions: position.into_ledger(),
            equity_curve,
        }
    }

    pub fn buys(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions.buys()
    }

    pub fn sells(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions.sells()
    }

    pub fn print_summary(&self, base_asset: &str, quote_asset: &str) {
        println!("\n{}", "=".repeat(70));
        println!("  BACKTEST REPORT");
        println!("{}", "=".repeat(70));
        println!(
            "  Period:      {} to {} ({} bars)",
            self.start.format("%Y-%m-%d %H:00"),
            self.end.format("%Y-%m-%d %H:00"),
            self.bars
        );
        println!();
        println!("  SETTINGS");
        println!("  ───────────────────────────────────");
        println!("  Trailing:    {}", self.settings.trailing_stop);
        println!("  Catch low:   {}", self.settings.catch_low);
        println!("  Commission:  {}", self.settings.commission);
        println!("  HWM reset:   {}", self.settings.high_water_reset);
        println!();
        println!("  BALANCES");
        println!("  ───────────────────────────────────");
        println!("  Initial:     {:.2} {}", self.initial_balance, quote_asset);
        println!(
            "  Final:       {} {} / {} {}",
            trim_decimals(self.final_base_balance, 4),
            base_asset,
            trim_decimals(self.final_quote_balance, 2),
            quote_asset
        );
        match self.final_value {
            Some(v) => println!("  Value:       {:.2} {}", v, quote_asset),
            None => println!("  Value:       unknown"),
        }
        println!("  State:       {}", self.final_state);
        println!();
        println!("  LEVELS");
        println!("  ───────────────────────────────────");
        println!("  High water:  {:.2}", self.high_water_mark);
        if let Some(stop) = self.stop_loss {
            println!("  Stop loss:   {:.2}", stop);
        }
        if let Some(limit) = self.limit_buy {
            println!("  Limit buy:   {:.2}", limit);
        }
        println!();
        println!(
            "  TRANSACTIONS ({} buys / {} sells)",
            self.buys().count(),
            self.sells().count()
        );
        println!("  ───────────────────────────────────");
        for tx in &self.transactions {
            println!("  {}", tx.describe(base_asset, quote_asset));
        }
        println!("{}", "=".repeat(70));
    }
}

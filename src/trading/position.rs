use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::{BacktestSettings, HighWaterReset};
use crate::models::transaction::trim_decimals;
use crate::models::{Ledger, QuoteSeries, TradeKind, Transaction};

/// Price an order executes at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionPrice {
    /// Open of the bar at the current simulated time
    Market,
    Limit(f64),
}

impl ExecutionPrice {
    fn resolve(self, market_open: f64) -> Option<f64> {
        let price = match self {
            ExecutionPrice::Market => market_open,
            ExecutionPrice::Limit(p) => p,
        };
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Flat,
    Long,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "flat"),
            PositionState::Long => write!(f, "long"),
        }
    }
}

/// Balances and order state for a single-asset run.
///
/// Buying and selling are guarded: when there is no bar for the current
/// hour or nothing to spend, the call leaves every field untouched and
/// returns `None`.
#[derive(Debug, Clone)]
pub struct Position<'a> {
    quotes: &'a QuoteSeries,
    settings: BacktestSettings,
    time: DateTime<Utc>,
    base_balance: f64,
    quote_balance: f64,
    high_water_mark: f64,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
    limit_buy: Option<f64>,
    ledger: Ledger,
}

impl<'a> Position<'a> {
    /// Flat with the full starting balance in the quote asset.
    pub fn new(quotes: &'a QuoteSeries, settings: BacktestSettings, time: DateTime<Utc>) -> Self {
        Self {
            quotes,
            settings,
            time,
            base_balance: 0.0,
            quote_balance: settings.start_balance,
            high_water_mark: 0.0,
            take_profit: None,
            stop_loss: None,
            limit_buy: None,
            ledger: Ledger::new(),
        }
    }

    pub fn base_balance(&self) -> f64 {
        self.base_balance
    }

    pub fn quote_balance(&self) -> f64 {
        self.quote_balance
    }

    pub fn high_water_mark(&self) -> f64 {
        self.high_water_mark
    }

    /// Not set by the trailing-stop rules; carried for reporting.
    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.stop_loss
    }

    pub fn limit_buy(&self) -> Option<f64> {
        self.limit_buy
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn state(&self) -> PositionState {
        if self.base_balance > 0.0 {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    pub fn is_long(&self) -> bool {
        self.state() == PositionState::Long
    }

    pub fn advance_to(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    /// Raise the high-water mark to `price` if it is higher.
    pub fn observe_high(&mut self, price: f64) {
        if price > self.high_water_mark {
            self.high_water_mark = price;
        }
    }

    /// Stop level implied by the current high-water mark.
    pub fn trailing_stop_level(&self) -> f64 {
        self.high_water_mark * self.settings.trailing_stop
    }

    pub fn set_stop_loss(&mut self, level: f64) {
        self.stop_loss = Some(level);
    }

    pub fn arm_limit_buy(&mut self, price: f64) {
        self.limit_buy = Some(price);
    }

    /// Quote balance plus base holdings marked at the current bar's open.
    /// `None` when no bar exists for the current hour.
    pub fn portfolio_value(&self) -> Option<f64> {
        self.quotes
            .find(self.time)
            .map(|q| self.quote_balance + self.base_balance * q.open)
    }

    /// Spend the whole quote balance. Clears any armed limit buy.
    pub fn buy(&mut self, price: ExecutionPrice) -> Option<&Transaction> {
        let quote = self.quotes.find(self.time)?;
        if self.quote_balance <= 0.0 {
            return None;
        }
        let Some(rate) = price.resolve(quote.open) else {
            warn!("Ignoring buy at invalid price {:?}", price);
            return None;
        };

        let spent = self.quote_balance;
        let amount = spent / rate * (1.0 - self.settings.commission);
        self.base_balance = amount;
        self.quote_balance = 0.0;
        self.limit_buy = None;
        if self.settings.high_water_reset == HighWaterReset::OnEntry {
            self.high_water_mark = rate;
        }

        let tx = Transaction::new(TradeKind::Buy, self.time, amount, spent, rate);
        Some(self.record(tx))
    }

    /// Sell the whole base balance.
    pub fn sell(&mut self, price: ExecutionPrice) -> Option<&Transaction> {
        let quote = self.quotes.find(self.time)?;
        if self.base_balance <= 0.0 {
            return None;
        }
        let Some(rate) = price.resolve(quote.open) else {
            warn!("Ignoring sell at invalid price {:?}", price);
            return None;
        };

        let sold = self.base_balance;
        let amount = sold * rate * (1.0 - self.settings.commission);
        self.quote_balance = amount;
        self.base_balance = 0.0;

        let tx = Transaction::new(TradeKind::Sell, self.time, sold, amount, rate);
        Some(self.record(tx))
    }

    fn record(&mut self, tx: Transaction) -> &Transaction {
        info!(
            "{} | base: {} | quote: {}",
            tx,
            trim_decimals(self.base_balance, 4),
            trim_decimals(self.quote_balance, 2),
        );
        self.ledger.record(tx)
    }
}

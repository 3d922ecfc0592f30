use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One executed trade. Created by `Position` and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    kind: TradeKind,
    timestamp: DateTime<Utc>,
    base_amount: f64,
    quote_amount: f64,
    rate: f64,
}

impl Transaction {
    /// Amounts and rate must be positive.
    pub(crate) fn new(
        kind: TradeKind,
        timestamp: DateTime<Utc>,
        base_amount: f64,
        quote_amount: f64,
        rate: f64,
    ) -> Self {
        debug_assert!(
            base_amount > 0.0 && quote_amount > 0.0 && rate > 0.0,
            "non-positive fill: base {} quote {} rate {}",
            base_amount,
            quote_amount,
            rate
        );
        Self {
            kind,
            timestamp,
            base_amount,
            quote_amount,
            rate,
        }
    }

    pub fn kind(&self) -> TradeKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Base asset bought (after commission) or sold
    pub fn base_amount(&self) -> f64 {
        self.base_amount
    }

    /// Quote asset spent (before commission) or received (after commission)
    pub fn quote_amount(&self) -> f64 {
        self.quote_amount
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Render with asset codes, e.g.
    /// `2017-08-17 05:00 BUY 0.25 BTC @ 1000 USD at rate 4000`.
    pub fn describe(&self, base_asset: &str, quote_asset: &str) -> String {
        format!(
            "{} {} {} {} @ {} {} at rate {}",
            self.timestamp.format("%Y-%m-%d %H:00"),
            self.kind,
            trim_decimals(self.base_amount, 4),
            base_asset,
            trim_decimals(self.quote_amount, 2),
            quote_asset,
            trim_decimals(self.rate, 2),
        )
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} at rate {}",
            self.timestamp.format("%Y-%m-%d %H:00"),
            self.kind,
            trim_decimals(self.base_amount, 4),
            trim_decimals(self.quote_amount, 2),
            trim_decimals(self.rate, 2),
        )
    }
}

/// Up to `places` decimals with trailing zeros dropped (`0.2500` -> `0.25`, `1000.00` -> `1000`).
pub fn trim_decimals(value: f64, places: usize) -> String {
    let s = format!("{:.*}", places, value);
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::base_time;

    #[test]
    fn trim_decimals_drops_trailing_zeros() {
        assert_eq!(trim_decimals(0.25, 4), "0.25");
        assert_eq!(trim_decimals(1000.0, 2), "1000");
        assert_eq!(trim_decimals(4050.126, 2), "4050.13");
        assert_eq!(trim_decimals(0.0, 4), "0");
        assert_eq!(trim_decimals(-0.00001, 2), "0");
    }

    #[test]
    fn display_keeps_field_order() {
        let tx = Transaction::new(TradeKind::Buy, base_time(), 0.25, 1000.0, 4000.0);
        assert_eq!(tx.to_string(), "2017-08-17 05:00 BUY 0.25 @ 1000 at rate 4000");
    }

    #[test]
    fn describe_includes_asset_codes() {
        let tx = Transaction::new(TradeKind::Sell, base_time(), 0.5, 2247.75, 4500.0);
        assert_eq!(
            tx.describe("BTC", "USD"),
            "2017-08-17 05:00 SELL 0.5 BTC @ 2247.75 USD at rate 4500"
        );
    }

    #[test]
    fn accessors_return_recorded_values() {
        let tx = Transaction::new(TradeKind::Sell, base_time(), 0.5, 2247.75, 4500.0);
        assert_eq!(tx.kind(), TradeKind::Sell);
        assert_eq!(tx.timestamp(), base_time());
        assert_eq!(tx.base_amount(), 0.5);
        assert_eq!(tx.quote_amount(), 2247.75);
        assert_eq!(tx.rate(), 4500.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-positive fill")]
    fn zero_amount_is_rejected_in_debug_builds() {
        Transaction::new(TradeKind::Buy, base_time(), 0.0, 1000.0, 4000.0);
    }

    #[test]
    fn kind_serializes_uppercase() {
        let json = serde_json::to_string(&TradeKind::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");
    }
}

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use trailstop_backtester::config::{BacktestSettings, HighWaterReset};
use trailstop_backtester::models::{Quote, QuoteSeries};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2017-08-17T05:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn quote_at(i: usize, (o, h, l, c): (f64, f64, f64, f64)) -> Quote {
    Quote {
        timestamp: base_time() + Duration::hours(i as i64),
        ticker: "BTCUSD".to_string(),
        open: o,
        high: h,
        low: l,
        close: c,
        base_volume: 10.0,
        quote_volume: 10.0 * o,
    }
}

/// Create bars from (open, high, low, close) tuples with hourly timestamps, oldest first.
pub fn make_quotes(data: &[(f64, f64, f64, f64)]) -> QuoteSeries {
    data.iter().enumerate().map(|(i, &bar)| quote_at(i, bar)).collect()
}

/// Same bars stored newest first, the way exported history files usually are.
pub fn make_quotes_newest_first(data: &[(f64, f64, f64, f64)]) -> QuoteSeries {
    data.iter()
        .enumerate()
        .rev()
        .map(|(i, &bar)| quote_at(i, bar))
        .collect()
}

/// Bars from a list of closes; open is the previous close, wicks 1% each side.
pub fn bars_from_closes(closes: &[f64]) -> Vec<(f64, f64, f64, f64)> {
    let mut prev = closes.first().copied().unwrap_or(100.0);
    closes
        .iter()
        .map(|&c| {
            let open = prev;
            prev = c;
            (open, open.max(c) * 1.01, open.min(c) * 0.99, c)
        })
        .collect()
}

pub fn test_settings() -> BacktestSettings {
    BacktestSettings {
        start_time: base_time(),
        trailing_stop: 0.9,
        catch_low: 0.9,
        start_balance: 1000.0,
        commission: 0.001,
        high_water_reset: HighWaterReset::Never,
    }
}

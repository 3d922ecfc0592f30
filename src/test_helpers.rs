use chrono::{DateTime, Duration, Utc};

use crate::config::{BacktestSettings, HighWaterReset};
use crate::models::{Quote, QuoteSeries};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2017-08-17T05:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create bars from (open, high, low, close) tuples with hourly timestamps, oldest first.
pub fn make_quotes(data: &[(f64, f64, f64, f64)]) -> QuoteSeries {
    let quotes: Vec<Quote> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Quote {
            timestamp: base_time() + Duration::hours(i as i64),
            ticker: "BTCUSD".to_string(),
            open: o,
            high: h,
            low: l,
            close: c,
            base_volume: 10.0,
            quote_volume: 10.0 * o,
        })
        .collect();

    QuoteSeries::new(quotes)
}

/// 1000 USD start, 0.1% commission, 90% trailing stop, 90% catch low.
pub fn default_test_settings() -> BacktestSettings {
    BacktestSettings {
        start_time: base_time(),
        trailing_stop: 0.9,
        catch_low: 0.9,
        start_balance: 1000.0,
        commission: 0.001,
        high_water_reset: HighWaterReset::Never,
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const SECS_PER_HOUR: i64 = 3600;

/// One hourly OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in the base asset (e.g. BTC)
    pub base_volume: f64,
    /// Volume in the quote asset (e.g. USD)
    pub quote_volume: f64,
}

impl Quote {
    /// True if `price` lies within [low, high] inclusive.
    pub fn spans(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }

    pub fn hour_key(&self) -> i64 {
        hour_key(self.timestamp)
    }
}

/// Calendar hour bucket (UTC); minutes and seconds are ignored.
pub fn hour_key(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(SECS_PER_HOUR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesOrder {
    Ascending,
    Descending,
    Unordered,
}

impl fmt::Display for SeriesOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesOrder::Ascending => write!(f, "oldest-first"),
            SeriesOrder::Descending => write!(f, "newest-first"),
            SeriesOrder::Unordered => write!(f, "unordered"),
        }
    }
}

/// Read-only price history for one instrument.
///
/// Bars are kept in their stored order. `chronological()` is the only
/// traversal the backtest uses, and it always walks oldest to newest no
/// matter how the source file was sorted.
#[derive(Debug, Clone, Default)]
pub struct QuoteSeries {
    quotes: Vec<Quote>,
    by_hour: HashMap<i64, usize>,
    chrono_order: Vec<usize>,
}

impl QuoteSeries {
    pub fn new(quotes: Vec<Quote>) -> Self {
        let mut by_hour = HashMap::with_capacity(quotes.len());
        for (i, q) in quotes.iter().enumerate() {
            // first bar wins on a duplicated hour
            by_hour.entry(q.hour_key()).or_insert(i);
        }

        let mut chrono_order: Vec<usize> = (0..quotes.len()).collect();
        chrono_order.sort_by_key(|&i| quotes[i].timestamp);

        Self {
            quotes,
            by_hour,
            chrono_order,
        }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Bars in stored order.
    pub fn as_slice(&self) -> &[Quote] {
        &self.quotes
    }

    /// Bar for the calendar hour containing `ts`, if any.
    pub fn find(&self, ts: DateTime<Utc>) -> Option<&Quote> {
        self.by_hour
            .get(&hour_key(ts))
            .and_then(|&i| self.quotes.get(i))
    }

    /// Iterate bars oldest to newest.
    pub fn chronological(&self) -> impl DoubleEndedIterator<Item = &Quote> + '_ {
        self.chrono_order.iter().map(move |&i| &self.quotes[i])
    }

    pub fn order(&self) -> SeriesOrder {
        let ts: Vec<DateTime<Utc>> = self.quotes.iter().map(|q| q.timestamp).collect();
        if ts.windows(2).all(|w| w[0] <= w[1]) {
            SeriesOrder::Ascending
        } else if ts.windows(2).all(|w| w[0] >= w[1]) {
            SeriesOrder::Descending
        } else {
            SeriesOrder::Unordered
        }
    }

    pub fn earliest_time(&self) -> Option<DateTime<Utc>> {
        self.chrono_order.first().map(|&i| self.quotes[i].timestamp)
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.chrono_order.last().map(|&i| self.quotes[i].timestamp)
    }
}

impl FromIterator<Quote> for QuoteSeries {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        QuoteSeries::new(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for QuoteSeries {
    type Output = Quote;
    fn index(&self, index: usize) -> &Self::Output {
        &self.quotes[index]
    }
}

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Quote, QuoteSeries};

const FIELD_NAMES: [&str; 8] = [
    "date",
    "symbol",
    "open",
    "high",
    "low",
    "close",
    "base volume",
    "quote volume",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: missing {field}")]
    MissingField { line: u64, field: &'static str },

    #[error("line {line}: unparseable timestamp '{value}'")]
    BadTimestamp { line: u64, value: String },

    #[error("line {line}: unparseable {field} '{value}'")]
    BadNumber {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("no quotes found")]
    Empty,
}

/// Load an hourly CSV export into a series.
pub fn load_csv(path: impl AsRef<Path>) -> Result<QuoteSeries, LoadError> {
    let path = path.as_ref();
    info!("Loading quotes from {}", path.display());
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let quotes = parse_csv(file)?;
    info!("  Loaded {} quotes", quotes.len());
    Ok(QuoteSeries::new(quotes))
}

/// Parse `Date,Symbol,Open,High,Low,Close,Volume <base>,Volume <quote>` rows.
///
/// A source banner line and the header row ahead of the first data row are
/// skipped. Rows keep their file order; the series works out direction.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Quote>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut quotes = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if quotes.is_empty() && is_preamble(&record) {
            debug!("Skipping preamble line {}", line);
            continue;
        }
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        quotes.push(parse_record(&record, line)?);
    }

    if quotes.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(quotes)
}

fn is_preamble(record: &csv::StringRecord) -> bool {
    record.len() < FIELD_NAMES.len()
        || record
            .get(0)
            .map(|f| f.eq_ignore_ascii_case("date"))
            .unwrap_or(false)
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<Quote, LoadError> {
    let field = |idx: usize| {
        record
            .get(idx)
            .filter(|s| !s.is_empty())
            .ok_or(LoadError::MissingField {
                line,
                field: FIELD_NAMES[idx],
            })
    };
    let number = |idx: usize| -> Result<f64, LoadError> {
        let raw = field(idx)?;
        raw.parse::<f64>().map_err(|_| LoadError::BadNumber {
            line,
            field: FIELD_NAMES[idx],
            value: raw.to_string(),
        })
    };

    let raw_ts = field(0)?;
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
        line,
        value: raw_ts.to_string(),
    })?;

    Ok(Quote {
        timestamp,
        ticker: field(1)?.to_string(),
        open: number(2)?,
        high: number(3)?,
        low: number(4)?,
        close: number(5)?,
        base_volume: number(6)?,
        quote_volume: number(7)?,
    })
}

/// `2017-08-17 05-AM` style hours, falling back to `2017-08-17 05:00:00`. UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // chrono needs a minute to build a time; the 12-hour layout has none
    NaiveDateTime::parse_from_str(&format!("{} 00", raw.trim()), "%Y-%m-%d %I-%p %M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("trailing stop must be in (0, 1], got {0}")]
    TrailingStop(f64),

    #[error("catch low must be in (0, 1], got {0}")]
    CatchLow(f64),

    #[error("commission must be in [0, 1), got {0}")]
    Commission(f64),

    #[error("starting balance must be positive, got {0}")]
    StartBalance(f64),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// What happens to the high-water mark when a new long position opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighWaterReset {
    /// The mark only ever rises over the whole run.
    #[default]
    Never,
    /// Each buy restarts the mark at its execution price.
    OnEntry,
}

impl HighWaterReset {
    pub fn from_str_loose(s: &str) -> Option<HighWaterReset> {
        match s.trim().to_lowercase().as_str() {
            "never" => Some(HighWaterReset::Never),
            "on_entry" | "on-entry" | "entry" => Some(HighWaterReset::OnEntry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HighWaterReset::Never => "never",
            HighWaterReset::OnEntry => "on_entry",
        }
    }
}

impl fmt::Display for HighWaterReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for one simulation run. Read-only once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    pub start_time: DateTime<Utc>,
    /// Stop level as a fraction of the high-water mark (0.9 = 10% below the high)
    pub trailing_stop: f64,
    /// Re-entry limit as a fraction of the stop level
    pub catch_low: f64,
    /// Starting quote-asset balance
    pub start_balance: f64,
    /// Fraction deducted from every fill (0.001 = 0.1%)
    pub commission: f64,
    #[serde(default)]
    pub high_water_reset: HighWaterReset,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            trailing_stop: 0.9,
            catch_low: 0.9,
            start_balance: 1000.0,
            commission: 0.001,
            high_water_reset: HighWaterReset::Never,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trailing_stop > 0.0 && self.trailing_stop <= 1.0) {
            return Err(ConfigError::TrailingStop(self.trailing_stop));
        }
        if !(self.catch_low > 0.0 && self.catch_low <= 1.0) {
            return Err(ConfigError::CatchLow(self.catch_low));
        }
        if !(self.commission >= 0.0 && self.commission < 1.0) {
            return Err(ConfigError::Commission(self.commission));
        }
        if !(self.start_balance.is_finite() && self.start_balance > 0.0) {
            return Err(ConfigError::StartBalance(self.start_balance));
        }
        Ok(())
    }
}

fn default_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 8, 17, 5, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Instrument
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,

    // Data
    pub data_file: String,

    // Strategy
    pub settings: BacktestSettings,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let defaults = BacktestSettings::default();
        let start_time = match std::env::var("START_TIME") {
            Ok(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ConfigError::InvalidValue {
                    key: "START_TIME".to_string(),
                    value: raw.clone(),
                })?,
            Err(_) => defaults.start_time,
        };

        let high_water_raw = env("HIGH_WATER_RESET", "never");
        let high_water_reset = HighWaterReset::from_str_loose(&high_water_raw).ok_or(
            ConfigError::InvalidValue {
                key: "HIGH_WATER_RESET".to_string(),
                value: high_water_raw.clone(),
            },
        )?;

        let settings = BacktestSettings {
            start_time,
            trailing_stop: parse_f64("TRAILING_STOP", defaults.trailing_stop)?,
            catch_low: parse_f64("CATCH_LOW", defaults.catch_low)?,
            start_balance: parse_f64("INITIAL_BALANCE", defaults.start_balance)?,
            commission: parse_f64("COMMISSION", defaults.commission)?,
            high_water_reset,
        };

        Ok(Config {
            symbol: env("SYMBOL", "BTCUSD"),
            base_asset: env("BASE_ASSET", "BTC"),
            quote_asset: env("QUOTE_ASSET", "USD"),
            data_file: env("DATA_FILE", "BTCUSD.csv"),
            settings,
            log_level: env("LOG_LEVEL", "INFO"),
        })
    }
}

fn parse_f64(key: &str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

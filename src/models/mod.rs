pub mod ledger;
pub mod quote;
pub mod transaction;

pub use ledger::Ledger;
pub use quote::{Quote, QuoteSeries, SeriesOrder};
pub use transaction::{TradeKind, Transaction};

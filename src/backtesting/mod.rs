pub mod data_loader;
pub mod report;
pub mod runner;
pub mod sweep;

pub use report::BacktestReport;
pub use runner::{apply_bar, BacktestError, BacktestRunner};

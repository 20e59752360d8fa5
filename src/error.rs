use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by bar and moving-average providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("no history for {symbol} on {timeframe}")]
    UnknownSeries { symbol: String, timeframe: String },

    #[error("invalid averaging period: {0}")]
    InvalidPeriod(usize),

    #[error("insufficient bars: requested {requested}, available {available}")]
    InsufficientBars { requested: usize, available: usize },

    #[error("history is empty")]
    EmptyHistory,
}

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no usable bars in {0}")]
    NoBars(PathBuf),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

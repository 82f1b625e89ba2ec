use thiserror::Error;

/// Validation and contract errors exposed by `ferrodash-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1m, 5m, 15m, 1h, 4h, 1d")]
    InvalidInterval { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("epoch milliseconds {value} are out of range")]
    TimestampOutOfRange { value: i64 },
    #[error("timestamps must be strictly increasing (row {index})")]
    TimestampNotIncreasing { index: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("indicator window '{name}' must be greater than zero")]
    ZeroWindow { name: &'static str },
    #[error("macd fast period {fast} must be shorter than slow period {slow}")]
    InvalidMacdPeriods { fast: usize, slow: usize },
}

/// Top-level error type for core operations outside the pipeline stages.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Exchange client contract and the request/error types around it.
//!
//! The pipeline talks to the exchange only through two seams:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`MarketConnector`] | Build a client from [`Credentials`](crate::Credentials) |
//! | [`MarketClient`] | `ping` liveness check and raw `klines` retrieval |
//!
//! [`BinanceConnector`] is the production implementation; tests inject their
//! own connectors to observe which stages ran.

mod binance;
mod synthetic;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Credentials, Interval, Symbol};

pub use binance::{BinanceClient, BinanceConnector, BINANCE_TESTNET_API_URL};
pub use synthetic::SyntheticHttpClient;

/// Upper bound the exchange accepts for a single klines call.
pub const MAX_KLINES_LIMIT: usize = 1_000;

/// Number of positional fields in one raw kline row.
pub const KLINE_FIELD_COUNT: usize = 12;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Client could not be constructed from the given inputs.
    InvalidRequest,
    /// Transport failure or non-success status.
    Unavailable,
    /// Upstream answered but the payload could not be understood.
    MalformedResponse,
}

/// Structured exchange error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Parameters for one klines call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlinesRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub limit: usize,
}

impl KlinesRequest {
    pub fn new(symbol: Symbol, interval: Interval, limit: usize) -> Result<Self, SourceError> {
        if limit == 0 || limit > MAX_KLINES_LIMIT {
            return Err(SourceError::invalid_request(format!(
                "klines request limit must be within 1..={MAX_KLINES_LIMIT}, got {limit}"
            )));
        }
        Ok(Self {
            symbol,
            interval,
            limit,
        })
    }
}

/// One kline exactly as the exchange returned it: a positional JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawKline(pub Vec<Value>);

impl RawKline {
    pub fn fields(&self) -> &[Value] {
        &self.0
    }
}

/// Connected exchange handle.
pub trait MarketClient: Send + Sync {
    /// Liveness check; success carries no payload.
    fn ping<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;

    fn klines<'a>(
        &'a self,
        req: KlinesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawKline>, SourceError>> + Send + 'a>>;
}

/// Builds market clients from credentials.
pub trait MarketConnector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn MarketClient>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn klines_request_rejects_zero_and_oversized_limits() {
        let symbol = Symbol::parse("BTCUSDT").expect("valid symbol");
        for limit in [0, MAX_KLINES_LIMIT + 1] {
            let err = KlinesRequest::new(symbol.clone(), Interval::OneHour, limit)
                .expect_err("must fail");
            assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
            assert!(err.message().contains("limit"));
        }
    }

    #[test]
    fn raw_kline_deserializes_positional_array() {
        let raw: RawKline =
            serde_json::from_str(r#"[1704067200000,"1.0","2.0",0.5,"1.5","10",1,"0",3,"0","0","0"]"#)
                .expect("must parse");
        assert_eq!(raw.fields().len(), KLINE_FIELD_COUNT);
    }
}

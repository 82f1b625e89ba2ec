use serde::{Deserialize, Serialize};

use crate::exchange::BINANCE_TESTNET_API_URL;
use crate::indicators::IndicatorSettings;
use crate::{Interval, Symbol, ValidationError};

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

/// Everything one dashboard run needs besides secrets and the connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub symbol: Symbol,
    pub interval: Interval,
    /// Candles requested per run; the exchange may return fewer.
    pub limit: usize,
    pub base_url: String,
    pub timeout_ms: u64,
    /// Rows shown in the "latest market data" table.
    pub tail_rows: usize,
    pub indicators: IndicatorSettings,
}

impl DashboardConfig {
    pub fn new(symbol: &str, interval: Interval, limit: usize) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::parse(symbol)?,
            interval,
            limit,
            ..Self::default()
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            symbol: Symbol::from_static(DEFAULT_SYMBOL),
            interval: Interval::OneHour,
            limit: 100,
            base_url: String::from(BINANCE_TESTNET_API_URL),
            timeout_ms: 10_000,
            tail_rows: 10,
            indicators: IndicatorSettings::default(),
        }
    }
}

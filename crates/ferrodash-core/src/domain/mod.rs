//! # Domain Models
//!
//! Canonical market types for the dashboard pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Candle`] | One OHLCV kline plus pass-through raw fields |
//! | [`MarketTable`] | Candles indexed by strictly ascending open time |
//! | [`EnrichedRow`] | Candle with RSI, MACD and MACD signal defined |
//! | [`EnrichedTable`] | Market table after indicator warm-up rows are dropped |
//! | [`Symbol`] | Validated trading pair (`BTCUSDT`) |
//! | [`Interval`] | Kline interval (1m .. 1d) |
//! | [`UtcDateTime`] | UTC timestamp with epoch-millisecond conversions |
//!
//! Construction validates invariants, so a [`MarketTable`] can never hold
//! out-of-order rows and an [`EnrichedRow`] can never hold an undefined
//! indicator value.

mod interval;
mod models;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use models::{Candle, EnrichedRow, EnrichedTable, MarketTable, PassthroughFields};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;

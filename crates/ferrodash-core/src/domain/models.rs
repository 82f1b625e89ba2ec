use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{UtcDateTime, ValidationError};

/// Raw kline fields that are carried through untouched for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassthroughFields {
    pub close_time: Value,
    pub quote_asset_volume: Value,
    pub number_of_trades: Value,
    pub taker_buy_base_volume: Value,
    pub taker_buy_quote_volume: Value,
    pub ignore: Value,
}

impl PassthroughFields {
    pub const COLUMNS: [&'static str; 6] = [
        "close_time",
        "quote_asset_volume",
        "number_of_trades",
        "taker_buy_base_volume",
        "taker_buy_quote_volume",
        "ignore",
    ];

    /// Values in [`PassthroughFields::COLUMNS`] order.
    pub fn values(&self) -> [&Value; 6] {
        [
            &self.close_time,
            &self.quote_asset_volume,
            &self.number_of_trades,
            &self.taker_buy_base_volume,
            &self.taker_buy_quote_volume,
            &self.ignore,
        ]
    }
}

/// One OHLCV observation keyed by its open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(flatten)]
    pub passthrough: PassthroughFields,
}

impl Candle {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_non_negative("volume", volume)?;

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
            passthrough: PassthroughFields::default(),
        })
    }

    pub fn with_passthrough(mut self, passthrough: PassthroughFields) -> Self {
        self.passthrough = passthrough;
        self
    }
}

/// Time-indexed candle table. Timestamps are unique and strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketTable {
    rows: Vec<Candle>,
}

impl MarketTable {
    pub fn new(rows: Vec<Candle>) -> Result<Self, ValidationError> {
        if let Some(index) = rows
            .windows(2)
            .position(|pair| pair[1].ts <= pair[0].ts)
        {
            return Err(ValidationError::TimestampNotIncreasing { index: index + 1 });
        }

        Ok(Self { rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.close).collect()
    }
}

/// Candle row with every indicator value defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub candle: Candle,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

/// Market table after warm-up rows have been removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTable {
    rows: Vec<EnrichedRow>,
}

impl EnrichedTable {
    /// Rows must come from a [`MarketTable`], so ordering is inherited.
    pub(crate) fn from_rows(rows: Vec<EnrichedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Last `count` rows, still in ascending time order.
    pub fn tail(&self, count: usize) -> &[EnrichedRow] {
        let start = self.rows.len().saturating_sub(count);
        &self.rows[start..]
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle_at(millis: i64, close: f64) -> Candle {
        let ts = UtcDateTime::from_unix_millis(millis).expect("timestamp");
        Candle::new(ts, close, close, close, close, 1.0).expect("valid candle")
    }

    #[test]
    fn rejects_non_finite_close() {
        let ts = UtcDateTime::from_unix_millis(0).expect("timestamp");
        let err = Candle::new(ts, 1.0, 1.0, 1.0, f64::NAN, 1.0).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFiniteValue { field: "close" });
    }

    #[test]
    fn table_rejects_duplicate_timestamps() {
        let err = MarketTable::new(vec![candle_at(0, 1.0), candle_at(0, 2.0)])
            .expect_err("must fail");
        assert_eq!(err, ValidationError::TimestampNotIncreasing { index: 1 });
    }

    #[test]
    fn tail_keeps_ascending_order() {
        let rows = (0..5)
            .map(|i| EnrichedRow {
                candle: candle_at(i * 1_000, i as f64),
                rsi: 50.0,
                macd: 0.0,
                macd_signal: 0.0,
            })
            .collect();
        let table = EnrichedTable::from_rows(rows);

        let tail = table.tail(3);
        let closes: Vec<f64> = tail.iter().map(|row| row.candle.close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
        assert_eq!(table.tail(10).len(), 5);
    }
}

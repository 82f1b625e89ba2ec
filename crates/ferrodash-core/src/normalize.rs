//! Raw kline rows → typed [`MarketTable`].
//!
//! Binance returns each kline as a 12-field positional array:
//!
//! | Index | Field | Handling |
//! |-------|-------|----------|
//! | 0 | open time (epoch ms) | → [`UtcDateTime`] index |
//! | 1-5 | open, high, low, close, volume (decimal text) | → `f64` |
//! | 6-11 | close time, quote volume, trades, taker volumes, ignore | kept verbatim |

use serde_json::Value;
use thiserror::Error;

use crate::exchange::{RawKline, KLINE_FIELD_COUNT};
use crate::{Candle, MarketTable, PassthroughFields, UtcDateTime, ValidationError};

/// Row-level normalization failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("kline row {row} has {found} fields, expected {KLINE_FIELD_COUNT}")]
    FieldCount { row: usize, found: usize },

    #[error("kline row {row}: field '{field}' is not a number: {value}")]
    NotNumeric {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("kline row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Table(#[from] ValidationError),
}

/// Converts raw klines into a time-indexed table. An empty input yields an empty table.
pub fn normalize_klines(raw: &[RawKline]) -> Result<MarketTable, NormalizeError> {
    let rows = raw
        .iter()
        .enumerate()
        .map(|(row, kline)| normalize_row(row, kline.fields()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MarketTable::new(rows)?)
}

fn normalize_row(row: usize, fields: &[Value]) -> Result<Candle, NormalizeError> {
    let [open_time, open, high, low, close, volume, close_time, quote_asset_volume, number_of_trades, taker_buy_base_volume, taker_buy_quote_volume, ignore] =
        fields
    else {
        return Err(NormalizeError::FieldCount {
            row,
            found: fields.len(),
        });
    };

    let millis = open_time.as_i64().ok_or_else(|| NormalizeError::NotNumeric {
        row,
        field: "timestamp",
        value: open_time.to_string(),
    })?;
    let ts = UtcDateTime::from_unix_millis(millis)
        .map_err(|source| NormalizeError::InvalidRow { row, source })?;

    let candle = Candle::new(
        ts,
        decimal(row, "open", open)?,
        decimal(row, "high", high)?,
        decimal(row, "low", low)?,
        decimal(row, "close", close)?,
        decimal(row, "volume", volume)?,
    )
    .map_err(|source| NormalizeError::InvalidRow { row, source })?;

    Ok(candle.with_passthrough(PassthroughFields {
        close_time: close_time.clone(),
        quote_asset_volume: quote_asset_volume.clone(),
        number_of_trades: number_of_trades.clone(),
        taker_buy_base_volume: taker_buy_base_volume.clone(),
        taker_buy_quote_volume: taker_buy_quote_volume.clone(),
        ignore: ignore.clone(),
    }))
}

/// Exchange decimals arrive as strings; plain JSON numbers are accepted too.
fn decimal(row: usize, field: &'static str, value: &Value) -> Result<f64, NormalizeError> {
    let parsed = match value {
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    };

    parsed.ok_or_else(|| NormalizeError::NotNumeric {
        row,
        field,
        value: value.to_string(),
    })
}

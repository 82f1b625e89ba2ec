//! RSI and MACD derivation over the close column.
//!
//! - **RSI**: Wilder smoothing. The first average gain/loss is the mean of the
//!   first `rsi_window` price changes, later values use
//!   `avg = (avg * (n - 1) + x) / n`. Defined from row `rsi_window`.
//!   Python's `ta.momentum.RSIIndicator` instead runs `ewm(alpha = 1/n,
//!   adjust=False)` from row 0 with a zero first change. The two disagree by
//!   several points right after warm-up (often around one point by row 34)
//!   and converge to within hundredths by the end of a 100-candle window.
//! - **MACD**: `EMA(fast) - EMA(slow)` with `alpha = 2 / (n + 1)` seeded on the
//!   first close (pandas `ewm(adjust=False)`). Defined from row `slow - 1`.
//! - **Signal**: `EMA(signal)` of the defined MACD values. Defined from row
//!   `slow + signal - 1`.
//!
//! Undefined (warm-up) rows are `None` in [`IndicatorColumns`] and are dropped
//! by [`enrich`].

use serde::{Deserialize, Serialize};
use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::{EnrichedRow, EnrichedTable, MarketTable, ValidationError};

/// Indicator windows. Defaults are RSI(14) and MACD(12, 26, 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(self) -> Result<Self, ValidationError> {
        for (name, window) in [
            ("rsi_window", self.rsi_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ] {
            if window == 0 {
                return Err(ValidationError::ZeroWindow { name });
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ValidationError::InvalidMacdPeriods {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        Ok(self)
    }

    /// Leading rows without a signal-line value.
    pub const fn macd_warmup(self) -> usize {
        self.macd_slow + self.macd_signal - 1
    }

    /// Leading rows dropped by [`enrich`]; a table needs more rows than this
    /// to produce any enriched output.
    pub const fn warmup_rows(self) -> usize {
        let macd = self.macd_warmup();
        if macd > self.rsi_window {
            macd
        } else {
            self.rsi_window
        }
    }
}

/// Indicator series aligned to a market table's rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorColumns {
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
}

impl IndicatorColumns {
    pub fn compute(table: &MarketTable, settings: IndicatorSettings) -> Result<Self, ValidationError> {
        let settings = settings.validate()?;
        let closes = table.closes();
        let (macd, macd_signal) = macd(
            &closes,
            settings.macd_fast,
            settings.macd_slow,
            settings.macd_signal,
        )?;

        Ok(Self {
            rsi: rsi(&closes, settings.rsi_window),
            macd,
            macd_signal,
        })
    }
}

/// Appends indicators and keeps only rows where all of them are defined.
pub fn enrich(table: &MarketTable, settings: IndicatorSettings) -> Result<EnrichedTable, ValidationError> {
    let columns = IndicatorColumns::compute(table, settings)?;

    let rows = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(index, candle)| {
            match (
                columns.rsi[index],
                columns.macd[index],
                columns.macd_signal[index],
            ) {
                (Some(rsi), Some(macd), Some(macd_signal)) => Some(EnrichedRow {
                    candle: candle.clone(),
                    rsi,
                    macd,
                    macd_signal,
                }),
                _ => None,
            }
        })
        .collect();

    Ok(EnrichedTable::from_rows(rows))
}

/// Wilder RSI; `None` for the first `window` rows.
pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return out;
    }

    let (mut avg_gain, mut avg_loss) = closes[..=window]
        .windows(2)
        .map(|pair| split_change(pair[1] - pair[0]))
        .fold((0.0, 0.0), |(gain, loss), (g, l)| (gain + g, loss + l));
    let w = window as f64;
    avg_gain /= w;
    avg_loss /= w;
    out[window] = Some(rsi_value(avg_gain, avg_loss));

    for index in window + 1..closes.len() {
        let (gain, loss) = split_change(closes[index] - closes[index - 1]);
        avg_gain = (avg_gain * (w - 1.0) + gain) / w;
        avg_loss = (avg_loss * (w - 1.0) + loss) / w;
        out[index] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

/// MACD line and signal line; `None` during warm-up.
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>), ValidationError> {
    let mut fast_ema = ema(fast, "macd_fast")?;
    let mut slow_ema = ema(slow, "macd_slow")?;
    let mut signal_ema = ema(signal, "macd_signal")?;

    let mut line = Vec::with_capacity(closes.len());
    let mut signal_line = Vec::with_capacity(closes.len());
    let signal_start = slow + signal - 1;

    for (index, &close) in closes.iter().enumerate() {
        let macd_value = fast_ema.next(close) - slow_ema.next(close);
        if index + 1 < slow {
            line.push(None);
            signal_line.push(None);
            continue;
        }

        let signal_value = signal_ema.next(macd_value);
        line.push(Some(macd_value));
        signal_line.push((index >= signal_start).then_some(signal_value));
    }

    Ok((line, signal_line))
}

fn ema(period: usize, name: &'static str) -> Result<ExponentialMovingAverage, ValidationError> {
    ExponentialMovingAverage::new(period).map_err(|_| ValidationError::ZeroWindow { name })
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

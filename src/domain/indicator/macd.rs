//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Every EMA is seeded with its first input, so all three lines are defined
//! from the first bar; the early values are noisy.

use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::indicator::{ema_values, IndicatorSeries};
use crate::domain::price::{closes, PriceBar};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fast == 0 || self.slow == 0 || self.signal == 0 {
            return Err(EngineError::invalid(
                "macd",
                "fast, slow and signal periods must be at least 1",
            ));
        }
        if self.fast >= self.slow {
            return Err(EngineError::invalid(
                "macd",
                format!("fast period {} must be below slow period {}", self.fast, self.slow),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(bars: &[PriceBar], params: MacdParams) -> MacdSeries {
    if params.fast == 0 || params.slow == 0 || params.signal == 0 {
        return MacdSeries {
            line: IndicatorSeries::undefined(bars.len()),
            signal: IndicatorSeries::undefined(bars.len()),
            histogram: IndicatorSeries::undefined(bars.len()),
        };
    }

    let closes = closes(bars);
    let ema_fast = ema_values(&closes, params.fast);
    let ema_slow = ema_values(&closes, params.slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal = ema_values(&line, params.signal);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    MacdSeries {
        line: line.into(),
        signal: signal.into(),
        histogram: histogram.into(),
    }
}

//! Per-bar trading intent derived from price and indicator readings.
//!
//! Evaluation is level-based: every bar re-checks the comparison, nothing is
//! edge-triggered on crossovers.

use serde::Serialize;

use crate::domain::indicator::rsi::{OVERBOUGHT, OVERSOLD};
use crate::domain::indicator::{IndicatorReading, IndicatorSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Whether the simulator currently holds a position. Only Combined mode reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionState {
    Flat,
    Long,
}

/// Map one bar's close and indicator reading to a trading intent.
///
/// | reading  | Buy                              | Sell                             |
/// |----------|----------------------------------|----------------------------------|
/// | EMA      | close > ema                      | close < ema                      |
/// | RSI      | rsi < 30                         | rsi > 70                         |
/// | MACD     | line > signal                    | line <= signal                   |
/// | Combined | flat, close > ema and rsi < 70   | long, close < ema and rsi > 30   |
pub fn evaluate(close: f64, reading: IndicatorReading, state: PositionState) -> Signal {
    match reading {
        IndicatorReading::Ema { ema } => {
            if close > ema {
                Signal::Buy
            } else if close < ema {
                Signal::Sell
            } else {
                Signal::Hold
            }
        }
        IndicatorReading::Rsi { rsi } => {
            if rsi < OVERSOLD {
                Signal::Buy
            } else if rsi > OVERBOUGHT {
                Signal::Sell
            } else {
                Signal::Hold
            }
        }
        IndicatorReading::Macd { line, signal } => {
            if line > signal {
                Signal::Buy
            } else {
                Signal::Sell
            }
        }
        IndicatorReading::Combined { ema, rsi } => match state {
            PositionState::Flat if close > ema && rsi < OVERBOUGHT => Signal::Buy,
            PositionState::Long if close < ema && rsi > OVERSOLD => Signal::Sell,
            _ => Signal::Hold,
        },
    }
}

/// Signal for bar `index`; undefined indicator values always yield `Hold`.
pub fn signal_at(indicators: &IndicatorSet, index: usize, close: f64, state: PositionState) -> Signal {
    match indicators.reading(index) {
        Some(reading) => evaluate(close, reading, state),
        None => Signal::Hold,
    }
}

/// Signals for the whole series, evaluated as if always flat.
///
/// Useful for inspection; the simulator calls [`signal_at`] with its live state.
pub fn generate(indicators: &IndicatorSet, closes: &[f64]) -> Vec<Signal> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| signal_at(indicators, i, close, PositionState::Flat))
        .collect()
}

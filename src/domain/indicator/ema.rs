//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Defined from the first bar onward; callers decide how much of the start to trust.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::price::{closes, PriceBar};

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(bars.len());
    }
    IndicatorSeries::from(ema_values(&closes(bars), period))
}

/// Raw EMA over an arbitrary slice, seeded with `values[0]`.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&seed) = values.first() else {
        return out;
    };
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = seed;
    out.push(ema);
    for &value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

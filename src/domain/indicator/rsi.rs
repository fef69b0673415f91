//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses a simple trailing mean of gains and losses over the last n price changes:
//! - gain = max(delta, 0), loss = max(-delta, 0)
//! - RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS)
//!
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, otherwise 50.
//!
//! Warmup: first n bars are undefined (need n price changes for a full window).

use crate::domain::indicator::IndicatorSeries;
use crate::domain::price::PriceBar;

pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::undefined(bars.len());
    if period == 0 || bars.len() <= period {
        return series;
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    // bar i is backed by changes i-period+1..=i, i.e. gains[i-period..i]
    for i in period..bars.len() {
        let window = (i - period)..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        series.values[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    series
}

pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

//! Performance metrics and statistics.
//!
//! [`PerformanceAnalyzer`] is a stateless reduction over a finished trade log
//! and equity curve. Every statistic has a defined value for empty or
//! single-element inputs: ratios with a zero denominator resolve to 0.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use super::position::{Fill, Side, Trade};
use super::price::span_days;
use super::simulator::{EquityPoint, SizingMode};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Which per-period return series feeds the Sharpe ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SharpeBasis {
    TradePnl,
    EquityReturns,
}

impl FromStr for SharpeBasis {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trades" | "trade_pnl" | "pnl" => Ok(SharpeBasis::TradePnl),
            "equity" | "equity_returns" | "returns" => Ok(SharpeBasis::EquityReturns),
            other => Err(EngineError::invalid(
                "sharpe_basis",
                format!("expected trades or equity, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for SharpeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharpeBasis::TradePnl => write!(f, "trades"),
            SharpeBasis::EquityReturns => write!(f, "equity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub final_equity: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_pnl_per_trade: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_dollar: f64,
    pub cagr: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawdown {
    /// Largest peak-to-trough decline, percent of the running peak, in [0, 100].
    pub pct: f64,
    /// Largest peak-to-trough decline in currency units.
    pub dollar: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceAnalyzer {
    pub sizing: SizingMode,
    pub initial_capital: f64,
    pub sharpe_basis: SharpeBasis,
    pub annualization_factor: f64,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        PerformanceAnalyzer {
            sizing: SizingMode::Unit,
            initial_capital: 100_000.0,
            sharpe_basis: SharpeBasis::EquityReturns,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl PerformanceAnalyzer {
    pub fn analyze(
        &self,
        trades: &[Trade],
        fills: &[Fill],
        equity_curve: &[EquityPoint],
        final_equity: f64,
    ) -> Metrics {
        let total_pnl = self.total_pnl(trades, final_equity);
        let (avg_pnl_per_trade, volatility) = Self::pnl_mean_and_volatility(trades);
        let drawdown = Self::max_drawdown(equity_curve);
        let (largest_win, largest_loss) = Self::largest_win_and_loss(trades);

        Metrics {
            total_pnl,
            total_return_pct: self.total_return_pct(final_equity),
            final_equity,
            trade_count: trades.len(),
            win_rate: self.win_rate(trades, fills),
            avg_pnl_per_trade,
            volatility,
            sharpe_ratio: self.sharpe_ratio(trades, equity_curve),
            max_drawdown: drawdown.pct,
            max_drawdown_dollar: drawdown.dollar,
            cagr: self.cagr(total_pnl, equity_curve),
            largest_win,
            largest_loss,
            avg_trade_duration: Self::avg_trade_duration(trades),
        }
    }

    /// Realized pnl in unit mode; final minus initial equity with capital allocation.
    pub fn total_pnl(&self, trades: &[Trade], final_equity: f64) -> f64 {
        match self.sizing {
            SizingMode::Unit => trades.iter().map(|t| t.pnl).sum(),
            SizingMode::CapitalAllocation => final_equity - self.initial_capital,
        }
    }

    pub fn total_return_pct(&self, final_equity: f64) -> f64 {
        if self.initial_capital == 0.0 {
            return 0.0;
        }
        (final_equity - self.initial_capital) / self.initial_capital * 100.0
    }

    /// Percentage of winning round trips, in [0, 100].
    pub fn win_rate(&self, trades: &[Trade], fills: &[Fill]) -> f64 {
        match self.sizing {
            SizingMode::Unit => {
                if trades.is_empty() {
                    return 0.0;
                }
                let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
                wins as f64 / trades.len() as f64 * 100.0
            }
            SizingMode::CapitalAllocation => Self::win_rate_from_fills(fills),
        }
    }

    /// Win rate over consecutive BUY/SELL fill pairs; a win sells above its buy.
    pub fn win_rate_from_fills(fills: &[Fill]) -> f64 {
        let rounds = fills.len() / 2;
        if rounds == 0 {
            return 0.0;
        }
        let wins = fills
            .chunks_exact(2)
            .filter(|pair| {
                pair[0].side == Side::Buy && pair[1].side == Side::Sell && pair[1].price > pair[0].price
            })
            .count();
        wins as f64 / rounds as f64 * 100.0
    }

    /// Mean and population standard deviation of trade pnl; both 0 below two trades.
    pub fn pnl_mean_and_volatility(trades: &[Trade]) -> (f64, f64) {
        if trades.len() < 2 {
            return (0.0, 0.0);
        }
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        mean_and_stddev(&pnls)
    }

    pub fn sharpe_ratio(&self, trades: &[Trade], equity_curve: &[EquityPoint]) -> f64 {
        let returns = match self.sharpe_basis {
            SharpeBasis::TradePnl => trades.iter().map(|t| t.pnl).collect(),
            SharpeBasis::EquityReturns => Self::equity_returns(equity_curve),
        };
        Self::annualized_sharpe(&returns, self.annualization_factor)
    }

    /// mean / stddev * sqrt(annualization); 0 below two observations or with no dispersion.
    pub fn annualized_sharpe(returns: &[f64], annualization_factor: f64) -> f64 {
        if returns.len() < 2 || annualization_factor <= 0.0 {
            return 0.0;
        }
        if returns.iter().all(|r| *r == returns[0]) {
            return 0.0;
        }
        let (mean, stddev) = mean_and_stddev(returns);
        if stddev <= f64::EPSILON * mean.abs().max(1.0) {
            return 0.0;
        }
        mean / stddev * annualization_factor.sqrt()
    }

    /// Bar-over-bar fractional change of the equity curve; a zero base yields 0.
    pub fn equity_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
        equity_curve
            .windows(2)
            .map(|w| {
                let prev = w[0].equity;
                if prev != 0.0 {
                    (w[1].equity - prev) / prev
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Single forward pass tracking the running peak.
    pub fn max_drawdown(equity_curve: &[EquityPoint]) -> Drawdown {
        let Some(first) = equity_curve.first() else {
            return Drawdown {
                pct: 0.0,
                dollar: 0.0,
            };
        };

        let mut peak = first.equity;
        let mut max_dd = 0.0_f64;
        let mut max_dd_dollar = 0.0_f64;

        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
            }
            let decline = peak - point.equity;
            if decline > max_dd_dollar {
                max_dd_dollar = decline;
            }
            if peak > 0.0 {
                max_dd = max_dd.max((decline / peak).min(1.0));
            }
        }

        Drawdown {
            pct: max_dd * 100.0,
            dollar: max_dd_dollar,
        }
    }

    /// (1 + pnl/initial)^(365/days) - 1 over the curve's calendar span.
    ///
    /// 0 for zero initial capital or a zero-length span; -1 once the capital is gone.
    pub fn cagr(&self, total_pnl: f64, equity_curve: &[EquityPoint]) -> f64 {
        let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
            return 0.0;
        };
        let days = span_days(first.timestamp, last.timestamp);
        if days <= 0.0 || self.initial_capital == 0.0 {
            return 0.0;
        }
        let growth = 1.0 + total_pnl / self.initial_capital;
        if growth <= 0.0 {
            return -1.0;
        }
        let cagr = growth.powf(DAYS_PER_YEAR / days) - 1.0;
        if cagr.is_finite() { cagr } else { 0.0 }
    }

    /// Max and min single realized pnl, 0 each with no trades.
    pub fn largest_win_and_loss(trades: &[Trade]) -> (f64, f64) {
        if trades.is_empty() {
            return (0.0, 0.0);
        }
        let largest_win = trades.iter().map(|t| t.pnl).fold(f64::NEG_INFINITY, f64::max);
        let largest_loss = trades.iter().map(|t| t.pnl).fold(f64::INFINITY, f64::min);
        (largest_win, largest_loss)
    }

    /// Mean holding time in days, 0 with no trades.
    pub fn avg_trade_duration(trades: &[Trade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        trades.iter().map(Trade::duration_days).sum::<f64>() / trades.len() as f64
    }
}

fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

//! Backtest entry point: indicators, signals, simulation and metrics in one pass.
//!
//! `run_backtest` is a pure function of its inputs. It holds no state between
//! calls, so concurrent runs share nothing.

use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::indicator::{IndicatorMode, IndicatorSet, IndicatorSpec, MacdParams};
use crate::domain::metrics::{Metrics, PerformanceAnalyzer, SharpeBasis, TRADING_DAYS_PER_YEAR};
use crate::domain::position::{Fill, Position, Trade};
use crate::domain::price::PriceBar;
use crate::domain::simulator::{self, EquityPoint, SimulationParams, SizingMode};

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub indicator: IndicatorMode,
    pub period: usize,
    pub macd: MacdParams,
    /// RSI period paired with the `period`-bar EMA in Combined mode.
    pub combined_rsi_period: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub initial_capital: f64,
    pub sizing: SizingMode,
    pub sharpe_basis: SharpeBasis,
    pub annualization_factor: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            indicator: IndicatorMode::Ema,
            period: DEFAULT_PERIOD,
            macd: MacdParams::default(),
            combined_rsi_period: DEFAULT_PERIOD,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            sizing: SizingMode::Unit,
            sharpe_basis: SharpeBasis::EquityReturns,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl BacktestConfig {
    pub fn indicator_spec(&self) -> IndicatorSpec {
        IndicatorSpec::for_mode(self.indicator, self.period, self.macd, self.combined_rsi_period)
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            sizing: self.sizing,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            initial_capital: self.initial_capital,
        }
    }

    pub fn analyzer(&self) -> PerformanceAnalyzer {
        PerformanceAnalyzer {
            sizing: self.sizing,
            initial_capital: self.initial_capital,
            sharpe_basis: self.sharpe_basis,
            annualization_factor: self.annualization_factor,
        }
    }

    /// Reject structurally invalid parameters before any computation.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.indicator_spec().validate()?;
        non_negative("stop_loss_pct", self.stop_loss_pct)?;
        non_negative("take_profit_pct", self.take_profit_pct)?;
        non_negative("initial_capital", self.initial_capital)?;
        if self.sizing == SizingMode::CapitalAllocation && self.initial_capital <= 0.0 {
            return Err(EngineError::invalid(
                "initial_capital",
                "capital allocation requires positive initial capital",
            ));
        }
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(EngineError::invalid(
                "annualization_factor",
                "must be a positive number",
            ));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid(name, "must be a non-negative number"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub indicator: IndicatorSpec,
    pub sizing: SizingMode,
    /// Set when the series was too short for a single decision bar.
    pub insufficient_data: bool,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub open_position: Option<Position>,
    pub equity_curve: Vec<EquityPoint>,
    pub indicators: IndicatorSet,
}

/// Evaluate the configured rule against a clean, ascending price series.
///
/// A series shorter than the indicator's warm-up is not an error: it yields a
/// result with no trades, a flat equity curve and entirely undefined indicators.
pub fn run_backtest(bars: &[PriceBar], config: &BacktestConfig) -> Result<BacktestResult, EngineError> {
    config.validate()?;

    let spec = config.indicator_spec();
    let insufficient_data = bars.len() < spec.required_bars();
    let indicators = if insufficient_data {
        tracing::warn!(
            bars = bars.len(),
            required = spec.required_bars(),
            indicator = %spec,
            "insufficient data, no trades will be taken"
        );
        spec.undefined(bars.len())
    } else {
        spec.compute(bars)
    };

    let outcome = simulator::simulate(bars, &indicators, config.simulation_params());
    let metrics = config.analyzer().analyze(
        &outcome.trades,
        &outcome.fills,
        &outcome.equity_curve,
        outcome.final_equity,
    );

    tracing::info!(
        indicator = %spec,
        sizing = %config.sizing,
        bars = bars.len(),
        trades = metrics.trade_count,
        total_pnl = metrics.total_pnl,
        "backtest complete"
    );

    Ok(BacktestResult {
        indicator: spec,
        sizing: config.sizing,
        insufficient_data,
        metrics,
        trades: outcome.trades,
        fills: outcome.fills,
        open_position: outcome.open_position,
        equity_curve: outcome.equity_curve,
        indicators,
    })
}

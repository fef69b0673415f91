//! Flat/long position state machine producing the trade log and equity curve.
//!
//! Per bar, while long, exits are checked in fixed priority: stop-loss,
//! take-profit, then a Sell signal. While flat, a Buy signal opens a position at
//! the bar's close. A bar that closes a position never re-opens one, and the
//! bar that opens a position never checks its exits.
//!
//! Unit and capital-allocation sizing share the state machine and differ only
//! in quantity and equity arithmetic.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::position::{ExitReason, Fill, Position, Side, Trade};
use crate::domain::price::PriceBar;
use crate::domain::signal::{self, PositionState, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SizingMode {
    /// One notional unit per trade; capital is never reallocated.
    Unit,
    /// All available capital is converted into the position on entry.
    CapitalAllocation,
}

impl FromStr for SizingMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "unit" => Ok(SizingMode::Unit),
            "capital" | "capital_allocation" => Ok(SizingMode::CapitalAllocation),
            _ => Err(EngineError::UnsupportedSizingMode {
                name: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMode::Unit => write!(f, "unit"),
            SizingMode::CapitalAllocation => write!(f, "capital_allocation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub sizing: SizingMode,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub initial_capital: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            sizing: SizingMode::Unit,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            initial_capital: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<EquityPoint>,
    pub open_position: Option<Position>,
    pub final_equity: f64,
}

#[derive(Debug, Clone)]
pub struct TradeSimulator {
    params: SimulationParams,
    /// Cash in capital-allocation mode; initial capital plus realized pnl in unit mode.
    capital: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    fills: Vec<Fill>,
    equity_curve: Vec<EquityPoint>,
}

impl TradeSimulator {
    pub fn new(params: SimulationParams) -> Self {
        TradeSimulator {
            params,
            capital: params.initial_capital,
            position: None,
            trades: Vec::new(),
            fills: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        match self.position {
            Some(_) => PositionState::Long,
            None => PositionState::Flat,
        }
    }

    /// Mark-to-market equity at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        match (&self.position, self.params.sizing) {
            (None, _) => self.capital,
            (Some(pos), SizingMode::Unit) => self.capital + pos.unrealized_pnl(price),
            (Some(pos), SizingMode::CapitalAllocation) => self.capital + pos.market_value(price),
        }
    }

    /// Apply one bar's decision, then record its equity point.
    pub fn step(&mut self, bar: &PriceBar, signal: Signal) {
        match self.position.take() {
            Some(pos) => match exit_reason(&pos, bar.close, signal) {
                Some(reason) => self.exit(pos, bar, reason),
                None => self.position = Some(pos),
            },
            None => {
                if signal == Signal::Buy {
                    self.enter(bar);
                }
            }
        }
        self.record_equity(bar);
    }

    /// Record a bar on which no decision can be made.
    pub fn skip(&mut self, bar: &PriceBar) {
        self.record_equity(bar);
    }

    pub fn finish(self) -> SimulationOutcome {
        let final_equity = match self.equity_curve.last() {
            Some(point) => point.equity,
            None => self.capital,
        };
        SimulationOutcome {
            trades: self.trades,
            fills: self.fills,
            equity_curve: self.equity_curve,
            open_position: self.position,
            final_equity,
        }
    }

    fn enter(&mut self, bar: &PriceBar) {
        let quantity = match self.params.sizing {
            SizingMode::Unit => 1.0,
            SizingMode::CapitalAllocation => {
                if bar.close <= 0.0 || self.capital <= 0.0 {
                    tracing::warn!(
                        close = bar.close,
                        capital = self.capital,
                        "skipping entry: cannot allocate capital"
                    );
                    return;
                }
                let quantity = self.capital / bar.close;
                self.capital = 0.0;
                quantity
            }
        };

        tracing::debug!(time = %bar.timestamp, price = bar.close, quantity, "enter long");
        self.fills.push(Fill {
            side: Side::Buy,
            timestamp: bar.timestamp,
            price: bar.close,
            quantity,
        });
        self.position = Some(Position::open(
            bar.close,
            bar.timestamp,
            quantity,
            self.params.stop_loss_pct,
            self.params.take_profit_pct,
        ));
    }

    fn exit(&mut self, pos: Position, bar: &PriceBar, reason: ExitReason) {
        let quantity = pos.quantity;
        match self.params.sizing {
            SizingMode::Unit => self.capital += pos.unrealized_pnl(bar.close),
            SizingMode::CapitalAllocation => self.capital += pos.market_value(bar.close),
        }

        let trade = pos.close(bar.close, bar.timestamp, reason);
        tracing::debug!(
            time = %bar.timestamp,
            price = bar.close,
            pnl = trade.pnl,
            reason = ?reason,
            "exit long"
        );
        self.fills.push(Fill {
            side: Side::Sell,
            timestamp: bar.timestamp,
            price: bar.close,
            quantity,
        });
        self.trades.push(trade);
    }

    fn record_equity(&mut self, bar: &PriceBar) {
        let equity = self.equity(bar.close);
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
        });
    }
}

fn exit_reason(pos: &Position, close: f64, signal: Signal) -> Option<ExitReason> {
    if pos.should_stop_loss(close) {
        Some(ExitReason::StopLoss)
    } else if pos.should_take_profit(close) {
        Some(ExitReason::TakeProfit)
    } else if signal == Signal::Sell {
        Some(ExitReason::Signal)
    } else {
        None
    }
}

/// Run the state machine over the whole series.
///
/// Bars whose indicator reading is undefined are recorded in the equity curve
/// but make no trading decision, exits included.
pub fn simulate(bars: &[PriceBar], indicators: &IndicatorSet, params: SimulationParams) -> SimulationOutcome {
    let mut sim = TradeSimulator::new(params);
    for (i, bar) in bars.iter().enumerate() {
        match indicators.reading(i) {
            Some(reading) => {
                let signal = signal::evaluate(bar.close, reading, sim.state());
                sim.step(bar, signal);
            }
            None => sim.skip(bar),
        }
    }
    sim.finish()
}

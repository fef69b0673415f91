//! Technical indicator implementations.
//!
//! This module provides types for representing indicator configuration and output:
//! - `IndicatorSeries`: one optional value per price bar, index-aligned with the prices
//! - `IndicatorMode`: which trading rule family is selected
//! - `IndicatorSpec`: indicator identity + parameters, one variant per mode
//! - `IndicatorSet`: the computed series for a spec, one variant per mode
//! - `IndicatorReading`: the values of an `IndicatorSet` at a single bar

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::{calculate_ema, ema_values};
pub use macd::{calculate_macd, MacdParams, MacdSeries};
pub use rsi::calculate_rsi;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::EngineError;
use crate::domain::price::PriceBar;

/// Indicator output aligned 1:1 with the price series; `None` marks warm-up.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct IndicatorSeries {
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(len: usize) -> Self {
        IndicatorSeries {
            values: vec![None; len],
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl From<Vec<f64>> for IndicatorSeries {
    fn from(values: Vec<f64>) -> Self {
        IndicatorSeries {
            values: values.into_iter().map(Some).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorMode {
    Ema,
    Rsi,
    Macd,
    Combined,
}

impl FromStr for IndicatorMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EMA" => Ok(IndicatorMode::Ema),
            "RSI" => Ok(IndicatorMode::Rsi),
            "MACD" => Ok(IndicatorMode::Macd),
            "COMBINED" | "EMA+RSI" => Ok(IndicatorMode::Combined),
            _ => Err(EngineError::UnsupportedIndicator {
                name: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for IndicatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorMode::Ema => write!(f, "EMA"),
            IndicatorMode::Rsi => write!(f, "RSI"),
            IndicatorMode::Macd => write!(f, "MACD"),
            IndicatorMode::Combined => write!(f, "COMBINED"),
        }
    }
}

/// Indicator identity plus the parameters it is computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IndicatorSpec {
    Ema { period: usize },
    Rsi { period: usize },
    Macd(MacdParams),
    Combined { ema_period: usize, rsi_period: usize },
}

impl IndicatorSpec {
    /// Build the spec for `mode`. `period` drives EMA and RSI; MACD uses its
    /// own triple; Combined pairs an EMA of `period` with an RSI of `rsi_period`.
    pub fn for_mode(mode: IndicatorMode, period: usize, macd: MacdParams, rsi_period: usize) -> Self {
        match mode {
            IndicatorMode::Ema => IndicatorSpec::Ema { period },
            IndicatorMode::Rsi => IndicatorSpec::Rsi { period },
            IndicatorMode::Macd => IndicatorSpec::Macd(macd),
            IndicatorMode::Combined => IndicatorSpec::Combined {
                ema_period: period,
                rsi_period,
            },
        }
    }

    pub fn mode(&self) -> IndicatorMode {
        match self {
            IndicatorSpec::Ema { .. } => IndicatorMode::Ema,
            IndicatorSpec::Rsi { .. } => IndicatorMode::Rsi,
            IndicatorSpec::Macd(_) => IndicatorMode::Macd,
            IndicatorSpec::Combined { .. } => IndicatorMode::Combined,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        match *self {
            IndicatorSpec::Ema { period } | IndicatorSpec::Rsi { period } => {
                require_period("period", period)
            }
            IndicatorSpec::Macd(params) => params.validate(),
            IndicatorSpec::Combined {
                ema_period,
                rsi_period,
            } => {
                require_period("period", ema_period)?;
                require_period("rsi_period", rsi_period)
            }
        }
    }

    /// Index of the first bar on which a trading decision may be made.
    ///
    /// RSI is undefined before `period`. EMA and MACD are defined from bar 0
    /// but are not treated as reliable before `period` (resp. `slow`).
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorSpec::Ema { period } | IndicatorSpec::Rsi { period } => period,
            IndicatorSpec::Macd(params) => params.slow,
            IndicatorSpec::Combined {
                ema_period,
                rsi_period,
            } => ema_period.max(rsi_period),
        }
    }

    /// Minimum series length for at least one decision bar.
    pub fn required_bars(&self) -> usize {
        self.warmup().saturating_add(1)
    }

    pub fn compute(&self, bars: &[PriceBar]) -> IndicatorSet {
        let values = match *self {
            IndicatorSpec::Ema { period } => IndicatorValues::Ema {
                ema: calculate_ema(bars, period),
            },
            IndicatorSpec::Rsi { period } => IndicatorValues::Rsi {
                rsi: calculate_rsi(bars, period),
            },
            IndicatorSpec::Macd(params) => IndicatorValues::Macd(calculate_macd(bars, params)),
            IndicatorSpec::Combined {
                ema_period,
                rsi_period,
            } => IndicatorValues::Combined {
                ema: calculate_ema(bars, ema_period),
                rsi: calculate_rsi(bars, rsi_period),
            },
        };
        IndicatorSet { spec: *self, values }
    }

    /// The degenerate set used when the series is too short to trade on.
    pub fn undefined(&self, len: usize) -> IndicatorSet {
        let blank = || IndicatorSeries::undefined(len);
        let values = match self {
            IndicatorSpec::Ema { .. } => IndicatorValues::Ema { ema: blank() },
            IndicatorSpec::Rsi { .. } => IndicatorValues::Rsi { rsi: blank() },
            IndicatorSpec::Macd(_) => IndicatorValues::Macd(MacdSeries {
                line: blank(),
                signal: blank(),
                histogram: blank(),
            }),
            IndicatorSpec::Combined { .. } => IndicatorValues::Combined {
                ema: blank(),
                rsi: blank(),
            },
        };
        IndicatorSet { spec: *self, values }
    }
}

fn require_period(name: &str, period: usize) -> Result<(), EngineError> {
    if period == 0 {
        return Err(EngineError::invalid(name, "must be at least 1"));
    }
    Ok(())
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Ema { period } => write!(f, "EMA({})", period),
            IndicatorSpec::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorSpec::Macd(p) => write!(f, "MACD({},{},{})", p.fast, p.slow, p.signal),
            IndicatorSpec::Combined {
                ema_period,
                rsi_period,
            } => write!(f, "EMA({})+RSI({})", ema_period, rsi_period),
        }
    }
}

/// Computed series; serialized without a tag since `IndicatorSpec` carries `kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValues {
    Ema { ema: IndicatorSeries },
    Rsi { rsi: IndicatorSeries },
    Macd(MacdSeries),
    Combined {
        ema: IndicatorSeries,
        rsi: IndicatorSeries,
    },
}

/// Indicator values at a single bar, only produced once every input is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    Ema { ema: f64 },
    Rsi { rsi: f64 },
    Macd { line: f64, signal: f64 },
    Combined { ema: f64, rsi: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub spec: IndicatorSpec,
    pub values: IndicatorValues,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        match &self.values {
            IndicatorValues::Ema { ema } => ema.len(),
            IndicatorValues::Rsi { rsi } => rsi.len(),
            IndicatorValues::Macd(macd) => macd.line.len(),
            IndicatorValues::Combined { ema, .. } => ema.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values at `index`, or `None` during warm-up or where any input is undefined.
    pub fn reading(&self, index: usize) -> Option<IndicatorReading> {
        if index < self.spec.warmup() {
            return None;
        }
        match &self.values {
            IndicatorValues::Ema { ema } => Some(IndicatorReading::Ema {
                ema: ema.get(index)?,
            }),
            IndicatorValues::Rsi { rsi } => Some(IndicatorReading::Rsi {
                rsi: rsi.get(index)?,
            }),
            IndicatorValues::Macd(macd) => Some(IndicatorReading::Macd {
                line: macd.line.get(index)?,
                signal: macd.signal.get(index)?,
            }),
            IndicatorValues::Combined { ema, rsi } => Some(IndicatorReading::Combined {
                ema: ema.get(index)?,
                rsi: rsi.get(index)?,
            }),
        }
    }
}

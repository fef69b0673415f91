#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbench::domain::backtest::BacktestConfig;
use signalbench::domain::error::SignalbenchError;
use signalbench::domain::indicator::IndicatorMode;
pub use signalbench::domain::price::PriceBar;
use signalbench::ports::data_port::{DataPort, DateRange};
use std::cell::Cell;

/// In-memory data port; records the last requested range.
pub struct MockDataPort {
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
    pub last_range: Cell<Option<DateRange>>,
}

impl MockDataPort {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            error: None,
            last_range: Cell::new(None),
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self, range: DateRange) -> Result<Vec<PriceBar>, SignalbenchError> {
        self.last_range.set(Some(range));
        if let Some(reason) = &self.error {
            return Err(SignalbenchError::DataFormat {
                source_name: "mock".into(),
                reason: reason.clone(),
            });
        }
        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .copied()
            .filter(|b| range.contains(b.timestamp.date()))
            .collect();
        if bars.is_empty() {
            return Err(SignalbenchError::NoData {
                source_name: "mock".into(),
            });
        }
        Ok(bars)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(offset: usize) -> NaiveDateTime {
    (date(2024, 1, 1) + chrono::Duration::days(offset as i64))
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    let ts = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    PriceBar::new(ts, close)
}

/// Daily bars from 2024-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(day(i), close))
        .collect()
}

/// A gently oscillating series, enough to trigger every indicator mode.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = start_price + 10.0 * (t / 5.0).sin() + t * 0.1;
            PriceBar::new(day(i), close)
        })
        .collect()
}

pub fn config_for(indicator: IndicatorMode, period: usize) -> BacktestConfig {
    BacktestConfig {
        indicator,
        period,
        ..BacktestConfig::default()
    }
}

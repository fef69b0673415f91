//! Configuration validation.
//!
//! Checks raw INI values before a backtest is built. `ConfigPort` getters fall
//! back to defaults on malformed numbers, so every numeric key is re-read here
//! as a string and parsed strictly.

use std::str::FromStr;

use crate::domain::error::SignalbenchError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SLOW};
use crate::domain::indicator::IndicatorMode;
use crate::domain::metrics::SharpeBasis;
use crate::domain::simulator::SizingMode;
use crate::logging::LogFormat;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    validate_data_path(config)?;
    validate_delimiter(config)?;
    validate_date_range(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    parse_optional::<IndicatorMode>(config, "backtest", "indicator")?;
    positive_int(config, "backtest", "period")?;
    non_negative(config, "backtest", "stop_loss")?;
    non_negative(config, "backtest", "take_profit")?;
    let capital = non_negative(config, "backtest", "initial_capital")?;
    let sizing = parse_optional::<SizingMode>(config, "backtest", "position_sizing")?;
    if sizing == Some(SizingMode::CapitalAllocation) && capital == Some(0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "capital allocation requires positive initial_capital",
        ));
    }
    parse_optional::<SharpeBasis>(config, "backtest", "sharpe_basis")?;
    if let Some(factor) = parse_optional::<f64>(config, "backtest", "annualization_factor")? {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(invalid(
                "backtest",
                "annualization_factor",
                "annualization_factor must be positive",
            ));
        }
    }
    validate_macd(config)?;
    positive_int(config, "combined", "rsi_period")?;
    Ok(())
}

pub fn validate_log_config(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    parse_optional::<LogFormat>(config, "log", "format")?;
    Ok(())
}

/// Resolve a configured delimiter: a single ASCII character or one of the
/// names `semicolon`, `comma`, `tab`, `pipe`.
///
/// The names exist because `;` and `#` start INI comments.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "semicolon" => Some(b';'),
        "comma" => Some(b','),
        "tab" | "\\t" => Some(b'\t'),
        "pipe" => Some(b'|'),
        s if s.len() == 1 && s.is_ascii() => s.bytes().next(),
        _ => None,
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn validate_data_path(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SignalbenchError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

pub fn validate_delimiter(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    match config.get_string("data", "delimiter") {
        Some(s) if parse_delimiter(&s).is_none() => Err(invalid(
            "data",
            "delimiter",
            "delimiter must be a single ASCII character or semicolon, comma, tab, pipe",
        )),
        _ => Ok(()),
    }
}

pub fn validate_date_range(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, SignalbenchError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) => parse_date(&s).map(Some).ok_or_else(|| {
            invalid("data", key, &format!("invalid {key} format, expected YYYY-MM-DD"))
        }),
    }
}

fn validate_macd(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let fast = positive_int(config, "macd", "fast")?;
    let slow = positive_int(config, "macd", "slow")?;
    positive_int(config, "macd", "signal")?;

    let fast = fast.unwrap_or(DEFAULT_FAST);
    let slow = slow.unwrap_or(DEFAULT_SLOW);
    if fast >= slow {
        return Err(invalid("macd", "fast", "fast must be shorter than slow"));
    }
    Ok(())
}

fn parse_optional<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, SignalbenchError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(section, key, &e.to_string())),
    }
}

fn positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<usize>, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(v) if v >= 1 => Ok(Some(v)),
            _ => Err(invalid(section, key, &format!("{key} must be a positive integer"))),
        },
    }
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, SignalbenchError> {
    match parse_optional::<f64>(config, section, key)? {
        Some(v) if !v.is_finite() || v < 0.0 => Err(invalid(
            section,
            key,
            &format!("{key} must be a non-negative number"),
        )),
        other => Ok(other),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SignalbenchError {
    SignalbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

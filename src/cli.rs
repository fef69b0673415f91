//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DELIMITER};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, BacktestResult, DEFAULT_INITIAL_CAPITAL, DEFAULT_PERIOD,
};
use crate::domain::config_validation::{
    parse_date, parse_delimiter, validate_backtest_config, validate_data_config, validate_data_path,
    validate_date_range, validate_delimiter, validate_log_config,
};
use crate::domain::error::SignalbenchError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{IndicatorMode, MacdParams};
use crate::domain::metrics::{SharpeBasis, TRADING_DAYS_PER_YEAR};
use crate::domain::simulator::SizingMode;
use crate::logging::{self, LogFormat};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, DateRange};
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "backtest.json";

#[derive(Parser, Debug)]
#[command(name = "signalbench", about = "Single-instrument trading rule backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the JSON report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price file, overriding [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// EMA, RSI, MACD or COMBINED
        #[arg(long)]
        indicator: Option<String>,
        #[arg(long)]
        period: Option<usize>,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            indicator,
            period,
        } => run_backtest(
            &config,
            data.as_ref(),
            output.as_ref(),
            indicator.as_deref(),
            period,
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Install the tracing subscriber from the `[log]` section.
pub fn init_logging(adapter: &dyn ConfigPort) {
    let level = adapter
        .get_string("log", "level")
        .unwrap_or_else(|| "info".to_string());
    let format = adapter
        .get_string("log", "format")
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();
    if let Err(e) = logging::init_tracing(&level, format) {
        eprintln!("warning: {e}");
    }
}

fn run_backtest(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    indicator_override: Option<&str>,
    period_override: Option<usize>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // -d replaces [data] path only; the rest of [data] still applies
    let checks = validate_backtest_config(&adapter)
        .and_then(|()| validate_delimiter(&adapter))
        .and_then(|()| validate_date_range(&adapter))
        .and_then(|()| validate_log_config(&adapter))
        .and_then(|()| match data_override {
            Some(_) => Ok(()),
            None => validate_data_path(&adapter),
        });
    if let Err(e) = checks {
        eprintln!("error: {e}");
        return (&e).into();
    }
    init_logging(&adapter);
    tracing::debug!(source = adapter.source(), "configuration validated");

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Some(name) = indicator_override {
        bt_config.indicator = match name.parse::<IndicatorMode>() {
            Ok(mode) => mode,
            Err(e) => {
                let err = SignalbenchError::from(e);
                eprintln!("error: {err}");
                return (&err).into();
            }
        };
    }
    if let Some(period) = period_override {
        bt_config.period = period;
    }

    let range = match build_date_range(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data_path = match data_override {
        Some(p) => p.clone(),
        None => match adapter.get_string("data", "path") {
            Some(p) => PathBuf::from(p),
            None => {
                let err = SignalbenchError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        },
    };
    let delimiter = adapter
        .get_string("data", "delimiter")
        .and_then(|d| parse_delimiter(&d))
        .unwrap_or(DEFAULT_DELIMITER);

    let data_port = CsvAdapter::new(data_path, delimiter);
    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    run_backtest_pipeline(&data_port, &JsonReportAdapter::new(), &bt_config, range, &output)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SignalbenchError> {
    let indicator = match adapter.get_string("backtest", "indicator") {
        Some(s) => s.parse::<IndicatorMode>()?,
        None => IndicatorMode::Ema,
    };
    let sizing = match adapter.get_string("backtest", "position_sizing") {
        Some(s) => s.parse::<SizingMode>()?,
        None => SizingMode::Unit,
    };
    let sharpe_basis = match adapter.get_string("backtest", "sharpe_basis") {
        Some(s) => s.parse::<SharpeBasis>()?,
        None => SharpeBasis::EquityReturns,
    };

    Ok(BacktestConfig {
        indicator,
        period: get_usize(adapter, "backtest", "period", DEFAULT_PERIOD),
        macd: MacdParams {
            fast: get_usize(adapter, "macd", "fast", DEFAULT_FAST),
            slow: get_usize(adapter, "macd", "slow", DEFAULT_SLOW),
            signal: get_usize(adapter, "macd", "signal", DEFAULT_SIGNAL),
        },
        combined_rsi_period: get_usize(adapter, "combined", "rsi_period", DEFAULT_PERIOD),
        stop_loss_pct: adapter.get_double("backtest", "stop_loss", 0.0),
        take_profit_pct: adapter.get_double("backtest", "take_profit", 0.0),
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        sizing,
        sharpe_basis,
        annualization_factor: adapter.get_double(
            "backtest",
            "annualization_factor",
            TRADING_DAYS_PER_YEAR,
        ),
    })
}

pub fn build_date_range(adapter: &dyn ConfigPort) -> Result<DateRange, SignalbenchError> {
    let date = |key: &str| -> Result<Option<chrono::NaiveDate>, SignalbenchError> {
        match adapter.get_string("data", key) {
            None => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| SignalbenchError::ConfigInvalid {
                    section: "data".into(),
                    key: key.into(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }),
        }
    };
    Ok(DateRange {
        start: date("start_date")?,
        end: date("end_date")?,
    })
}

fn get_usize(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).unwrap_or(0)
}

/// Fetch, run and report. Returns the result so callers can inspect it.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    range: DateRange,
    output_path: &Path,
) -> Result<BacktestResult, SignalbenchError> {
    let bars = data_port.fetch_prices(range)?;
    eprintln!(
        "Running backtest: {} over {} bars",
        bt_config.indicator_spec(),
        bars.len()
    );
    let result = backtest_engine::run_backtest(&bars, bt_config)?;
    report_port.write(&result, output_path)?;
    Ok(result)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    range: DateRange,
    output_path: &Path,
) -> ExitCode {
    match execute_backtest(data_port, report_port, bt_config, range, output_path) {
        Ok(result) => {
            print_summary(&result);
            eprintln!("\nReport written to: {}", output_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== Results: {} ({}) ===", result.indicator, result.sizing);
    if result.insufficient_data {
        eprintln!("warning: series shorter than indicator warm-up, no trades taken");
    }
    eprintln!("Total PnL:        {:.2}", m.total_pnl);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("Final Equity:     {:.2}", m.final_equity);
    eprintln!("Total Trades:     {}", m.trade_count);
    eprintln!("Win Rate:         {:.1}%", m.win_rate);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown);
    eprintln!("CAGR:             {:.2}%", m.cagr * 100.0);
    if let Some(pos) = &result.open_position {
        eprintln!(
            "Open Position:    {} @ {:.2} since {}",
            pos.quantity, pos.entry_price, pos.entry_time
        );
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checks = validate_data_config(&adapter)
        .and_then(|()| validate_backtest_config(&adapter))
        .and_then(|()| validate_log_config(&adapter));
    if let Err(e) = checks {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = bt_config.validate() {
        let err = SignalbenchError::from(e);
        eprintln!("error: {err}");
        return (&err).into();
    }

    let spec = bt_config.indicator_spec();
    eprintln!("\nIndicator:        {}", spec);
    eprintln!("Warm-up bars:     {}", spec.required_bars());
    eprintln!("Position sizing:  {}", bt_config.sizing);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

//! End-to-end engine tests over hand-built price series.

mod common;

use approx::assert_relative_eq;
use common::*;
use signalbench::domain::backtest::{run_backtest, BacktestConfig};
use signalbench::domain::error::EngineError;
use signalbench::domain::indicator::{IndicatorMode, MacdParams};
use signalbench::domain::position::{ExitReason, Side};
use signalbench::domain::signal::{self, Signal};
use signalbench::domain::simulator::SizingMode;

mod scenarios {
    use super::*;

    #[test]
    fn price_below_ema_never_trades() {
        let closes: Vec<f64> = (0..30).map(|i| 200.0 - i as f64 * 2.0).collect();
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &config_for(IndicatorMode::Ema, 5)).unwrap();

        assert!(result.fills.is_empty());
        assert!(result.trades.is_empty());
        assert_eq!(result.metrics.total_pnl, 0.0);
        assert_eq!(result.metrics.trade_count, 0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
    }

    #[test]
    fn rsi_first_buy_after_warmup() {
        let bars = bars_from_closes(&[100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0]);
        let config = config_for(IndicatorMode::Rsi, 3);
        let result = run_backtest(&bars, &config).unwrap();

        // rsi at 3: three straight losses, avg gain 0 -> RSI 0
        let rsi = match &result.indicators.values {
            signalbench::domain::indicator::IndicatorValues::Rsi { rsi } => rsi.clone(),
            other => panic!("unexpected values: {other:?}"),
        };
        assert_eq!(rsi.get(2), None);
        assert_eq!(rsi.get(3), Some(0.0));

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let signals = signal::generate(&result.indicators, &closes);
        let first_buy = signals.iter().position(|s| *s == Signal::Buy);
        assert_eq!(first_buy, Some(3));

        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.fills[0].side, Side::Buy);
        assert_eq!(result.fills[0].price, 70.0);
    }

    #[test]
    fn stop_loss_overrides_hold() {
        let bars = bars_from_closes(&[120.0, 110.0, 100.0, 120.0, 94.0]);
        let config = BacktestConfig {
            stop_loss_pct: 5.0,
            ..config_for(IndicatorMode::Rsi, 2)
        };
        let result = run_backtest(&bars, &config).unwrap();

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let signals = signal::generate(&result.indicators, &closes);
        assert_eq!(signals[2], Signal::Buy);
        assert_eq!(signals[4], Signal::Hold);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.entry_price, 100.0);
        assert_eq!(trade.exit_price, 94.0);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_time, bars[4].timestamp);
        assert_relative_eq!(trade.pnl, -6.0);
        assert!(result.open_position.is_none());
        assert_relative_eq!(result.metrics.max_drawdown_dollar, 26.0, epsilon = 1e-9);
    }

    #[test]
    fn open_position_marked_to_market() {
        let bars = bars_from_closes(&[100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0]);
        let result = run_backtest(&bars, &config_for(IndicatorMode::Rsi, 3)).unwrap();

        let buys = result.fills.iter().filter(|f| f.side == Side::Buy).count();
        assert_eq!(buys, 1);
        assert_eq!(result.trades.len(), buys - 1);

        let open = result.open_position.as_ref().unwrap();
        assert_eq!(open.entry_price, 70.0);

        let last = result.equity_curve.last().unwrap();
        assert_relative_eq!(last.equity, 100_000.0 + (10.0 - 70.0));
        assert_relative_eq!(result.metrics.final_equity, last.equity);
        // unrealized loss is not realized pnl
        assert_eq!(result.metrics.total_pnl, 0.0);
    }
}

mod engine {
    use super::*;

    #[test]
    fn equity_curve_matches_bar_count_for_every_mode() {
        let bars = generate_bars(120, 100.0);
        for mode in [
            IndicatorMode::Ema,
            IndicatorMode::Rsi,
            IndicatorMode::Macd,
            IndicatorMode::Combined,
        ] {
            let result = run_backtest(&bars, &config_for(mode, 10)).unwrap();
            assert_eq!(result.equity_curve.len(), bars.len(), "{mode}");
            assert_eq!(result.indicators.len(), bars.len(), "{mode}");
            for (point, bar) in result.equity_curve.iter().zip(&bars) {
                assert_eq!(point.timestamp, bar.timestamp);
            }
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let bars = generate_bars(200, 50.0);
        let config = BacktestConfig {
            stop_loss_pct: 3.0,
            take_profit_pct: 6.0,
            ..config_for(IndicatorMode::Combined, 12)
        };
        let a = run_backtest(&bars, &config).unwrap();
        let b = run_backtest(&bars, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unit_mode_pnl_sums_trades() {
        let bars = generate_bars(150, 100.0);
        let result = run_backtest(&bars, &config_for(IndicatorMode::Ema, 8)).unwrap();
        assert!(!result.trades.is_empty());

        let sum: f64 = result.trades.iter().map(|t| t.pnl).sum();
        assert_eq!(result.metrics.total_pnl, sum);
        for trade in &result.trades {
            assert_eq!(trade.quantity, 1.0);
            assert_eq!(trade.pnl, trade.exit_price - trade.entry_price);
        }
    }

    #[test]
    fn trades_never_overlap() {
        let bars = generate_bars(300, 80.0);
        let result = run_backtest(&bars, &config_for(IndicatorMode::Macd, 14)).unwrap();
        for pair in result.trades.windows(2) {
            assert!(pair[0].exit_time <= pair[1].entry_time);
        }
        for fills in result.fills.chunks(2) {
            assert_eq!(fills[0].side, Side::Buy);
            if let Some(sell) = fills.get(1) {
                assert_eq!(sell.side, Side::Sell);
            }
        }
    }

    #[test]
    fn macd_mode_ignores_period() {
        let bars = generate_bars(100, 100.0);
        let a = run_backtest(&bars, &config_for(IndicatorMode::Macd, 3)).unwrap();
        let b = run_backtest(&bars, &config_for(IndicatorMode::Macd, 40)).unwrap();
        assert_eq!(a.trades, b.trades);
    }

    #[test]
    fn capital_allocation_compounds() {
        let bars = bars_from_closes(&[120.0, 110.0, 100.0, 120.0, 140.0]);
        let config = BacktestConfig {
            sizing: SizingMode::CapitalAllocation,
            initial_capital: 1_000.0,
            ..config_for(IndicatorMode::Rsi, 2)
        };
        let result = run_backtest(&bars, &config).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_relative_eq!(trade.quantity, 10.0);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert_relative_eq!(trade.pnl, 400.0, epsilon = 1e-9);
        assert_relative_eq!(result.metrics.final_equity, 1_400.0, epsilon = 1e-9);
        assert_relative_eq!(result.metrics.total_pnl, 400.0, epsilon = 1e-9);
        assert_relative_eq!(result.metrics.total_return_pct, 40.0, epsilon = 1e-9);
        assert_relative_eq!(result.metrics.win_rate, 100.0);
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        let result = run_backtest(&bars, &BacktestConfig::default()).unwrap();

        assert!(result.insufficient_data);
        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 3);
        assert!(result.equity_curve.iter().all(|p| p.equity == 100_000.0));
        assert_eq!(result.metrics.sharpe_ratio, 0.0);
        assert_eq!(result.metrics.cagr, 0.0);
    }

    #[test]
    fn invalid_macd_is_rejected() {
        let config = BacktestConfig {
            indicator: IndicatorMode::Macd,
            macd: MacdParams {
                fast: 26,
                slow: 12,
                signal: 9,
            },
            ..BacktestConfig::default()
        };
        let err = run_backtest(&generate_bars(50, 10.0), &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = run_backtest(&generate_bars(50, 10.0), &config_for(IndicatorMode::Ema, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
    }

    #[test]
    fn metrics_are_finite() {
        let bars = generate_bars(250, 100.0);
        for mode in [IndicatorMode::Ema, IndicatorMode::Rsi, IndicatorMode::Combined] {
            let m = run_backtest(&bars, &config_for(mode, 14)).unwrap().metrics;
            for v in [
                m.total_pnl,
                m.win_rate,
                m.sharpe_ratio,
                m.max_drawdown,
                m.cagr,
                m.volatility,
                m.avg_pnl_per_trade,
            ] {
                assert!(v.is_finite(), "{mode}: {m:?}");
            }
            assert!((0.0..=100.0).contains(&m.win_rate));
            assert!((0.0..=100.0).contains(&m.max_drawdown));
        }
    }
}

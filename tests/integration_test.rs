//! Integration tests for the backtest pipeline.
//!
//! Tests cover:
//! - Full pipeline with a mock data port
//! - Determinism and report/ledger consistency
//! - Zero-trade runs and configuration failures
//! - Warm-up gating, entry tie-break, stop-vs-target precedence, gap fills
//! - End-to-end reference series (#[ignore], needs tests/fixtures/bitcoin_1m.csv)

mod common;

use common::*;
use tradesim::adapters::csv_adapter::CsvAdapter;
use tradesim::domain::backtest::run_backtest;
use tradesim::domain::error::EngineError;
use tradesim::domain::indicator::compute_indicators;
use tradesim::domain::indicator::params::{
    BollingerParams, MacdParams, MovingAveragePair, RsiParams, VolumeSpikeParams,
};
use tradesim::domain::indicator::IndicatorParams;
use tradesim::domain::position::{Direction, ExitReason};
use tradesim::domain::risk::{RiskConfig, StopMode};
use tradesim::domain::signal_eval::{CompiledStrategy, SignalSet};
use tradesim::domain::sizing::PositionSizingConfig;
use tradesim::domain::strategy::StrategyConfig;
use tradesim::ports::data_port::DataPort;

fn reference_params() -> IndicatorParams {
    IndicatorParams {
        sma: None,
        ema: Some(MovingAveragePair { fast: 9, slow: 21 }),
        bollinger: Some(BollingerParams {
            period: 15,
            std_dev: 1.5,
        }),
        atr_period: Some(14),
        rsi: Some(RsiParams {
            period: 20,
            overbought: 70.0,
            oversold: 35.0,
        }),
        macd: Some(MacdParams {
            fast: 8,
            slow: 21,
            signal: 5,
        }),
        breakout_window: Some(20),
        volume_spike: Some(VolumeSpikeParams {
            window: 30,
            multiplier: 1.3,
        }),
    }
}

fn breakout_params(window: usize) -> IndicatorParams {
    IndicatorParams {
        breakout_window: Some(window),
        ..IndicatorParams::default()
    }
}

/// Three flat bars at 100 then `rows`.
fn flat_then(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let mut all = vec![(100.0, 100.5, 99.5, 100.0); 3];
    all.extend_from_slice(rows);
    bars_from_rows(&all)
}

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn pipeline_with_mock_data_port() {
        let port = MockDataPort::new().with_bars("TEST", generate_bars(400, 100.0));
        let bars = port.fetch_bars("TEST").unwrap();

        let run = run_config(
            reference_params(),
            StrategyConfig::preset("Combined_Trigger_Verifier").unwrap(),
            RiskConfig::default(),
        );
        let result = run.run(&bars).unwrap();

        assert_eq!(result.report.ticker, "TEST");
        assert_eq!(result.report.total_data_points, 400);
        assert_eq!(result.report.total_trades, result.trades.len());
        assert_eq!(result.report.indicator_configurations.len(), 7);
        assert_eq!(
            result.report.total_signals_non_hold,
            result.report.num_buy_signals + result.report.num_sell_signals
        );
    }

    #[test]
    fn data_port_error_is_data_error() {
        let port = MockDataPort::new().with_error("TEST", "disk on fire");
        let err = port.fetch_bars("TEST").unwrap_err();
        assert!(matches!(err, EngineError::Data { .. }));
    }

    #[test]
    fn empty_series_rejected() {
        let port = MockDataPort::new();
        let bars = port.fetch_bars("MISSING").unwrap();
        let run = run_config(reference_params(), StrategyConfig::default(), RiskConfig::default());
        assert!(matches!(run.run(&bars), Err(EngineError::EmptySeries)));
    }

    #[test]
    fn run_backtest_matches_run_config() {
        let bars = generate_bars(300, 50.0);
        let run = run_config(
            reference_params(),
            StrategyConfig::preset("BB_RSI").unwrap(),
            RiskConfig::default(),
        );
        let direct = run_backtest(
            &bars,
            &run.indicators,
            &run.strategy,
            &run.risk,
            &run.sizing,
            &run.backtest,
        )
        .unwrap();
        assert_eq!(direct, run.run(&bars).unwrap());
    }
}

mod determinism {
    use super::*;

    #[test]
    fn identical_inputs_identical_report() {
        let bars = generate_bars(500, 100.0);
        let run = run_config(
            reference_params(),
            StrategyConfig::preset("Combined_Trigger_Verifier").unwrap(),
            RiskConfig::default(),
        );
        let a = run.run(&bars).unwrap();
        let b = run.run(&bars).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.report).unwrap(),
            serde_json::to_string(&b.report).unwrap()
        );
    }
}

mod ledger_invariants {
    use super::*;

    #[test]
    fn trades_never_overlap() {
        for preset in ["EMA_Only", "BB_Breakout", "BB_RSI", "Combined_Trigger_Verifier"] {
            let bars = generate_bars(500, 100.0);
            let run = run_config(
                reference_params(),
                StrategyConfig::preset(preset).unwrap(),
                RiskConfig::default(),
            );
            let result = run.run(&bars).unwrap();

            for trade in &result.trades {
                assert!(trade.exit_index > trade.entry_index, "{preset}: {trade:?}");
                assert!(trade.exit_index < bars.len());
            }
            for pair in result.trades.windows(2) {
                assert!(pair[0].exit_index <= pair[1].entry_index, "{preset}: overlapping trades");
            }
        }
    }

    #[test]
    fn report_identities() {
        let bars = generate_bars(500, 100.0);
        let run = run_config(
            reference_params(),
            StrategyConfig::preset("Combined_Trigger_Verifier").unwrap(),
            RiskConfig::default(),
        );
        let r = run.run(&bars).unwrap().report;

        assert!(r.winning_trades + r.losing_trades <= r.total_trades);
        assert!((r.net_profit - (r.gross_profit - r.gross_loss)).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&r.max_drawdown_percentage));
        if r.total_trades == 0 {
            assert_eq!(r.win_rate_pct, 0.0);
        } else {
            let expected = 100.0 * r.winning_trades as f64 / r.total_trades as f64;
            assert!((r.win_rate_pct - expected).abs() <= 0.0051);
        }
    }
}

mod zero_trades {
    use super::*;

    #[test]
    fn empty_strategy_yields_well_formed_report() {
        let bars = generate_bars(120, 100.0);
        let run = run_config(reference_params(), StrategyConfig::default(), RiskConfig::default());
        let result = run.run(&bars).unwrap();
        let r = &result.report;

        assert!(result.trades.is_empty());
        assert_eq!(r.total_trades, 0);
        assert_eq!(r.winning_trades, 0);
        assert_eq!(r.losing_trades, 0);
        assert_eq!(r.net_profit, 0.0);
        assert_eq!(r.win_rate_pct, 0.0);
        assert_eq!(r.profit_factor, 0.0);
        assert_eq!(r.max_drawdown_value, 0.0);
        assert_eq!(r.sharpe_ratio_simplified_per_trade, 0.0);
        assert_eq!(r.total_signals_non_hold, 0);
    }

    #[test]
    fn series_shorter_than_warmup_yields_no_trades() {
        let bars = generate_bars(15, 100.0);
        let run = run_config(
            reference_params(),
            StrategyConfig::preset("EMA_Only").unwrap(),
            RiskConfig::default(),
        );
        let result = run.run(&bars).unwrap();
        assert_eq!(result.report.total_trades, 0);
    }
}

mod configuration_errors {
    use super::*;

    #[test]
    fn unknown_expression() {
        let run = run_config(
            reference_params(),
            slots(&["ema_crossover", "full_moon"], &[], &[], &[]),
            RiskConfig::default(),
        );
        let err = run.run(&generate_bars(50, 100.0)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownExpression { ref name, .. } if name == "full_moon"));
    }

    #[test]
    fn expression_without_indicator() {
        let run = run_config(
            breakout_params(20),
            slots(&["rsi_is_oversold"], &[], &[], &[]),
            RiskConfig::default(),
        );
        let err = run.run(&generate_bars(50, 100.0)).unwrap_err();
        assert!(matches!(err, EngineError::MissingIndicator { .. }));
    }

    #[test]
    fn zero_window() {
        let run = run_config(
            breakout_params(0),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            RiskConfig::default(),
        );
        let err = run.run(&generate_bars(50, 100.0)).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref key, .. } if key == "breakout_window"));
    }

    #[test]
    fn atr_mode_without_atr() {
        let risk = RiskConfig {
            mode: StopMode::AtrMultiple,
            ..RiskConfig::default()
        };
        let run = run_config(breakout_params(20), slots(&["price_breaks_channel_high"], &[], &[], &[]), risk);
        let err = run.run(&generate_bars(50, 100.0)).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref section, .. } if section == "risk"));
    }
}

mod warmup {
    use super::*;

    #[test]
    fn no_signal_below_gate() {
        let bars = generate_bars(200, 100.0);
        let params = reference_params();
        let strategy = StrategyConfig::preset("Combined_Trigger_Verifier").unwrap();
        let compiled = CompiledStrategy::compile(&strategy, &params).unwrap();
        let indicators = compute_indicators(&bars, params.indicator_types());

        let widest = compiled.required_indicators().map(|t| t.window()).max().unwrap();
        assert_eq!(compiled.warmup_gate(), widest);
        assert!(compiled.warmup_gate() >= 25);
        for i in 0..compiled.warmup_gate() {
            assert_eq!(compiled.evaluate(i, &bars, &indicators), SignalSet::default());
        }
    }

    #[test]
    fn first_entry_not_before_gate() {
        let bars = generate_bars(300, 100.0);
        let run = run_config(
            reference_params(),
            StrategyConfig::preset("Combined_Trigger_Verifier").unwrap(),
            RiskConfig::default(),
        );
        let compiled = CompiledStrategy::compile(&run.strategy, &run.indicators).unwrap();
        let result = run.run(&bars).unwrap();
        if let Some(first) = result.trades.first() {
            assert!(first.entry_index >= compiled.warmup_gate());
        }
    }
}

mod simulator_rules {
    use super::*;

    #[test]
    fn tie_break_opens_no_position() {
        let bars = flat_then(&[(100.0, 105.0, 100.0, 105.0), (105.0, 105.5, 104.5, 105.0)]);
        let run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &["price_breaks_channel_high"], &[], &[]),
            zero_cost_risk(0.02, 0.02),
        );
        let result = run.run(&bars).unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.report.num_buy_signals, 0);
        assert_eq!(result.report.num_sell_signals, 0);
    }

    #[test]
    fn stop_loss_wins_over_take_profit() {
        let bars = flat_then(&[(100.0, 105.0, 100.0, 105.0), (104.0, 108.0, 102.0, 104.0)]);
        let run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            zero_cost_risk(0.02, 0.02),
        );
        let result = run.run(&bars).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Long);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!((trade.exit_price - 102.9).abs() < 1e-9);

        let r = &result.report;
        assert_eq!(r.losing_trades, 1);
        assert_eq!(r.net_profit, -40.0);
        assert_eq!(r.gross_loss, 40.0);
        assert_eq!(r.max_drawdown_value, 40.0);
        assert_eq!(r.max_drawdown_percentage, 0.4);
    }

    #[test]
    fn gap_through_stop_fills_at_open() {
        let bars = flat_then(&[(100.0, 105.0, 100.0, 105.0), (100.0, 101.0, 99.0, 100.0)]);
        let run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            zero_cost_risk(0.02, 0.02),
        );
        let result = run.run(&bars).unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_price, 100.0);
        assert_eq!(result.report.net_profit, -95.24);
    }

    #[test]
    fn short_take_profit() {
        let bars = flat_then(&[(100.0, 100.0, 95.0, 95.0), (95.0, 95.5, 92.0, 95.0)]);
        let run = run_config(
            breakout_params(3),
            slots(&[], &["price_breaks_channel_low"], &[], &[]),
            zero_cost_risk(0.0, 0.02),
        );
        let result = run.run(&bars).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert!((trade.exit_price - 93.1).abs() < 1e-9);
        // 10000 * 0.2 * 2%
        assert_eq!(result.report.net_profit, 40.0);
        assert_eq!(result.report.num_sell_signals, 1);
    }

    #[test]
    fn leverage_scales_pnl() {
        let bars = flat_then(&[(100.0, 105.0, 100.0, 105.0), (104.0, 108.0, 102.0, 104.0)]);
        let mut run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            zero_cost_risk(0.02, 0.02),
        );
        run.backtest.leverage = 3.0;
        let result = run.run(&bars).unwrap();
        assert_eq!(result.report.net_profit, -120.0);
        assert_eq!(result.report.leverage_applied, 3.0);
    }

    #[test]
    fn high_volatility_sizes_up() {
        // A 30% range inside the lookback pushes sizing to the high-volatility fraction.
        let bars = bars_from_rows(&[
            (100.0, 100.5, 80.0, 100.0),
            (100.0, 100.5, 99.5, 100.0),
            (100.0, 100.5, 99.5, 100.0),
            (100.0, 105.0, 100.0, 105.0),
            (105.0, 106.0, 104.0, 106.0),
        ]);
        let run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            zero_cost_risk(0.0, 0.0),
        );
        let result = run.run(&bars).unwrap();
        let sizing = PositionSizingConfig::default();
        assert_eq!(result.trades[0].size_fraction, sizing.high_vol_fraction);
        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn lookback_longer_than_calendar_covers_all_bars() {
        let bars = bars_from_rows(&[
            (100.0, 100.5, 80.0, 100.0),
            (100.0, 100.5, 99.5, 100.0),
            (100.0, 100.5, 99.5, 100.0),
            (100.0, 105.0, 100.0, 105.0),
            (105.0, 106.0, 104.0, 106.0),
        ]);
        let mut run = run_config(
            breakout_params(3),
            slots(&["price_breaks_channel_high"], &[], &[], &[]),
            zero_cost_risk(0.0, 0.0),
        );
        run.sizing.volatility_lookback_minutes = 1_000_000_000_000;
        let result = run.run(&bars).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].size_fraction, run.sizing.high_vol_fraction);

        run.sizing.volatility_lookback_minutes = i64::MAX;
        let err = run.run(&bars).unwrap_err();
        assert!(
            matches!(err, EngineError::ConfigInvalid { ref key, .. } if key == "volatility_lookback_minutes")
        );
    }
}

mod reference_series {
    use super::*;
    use std::path::PathBuf;

    #[test]
    #[ignore = "needs tests/fixtures/bitcoin_1m.csv"]
    fn bitcoin_one_minute_reference() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
        let bars = CsvAdapter::new(dir).fetch_bars("bitcoin_1m").unwrap();

        let mut run = run_config(
            IndicatorParams {
                ema: None,
                ..reference_params()
            },
            StrategyConfig::preset("Combined_Trigger_Verifier").unwrap(),
            RiskConfig::default(),
        );
        run.backtest.ticker = "BITCOIN".into();
        let r = run.run(&bars).unwrap().report;

        assert_eq!(r.total_trades, 24);
        assert_eq!(r.winning_trades, 21);
        assert_eq!(r.losing_trades, 3);
        assert_eq!(r.net_profit, 4767.87);
        assert_eq!(r.win_rate_pct, 87.5);
        assert!((r.profit_factor - 34.74).abs() < 0.01);
        assert_eq!(r.max_drawdown_percentage, 0.84);
    }
}

//! Backtest entry point.
//!
//! `run_backtest` is a pure function of its inputs: validate, compile the
//! strategy, compute indicators, simulate, then reduce the ledger into a
//! [`Report`].

use serde::{Deserialize, Serialize};
use tracing::info;

use super::config_validation;
use super::error::EngineError;
use super::indicator::{compute_indicators, IndicatorParams};
use super::metrics::Metrics;
use super::ohlcv::{validate_series, Bar};
use super::position::Trade;
use super::report::Report;
use super::risk::RiskConfig;
use super::signal_eval::CompiledStrategy;
use super::simulator::Simulator;
use super::sizing::PositionSizingConfig;
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub ticker: String,
    /// Label for the report; derived from the bar timestamps when absent.
    pub period_tested: Option<String>,
    pub interval_tested: String,
    pub initial_capital: f64,
    pub leverage: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            period_tested: None,
            interval_tested: String::new(),
            initial_capital: 10_000.0,
            leverage: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub report: Report,
    pub trades: Vec<Trade>,
}

pub fn run_backtest(
    bars: &[Bar],
    indicator_params: &IndicatorParams,
    strategy_config: &StrategyConfig,
    risk_config: &RiskConfig,
    sizing_config: &PositionSizingConfig,
    backtest_config: &BacktestConfig,
) -> Result<BacktestResult, EngineError> {
    validate_series(bars)?;
    config_validation::validate_all(indicator_params, risk_config, sizing_config, backtest_config)?;
    let strategy = CompiledStrategy::compile(strategy_config, indicator_params)?;

    let indicators = compute_indicators(bars, indicator_params.indicator_types());
    info!(
        ticker = %backtest_config.ticker,
        bars = bars.len(),
        indicators = indicators.len(),
        warmup = strategy.warmup_gate(),
        "starting backtest"
    );

    let outcome = Simulator::new(bars, &indicators, &strategy, risk_config, sizing_config)
        .with_capital(backtest_config.initial_capital, backtest_config.leverage)
        .with_atr(indicator_params.atr_type())
        .run();

    let metrics = Metrics::compute(&outcome.trades, backtest_config.initial_capital);
    let report = Report::build(
        backtest_config,
        bars,
        outcome.signals,
        &metrics,
        indicator_params.configurations(),
    );

    info!(
        ticker = %report.ticker,
        trades = report.total_trades,
        net_profit = report.net_profit,
        win_rate_pct = report.win_rate_pct,
        "backtest complete"
    );

    Ok(BacktestResult {
        report,
        trades: outcome.trades,
    })
}

/// Every parameter of one backtest trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestConfig,
    pub indicators: IndicatorParams,
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub sizing: PositionSizingConfig,
}

impl RunConfig {
    pub fn run(&self, bars: &[Bar]) -> Result<BacktestResult, EngineError> {
        run_backtest(
            bars,
            &self.indicators,
            &self.strategy,
            &self.risk,
            &self.sizing,
            &self.backtest,
        )
    }
}

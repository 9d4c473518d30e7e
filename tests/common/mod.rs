#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tradesim::domain::backtest::{BacktestConfig, RunConfig};
use tradesim::domain::error::EngineError;
use tradesim::domain::indicator::IndicatorParams;
pub use tradesim::domain::ohlcv::Bar;
use tradesim::domain::risk::{RiskConfig, StopMode};
use tradesim::domain::sizing::PositionSizingConfig;
use tradesim::domain::strategy::StrategyConfig;
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, EngineError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(EngineError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One bar per minute from 2024-01-01 00:00.
pub fn make_bar(minute: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: start() + Duration::minutes(minute as i64),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

pub fn bars_from_rows(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| make_bar(i, o, h, l, c))
        .collect()
}

/// Close-only bars with a small symmetric range around the close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c * 1.001, c * 0.999, c))
        .collect()
}

/// A deterministic oscillating series with drift, long enough for every
/// indicator family at typical windows.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = start_price + 6.0 * (x * 0.21).sin() + 2.0 * (x * 0.05).cos() + x * 0.02;
            let open = close - 0.4 * (x * 0.7).sin();
            let high = open.max(close) + 0.5 + 0.3 * (x * 1.3).cos().abs();
            let low = open.min(close) - 0.5 - 0.3 * (x * 0.9).sin().abs();
            let volume = 1000.0 + 400.0 * (x * 0.37).sin().abs() + if i % 17 == 0 { 1500.0 } else { 0.0 };
            Bar {
                timestamp: start() + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

pub fn zero_cost_risk(stop_loss: f64, take_profit: f64) -> RiskConfig {
    RiskConfig {
        mode: StopMode::FixedPercentage,
        stop_loss,
        take_profit,
        spread_pct: 0.0,
        slippage_pct: 0.0,
    }
}

pub fn sample_backtest_config() -> BacktestConfig {
    BacktestConfig {
        ticker: "TEST".into(),
        interval_tested: "1m".into(),
        ..BacktestConfig::default()
    }
}

pub fn run_config(indicators: IndicatorParams, strategy: StrategyConfig, risk: RiskConfig) -> RunConfig {
    RunConfig {
        backtest: sample_backtest_config(),
        indicators,
        strategy,
        risk,
        sizing: PositionSizingConfig::default(),
    }
}

pub fn slots(long_entry: &[&str], short_entry: &[&str], long_exit: &[&str], short_exit: &[&str]) -> StrategyConfig {
    let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
    StrategyConfig {
        long_entry: owned(long_entry),
        short_entry: owned(short_entry),
        long_exit: owned(long_exit),
        short_exit: owned(short_exit),
    }
}

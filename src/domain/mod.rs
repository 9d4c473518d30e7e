//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod expression;
pub mod strategy;
pub mod signal_eval;
pub mod position;
pub mod risk;
pub mod sizing;
pub mod simulator;
pub mod metrics;
pub mod report;
pub mod backtest;
pub mod sweep;
pub mod config_validation;
pub mod error;

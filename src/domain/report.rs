//! The backtest report record.
//!
//! Monetary and percentage values are rounded to 2 decimals, the Sharpe
//! ratio to 4. An infinite profit factor serializes as `"inf"`.

use serde::{Deserialize, Serialize};

use super::backtest::BacktestConfig;
use super::indicator::params::IndicatorConfiguration;
use super::metrics::Metrics;
use super::ohlcv::Bar;
use super::simulator::SignalTally;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub ticker: String,
    pub period_tested: String,
    pub interval_tested: String,
    pub leverage_applied: f64,
    pub total_data_points: usize,
    pub total_signals_non_hold: usize,
    pub num_buy_signals: usize,
    pub num_sell_signals: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub net_profit: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub win_rate_pct: f64,
    pub avg_profit_per_winning_trade: f64,
    pub avg_loss_per_losing_trade: f64,
    #[serde(with = "profit_factor_format")]
    pub profit_factor: f64,
    pub avg_pnl_per_trade: f64,
    pub max_drawdown_value: f64,
    pub max_drawdown_percentage: f64,
    pub sharpe_ratio_simplified_per_trade: f64,
    pub indicator_configurations: Vec<IndicatorConfiguration>,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// `"<first> to <last>"` over the bar timestamps, empty for no bars.
pub fn period_label(bars: &[Bar]) -> String {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.timestamp.format(TIMESTAMP_FORMAT),
            last.timestamp.format(TIMESTAMP_FORMAT)
        ),
        _ => String::new(),
    }
}

impl Report {
    pub fn build(
        config: &BacktestConfig,
        bars: &[Bar],
        signals: SignalTally,
        metrics: &Metrics,
        indicator_configurations: Vec<IndicatorConfiguration>,
    ) -> Self {
        let gross_profit = round2(metrics.gross_profit);
        let gross_loss = round2(metrics.gross_loss);

        Report {
            ticker: config.ticker.clone(),
            period_tested: config
                .period_tested
                .clone()
                .unwrap_or_else(|| period_label(bars)),
            interval_tested: config.interval_tested.clone(),
            leverage_applied: config.leverage,
            total_data_points: bars.len(),
            total_signals_non_hold: signals.non_hold(),
            num_buy_signals: signals.buy,
            num_sell_signals: signals.sell,
            total_trades: metrics.total_trades,
            winning_trades: metrics.winning_trades,
            losing_trades: metrics.losing_trades,
            // Derived from the rounded components so the identity survives rounding.
            net_profit: round2(gross_profit - gross_loss),
            gross_profit,
            gross_loss,
            win_rate_pct: round2(metrics.win_rate_pct),
            avg_profit_per_winning_trade: round2(metrics.avg_profit_per_winning_trade),
            avg_loss_per_losing_trade: round2(metrics.avg_loss_per_losing_trade),
            profit_factor: round2(metrics.profit_factor),
            avg_pnl_per_trade: round2(metrics.avg_pnl_per_trade),
            max_drawdown_value: round2(metrics.max_drawdown_value),
            max_drawdown_percentage: round2(metrics.max_drawdown_percentage),
            sharpe_ratio_simplified_per_trade: round_to(metrics.sharpe_ratio, 4),
            indicator_configurations,
        }
    }
}

mod profit_factor_format {
    use serde::{Deserialize, Deserializer, Serializer};

    const INFINITE: &str = "inf";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITE)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) if s == INFINITE => Ok(f64::INFINITY),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid profit factor '{s}'"
            ))),
        }
    }
}

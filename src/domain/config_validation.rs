//! Configuration validation.
//!
//! Validates every typed config value before a backtest runs. Errors name
//! the INI section and key the value is read from.

use chrono::Duration;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::risk::{RiskConfig, StopMode};
use crate::domain::sizing::PositionSizingConfig;

pub fn validate_all(
    indicators: &IndicatorParams,
    risk: &RiskConfig,
    sizing: &PositionSizingConfig,
    backtest: &BacktestConfig,
) -> Result<(), EngineError> {
    validate_backtest_config(backtest)?;
    validate_indicator_params(indicators)?;
    validate_risk_config(risk, indicators)?;
    validate_sizing_config(sizing)?;
    Ok(())
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), EngineError> {
    positive("backtest", "initial_capital", config.initial_capital)?;
    positive("backtest", "leverage", config.leverage)?;
    Ok(())
}

pub fn validate_indicator_params(params: &IndicatorParams) -> Result<(), EngineError> {
    if let Some(p) = params.sma {
        validate_pair("sma_fast", "sma_slow", p.fast, p.slow)?;
    }
    if let Some(p) = params.ema {
        validate_pair("ema_fast", "ema_slow", p.fast, p.slow)?;
    }
    if let Some(p) = params.bollinger {
        window("bb_period", p.period)?;
        positive("indicators", "bb_std_dev", p.std_dev)?;
    }
    if let Some(period) = params.atr_period {
        window("atr_period", period)?;
    }
    if let Some(p) = params.rsi {
        window("rsi_period", p.period)?;
        percent("rsi_overbought", p.overbought)?;
        percent("rsi_oversold", p.oversold)?;
        if p.oversold >= p.overbought {
            return Err(EngineError::invalid(
                "indicators",
                "rsi_oversold",
                "rsi_oversold must be below rsi_overbought",
            ));
        }
    }
    if let Some(p) = params.macd {
        validate_pair("macd_fast", "macd_slow", p.fast, p.slow)?;
        window("macd_signal", p.signal)?;
    }
    if let Some(w) = params.breakout_window {
        window("breakout_window", w)?;
    }
    if let Some(p) = params.volume_spike {
        window("volume_spike_window", p.window)?;
        positive("indicators", "volume_spike_multiplier", p.multiplier)?;
    }
    Ok(())
}

pub fn validate_risk_config(risk: &RiskConfig, indicators: &IndicatorParams) -> Result<(), EngineError> {
    non_negative("risk", "stop_loss", risk.stop_loss)?;
    non_negative("risk", "take_profit", risk.take_profit)?;
    non_negative("risk", "spread_pct", risk.spread_pct)?;
    non_negative("risk", "slippage_pct", risk.slippage_pct)?;
    if risk.mode == StopMode::AtrMultiple && indicators.atr_period.is_none() {
        return Err(EngineError::invalid(
            "risk",
            "mode",
            "atr_multiple mode requires [indicators] atr_period",
        ));
    }
    Ok(())
}

pub fn validate_sizing_config(sizing: &PositionSizingConfig) -> Result<(), EngineError> {
    non_negative("sizing", "volatility_threshold", sizing.volatility_threshold)?;
    fraction("high_vol_fraction", sizing.high_vol_fraction)?;
    fraction("low_vol_base_fraction", sizing.low_vol_base_fraction)?;
    if sizing.volatility_lookback_minutes <= 0 {
        return Err(EngineError::invalid(
            "sizing",
            "volatility_lookback_minutes",
            "volatility_lookback_minutes must be positive",
        ));
    }
    if Duration::try_minutes(sizing.volatility_lookback_minutes).is_none() {
        return Err(EngineError::invalid(
            "sizing",
            "volatility_lookback_minutes",
            format!(
                "volatility_lookback_minutes must be at most {}",
                Duration::MAX.num_minutes()
            ),
        ));
    }
    Ok(())
}

fn validate_pair(fast_key: &str, slow_key: &str, fast: usize, slow: usize) -> Result<(), EngineError> {
    window(fast_key, fast)?;
    window(slow_key, slow)?;
    if fast >= slow {
        return Err(EngineError::invalid(
            "indicators",
            fast_key,
            format!("{fast_key} must be less than {slow_key}"),
        ));
    }
    Ok(())
}

fn window(key: &str, value: usize) -> Result<(), EngineError> {
    if value == 0 {
        return Err(EngineError::invalid("indicators", key, format!("{key} must be positive")));
    }
    Ok(())
}

fn positive(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(EngineError::invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(EngineError::invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(())
}

fn percent(key: &str, value: f64) -> Result<(), EngineError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::invalid(
            "indicators",
            key,
            format!("{key} must be between 0 and 100"),
        ));
    }
    Ok(())
}

fn fraction(key: &str, value: f64) -> Result<(), EngineError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::invalid(
            "sizing",
            key,
            format!("{key} must be between 0 and 1"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::params::{
        BollingerParams, MacdParams, MovingAveragePair, RsiParams, VolumeSpikeParams,
    };

    fn full_params() -> IndicatorParams {
        IndicatorParams {
            sma: Some(MovingAveragePair { fast: 5, slow: 20 }),
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

    fn assert_invalid(result: Result<(), EngineError>, expected_key: &str) {
        match result {
            Err(EngineError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_configs_pass() {
        let params = full_params();
        assert!(validate_all(
            &params,
            &RiskConfig::default(),
            &PositionSizingConfig::default(),
            &BacktestConfig::default()
        )
        .is_ok());
    }

    #[test]
    fn empty_indicator_params_pass() {
        assert!(validate_indicator_params(&IndicatorParams::default()).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = BacktestConfig {
            initial_capital: 0.0,
            ..BacktestConfig::default()
        };
        assert_invalid(validate_backtest_config(&config), "initial_capital");
    }

    #[test]
    fn leverage_must_be_positive() {
        let config = BacktestConfig {
            leverage: -2.0,
            ..BacktestConfig::default()
        };
        assert_invalid(validate_backtest_config(&config), "leverage");
    }

    #[test]
    fn zero_window_fails() {
        let params = IndicatorParams {
            breakout_window: Some(0),
            ..full_params()
        };
        assert_invalid(validate_indicator_params(&params), "breakout_window");
    }

    #[test]
    fn fast_must_be_below_slow() {
        let params = IndicatorParams {
            ema: Some(MovingAveragePair { fast: 21, slow: 9 }),
            ..full_params()
        };
        assert_invalid(validate_indicator_params(&params), "ema_fast");
    }

    #[test]
    fn rsi_thresholds_checked() {
        let params = IndicatorParams {
            rsi: Some(RsiParams {
                period: 14,
                overbought: 30.0,
                oversold: 70.0,
            }),
            ..full_params()
        };
        assert_invalid(validate_indicator_params(&params), "rsi_oversold");

        let params = IndicatorParams {
            rsi: Some(RsiParams {
                period: 14,
                overbought: 170.0,
                oversold: 30.0,
            }),
            ..full_params()
        };
        assert_invalid(validate_indicator_params(&params), "rsi_overbought");
    }

    #[test]
    fn negative_stop_loss_fails() {
        let risk = RiskConfig {
            stop_loss: -0.01,
            ..RiskConfig::default()
        };
        assert_invalid(validate_risk_config(&risk, &full_params()), "stop_loss");
    }

    #[test]
    fn atr_mode_requires_atr_period() {
        let risk = RiskConfig {
            mode: StopMode::AtrMultiple,
            ..RiskConfig::default()
        };
        let params = IndicatorParams {
            atr_period: None,
            ..full_params()
        };
        assert_invalid(validate_risk_config(&risk, &params), "mode");
        assert!(validate_risk_config(&risk, &full_params()).is_ok());
    }

    #[test]
    fn sizing_fraction_above_one_fails() {
        let sizing = PositionSizingConfig {
            high_vol_fraction: 1.5,
            ..PositionSizingConfig::default()
        };
        assert_invalid(validate_sizing_config(&sizing), "high_vol_fraction");
    }

    #[test]
    fn sizing_lookback_must_be_positive() {
        let sizing = PositionSizingConfig {
            volatility_lookback_minutes: 0,
            ..PositionSizingConfig::default()
        };
        assert_invalid(validate_sizing_config(&sizing), "volatility_lookback_minutes");
    }

    #[test]
    fn sizing_lookback_bounded_by_duration_range() {
        let too_long = PositionSizingConfig {
            volatility_lookback_minutes: i64::MAX,
            ..PositionSizingConfig::default()
        };
        assert_invalid(validate_sizing_config(&too_long), "volatility_lookback_minutes");

        let longest = PositionSizingConfig {
            volatility_lookback_minutes: Duration::MAX.num_minutes(),
            ..PositionSizingConfig::default()
        };
        assert!(validate_sizing_config(&longest).is_ok());
    }
}

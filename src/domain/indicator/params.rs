//! Indicator parameter sets for one run.
//!
//! Every indicator family is optional. A family that is `None` is not
//! computed, and any signal expression that needs it is rejected when the
//! strategy is compiled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::indicator::{IndicatorType, Multiplier};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePair {
    pub fast: usize,
    pub slow: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub period: usize,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpikeParams {
    pub window: usize,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma: Option<MovingAveragePair>,
    pub ema: Option<MovingAveragePair>,
    pub bollinger: Option<BollingerParams>,
    pub atr_period: Option<usize>,
    pub rsi: Option<RsiParams>,
    pub macd: Option<MacdParams>,
    pub breakout_window: Option<usize>,
    pub volume_spike: Option<VolumeSpikeParams>,
}

/// One entry of the report's `indicator_configurations` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfiguration {
    pub name: String,
    pub params: BTreeMap<String, f64>,
}

impl IndicatorConfiguration {
    fn new(name: &str, params: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

impl IndicatorParams {
    pub fn sma_types(&self) -> Option<(IndicatorType, IndicatorType)> {
        self.sma
            .map(|p| (IndicatorType::Sma(p.fast), IndicatorType::Sma(p.slow)))
    }

    pub fn ema_types(&self) -> Option<(IndicatorType, IndicatorType)> {
        self.ema
            .map(|p| (IndicatorType::Ema(p.fast), IndicatorType::Ema(p.slow)))
    }

    pub fn bollinger_type(&self) -> Option<IndicatorType> {
        self.bollinger.map(|p| IndicatorType::Bollinger {
            period: p.period,
            stddev_mult: Multiplier::new(p.std_dev),
        })
    }

    pub fn atr_type(&self) -> Option<IndicatorType> {
        self.atr_period.map(IndicatorType::Atr)
    }

    pub fn rsi_type(&self) -> Option<IndicatorType> {
        self.rsi.map(|p| IndicatorType::Rsi(p.period))
    }

    pub fn macd_type(&self) -> Option<IndicatorType> {
        self.macd.map(|p| IndicatorType::Macd {
            fast: p.fast,
            slow: p.slow,
            signal: p.signal,
        })
    }

    pub fn channel_type(&self) -> Option<IndicatorType> {
        self.breakout_window.map(IndicatorType::Channel)
    }

    pub fn volume_spike_type(&self) -> Option<IndicatorType> {
        self.volume_spike.map(|p| IndicatorType::VolumeSpike {
            window: p.window,
            mult: Multiplier::new(p.multiplier),
        })
    }

    /// Every indicator series this parameter set describes.
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        let mut types = Vec::new();
        if let Some((fast, slow)) = self.sma_types() {
            types.extend([fast, slow]);
        }
        if let Some((fast, slow)) = self.ema_types() {
            types.extend([fast, slow]);
        }
        types.extend(self.bollinger_type());
        types.extend(self.atr_type());
        types.extend(self.rsi_type());
        types.extend(self.macd_type());
        types.extend(self.channel_type());
        types.extend(self.volume_spike_type());
        types
    }

    /// `{name, params}` records describing every configured indicator.
    pub fn configurations(&self) -> Vec<IndicatorConfiguration> {
        let mut out = Vec::new();
        if let Some(p) = self.sma {
            out.push(IndicatorConfiguration::new(
                "sma",
                &[("fast", p.fast as f64), ("slow", p.slow as f64)],
            ));
        }
        if let Some(p) = self.ema {
            out.push(IndicatorConfiguration::new(
                "ema",
                &[("fast", p.fast as f64), ("slow", p.slow as f64)],
            ));
        }
        if let Some(p) = self.bollinger {
            out.push(IndicatorConfiguration::new(
                "bollinger",
                &[("period", p.period as f64), ("std_dev", p.std_dev)],
            ));
        }
        if let Some(p) = self.atr_period {
            out.push(IndicatorConfiguration::new("atr", &[("period", p as f64)]));
        }
        if let Some(p) = self.rsi {
            out.push(IndicatorConfiguration::new(
                "rsi",
                &[
                    ("period", p.period as f64),
                    ("overbought", p.overbought),
                    ("oversold", p.oversold),
                ],
            ));
        }
        if let Some(p) = self.macd {
            out.push(IndicatorConfiguration::new(
                "macd",
                &[
                    ("fast", p.fast as f64),
                    ("slow", p.slow as f64),
                    ("signal", p.signal as f64),
                ],
            ));
        }
        if let Some(w) = self.breakout_window {
            out.push(IndicatorConfiguration::new("breakout", &[("window", w as f64)]));
        }
        if let Some(p) = self.volume_spike {
            out.push(IndicatorConfiguration::new(
                "volume_spike",
                &[("window", p.window as f64), ("multiplier", p.multiplier)],
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_params() -> IndicatorParams {
        IndicatorParams {
            atr_period: Some(14),
            bollinger: Some(BollingerParams {
                period: 15,
                std_dev: 1.5,
            }),
            breakout_window: Some(20),
            macd: Some(MacdParams {
                fast: 8,
                slow: 21,
                signal: 5,
            }),
            rsi: Some(RsiParams {
                period: 20,
                overbought: 70.0,
                oversold: 35.0,
            }),
            volume_spike: Some(VolumeSpikeParams {
                window: 30,
                multiplier: 1.3,
            }),
            ..IndicatorParams::default()
        }
    }

    #[test]
    fn distinct_multipliers_key_distinct_series() {
        let with_mult = |std_dev: f64, multiplier: f64| IndicatorParams {
            bollinger: Some(BollingerParams { period: 3, std_dev }),
            volume_spike: Some(VolumeSpikeParams { window: 3, multiplier }),
            ..IndicatorParams::default()
        };
        let a = with_mult(1.234, 1.234);
        let b = with_mult(1.226, 1.226);

        assert_ne!(a.bollinger_type(), b.bollinger_type());
        assert_ne!(a.volume_spike_type(), b.volume_spike_type());

        let small = with_mult(0.004, 0.004);
        match small.bollinger_type() {
            Some(IndicatorType::Bollinger { stddev_mult, .. }) => {
                assert_eq!(stddev_mult.value(), 0.004)
            }
            other => panic!("Expected Bollinger type, got {other:?}"),
        }
        assert_eq!(small.configurations()[0].params["std_dev"], 0.004);
    }

    #[test]
    fn default_configures_nothing() {
        let params = IndicatorParams::default();
        assert!(params.indicator_types().is_empty());
        assert!(params.configurations().is_empty());
    }

    #[test]
    fn indicator_types_cover_configured_families() {
        let types = fixture_params().indicator_types();
        assert_eq!(types.len(), 6);
        assert!(types.contains(&IndicatorType::Atr(14)));
        assert!(types.contains(&IndicatorType::Bollinger {
            period: 15,
            stddev_mult: Multiplier::new(1.5)
        }));
        assert!(types.contains(&IndicatorType::VolumeSpike {
            window: 30,
            mult: Multiplier::new(1.3)
        }));
    }

    #[test]
    fn moving_average_pair_yields_two_series() {
        let params = IndicatorParams {
            sma: Some(MovingAveragePair { fast: 5, slow: 20 }),
            ..IndicatorParams::default()
        };
        assert_eq!(
            params.indicator_types(),
            vec![IndicatorType::Sma(5), IndicatorType::Sma(20)]
        );
    }

    #[test]
    fn configurations_list_names_and_params() {
        let configs = fixture_params().configurations();
        let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["bollinger", "atr", "rsi", "macd", "breakout", "volume_spike"]
        );
        let rsi = &configs[2];
        assert_eq!(rsi.params["period"], 20.0);
        assert_eq!(rsi.params["oversold"], 35.0);
    }
}

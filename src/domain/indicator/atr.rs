//! Average True Range indicator.
//!
//! TR[0] = high - low; TR[i] = true range against the previous close.
//! Seed: mean of TR[0..period] at index period-1, then Wilder smoothing
//! ATR[i] = (ATR[i-1] * (period-1) + TR[i]) / period.

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: undefined_points(bars),
        };
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let value = if i + 1 < period {
            None
        } else if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
            Some(IndicatorValue::Simple(atr))
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            Some(IndicatorValue::Simple(atr))
        };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_of(&closes, period);

    let values = if raw.is_empty() {
        undefined_points(bars)
    } else {
        bars.iter()
            .zip(raw)
            .map(|(bar, v)| IndicatorPoint {
                timestamp: bar.timestamp,
                value: v.map(IndicatorValue::Simple),
            })
            .collect()
    };

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary sequence, seeded by the SMA of the first `period`
/// inputs. Returns an empty vec for `period == 0`.
pub(crate) fn ema_of(inputs: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(inputs.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in inputs.iter().enumerate() {
        if i < period - 1 {
            sum += x;
            out.push(None);
        } else if i == period - 1 {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = x * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

//! Breakout (high/low) channel.
//!
//! Upper = highest high of the previous `window` bars, lower = lowest low of
//! the previous `window` bars. The current bar is excluded so that a close
//! above the upper line is a genuine breakout.
//! Warmup: first `window` bars are undefined.

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_channel(bars: &[Bar], window: usize) -> IndicatorSeries {
    if window == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Channel(window),
            values: undefined_points(bars),
        };
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (i >= window).then(|| {
                let prior = &bars[i - window..i];
                let upper = prior.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
                let lower = prior.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
                IndicatorValue::Channel { upper, lower }
            });
            IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Channel(window),
        values,
    }
}

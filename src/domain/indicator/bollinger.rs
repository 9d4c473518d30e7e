//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::stddev::{mean, population_stddev};
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, Multiplier,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, mult: f64) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    for (i, bar) in bars.iter().enumerate() {
        let value = if period > 0 && i + 1 >= period {
            let window = &closes[i + 1 - period..=i];
            let middle = mean(window);
            let stddev = population_stddev(window);
            Some(IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            })
        } else {
            None
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult: Multiplier::new(mult),
        },
        values,
    }
}

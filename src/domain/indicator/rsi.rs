//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n bars
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes to compute initial average).

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() <= period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: undefined_points(bars),
        };
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint {
        timestamp: bars[0].timestamp,
        value: None,
    });

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change_idx = i - 1;

        let value = if change_idx + 1 < period {
            None
        } else {
            if change_idx + 1 == period {
                avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
                avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
            } else {
                avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
                avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
            }
            Some(IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)))
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

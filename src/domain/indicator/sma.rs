//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: undefined_points(bars),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        let value = if i + 1 >= period {
            Some(IndicatorValue::Simple(sum / period as f64))
        } else {
            None
        };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma(&bars, 3);

        assert!(series.values[0].value.is_none());
        assert!(series.values[1].value.is_none());
        assert!(series.values[2].value.is_some());
        assert!(series.values[3].value.is_some());
    }

    #[test]
    fn sma_rolling_mean() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert!((series.simple(2).unwrap() - 20.0).abs() < 1e-12);
        assert!((series.simple(3).unwrap() - 30.0).abs() < 1e-12);
        assert!((series.simple(4).unwrap() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_1_is_close() {
        let bars = make_bars(&[7.0, 8.0]);
        let series = calculate_sma(&bars, 1);
        assert_eq!(series.simple(0), Some(7.0));
        assert_eq!(series.simple(1), Some(8.0));
    }

    #[test]
    fn sma_period_0_all_undefined() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_sma(&bars, 0);
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.defined_count(), 0);
    }

    #[test]
    fn sma_fewer_bars_than_period() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_sma(&bars, 5);
        assert_eq!(series.defined_count(), 0);
        assert_eq!(series.indicator_type, IndicatorType::Sma(5));
    }
}

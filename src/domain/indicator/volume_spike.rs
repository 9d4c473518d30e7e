//! Volume spike detector.
//!
//! average = mean volume of the previous `window` bars,
//! threshold = multiplier × average. A bar spikes when its volume exceeds
//! the threshold.
//! Warmup: first `window` bars are undefined.

use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, Multiplier,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_volume_spike(bars: &[Bar], window: usize, mult: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::VolumeSpike {
        window,
        mult: Multiplier::new(mult),
    };
    if window == 0 {
        return IndicatorSeries {
            indicator_type,
            values: undefined_points(bars),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let value = if i >= window {
            let average = sum / window as f64;
            Some(IndicatorValue::Volume {
                average,
                threshold: average * mult,
            })
        } else {
            None
        };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });

        sum += bar.volume;
        if i >= window {
            sum -= bars[i - window].volume;
        }
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    fn with_volumes(volumes: &[f64]) -> Vec<Bar> {
        let mut bars = make_bars(&vec![100.0; volumes.len()]);
        for (bar, &v) in bars.iter_mut().zip(volumes) {
            bar.volume = v;
        }
        bars
    }

    #[test]
    fn volume_average_of_previous_bars() {
        let bars = with_volumes(&[100.0, 200.0, 300.0, 5000.0]);
        let series = calculate_volume_spike(&bars, 3, 1.3);

        assert!(series.values[2].value.is_none());
        match series.get(3) {
            Some(IndicatorValue::Volume { average, threshold }) => {
                assert!((average - 200.0).abs() < 1e-12);
                assert!((threshold - 260.0).abs() < 1e-9);
            }
            other => panic!("Expected Volume value, got {other:?}"),
        }
    }

    #[test]
    fn volume_window_rolls() {
        let bars = with_volumes(&[900.0, 100.0, 100.0, 100.0]);
        let series = calculate_volume_spike(&bars, 2, 1.0);
        match series.get(3) {
            Some(IndicatorValue::Volume { average, .. }) => {
                assert!((average - 100.0).abs() < 1e-12)
            }
            other => panic!("Expected Volume value, got {other:?}"),
        }
    }

    #[test]
    fn volume_zero_window_undefined() {
        let bars = with_volumes(&[1.0, 2.0]);
        let series = calculate_volume_spike(&bars, 0, 1.3);
        assert_eq!(series.defined_count(), 0);
    }
}

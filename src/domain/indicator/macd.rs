//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded by the SMA of its first
//! `signal` defined values
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: max(fast, slow) - 1 + signal - 1 bars.

use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{
    undefined_points, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_macd(bars: &[Bar], fast: usize, slow: usize, signal_period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: undefined_points(bars),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_of(&closes, fast);
    let ema_slow = ema_of(&closes, slow);

    let line_start = fast.max(slow) - 1;
    let macd_line: Vec<f64> = (line_start..bars.len())
        .filter_map(|i| Some(ema_fast[i]? - ema_slow[i]?))
        .collect();
    let signal_line = ema_of(&macd_line, signal_period);

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let value = i
            .checked_sub(line_start)
            .and_then(|j| Some((macd_line[j], signal_line[j]?)))
            .map(|(line, signal)| IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            });
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

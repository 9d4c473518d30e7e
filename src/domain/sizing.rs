//! Volatility-adaptive position sizing.
//!
//! High trailing volatility commits a fixed large fraction. Below the
//! threshold the base fraction is scaled by how many of the last
//! `performance_window` closed trades were profitable:
//!
//! | wins in window      | multiplier | with defaults |
//! |---------------------|------------|---------------|
//! | all                 | 2.0        | 40%           |
//! | at least two thirds | 1.8        | 36%           |
//! | at least one        | 1.0        | 20%           |
//! | none                | 0.3        | 6%            |
//!
//! Fewer closed trades than the window leaves the base fraction unchanged.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::ohlcv::Bar;
use crate::domain::position::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSizingConfig {
    pub volatility_threshold: f64,
    pub high_vol_fraction: f64,
    pub low_vol_base_fraction: f64,
    pub performance_window: usize,
    pub volatility_lookback_minutes: i64,
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        Self {
            volatility_threshold: 0.20,
            high_vol_fraction: 0.95,
            low_vol_base_fraction: 0.20,
            performance_window: 3,
            volatility_lookback_minutes: 24 * 60,
        }
    }
}

impl PositionSizingConfig {
    /// Saturates at `Duration::MAX` for minute counts chrono cannot hold.
    pub fn lookback(&self) -> Duration {
        Duration::try_minutes(self.volatility_lookback_minutes).unwrap_or(Duration::MAX)
    }
}

/// (max high - min low) / min low over the bars no older than `lookback`
/// before bar `index`, inclusive of `index`. A lookback reaching past the
/// earliest representable timestamp covers every bar up to `index`.
pub fn trailing_volatility(bars: &[Bar], index: usize, lookback: Duration) -> f64 {
    let Some(current) = bars.get(index) else {
        return 0.0;
    };
    let cutoff = current.timestamp.checked_sub_signed(lookback);

    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    for bar in bars[..=index].iter().rev() {
        if cutoff.is_some_and(|cutoff| bar.timestamp < cutoff) {
            break;
        }
        high = high.max(bar.high);
        low = low.min(bar.low);
    }

    if low <= 0.0 || !low.is_finite() {
        return 0.0;
    }
    (high - low) / low
}

pub fn performance_multiplier(trades: &[Trade], window: usize) -> f64 {
    if window == 0 || trades.len() < window {
        return 1.0;
    }
    let recent = &trades[trades.len() - window..];
    let wins = recent.iter().filter(|t| t.is_win()).count();

    if wins == window {
        2.0
    } else if wins * 3 >= window * 2 {
        1.8
    } else if wins > 0 {
        1.0
    } else {
        0.3
    }
}

pub fn size_fraction(trailing_volatility: f64, recent_trades: &[Trade], config: &PositionSizingConfig) -> f64 {
    let fraction = if trailing_volatility >= config.volatility_threshold {
        config.high_vol_fraction
    } else {
        config.low_vol_base_fraction * performance_multiplier(recent_trades, config.performance_window)
    };
    fraction.clamp(0.0, 1.0)
}

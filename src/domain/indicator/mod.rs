//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as map key)
//! - `IndicatorSeries`: A time series of indicator values aligned with the bars
//!
//! A point carries `None` until the indicator's warm-up is complete. Undefined
//! values are never represented as zero.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod macd;
pub mod params;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volume_spike;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use channel::calculate_channel;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use params::IndicatorParams;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume_spike::calculate_volume_spike;

use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Channel {
        upper: f64,
        lower: f64,
    },
    Volume {
        average: f64,
        threshold: f64,
    },
}

/// Indicator identity plus parameters.
///
/// Ordered so that an [`IndicatorSet`] iterates deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Bollinger {
        period: usize,
        stddev_mult: Multiplier,
    },
    Atr(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Channel(usize),
    VolumeSpike {
        window: usize,
        mult: Multiplier,
    },
}

impl IndicatorType {
    /// Index of the first bar with a defined value.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(p)
            | IndicatorType::Ema(p)
            | IndicatorType::Atr(p)
            | IndicatorType::Bollinger { period: p, .. } => p.saturating_sub(1),
            IndicatorType::Rsi(p) => p,
            IndicatorType::Macd { fast, slow, signal } => {
                (fast.max(slow) + signal).saturating_sub(2)
            }
            IndicatorType::Channel(w) | IndicatorType::VolumeSpike { window: w, .. } => w,
        }
    }

    /// Number of bars of history the indicator consumes. Never smaller than
    /// [`IndicatorType::warmup`].
    pub fn window(&self) -> usize {
        match *self {
            IndicatorType::Sma(p)
            | IndicatorType::Ema(p)
            | IndicatorType::Atr(p)
            | IndicatorType::Rsi(p)
            | IndicatorType::Bollinger { period: p, .. } => p,
            IndicatorType::Macd { fast, slow, signal } => {
                (fast.max(slow) + signal).saturating_sub(1)
            }
            IndicatorType::Channel(w) | IndicatorType::VolumeSpike { window: w, .. } => w,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index`, or `None` when out of range or still warming up.
    pub fn get(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn simple(&self, index: usize) -> Option<f64> {
        match self.get(index) {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }
}

/// All indicator series computed for one run.
pub type IndicatorSet = BTreeMap<IndicatorType, IndicatorSeries>;

/// A band or threshold multiplier as configured. Equality, ordering and
/// hashing use the exact bit pattern, so two multipliers that differ in any
/// digit key different series.
#[derive(Debug, Clone, Copy)]
pub struct Multiplier(f64);

impl Multiplier {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Multiplier {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Multiplier {}

impl PartialOrd for Multiplier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Multiplier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Multiplier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn calculate(bars: &[Bar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(p) => calculate_sma(bars, p),
        IndicatorType::Ema(p) => calculate_ema(bars, p),
        IndicatorType::Bollinger {
            period,
            stddev_mult,
        } => calculate_bollinger(bars, period, stddev_mult.value()),
        IndicatorType::Atr(p) => calculate_atr(bars, p),
        IndicatorType::Rsi(p) => calculate_rsi(bars, p),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        IndicatorType::Channel(w) => calculate_channel(bars, w),
        IndicatorType::VolumeSpike { window, mult } => {
            calculate_volume_spike(bars, window, mult.value())
        }
    }
}

pub fn compute_indicators<I>(bars: &[Bar], types: I) -> IndicatorSet
where
    I: IntoIterator<Item = IndicatorType>,
{
    let mut set = IndicatorSet::new();
    for t in types {
        set.entry(t).or_insert_with(|| calculate(bars, t));
    }
    set
}

/// Series of `None` points aligned with `bars`.
pub(crate) fn undefined_points(bars: &[Bar]) -> Vec<IndicatorPoint> {
    bars.iter()
        .map(|b| IndicatorPoint {
            timestamp: b.timestamp,
            value: None,
        })
        .collect()
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult,
            } => write!(f, "BOLLINGER({},{})", period, stddev_mult),
            IndicatorType::Channel(window) => write!(f, "CHANNEL({})", window),
            IndicatorType::VolumeSpike { window, mult } => {
                write!(f, "VOLUME_SPIKE({},{})", window, mult)
            }
        }
    }
}

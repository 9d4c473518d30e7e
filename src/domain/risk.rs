//! Execution costs and protective levels.
//!
//! Spread and slippage are fractions of price (`0.01` is 1%). A buy fills
//! above the quote by half the spread plus slippage; a sell fills below by
//! the same amount.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    FixedPercentage,
    AtrMultiple,
}

impl FromStr for StopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed_percentage" => Ok(StopMode::FixedPercentage),
            "atr_multiple" => Ok(StopMode::AtrMultiple),
            other => Err(format!(
                "unknown mode '{other}' (expected fixed_percentage or atr_multiple)"
            )),
        }
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopMode::FixedPercentage => f.write_str("fixed_percentage"),
            StopMode::AtrMultiple => f.write_str("atr_multiple"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub mode: StopMode,
    /// Fraction of entry price, or ATR multiple. Zero disables the stop.
    pub stop_loss: f64,
    /// Fraction of entry price, or ATR multiple. Zero disables the target.
    pub take_profit: f64,
    pub spread_pct: f64,
    pub slippage_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            mode: StopMode::FixedPercentage,
            stop_loss: 0.01,
            take_profit: 0.015,
            spread_pct: 0.01,
            slippage_pct: 0.0005,
        }
    }
}

/// Stop and target prices for a new position. `None` means disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub stop: Option<f64>,
    pub target: Option<f64>,
}

impl RiskConfig {
    fn cost(&self) -> f64 {
        self.spread_pct / 2.0 + self.slippage_pct
    }

    pub fn buy_fill(&self, quote: f64) -> f64 {
        quote * (1.0 + self.cost())
    }

    pub fn sell_fill(&self, quote: f64) -> f64 {
        quote * (1.0 - self.cost())
    }

    /// Fill price when opening a position in `direction`.
    pub fn entry_fill(&self, direction: Direction, quote: f64) -> f64 {
        match direction {
            Direction::Long => self.buy_fill(quote),
            Direction::Short => self.sell_fill(quote),
        }
    }

    /// Fill price when closing a position in `direction`.
    pub fn exit_fill(&self, direction: Direction, quote: f64) -> f64 {
        match direction {
            Direction::Long => self.sell_fill(quote),
            Direction::Short => self.buy_fill(quote),
        }
    }

    /// Protective levels around `entry_price`. Returns `None` in ATR mode
    /// while the ATR is still undefined, in which case no entry is taken.
    pub fn levels(&self, direction: Direction, entry_price: f64, atr: Option<f64>) -> Option<Levels> {
        let distance = |value: f64| -> Option<Option<f64>> {
            if value == 0.0 {
                return Some(None);
            }
            match self.mode {
                StopMode::FixedPercentage => Some(Some(entry_price * value)),
                StopMode::AtrMultiple => atr.map(|a| Some(a * value)),
            }
        };

        let stop_distance = distance(self.stop_loss)?;
        let target_distance = distance(self.take_profit)?;
        let sign = match direction {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        };

        Some(Levels {
            stop: stop_distance.map(|d| entry_price - sign * d),
            target: target_distance.map(|d| entry_price + sign * d),
        })
    }
}

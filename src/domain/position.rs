//! Position state machine and closed-trade records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    EndOfData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub entry_index: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub size_fraction: f64,
    /// Equity at entry times `size_fraction`.
    pub allocated_capital: f64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Position {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl Position {
    pub fn state(&self) -> PositionState {
        match self {
            Position::Flat => PositionState::Flat,
            Position::Open(p) => match p.direction {
                Direction::Long => PositionState::Long,
                Direction::Short => PositionState::Short,
            },
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}

impl OpenPosition {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    /// Quoted stop fill if the bar's range reached the stop: the stop level,
    /// or the open when the bar gapped through it.
    pub fn stop_fill(&self, bar: &Bar) -> Option<f64> {
        let stop = self.stop_price?;
        if self.is_long() {
            (bar.low <= stop).then(|| bar.open.min(stop))
        } else {
            (bar.high >= stop).then(|| bar.open.max(stop))
        }
    }

    /// Quoted target fill if the bar's range reached the target.
    pub fn target_fill(&self, bar: &Bar) -> Option<f64> {
        let target = self.target_price?;
        if self.is_long() {
            (bar.high >= target).then(|| bar.open.max(target))
        } else {
            (bar.low <= target).then(|| bar.open.min(target))
        }
    }

    /// Stop is checked before target when one bar reaches both.
    pub fn protective_exit(&self, bar: &Bar) -> Option<(ExitReason, f64)> {
        self.stop_fill(bar)
            .map(|q| (ExitReason::StopLoss, q))
            .or_else(|| self.target_fill(bar).map(|q| (ExitReason::TakeProfit, q)))
    }

    /// Fractional return from entry to `exit_price`, positive when profitable.
    pub fn return_at(&self, exit_price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - exit_price) / self.entry_price,
        }
    }

    pub fn close(
        self,
        exit_index: usize,
        exit_timestamp: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
        leverage: f64,
    ) -> Trade {
        let pnl = self.allocated_capital * leverage * self.return_at(exit_price);
        Trade {
            direction: self.direction,
            entry_index: self.entry_index,
            exit_index,
            entry_timestamp: self.entry_timestamp,
            exit_timestamp,
            entry_price: self.entry_price,
            exit_price,
            size_fraction: self.size_fraction,
            pnl,
            exit_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size_fraction: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }
}

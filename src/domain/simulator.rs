//! Bar-by-bar trade simulation.
//!
//! For every bar, in order:
//! 1. an open position is tested against its stop, then its target, using
//!    the bar's low/high
//! 2. a position that survived is tested against its slot's exit signal and
//!    closed at the bar's close
//! 3. when flat and not on the last bar, entry signals are tested; long and
//!    short together cancel out
//!
//! A position still open after the last bar is closed at the final close.

use tracing::{debug, trace, warn};

use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::Bar;
use crate::domain::position::{Direction, ExitReason, OpenPosition, Position, Trade};
use crate::domain::risk::{RiskConfig, StopMode};
use crate::domain::signal_eval::{CompiledStrategy, SignalSet};
use crate::domain::sizing::{size_fraction, trailing_volatility, PositionSizingConfig};

/// Per-bar signal counts over the whole series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalTally {
    pub buy: usize,
    pub sell: usize,
}

impl SignalTally {
    pub fn record(&mut self, signals: &SignalSet) {
        match (signals.long_entry, signals.short_entry) {
            (true, false) => self.buy += 1,
            (false, true) => self.sell += 1,
            _ => {}
        }
    }

    pub fn non_hold(&self) -> usize {
        self.buy + self.sell
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutcome {
    pub trades: Vec<Trade>,
    pub signals: SignalTally,
}

pub struct Simulator<'a> {
    bars: &'a [Bar],
    indicators: &'a IndicatorSet,
    strategy: &'a CompiledStrategy,
    risk: &'a RiskConfig,
    sizing: &'a PositionSizingConfig,
    atr: Option<IndicatorType>,
    initial_capital: f64,
    leverage: f64,
}

impl<'a> Simulator<'a> {
    pub fn new(
        bars: &'a [Bar],
        indicators: &'a IndicatorSet,
        strategy: &'a CompiledStrategy,
        risk: &'a RiskConfig,
        sizing: &'a PositionSizingConfig,
    ) -> Self {
        Self {
            bars,
            indicators,
            strategy,
            risk,
            sizing,
            atr: None,
            initial_capital: 10_000.0,
            leverage: 1.0,
        }
    }

    pub fn with_capital(mut self, initial_capital: f64, leverage: f64) -> Self {
        self.initial_capital = initial_capital;
        self.leverage = leverage;
        self
    }

    /// ATR series used for `atr_multiple` stops.
    pub fn with_atr(mut self, atr: Option<IndicatorType>) -> Self {
        self.atr = atr;
        self
    }

    pub fn run(&self) -> SimulationOutcome {
        let mut outcome = SimulationOutcome::default();
        let mut position = Position::Flat;
        let mut equity = self.initial_capital;
        let last = self.bars.len().saturating_sub(1);

        for (i, bar) in self.bars.iter().enumerate() {
            let signals = self.strategy.evaluate(i, self.bars, self.indicators);
            outcome.signals.record(&signals);
            let before = position.state();

            if let Position::Open(open) = &position {
                let exit = open
                    .protective_exit(bar)
                    .or_else(|| self.signal_exit(open, &signals, bar));
                if let Some((reason, quote)) = exit {
                    if let Position::Open(open) = std::mem::take(&mut position) {
                        let trade = self.close(open, i, bar, quote, reason);
                        equity += trade.pnl;
                        outcome.trades.push(trade);
                    }
                }
            }

            if position.is_flat() && i < last {
                if let Some(open) = self.try_enter(i, bar, &signals, equity, &outcome.trades) {
                    position = Position::Open(open);
                }
            }

            let after = position.state();
            if after != before {
                trace!(index = i, from = ?before, to = ?after, "position state changed");
            }
        }

        if let (Position::Open(open), Some(bar)) = (position, self.bars.last()) {
            let trade = self.close(open, last, bar, bar.close, ExitReason::EndOfData);
            outcome.trades.push(trade);
        }

        outcome
    }

    fn signal_exit(&self, open: &OpenPosition, signals: &SignalSet, bar: &Bar) -> Option<(ExitReason, f64)> {
        let hit = match open.direction {
            Direction::Long => signals.long_exit,
            Direction::Short => signals.short_exit,
        };
        hit.then_some((ExitReason::Signal, bar.close))
    }

    fn close(&self, open: OpenPosition, index: usize, bar: &Bar, quote: f64, reason: ExitReason) -> Trade {
        let fill = self.risk.exit_fill(open.direction, quote);
        let trade = open.close(index, bar.timestamp, fill, reason, self.leverage);
        debug!(
            direction = ?trade.direction,
            entry_index = trade.entry_index,
            exit_index = trade.exit_index,
            exit_price = trade.exit_price,
            pnl = trade.pnl,
            reason = ?trade.exit_reason,
            "position closed"
        );
        trade
    }

    fn try_enter(
        &self,
        index: usize,
        bar: &Bar,
        signals: &SignalSet,
        equity: f64,
        history: &[Trade],
    ) -> Option<OpenPosition> {
        let direction = match (signals.long_entry, signals.short_entry) {
            (true, false) => Direction::Long,
            (false, true) => Direction::Short,
            (true, true) => {
                trace!(index, "long and short entry on the same bar, ignored");
                return None;
            }
            (false, false) => return None,
        };

        if equity <= 0.0 {
            warn!(index, equity, "entry skipped, equity exhausted");
            return None;
        }

        let volatility = trailing_volatility(self.bars, index, self.sizing.lookback());
        let fraction = size_fraction(volatility, history, self.sizing);
        if fraction <= 0.0 {
            debug!(index, "entry skipped, zero size");
            return None;
        }

        let entry_price = self.risk.entry_fill(direction, bar.close);
        let atr = match self.risk.mode {
            StopMode::AtrMultiple => self
                .atr
                .and_then(|t| self.indicators.get(&t))
                .and_then(|s| s.simple(index)),
            StopMode::FixedPercentage => None,
        };
        let Some(levels) = self.risk.levels(direction, entry_price, atr) else {
            warn!(index, "entry skipped, ATR undefined");
            return None;
        };

        debug!(
            ?direction,
            index,
            entry_price,
            fraction,
            volatility,
            "position opened"
        );

        Some(OpenPosition {
            direction,
            entry_index: index,
            entry_timestamp: bar.timestamp,
            entry_price,
            size_fraction: fraction,
            allocated_capital: equity * fraction,
            stop_price: levels.stop,
            target_price: levels.target,
        })
    }
}

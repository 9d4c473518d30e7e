//! Signal evaluation engine.
//!
//! A [`StrategyConfig`] is compiled once against the run's
//! [`IndicatorParams`] into a [`CompiledStrategy`], which then answers the
//! four slot questions for any bar.
//!
//! # Evaluation Semantics
//!
//! - Entry slots: every expression must hold (AND); an empty slot is `false`
//! - Exit slots: any expression may hold (OR); an empty slot is `false`
//! - Composite expressions: any configured member may hold (OR)
//! - Crossovers and middle-band crosses need `index >= 1`
//! - Any undefined indicator value makes its condition `false`
//! - Every slot is `false` below the warm-up gate, the largest window among
//!   the indicators the strategy reads

use std::collections::BTreeSet;

use crate::domain::error::EngineError;
use crate::domain::expression::{Condition, Expression};
use crate::domain::indicator::{IndicatorParams, IndicatorSet, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{Slot, StrategyConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSet {
    pub long_entry: bool,
    pub short_entry: bool,
    pub long_exit: bool,
    pub short_exit: bool,
}

/// One slot entry after name resolution: the OR of `conditions`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub name: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    long_entry: Vec<CompiledExpression>,
    short_entry: Vec<CompiledExpression>,
    long_exit: Vec<CompiledExpression>,
    short_exit: Vec<CompiledExpression>,
    params: IndicatorParams,
    required: BTreeSet<IndicatorType>,
    warmup_gate: usize,
}

impl CompiledStrategy {
    /// Resolve every slot name against the registry. Fails on unknown names
    /// and on expressions whose indicators are not configured.
    pub fn compile(strategy: &StrategyConfig, params: &IndicatorParams) -> Result<Self, EngineError> {
        let mut required = BTreeSet::new();
        let mut slots: Vec<Vec<CompiledExpression>> = Vec::with_capacity(4);

        for slot in Slot::ALL {
            let mut compiled = Vec::new();
            for raw in strategy.slot(slot) {
                let expression = Expression::lookup(raw).ok_or_else(|| {
                    EngineError::UnknownExpression {
                        slot: slot.name().to_string(),
                        name: raw.clone(),
                    }
                })?;
                let conditions = resolve(expression, params)?;
                for condition in &conditions {
                    if let Some(types) = condition.family().indicator_types(params) {
                        required.extend(types);
                    }
                }
                compiled.push(CompiledExpression {
                    name: expression.name().to_string(),
                    conditions,
                });
            }
            slots.push(compiled);
        }

        let warmup_gate = required.iter().map(IndicatorType::window).max().unwrap_or(0);
        let mut slots = slots.into_iter();
        let mut next = || slots.next().unwrap_or_default();

        Ok(Self {
            long_entry: next(),
            short_entry: next(),
            long_exit: next(),
            short_exit: next(),
            params: params.clone(),
            required,
            warmup_gate,
        })
    }

    pub fn required_indicators(&self) -> impl Iterator<Item = IndicatorType> + '_ {
        self.required.iter().copied()
    }

    pub fn warmup_gate(&self) -> usize {
        self.warmup_gate
    }

    pub fn slot(&self, slot: Slot) -> &[CompiledExpression] {
        match slot {
            Slot::LongEntry => &self.long_entry,
            Slot::ShortEntry => &self.short_entry,
            Slot::LongExit => &self.long_exit,
            Slot::ShortExit => &self.short_exit,
        }
    }

    pub fn evaluate(&self, bar_index: usize, bars: &[Bar], indicators: &IndicatorSet) -> SignalSet {
        if bar_index < self.warmup_gate || bar_index >= bars.len() {
            return SignalSet::default();
        }
        let ctx = EvalContext {
            bars,
            indicators,
            params: &self.params,
            index: bar_index,
        };
        SignalSet {
            long_entry: all_hold(&self.long_entry, &ctx),
            short_entry: all_hold(&self.short_entry, &ctx),
            long_exit: any_holds(&self.long_exit, &ctx),
            short_exit: any_holds(&self.short_exit, &ctx),
        }
    }
}

fn resolve(expression: Expression, params: &IndicatorParams) -> Result<Vec<Condition>, EngineError> {
    match expression {
        Expression::Elementary(condition) => {
            let family = condition.family();
            if family.indicator_types(params).is_none() {
                return Err(EngineError::MissingIndicator {
                    expression: condition.name().to_string(),
                    indicator: family.name().to_string(),
                });
            }
            Ok(vec![condition])
        }
        Expression::AnyOf(composite) => {
            let members: Vec<Condition> = composite
                .members()
                .iter()
                .copied()
                .filter(|c| c.family().indicator_types(params).is_some())
                .collect();
            if members.is_empty() {
                let families: Vec<&str> = composite
                    .members()
                    .iter()
                    .map(|c| c.family().name())
                    .collect();
                return Err(EngineError::MissingIndicator {
                    expression: composite.name().to_string(),
                    indicator: families.join("|"),
                });
            }
            Ok(members)
        }
    }
}

fn all_hold(expressions: &[CompiledExpression], ctx: &EvalContext<'_>) -> bool {
    !expressions.is_empty() && expressions.iter().all(|e| expression_holds(e, ctx))
}

fn any_holds(expressions: &[CompiledExpression], ctx: &EvalContext<'_>) -> bool {
    expressions.iter().any(|e| expression_holds(e, ctx))
}

fn expression_holds(expression: &CompiledExpression, ctx: &EvalContext<'_>) -> bool {
    expression.conditions.iter().any(|&c| ctx.holds(c))
}

struct EvalContext<'a> {
    bars: &'a [Bar],
    indicators: &'a IndicatorSet,
    params: &'a IndicatorParams,
    index: usize,
}

impl EvalContext<'_> {
    fn holds(&self, condition: Condition) -> bool {
        self.check(condition).unwrap_or(false)
    }

    /// `None` whenever an input is undefined.
    fn check(&self, condition: Condition) -> Option<bool> {
        let i = self.index;
        let bar = &self.bars[i];
        match condition {
            Condition::SmaCrossover => {
                let (fast, slow) = self.params.sma_types()?;
                self.crosses_above(fast, slow)
            }
            Condition::SmaCrossunder => {
                let (fast, slow) = self.params.sma_types()?;
                self.crosses_above(slow, fast)
            }
            Condition::EmaCrossover => {
                let (fast, slow) = self.params.ema_types()?;
                self.crosses_above(fast, slow)
            }
            Condition::EmaCrossunder => {
                let (fast, slow) = self.params.ema_types()?;
                self.crosses_above(slow, fast)
            }
            Condition::MacdCrossover => {
                let (line_prev, signal_prev) = self.macd(i.checked_sub(1)?)?;
                let (line, signal) = self.macd(i)?;
                Some(line > signal && line_prev <= signal_prev)
            }
            Condition::MacdCrossunder => {
                let (line_prev, signal_prev) = self.macd(i.checked_sub(1)?)?;
                let (line, signal) = self.macd(i)?;
                Some(line < signal && line_prev >= signal_prev)
            }
            Condition::MacdIsBullish => {
                let (line, signal) = self.macd(i)?;
                Some(line > signal)
            }
            Condition::MacdIsBearish => {
                let (line, signal) = self.macd(i)?;
                Some(line < signal)
            }
            Condition::RsiIsOverbought => {
                let (rsi, overbought, _) = self.rsi(i)?;
                Some(rsi > overbought)
            }
            Condition::RsiIsOversold => {
                let (rsi, _, oversold) = self.rsi(i)?;
                Some(rsi < oversold)
            }
            Condition::RsiIsNotOverbought => {
                let (rsi, overbought, _) = self.rsi(i)?;
                Some(rsi < overbought)
            }
            Condition::RsiIsNotOversold => {
                let (rsi, _, oversold) = self.rsi(i)?;
                Some(rsi > oversold)
            }
            Condition::PriceBreaksUpperBand => {
                let (upper, _, _) = self.bands(i)?;
                Some(bar.high > upper)
            }
            Condition::PriceBreaksLowerBand => {
                let (_, _, lower) = self.bands(i)?;
                Some(bar.low < lower)
            }
            Condition::PriceCrossesMiddleBandFromTop => {
                let prev = i.checked_sub(1)?;
                let (_, middle_prev, _) = self.bands(prev)?;
                let (_, middle, _) = self.bands(i)?;
                Some(self.bars[prev].close > middle_prev && bar.close <= middle)
            }
            Condition::PriceCrossesMiddleBandFromBottom => {
                let prev = i.checked_sub(1)?;
                let (_, middle_prev, _) = self.bands(prev)?;
                let (_, middle, _) = self.bands(i)?;
                Some(self.bars[prev].close < middle_prev && bar.close >= middle)
            }
            Condition::PriceBreaksChannelHigh => {
                let (upper, _) = self.channel(i)?;
                Some(bar.close > upper)
            }
            Condition::PriceBreaksChannelLow => {
                let (_, lower) = self.channel(i)?;
                Some(bar.close < lower)
            }
            Condition::VolumeSpike => {
                let t = self.params.volume_spike_type()?;
                match self.indicators.get(&t)?.get(i)? {
                    IndicatorValue::Volume { threshold, .. } => Some(bar.volume > threshold),
                    _ => None,
                }
            }
        }
    }

    fn simple(&self, t: IndicatorType, index: usize) -> Option<f64> {
        self.indicators.get(&t)?.simple(index)
    }

    /// `a` moves from at-or-below `b` to strictly above it on this bar.
    fn crosses_above(&self, a: IndicatorType, b: IndicatorType) -> Option<bool> {
        let prev = self.index.checked_sub(1)?;
        let a_prev = self.simple(a, prev)?;
        let b_prev = self.simple(b, prev)?;
        let a_curr = self.simple(a, self.index)?;
        let b_curr = self.simple(b, self.index)?;
        Some(a_curr > b_curr && a_prev <= b_prev)
    }

    fn macd(&self, index: usize) -> Option<(f64, f64)> {
        let t = self.params.macd_type()?;
        match self.indicators.get(&t)?.get(index)? {
            IndicatorValue::Macd { line, signal, .. } => Some((line, signal)),
            _ => None,
        }
    }

    fn rsi(&self, index: usize) -> Option<(f64, f64, f64)> {
        let p = self.params.rsi?;
        let rsi = self.simple(IndicatorType::Rsi(p.period), index)?;
        Some((rsi, p.overbought, p.oversold))
    }

    fn bands(&self, index: usize) -> Option<(f64, f64, f64)> {
        let t = self.params.bollinger_type()?;
        match self.indicators.get(&t)?.get(index)? {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some((upper, middle, lower)),
            _ => None,
        }
    }

    fn channel(&self, index: usize) -> Option<(f64, f64)> {
        let t = self.params.channel_type()?;
        match self.indicators.get(&t)?.get(index)? {
            IndicatorValue::Channel { upper, lower } => Some((upper, lower)),
            _ => None,
        }
    }
}

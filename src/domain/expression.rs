//! Signal expression registry.
//!
//! A strategy slot lists expression names. Each name resolves, through this
//! closed registry, either to one elementary [`Condition`] or to a
//! [`Composite`] that ORs several conditions together. Nothing outside the
//! registry can be named.

use std::fmt;

use crate::domain::indicator::{IndicatorParams, IndicatorType};

/// Indicator family an elementary condition reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Sma,
    Ema,
    Macd,
    Rsi,
    Bollinger,
    Breakout,
    VolumeSpike,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Sma => "sma",
            Family::Ema => "ema",
            Family::Macd => "macd",
            Family::Rsi => "rsi",
            Family::Bollinger => "bollinger",
            Family::Breakout => "breakout",
            Family::VolumeSpike => "volume_spike",
        }
    }

    /// Series this family needs under `params`, or `None` when the family is
    /// not configured.
    pub fn indicator_types(&self, params: &IndicatorParams) -> Option<Vec<IndicatorType>> {
        match self {
            Family::Sma => params.sma_types().map(|(f, s)| vec![f, s]),
            Family::Ema => params.ema_types().map(|(f, s)| vec![f, s]),
            Family::Macd => params.macd_type().map(|t| vec![t]),
            Family::Rsi => params.rsi_type().map(|t| vec![t]),
            Family::Bollinger => params.bollinger_type().map(|t| vec![t]),
            Family::Breakout => params.channel_type().map(|t| vec![t]),
            Family::VolumeSpike => params.volume_spike_type().map(|t| vec![t]),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    SmaCrossover,
    SmaCrossunder,
    EmaCrossover,
    EmaCrossunder,
    MacdCrossover,
    MacdCrossunder,
    MacdIsBullish,
    MacdIsBearish,
    RsiIsOverbought,
    RsiIsOversold,
    RsiIsNotOverbought,
    RsiIsNotOversold,
    PriceBreaksUpperBand,
    PriceBreaksLowerBand,
    PriceCrossesMiddleBandFromTop,
    PriceCrossesMiddleBandFromBottom,
    PriceBreaksChannelHigh,
    PriceBreaksChannelLow,
    VolumeSpike,
}

impl Condition {
    pub const ALL: [Condition; 19] = [
        Condition::SmaCrossover,
        Condition::SmaCrossunder,
        Condition::EmaCrossover,
        Condition::EmaCrossunder,
        Condition::MacdCrossover,
        Condition::MacdCrossunder,
        Condition::MacdIsBullish,
        Condition::MacdIsBearish,
        Condition::RsiIsOverbought,
        Condition::RsiIsOversold,
        Condition::RsiIsNotOverbought,
        Condition::RsiIsNotOversold,
        Condition::PriceBreaksUpperBand,
        Condition::PriceBreaksLowerBand,
        Condition::PriceCrossesMiddleBandFromTop,
        Condition::PriceCrossesMiddleBandFromBottom,
        Condition::PriceBreaksChannelHigh,
        Condition::PriceBreaksChannelLow,
        Condition::VolumeSpike,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Condition::SmaCrossover => "sma_crossover",
            Condition::SmaCrossunder => "sma_crossunder",
            Condition::EmaCrossover => "ema_crossover",
            Condition::EmaCrossunder => "ema_crossunder",
            Condition::MacdCrossover => "macd_crossover",
            Condition::MacdCrossunder => "macd_crossunder",
            Condition::MacdIsBullish => "macd_is_bullish",
            Condition::MacdIsBearish => "macd_is_bearish",
            Condition::RsiIsOverbought => "rsi_is_overbought",
            Condition::RsiIsOversold => "rsi_is_oversold",
            Condition::RsiIsNotOverbought => "rsi_is_not_overbought",
            Condition::RsiIsNotOversold => "rsi_is_not_oversold",
            Condition::PriceBreaksUpperBand => "price_breaks_upper_band",
            Condition::PriceBreaksLowerBand => "price_breaks_lower_band",
            Condition::PriceCrossesMiddleBandFromTop => "price_crosses_middle_band_from_top",
            Condition::PriceCrossesMiddleBandFromBottom => "price_crosses_middle_band_from_bottom",
            Condition::PriceBreaksChannelHigh => "price_breaks_channel_high",
            Condition::PriceBreaksChannelLow => "price_breaks_channel_low",
            Condition::VolumeSpike => "volume_spike",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn family(&self) -> Family {
        match self {
            Condition::SmaCrossover | Condition::SmaCrossunder => Family::Sma,
            Condition::EmaCrossover | Condition::EmaCrossunder => Family::Ema,
            Condition::MacdCrossover
            | Condition::MacdCrossunder
            | Condition::MacdIsBullish
            | Condition::MacdIsBearish => Family::Macd,
            Condition::RsiIsOverbought
            | Condition::RsiIsOversold
            | Condition::RsiIsNotOverbought
            | Condition::RsiIsNotOversold => Family::Rsi,
            Condition::PriceBreaksUpperBand
            | Condition::PriceBreaksLowerBand
            | Condition::PriceCrossesMiddleBandFromTop
            | Condition::PriceCrossesMiddleBandFromBottom => Family::Bollinger,
            Condition::PriceBreaksChannelHigh | Condition::PriceBreaksChannelLow => {
                Family::Breakout
            }
            Condition::VolumeSpike => Family::VolumeSpike,
        }
    }
}

/// Named OR-combinations of elementary conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composite {
    TriggersLong,
    TriggersShort,
    VerifiersLong,
    VerifiersShort,
    ExitsLong,
    ExitsShort,
}

impl Composite {
    pub const ALL: [Composite; 6] = [
        Composite::TriggersLong,
        Composite::TriggersShort,
        Composite::VerifiersLong,
        Composite::VerifiersShort,
        Composite::ExitsLong,
        Composite::ExitsShort,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Composite::TriggersLong => "all_triggers_long_or",
            Composite::TriggersShort => "all_triggers_short_or",
            Composite::VerifiersLong => "all_verificators_long_or",
            Composite::VerifiersShort => "all_verificators_short_or",
            Composite::ExitsLong => "all_exits_long_or",
            Composite::ExitsShort => "all_exits_short_or",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn members(&self) -> &'static [Condition] {
        match self {
            Composite::TriggersLong => &[
                Condition::SmaCrossover,
                Condition::EmaCrossover,
                Condition::MacdCrossover,
                Condition::PriceBreaksUpperBand,
                Condition::PriceCrossesMiddleBandFromBottom,
                Condition::PriceBreaksChannelHigh,
            ],
            Composite::TriggersShort => &[
                Condition::SmaCrossunder,
                Condition::EmaCrossunder,
                Condition::MacdCrossunder,
                Condition::PriceBreaksLowerBand,
                Condition::PriceCrossesMiddleBandFromTop,
                Condition::PriceBreaksChannelLow,
            ],
            Composite::VerifiersLong => &[Condition::RsiIsNotOverbought, Condition::VolumeSpike],
            Composite::VerifiersShort => &[Condition::RsiIsNotOversold, Condition::VolumeSpike],
            Composite::ExitsLong => &[
                Condition::SmaCrossunder,
                Condition::EmaCrossunder,
                Condition::MacdCrossunder,
                Condition::PriceCrossesMiddleBandFromTop,
                Condition::RsiIsOverbought,
            ],
            Composite::ExitsShort => &[
                Condition::SmaCrossover,
                Condition::EmaCrossover,
                Condition::MacdCrossover,
                Condition::PriceCrossesMiddleBandFromBottom,
                Condition::RsiIsOversold,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expression {
    Elementary(Condition),
    AnyOf(Composite),
}

impl Expression {
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Condition::from_name(name)
            .map(Expression::Elementary)
            .or_else(|| Composite::from_name(name).map(Expression::AnyOf))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Expression::Elementary(c) => c.name(),
            Expression::AnyOf(c) => c.name(),
        }
    }

    /// Every name the registry accepts, elementary names first.
    pub fn all_names() -> Vec<&'static str> {
        Condition::ALL
            .iter()
            .map(Condition::name)
            .chain(Composite::ALL.iter().map(Composite::name))
            .collect()
    }
}

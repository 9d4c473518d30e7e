//! Strategy configuration and named presets.

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

/// Four slots of signal-expression names.
///
/// Entry slots fire when every listed expression holds (AND). Exit slots fire
/// when any listed expression holds (OR). An empty slot never fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub long_entry: Vec<String>,
    pub short_entry: Vec<String>,
    pub long_exit: Vec<String>,
    pub short_exit: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    LongEntry,
    ShortEntry,
    LongExit,
    ShortExit,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::LongEntry, Slot::ShortEntry, Slot::LongExit, Slot::ShortExit];

    pub fn name(&self) -> &'static str {
        match self {
            Slot::LongEntry => "long_entry",
            Slot::ShortEntry => "short_entry",
            Slot::LongExit => "long_exit",
            Slot::ShortExit => "short_exit",
        }
    }
}

impl StrategyConfig {
    pub fn slot(&self, slot: Slot) -> &[String] {
        match slot {
            Slot::LongEntry => &self.long_entry,
            Slot::ShortEntry => &self.short_entry,
            Slot::LongExit => &self.long_exit,
            Slot::ShortExit => &self.short_exit,
        }
    }

    /// Look up one of the built-in presets by name.
    pub fn preset(name: &str) -> Result<Self, EngineError> {
        PRESETS
            .iter()
            .find(|p| p.name == name)
            .map(Preset::config)
            .ok_or_else(|| EngineError::UnknownPreset {
                name: name.to_string(),
            })
    }
}

pub struct Preset {
    pub name: &'static str,
    pub long_entry: &'static [&'static str],
    pub short_entry: &'static [&'static str],
    pub long_exit: &'static [&'static str],
    pub short_exit: &'static [&'static str],
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Preset {
    pub fn config(&self) -> StrategyConfig {
        StrategyConfig {
            long_entry: owned(self.long_entry),
            short_entry: owned(self.short_entry),
            long_exit: owned(self.long_exit),
            short_exit: owned(self.short_exit),
        }
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "Debug_Single_Long_Entry",
        long_entry: &["ema_crossover"],
        short_entry: &[],
        long_exit: &[],
        short_exit: &[],
    },
    Preset {
        name: "Debug_EMA_Only",
        long_entry: &["ema_crossover"],
        short_entry: &["ema_crossunder"],
        long_exit: &[],
        short_exit: &[],
    },
    Preset {
        name: "EMA_Only",
        long_entry: &["ema_crossover"],
        short_entry: &["ema_crossunder"],
        long_exit: &["ema_crossunder"],
        short_exit: &["ema_crossover"],
    },
    Preset {
        name: "BB_Breakout",
        long_entry: &["price_breaks_upper_band"],
        short_entry: &["price_breaks_lower_band"],
        long_exit: &["price_crosses_middle_band_from_top"],
        short_exit: &["price_crosses_middle_band_from_bottom"],
    },
    Preset {
        name: "BB_RSI",
        long_entry: &["price_breaks_upper_band", "rsi_is_not_overbought"],
        short_entry: &["price_breaks_lower_band", "rsi_is_not_oversold"],
        long_exit: &["price_crosses_middle_band_from_top"],
        short_exit: &["price_crosses_middle_band_from_bottom"],
    },
    Preset {
        name: "Combined_Trigger_Verifier",
        long_entry: &["all_triggers_long_or", "all_verificators_long_or"],
        short_entry: &["all_triggers_short_or", "all_verificators_short_or"],
        long_exit: &["all_exits_long_or"],
        short_exit: &["all_exits_short_or"],
    },
];

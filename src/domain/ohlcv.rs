//! OHLCV bar representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Rejects an empty series or one whose timestamps are not strictly increasing.
pub fn validate_series(bars: &[Bar]) -> Result<(), EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptySeries);
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(EngineError::UnorderedBars { index: i + 1 });
        }
    }
    Ok(())
}

//! Bar data access port trait.

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Every bar stored for `ticker`, ordered by timestamp.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, EngineError>;
}

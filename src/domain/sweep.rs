//! Batch execution of independent backtest trials.
//!
//! Every trial reads the same bar series; results come back in the order
//! the trials were given, whatever the scheduling.

use rayon::prelude::*;
use tracing::info;

use super::backtest::{BacktestResult, RunConfig};
use super::error::EngineError;
use super::ohlcv::Bar;

pub type TrialResult = Result<BacktestResult, EngineError>;

pub struct TrialRunner {
    parallel: bool,
}

impl Default for TrialRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialRunner {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every trial. A failing trial does not stop the others.
    pub fn run(&self, bars: &[Bar], trials: &[RunConfig]) -> Vec<TrialResult> {
        info!(trials = trials.len(), bars = bars.len(), parallel = self.parallel, "starting sweep");

        let results: Vec<TrialResult> = if self.parallel {
            trials.par_iter().map(|trial| trial.run(bars)).collect()
        } else {
            trials.iter().map(|trial| trial.run(bars)).collect()
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(completed = results.len() - failed, failed, "sweep complete");
        results
    }
}

/// Runs `trials` over `bars` on the rayon pool.
pub fn run_trials(bars: &[Bar], trials: &[RunConfig]) -> Vec<TrialResult> {
    TrialRunner::new().run(bars, trials)
}

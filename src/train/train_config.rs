use std::sync::mpsc;

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;

/// Configuration for one `fit` run.
///
/// # Fields
/// - `epochs`      — total number of full passes over the training data
/// - `batch_size`  — pairs per batch; the last batch of an epoch may be smaller
/// - `parallel`    — average each batch's gradient on the rayon pool
/// - `seed`        — shuffle seed; `None` seeds from OS entropy
/// - `progress_tx` — optional channel sender; one `EpochStats` is sent per
///                   completed epoch. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub parallel: bool,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            epochs: 100,
            batch_size: 256,
            parallel: true,
            seed: None,
            progress_tx: None,
        }
    }
}

impl FitConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        FitConfig {
            epochs,
            batch_size,
            ..FitConfig::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidInput("epochs must be at least 1".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidInput("batch size must be at least 1".to_owned()));
        }
        Ok(())
    }
}

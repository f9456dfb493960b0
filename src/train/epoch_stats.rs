use serde::{Deserialize, Serialize};

/// Per-epoch training statistics emitted by the fit loop.
///
/// When a `progress_tx` channel is configured in `FitConfig`, the loop sends
/// one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training cost over every pair, each measured just before the
    /// descent step of its batch.
    pub train_cost: f64,
    /// Mean validation cost after the epoch, if a validation set was provided.
    pub val_cost: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Summary of a finished `fit` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub history: Vec<EpochStats>,
}

impl FitReport {
    pub fn final_train_cost(&self) -> Option<f64> {
        self.history.last().map(|s| s.train_cost)
    }

    pub fn final_val_cost(&self) -> Option<f64> {
        self.history.last().and_then(|s| s.val_cost)
    }
}

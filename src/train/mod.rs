pub mod epoch_stats;
pub mod gradient;
pub mod loop_fn;
pub mod train_config;

pub use epoch_stats::{EpochStats, FitReport};
pub use gradient::{average_gradient, average_gradient_parallel, BatchGradient};
pub use loop_fn::fit_loop;
pub use train_config::FitConfig;

/// One `(input, target)` example.
pub type TrainingPair = (Vec<f64>, Vec<f64>);

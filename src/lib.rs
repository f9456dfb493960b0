pub mod activation;
pub mod error;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod parameter;
pub mod persist;
pub mod train;

// Convenience re-exports
pub use activation::Activation;
pub use error::{Error, Result};
pub use loss::CostFunction;
pub use math::matrix::Matrix;
pub use network::{NetSpec, NeuralNet};
pub use optim::{Adam, AdamState, GradientDescender, Sgd};
pub use parameter::{ForwardPass, Parameter};
pub use train::{EpochStats, FitConfig, FitReport, TrainingPair};

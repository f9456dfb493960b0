pub mod mse;
pub mod cross_entropy;
pub mod huber;
pub mod cost_function;

pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use cost_function::CostFunction;

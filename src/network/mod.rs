pub mod io;
pub mod network;
pub mod spec;

pub use network::NeuralNet;
pub use spec::{InitScheme, LayerSpec, NetSpec, OptimizerSpec};

pub mod arithmetic;
pub mod factory;
pub mod io;
pub mod parameter;

pub use parameter::{ForwardPass, Parameter};

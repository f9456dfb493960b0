use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::optim::ensure_finite;
use crate::parameter::Parameter;
use crate::persist::HyperParams;

pub const SGD_TYPE_NAME: &str = "StochasticGradientDescender";

/// Plain gradient descent: `delta = -learning_rate * gradient`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        let sgd = Sgd { learning_rate };
        sgd.validate()?;
        Ok(sgd)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// The delta to add to the live parameter for one descent step.
    pub fn step(&self, gradient: &Parameter) -> Result<Parameter> {
        ensure_finite(gradient, "gradient")?;
        let delta = gradient.scale(-self.learning_rate);
        ensure_finite(&delta, "sgd delta")?;
        Ok(delta)
    }

    pub fn encode(&self) -> HyperParams {
        HyperParams::new(SGD_TYPE_NAME).with_f64("learning rate", self.learning_rate)
    }

    pub fn decode(params: &HyperParams) -> Result<Sgd> {
        Sgd::new(params.get_f64("learning rate")?)
    }
}

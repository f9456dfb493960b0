use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::optim::adam::{Adam, AdamState, ADAM_TYPE_NAME};
use crate::optim::sgd::{Sgd, SGD_TYPE_NAME};
use crate::parameter::Parameter;
use crate::persist::{HyperParams, HYPER_PARAMS_FILE};

const MOMENTUM_DIR: &str = "momentum";
const VARIANCE_DIR: &str = "variance";

/// The optimizer a network trains with, together with whatever state it
/// carries between steps.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientDescender {
    Stochastic(Sgd),
    Adam(Adam, AdamState),
}

impl From<Sgd> for GradientDescender {
    fn from(sgd: Sgd) -> Self {
        GradientDescender::Stochastic(sgd)
    }
}

impl From<Adam> for GradientDescender {
    fn from(adam: Adam) -> Self {
        GradientDescender::Adam(adam, AdamState::default())
    }
}

impl GradientDescender {
    pub fn type_name(&self) -> &'static str {
        match self {
            GradientDescender::Stochastic(_) => SGD_TYPE_NAME,
            GradientDescender::Adam(..) => ADAM_TYPE_NAME,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            GradientDescender::Stochastic(sgd) => sgd.validate(),
            GradientDescender::Adam(adam, _) => adam.validate(),
        }
    }

    /// Consumes one averaged gradient and returns the delta to add to the
    /// live parameter. Adam advances its state only when the step succeeds.
    pub fn step(&mut self, gradient: &Parameter) -> Result<Parameter> {
        match self {
            GradientDescender::Stochastic(sgd) => sgd.step(gradient),
            GradientDescender::Adam(adam, state) => {
                let (delta, next) = adam.update(state, gradient)?;
                *state = next;
                Ok(delta)
            }
        }
    }

    /// Writes `hyper-params.txt` into `dir`, plus `momentum/` and `variance/`
    /// parameter directories once Adam has taken a step. Moment directories
    /// from an earlier write are removed first.
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        crate::persist::create_dir(dir)?;
        crate::persist::remove_dir_if_present(&dir.join(MOMENTUM_DIR))?;
        crate::persist::remove_dir_if_present(&dir.join(VARIANCE_DIR))?;
        match self {
            GradientDescender::Stochastic(sgd) => sgd.encode().write_file(&dir.join(HYPER_PARAMS_FILE))?,
            GradientDescender::Adam(adam, state) => {
                adam.encode(state).write_file(&dir.join(HYPER_PARAMS_FILE))?;
                if let (Some(momentum), Some(variance)) = (&state.momentum, &state.variance) {
                    momentum.write_to_dir(&dir.join(MOMENTUM_DIR))?;
                    variance.write_to_dir(&dir.join(VARIANCE_DIR))?;
                }
            }
        }
        debug!(dir = %dir.display(), kind = self.type_name(), "wrote gradient descender");
        Ok(())
    }

    pub fn read_from_dir(dir: &Path) -> Result<GradientDescender> {
        let params = HyperParams::read_file(&dir.join(HYPER_PARAMS_FILE))?;
        let descender = match params.type_name() {
            SGD_TYPE_NAME => GradientDescender::Stochastic(Sgd::decode(&params)?),
            ADAM_TYPE_NAME => {
                let (adam, step) = Adam::decode(&params)?;
                let momentum_dir = dir.join(MOMENTUM_DIR);
                let variance_dir = dir.join(VARIANCE_DIR);
                let state = if momentum_dir.is_dir() || variance_dir.is_dir() {
                    AdamState::new(
                        step,
                        Some(Parameter::read_from_dir(&momentum_dir)?),
                        Some(Parameter::read_from_dir(&variance_dir)?),
                    )?
                } else if step > 0 {
                    return Err(Error::NotFound(momentum_dir));
                } else {
                    AdamState::default()
                };
                GradientDescender::Adam(adam, state)
            }
            other => return Err(params.error(format!("unknown gradient descender type {other}"))),
        };
        debug!(dir = %dir.display(), kind = descender.type_name(), "read gradient descender");
        Ok(descender)
    }
}

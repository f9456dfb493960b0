//! Directory layout of a saved network:
//!
//! ```text
//! <dir>/parameters/weight <n>.csv, bias <n>.csv
//! <dir>/activations/activation <n>/hyper-params.txt
//! <dir>/gradient-descender/hyper-params.txt   (+ momentum/, variance/ for Adam)
//! <dir>/cost.txt
//! ```

use std::path::Path;

use tracing::info;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::loss::CostFunction;
use crate::network::NeuralNet;
use crate::optim::GradientDescender;
use crate::parameter::Parameter;
use crate::persist::{self, HyperParams, HYPER_PARAMS_FILE};

pub const PARAMETERS_DIR: &str = "parameters";
pub const ACTIVATIONS_DIR: &str = "activations";
pub const GRADIENT_DESCENDER_DIR: &str = "gradient-descender";
pub const COST_FILE: &str = "cost.txt";
const ACTIVATION_PREFIX: &str = "activation ";

impl NeuralNet {
    /// Writes everything needed to resume training into `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        persist::create_dir(dir)?;
        self.parameter.write_to_dir(&dir.join(PARAMETERS_DIR))?;

        let activations_dir = dir.join(ACTIVATIONS_DIR);
        persist::remove_dir_if_present(&activations_dir)?;
        for (i, activation) in self.activations.iter().enumerate() {
            let activation_dir = activations_dir.join(format!("{ACTIVATION_PREFIX}{}", i + 1));
            persist::create_dir(&activation_dir)?;
            activation.encode().write_file(&activation_dir.join(HYPER_PARAMS_FILE))?;
        }

        self.descender.write_to_dir(&dir.join(GRADIENT_DESCENDER_DIR))?;
        self.cost.encode().write_file(&dir.join(COST_FILE))?;

        info!(dir = %dir.display(), layers = ?self.layer_sizes(), "saved network");
        Ok(())
    }

    /// Reads a network written by [`NeuralNet::write_to_dir`]. Either every
    /// part reads back or the whole call fails.
    pub fn read_from_dir(dir: &Path) -> Result<NeuralNet> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.to_path_buf()));
        }
        let parameter = Parameter::read_from_dir(&dir.join(PARAMETERS_DIR))?;

        let activation_dirs = persist::numbered_entries(&dir.join(ACTIVATIONS_DIR), ACTIVATION_PREFIX, "")?;
        let activations = activation_dirs
            .iter()
            .map(|(_, path)| Activation::decode(&HyperParams::read_file(&path.join(HYPER_PARAMS_FILE))?))
            .collect::<Result<Vec<_>>>()?;

        let descender = GradientDescender::read_from_dir(&dir.join(GRADIENT_DESCENDER_DIR))?;
        let cost = CostFunction::decode(&HyperParams::read_file(&dir.join(COST_FILE))?)?;

        let net = NeuralNet::new(parameter, activations, cost, descender)?;
        info!(dir = %dir.display(), layers = ?net.layer_sizes(), "loaded network");
        Ok(net)
    }
}

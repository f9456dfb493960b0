use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::loss::CostFunction;
use crate::network::NeuralNet;
use crate::optim::{Adam, GradientDescender, Sgd};
use crate::parameter::Parameter;
use crate::train::TrainingPair;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`       — number of outputs of this layer
/// - `activation` — activation function applied after the affine transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: Activation,
}

/// How the weights of a freshly built network are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitScheme {
    Uniform,
    Normal,
    Xavier,
    #[default]
    Kaiming,
    Orthonormal,
    /// Needs sample inputs; see [`NetSpec::build`].
    Lsuv,
}

/// Which gradient descender a freshly built network starts with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerSpec {
    Sgd(Sgd),
    Adam(Adam),
}

impl From<OptimizerSpec> for GradientDescender {
    fn from(spec: OptimizerSpec) -> Self {
        match spec {
            OptimizerSpec::Sgd(sgd) => sgd.into(),
            OptimizerSpec::Adam(adam) => adam.into(),
        }
    }
}

/// A fully serializable description of a network architecture plus the cost
/// and optimizer it trains with.
///
/// `NetSpec` can be saved to / loaded from JSON independently of any trained
/// weights, making it possible to store architecture configurations before
/// training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSpec {
    /// Human-readable name, used for logging.
    pub name: String,
    /// Length of the input vector.
    pub input_size: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub init: InitScheme,
    pub cost: CostFunction,
    pub optimizer: OptimizerSpec,
}

impl NetSpec {
    /// Layer sizes including the input size.
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_size)
            .chain(self.layers.iter().map(|l| l.size))
            .collect()
    }

    pub fn activations(&self) -> Vec<Activation> {
        self.layers.iter().map(|l| l.activation).collect()
    }

    /// Builds an untrained network. `training_data` is only read by
    /// [`InitScheme::Lsuv`], which requires it to be non-empty.
    pub fn build<R: Rng>(&self, training_data: &[TrainingPair], rng: &mut R) -> Result<NeuralNet> {
        let sizes = self.layer_sizes();
        let activations = self.activations();
        let parameter = match self.init {
            InitScheme::Uniform => Parameter::uniform(&sizes, rng)?,
            InitScheme::Normal => Parameter::normal(&sizes, rng)?,
            InitScheme::Xavier => Parameter::xavier(&sizes, rng)?,
            InitScheme::Kaiming => Parameter::kaiming(&sizes, rng)?,
            InitScheme::Orthonormal => Parameter::orthonormal(&sizes, rng)?,
            InitScheme::Lsuv => {
                if training_data.is_empty() {
                    return Err(Error::InvalidConfig(
                        "lsuv initialisation needs training data".to_owned(),
                    ));
                }
                let inputs: Vec<Vec<f64>> = training_data.iter().map(|(x, _)| x.clone()).collect();
                Parameter::lsuv(&sizes, &activations, &inputs, rng)?
            }
        };
        NeuralNet::new(parameter, activations, self.cost, self.optimizer.into())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetSpec` from a JSON file.
    pub fn load_json(path: &Path) -> Result<NetSpec> {
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Default for NetSpec {
    /// The `1 → 8 → 8 → 1` ReLU regressor trained with Adam.
    fn default() -> Self {
        NetSpec {
            name: "square".to_owned(),
            input_size: 1,
            layers: vec![
                LayerSpec { size: 8, activation: Activation::relu() },
                LayerSpec { size: 8, activation: Activation::relu() },
                LayerSpec { size: 1, activation: Activation::Identity },
            ],
            init: InitScheme::Kaiming,
            cost: CostFunction::Mse,
            optimizer: OptimizerSpec::Adam(Adam::default()),
        }
    }
}

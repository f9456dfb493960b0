use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::persist::hyper_params::HyperParams;

/// Transform applied to a layer's pre-activation vector `z`.
///
/// `Softmax` is vector-valued and has a dense Jacobian; every other variant
/// acts element-wise and produces a diagonal one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activation {
    Identity,
    /// Rectified linear unit. `leak` is the slope for negative inputs;
    /// `0.0` gives the plain ReLU.
    Relu { leak: f64 },
    Tanh,
    Sigmoid,
    Softmax,
}

impl Activation {
    pub fn relu() -> Activation {
        Activation::Relu { leak: 0.0 }
    }

    pub fn leaky_relu(leak: f64) -> Activation {
        Activation::Relu { leak }
    }

    pub fn validate(&self) -> Result<()> {
        if let Activation::Relu { leak } = self {
            if !leak.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "relu leak must be finite, got {leak}"
                )));
            }
        }
        Ok(())
    }

    /// Discriminator written to the first line of the hyper-parameter file.
    pub fn type_name(&self) -> &'static str {
        match self {
            Activation::Identity => "IdentityActivation",
            Activation::Relu { .. } => "ReluActivation",
            Activation::Tanh => "TanhActivation",
            Activation::Sigmoid => "SigmoidActivation",
            Activation::Softmax => "SoftmaxActivation",
        }
    }

    /// Post-activation vector `a = f(z)`.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            Activation::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }

    /// Jacobian of the transform at `z`: entry `[r][c]` is `∂a_r / ∂z_c`.
    pub fn apply_derivative(&self, z: &[f64]) -> Matrix {
        let a = self.apply(z);
        self.apply_derivative_with_output(z, &a)
    }

    /// Same as [`Activation::apply_derivative`], reusing `a = self.apply(z)`
    /// from the forward pass instead of recomputing it.
    pub fn apply_derivative_with_output(&self, z: &[f64], a: &[f64]) -> Matrix {
        debug_assert_eq!(z.len(), a.len());
        match self {
            Activation::Softmax => {
                // diag(s) - s·sᵀ
                let mut jacobian = Matrix::outer(a, a).map(|x| -x);
                for (i, &s) in a.iter().enumerate() {
                    jacobian.data[i][i] += s;
                }
                jacobian
            }
            Activation::Identity => Matrix::identity(z.len()),
            Activation::Tanh => {
                Matrix::diagonal(&a.iter().map(|t| 1.0 - t * t).collect::<Vec<_>>())
            }
            Activation::Sigmoid => {
                Matrix::diagonal(&a.iter().map(|s| s * (1.0 - s)).collect::<Vec<_>>())
            }
            Activation::Relu { .. } => {
                Matrix::diagonal(&z.iter().map(|&x| self.derivative(x)).collect::<Vec<_>>())
            }
        }
    }

    /// Element-wise activation. Never reached for `Softmax`.
    fn function(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu { leak } => {
                if x > 0.0 {
                    x
                } else {
                    leak * x
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Softmax => x,
        }
    }

    /// Element-wise derivative for the ReLU family.
    ///
    /// At exactly zero the derivative is the midpoint `(1 + leak) / 2`
    /// of the two one-sided slopes.
    fn derivative(&self, x: f64) -> f64 {
        match self {
            Activation::Relu { leak } => {
                if x > 0.0 {
                    1.0
                } else if x == 0.0 {
                    (1.0 + leak) / 2.0
                } else {
                    *leak
                }
            }
            _ => 1.0,
        }
    }

    pub fn encode(&self) -> HyperParams {
        let params = HyperParams::new(self.type_name());
        match self {
            Activation::Relu { leak } => params.with_f64("leak", *leak),
            _ => params,
        }
    }

    pub fn decode(params: &HyperParams) -> Result<Activation> {
        let activation = match params.type_name() {
            "IdentityActivation" => Activation::Identity,
            "ReluActivation" => Activation::Relu {
                leak: params.get_f64("leak")?,
            },
            "TanhActivation" => Activation::Tanh,
            "SigmoidActivation" => Activation::Sigmoid,
            "SoftmaxActivation" => Activation::Softmax,
            other => return Err(params.error(format!("unknown activation type {other}"))),
        };
        activation.validate()?;
        Ok(activation)
    }
}

/// Numerically stable softmax: the maximum is subtracted before exponentiating.
fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::loss::{CrossEntropyLoss, HuberLoss, MseLoss};
use crate::persist::hyper_params::HyperParams;

/// Selects which cost the network is trained against.
///
/// - `Mse`          — mean-squared error; pair with an Identity output.
/// - `CrossEntropy` — categorical cross-entropy; pair with a Softmax output.
/// - `Huber`        — squared error near zero, absolute error beyond
///   `outlier_boundary`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CostFunction {
    Mse,
    CrossEntropy,
    Huber { outlier_boundary: f64 },
}

impl CostFunction {
    pub fn huber() -> CostFunction {
        CostFunction::Huber { outlier_boundary: 1.0 }
    }

    pub fn validate(&self) -> Result<()> {
        if let CostFunction::Huber { outlier_boundary } = self {
            if !(outlier_boundary.is_finite() && *outlier_boundary > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "huber outlier boundary must be finite and > 0, got {outlier_boundary}"
                )));
            }
        }
        Ok(())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CostFunction::Mse => "MSECost",
            CostFunction::CrossEntropy => "CrossEntropyCost",
            CostFunction::Huber { .. } => "HuberCost",
        }
    }

    fn check_lengths(predicted: &[f64], expected: &[f64]) -> Result<()> {
        if predicted.len() != expected.len() {
            return Err(Error::Shape(format!(
                "predicted vector has length {} but target has length {}",
                predicted.len(),
                expected.len()
            )));
        }
        if predicted.is_empty() {
            return Err(Error::Shape("cannot compute the cost of empty vectors".to_owned()));
        }
        Ok(())
    }

    /// Scalar cost of `predicted` against `expected`.
    pub fn apply(&self, predicted: &[f64], expected: &[f64]) -> Result<f64> {
        CostFunction::check_lengths(predicted, expected)?;
        Ok(match self {
            CostFunction::Mse => MseLoss::loss(predicted, expected),
            CostFunction::CrossEntropy => CrossEntropyLoss::loss(predicted, expected),
            CostFunction::Huber { outlier_boundary } => {
                HuberLoss::new(*outlier_boundary).loss(predicted, expected)
            }
        })
    }

    /// Gradient of the cost with respect to `predicted`.
    pub fn derivative(&self, predicted: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
        CostFunction::check_lengths(predicted, expected)?;
        Ok(match self {
            CostFunction::Mse => MseLoss::derivative(predicted, expected),
            CostFunction::CrossEntropy => CrossEntropyLoss::derivative(predicted, expected),
            CostFunction::Huber { outlier_boundary } => {
                HuberLoss::new(*outlier_boundary).derivative(predicted, expected)
            }
        })
    }

    pub fn encode(&self) -> HyperParams {
        let params = HyperParams::new(self.type_name());
        match self {
            CostFunction::Huber { outlier_boundary } => {
                params.with_f64("outlier boundary", *outlier_boundary)
            }
            _ => params,
        }
    }

    pub fn decode(params: &HyperParams) -> Result<CostFunction> {
        let cost = match params.type_name() {
            "MSECost" => CostFunction::Mse,
            "CrossEntropyCost" => CostFunction::CrossEntropy,
            "HuberCost" => CostFunction::Huber {
                outlier_boundary: params.get_f64("outlier boundary")?,
            },
            other => return Err(params.error(format!("unknown cost function type {other}"))),
        };
        cost.validate()?;
        Ok(cost)
    }
}

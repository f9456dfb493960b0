use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::optim::ensure_finite;
use crate::parameter::Parameter;
use crate::persist::HyperParams;

pub const ADAM_TYPE_NAME: &str = "AdamGradientDescender";

/// Adam hyper-parameters. The moving state lives in [`AdamState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adam {
    pub learning_rate: f64,
    pub momentum_decay: f64,
    pub variance_decay: f64,
    pub epsilon: f64,
}

impl Default for Adam {
    fn default() -> Self {
        Adam {
            learning_rate: 0.001,
            momentum_decay: 0.9,
            variance_decay: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Step count and moment accumulators carried between Adam updates.
///
/// The accumulators stay `None` until the first update, which zero-fills
/// them in the shape of the gradient.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdamState {
    pub step: u64,
    pub momentum: Option<Parameter>,
    pub variance: Option<Parameter>,
}

impl AdamState {
    /// Rebuilds a state, checking that `momentum` and `variance` agree.
    pub fn new(step: u64, momentum: Option<Parameter>, variance: Option<Parameter>) -> Result<AdamState> {
        match (&momentum, &variance) {
            (Some(m), Some(v)) if m.layer_sizes() != v.layer_sizes() => {
                return Err(Error::Shape(format!(
                    "adam momentum has layer sizes {:?} but variance has {:?}",
                    m.layer_sizes(),
                    v.layer_sizes()
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Shape(
                    "adam momentum and variance must be both present or both absent".to_owned(),
                ));
            }
            _ => {}
        }
        Ok(AdamState { step, momentum, variance })
    }
}

impl Adam {
    pub fn new(learning_rate: f64) -> Result<Adam> {
        let adam = Adam { learning_rate, ..Adam::default() };
        adam.validate()?;
        Ok(adam)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        for (name, decay) in [
            ("momentum decay", self.momentum_decay),
            ("variance decay", self.variance_decay),
        ] {
            if !(decay.is_finite() && (0.0..1.0).contains(&decay)) {
                return Err(Error::InvalidConfig(format!(
                    "adam {name} must be finite and in [0,1), got {decay}"
                )));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "adam epsilon must be finite and > 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }

    /// One Adam step. Returns the delta to add to the live parameter and the
    /// state to pass into the next call; `state` itself is left untouched.
    pub fn update(&self, state: &AdamState, gradient: &Parameter) -> Result<(Parameter, AdamState)> {
        ensure_finite(gradient, "gradient")?;

        let mut momentum = state.momentum.clone().unwrap_or_else(|| gradient.zeros_like());
        let mut variance = state.variance.clone().unwrap_or_else(|| gradient.zeros_like());

        // m = β1·m + (1-β1)·g
        momentum.scale_in_place(self.momentum_decay);
        momentum.add_assign_param(&gradient.scale(1.0 - self.momentum_decay))?;
        // v = β2·v + (1-β2)·g²
        variance.scale_in_place(self.variance_decay);
        variance.add_assign_param(&gradient.powf(2.0).scale(1.0 - self.variance_decay))?;

        let next = AdamState {
            step: state.step + 1,
            momentum: Some(momentum),
            variance: Some(variance),
        };
        let (corrected_momentum, corrected_variance) = self.bias_corrected(&next)?;

        let mut denominator = corrected_variance.sqrt();
        denominator.add_scalar_in_place(self.epsilon);
        let mut delta = corrected_momentum.scale(-self.learning_rate);
        delta.div_assign_param(&denominator)?;

        ensure_finite(&delta, "adam delta")?;
        Ok((delta, next))
    }

    /// Bias-corrected momentum and variance of `state`:
    /// `m / (1 - β1^step)` and `v / (1 - β2^step)`.
    pub fn bias_corrected(&self, state: &AdamState) -> Result<(Parameter, Parameter)> {
        let (Some(momentum), Some(variance)) = (&state.momentum, &state.variance) else {
            return Err(Error::InvalidInput(
                "adam state has no accumulators before the first update".to_owned(),
            ));
        };
        let step = i32::try_from(state.step).unwrap_or(i32::MAX);
        let corrected_momentum = momentum.div_scalar(1.0 - self.momentum_decay.powi(step))?;
        let corrected_variance = variance.div_scalar(1.0 - self.variance_decay.powi(step))?;
        ensure_finite(&corrected_momentum, "adam momentum")?;
        ensure_finite(&corrected_variance, "adam variance")?;
        Ok((corrected_momentum, corrected_variance))
    }

    /// Hyper-parameters plus the step count; the accumulators are written
    /// separately as parameters.
    pub fn encode(&self, state: &AdamState) -> HyperParams {
        HyperParams::new(ADAM_TYPE_NAME)
            .with_f64("learning rate", self.learning_rate)
            .with_f64("momentum decay", self.momentum_decay)
            .with_f64("variance decay", self.variance_decay)
            .with_f64("epsilon", self.epsilon)
            .with_u64("step", state.step)
    }

    /// Returns the hyper-parameters and the step count.
    pub fn decode(params: &HyperParams) -> Result<(Adam, u64)> {
        let adam = Adam {
            learning_rate: params.get_f64("learning rate")?,
            momentum_decay: params.get_f64("momentum decay")?,
            variance_decay: params.get_f64("variance decay")?,
            epsilon: params.get_f64("epsilon")?,
        };
        adam.validate()?;
        Ok((adam, params.get_u64("step")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Matrix;
    use approx::assert_relative_eq;

    fn gradient() -> Parameter {
        Parameter::new(
            vec![Matrix::from_rows(vec![vec![0.3, -1.7], vec![2.5, 1e-3]]).unwrap()],
            vec![vec![-0.25, 4.0]],
        )
        .unwrap()
    }

    fn entries(p: &Parameter) -> Vec<f64> {
        let mut all: Vec<f64> = p.weight(0).entries().collect();
        all.extend_from_slice(p.bias(0));
        all
    }

    #[test]
    fn first_corrected_momentum_equals_gradient() {
        let adam = Adam::default();
        let (_, state) = adam.update(&AdamState::default(), &gradient()).unwrap();
        assert_eq!(state.step, 1);
        let (m_hat, v_hat) = adam.bias_corrected(&state).unwrap();
        for (m, g) in entries(&m_hat).into_iter().zip(entries(&gradient())) {
            assert_relative_eq!(m, g, max_relative = 1e-15);
        }
        for (v, g) in entries(&v_hat).into_iter().zip(entries(&gradient())) {
            assert_relative_eq!(v, g * g, max_relative = 1e-12);
        }
    }

    #[test]
    fn first_step_moves_each_entry_by_about_learning_rate() {
        let adam = Adam::new(0.01).unwrap();
        let (delta, _) = adam.update(&AdamState::default(), &gradient()).unwrap();
        for (d, g) in entries(&delta).into_iter().zip(entries(&gradient())) {
            assert_relative_eq!(d, -0.01 * g.signum(), max_relative = 1e-4);
        }
    }

    #[test]
    fn update_leaves_input_state_untouched() {
        let adam = Adam::default();
        let (_, first) = adam.update(&AdamState::default(), &gradient()).unwrap();
        let snapshot = first.clone();
        let (_, second) = adam.update(&first, &gradient()).unwrap();
        assert_eq!(first, snapshot);
        assert_eq!(second.step, 2);
    }

    #[test]
    fn mismatched_state_is_a_shape_error() {
        let other = Parameter::zero(&[3, 1]).unwrap();
        let state = AdamState::new(4, Some(other.clone()), Some(other)).unwrap();
        let err = Adam::default().update(&state, &gradient()).unwrap_err();
        assert!(err.is_shape());

        let err = AdamState::new(1, Some(gradient()), Some(Parameter::zero(&[3, 1]).unwrap())).unwrap_err();
        assert!(err.is_shape());
        assert!(AdamState::new(1, Some(gradient()), None).unwrap_err().is_shape());
    }

    #[test]
    fn validate_rejects_out_of_range_decay() {
        let adam = Adam { momentum_decay: 1.0, ..Adam::default() };
        assert!(matches!(adam.validate(), Err(Error::InvalidConfig(_))));
        let adam = Adam { epsilon: 0.0, ..Adam::default() };
        assert!(adam.validate().is_err());
    }

    #[test]
    fn encode_decode_keeps_step() {
        let adam = Adam { learning_rate: 0.003, ..Adam::default() };
        let state = AdamState { step: 42, ..AdamState::default() };
        let params = HyperParams::decode(&adam.encode(&state).encode()).unwrap();
        assert_eq!(Adam::decode(&params).unwrap(), (adam, 42));
    }
}

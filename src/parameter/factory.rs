//! Constructors that build a [`Parameter`] from a list of layer sizes.
//!
//! `layer_sizes[0]` is the input size and every following entry is one
//! layer's output size, so layer `i` gets a `layer_sizes[i+1] x layer_sizes[i]`
//! weight.

use rand::Rng;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::math::vector;
use crate::parameter::Parameter;

/// LSUV stops rescaling a layer once its mean output variance is this close to 1.
pub const LSUV_VARIANCE_TOLERANCE: f64 = 0.05;
/// LSUV rescales each layer at most this many times.
pub const LSUV_MAX_ITERATIONS: usize = 5;

fn check_sizes(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "need an input size and at least one layer size, got {layer_sizes:?}"
        )));
    }
    if layer_sizes.contains(&0) {
        return Err(Error::InvalidInput(format!(
            "layer sizes must be positive, got {layer_sizes:?}"
        )));
    }
    Ok(())
}

/// Builds each layer's weight with `weight(rows, cols)` and a zero bias.
fn build<F>(layer_sizes: &[usize], mut weight: F) -> Result<Parameter>
where
    F: FnMut(usize, usize) -> Matrix,
{
    check_sizes(layer_sizes)?;
    let weights = layer_sizes
        .windows(2)
        .map(|pair| weight(pair[1], pair[0]))
        .collect();
    let biases = layer_sizes[1..].iter().map(|&n| vec![0.0; n]).collect();
    Parameter::new(weights, biases)
}

impl Parameter {
    /// All weights and biases zero.
    pub fn zero(layer_sizes: &[usize]) -> Result<Parameter> {
        build(layer_sizes, Matrix::zeros)
    }

    /// Every weight and bias drawn uniformly from [-1, 1].
    pub fn uniform<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Parameter> {
        let mut param = build(layer_sizes, |r, c| Matrix::random_uniform(r, c, rng))?;
        for x in param.biases.iter_mut().flatten() {
            *x = rng.gen_range(-1.0..=1.0);
        }
        Ok(param)
    }

    /// Every weight and bias drawn from N(0, 1).
    pub fn normal<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Parameter> {
        let mut param = build(layer_sizes, |r, c| Matrix::random_normal(r, c, rng))?;
        for (bias, &n) in param.biases.iter_mut().zip(&layer_sizes[1..]) {
            *bias = Matrix::random_normal(1, n, rng).data.remove(0);
        }
        Ok(param)
    }

    /// Xavier weights with zero biases. Suits Tanh and Identity layers.
    pub fn xavier<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Parameter> {
        build(layer_sizes, |r, c| Matrix::xavier(r, c, rng))
    }

    /// Kaiming-He weights with zero biases. Suits ReLU layers.
    pub fn kaiming<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Parameter> {
        build(layer_sizes, |r, c| Matrix::kaiming(r, c, rng))
    }

    /// Orthonormalised Gaussian weights with zero biases.
    pub fn orthonormal<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Parameter> {
        build(layer_sizes, |r, c| Matrix::gaussian_orthonormal(r, c, rng))
    }

    /// Layer-sequential unit-variance initialisation.
    ///
    /// Starts from [`Parameter::orthonormal`] and then, one layer at a time,
    /// divides the layer's weight by the square root of the mean variance of
    /// its outputs over `inputs`, until that variance is within
    /// [`LSUV_VARIANCE_TOLERANCE`] of 1 or [`LSUV_MAX_ITERATIONS`] rescales
    /// have been made.
    pub fn lsuv<R: Rng>(
        layer_sizes: &[usize],
        activations: &[Activation],
        inputs: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<Parameter> {
        if inputs.is_empty() {
            return Err(Error::InvalidInput("LSUV needs at least one sample input".to_owned()));
        }
        let mut param = Parameter::orthonormal(layer_sizes, rng)?;
        param.set_weights_unit_variance(
            activations,
            inputs,
            LSUV_VARIANCE_TOLERANCE,
            LSUV_MAX_ITERATIONS,
        )?;
        Ok(param)
    }

    /// Rescales the current weights, layer by layer, towards unit mean output
    /// variance over `inputs`.
    ///
    /// A layer whose outputs have zero variance (for instance a single-unit
    /// layer) cannot be rescaled and is left as is.
    pub fn set_weights_unit_variance(
        &mut self,
        activations: &[Activation],
        inputs: &[Vec<f64>],
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<()> {
        for layer in 0..self.layer_count() {
            for _ in 0..max_iterations {
                let mut total = 0.0;
                for input in inputs {
                    let pass = self.forward(input, activations)?;
                    total += vector::variance(&pass.activations[layer]);
                }
                let variance = total / inputs.len() as f64;

                if (variance - 1.0).abs() < tolerance || !(variance.is_finite() && variance > 0.0) {
                    break;
                }
                let scale = variance.sqrt();
                self.weights[layer].apply(|x| x / scale);
            }
        }
        Ok(())
    }
}

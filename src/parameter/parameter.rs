use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::loss::CostFunction;
use crate::math::matrix::Matrix;

/// Weights and biases of every layer of a fully-connected network.
///
/// Layer `i` maps a vector of length `cols(W_i)` to one of length
/// `rows(W_i) == len(b_i)`, and `cols(W_i) == len(b_{i-1})`. Both invariants
/// are checked once by [`Parameter::new`] and preserved by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub(crate) weights: Vec<Matrix>,
    pub(crate) biases: Vec<Vec<f64>>,
}

/// Everything the forward pass computes for one input.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Post-activation vector `a_i` of every layer; the last one is the output.
    pub activations: Vec<Vec<f64>>,
    /// Pre-activation vector `z_i = W_i · a_{i-1} + b_i` of every layer.
    pub pre_activations: Vec<Vec<f64>>,
}

impl ForwardPass {
    pub fn output(&self) -> &[f64] {
        self.activations.last().map_or(&[], Vec::as_slice)
    }
}

impl Parameter {
    pub fn new(weights: Vec<Matrix>, biases: Vec<Vec<f64>>) -> Result<Parameter> {
        if weights.len() != biases.len() {
            return Err(Error::Shape(format!(
                "got {} weights and {} biases; every weight needs exactly one bias",
                weights.len(),
                biases.len()
            )));
        }
        if weights.is_empty() {
            return Err(Error::Shape("a parameter needs at least one layer".to_owned()));
        }
        for (i, (weight, bias)) in weights.iter().zip(&biases).enumerate() {
            if weight.rows != bias.len() {
                return Err(Error::Shape(format!(
                    "layer {}: weight is {}x{} but bias has length {}; the bias length must match the weight's row count",
                    i + 1,
                    weight.rows,
                    weight.cols,
                    bias.len()
                )));
            }
            if i > 0 && weight.cols != biases[i - 1].len() {
                return Err(Error::Shape(format!(
                    "layer {}: weight has {} columns but the previous layer outputs {} values",
                    i + 1,
                    weight.cols,
                    biases[i - 1].len()
                )));
            }
        }
        Ok(Parameter { weights, biases })
    }

    /// Number of weight/bias pairs.
    pub fn layer_count(&self) -> usize {
        self.weights.len()
    }

    /// Input size followed by each layer's output size.
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_size())
            .chain(self.biases.iter().map(Vec::len))
            .collect()
    }

    pub fn input_size(&self) -> usize {
        self.weights[0].cols
    }

    pub fn output_size(&self) -> usize {
        self.biases[self.biases.len() - 1].len()
    }

    /// Total number of scalar weights and biases.
    pub fn entries_count(&self) -> usize {
        self.weights.iter().map(|w| w.rows * w.cols).sum::<usize>()
            + self.biases.iter().map(Vec::len).sum::<usize>()
    }

    pub fn weight(&self, layer: usize) -> &Matrix {
        &self.weights[layer]
    }

    pub fn bias(&self, layer: usize) -> &[f64] {
        &self.biases[layer]
    }

    pub fn weight_entry(&self, layer: usize, row: usize, col: usize) -> f64 {
        self.weights[layer].data[row][col]
    }

    pub fn bias_entry(&self, layer: usize, index: usize) -> f64 {
        self.biases[layer][index]
    }

    /// Copy of `self` with layer `layer`'s weight replaced.
    pub fn with_weight(&self, layer: usize, weight: Matrix) -> Result<Parameter> {
        self.check_layer(layer)?;
        let mut weights = self.weights.clone();
        weights[layer] = weight;
        Parameter::new(weights, self.biases.clone())
    }

    /// Copy of `self` with layer `layer`'s bias replaced.
    pub fn with_bias(&self, layer: usize, bias: Vec<f64>) -> Result<Parameter> {
        self.check_layer(layer)?;
        let mut biases = self.biases.clone();
        biases[layer] = bias;
        Parameter::new(self.weights.clone(), biases)
    }

    fn check_layer(&self, layer: usize) -> Result<()> {
        if layer >= self.layer_count() {
            return Err(Error::InvalidInput(format!(
                "layer index {layer} out of range for {} layers",
                self.layer_count()
            )));
        }
        Ok(())
    }

    /// `true` when no weight or bias is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(Matrix::is_finite)
            && self.biases.iter().all(|b| b.iter().all(|x| x.is_finite()))
    }

    /// Sum of the squares of every entry.
    pub fn squared_norm(&self) -> f64 {
        self.weights.iter().map(Matrix::squared_norm).sum::<f64>()
            + self.biases.iter().flatten().map(|x| x * x).sum::<f64>()
    }

    fn check_activations(&self, activations: &[Activation]) -> Result<()> {
        if activations.len() != self.layer_count() {
            return Err(Error::Shape(format!(
                "{} activations were supplied for {} layers",
                activations.len(),
                self.layer_count()
            )));
        }
        Ok(())
    }

    /// Forward pass: for each layer `z_i = W_i · a_{i-1} + b_i` and
    /// `a_i = activation_i(z_i)`, with `a_0 = input`.
    pub fn forward(&self, input: &[f64], activations: &[Activation]) -> Result<ForwardPass> {
        if input.len() != self.input_size() {
            return Err(Error::Shape(format!(
                "input has length {} but the first layer expects {}",
                input.len(),
                self.input_size()
            )));
        }
        self.check_activations(activations)?;

        let mut pass = ForwardPass {
            activations: Vec::with_capacity(self.layer_count()),
            pre_activations: Vec::with_capacity(self.layer_count()),
        };
        for (i, activation) in activations.iter().enumerate() {
            let previous: &[f64] = if i == 0 { input } else { &pass.activations[i - 1] };
            let mut z = self.weights[i].mul_vec(previous);
            for (zj, bj) in z.iter_mut().zip(&self.biases[i]) {
                *zj += bj;
            }
            let a = activation.apply(&z);
            pass.pre_activations.push(z);
            pass.activations.push(a);
        }
        Ok(pass)
    }

    /// Final-layer output for `input`.
    pub fn output(&self, input: &[f64], activations: &[Activation]) -> Result<Vec<f64>> {
        let mut pass = self.forward(input, activations)?;
        Ok(pass.activations.pop().unwrap_or_default())
    }

    /// Scalar cost of one `(input, target)` pair.
    pub fn cost(
        &self,
        input: &[f64],
        target: &[f64],
        activations: &[Activation],
        cost: &CostFunction,
    ) -> Result<f64> {
        cost.apply(&self.output(input, activations)?, target)
    }

    /// Gradient of the cost of one pair with respect to every weight and bias,
    /// by reverse accumulation through the layers.
    pub fn cost_gradient(
        &self,
        input: &[f64],
        target: &[f64],
        activations: &[Activation],
        cost: &CostFunction,
    ) -> Result<Parameter> {
        self.cost_and_gradient(input, target, activations, cost)
            .map(|(_, gradient)| gradient)
    }

    /// [`Parameter::cost_gradient`] together with the cost itself, which the
    /// forward pass yields for free.
    pub fn cost_and_gradient(
        &self,
        input: &[f64],
        target: &[f64],
        activations: &[Activation],
        cost: &CostFunction,
    ) -> Result<(f64, Parameter)> {
        let pass = self.forward(input, activations)?;
        let value = cost.apply(pass.output(), target)?;
        // ∂C/∂a_L
        let mut g = cost.derivative(pass.output(), target)?;

        let n = self.layer_count();
        let mut weight_grads = vec![Matrix::default(); n];
        let mut bias_grads = vec![Vec::new(); n];

        for i in (0..n).rev() {
            let jacobian = activations[i]
                .apply_derivative_with_output(&pass.pre_activations[i], &pass.activations[i]);
            // ∂C/∂z_i = J_iᵀ · ∂C/∂a_i
            let bias_grad = jacobian.transpose_mul_vec(&g);
            let previous: &[f64] = if i == 0 { input } else { &pass.activations[i - 1] };
            weight_grads[i] = Matrix::outer(&bias_grad, previous);
            if i > 0 {
                // ∂C/∂a_{i-1} = W_iᵀ · ∂C/∂z_i = (J_i · W_i)ᵀ · ∂C/∂a_i
                g = self.weights[i].transpose_mul_vec(&bias_grad);
            }
            bias_grads[i] = bias_grad;
        }

        Ok((value, Parameter { weights: weight_grads, biases: bias_grads }))
    }

    /// Central-difference estimate of [`Parameter::cost_gradient`]:
    /// `(C(θ + ε·e) - C(θ - ε·e)) / 2ε` for every basis direction `e`.
    ///
    /// Costs two forward passes per entry; meant as a correctness oracle.
    pub fn numeric_cost_gradient(
        &self,
        input: &[f64],
        target: &[f64],
        activations: &[Activation],
        cost: &CostFunction,
        epsilon: f64,
    ) -> Result<Parameter> {
        let mut probe = self.clone();
        let mut gradient = self.zeros_like();

        for layer in 0..self.layer_count() {
            for row in 0..self.weights[layer].rows {
                for col in 0..self.weights[layer].cols {
                    let original = self.weights[layer].data[row][col];
                    probe.weights[layer].data[row][col] = original + epsilon;
                    let plus = probe.cost(input, target, activations, cost)?;
                    probe.weights[layer].data[row][col] = original - epsilon;
                    let minus = probe.cost(input, target, activations, cost)?;
                    probe.weights[layer].data[row][col] = original;
                    gradient.weights[layer].data[row][col] = (plus - minus) / (2.0 * epsilon);
                }
            }
            for index in 0..self.biases[layer].len() {
                let original = self.biases[layer][index];
                probe.biases[layer][index] = original + epsilon;
                let plus = probe.cost(input, target, activations, cost)?;
                probe.biases[layer][index] = original - epsilon;
                let minus = probe.cost(input, target, activations, cost)?;
                probe.biases[layer][index] = original;
                gradient.biases[layer][index] = (plus - minus) / (2.0 * epsilon);
            }
        }
        Ok(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_layer() -> Parameter {
        Parameter::new(
            vec![
                Matrix::from_rows(vec![vec![1.0, -1.0], vec![0.5, 2.0], vec![0.0, 1.0]]).unwrap(),
                Matrix::from_rows(vec![vec![1.0, 1.0, 1.0]]).unwrap(),
            ],
            vec![vec![0.0, 0.25, -0.5], vec![0.5]],
        )
        .unwrap()
    }

    #[test]
    fn derived_attributes() {
        let p = two_layer();
        assert_eq!(p.layer_count(), 2);
        assert_eq!(p.layer_sizes(), vec![2, 3, 1]);
        assert_eq!(p.entries_count(), 6 + 3 + 3 + 1);
    }

    #[test]
    fn rejects_bias_that_disagrees_with_weight_rows() {
        let err = Parameter::new(vec![Matrix::zeros(3, 2)], vec![vec![0.0; 2]]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn rejects_weight_and_bias_count_mismatch() {
        let err = Parameter::new(vec![Matrix::zeros(3, 2), Matrix::zeros(1, 3)], vec![vec![0.0; 3]])
            .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn rejects_layers_that_do_not_chain() {
        let err = Parameter::new(
            vec![Matrix::zeros(3, 2), Matrix::zeros(1, 4)],
            vec![vec![0.0; 3], vec![0.0; 1]],
        )
        .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn forward_pass_computes_affine_then_activation() {
        let p = two_layer();
        let activations = [Activation::relu(), Activation::Identity];
        let pass = p.forward(&[1.0, 2.0], &activations).unwrap();
        assert_eq!(pass.pre_activations[0], vec![-1.0, 4.75, 1.5]);
        assert_eq!(pass.activations[0], vec![0.0, 4.75, 1.5]);
        assert_eq!(pass.output(), &[6.75]);
    }

    #[test]
    fn forward_rejects_wrong_input_length_and_activation_count() {
        let p = two_layer();
        assert!(p.forward(&[1.0], &[Activation::Tanh, Activation::Tanh]).unwrap_err().is_shape());
        assert!(p.forward(&[1.0, 2.0], &[Activation::Tanh]).unwrap_err().is_shape());
    }

    #[test]
    fn analytic_gradient_matches_oracle() {
        let p = two_layer();
        let activations = [Activation::Tanh, Activation::Sigmoid];
        let (input, target) = ([0.3, -0.7], [0.25]);
        let analytic = p.cost_gradient(&input, &target, &activations, &CostFunction::Mse).unwrap();
        let numeric = p
            .numeric_cost_gradient(&input, &target, &activations, &CostFunction::Mse, 1e-7)
            .unwrap();
        assert_eq!(analytic.layer_sizes(), p.layer_sizes());
        for layer in 0..p.layer_count() {
            for (a, n) in analytic.weights[layer].entries().zip(numeric.weights[layer].entries()) {
                assert_abs_diff_eq!(a, n, epsilon = 1e-6);
            }
            for (a, n) in analytic.biases[layer].iter().zip(&numeric.biases[layer]) {
                assert_abs_diff_eq!(*a, *n, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn is_finite_catches_nan_bias() {
        let mut p = two_layer();
        assert!(p.is_finite());
        p.biases[1][0] = f64::INFINITY;
        assert!(!p.is_finite());
    }

    #[test]
    fn with_weight_checks_shape() {
        let p = two_layer();
        assert!(p.with_weight(1, Matrix::zeros(2, 3)).unwrap_err().is_shape());
        let replaced = p.with_weight(1, Matrix::zeros(1, 3)).unwrap();
        assert_eq!(replaced.weight_entry(1, 0, 2), 0.0);
        assert_eq!(p.weight_entry(1, 0, 2), 1.0);
    }
}

/// Categorical cross-entropy loss, usually paired with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-8;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted` — probabilities, shape [n_classes]
    /// `expected`  — one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted
            .iter()
            .zip(expected)
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient w.r.t. the predicted probabilities:
    ///   ∂L/∂p_i = -expected[i] / (predicted[i] + eps)
    ///
    /// The Softmax Jacobian is applied separately by the backward pass, so
    /// this is the exact derivative of `loss` rather than the fused
    /// `predicted - expected` shortcut.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted
            .iter()
            .zip(expected)
            .map(|(p, e)| -e / (p + EPS))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn only_the_target_class_contributes() {
        let loss = CrossEntropyLoss::loss(&[0.25, 0.5, 0.25], &[0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(loss, -(0.5 + EPS).ln(), epsilon = 1e-15);
        let grad = CrossEntropyLoss::derivative(&[0.25, 0.5, 0.25], &[0.0, 1.0, 0.0]);
        assert_eq!(grad[0], 0.0);
        assert_abs_diff_eq!(grad[1], -1.0 / (0.5 + EPS), epsilon = 1e-15);
    }

    #[test]
    fn zero_probability_stays_finite() {
        assert!(CrossEntropyLoss::loss(&[0.0, 1.0], &[1.0, 0.0]).is_finite());
        assert!(CrossEntropyLoss::derivative(&[0.0, 1.0], &[1.0, 0.0]).iter().all(|g| g.is_finite()));
    }
}

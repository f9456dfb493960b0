/// Mean-squared error, usually paired with an Identity output layer.
pub struct MseLoss;

impl MseLoss {
    /// `C = (1/n)·Σ (p_i - y_i)²`
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted
            .iter()
            .zip(expected)
            .map(|(p, y)| (p - y).powi(2))
            .sum::<f64>()
            / n
    }

    /// `∂C/∂p_i = 2·(p_i - y_i) / n`, the exact derivative of [`MseLoss::loss`].
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let scale = 2.0 / predicted.len() as f64;
        predicted
            .iter()
            .zip(expected)
            .map(|(p, y)| scale * (p - y))
            .collect()
    }
}

pub struct HuberLoss {
    /// Errors larger than this in magnitude are penalised linearly.
    pub delta: f64,
}

impl HuberLoss {
    pub fn new(delta: f64) -> HuberLoss {
        HuberLoss { delta }
    }

    /// Scalar Huber: mean(h(predicted − expected))
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    pub fn loss(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let x = p - y;
                if x.abs() <= self.delta {
                    0.5 * x * x
                } else {
                    self.delta * (x.abs() - 0.5 * self.delta)
                }
            })
            .sum::<f64>() / n
    }

    /// Per-output gradient: x / n  if |x| ≤ δ,  else δ·sign(x) / n
    pub fn derivative(&self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let x = p - y;
                if x.abs() <= self.delta { x / n } else { self.delta * x.signum() / n }
            })
            .collect()
    }
}

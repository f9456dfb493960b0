use rayon::prelude::*;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::loss::CostFunction;
use crate::parameter::Parameter;
use crate::train::TrainingPair;

/// Average cost gradient over a batch, together with the batch's average cost.
#[derive(Debug, Clone)]
pub struct BatchGradient {
    pub gradient: Parameter,
    pub cost: f64,
}

fn check_batch(batch: &[TrainingPair]) -> Result<()> {
    if batch.is_empty() {
        return Err(Error::InvalidInput("cannot average the gradient of an empty batch".to_owned()));
    }
    Ok(())
}

/// Sums the gradients and costs of every pair in `segment` into one
/// zero-initialised accumulator.
fn accumulate(
    param: &Parameter,
    segment: &[TrainingPair],
    activations: &[Activation],
    cost: &CostFunction,
) -> Result<(Parameter, f64)> {
    let mut total = param.zeros_like();
    let mut total_cost = 0.0;
    for (input, target) in segment {
        let (c, gradient) = param.cost_and_gradient(input, target, activations, cost)?;
        total.add_assign_param(&gradient)?;
        total_cost += c;
    }
    Ok((total, total_cost))
}

/// Serial average over `batch`. Fails on an empty batch.
pub fn average_gradient(
    param: &Parameter,
    batch: &[TrainingPair],
    activations: &[Activation],
    cost: &CostFunction,
) -> Result<BatchGradient> {
    check_batch(batch)?;
    let (mut gradient, total_cost) = accumulate(param, batch, activations, cost)?;
    let n = batch.len() as f64;
    gradient.div_scalar_in_place(n)?;
    Ok(BatchGradient { gradient, cost: total_cost / n })
}

/// Parallel average over `batch`.
///
/// The batch is split into one contiguous segment per rayon worker (never
/// more segments than pairs). Each segment is averaged into its own
/// accumulator, and the segment averages are then combined weighted by
/// segment length, so the result equals [`average_gradient`] up to float
/// summation order.
pub fn average_gradient_parallel(
    param: &Parameter,
    batch: &[TrainingPair],
    activations: &[Activation],
    cost: &CostFunction,
) -> Result<BatchGradient> {
    check_batch(batch)?;
    let segments = rayon::current_num_threads().clamp(1, batch.len());
    let segment_len = batch.len().div_ceil(segments);

    let averages = batch
        .par_chunks(segment_len)
        .map(|segment| -> Result<(Parameter, f64, usize)> {
            let (mut sum, cost_sum) = accumulate(param, segment, activations, cost)?;
            let len = segment.len() as f64;
            sum.div_scalar_in_place(len)?;
            Ok((sum, cost_sum / len, segment.len()))
        })
        .collect::<Result<Vec<_>>>()?;

    let n = batch.len() as f64;
    let mut gradient = param.zeros_like();
    let mut average_cost = 0.0;
    for (segment_average, segment_cost, len) in &averages {
        let weight = *len as f64 / n;
        gradient.add_assign_param(&segment_average.scale(weight))?;
        average_cost += segment_cost * weight;
    }
    Ok(BatchGradient { gradient, cost: average_cost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn setup() -> (Parameter, Vec<Activation>, Vec<TrainingPair>) {
        let mut rng = StdRng::seed_from_u64(21);
        let param = Parameter::xavier(&[3, 6, 2], &mut rng).unwrap();
        let batch = (0..37)
            .map(|_| {
                let input: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.0..1.0)).collect();
                let target: Vec<f64> = (0..2).map(|_| rng.gen_range(-1.0..1.0)).collect();
                (input, target)
            })
            .collect();
        (param, vec![Activation::Tanh, Activation::Identity], batch)
    }

    #[test]
    fn empty_batch_is_invalid_input() {
        let (param, activations, _) = setup();
        for result in [
            average_gradient(&param, &[], &activations, &CostFunction::Mse),
            average_gradient_parallel(&param, &[], &activations, &CostFunction::Mse),
        ] {
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn single_pair_average_is_its_gradient() {
        let (param, activations, batch) = setup();
        let (input, target) = &batch[0];
        let expected = param.cost_gradient(input, target, &activations, &CostFunction::Mse).unwrap();
        let averaged = average_gradient(&param, &batch[..1], &activations, &CostFunction::Mse).unwrap();
        assert_eq!(averaged.gradient, expected);
    }

    #[test]
    fn serial_and_parallel_agree() {
        let (param, activations, batch) = setup();
        let serial = average_gradient(&param, &batch, &activations, &CostFunction::Mse).unwrap();
        let parallel = average_gradient_parallel(&param, &batch, &activations, &CostFunction::Mse).unwrap();
        assert_relative_eq!(serial.cost, parallel.cost, max_relative = 1e-12);
        let difference = serial.gradient.try_sub(&parallel.gradient).unwrap();
        assert!(difference.squared_norm().sqrt() <= 1e-12 * serial.gradient.squared_norm().sqrt().max(1.0));
    }
}

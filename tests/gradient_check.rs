use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use netlearn::{Activation, CostFunction, Parameter};

const EPSILON: f64 = 1e-7;
const TOLERANCE: f64 = 1e-6;

fn random_vec(len: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// A target on the probability simplex, for cross-entropy.
fn one_hot(len: usize, hot: usize) -> Vec<f64> {
    (0..len).map(|i| if i == hot { 1.0 } else { 0.0 }).collect()
}

fn check(sizes: &[usize], activations: &[Activation], cost: CostFunction, target: Vec<f64>, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let param = Parameter::normal(sizes, &mut rng).unwrap().scale(0.5);
    let input = random_vec(sizes[0], &mut rng);

    let analytic = param.cost_gradient(&input, &target, activations, &cost).unwrap();
    let numeric = param
        .numeric_cost_gradient(&input, &target, activations, &cost, EPSILON)
        .unwrap();
    assert_eq!(analytic.layer_sizes(), param.layer_sizes());

    for layer in 0..param.layer_count() {
        let w = param.weight(layer);
        for row in 0..w.rows {
            for col in 0..w.cols {
                assert_abs_diff_eq!(
                    analytic.weight_entry(layer, row, col),
                    numeric.weight_entry(layer, row, col),
                    epsilon = TOLERANCE
                );
            }
            assert_abs_diff_eq!(
                analytic.bias_entry(layer, row),
                numeric.bias_entry(layer, row),
                epsilon = TOLERANCE
            );
        }
    }
}

#[test]
fn single_identity_layer_with_mse() {
    let mut rng = StdRng::seed_from_u64(100);
    let target = random_vec(2, &mut rng);
    check(&[3, 2], &[Activation::Identity], CostFunction::Mse, target, 1);
}

#[test]
fn single_softmax_layer_with_cross_entropy() {
    check(&[4, 3], &[Activation::Softmax], CostFunction::CrossEntropy, one_hot(3, 1), 2);
}

#[test]
fn two_layers_tanh_sigmoid_with_huber() {
    let target = vec![0.9, -0.4];
    check(
        &[3, 5, 2],
        &[Activation::Tanh, Activation::Sigmoid],
        CostFunction::Huber { outlier_boundary: 0.3 },
        target,
        3,
    );
}

#[test]
fn two_layers_relu_identity_with_mse() {
    let mut rng = StdRng::seed_from_u64(101);
    let target = random_vec(1, &mut rng);
    check(&[2, 6, 1], &[Activation::relu(), Activation::Identity], CostFunction::Mse, target, 4);
}

#[test]
fn deep_leaky_relu_tanh_softmax_with_cross_entropy() {
    check(
        &[4, 5, 6, 3, 3],
        &[
            Activation::leaky_relu(0.1),
            Activation::Tanh,
            Activation::leaky_relu(0.01),
            Activation::Softmax,
        ],
        CostFunction::CrossEntropy,
        one_hot(3, 2),
        5,
    );
}

#[test]
fn deep_mixed_activations_with_mse() {
    let mut rng = StdRng::seed_from_u64(102);
    let target = random_vec(2, &mut rng);
    check(
        &[3, 4, 4, 4, 2],
        &[
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Identity,
            Activation::Tanh,
        ],
        CostFunction::Mse,
        target,
        6,
    );
}

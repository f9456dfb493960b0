use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use netlearn::{
    Activation, Adam, CostFunction, Error, FitConfig, GradientDescender, NeuralNet, Parameter, Sgd,
    TrainingPair,
};

fn pairs(n: usize, rng: &mut StdRng) -> Vec<TrainingPair> {
    (0..n)
        .map(|_| {
            let x: f64 = rng.gen_range(-1.0..1.0);
            (vec![x, x * 0.5], vec![x.sin()])
        })
        .collect()
}

fn trained_adam_net() -> (NeuralNet, Vec<TrainingPair>) {
    let mut rng = StdRng::seed_from_u64(200);
    let data = pairs(64, &mut rng);
    let mut net = NeuralNet::optimised_for_tanh(
        2,
        &[(5, Activation::Tanh), (3, Activation::leaky_relu(0.05)), (1, Activation::Identity)],
        CostFunction::Mse,
        Adam::new(0.01).unwrap().into(),
        &mut rng,
    )
    .unwrap();
    net.fit(&data, &FitConfig::new(3, 16).with_seed(1)).unwrap();
    (net, data)
}

#[test]
fn network_round_trip_is_exact() {
    let (net, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();
    let read = NeuralNet::read_from_dir(dir.path()).unwrap();
    assert_eq!(read, net);
}

#[test]
fn adam_state_survives_round_trip() {
    let (net, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();
    let read = NeuralNet::read_from_dir(dir.path()).unwrap();

    match (net.descender(), read.descender()) {
        (GradientDescender::Adam(a, sa), GradientDescender::Adam(b, sb)) => {
            assert_eq!(a, b);
            // 64 pairs / batch 16 * 3 epochs
            assert_eq!(sa.step, 12);
            assert_eq!(sb.step, sa.step);
            assert_eq!(sb.momentum, sa.momentum);
            assert_eq!(sb.variance, sa.variance);
        }
        other => panic!("expected two adam descenders, got {other:?}"),
    }
}

#[test]
fn resumed_training_matches_uninterrupted_training() {
    let (net, data) = trained_adam_net();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();

    let config = FitConfig::new(2, 16).with_seed(9).with_parallel(false);
    let mut continued = net.clone();
    continued.fit(&data, &config).unwrap();
    let mut resumed = NeuralNet::read_from_dir(dir.path()).unwrap();
    resumed.fit(&data, &config).unwrap();

    assert_eq!(resumed, continued);
}

#[test]
fn many_layers_keep_their_order() {
    let mut rng = StdRng::seed_from_u64(201);
    let sizes: Vec<usize> = vec![2, 3, 4, 5, 6, 5, 4, 3, 2, 3, 4, 2, 1];
    let layers: Vec<(usize, Activation)> = sizes[1..].iter().map(|&s| (s, Activation::Tanh)).collect();
    let net = NeuralNet::optimised_for_tanh(
        sizes[0],
        &layers,
        CostFunction::Mse,
        Sgd::new(0.1).unwrap().into(),
        &mut rng,
    )
    .unwrap();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();
    let read = NeuralNet::read_from_dir(dir.path()).unwrap();
    assert_eq!(read.layer_sizes(), sizes);
    assert_eq!(read, net);
}

#[test]
fn parameter_round_trip_preserves_every_bit() {
    let mut rng = StdRng::seed_from_u64(202);
    let param = Parameter::normal(&[4, 7, 3], &mut rng).unwrap().scale(1.0 / 3.0);
    let dir = tempdir().unwrap();
    param.write_to_dir(dir.path()).unwrap();
    let read = Parameter::read_from_dir(dir.path()).unwrap();
    for layer in 0..param.layer_count() {
        for (a, b) in param.weight(layer).entries().zip(read.weight(layer).entries()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}

#[test]
fn corrupt_weight_file_fails_with_its_path() {
    let (net, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();
    let weight = dir.path().join("parameters").join("weight 2.csv");
    std::fs::write(&weight, "1.0\tnot-a-number\n").unwrap();
    match NeuralNet::read_from_dir(dir.path()) {
        Err(Error::Format { path, .. }) => assert_eq!(path, weight),
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn missing_cost_file_is_not_found() {
    let (net, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    net.write_to_dir(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join("cost.txt")).unwrap();
    assert!(matches!(NeuralNet::read_from_dir(dir.path()), Err(Error::NotFound(_))));
}

#[test]
fn saving_over_a_larger_trained_network_leaves_nothing_behind() {
    let (trained, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    trained.write_to_dir(dir.path()).unwrap();

    let mut rng = StdRng::seed_from_u64(203);
    let fresh = NeuralNet::optimised_for_tanh(
        2,
        &[(4, Activation::Tanh), (1, Activation::Identity)],
        CostFunction::Mse,
        Adam::new(0.01).unwrap().into(),
        &mut rng,
    )
    .unwrap();
    fresh.write_to_dir(dir.path()).unwrap();

    let read = NeuralNet::read_from_dir(dir.path()).unwrap();
    assert_eq!(read.layer_sizes(), vec![2, 4, 1]);
    assert_eq!(read, fresh);
    assert!(!dir.path().join("activations").join("activation 3").exists());
    assert!(!dir.path().join("gradient-descender").join("momentum").exists());
}

#[test]
fn sgd_network_replaces_adam_network() {
    let (trained, _) = trained_adam_net();
    let dir = tempdir().unwrap();
    trained.write_to_dir(dir.path()).unwrap();

    let mut rng = StdRng::seed_from_u64(204);
    let sgd = NeuralNet::optimised_for_tanh(
        2,
        &[(5, Activation::Tanh), (3, Activation::Tanh), (1, Activation::Identity)],
        CostFunction::Mse,
        Sgd::new(0.05).unwrap().into(),
        &mut rng,
    )
    .unwrap();
    sgd.write_to_dir(dir.path()).unwrap();

    assert_eq!(NeuralNet::read_from_dir(dir.path()).unwrap(), sgd);
    assert!(!dir.path().join("gradient-descender").join("variance").exists());
}

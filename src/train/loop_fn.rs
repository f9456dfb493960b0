use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::network::NeuralNet;
use crate::train::epoch_stats::{EpochStats, FitReport};
use crate::train::train_config::FitConfig;
use crate::train::TrainingPair;

/// Trains `net` on `pairs` for `config.epochs` epochs.
///
/// Every epoch shuffles the whole training set, walks it in consecutive
/// batches of `config.batch_size` (the last one may be smaller) and takes one
/// descent step per batch. The first error, numeric instability included,
/// aborts the run.
pub fn fit_loop(
    net: &mut NeuralNet,
    pairs: &[TrainingPair],
    validation: Option<&[TrainingPair]>,
    config: &FitConfig,
) -> Result<FitReport> {
    config.validate()?;
    if pairs.is_empty() {
        return Err(Error::InvalidInput("cannot fit on an empty training set".to_owned()));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut shuffled = pairs.to_vec();
    let mut report = FitReport::default();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let train_cost = run_one_epoch(net, &mut shuffled, &mut rng, config)?;

        let val_cost = match validation {
            Some(validation) => Some(net.average_cost(validation)?),
            None => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_cost,
            val_cost,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        match val_cost {
            Some(val_cost) => info!(epoch, total = config.epochs, train_cost, val_cost, "epoch done"),
            None => info!(epoch, total = config.epochs, train_cost, "epoch done"),
        }

        if let Some(ref tx) = config.progress_tx {
            if tx.send(stats.clone()).is_err() {
                debug!("progress receiver dropped");
            }
        }
        report.history.push(stats);
    }

    Ok(report)
}

/// One shuffled pass over `pairs`. Returns the mean pre-step cost per pair.
fn run_one_epoch(
    net: &mut NeuralNet,
    pairs: &mut [TrainingPair],
    rng: &mut StdRng,
    config: &FitConfig,
) -> Result<f64> {
    pairs.shuffle(rng);

    let mut total_cost = 0.0;
    for batch in pairs.chunks(config.batch_size) {
        let batch_cost = net.descent_step(batch, config.parallel)?;
        total_cost += batch_cost * batch.len() as f64;
    }
    Ok(total_cost / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::loss::CostFunction;
    use crate::optim::Sgd;
    use crate::parameter::Parameter;
    use std::sync::mpsc;

    fn linear_net() -> NeuralNet {
        NeuralNet::new(
            Parameter::zero(&[1, 1]).unwrap(),
            vec![Activation::Identity],
            CostFunction::Mse,
            Sgd::new(0.1).unwrap().into(),
        )
        .unwrap()
    }

    fn line(n: usize) -> Vec<TrainingPair> {
        (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                (vec![x], vec![3.0 * x - 1.0])
            })
            .collect()
    }

    #[test]
    fn learns_a_line() {
        let mut net = linear_net();
        let config = FitConfig::new(200, 4).with_seed(1).with_parallel(false);
        let report = net.fit(&line(16), &config).unwrap();
        assert_eq!(report.history.len(), 200);
        assert!(report.final_train_cost().unwrap() < 1e-3);
        assert!((net.parameter().weight_entry(0, 0, 0) - 3.0).abs() < 0.1);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let config = FitConfig::new(5, 3).with_seed(7).with_parallel(false);
        let mut a = linear_net();
        let mut b = linear_net();
        a.fit(&line(10), &config).unwrap();
        b.fit(&line(10), &config).unwrap();
        assert_eq!(a.parameter(), b.parameter());
    }

    #[test]
    fn sends_one_stats_per_epoch() {
        let (tx, rx) = mpsc::channel();
        let config = FitConfig::new(3, 5).with_seed(2).with_progress(tx);
        let mut net = linear_net();
        net.fit_with_validation(&line(12), &line(4), &config).unwrap();
        let stats: Vec<EpochStats> = rx.try_iter().collect();
        assert_eq!(stats.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(stats.iter().all(|s| s.total_epochs == 3 && s.val_cost.is_some()));
    }

    #[test]
    fn rejects_degenerate_configs() {
        let mut net = linear_net();
        assert!(matches!(net.fit(&line(4), &FitConfig::new(0, 2)), Err(Error::InvalidInput(_))));
        assert!(matches!(net.fit(&line(4), &FitConfig::new(1, 0)), Err(Error::InvalidInput(_))));
        assert!(matches!(net.fit(&[], &FitConfig::new(1, 2)), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn huge_learning_rate_stops_with_numeric_instability() {
        let mut net = NeuralNet::new(
            Parameter::zero(&[1, 1]).unwrap(),
            vec![Activation::Identity],
            CostFunction::Mse,
            Sgd::new(1e10).unwrap().into(),
        )
        .unwrap();
        let err = net.fit(&line(8), &FitConfig::new(50, 2).with_seed(3)).unwrap_err();
        assert!(err.is_numeric_instability());
    }
}

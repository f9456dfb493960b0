//! netlearn CLI
//!
//! Trains, evaluates and describes fully-connected networks on the synthetic
//! `(x, x²)` regression task.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use netlearn::network::{LayerSpec, OptimizerSpec};
use netlearn::{Activation, Adam, FitConfig, NetSpec, NeuralNet, TrainingPair};

#[derive(Parser)]
#[command(name = "netlearn")]
#[command(about = "Feed-forward network trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Level {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network to fit y = x² on x drawn from [-50, 50]
    Train {
        /// JSON network spec, used instead of --hidden and --learning-rate
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Continue training a network saved in this directory
        #[arg(long, conflicts_with = "spec")]
        resume: Option<PathBuf>,

        /// Directory the trained network is written to
        #[arg(short, long, default_value = "trained_models/square")]
        out: PathBuf,

        /// Hidden layer sizes (comma separated), each followed by a ReLU
        #[arg(long, value_delimiter = ',', default_value = "8,8", conflicts_with_all = ["resume", "spec"])]
        hidden: Vec<usize>,

        /// Adam learning rate
        #[arg(long, default_value = "0.001", conflicts_with_all = ["resume", "spec"])]
        learning_rate: f64,

        #[arg(short, long, default_value = "100")]
        epochs: usize,

        #[arg(short, long, default_value = "40")]
        batch_size: usize,

        /// Number of training pairs
        #[arg(long, default_value = "4000")]
        samples: usize,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Average batch gradients on one thread
        #[arg(long)]
        serial: bool,
    },

    /// Report the average cost of a saved network on fresh samples
    Eval {
        /// Directory of a saved network
        dir: PathBuf,

        #[arg(long, default_value = "1000")]
        samples: usize,

        #[arg(long, default_value = "7")]
        seed: u64,
    },

    /// Write the default network spec as JSON
    Spec {
        #[arg(short, long, default_value = "square.json")]
        out: PathBuf,
    },
}

fn square_pairs(n: usize, rng: &mut StdRng) -> Vec<TrainingPair> {
    (0..n)
        .map(|_| {
            let x: f64 = rng.gen_range(-50.0..=50.0);
            (vec![x], vec![x * x])
        })
        .collect()
}

fn default_spec(hidden: &[usize], learning_rate: f64) -> NetSpec {
    let mut layers: Vec<LayerSpec> = hidden
        .iter()
        .map(|&size| LayerSpec { size, activation: Activation::relu() })
        .collect();
    layers.push(LayerSpec { size: 1, activation: Activation::Identity });
    NetSpec {
        layers,
        optimizer: OptimizerSpec::Adam(Adam { learning_rate, ..Adam::default() }),
        ..NetSpec::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let subscriber = FmtSubscriber::builder().with_max_level(Level::from(cli.log_level)).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train {
            spec,
            resume,
            out,
            hidden,
            learning_rate,
            epochs,
            batch_size,
            samples,
            seed,
            serial,
        } => {
            if samples == 0 {
                bail!("--samples must be at least 1");
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let train = square_pairs(samples, &mut rng);
            let test = square_pairs((samples / 5).max(1), &mut rng);

            let mut net = match (resume, spec) {
                (Some(dir), _) => NeuralNet::read_from_dir(&dir)?,
                (None, Some(path)) => NetSpec::load_json(&path)?.build(&train, &mut rng)?,
                (None, None) => default_spec(&hidden, learning_rate).build(&train, &mut rng)?,
            };
            info!(layers = ?net.layer_sizes(), epochs, batch_size, samples, "training");

            let initial = net.average_cost(&test)?;
            let config = FitConfig::new(epochs, batch_size)
                .with_parallel(!serial)
                .with_seed(seed);
            let report = net.fit_with_validation(&train, &test, &config)?;
            let total_ms: u64 = report.history.iter().map(|s| s.elapsed_ms).sum();

            println!("test cost: {initial:.3} -> {:.3}", report.final_val_cost().unwrap_or(initial));
            println!("training took {:.1}s", total_ms as f64 / 1000.0);

            net.write_to_dir(&out)?;
            println!("saved to {}", out.display());
        }

        Commands::Eval { dir, samples, seed } => {
            if samples == 0 {
                bail!("--samples must be at least 1");
            }
            let net = NeuralNet::read_from_dir(&dir)?;
            let mut rng = StdRng::seed_from_u64(seed);
            let test = square_pairs(samples, &mut rng);
            let cost = net.average_cost(&test)?;
            println!("average cost over {samples} samples: {cost:.4}");
            for x in [-40.0, -10.0, 0.0, 5.0, 30.0] {
                let y = net.output(&[x])?;
                println!("  f({x:>6.1}) = {:>10.3}   (x² = {:>8.1})", y[0], x * x);
            }
        }

        Commands::Spec { out } => {
            NetSpec::default().save_json(&out)?;
            println!("wrote {}", out.display());
        }
    }

    Ok(())
}

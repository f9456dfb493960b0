use rand::Rng;
use tracing::debug;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::loss::CostFunction;
use crate::optim::{ensure_finite, GradientDescender};
use crate::parameter::Parameter;
use crate::train::gradient::{self, BatchGradient};
use crate::train::{fit_loop, FitConfig, FitReport, TrainingPair};

/// A trainable fully-connected network: parameters, one activation per layer,
/// the cost it is trained against and the optimizer that trains it.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNet {
    pub(crate) parameter: Parameter,
    pub(crate) activations: Vec<Activation>,
    pub(crate) cost: CostFunction,
    pub(crate) descender: GradientDescender,
}

impl NeuralNet {
    pub fn new(
        parameter: Parameter,
        activations: Vec<Activation>,
        cost: CostFunction,
        descender: GradientDescender,
    ) -> Result<NeuralNet> {
        if activations.len() != parameter.layer_count() {
            return Err(Error::Shape(format!(
                "{} activations were supplied for {} layers",
                activations.len(),
                parameter.layer_count()
            )));
        }
        for activation in &activations {
            activation.validate()?;
        }
        cost.validate()?;
        descender.validate()?;
        Ok(NeuralNet { parameter, activations, cost, descender })
    }

    /// Xavier-initialised network; suits Tanh hidden layers.
    ///
    /// `layers` lists each layer's output size and activation.
    pub fn optimised_for_tanh<R: Rng>(
        input_size: usize,
        layers: &[(usize, Activation)],
        cost: CostFunction,
        descender: GradientDescender,
        rng: &mut R,
    ) -> Result<NeuralNet> {
        let parameter = Parameter::xavier(&layer_sizes(input_size, layers), rng)?;
        NeuralNet::new(parameter, layer_activations(layers), cost, descender)
    }

    /// Kaiming-initialised network; suits ReLU hidden layers.
    pub fn optimised_for_relu<R: Rng>(
        input_size: usize,
        layers: &[(usize, Activation)],
        cost: CostFunction,
        descender: GradientDescender,
        rng: &mut R,
    ) -> Result<NeuralNet> {
        let parameter = Parameter::kaiming(&layer_sizes(input_size, layers), rng)?;
        NeuralNet::new(parameter, layer_activations(layers), cost, descender)
    }

    /// LSUV-initialised network, tuned to the inputs of `training_data`.
    pub fn optimised_for_training_data<R: Rng>(
        input_size: usize,
        layers: &[(usize, Activation)],
        training_data: &[TrainingPair],
        cost: CostFunction,
        descender: GradientDescender,
        rng: &mut R,
    ) -> Result<NeuralNet> {
        let activations = layer_activations(layers);
        let inputs: Vec<Vec<f64>> = training_data.iter().map(|(input, _)| input.clone()).collect();
        let parameter = Parameter::lsuv(&layer_sizes(input_size, layers), &activations, &inputs, rng)?;
        NeuralNet::new(parameter, activations, cost, descender)
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    pub fn cost_function(&self) -> &CostFunction {
        &self.cost
    }

    pub fn descender(&self) -> &GradientDescender {
        &self.descender
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.parameter.layer_sizes()
    }

    /// Final-layer output for `input`.
    pub fn output(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.parameter.output(input, &self.activations)
    }

    /// Mean cost over `pairs`, for monitoring. Fails on an empty set.
    pub fn average_cost(&self, pairs: &[TrainingPair]) -> Result<f64> {
        if pairs.is_empty() {
            return Err(Error::InvalidInput("cannot average the cost of an empty set".to_owned()));
        }
        let mut total = 0.0;
        for (input, target) in pairs {
            total += self.parameter.cost(input, target, &self.activations, &self.cost)?;
        }
        Ok(total / pairs.len() as f64)
    }

    pub fn average_gradient(&self, batch: &[TrainingPair]) -> Result<Parameter> {
        gradient::average_gradient(&self.parameter, batch, &self.activations, &self.cost)
            .map(|b| b.gradient)
    }

    pub fn average_gradient_parallel(&self, batch: &[TrainingPair]) -> Result<Parameter> {
        gradient::average_gradient_parallel(&self.parameter, batch, &self.activations, &self.cost)
            .map(|b| b.gradient)
    }

    /// One optimizer step on `batch`. Returns the batch's average cost as
    /// measured before the step. On error neither the parameter nor the
    /// optimizer state changes.
    pub fn descent_step(&mut self, batch: &[TrainingPair], parallel: bool) -> Result<f64> {
        let BatchGradient { gradient, cost } = if parallel {
            gradient::average_gradient_parallel(&self.parameter, batch, &self.activations, &self.cost)?
        } else {
            gradient::average_gradient(&self.parameter, batch, &self.activations, &self.cost)?
        };
        ensure_finite(&gradient, "gradient")?;

        let mut descender = self.descender.clone();
        let delta = descender.step(&gradient)?;
        let parameter = self.parameter.try_add(&delta)?;
        ensure_finite(&parameter, "parameter")?;
        self.parameter = parameter;
        self.descender = descender;

        debug!(batch = batch.len(), cost, "descent step");
        Ok(cost)
    }

    /// Trains on `pairs` for `config.epochs` epochs.
    pub fn fit(&mut self, pairs: &[TrainingPair], config: &FitConfig) -> Result<FitReport> {
        fit_loop(self, pairs, None, config)
    }

    /// Like [`NeuralNet::fit`], additionally reporting the average cost over
    /// `validation` after every epoch.
    pub fn fit_with_validation(
        &mut self,
        pairs: &[TrainingPair],
        validation: &[TrainingPair],
        config: &FitConfig,
    ) -> Result<FitReport> {
        fit_loop(self, pairs, Some(validation), config)
    }
}

fn layer_sizes(input_size: usize, layers: &[(usize, Activation)]) -> Vec<usize> {
    std::iter::once(input_size).chain(layers.iter().map(|(size, _)| *size)).collect()
}

fn layer_activations(layers: &[(usize, Activation)]) -> Vec<Activation> {
    layers.iter().map(|(_, activation)| *activation).collect()
}

//! Feed-forward network primitives
//!
//! A minimal sequential stack of dense and dropout layers with
//! backpropagation, an Adam optimizer and mean-squared-error regression
//! training. Inference never applies dropout.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::InsightError;

/// Element-wise activation applied after a dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative expressed in terms of the activation's output
    fn derivative(self, y: f64) -> f64 {
        match self {
            Activation::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => y * (1.0 - y),
        }
    }
}

/// Fully connected layer; weights are stored row-major (one row per unit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    inputs: usize,
    units: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
    activation: Activation,
}

impl Dense {
    /// Glorot-uniform weights, zero biases
    pub fn new<R: Rng>(inputs: usize, units: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + units) as f64).sqrt();
        let weights = (0..inputs * units)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();

        Self {
            inputs,
            units,
            weights,
            biases: vec![0.0; units],
            activation,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .chunks(self.inputs)
            .zip(&self.biases)
            .map(|(row, bias)| {
                let z = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias;
                self.activation.apply(z)
            })
            .collect()
    }

    /// Accumulate parameter gradients and return the gradient w.r.t. the input
    fn backward(
        &self,
        input: &[f64],
        output: &[f64],
        grad_output: &[f64],
        grads: &mut Gradients,
    ) -> Vec<f64> {
        let mut grad_input = vec![0.0; self.inputs];

        for unit in 0..self.units {
            let delta = grad_output[unit] * self.activation.derivative(output[unit]);
            if delta == 0.0 {
                continue;
            }
            grads.biases[unit] += delta;

            let offset = unit * self.inputs;
            let row = &self.weights[offset..offset + self.inputs];
            let grad_row = &mut grads.weights[offset..offset + self.inputs];

            for ((g, gi), (&w, &x)) in grad_row
                .iter_mut()
                .zip(grad_input.iter_mut())
                .zip(row.iter().zip(input))
            {
                *g += delta * x;
                *gi += delta * w;
            }
        }

        grad_input
    }
}

/// A single layer in a sequential stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Dense(Dense),
    /// Inverted dropout; identity at inference time
    Dropout { rate: f64 },
}

/// Accumulated gradients for one layer (empty for parameter-free layers)
#[derive(Debug, Clone, Default)]
struct Gradients {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Gradients {
    fn zeros_like(layer: &Layer) -> Self {
        match layer {
            Layer::Dense(dense) => Self {
                weights: vec![0.0; dense.weights.len()],
                biases: vec![0.0; dense.biases.len()],
            },
            Layer::Dropout { .. } => Self::default(),
        }
    }

    fn reset(&mut self) {
        self.weights.iter_mut().for_each(|g| *g = 0.0);
        self.biases.iter_mut().for_each(|g| *g = 0.0);
    }
}

/// Activations recorded during a training forward pass
struct Trace {
    /// `activations[i]` is the input to layer `i`; the last entry is the output
    activations: Vec<Vec<f64>>,
    masks: Vec<Option<Vec<f64>>>,
}

impl Trace {
    fn output(&self) -> &[f64] {
        self.activations.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Options for [`Sequential::fit`]
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of examples held out from the tail for validation
    pub validation_split: f64,
    /// Log progress every N epochs (0 disables)
    pub log_every: usize,
}

/// Loss and metrics for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Mean squared error on the training portion
    pub loss: f64,
    /// Mean absolute error on the training portion
    pub mae: f64,
    pub val_loss: Option<f64>,
    pub val_mae: Option<f64>,
}

/// Sequential feed-forward network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| match layer {
                Layer::Dense(dense) => dense.parameter_count(),
                Layer::Dropout { .. } => 0,
            })
            .sum()
    }

    /// Number of units produced by the final dense layer
    pub fn output_units(&self) -> usize {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| match layer {
                Layer::Dense(dense) => Some(dense.units),
                Layer::Dropout { .. } => None,
            })
            .unwrap_or(0)
    }

    /// Inference forward pass (dropout disabled)
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.layers
            .iter()
            .fold(input.to_vec(), |x, layer| match layer {
                Layer::Dense(dense) => dense.forward(&x),
                Layer::Dropout { .. } => x,
            })
    }

    /// Mean squared and mean absolute error of the first output unit
    pub fn evaluate<I: AsRef<[f64]>>(&self, inputs: &[I], targets: &[f64]) -> (f64, f64) {
        if inputs.is_empty() {
            return (0.0, 0.0);
        }
        let (sq, abs) = inputs
            .iter()
            .zip(targets)
            .fold((0.0, 0.0), |(sq, abs), (x, &t)| {
                let error = self.predict(x.as_ref()).first().copied().unwrap_or(0.0) - t;
                (sq + error * error, abs + error.abs())
            });
        let n = inputs.len() as f64;
        (sq / n, abs / n)
    }

    fn forward_train<R: Rng>(&self, input: &[f64], rng: &mut R) -> Trace {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut masks = Vec::with_capacity(self.layers.len());
        let mut current = input.to_vec();

        for layer in &self.layers {
            let (next, mask) = match layer {
                Layer::Dense(dense) => (dense.forward(&current), None),
                Layer::Dropout { rate } => {
                    let keep = 1.0 - rate;
                    let mask: Vec<f64> = current
                        .iter()
                        .map(|_| if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 })
                        .collect();
                    let dropped = current.iter().zip(&mask).map(|(x, m)| x * m).collect();
                    (dropped, Some(mask))
                }
            };
            activations.push(std::mem::replace(&mut current, next));
            masks.push(mask);
        }
        activations.push(current);

        Trace { activations, masks }
    }

    fn backward(&self, trace: &Trace, grad_output: Vec<f64>, grads: &mut [Gradients]) {
        let mut grad = grad_output;
        for (i, layer) in self.layers.iter().enumerate().rev() {
            grad = match layer {
                Layer::Dense(dense) => dense.backward(
                    &trace.activations[i],
                    &trace.activations[i + 1],
                    &grad,
                    &mut grads[i],
                ),
                Layer::Dropout { .. } => match &trace.masks[i] {
                    Some(mask) => grad.iter().zip(mask).map(|(g, m)| g * m).collect(),
                    None => grad,
                },
            };
        }
    }

    /// Train a single-output regressor with MSE loss and Adam.
    ///
    /// The last `validation_split` fraction of the examples is held out; the
    /// remainder is shuffled every epoch and consumed in mini-batches.
    pub fn fit<I: AsRef<[f64]>, R: Rng>(
        &mut self,
        inputs: &[I],
        targets: &[f64],
        options: &FitOptions,
        rng: &mut R,
    ) -> Result<Vec<EpochMetrics>, InsightError> {
        if inputs.len() != targets.len() {
            return Err(InsightError::InsufficientData(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if self.output_units() != 1 {
            return Err(InsightError::InvalidConfig(format!(
                "regression needs exactly one output unit, network has {}",
                self.output_units()
            )));
        }
        if options.batch_size == 0 {
            return Err(InsightError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }

        let split_at = (inputs.len() as f64 * (1.0 - options.validation_split)).floor() as usize;
        if split_at == 0 {
            return Err(InsightError::InsufficientData(format!(
                "{} examples leave nothing to train on after a {} validation split",
                inputs.len(),
                options.validation_split
            )));
        }

        let (train_x, val_x) = inputs.split_at(split_at);
        let (train_y, val_y) = targets.split_at(split_at);

        let mut order: Vec<usize> = (0..split_at).collect();
        let mut optimizer = Adam::new(options.learning_rate);
        let mut grads: Vec<Gradients> = self.layers.iter().map(Gradients::zeros_like).collect();
        let mut history = Vec::with_capacity(options.epochs);

        for epoch in 0..options.epochs {
            order.shuffle(rng);

            let mut squared_sum = 0.0;
            let mut absolute_sum = 0.0;

            for batch in order.chunks(options.batch_size) {
                grads.iter_mut().for_each(Gradients::reset);
                let scale = 1.0 / batch.len() as f64;

                for &i in batch {
                    let trace = self.forward_train(train_x[i].as_ref(), rng);
                    let prediction = trace.output().first().copied().unwrap_or(0.0);
                    let error = prediction - train_y[i];

                    squared_sum += error * error;
                    absolute_sum += error.abs();

                    self.backward(&trace, vec![2.0 * error * scale], &mut grads);
                }

                optimizer.step(self, &grads);
            }

            let loss = squared_sum / split_at as f64;
            if !loss.is_finite() {
                return Err(InsightError::InitializationFailure(format!(
                    "training loss diverged at epoch {epoch}"
                )));
            }

            let (val_loss, val_mae) = if val_x.is_empty() {
                (None, None)
            } else {
                let (mse, mae) = self.evaluate(val_x, val_y);
                (Some(mse), Some(mae))
            };

            if options.log_every > 0 && epoch % options.log_every == 0 {
                debug!(
                    "Epoch {}: loss = {:.4}, val_loss = {:.4}",
                    epoch,
                    loss,
                    val_loss.unwrap_or(f64::NAN)
                );
            }

            history.push(EpochMetrics {
                epoch,
                loss,
                mae: absolute_sum / split_at as f64,
                val_loss,
                val_mae,
            });
        }

        Ok(history)
    }
}

/// First and second moment estimates for one layer
#[derive(Debug, Clone, Default)]
struct Moments {
    m_weights: Vec<f64>,
    v_weights: Vec<f64>,
    m_biases: Vec<f64>,
    v_biases: Vec<f64>,
}

impl Moments {
    fn zeros_like(grads: &Gradients) -> Self {
        Self {
            m_weights: vec![0.0; grads.weights.len()],
            v_weights: vec![0.0; grads.weights.len()],
            m_biases: vec![0.0; grads.biases.len()],
            v_biases: vec![0.0; grads.biases.len()],
        }
    }
}

/// Adam optimizer with bias-corrected moment estimates
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            moments: Vec::new(),
        }
    }

    fn step(&mut self, network: &mut Sequential, grads: &[Gradients]) {
        if self.moments.is_empty() {
            self.moments = grads.iter().map(Moments::zeros_like).collect();
        }
        self.step += 1;

        let hyper = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1.powi(self.step),
            correction2: 1.0 - self.beta2.powi(self.step),
        };

        for ((layer, grad), moments) in network
            .layers
            .iter_mut()
            .zip(grads)
            .zip(self.moments.iter_mut())
        {
            if let Layer::Dense(dense) = layer {
                hyper.apply(
                    &mut dense.weights,
                    &grad.weights,
                    &mut moments.m_weights,
                    &mut moments.v_weights,
                );
                hyper.apply(
                    &mut dense.biases,
                    &grad.biases,
                    &mut moments.m_biases,
                    &mut moments.v_biases,
                );
            }
        }
    }
}

/// Per-step constants shared by every parameter update
struct AdamStep {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    correction1: f64,
    correction2: f64,
}

impl AdamStep {
    fn apply(&self, params: &mut [f64], grads: &[f64], m: &mut [f64], v: &mut [f64]) {
        for (((p, &g), m), v) in params.iter_mut().zip(grads).zip(m.iter_mut()).zip(v.iter_mut()) {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / self.correction1;
            let v_hat = *v / self.correction2;
            *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sigmoid_net(rng: &mut StdRng) -> Sequential {
        Sequential::new(vec![
            Layer::Dense(Dense::new(3, 4, Activation::Sigmoid, rng)),
            Layer::Dense(Dense::new(4, 1, Activation::Sigmoid, rng)),
        ])
    }

    fn options(epochs: usize, learning_rate: f64, validation_split: f64) -> FitOptions {
        FitOptions {
            epochs,
            batch_size: 10,
            learning_rate,
            validation_split,
            log_every: 0,
        }
    }

    #[test]
    fn test_activations() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Relu.apply(1.5), 1.5);
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-12);
        assert!(Activation::Sigmoid.apply(-1000.0) >= 0.0);
        assert!(Activation::Sigmoid.apply(1000.0) <= 1.0);
    }

    #[test]
    fn test_glorot_initialization_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let dense = Dense::new(6, 24, Activation::Relu, &mut rng);
        let limit = (6.0_f64 / 30.0).sqrt();

        assert_eq!(dense.parameter_count(), 6 * 24 + 24);
        assert!(dense.weights.iter().all(|w| w.abs() <= limit));
        assert!(dense.biases.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_dropout_is_identity_at_inference() {
        let mut rng = StdRng::seed_from_u64(2);
        let dense = Dense::new(3, 5, Activation::Relu, &mut rng);
        let with_dropout = Sequential::new(vec![
            Layer::Dense(dense.clone()),
            Layer::Dropout { rate: 0.5 },
        ]);
        let without = Sequential::new(vec![Layer::Dense(dense)]);

        let input = [0.3, -0.2, 0.9];
        assert_eq!(with_dropout.predict(&input), without.predict(&input));
        assert_eq!(with_dropout.output_units(), 5);
    }

    #[test]
    fn test_backward_matches_numerical_gradient() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = sigmoid_net(&mut rng);
        let input = [0.4, -0.7, 0.25];
        let target = 0.8;

        let loss = |net: &Sequential| {
            let y = net.predict(&input)[0];
            (y - target) * (y - target)
        };

        let trace = net.forward_train(&input, &mut rng);
        let error = trace.output()[0] - target;
        let mut grads: Vec<Gradients> = net.layers.iter().map(Gradients::zeros_like).collect();
        net.backward(&trace, vec![2.0 * error], &mut grads);

        let eps = 1e-6;
        for layer_idx in 0..2 {
            for w in [0, 2, 3] {
                let analytic = grads[layer_idx].weights[w];

                let original = match &net.layers[layer_idx] {
                    Layer::Dense(d) => d.weights[w],
                    Layer::Dropout { .. } => unreachable!(),
                };
                let set = |net: &mut Sequential, value: f64| {
                    if let Layer::Dense(d) = &mut net.layers[layer_idx] {
                        d.weights[w] = value;
                    }
                };

                set(&mut net, original + eps);
                let plus = loss(&net);
                set(&mut net, original - eps);
                let minus = loss(&net);
                set(&mut net, original);

                let numerical = (plus - minus) / (2.0 * eps);
                assert!(
                    (analytic - numerical).abs() < 1e-6,
                    "layer {layer_idx} weight {w}: analytic {analytic} vs numerical {numerical}"
                );
            }
        }
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut net = Sequential::new(vec![Layer::Dense(Dense::new(
            1,
            1,
            Activation::Sigmoid,
            &mut rng,
        ))]);
        let before = match &net.layers[0] {
            Layer::Dense(d) => d.weights[0],
            Layer::Dropout { .. } => unreachable!(),
        };

        let grads = vec![Gradients {
            weights: vec![0.5],
            biases: vec![-2.0],
        }];
        let mut adam = Adam::new(0.01);
        adam.step(&mut net, &grads);

        match &net.layers[0] {
            Layer::Dense(d) => {
                assert!((d.weights[0] - (before - 0.01)).abs() < 1e-6);
                assert!((d.biases[0] - 0.01).abs() < 1e-6);
            }
            Layer::Dropout { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = sigmoid_net(&mut rng);

        let inputs: Vec<[f64; 3]> = (0..100)
            .map(|_| [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()])
            .collect();
        let targets: Vec<f64> = inputs.iter().map(|x| 0.2 + 0.5 * x[0]).collect();

        let history = net
            .fit(&inputs, &targets, &options(200, 0.01, 0.2), &mut rng)
            .unwrap();

        assert_eq!(history.len(), 200);
        let first = &history[0];
        let last = &history[199];
        assert!(last.loss < first.loss);
        assert!(last.val_loss.unwrap() < first.val_loss.unwrap());
    }

    #[test]
    fn test_fit_without_validation_split() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut net = sigmoid_net(&mut rng);
        let inputs = vec![[0.1, 0.2, 0.3]; 10];
        let targets = vec![0.5; 10];

        let history = net
            .fit(&inputs, &targets, &options(3, 0.001, 0.0), &mut rng)
            .unwrap();
        assert!(history.iter().all(|m| m.val_loss.is_none()));
    }

    #[test]
    fn test_fit_rejects_empty_training_portion() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut net = sigmoid_net(&mut rng);
        let inputs = vec![[0.1, 0.2, 0.3]];

        let result = net.fit(&inputs, &[0.5], &options(1, 0.001, 0.5), &mut rng);
        assert!(matches!(result, Err(InsightError::InsufficientData(_))));
    }

    #[test]
    fn test_fit_rejects_multi_output_network() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut net = Sequential::new(vec![Layer::Dense(Dense::new(
            3,
            2,
            Activation::Sigmoid,
            &mut rng,
        ))]);
        let inputs = vec![[0.1, 0.2, 0.3]; 10];

        let result = net.fit(&inputs, &[0.5; 10], &options(1, 0.001, 0.2), &mut rng);
        assert!(matches!(result, Err(InsightError::InvalidConfig(_))));
    }
}

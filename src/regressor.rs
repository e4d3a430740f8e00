//! Wellness regressor
//!
//! Fixed architecture: 6 inputs → dense(24, ReLU) → dropout(0.2) →
//! dense(12, ReLU) → dense(1, sigmoid). The sigmoid output is scaled to a
//! 0-100 integer score.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{InsightConfig, NormalizationPolicy, TrainingConfig};
use crate::error::InsightError;
use crate::network::{Activation, Dense, EpochMetrics, FitOptions, Layer, Sequential};
use crate::normalizer::FeatureNormalizer;
use crate::synthetic::{to_columns, SyntheticDataGenerator};
use crate::types::{FeatureRecord, TrainingExample, FEATURE_COUNT};

/// Units in the first hidden layer
pub const HIDDEN_UNITS: usize = 24;

/// Units in the second hidden layer
pub const BOTTLENECK_UNITS: usize = 12;

/// Summary of the one-off training pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub examples: usize,
    pub training_examples: usize,
    pub validation_examples: usize,
    pub final_loss: f64,
    pub final_mae: f64,
    pub final_val_loss: Option<f64>,
    pub duration_ms: u64,
    pub history: Vec<EpochMetrics>,
}

/// Feed-forward wellness regressor; trained at most once
#[derive(Debug, Clone)]
pub struct WellnessRegressor {
    network: Sequential,
    normalizer: FeatureNormalizer,
    report: Option<TrainingReport>,
}

impl WellnessRegressor {
    /// Create an untrained regressor with freshly initialized weights
    pub fn new<R: Rng>(dropout_rate: f64, normalization: NormalizationPolicy, rng: &mut R) -> Self {
        let network = Sequential::new(vec![
            Layer::Dense(Dense::new(
                FEATURE_COUNT,
                HIDDEN_UNITS,
                Activation::Relu,
                rng,
            )),
            Layer::Dropout { rate: dropout_rate },
            Layer::Dense(Dense::new(
                HIDDEN_UNITS,
                BOTTLENECK_UNITS,
                Activation::Relu,
                rng,
            )),
            Layer::Dense(Dense::new(BOTTLENECK_UNITS, 1, Activation::Sigmoid, rng)),
        ]);

        Self {
            network,
            normalizer: FeatureNormalizer::new(normalization),
            report: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.report.is_some()
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    pub fn network(&self) -> &Sequential {
        &self.network
    }

    /// Fit the network to labelled examples.
    ///
    /// A regressor is never retrained: once trained, further calls return the
    /// existing report without touching the weights.
    pub fn train<R: Rng>(
        &mut self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
        rng: &mut R,
    ) -> Result<&TrainingReport, InsightError> {
        if self.report.is_some() {
            warn!("Wellness model already trained; ignoring retrain request");
            return self.report.as_ref().ok_or(InsightError::ModelNotReady);
        }

        info!(
            "Training wellness model on {} synthetic examples ({} epochs, batch {})",
            examples.len(),
            config.epochs,
            config.batch_size
        );
        let started = Instant::now();

        let (inputs, targets) = to_columns(examples);
        let options = FitOptions {
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            validation_split: config.validation_split,
            log_every: config.log_every,
        };
        let history = self.network.fit(&inputs, &targets, &options, rng)?;

        let training_examples =
            (examples.len() as f64 * (1.0 - config.validation_split)).floor() as usize;
        let last = history.last();
        let report = TrainingReport {
            examples: examples.len(),
            training_examples,
            validation_examples: examples.len() - training_examples,
            final_loss: last.map(|m| m.loss).unwrap_or(f64::NAN),
            final_mae: last.map(|m| m.mae).unwrap_or(f64::NAN),
            final_val_loss: last.and_then(|m| m.val_loss),
            duration_ms: started.elapsed().as_millis() as u64,
            history,
        };

        info!(
            "Wellness model ready in {} ms: loss = {:.4}, mae = {:.4}",
            report.duration_ms, report.final_loss, report.final_mae
        );

        Ok(&*self.report.insert(report))
    }

    /// Predict an integer wellness score (0-100)
    pub fn predict(&self, record: &FeatureRecord) -> Result<u8, InsightError> {
        if !self.is_trained() {
            return Err(InsightError::ModelNotReady);
        }

        let features = self.normalizer.normalize(record)?;
        let output = self
            .network
            .predict(&features)
            .first()
            .copied()
            .ok_or(InsightError::ModelNotReady)?;

        Ok((output * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}

/// Generate the synthetic corpus and train a regressor from configuration
pub fn train_from_config(config: &InsightConfig) -> Result<WellnessRegressor, InsightError> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let examples = SyntheticDataGenerator::new(&mut rng).generate(config.training.corpus_size);
    let mut regressor = WellnessRegressor::new(
        config.training.dropout_rate,
        config.normalization,
        &mut rng,
    );
    regressor.train(&examples, &config.training, &mut rng)?;

    Ok(regressor)
}

//! Runtime configuration
//!
//! Training hyper-parameters, the synthetic corpus seed, the normalization
//! policy and the training timeout. Every field has a default matching the
//! production model, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::InsightError;

/// Default synthetic corpus size
pub const DEFAULT_CORPUS_SIZE: usize = 200;

/// Default training timeout (2 minutes)
pub const DEFAULT_TRAINING_TIMEOUT_MS: u64 = 120_000;

/// How raw values outside the training envelope are treated before division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// Divide as-is; normalized values may exceed 1.0
    #[default]
    PassThrough,
    /// Clamp to the typical training range first
    ClampToTrainingRange,
}

/// Hyper-parameters for the one-off training pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of synthetic examples to generate
    pub corpus_size: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of the corpus held out for validation (taken from the tail)
    pub validation_split: f64,
    pub dropout_rate: f64,
    /// Log progress every N epochs (0 disables)
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            corpus_size: DEFAULT_CORPUS_SIZE,
            epochs: 100,
            batch_size: 20,
            learning_rate: 0.001,
            validation_split: 0.2,
            dropout_rate: 0.2,
            log_every: 20,
        }
    }
}

/// Top-level configuration for the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub training: TrainingConfig,
    /// Seed for the synthetic corpus and weight initialization; `None` uses entropy
    pub seed: Option<u64>,
    pub normalization: NormalizationPolicy,
    pub training_timeout_ms: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            seed: None,
            normalization: NormalizationPolicy::default(),
            training_timeout_ms: DEFAULT_TRAINING_TIMEOUT_MS,
        }
    }
}

impl InsightConfig {
    /// Load configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let config: InsightConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON
    pub fn to_json(&self) -> Result<String, InsightError> {
        serde_json::to_string_pretty(self).map_err(|e| InsightError::EncodingError(e.to_string()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_normalization(mut self, policy: NormalizationPolicy) -> Self {
        self.normalization = policy;
        self
    }

    pub fn with_training_timeout(mut self, timeout: Duration) -> Self {
        self.training_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn training_timeout(&self) -> Duration {
        Duration::from_millis(self.training_timeout_ms)
    }

    /// Reject hyper-parameters that cannot produce a model
    pub fn validate(&self) -> Result<(), InsightError> {
        let t = &self.training;
        if t.corpus_size == 0 {
            return Err(InsightError::InvalidConfig(
                "corpus_size must be positive".to_string(),
            ));
        }
        if t.epochs == 0 {
            return Err(InsightError::InvalidConfig(
                "epochs must be positive".to_string(),
            ));
        }
        if t.batch_size == 0 {
            return Err(InsightError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if !(t.learning_rate.is_finite() && t.learning_rate > 0.0) {
            return Err(InsightError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                t.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&t.validation_split) {
            return Err(InsightError::InvalidConfig(format!(
                "validation_split must be in [0, 1), got {}",
                t.validation_split
            )));
        }
        if !(0.0..1.0).contains(&t.dropout_rate) {
            return Err(InsightError::InvalidConfig(format!(
                "dropout_rate must be in [0, 1), got {}",
                t.dropout_rate
            )));
        }
        Ok(())
    }
}

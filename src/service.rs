//! Wellness inference service
//!
//! This module provides the public entry point for SmartSight Insights.
//! It coordinates the full flow from a raw feature record to an inference
//! result:
//!
//! 1. FeatureNormalizer - Validate the raw record
//! 2. WellnessRegressor - Train lazily (once per service), then predict
//! 3. RiskFactorDetector - Flag threshold risks on the raw record
//! 4. RecommendationEngine - Build the capped recommendation list
//!
//! Training runs on the blocking pool from a detached task started by the
//! first caller. The run does not depend on that caller staying alive: an
//! aborted or timed-out caller leaves it running, and later callers await the
//! same run. Its outcome is cached either way, so a failed or timed-out run is
//! reported to every later caller and never retried.
//!
//! A run that exceeds the training timeout is reported as failed, but the
//! blocking thread keeps computing until the run ends on its own.

use log::{info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

use crate::config::InsightConfig;
use crate::encoder::InsightEncoder;
use crate::error::InsightError;
use crate::normalizer::FeatureNormalizer;
use crate::recommendations::RecommendationEngine;
use crate::regressor::{train_from_config, TrainingReport, WellnessRegressor};
use crate::risk::RiskFactorDetector;
use crate::types::{FeatureRecord, InferenceResult};

/// Score reported when insights are unavailable
pub const NEUTRAL_SCORE: u8 = 50;

type TrainingOutcome = Result<Arc<WellnessRegressor>, String>;

/// Published outcome of the training run; `None` while it is in flight
type TrainingWatch = watch::Receiver<Option<TrainingOutcome>>;

/// Process-wide inference façade; construct once and share via `Arc`
pub struct WellnessInferenceService {
    config: InsightConfig,
    training: OnceLock<TrainingWatch>,
    training_runs: AtomicUsize,
    encoder: InsightEncoder,
}

impl Default for WellnessInferenceService {
    fn default() -> Self {
        Self::new(InsightConfig::default())
    }
}

impl WellnessInferenceService {
    /// Create an untrained service
    pub fn new(config: InsightConfig) -> Self {
        Self {
            config,
            training: OnceLock::new(),
            training_runs: AtomicUsize::new(0),
            encoder: InsightEncoder::new(),
        }
    }

    /// Create a service ready to be shared across tasks
    pub fn shared(config: InsightConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Number of training runs started by this service (0 or 1)
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    fn trained_model(&self) -> Option<Arc<WellnessRegressor>> {
        let watch = self.training.get()?;
        let outcome = watch.borrow();
        match &*outcome {
            Some(Ok(model)) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    /// Whether a trained model is available
    pub fn is_ready(&self) -> bool {
        self.trained_model().is_some()
    }

    /// Report from the training run, once it succeeded
    pub fn training_report(&self) -> Option<TrainingReport> {
        self.trained_model()?.report().cloned()
    }

    /// Train the model if no caller has yet; every caller awaits the same run.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn ensure_trained(&self) -> Result<Arc<WellnessRegressor>, InsightError> {
        let mut watch = self.training.get_or_init(|| self.start_training()).clone();

        let outcome = watch.wait_for(Option::is_some).await.map_err(|_| {
            InsightError::InitializationFailure(
                "training task ended without reporting an outcome".to_string(),
            )
        })?;

        match &*outcome {
            Some(Ok(model)) => Ok(Arc::clone(model)),
            Some(Err(reason)) => Err(InsightError::InitializationFailure(reason.clone())),
            None => Err(InsightError::ModelNotReady),
        }
    }

    fn start_training(&self) -> TrainingWatch {
        self.training_runs.fetch_add(1, Ordering::SeqCst);

        let (publish, outcome) = watch::channel(None);
        let config = self.config.clone();
        let timeout = config.training_timeout();
        info!("Initializing wellness model (timeout {:?})", timeout);

        tokio::spawn(async move {
            let task = tokio::task::spawn_blocking(move || train_from_config(&config));

            let result = match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(model))) => Ok(Arc::new(model)),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(join_error)) => Err(format!("training task failed: {join_error}")),
                Err(_) => Err(format!("training did not finish within {timeout:?}")),
            };
            if let Err(reason) = &result {
                warn!("Wellness model unavailable: {}", reason);
            }
            publish.send_replace(Some(result));
        });

        outcome
    }

    /// Score a record, detect its risk factors and build recommendations
    pub async fn infer(&self, record: &FeatureRecord) -> Result<InferenceResult, InsightError> {
        FeatureNormalizer::validate(record)?;

        let model = self.ensure_trained().await?;
        let score = model.predict(record)?;
        let risk_factors = RiskFactorDetector::detect(record);
        let recommendations = RecommendationEngine::generate(score, &risk_factors, record);

        Ok(InferenceResult {
            score,
            risk_factors,
            recommendations,
        })
    }

    /// Like [`infer`](Self::infer), but degrades to a neutral result on failure
    pub async fn infer_or_default(&self, record: &FeatureRecord) -> InferenceResult {
        match self.infer(record).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Wellness insights unavailable: {}", e);
                neutral_result()
            }
        }
    }

    /// Parse a JSON feature record, infer, and encode the versioned payload
    pub async fn infer_json(&self, record_json: &str) -> Result<String, InsightError> {
        let record = FeatureRecord::from_json(record_json)?;
        let result = self.infer(&record).await?;
        self.encoder.encode_to_json(&record, &result)
    }
}

/// Neutral fallback shown when no prediction can be made
pub fn neutral_result() -> InferenceResult {
    InferenceResult {
        score: NEUTRAL_SCORE,
        risk_factors: Vec::new(),
        recommendations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationPolicy;
    use crate::recommendations::MAX_RECOMMENDATIONS;
    use crate::types::{Preset, Priority, RecommendationCategory, RiskFactor};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn seeded() -> WellnessInferenceService {
        WellnessInferenceService::new(InsightConfig::default().with_seed(42))
    }

    #[tokio::test]
    async fn test_infer_trains_lazily() {
        let service = seeded();
        assert!(!service.is_ready());
        assert_eq!(service.training_runs(), 0);

        let result = service.infer(&Preset::Average.record()).await.unwrap();

        assert!(service.is_ready());
        assert_eq!(service.training_runs(), 1);
        assert!(result.score <= 100);
        assert!(service.training_report().is_some());
    }

    #[tokio::test]
    async fn test_ensure_trained_twice_trains_once() {
        let service = seeded();
        service.ensure_trained().await.unwrap();
        service.ensure_trained().await.unwrap();
        service.infer(&Preset::Good.record()).await.unwrap();

        assert_eq!(service.training_runs(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_training_run() {
        let service = WellnessInferenceService::shared(InsightConfig::default().with_seed(7));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.infer(&Preset::Tough.record()).await })
            })
            .collect();

        let mut scores = Vec::new();
        for handle in handles {
            scores.push(handle.await.unwrap().unwrap().score);
        }

        assert_eq!(service.training_runs(), 1);
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_aborted_first_caller_does_not_restart_training() {
        let service = WellnessInferenceService::shared(InsightConfig::default().with_seed(42));

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.infer(&Preset::Average.record()).await })
        };
        while service.training_runs() == 0 {
            tokio::task::yield_now().await;
        }
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        let result = service.infer(&Preset::Average.record()).await.unwrap();
        assert!(result.score <= 100);
        assert_eq!(service.training_runs(), 1);
        assert!(service.is_ready());
    }

    #[tokio::test]
    async fn test_timed_out_first_caller_does_not_restart_training() {
        let service = seeded();
        let record = Preset::Tough.record();

        let first = tokio::time::timeout(Duration::ZERO, service.infer(&record)).await;
        assert!(first.is_err());
        assert_eq!(service.training_runs(), 1);

        service.infer(&record).await.unwrap();
        assert_eq!(service.training_runs(), 1);
        assert!(service.training_report().is_some());
    }

    #[tokio::test]
    async fn test_clamp_policy_caps_focus_at_training_range() {
        let service = WellnessInferenceService::new(
            InsightConfig::default()
                .with_seed(42)
                .with_normalization(NormalizationPolicy::ClampToTrainingRange),
        );
        let at_edge = FeatureRecord {
            focus_hours: 8.0,
            ..Preset::Average.record()
        };
        let beyond = FeatureRecord {
            focus_hours: 12.0,
            ..Preset::Average.record()
        };

        let edge_score = service.infer(&at_edge).await.unwrap().score;
        let beyond_score = service.infer(&beyond).await.unwrap().score;
        assert_eq!(beyond_score, edge_score);
    }

    #[tokio::test]
    async fn test_worst_case_result() {
        let service = seeded();
        let record = FeatureRecord::new(1.0, 75.0, 5.0, 9.0, 0.0, 0.0);
        let result = service.infer(&record).await.unwrap();

        assert_eq!(result.risk_factors.len(), 8);
        assert_eq!(result.risk_factors[0], RiskFactor::LowFocusDuration);
        assert_eq!(result.risk_factors[7], RiskFactor::BurnoutRisk);
        assert_eq!(result.recommendations.len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_positive_scenario() {
        let service = seeded();
        let record = Preset::Good.record();
        let result = service.infer(&record).await.unwrap();

        assert!(result.risk_factors.is_empty());
        assert!(result.score >= 60, "good habits scored {}", result.score);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.category == RecommendationCategory::Encouragement));
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.priority != Priority::High));
    }

    #[tokio::test]
    async fn test_focus_description_carries_input() {
        let service = seeded();
        let record = FeatureRecord {
            focus_hours: 1.5,
            ..Preset::Average.record()
        };
        let result = service.infer(&record).await.unwrap();

        let focus = result
            .recommendations
            .iter()
            .find(|r| r.category == RecommendationCategory::Productivity)
            .unwrap();
        assert!(focus.description.contains("1.5"));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_training() {
        let service = seeded();
        let record = FeatureRecord {
            stress_level: f64::NAN,
            ..Preset::Average.record()
        };

        let err = service.infer(&record).await.unwrap_err();
        assert!(matches!(err, InsightError::InvalidInput { ref field, .. } if field == "stressLevel"));
        assert_eq!(service.training_runs(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_fatal_and_cached() {
        let config = InsightConfig::default()
            .with_seed(1)
            .with_training_timeout(Duration::ZERO);
        let service = WellnessInferenceService::new(config);
        let record = Preset::Average.record();

        let first = service.infer(&record).await.unwrap_err();
        assert!(matches!(first, InsightError::InitializationFailure(_)));
        assert!(!first.is_recoverable());

        let second = service.infer(&record).await.unwrap_err();
        assert!(matches!(second, InsightError::InitializationFailure(_)));
        assert_eq!(service.training_runs(), 1);
        assert!(!service.is_ready());
    }

    #[tokio::test]
    async fn test_invalid_config_surfaces_as_initialization_failure() {
        let mut config = InsightConfig::default();
        config.training.epochs = 0;
        let service = WellnessInferenceService::new(config);

        let err = service.ensure_trained().await.unwrap_err();
        assert!(matches!(err, InsightError::InitializationFailure(_)));
    }

    #[tokio::test]
    async fn test_fallback_is_neutral() {
        let service = WellnessInferenceService::new(
            InsightConfig::default().with_training_timeout(Duration::ZERO),
        );
        let result = service.infer_or_default(&Preset::Tough.record()).await;

        assert_eq!(result, neutral_result());
        assert_eq!(result.score, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn test_infer_json_payload() {
        let service = seeded();
        let json = r#"{
            "focusHours": 2.5,
            "appSwitches": 55,
            "sleepHours": 6.5,
            "stressLevel": 7,
            "exerciseMinutes": 10,
            "socialHours": 0.5
        }"#;

        let payload = service.infer_json(json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["input"]["focusHours"], 2.5);
        assert_eq!(
            value["result"]["riskFactors"],
            serde_json::json!([
                "Below Average Focus",
                "High Digital Distraction",
                "Insufficient Sleep",
                "Elevated Stress",
                "Low Physical Activity",
                "Social Isolation"
            ])
        );
        assert!(value["result"]["recommendations"].as_array().unwrap().len() <= 5);
    }

    #[tokio::test]
    async fn test_infer_json_rejects_malformed_record() {
        let service = seeded();
        let err = service.infer_json(r#"{"focusHours": 3}"#).await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(service.training_runs(), 0);
    }
}

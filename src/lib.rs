//! SmartSight Insights - On-device wellness inference for student check-ins
//!
//! Insights turns six daily lifestyle features into a 0-100 wellness score,
//! threshold-based risk factors and a short list of recommendations:
//! synthetic corpus → feed-forward regressor (trained lazily, once) →
//! risk detection → recommendation rules → versioned payload.
//!
//! ## Modules
//!
//! - **Model**: synthetic training data, a small dense network and the wellness regressor
//! - **Rules**: risk-factor detection and recommendation generation
//! - **Service**: the shared inference façade, payload encoding and daily check-ins

pub mod checkin;
pub mod config;
pub mod encoder;
pub mod error;
pub mod network;
pub mod normalizer;
pub mod recommendations;
pub mod regressor;
pub mod risk;
pub mod service;
pub mod synthetic;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use checkin::CheckIn;
pub use config::{InsightConfig, NormalizationPolicy, TrainingConfig};
pub use encoder::InsightEncoder;
pub use error::InsightError;
pub use recommendations::RecommendationEngine;
pub use regressor::{train_from_config, TrainingReport, WellnessRegressor};
pub use risk::RiskFactorDetector;
pub use service::{neutral_result, WellnessInferenceService};
pub use types::{
    FeatureRecord, InferenceResult, Preset, Priority, RecommendationCategory,
    RecommendationRecord, RiskFactor, ScoreBand,
};

/// Library version embedded in all insight payloads
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for insight payloads
pub const PRODUCER_NAME: &str = "smartsight-insights";

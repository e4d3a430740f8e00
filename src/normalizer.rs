//! Feature validation and normalization
//!
//! This module turns raw feature records into model inputs.
//! - Missing, non-finite and out-of-domain values are rejected
//! - Each value is divided by its fixed divisor
//! - Values are not clamped unless the policy asks for it

use crate::config::NormalizationPolicy;
use crate::error::InsightError;
use crate::types::{Feature, FeatureRecord, FEATURE_COUNT};

/// Normalizer for converting raw records to network inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureNormalizer {
    policy: NormalizationPolicy,
}

impl FeatureNormalizer {
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self { policy }
    }

    /// Check every field against its raw domain
    pub fn validate(record: &FeatureRecord) -> Result<(), InsightError> {
        for feature in Feature::ALL {
            let value = record.get(feature);
            if !value.is_finite() {
                return Err(InsightError::invalid_input(
                    feature.as_str(),
                    format!("value must be a finite number, got {value}"),
                ));
            }
            let (min, max) = feature.domain();
            if value < min || value > max {
                return Err(InsightError::invalid_input(
                    feature.as_str(),
                    format!("{value} is outside [{min}, {max}]"),
                ));
            }
        }
        Ok(())
    }

    /// Validate and normalize a record
    pub fn normalize(&self, record: &FeatureRecord) -> Result<[f64; FEATURE_COUNT], InsightError> {
        Self::validate(record)?;

        let raw = match self.policy {
            NormalizationPolicy::PassThrough => record.values(),
            NormalizationPolicy::ClampToTrainingRange => Feature::ALL.map(|feature| {
                let (min, max) = feature.training_range();
                record.get(feature).clamp(min, max)
            }),
        };

        Ok(scale(raw))
    }
}

/// Divide raw values by their fixed divisors, in model input order
pub fn scale(raw: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
    let mut scaled = raw;
    for (value, feature) in scaled.iter_mut().zip(Feature::ALL) {
        *value /= feature.divisor();
    }
    scaled
}

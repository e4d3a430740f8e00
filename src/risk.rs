//! Risk-factor detection
//!
//! Deterministic threshold rules over the raw feature record. Rules are
//! evaluated in a fixed order and each contributes at most one flag. The two
//! combined rules are layered on top of the single-feature rules, so a record
//! can raise both a constituent flag and the combined one.

use crate::error::InsightError;
use crate::normalizer::FeatureNormalizer;
use crate::types::{FeatureRecord, RiskFactor};

/// Focus below this is a severe deficit
const SEVERE_FOCUS_HOURS: f64 = 2.0;
const LOW_FOCUS_HOURS: f64 = 3.0;

const SEVERE_APP_SWITCHES: f64 = 70.0;
const HIGH_APP_SWITCHES: f64 = 50.0;
/// App switches above this combine with severe low focus
const ATTENTION_DEFICIT_APP_SWITCHES: f64 = 60.0;

const DEPRIVED_SLEEP_HOURS: f64 = 6.0;
const RECOMMENDED_SLEEP_HOURS: f64 = 7.0;

const HIGH_STRESS: f64 = 8.0;
const ELEVATED_STRESS: f64 = 6.0;
/// Stress above this combines with sleep deprivation
const BURNOUT_STRESS: f64 = 7.0;

const LOW_EXERCISE_MINUTES: f64 = 15.0;
const ISOLATED_SOCIAL_HOURS: f64 = 1.0;

/// Threshold-based risk-factor detector
pub struct RiskFactorDetector;

impl RiskFactorDetector {
    /// Validate the record against its raw domain, then detect
    pub fn detect_validated(record: &FeatureRecord) -> Result<Vec<RiskFactor>, InsightError> {
        FeatureNormalizer::validate(record)?;
        Ok(Self::detect(record))
    }

    /// Detect risk factors in rule order
    pub fn detect(record: &FeatureRecord) -> Vec<RiskFactor> {
        let mut factors = Vec::new();

        if record.focus_hours < SEVERE_FOCUS_HOURS {
            factors.push(RiskFactor::LowFocusDuration);
        } else if record.focus_hours < LOW_FOCUS_HOURS {
            factors.push(RiskFactor::BelowAverageFocus);
        }

        if record.app_switches > SEVERE_APP_SWITCHES {
            factors.push(RiskFactor::SevereDigitalDistraction);
        } else if record.app_switches > HIGH_APP_SWITCHES {
            factors.push(RiskFactor::HighDigitalDistraction);
        }

        if record.sleep_hours < DEPRIVED_SLEEP_HOURS {
            factors.push(RiskFactor::SleepDeprivation);
        } else if record.sleep_hours < RECOMMENDED_SLEEP_HOURS {
            factors.push(RiskFactor::InsufficientSleep);
        }

        if record.stress_level >= HIGH_STRESS {
            factors.push(RiskFactor::HighStressLevel);
        } else if record.stress_level >= ELEVATED_STRESS {
            factors.push(RiskFactor::ElevatedStress);
        }

        if record.exercise_minutes < LOW_EXERCISE_MINUTES {
            factors.push(RiskFactor::LowPhysicalActivity);
        }

        if record.social_hours < ISOLATED_SOCIAL_HOURS {
            factors.push(RiskFactor::SocialIsolation);
        }

        if record.focus_hours < SEVERE_FOCUS_HOURS
            && record.app_switches > ATTENTION_DEFICIT_APP_SWITCHES
        {
            factors.push(RiskFactor::AttentionDeficitPattern);
        }

        if record.sleep_hours < DEPRIVED_SLEEP_HOURS && record.stress_level > BURNOUT_STRESS {
            factors.push(RiskFactor::BurnoutRisk);
        }

        factors
    }
}

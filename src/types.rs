//! Core types for SmartSight Insights
//!
//! This module defines the data structures that flow through inference: the
//! six-feature input record, synthetic training examples, risk factors,
//! recommendations, and the combined inference result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InsightError;

/// Number of behavioral features consumed by the model
pub const FEATURE_COUNT: usize = 6;

/// Behavioral feature identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    FocusHours,
    AppSwitches,
    SleepHours,
    StressLevel,
    ExerciseMinutes,
    SocialHours,
}

impl Feature {
    /// All features in model input order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::FocusHours,
        Feature::AppSwitches,
        Feature::SleepHours,
        Feature::StressLevel,
        Feature::ExerciseMinutes,
        Feature::SocialHours,
    ];

    /// Wire name of the feature (matches the JSON field)
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::FocusHours => "focusHours",
            Feature::AppSwitches => "appSwitches",
            Feature::SleepHours => "sleepHours",
            Feature::StressLevel => "stressLevel",
            Feature::ExerciseMinutes => "exerciseMinutes",
            Feature::SocialHours => "socialHours",
        }
    }

    /// Fixed divisor applied before the value reaches the network
    pub fn divisor(&self) -> f64 {
        match self {
            Feature::FocusHours => 8.0,
            Feature::AppSwitches => 100.0,
            Feature::SleepHours => 10.0,
            Feature::StressLevel => 10.0,
            Feature::ExerciseMinutes => 90.0,
            Feature::SocialHours => 5.0,
        }
    }

    /// Accepted raw domain (inclusive)
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Feature::FocusHours => (0.0, 12.0),
            Feature::AppSwitches => (0.0, 200.0),
            Feature::SleepHours => (0.0, 12.0),
            Feature::StressLevel => (1.0, 10.0),
            Feature::ExerciseMinutes => (0.0, 180.0),
            Feature::SocialHours => (0.0, 8.0),
        }
    }

    /// Range the synthetic training corpus typically covers
    pub fn training_range(&self) -> (f64, f64) {
        match self {
            Feature::FocusHours => (0.0, 8.0),
            Feature::AppSwitches => (0.0, 100.0),
            Feature::SleepHours => (5.0, 10.0),
            Feature::StressLevel => (1.0, 10.0),
            Feature::ExerciseMinutes => (0.0, 90.0),
            Feature::SocialHours => (0.0, 5.0),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day's (or one session's) behavioral measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    /// Hours of focused work
    pub focus_hours: f64,
    /// Number of app switches
    pub app_switches: f64,
    /// Hours slept
    pub sleep_hours: f64,
    /// Self-reported stress (1-10)
    pub stress_level: f64,
    /// Minutes of exercise
    pub exercise_minutes: f64,
    /// Hours of social time
    pub social_hours: f64,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Preset::Average.record()
    }
}

impl FeatureRecord {
    pub fn new(
        focus_hours: f64,
        app_switches: f64,
        sleep_hours: f64,
        stress_level: f64,
        exercise_minutes: f64,
        social_hours: f64,
    ) -> Self {
        Self {
            focus_hours,
            app_switches,
            sleep_hours,
            stress_level,
            exercise_minutes,
            social_hours,
        }
    }

    /// Raw value of a single feature
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::FocusHours => self.focus_hours,
            Feature::AppSwitches => self.app_switches,
            Feature::SleepHours => self.sleep_hours,
            Feature::StressLevel => self.stress_level,
            Feature::ExerciseMinutes => self.exercise_minutes,
            Feature::SocialHours => self.social_hours,
        }
    }

    /// Raw values in model input order
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|feature| self.get(feature))
    }

    /// Parse a record from JSON, rejecting missing or non-numeric fields
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        serde_json::from_str(json).map_err(|e| InsightError::invalid_input("record", e.to_string()))
    }
}

/// Check-in form presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Good,
    Average,
    Tough,
}

impl Preset {
    pub fn record(&self) -> FeatureRecord {
        match self {
            Preset::Good => FeatureRecord::new(6.0, 20.0, 8.0, 2.0, 60.0, 3.0),
            Preset::Average => FeatureRecord::new(3.0, 45.0, 7.0, 5.0, 30.0, 2.0),
            Preset::Tough => FeatureRecord::new(1.0, 80.0, 5.0, 8.0, 0.0, 1.0),
        }
    }
}

/// Normalized synthetic example used for a single training pass
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// Normalized features in model input order
    pub features: [f64; FEATURE_COUNT],
    /// Target wellness score scaled to 0-1
    pub label: f64,
}

/// Named risk flag raised by a threshold rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskFactor {
    #[serde(rename = "Low Focus Duration")]
    LowFocusDuration,
    #[serde(rename = "Below Average Focus")]
    BelowAverageFocus,
    #[serde(rename = "Severe Digital Distraction")]
    SevereDigitalDistraction,
    #[serde(rename = "High Digital Distraction")]
    HighDigitalDistraction,
    #[serde(rename = "Sleep Deprivation")]
    SleepDeprivation,
    #[serde(rename = "Insufficient Sleep")]
    InsufficientSleep,
    #[serde(rename = "High Stress Level")]
    HighStressLevel,
    #[serde(rename = "Elevated Stress")]
    ElevatedStress,
    #[serde(rename = "Low Physical Activity")]
    LowPhysicalActivity,
    #[serde(rename = "Social Isolation")]
    SocialIsolation,
    #[serde(rename = "Attention Deficit Pattern")]
    AttentionDeficitPattern,
    #[serde(rename = "Burnout Risk")]
    BurnoutRisk,
}

impl RiskFactor {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::LowFocusDuration => "Low Focus Duration",
            RiskFactor::BelowAverageFocus => "Below Average Focus",
            RiskFactor::SevereDigitalDistraction => "Severe Digital Distraction",
            RiskFactor::HighDigitalDistraction => "High Digital Distraction",
            RiskFactor::SleepDeprivation => "Sleep Deprivation",
            RiskFactor::InsufficientSleep => "Insufficient Sleep",
            RiskFactor::HighStressLevel => "High Stress Level",
            RiskFactor::ElevatedStress => "Elevated Stress",
            RiskFactor::LowPhysicalActivity => "Low Physical Activity",
            RiskFactor::SocialIsolation => "Social Isolation",
            RiskFactor::AttentionDeficitPattern => "Attention Deficit Pattern",
            RiskFactor::BurnoutRisk => "Burnout Risk",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Wellness area a recommendation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Critical,
    Productivity,
    #[serde(rename = "Digital Wellness")]
    DigitalWellness,
    Health,
    #[serde(rename = "Mental Health")]
    MentalHealth,
    #[serde(rename = "Physical Health")]
    PhysicalHealth,
    #[serde(rename = "Social Wellness")]
    SocialWellness,
    Encouragement,
}

impl RecommendationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Critical => "Critical",
            RecommendationCategory::Productivity => "Productivity",
            RecommendationCategory::DigitalWellness => "Digital Wellness",
            RecommendationCategory::Health => "Health",
            RecommendationCategory::MentalHealth => "Mental Health",
            RecommendationCategory::PhysicalHealth => "Physical Health",
            RecommendationCategory::SocialWellness => "Social Wellness",
            RecommendationCategory::Encouragement => "Encouragement",
        }
    }
}

/// A single actionable recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub priority: Priority,
}

/// Combined output of one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    /// Predicted wellness score (0-100)
    pub score: u8,
    /// Risk factors in detection-rule order
    pub risk_factors: Vec<RiskFactor>,
    /// At most five recommendations in rule order
    pub recommendations: Vec<RecommendationRecord>,
}

impl InferenceResult {
    /// Score band for display
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Coarse interpretation of a wellness score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Great,
    Good,
    NeedsAttention,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            ScoreBand::Great
        } else if score >= 50 {
            ScoreBand::Good
        } else {
            ScoreBand::NeedsAttention
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Great => "Great!",
            ScoreBand::Good => "Good",
            ScoreBand::NeedsAttention => "Needs Attention",
        }
    }
}

/// Producer metadata attached to encoded payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Versioned, self-describing inference payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightPayload {
    pub insight_version: String,
    pub producer: InsightProducer,
    pub computed_at_utc: String,
    pub input: FeatureRecord,
    pub band: ScoreBand,
    pub result: InferenceResult,
}

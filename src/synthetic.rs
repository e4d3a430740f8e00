//! Synthetic training data
//!
//! Generates correlated behavioral examples and labels them with the
//! closed-form weighted wellness formula the regressor learns to approximate.
//! Focus and app switches are inversely correlated, as are sleep and stress.

use rand::Rng;

use crate::normalizer::scale;
use crate::types::{FeatureRecord, TrainingExample, FEATURE_COUNT};

/// Score every example starts from before weighted contributions
const BASE_SCORE: f64 = 50.0;

const FOCUS_WEIGHT: f64 = 25.0;
const SLEEP_WEIGHT: f64 = 20.0;
const STRESS_WEIGHT: f64 = 20.0;
const APP_SWITCH_WEIGHT: f64 = 15.0;
const EXERCISE_WEIGHT: f64 = 10.0;
const SOCIAL_WEIGHT: f64 = 10.0;

/// Generator for synthetic (never observed) training examples
pub struct SyntheticDataGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> SyntheticDataGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one raw record from the statistical recipe
    pub fn sample(&mut self) -> FeatureRecord {
        let rng = &mut self.rng;

        let focus_hours = rng.gen::<f64>() * 8.0;
        // Unclamped: can fall below 0 or exceed 100
        let app_switches = 100.0 - focus_hours * 10.0 + rng.gen::<f64>() * 30.0;
        let sleep_hours = 5.0 + rng.gen::<f64>() * 4.0;
        let stress_level = (10.0 - sleep_hours * 1.2 + rng.gen::<f64>() * 3.0).max(1.0);
        let exercise_minutes = rng.gen::<f64>() * 90.0;
        let social_hours = rng.gen::<f64>() * 5.0;

        FeatureRecord {
            focus_hours,
            app_switches,
            sleep_hours,
            stress_level,
            exercise_minutes,
            social_hours,
        }
    }

    /// Generate `n` normalized, labelled examples
    pub fn generate(&mut self, n: usize) -> Vec<TrainingExample> {
        (0..n)
            .map(|_| {
                let record = self.sample();
                TrainingExample {
                    features: scale(record.values()),
                    label: wellness_label(&record) / 100.0,
                }
            })
            .collect()
    }
}

/// Closed-form "ground truth" wellness score (0-100)
pub fn wellness_label(record: &FeatureRecord) -> f64 {
    let mut score = BASE_SCORE;

    score += (record.focus_hours / 8.0) * FOCUS_WEIGHT;
    score += ((record.sleep_hours - 5.0) / 5.0) * SLEEP_WEIGHT;
    score += ((10.0 - record.stress_level) / 10.0) * STRESS_WEIGHT;
    score += ((100.0 - record.app_switches) / 100.0) * APP_SWITCH_WEIGHT;
    score += (record.exercise_minutes / 90.0) * EXERCISE_WEIGHT;
    score += (record.social_hours / 5.0) * SOCIAL_WEIGHT;

    score.clamp(0.0, 100.0)
}

/// Split examples into parallel input/target vectors
pub fn to_columns(examples: &[TrainingExample]) -> (Vec<[f64; FEATURE_COUNT]>, Vec<f64>) {
    examples.iter().map(|e| (e.features, e.label)).unzip()
}

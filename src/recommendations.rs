//! Recommendation generation
//!
//! Rules are evaluated in a fixed order and each appends at most one record.
//! The list is truncated to the first [`MAX_RECOMMENDATIONS`] afterwards, with
//! no reordering by priority.

use crate::types::{
    FeatureRecord, Priority, RecommendationCategory, RecommendationRecord, RiskFactor,
};

/// Maximum number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Scores below this call for professional support
const CRITICAL_SCORE: u8 = 50;
const EXCELLENT_SCORE: u8 = 75;
const GOOD_SCORE: u8 = 60;

/// Rule-based recommendation engine
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Generate recommendations for a score and its raw inputs.
    ///
    /// Every current rule keys off the score or the raw record; the detected
    /// risk factors are accepted so callers pass the full inference context.
    pub fn generate(
        score: u8,
        _risk_factors: &[RiskFactor],
        record: &FeatureRecord,
    ) -> Vec<RecommendationRecord> {
        let mut recommendations = Vec::new();

        if score < CRITICAL_SCORE {
            recommendations.push(recommendation(
                "Schedule Counselor Session",
                "Your wellness score indicates you need professional support".to_string(),
                RecommendationCategory::Critical,
                Priority::High,
            ));
        }

        if record.focus_hours < 3.0 {
            recommendations.push(recommendation(
                "Use Pomodoro Technique",
                format!(
                    "Increase focus from {}h to 4h with 25-min sessions",
                    record.focus_hours
                ),
                RecommendationCategory::Productivity,
                Priority::High,
            ));
        }

        if record.app_switches > 50.0 {
            recommendations.push(recommendation(
                "Enable Focus Mode",
                format!(
                    "Reduce app switches from {} to under 30",
                    record.app_switches
                ),
                RecommendationCategory::DigitalWellness,
                Priority::High,
            ));
        }

        if record.sleep_hours < 7.0 {
            recommendations.push(recommendation(
                "Improve Sleep Hygiene",
                format!("Increase sleep from {}h to 7-8h", record.sleep_hours),
                RecommendationCategory::Health,
                Priority::High,
            ));
        }

        if record.stress_level > 6.0 {
            recommendations.push(recommendation(
                "Practice Stress Management",
                "Try meditation, deep breathing, or yoga".to_string(),
                RecommendationCategory::MentalHealth,
                Priority::High,
            ));
        }

        if record.exercise_minutes < 30.0 {
            recommendations.push(recommendation(
                "Add Physical Activity",
                format!(
                    "Increase from {} to 30+ minutes daily",
                    record.exercise_minutes
                ),
                RecommendationCategory::PhysicalHealth,
                Priority::Medium,
            ));
        }

        if record.social_hours < 2.0 {
            recommendations.push(recommendation(
                "Increase Social Connection",
                "Spend time with friends or join study groups".to_string(),
                RecommendationCategory::SocialWellness,
                Priority::Medium,
            ));
        }

        if score >= EXCELLENT_SCORE {
            recommendations.push(recommendation(
                "Excellent Progress!",
                "Your wellness habits are outstanding. Keep it up!".to_string(),
                RecommendationCategory::Encouragement,
                Priority::Low,
            ));
        } else if score >= GOOD_SCORE {
            recommendations.push(recommendation(
                "Good Work!",
                "You're on the right track. Small improvements will help.".to_string(),
                RecommendationCategory::Encouragement,
                Priority::Low,
            ));
        }

        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }
}

fn recommendation(
    title: &str,
    description: String,
    category: RecommendationCategory,
    priority: Priority,
) -> RecommendationRecord {
    RecommendationRecord {
        title: title.to_string(),
        description,
        category,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskFactorDetector;
    use crate::types::Preset;
    use pretty_assertions::assert_eq;

    fn titles(recommendations: &[RecommendationRecord]) -> Vec<&str> {
        recommendations.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_healthy_high_score_gets_only_encouragement() {
        let record = Preset::Good.record();
        let risks = RiskFactorDetector::detect(&record);

        let recs = RecommendationEngine::generate(82, &risks, &record);
        assert_eq!(titles(&recs), vec!["Excellent Progress!"]);
        assert_eq!(recs[0].priority, Priority::Low);
        assert_eq!(recs[0].category, RecommendationCategory::Encouragement);

        let recs = RecommendationEngine::generate(65, &risks, &record);
        assert_eq!(titles(&recs), vec!["Good Work!"]);
    }

    #[test]
    fn test_middling_score_without_deficits_is_empty() {
        let record = Preset::Good.record();
        assert!(RecommendationEngine::generate(55, &[], &record).is_empty());
    }

    #[test]
    fn test_cap_keeps_first_five_in_rule_order() {
        let record = Preset::Tough.record();
        let risks = RiskFactorDetector::detect(&record);

        let recs = RecommendationEngine::generate(30, &risks, &record);
        assert_eq!(
            titles(&recs),
            vec![
                "Schedule Counselor Session",
                "Use Pomodoro Technique",
                "Enable Focus Mode",
                "Improve Sleep Hygiene",
                "Practice Stress Management",
            ]
        );
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn test_encouragement_dropped_when_cap_reached() {
        let record = FeatureRecord::new(1.0, 80.0, 5.0, 8.0, 0.0, 0.0);
        let recs = RecommendationEngine::generate(80, &[], &record);

        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert!(recs
            .iter()
            .all(|r| r.category != RecommendationCategory::Encouragement));
        assert_eq!(recs[4].title, "Add Physical Activity");
    }

    #[test]
    fn test_focus_description_interpolates_value() {
        let record = FeatureRecord {
            focus_hours: 1.5,
            ..Preset::Good.record()
        };
        let recs = RecommendationEngine::generate(70, &[], &record);

        let focus = recs
            .iter()
            .find(|r| r.title == "Use Pomodoro Technique")
            .unwrap();
        assert_eq!(
            focus.description,
            "Increase focus from 1.5h to 4h with 25-min sessions"
        );
    }

    #[test]
    fn test_whole_numbers_interpolate_without_fraction() {
        let record = Preset::Tough.record();
        let recs = RecommendationEngine::generate(60, &[], &record);

        let apps = recs.iter().find(|r| r.title == "Enable Focus Mode").unwrap();
        assert_eq!(apps.description, "Reduce app switches from 80 to under 30");

        let sleep = recs
            .iter()
            .find(|r| r.title == "Improve Sleep Hygiene")
            .unwrap();
        assert_eq!(sleep.description, "Increase sleep from 5h to 7-8h");
    }

    #[test]
    fn test_medium_priority_rules() {
        let record = FeatureRecord::new(5.0, 30.0, 8.0, 3.0, 20.0, 1.0);
        let recs = RecommendationEngine::generate(58, &[], &record);

        assert_eq!(
            titles(&recs),
            vec!["Add Physical Activity", "Increase Social Connection"]
        );
        assert_eq!(recs[0].description, "Increase from 20 to 30+ minutes daily");
        assert!(recs.iter().all(|r| r.priority == Priority::Medium));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let record = Preset::Average.record();
        let risks = RiskFactorDetector::detect(&record);
        assert_eq!(
            RecommendationEngine::generate(64, &risks, &record),
            RecommendationEngine::generate(64, &risks, &record)
        );
    }

    #[test]
    fn test_never_exceeds_cap() {
        for score in [0u8, 49, 50, 59, 60, 74, 75, 100] {
            for preset in [Preset::Good, Preset::Average, Preset::Tough] {
                let record = preset.record();
                let recs = RecommendationEngine::generate(score, &[], &record);
                assert!(recs.len() <= MAX_RECOMMENDATIONS);
            }
        }
    }
}

//! Aptitude-test analysis
//!
//! Builds the aptitude section of a score breakdown from per-question telemetry:
//!
//! ```text
//! items → tally / difficulty / speed → BehaviorMetricsEngine
//!       → strengths & weaknesses → RecommendationGenerator → AptitudeReport
//! ```

pub mod analytics;
pub mod behavior;
pub mod recommendations;
pub mod types;

pub use behavior::BehaviorMetricsEngine;
pub use recommendations::RecommendationGenerator;
pub use types::{
    AnswerTally, AptitudeReport, DifficultyBreakdown, DifficultyStats, LearningBehavior,
    RecommendationKind, SpeedAnalytics,
};

use crate::types::QuestionTelemetry;

/// Run every aptitude analytic over an item list
pub fn analyze(items: &[QuestionTelemetry]) -> AptitudeReport {
    let tally = analytics::tally(items);
    let difficulty_breakdown = analytics::difficulty_breakdown(items);
    let speed = analytics::speed_analytics(items);
    let learning_behavior = BehaviorMetricsEngine::compute(items);
    let (strength_areas, weakness_areas) =
        analytics::strengths_and_weaknesses(&difficulty_breakdown);

    let mut report = AptitudeReport {
        tally,
        difficulty_breakdown,
        speed,
        learning_behavior,
        strength_areas,
        weakness_areas,
        recommendation_kinds: Vec::new(),
    };
    report.recommendation_kinds = RecommendationGenerator::generate(&report, items);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    #[test]
    fn test_analyze_empty_items() {
        let report = analyze(&[]);
        assert_eq!(report.learning_behavior, LearningBehavior::neutral());
        assert_eq!(report.tally.total, 0);
        assert!(report.strength_areas.is_empty());
        assert_eq!(
            report.recommendation_kinds.first(),
            Some(&RecommendationKind::FoundationalWork)
        );
    }

    #[test]
    fn test_analyze_wires_strengths_into_recommendations() {
        let items: Vec<QuestionTelemetry> = (0..5)
            .map(|i| {
                let mut item = QuestionTelemetry::unanswered(i);
                item.difficulty = Some(Difficulty::Easy);
                item.time_spent_seconds = 45.0;
                item.visit_count = 1;
                item.selected_answer = Some(0);
                item.correct_answer = Some(0);
                item.is_correct = true;
                item
            })
            .collect();

        let report = analyze(&items);
        assert_eq!(report.tally.percentage, 100);
        assert_eq!(report.strength_areas, vec![Difficulty::Easy]);
        assert_eq!(
            report.recommendation_kinds.last(),
            Some(&RecommendationKind::ReinforceStrengths(vec![Difficulty::Easy]))
        );
    }
}

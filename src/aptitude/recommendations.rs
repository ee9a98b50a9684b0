//! Recommendation rules
//!
//! A fixed, ordered rule table. Every group is evaluated independently and the
//! matched recommendations are concatenated in group order.

use crate::aptitude::types::{AptitudeReport, RecommendationKind};
use crate::types::QuestionTelemetry;

/// Rule table over an aptitude report
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Recommendations for a report, in rule order
    ///
    /// `report.recommendation_kinds` is ignored.
    pub fn generate(report: &AptitudeReport, items: &[QuestionTelemetry]) -> Vec<RecommendationKind> {
        let mut out = Vec::new();

        performance_rule(report, &mut out);
        focus_rule(report, &mut out);
        timing_rule(report, &mut out);
        random_clicking_rule(report, &mut out);
        thoughtfulness_rule(report, &mut out);
        consistency_rule(report, items, &mut out);
        hint_rule(report, items, &mut out);
        difficulty_rule(report, &mut out);
        learning_rule(report, &mut out);

        if !report.strength_areas.is_empty() {
            out.push(RecommendationKind::ReinforceStrengths(report.strength_areas.clone()));
        }

        out
    }
}

fn performance_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let pct = report.tally.percentage;
    out.push(if pct >= 80 {
        RecommendationKind::ExcellentPerformance
    } else if pct >= 60 {
        RecommendationKind::GoodPerformance
    } else if pct >= 40 {
        RecommendationKind::NeedsImprovement
    } else {
        RecommendationKind::FoundationalWork
    });
}

fn focus_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let focus = report.learning_behavior.focus_score;
    if focus < 50 {
        out.push(RecommendationKind::LowFocus);
    } else if focus > 80 {
        out.push(RecommendationKind::StrongFocus);
    }
}

fn timing_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let attempted = report.tally.total.saturating_sub(report.tally.unattempted);
    if attempted == 0 {
        return;
    }
    let avg = report.speed.average_time_per_item;
    if avg < 20.0 {
        out.push(RecommendationKind::SlowDown);
    } else if avg > 100.0 {
        out.push(RecommendationKind::SpeedUp);
    } else if (40.0..=70.0).contains(&avg) {
        out.push(RecommendationKind::IdealPace);
    }
}

fn random_clicking_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let random = report.learning_behavior.random_clicking_indicator;
    if random > 60 {
        out.push(RecommendationKind::StopGuessing);
    } else if random > 40 {
        out.push(RecommendationKind::SomeRushing);
    } else if random < 20 {
        out.push(RecommendationKind::Deliberate);
    }
}

fn thoughtfulness_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let thoughtfulness = report.learning_behavior.thoughtfulness_score;
    if thoughtfulness < 50 {
        out.push(RecommendationKind::ThinkMore);
    } else if thoughtfulness > 80 {
        out.push(RecommendationKind::StrongThoughtfulness);
    }
}

fn consistency_rule(
    report: &AptitudeReport,
    items: &[QuestionTelemetry],
    out: &mut Vec<RecommendationKind>,
) {
    if report.learning_behavior.consistency_score >= 50 {
        return;
    }
    let total = items.len() as f64;
    let total_changes: u32 = items.iter().map(|q| q.answer_change_count).sum();
    if total_changes as f64 > total * 1.5 {
        out.push(RecommendationKind::TrustYourAnswers);
    }
    let revisited = items.iter().filter(|q| q.visit_count > 1).count();
    if revisited as f64 > total * 0.5 {
        out.push(RecommendationKind::StaySystematic);
    }
}

fn hint_rule(report: &AptitudeReport, items: &[QuestionTelemetry], out: &mut Vec<RecommendationKind>) {
    if items.is_empty() {
        return;
    }
    let hints_used = items.iter().filter(|q| q.hint_used).count();
    let hint_pct = hints_used as f64 / items.len() as f64 * 100.0;

    if hint_pct > 60.0 {
        out.push(RecommendationKind::RelyLessOnHints);
    } else if (20.0..=40.0).contains(&hint_pct) {
        out.push(RecommendationKind::GoodHintUse);
    } else if hint_pct < 10.0 && report.tally.percentage < 60 {
        out.push(RecommendationKind::UseHints);
    }
}

fn difficulty_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let breakdown = &report.difficulty_breakdown;

    if breakdown.easy.attempted > 0 && breakdown.easy.accuracy < 70 {
        out.push(RecommendationKind::StrengthenBasics);
    }

    if breakdown.medium.attempted > 0 {
        if breakdown.medium.accuracy >= 70 {
            out.push(RecommendationKind::GoodOnMedium);
        } else if breakdown.medium.accuracy < 50 {
            out.push(RecommendationKind::PracticeMedium);
        }
    }

    if breakdown.hard.attempted > 0 {
        out.push(if breakdown.hard.accuracy >= 50 {
            RecommendationKind::StrongOnHard
        } else {
            RecommendationKind::LearnAdvancedTechniques
        });
    }
}

fn learning_rule(report: &AptitudeReport, out: &mut Vec<RecommendationKind>) {
    let overall = report.learning_behavior.overall_learning_score;
    out.push(if overall >= 80 {
        RecommendationKind::ExcellentLearning
    } else if overall >= 60 {
        RecommendationKind::GoodLearning
    } else if overall >= 40 {
        RecommendationKind::ImproveLearningStrategy
    } else {
        RecommendationKind::ChangeLearningApproach
    });
}

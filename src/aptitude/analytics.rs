//! Aptitude-test analytics
//!
//! Answer tally, per-difficulty accuracy, speed over attempted items, and the
//! strength/weakness areas derived from difficulty accuracy.

use crate::aptitude::types::{AnswerTally, DifficultyBreakdown, SpeedAnalytics};
use crate::types::{Difficulty, QuestionTelemetry};

const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

/// round(part / whole * 100), 0 for an empty whole
fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as u32
    }
}

/// Count correct, incorrect and unattempted items
pub fn tally(items: &[QuestionTelemetry]) -> AnswerTally {
    let total = items.len() as u32;
    let correct = items.iter().filter(|q| q.is_correct).count() as u32;
    let attempted = items.iter().filter(|q| q.is_attempted()).count() as u32;
    let incorrect = items
        .iter()
        .filter(|q| q.is_attempted() && !q.is_correct)
        .count() as u32;

    AnswerTally {
        correct,
        incorrect,
        unattempted: total - attempted,
        total,
        percentage: percentage(correct, total),
    }
}

/// Attempted, correct and accuracy per difficulty level
///
/// Items without a difficulty are left out.
pub fn difficulty_breakdown(items: &[QuestionTelemetry]) -> DifficultyBreakdown {
    let mut breakdown = DifficultyBreakdown::default();

    for item in items.iter().filter(|q| q.is_attempted()) {
        if let Some(difficulty) = item.difficulty {
            let stats = breakdown.get_mut(difficulty);
            stats.attempted += 1;
            if item.is_correct {
                stats.correct += 1;
            }
        }
    }

    for difficulty in DIFFICULTIES {
        let stats = breakdown.get_mut(difficulty);
        stats.accuracy = percentage(stats.correct, stats.attempted);
    }

    breakdown
}

/// Timing over attempted items
pub fn speed_analytics(items: &[QuestionTelemetry]) -> SpeedAnalytics {
    let times: Vec<f64> = items
        .iter()
        .filter(|q| q.is_attempted())
        .map(|q| q.time_spent_seconds)
        .collect();

    if times.is_empty() {
        return SpeedAnalytics::default();
    }

    let average = times.iter().sum::<f64>() / times.len() as f64;
    let fastest = times.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Items without a limit are counted in neither bucket
    let (under, over) = items
        .iter()
        .filter(|q| q.is_attempted())
        .filter_map(|q| q.time_limit_seconds.map(|limit| q.time_spent_seconds < limit))
        .fold((0u32, 0u32), |(under, over), within| {
            if within {
                (under + 1, over)
            } else {
                (under, over + 1)
            }
        });

    SpeedAnalytics {
        average_time_per_item: average.round(),
        fastest_item_seconds: fastest,
        slowest_item_seconds: slowest,
        answered_under_time: under,
        answered_over_time: over,
    }
}

/// Strong and weak difficulty levels, evaluated only where items were attempted
pub fn strengths_and_weaknesses(
    breakdown: &DifficultyBreakdown,
) -> (Vec<Difficulty>, Vec<Difficulty>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    for difficulty in DIFFICULTIES {
        let stats = breakdown.get(difficulty);
        if stats.attempted == 0 {
            continue;
        }
        // (strength at or above, weakness below)
        let (strong, weak) = match difficulty {
            Difficulty::Easy => (80, 60),
            Difficulty::Medium => (70, 50),
            Difficulty::Hard => (60, 60),
        };
        if stats.accuracy >= strong {
            strengths.push(difficulty);
        } else if stats.accuracy < weak {
            weaknesses.push(difficulty);
        }
    }

    (strengths, weaknesses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aptitude::types::DifficultyStats;
    use pretty_assertions::assert_eq;

    fn make_item(
        index: u32,
        difficulty: Difficulty,
        time: f64,
        selected: Option<u32>,
        correct: bool,
    ) -> QuestionTelemetry {
        QuestionTelemetry {
            item_index: index,
            question_id: None,
            difficulty: Some(difficulty),
            time_spent_seconds: time,
            visit_count: 1,
            hint_used: false,
            answer_change_count: 0,
            selected_answer: selected,
            correct_answer: Some(0),
            is_correct: correct,
            time_limit_seconds: Some(60.0),
        }
    }

    fn sample_items() -> Vec<QuestionTelemetry> {
        vec![
            make_item(0, Difficulty::Easy, 20.0, Some(0), true),
            make_item(1, Difficulty::Easy, 25.0, Some(0), true),
            make_item(2, Difficulty::Medium, 70.0, Some(1), false),
            make_item(3, Difficulty::Medium, 45.0, Some(0), true),
            make_item(4, Difficulty::Hard, 90.0, Some(2), false),
            make_item(5, Difficulty::Hard, 0.0, None, false),
        ]
    }

    #[test]
    fn test_tally() {
        assert_eq!(
            tally(&sample_items()),
            AnswerTally {
                correct: 3,
                incorrect: 2,
                unattempted: 1,
                total: 6,
                percentage: 50,
            }
        );
    }

    #[test]
    fn test_tally_empty() {
        assert_eq!(tally(&[]), AnswerTally::default());
    }

    #[test]
    fn test_difficulty_breakdown() {
        let breakdown = difficulty_breakdown(&sample_items());
        assert_eq!(breakdown.easy, DifficultyStats { attempted: 2, correct: 2, accuracy: 100 });
        assert_eq!(breakdown.medium, DifficultyStats { attempted: 2, correct: 1, accuracy: 50 });
        assert_eq!(breakdown.hard, DifficultyStats { attempted: 1, correct: 0, accuracy: 0 });
    }

    #[test]
    fn test_speed_analytics() {
        let speed = speed_analytics(&sample_items());
        assert_eq!(speed.average_time_per_item, 50.0);
        assert_eq!(speed.fastest_item_seconds, 20.0);
        assert_eq!(speed.slowest_item_seconds, 90.0);
        assert_eq!(speed.answered_under_time, 3);
        assert_eq!(speed.answered_over_time, 2);
    }

    #[test]
    fn test_speed_ignores_items_without_limit() {
        let mut items = sample_items();
        for item in &mut items {
            item.time_limit_seconds = None;
        }
        let speed = speed_analytics(&items);
        assert_eq!(speed.answered_under_time, 0);
        assert_eq!(speed.answered_over_time, 0);
    }

    #[test]
    fn test_speed_with_nothing_attempted() {
        let items = vec![QuestionTelemetry::unanswered(0)];
        assert_eq!(speed_analytics(&items), SpeedAnalytics::default());
    }

    #[test]
    fn test_strengths_and_weaknesses() {
        let breakdown = difficulty_breakdown(&sample_items());
        let (strengths, weaknesses) = strengths_and_weaknesses(&breakdown);
        assert_eq!(strengths, vec![Difficulty::Easy]);
        assert_eq!(weaknesses, vec![Difficulty::Hard]);
    }

    #[test]
    fn test_unattempted_levels_are_neither() {
        let (strengths, weaknesses) = strengths_and_weaknesses(&DifficultyBreakdown::default());
        assert!(strengths.is_empty());
        assert!(weaknesses.is_empty());
    }
}

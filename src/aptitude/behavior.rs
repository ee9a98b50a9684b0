//! Learning behavior metrics
//!
//! Derives focus, consistency, thoughtfulness, a random-guessing indicator and hint
//! utilization from per-question telemetry. Every sub-score is an integer in [0,100].

use crate::aptitude::types::LearningBehavior;
use crate::types::QuestionTelemetry;

/// Answers faster than this are treated as guesses (seconds)
const QUICK_ANSWER_SEC: f64 = 3.0;

/// Reasonable thinking window (seconds)
const THOUGHTFUL_MIN_SEC: f64 = 5.0;
const THOUGHTFUL_MAX_SEC: f64 = 120.0;

/// Answers slower than this are penalized (seconds)
const SLOW_ANSWER_SEC: f64 = 180.0;

/// More answer changes than this marks an item as erratic
const MANY_CHANGES: u32 = 2;

/// Calculator for learning behavior scores
pub struct BehaviorMetricsEngine;

impl BehaviorMetricsEngine {
    /// Compute behavior scores for an ordered list of items
    pub fn compute(items: &[QuestionTelemetry]) -> LearningBehavior {
        if items.is_empty() {
            return LearningBehavior::neutral();
        }

        let counts = ItemCounts::from_items(items);

        let focus_score = to_score(compute_focus(items, &counts));
        let consistency_score = to_score(compute_consistency(items, &counts));
        let thoughtfulness_score = to_score(compute_thoughtfulness(&counts));
        let random_clicking_indicator = to_score(compute_random_clicking(&counts));
        let hints_utilization = to_score(compute_hints_utilization(&counts));

        let accuracy = counts.correct as f64 / counts.total as f64 * 100.0;
        let overall = accuracy * 0.4
            + focus_score as f64 * 0.2
            + thoughtfulness_score as f64 * 0.2
            + (100 - random_clicking_indicator) as f64 * 0.1
            + hints_utilization as f64 * 0.1;

        LearningBehavior {
            focus_score,
            consistency_score,
            thoughtfulness_score,
            random_clicking_indicator,
            hints_utilization,
            overall_learning_score: to_score(overall),
        }
    }
}

/// Counts shared by several metrics
struct ItemCounts {
    total: usize,
    attempted: usize,
    correct: usize,
    multiple_visits: usize,
    many_changes: usize,
    hints_used: usize,
    quick_attempted: usize,
    thoughtful_attempted: usize,
    slow_attempted: usize,
}

impl ItemCounts {
    fn from_items(items: &[QuestionTelemetry]) -> Self {
        let attempted: Vec<&QuestionTelemetry> = items.iter().filter(|q| q.is_attempted()).collect();
        Self {
            total: items.len(),
            attempted: attempted.len(),
            correct: items.iter().filter(|q| q.is_correct).count(),
            multiple_visits: items.iter().filter(|q| q.visit_count > 1).count(),
            many_changes: items
                .iter()
                .filter(|q| q.answer_change_count > MANY_CHANGES)
                .count(),
            hints_used: items.iter().filter(|q| q.hint_used).count(),
            quick_attempted: attempted
                .iter()
                .filter(|q| q.time_spent_seconds < QUICK_ANSWER_SEC)
                .count(),
            thoughtful_attempted: attempted
                .iter()
                .filter(|q| {
                    q.time_spent_seconds >= THOUGHTFUL_MIN_SEC
                        && q.time_spent_seconds <= THOUGHTFUL_MAX_SEC
                })
                .count(),
            slow_attempted: attempted
                .iter()
                .filter(|q| q.time_spent_seconds > SLOW_ANSWER_SEC)
                .count(),
        }
    }

    fn share_of_total(&self, count: usize) -> f64 {
        count as f64 / self.total as f64
    }

    fn share_of_attempted(&self, count: usize) -> Option<f64> {
        if self.attempted == 0 {
            None
        } else {
            Some(count as f64 / self.attempted as f64)
        }
    }
}

/// Completion plus evenness of time spent across attempted items
fn compute_focus(items: &[QuestionTelemetry], counts: &ItemCounts) -> f64 {
    let completion_rate = counts.attempted as f64 / counts.total as f64 * 100.0;

    let times: Vec<f64> = items
        .iter()
        .filter(|q| q.is_attempted() && q.time_spent_seconds > 0.0)
        .map(|q| q.time_spent_seconds)
        .collect();

    let consistency_bonus = if times.is_empty() {
        0.0
    } else {
        let mean = times.iter().sum::<f64>() / times.len() as f64;
        let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64;
        let coefficient_of_variation = variance.sqrt() / mean;
        (50.0 - coefficient_of_variation * 50.0).max(0.0)
    };

    completion_rate * 0.5 + consistency_bonus * 0.5
}

/// Penalizes answer changes and revisits
fn compute_consistency(items: &[QuestionTelemetry], counts: &ItemCounts) -> f64 {
    let total_changes: u32 = items.iter().map(|q| q.answer_change_count).sum();
    let avg_changes = total_changes as f64 / counts.total as f64;

    let changes_penalty = (avg_changes * 15.0).min(40.0);
    let revisit_penalty = counts.share_of_total(counts.multiple_visits) * 30.0;

    100.0 - changes_penalty - revisit_penalty
}

/// Share of attempted items answered within the reasonable window
fn compute_thoughtfulness(counts: &ItemCounts) -> f64 {
    let thoughtful_pct = counts
        .share_of_attempted(counts.thoughtful_attempted)
        .map(|share| share * 100.0)
        .unwrap_or(50.0);
    let quick_penalty = counts
        .share_of_attempted(counts.quick_attempted)
        .map(|share| share * 30.0)
        .unwrap_or(0.0);
    let slow_penalty = counts
        .share_of_attempted(counts.slow_attempted)
        .map(|share| share * 20.0)
        .unwrap_or(0.0);

    thoughtful_pct - quick_penalty - slow_penalty
}

/// Higher means more guessing
fn compute_random_clicking(counts: &ItemCounts) -> f64 {
    counts.share_of_total(counts.quick_attempted) * 40.0
        + counts.share_of_total(counts.multiple_visits) * 30.0
        + counts.share_of_total(counts.many_changes) * 30.0
}

/// Peaks when hints are used on 20-40% of items
fn compute_hints_utilization(counts: &ItemCounts) -> f64 {
    let pct = counts.share_of_total(counts.hints_used) * 100.0;

    if pct == 0.0 {
        50.0
    } else if (20.0..=40.0).contains(&pct) {
        100.0
    } else if pct < 20.0 {
        50.0 + pct / 20.0 * 50.0
    } else {
        (100.0 - (pct - 40.0) / 60.0 * 70.0).max(30.0)
    }
}

/// Round and clamp to an integer in [0,100]
fn to_score(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u32
}

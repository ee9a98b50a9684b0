//! Progress history
//!
//! This module keeps each learner's recent attempts per assessment type. A rolling
//! window of composite scores gives a personal average against which each new
//! attempt is compared; lifetime totals feed the learner overview. Learners are
//! keyed by subject id, so one tracker can serve a batch of mixed learners.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AssessmentType, ScoreBreakdown};

/// Default rolling window in attempts
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Number of attempts listed in the overview
const RECENT_ATTEMPTS: usize = 5;

/// One scored attempt kept in the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub session_id: String,
    pub assessment_type: AssessmentType,
    pub composite_score: u8,
    pub ended_at: DateTime<Utc>,
}

/// Lifetime counters for one assessment type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentTotals {
    attempts: u32,
    score_sum: u64,
    best_score: u8,
    last_attempt: Option<DateTime<Utc>>,
    /// Aptitude only
    questions: u32,
    correct_answers: u32,
    learning_score_sum: u64,
}

/// Windows and totals of one learner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LearnerHistory {
    windows: BTreeMap<AssessmentType, VecDeque<AttemptRecord>>,
    totals: BTreeMap<AssessmentType, AssessmentTotals>,
}

impl LearnerHistory {
    fn in_window(&self, assessment: AssessmentType, session_id: &str) -> bool {
        self.windows
            .get(&assessment)
            .is_some_and(|w| w.iter().any(|r| r.session_id == session_id))
    }

    fn rolling_average(&self, assessment: AssessmentType) -> Option<f64> {
        let window = self.windows.get(&assessment)?;
        if window.is_empty() {
            return None;
        }
        let sum: f64 = window.iter().map(|r| r.composite_score as f64).sum();
        Some(sum / window.len() as f64)
    }
}

/// How an attempt compares to the learner's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressContext {
    pub subject_id: String,
    pub assessment_type: AssessmentType,
    /// Lifetime attempts of this assessment type
    pub attempts: u32,
    /// Average composite over the rolling window, including this attempt
    pub rolling_average: Option<f64>,
    pub best_score: u8,
    /// Deviation of this attempt from the prior rolling average, in percent
    pub deviation_pct: Option<f64>,
    /// True when the session had already been recorded
    pub already_recorded: bool,
}

/// Per-assessment statistics in the overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentStats {
    pub attempts: u32,
    /// Mean composite over all attempts
    pub average_score: f64,
    pub best_score: u8,
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Overview of one learner across all assessment types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverview {
    pub subject_id: String,
    pub total_attempts: u32,
    pub total_questions: u32,
    pub total_correct: u32,
    /// round(correct / questions * 100) over all aptitude tests
    pub overall_aptitude_percentage: u32,
    /// Mean overall learning score over all aptitude tests
    pub average_learning_score: u32,
    pub per_assessment: BTreeMap<AssessmentType, AssessmentStats>,
    /// Most recent attempts first
    pub recent: Vec<AttemptRecord>,
}

/// Rolling attempt history, keyed by learner
///
/// Only the records inside each rolling window are stored; older attempts survive
/// as lifetime counters. State size is bounded by learners x assessment types x
/// window size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTracker {
    learners: BTreeMap<String, LearnerHistory>,
    window_size: usize,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ProgressTracker {
    /// Create a tracker with the given rolling window
    pub fn new(window_size: usize) -> Self {
        Self {
            learners: BTreeMap::new(),
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Lifetime attempts recorded across all learners
    pub fn session_count(&self) -> usize {
        self.learners
            .values()
            .flat_map(|l| l.totals.values())
            .map(|t| t.attempts as usize)
            .sum()
    }

    /// Learners with at least one recorded attempt
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.learners.keys().map(String::as_str)
    }

    /// Record a scored attempt and compare it to the learner's prior history
    ///
    /// Recording a session that is still inside its rolling window leaves the
    /// history unchanged.
    pub fn record(&mut self, breakdown: &ScoreBreakdown, ended_at: DateTime<Utc>) -> ProgressContext {
        let subject = breakdown.subject_id.as_str();
        let assessment = breakdown.assessment_type;

        let learner = self.learners.entry(subject.to_string()).or_default();

        if learner.in_window(assessment, &breakdown.session_id) {
            debug!(session_id = %breakdown.session_id, "attempt already recorded");
            return ProgressContext {
                already_recorded: true,
                ..self.context(subject, assessment)
            };
        }

        let prior_average = learner.rolling_average(assessment);
        let deviation_pct = prior_average
            .filter(|avg| *avg > 0.0)
            .map(|avg| (breakdown.composite_score as f64 - avg) / avg * 100.0);

        let window = learner.windows.entry(assessment).or_default();
        window.push_back(AttemptRecord {
            session_id: breakdown.session_id.clone(),
            assessment_type: assessment,
            composite_score: breakdown.composite_score,
            ended_at,
        });
        while window.len() > self.window_size {
            window.pop_front();
        }

        let totals = learner.totals.entry(assessment).or_default();
        totals.attempts += 1;
        totals.score_sum += breakdown.composite_score as u64;
        totals.best_score = totals.best_score.max(breakdown.composite_score);
        totals.last_attempt = Some(match totals.last_attempt {
            Some(last) if last > ended_at => last,
            _ => ended_at,
        });
        if let Some(aptitude) = &breakdown.aptitude {
            totals.questions += aptitude.tally.total;
            totals.correct_answers += aptitude.tally.correct;
            totals.learning_score_sum += aptitude.learning_behavior.overall_learning_score as u64;
        }

        debug!(
            session_id = %breakdown.session_id,
            subject_id = subject,
            assessment = assessment.as_str(),
            composite = breakdown.composite_score,
            ?deviation_pct,
            "attempt recorded"
        );

        ProgressContext {
            deviation_pct,
            ..self.context(subject, assessment)
        }
    }

    /// Current standing of one learner for one assessment type
    pub fn context(&self, subject_id: &str, assessment: AssessmentType) -> ProgressContext {
        let learner = self.learners.get(subject_id);
        let totals = learner.and_then(|l| l.totals.get(&assessment));
        ProgressContext {
            subject_id: subject_id.to_string(),
            assessment_type: assessment,
            attempts: totals.map(|t| t.attempts).unwrap_or(0),
            rolling_average: learner.and_then(|l| l.rolling_average(assessment)),
            best_score: totals.map(|t| t.best_score).unwrap_or(0),
            deviation_pct: None,
            already_recorded: false,
        }
    }

    /// Average composite over one learner's rolling window
    pub fn rolling_average(&self, subject_id: &str, assessment: AssessmentType) -> Option<f64> {
        self.learners.get(subject_id)?.rolling_average(assessment)
    }

    /// Overview of one learner across all assessment types
    pub fn overview(&self, subject_id: &str) -> ProgressOverview {
        let empty = LearnerHistory::default();
        let learner = self.learners.get(subject_id).unwrap_or(&empty);

        let per_assessment: BTreeMap<AssessmentType, AssessmentStats> = learner
            .totals
            .iter()
            .filter(|(_, t)| t.attempts > 0)
            .map(|(assessment, t)| {
                (
                    *assessment,
                    AssessmentStats {
                        attempts: t.attempts,
                        average_score: t.score_sum as f64 / t.attempts as f64,
                        best_score: t.best_score,
                        last_attempt: t.last_attempt,
                    },
                )
            })
            .collect();

        let total_attempts = learner.totals.values().map(|t| t.attempts).sum();
        let total_questions: u32 = learner.totals.values().map(|t| t.questions).sum();
        let total_correct: u32 = learner.totals.values().map(|t| t.correct_answers).sum();

        let overall_aptitude_percentage = if total_questions > 0 {
            (total_correct as f64 / total_questions as f64 * 100.0).round() as u32
        } else {
            0
        };

        let average_learning_score = learner
            .totals
            .get(&AssessmentType::AptitudeTest)
            .filter(|t| t.attempts > 0)
            .map(|t| (t.learning_score_sum as f64 / t.attempts as f64).round() as u32)
            .unwrap_or(0);

        let mut recent: Vec<AttemptRecord> = learner.windows.values().flatten().cloned().collect();
        recent.sort_by(|a, b| {
            b.ended_at
                .cmp(&a.ended_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        recent.truncate(RECENT_ATTEMPTS);

        ProgressOverview {
            subject_id: subject_id.to_string(),
            total_attempts,
            total_questions,
            total_correct,
            overall_aptitude_percentage,
            average_learning_score,
            per_assessment,
            recent,
        }
    }

    /// Forget every recorded attempt
    pub fn clear(&mut self) {
        self.learners.clear();
    }

    /// Load a tracker from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the tracker to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aptitude;
    use crate::types::{EndReason, Locale, PerformanceBand, QuestionTelemetry};
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap()
    }

    const LEARNER: &str = "learner";

    fn make_breakdown(session_id: &str, assessment: AssessmentType, composite: u8) -> ScoreBreakdown {
        learner_breakdown(LEARNER, session_id, assessment, composite)
    }

    fn learner_breakdown(
        subject_id: &str,
        session_id: &str,
        assessment: AssessmentType,
        composite: u8,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            session_id: session_id.to_string(),
            subject_id: subject_id.to_string(),
            assessment_type: assessment,
            end_reason: EndReason::Completed,
            dimension_scores: BTreeMap::new(),
            raw_score: composite as f64 / 100.0,
            applied_penalty: 0.0,
            final_score: composite as f64 / 100.0,
            composite_score: composite,
            band: PerformanceBand::Average,
            classification: "Average".to_string(),
            feedback: String::new(),
            recommendations: vec![],
            aptitude: None,
            flags: vec![],
            locale: Locale::En,
            engine_version: "test".to_string(),
        }
    }

    #[test]
    fn test_rolling_average_and_deviation() {
        let mut tracker = ProgressTracker::default();
        tracker.record(&make_breakdown("s1", AssessmentType::MemoryMatch, 60), at(0));
        tracker.record(&make_breakdown("s2", AssessmentType::MemoryMatch, 80), at(1));

        let ctx = tracker.record(&make_breakdown("s3", AssessmentType::MemoryMatch, 84), at(2));
        assert_eq!(ctx.attempts, 3);
        assert_eq!(ctx.best_score, 84);
        // Prior average 70
        assert!((ctx.deviation_pct.unwrap() - 20.0).abs() < 0.001);
        assert!((ctx.rolling_average.unwrap() - 74.666).abs() < 0.001);
    }

    #[test]
    fn test_first_attempt_has_no_deviation() {
        let mut tracker = ProgressTracker::default();
        let ctx = tracker.record(&make_breakdown("s1", AssessmentType::MatchPieces, 50), at(0));
        assert_eq!(ctx.deviation_pct, None);
        assert_eq!(ctx.rolling_average, Some(50.0));
    }

    #[test]
    fn test_window_rolls() {
        let mut tracker = ProgressTracker::new(3);
        for (i, score) in [60u8, 70, 80, 90, 100].iter().enumerate() {
            let id = format!("s{i}");
            tracker.record(&make_breakdown(&id, AssessmentType::MemoryMatch, *score), at(i as u32));
        }

        // Only 80, 90, 100 remain
        assert!((tracker.rolling_average(LEARNER, AssessmentType::MemoryMatch).unwrap() - 90.0).abs() < 0.001);
        // Lifetime totals keep everything
        assert_eq!(tracker.context(LEARNER, AssessmentType::MemoryMatch).attempts, 5);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut tracker = ProgressTracker::default();
        let breakdown = make_breakdown("s1", AssessmentType::MemoryMatch, 60);
        tracker.record(&breakdown, at(0));
        let ctx = tracker.record(&breakdown, at(0));

        assert!(ctx.already_recorded);
        assert_eq!(ctx.attempts, 1);
        assert_eq!(tracker.session_count(), 1);
    }

    #[test]
    fn test_learners_are_separate() {
        let mut tracker = ProgressTracker::default();
        tracker.record(
            &learner_breakdown("alice", "a1", AssessmentType::MemoryMatch, 93),
            at(0),
        );
        let ctx = tracker.record(
            &learner_breakdown("bob", "b1", AssessmentType::MemoryMatch, 55),
            at(1),
        );

        assert_eq!(ctx.subject_id, "bob");
        assert_eq!(ctx.attempts, 1);
        assert_eq!(ctx.deviation_pct, None);
        assert_eq!(ctx.rolling_average, Some(55.0));
        assert_eq!(tracker.rolling_average("alice", AssessmentType::MemoryMatch), Some(93.0));
        assert_eq!(tracker.overview("alice").total_attempts, 1);
        assert_eq!(tracker.overview("carol").total_attempts, 0);

        let subjects: Vec<&str> = tracker.subjects().collect();
        assert_eq!(subjects, vec!["alice", "bob"]);
        assert_eq!(tracker.session_count(), 2);
    }

    #[test]
    fn test_stored_records_are_bounded_by_window() {
        let mut tracker = ProgressTracker::new(5);
        for i in 0..30u32 {
            let id = format!("attempt-{i:02}");
            tracker.record(&make_breakdown(&id, AssessmentType::MemoryMatch, 50), at(i));
        }

        let json = tracker.to_json().unwrap();
        assert!(!json.contains("attempt-00"));
        assert!(!json.contains("attempt-24"));
        assert!(json.contains("attempt-25"));
        assert_eq!(json.matches("sessionId").count(), 5);
        assert_eq!(tracker.session_count(), 30);
        assert_eq!(tracker.context(LEARNER, AssessmentType::MemoryMatch).attempts, 30);
    }

    #[test]
    fn test_assessment_types_are_separate() {
        let mut tracker = ProgressTracker::default();
        tracker.record(&make_breakdown("s1", AssessmentType::MemoryMatch, 90), at(0));
        tracker.record(&make_breakdown("s2", AssessmentType::MatchPieces, 30), at(1));

        assert_eq!(tracker.rolling_average(LEARNER, AssessmentType::MemoryMatch), Some(90.0));
        assert_eq!(tracker.rolling_average(LEARNER, AssessmentType::MatchPieces), Some(30.0));
        assert_eq!(tracker.rolling_average(LEARNER, AssessmentType::AptitudeTest), None);
    }

    #[test]
    fn test_overview() {
        let mut tracker = ProgressTracker::default();

        let items: Vec<QuestionTelemetry> = (0..4)
            .map(|i| {
                let mut item = QuestionTelemetry::unanswered(i);
                item.selected_answer = Some(0);
                item.time_spent_seconds = 30.0;
                item.visit_count = 1;
                item.is_correct = i < 3;
                item
            })
            .collect();
        let mut aptitude_attempt = make_breakdown("a1", AssessmentType::AptitudeTest, 75);
        aptitude_attempt.aptitude = Some(aptitude::analyze(&items));

        tracker.record(&make_breakdown("m1", AssessmentType::MemoryMatch, 60), at(0));
        tracker.record(&make_breakdown("m2", AssessmentType::MemoryMatch, 90), at(5));
        tracker.record(&aptitude_attempt, at(10));

        let overview = tracker.overview(LEARNER);
        assert_eq!(overview.total_attempts, 3);
        assert_eq!(overview.total_questions, 4);
        assert_eq!(overview.total_correct, 3);
        assert_eq!(overview.overall_aptitude_percentage, 75);
        assert!(overview.average_learning_score > 0);

        let memory = &overview.per_assessment[&AssessmentType::MemoryMatch];
        assert_eq!(memory.attempts, 2);
        assert!((memory.average_score - 75.0).abs() < 0.001);
        assert_eq!(memory.best_score, 90);
        assert_eq!(memory.last_attempt, Some(at(5)));

        let recent: Vec<&str> = overview.recent.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(recent, vec!["a1", "m2", "m1"]);
    }

    #[test]
    fn test_json_roundtrip_and_clear() {
        let mut tracker = ProgressTracker::new(5);
        tracker.record(&make_breakdown("s1", AssessmentType::MemoryMatch, 64), at(0));

        let json = tracker.to_json().unwrap();
        let mut restored = ProgressTracker::from_json(&json).unwrap();
        assert_eq!(restored.window_size(), 5);
        assert_eq!(restored.rolling_average(LEARNER, AssessmentType::MemoryMatch), Some(64.0));
        assert_eq!(restored.overview(LEARNER), tracker.overview(LEARNER));

        restored.clear();
        assert_eq!(restored.session_count(), 0);
        assert_eq!(restored.overview(LEARNER).total_attempts, 0);
    }
}

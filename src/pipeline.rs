//! Pipeline orchestration
//!
//! This module provides the public API for Cogniscore.
//! It runs a finalized telemetry session through every stage and produces the
//! score breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aptitude::{self, LearningBehavior};
use crate::classifier::PerformanceClassifier;
use crate::composer::ScoreComposer;
use crate::config::ScoringConfig;
use crate::error::{ScoreError, ValidationError};
use crate::history::{ProgressContext, ProgressOverview, ProgressTracker};
use crate::messages;
use crate::normalizer::TelemetryNormalizer;
use crate::penalty::TerminationPenaltyPolicy;
use crate::types::{AssessmentType, EndReason, Locale, ScoreBreakdown, TelemetrySession};
use crate::ENGINE_VERSION;

/// Parse a telemetry session from JSON.
///
/// Syntax errors, wrong types and missing required fields are reported as
/// `ValidationError::Malformed`.
pub fn parse_session(session_json: &str) -> Result<TelemetrySession, ScoreError> {
    serde_json::from_str(session_json)
        .map_err(|e| ValidationError::Malformed(e.to_string()).into())
}

/// Score one finalized session with the default configuration.
///
/// # Arguments
/// * `session_json` - TelemetrySession JSON
///
/// # Returns
/// ScoreBreakdown JSON
///
/// # Example
/// ```ignore
/// let breakdown_json = score_session(session_json)?;
/// ```
pub fn score_session(session_json: String) -> Result<String, ScoreError> {
    ScoringEngine::default().score_json(&session_json)
}

/// Configured, reusable scoring engine.
///
/// Holds no mutable state; one engine may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create an engine after validating its configuration
    pub fn new(config: ScoringConfig) -> Result<Self, ScoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a finalized session in the configured locale
    pub fn score(&self, session: &TelemetrySession) -> Result<ScoreBreakdown, ScoreError> {
        self.score_with_locale(session, self.config.locale)
    }

    /// Score a finalized session.
    ///
    /// Pipeline stages:
    /// 1. Validation - Reject sessions that cannot be scored
    /// 2. TelemetryNormalizer - Per-dimension scores in [0,1]
    /// 3. ScoreComposer - Weighted composite
    /// 4. TerminationPenaltyPolicy - End-reason deduction
    /// 5. PerformanceClassifier - Band, label and feedback
    /// 6. Aptitude analysis - Behavior metrics and recommendations (aptitude only)
    pub fn score_with_locale(
        &self,
        session: &TelemetrySession,
        locale: Locale,
    ) -> Result<ScoreBreakdown, ScoreError> {
        // Stage 1: Validate
        session.validate()?;
        let end_reason = session
            .end_reason
            .ok_or_else(|| ValidationError::NotFinalized(session.session_id.clone()))?;

        // Stage 2: Normalize
        let normalized = TelemetryNormalizer::normalize(session, &self.config)?;
        let mut dimension_scores = normalized.dimensions.to_map();

        // Stage 3: Compose
        let raw_score = ScoreComposer::compose(&normalized.dimensions, &self.config);

        // Stage 4: Penalize
        let penalty = TerminationPenaltyPolicy::penalty(
            session.assessment_type,
            end_reason,
            normalized.completion_ratio,
            &self.config.penalty,
        );
        let scored = TerminationPenaltyPolicy::apply(raw_score, penalty);

        debug!(
            session_id = %session.session_id,
            raw_score,
            penalty = scored.penalty,
            completion_ratio = normalized.completion_ratio,
            "composite computed"
        );

        // Stage 5: Classify
        let classification = PerformanceClassifier::classify(
            session.assessment_type,
            scored.final_score,
            &self.config.bands,
            locale,
        );

        // Stage 6: Aptitude analysis
        let (aptitude, recommendations) = match session.assessment_type {
            AssessmentType::AptitudeTest => {
                let report = aptitude::analyze(&session.items);
                insert_behavior_dimensions(&mut dimension_scores, &report.learning_behavior);
                let recommendations = report
                    .recommendation_kinds
                    .iter()
                    .map(|kind| messages::recommendation(kind, locale))
                    .collect();
                (Some(report), recommendations)
            }
            AssessmentType::MemoryMatch | AssessmentType::MatchPieces => (None, Vec::new()),
        };

        info!(
            session_id = %session.session_id,
            assessment = session.assessment_type.as_str(),
            end_reason = end_reason.as_str(),
            composite = scored.composite,
            band = classification.label,
            "session scored"
        );

        Ok(ScoreBreakdown {
            session_id: session.session_id.clone(),
            subject_id: session.subject_id.clone(),
            assessment_type: session.assessment_type,
            end_reason,
            dimension_scores,
            raw_score,
            applied_penalty: scored.penalty,
            final_score: scored.final_score,
            composite_score: scored.composite,
            band: classification.band,
            classification: classification.label.to_string(),
            feedback: classification.feedback.to_string(),
            recommendations,
            aptitude,
            flags: normalized.quality_flags,
            locale,
            engine_version: ENGINE_VERSION.to_string(),
        })
    }

    /// Close an in-progress session and score it
    pub fn finalize_and_score(
        &self,
        session: &mut TelemetrySession,
        end_reason: EndReason,
        ended_at: DateTime<Utc>,
    ) -> Result<ScoreBreakdown, ScoreError> {
        session.finalize(end_reason, ended_at)?;
        self.score(session)
    }

    /// Score session JSON and return breakdown JSON
    pub fn score_json(&self, session_json: &str) -> Result<String, ScoreError> {
        let session = parse_session(session_json)?;
        self.score(&session)?.to_json()
    }
}

/// Behavior sub-scores rescaled to [0,1]
fn insert_behavior_dimensions(
    scores: &mut std::collections::BTreeMap<String, f64>,
    behavior: &LearningBehavior,
) {
    let entries = [
        ("focus", behavior.focus_score),
        ("consistency", behavior.consistency_score),
        ("thoughtfulness", behavior.thoughtfulness_score),
        ("random_clicking", behavior.random_clicking_indicator),
        ("hints_utilization", behavior.hints_utilization),
        ("overall_learning", behavior.overall_learning_score),
    ];
    for (name, value) in entries {
        scores.insert(name.to_string(), value.min(100) as f64 / 100.0);
    }
}

/// Breakdown plus the learner's progress context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAttempt {
    pub breakdown: ScoreBreakdown,
    pub progress: ProgressContext,
}

/// Stateful processor that keeps a learner's progress history.
///
/// Use this when attempts should be compared against earlier ones.
pub struct ScoringProcessor {
    engine: ScoringEngine,
    tracker: ProgressTracker,
}

impl Default for ScoringProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            engine: ScoringEngine::default(),
            tracker: ProgressTracker::default(),
        }
    }

    /// Create a processor with a validated configuration
    pub fn with_config(config: ScoringConfig) -> Result<Self, ScoreError> {
        Ok(Self {
            engine: ScoringEngine::new(config)?,
            tracker: ProgressTracker::default(),
        })
    }

    /// Create a processor with a specific history window
    pub fn with_history_window(attempts: usize) -> Self {
        Self {
            engine: ScoringEngine::default(),
            tracker: ProgressTracker::new(attempts),
        }
    }

    /// Create a processor with a validated configuration and history window
    pub fn with_config_and_window(config: ScoringConfig, attempts: usize) -> Result<Self, ScoreError> {
        Ok(Self {
            engine: ScoringEngine::new(config)?,
            tracker: ProgressTracker::new(attempts),
        })
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Score a session and record it in the history
    pub fn process_session(&mut self, session: &TelemetrySession) -> Result<ScoredAttempt, ScoreError> {
        let breakdown = self.engine.score(session)?;
        let ended_at = session.ended_at.unwrap_or(session.started_at);
        let progress = self.tracker.record(&breakdown, ended_at);
        Ok(ScoredAttempt {
            breakdown,
            progress,
        })
    }

    /// Score session JSON and return ScoredAttempt JSON
    pub fn process(&mut self, session_json: &str) -> Result<String, ScoreError> {
        let session = parse_session(session_json)?;
        let attempt = self.process_session(&session)?;
        Ok(serde_json::to_string(&attempt)?)
    }

    /// Overview of one learner across all recorded attempts
    pub fn overview(&self, subject_id: &str) -> ProgressOverview {
        self.tracker.overview(subject_id)
    }

    /// Save history state to JSON
    pub fn save_history(&self) -> Result<String, ScoreError> {
        Ok(self.tracker.to_json()?)
    }

    /// Load history state from JSON
    pub fn load_history(&mut self, json: &str) -> Result<(), ScoreError> {
        self.tracker = ProgressTracker::from_json(json)?;
        Ok(())
    }

    /// Number of sessions in the history
    pub fn history_session_count(&self) -> usize {
        self.tracker.session_count()
    }

    /// Forget the recorded history
    pub fn clear_history(&mut self) {
        self.tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PerformanceBand, QualityFlag};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn memory_match_json(session_id: &str, correct_pairs: u32, end_reason: &str) -> String {
        format!(
            r#"{{
                "sessionId": "{session_id}",
                "subjectId": "learner-7",
                "assessmentType": "memory_match",
                "startedAt": "2024-03-01T10:00:00Z",
                "endedAt": "2024-03-01T10:01:00Z",
                "endReason": "{end_reason}",
                "rawCounters": {{
                    "memoryMatch": {{
                        "totalPairs": 10,
                        "correctPairs": {correct_pairs},
                        "totalClicks": 20,
                        "incorrectClicks": 0,
                        "nearbyClicks": 0,
                        "timeTakenSeconds": 60
                    }}
                }}
            }}"#
        )
    }

    fn match_pieces_json() -> &'static str {
        r#"{
            "sessionId": "mp-1",
            "subjectId": "learner-7",
            "assessmentType": "match_pieces",
            "startedAt": "2024-03-01T10:00:00Z",
            "endedAt": "2024-03-01T10:01:30Z",
            "endReason": "EXITED",
            "rawCounters": {
                "matchPieces": {
                    "totalImages": 3,
                    "imagesCompleted": 1,
                    "perImage": [
                        { "imageIndex": 0, "correctPlacements": 9, "swapCount": 2, "moveCount": 11 },
                        { "imageIndex": 1, "correctPlacements": 1, "swapCount": 1, "moveCount": 4 },
                        { "imageIndex": 2, "correctPlacements": 0, "swapCount": 0, "moveCount": 0 }
                    ],
                    "totalMoves": 15,
                    "timeTakenSeconds": 90
                }
            }
        }"#
    }

    fn aptitude_json(items: &str) -> String {
        format!(
            r#"{{
                "sessionId": "apt-1",
                "subjectId": "learner-7",
                "assessmentType": "aptitude_test",
                "startedAt": "2024-03-01T10:00:00Z",
                "endedAt": "2024-03-01T10:20:00Z",
                "endReason": "Completed",
                "items": {items}
            }}"#
        )
    }

    #[test]
    fn test_perfect_memory_match() {
        let session = parse_session(&memory_match_json("mm-1", 10, "Completed")).unwrap();
        let breakdown = ScoringEngine::default().score(&session).unwrap();

        assert_eq!(breakdown.composite_score, 93);
        assert_eq!(breakdown.band, PerformanceBand::Exceptional);
        assert_eq!(breakdown.classification, "Exceptional");
        assert_eq!(breakdown.applied_penalty, 0.0);
        assert!(breakdown.recommendations.is_empty());
        assert!(breakdown.aptitude.is_none());
        assert!(breakdown.flags.is_empty());
    }

    #[test]
    fn test_early_exit_match_pieces() {
        let session = parse_session(match_pieces_json()).unwrap();
        let breakdown = ScoringEngine::default().score(&session).unwrap();

        assert!((breakdown.dimension_scores["accuracy"] - 0.370).abs() < 0.001);
        assert!((breakdown.dimension_scores["completion"] - 0.333).abs() < 0.001);
        assert!((breakdown.applied_penalty - 0.1574).abs() < 0.0001);
        assert!((breakdown.raw_score - 0.5327).abs() < 0.001);
        assert_eq!(breakdown.composite_score, 38);
        assert_eq!(breakdown.end_reason, EndReason::ExitedEarly);
        assert_eq!(breakdown.classification, "Needs Practice");
    }

    #[test]
    fn test_timeout_penalty_applied() {
        let session = parse_session(&memory_match_json("mm-2", 10, "TIME_UP")).unwrap();
        let breakdown = ScoringEngine::default().score(&session).unwrap();
        assert!((breakdown.applied_penalty - 0.08).abs() < 1e-12);
        assert_eq!(breakdown.composite_score, 85);
        // Boundary belongs to the higher band
        assert_eq!(breakdown.band, PerformanceBand::Exceptional);
    }

    #[test]
    fn test_empty_aptitude_test() {
        let session = parse_session(&aptitude_json("[]")).unwrap();
        let breakdown = ScoringEngine::default().score(&session).unwrap();

        let report = breakdown.aptitude.as_ref().unwrap();
        assert_eq!(report.learning_behavior, LearningBehavior::neutral());
        assert_eq!(breakdown.composite_score, 0);
        assert_eq!(breakdown.flags, vec![QualityFlag::NoItems]);
        assert!((breakdown.dimension_scores["focus"] - 0.5).abs() < 1e-12);
        assert!(!breakdown.recommendations.is_empty());
    }

    #[test]
    fn test_aptitude_in_hindi() {
        let items = r#"[
            { "itemIndex": 0, "difficulty": "easy", "timeSpentSeconds": 45, "visitCount": 1,
              "selectedAnswer": 1, "correctAnswer": 1, "isCorrect": true, "timeLimitSeconds": 60 },
            { "itemIndex": 1, "difficulty": "medium", "timeSpentSeconds": 50, "visitCount": 1,
              "selectedAnswer": 0, "correctAnswer": 0, "isCorrect": true, "timeLimitSeconds": 60 },
            { "itemIndex": 2, "difficulty": "hard", "timeSpentSeconds": 0, "visitCount": 1,
              "selectedAnswer": -1, "correctAnswer": 3, "isCorrect": false, "timeLimitSeconds": 90 }
        ]"#;
        let session = parse_session(&aptitude_json(items)).unwrap();
        let breakdown = ScoringEngine::default()
            .score_with_locale(&session, Locale::Hi)
            .unwrap();

        let report = breakdown.aptitude.as_ref().unwrap();
        assert_eq!(report.tally.correct, 2);
        assert_eq!(report.tally.unattempted, 1);
        assert_eq!(breakdown.composite_score, 67);
        assert_eq!(breakdown.classification, "Good");
        assert_eq!(breakdown.applied_penalty, 0.0);
        assert_eq!(breakdown.locale, Locale::Hi);
        assert!(breakdown.recommendations[0].starts_with("अच्छा प्रदर्शन"));
    }

    #[test]
    fn test_unfinalized_session_is_rejected() {
        let json = memory_match_json("mm-3", 5, "Completed").replace(r#""endReason": "Completed","#, "");
        let result = score_session(json);
        assert!(matches!(
            result,
            Err(ScoreError::Validation(ValidationError::NotFinalized(_)))
        ));
    }

    fn memory_match_counters_json(counters: &str, seconds: u32, end_reason: &str) -> String {
        format!(
            r#"{{
                "sessionId": "mm-edge",
                "subjectId": "learner-7",
                "assessmentType": "memory_match",
                "startedAt": "2024-03-01T10:00:00Z",
                "endedAt": "2024-03-01T10:05:00Z",
                "endReason": "{end_reason}",
                "rawCounters": {{ "memoryMatch": {{ {counters}, "timeTakenSeconds": {seconds} }} }}
            }}"#
        )
    }

    #[test]
    fn test_exact_threshold_lands_in_higher_band() {
        let engine = ScoringEngine::default();

        // 0.1875 + 0.1 + 0.1125 = 0.40
        let json = memory_match_counters_json(
            r#""totalPairs": 4, "correctPairs": 0, "totalClicks": 4, "incorrectClicks": 1"#,
            90,
            "Completed",
        );
        let breakdown = engine.score(&parse_session(&json).unwrap()).unwrap();
        assert_eq!(breakdown.composite_score, 40);
        assert_eq!(breakdown.band, PerformanceBand::BelowAverage);
        assert_eq!(breakdown.classification, "Below Average");

        // 0.48 - 0.08 = 0.40
        let json = memory_match_counters_json(
            r#""totalPairs": 1, "correctPairs": 0, "totalClicks": 0, "incorrectClicks": 0"#,
            108,
            "TIME_UP",
        );
        let breakdown = engine.score(&parse_session(&json).unwrap()).unwrap();
        assert_eq!(breakdown.composite_score, 40);
        assert_eq!(breakdown.band, PerformanceBand::BelowAverage);
    }

    #[test]
    fn test_item_without_answer_fields_is_rejected() {
        let result = score_session(aptitude_json(r#"[{ "itemIndex": 0 }]"#));
        assert!(matches!(
            result,
            Err(ScoreError::Validation(ValidationError::Malformed(_)))
        ));
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let result = score_session("{ not json".to_string());
        assert!(matches!(
            result,
            Err(ScoreError::Validation(ValidationError::Malformed(_)))
        ));
    }

    #[test]
    fn test_score_session_is_deterministic() {
        let json = match_pieces_json().to_string();
        let first = score_session(json.clone()).unwrap();
        let second = score_session(json).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_finalize_and_score() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut session = TelemetrySession::start("learner", AssessmentType::AptitudeTest, start);
        let engine = ScoringEngine::default();

        let breakdown = engine
            .finalize_and_score(&mut session, EndReason::ExitedEarly, start + chrono::Duration::minutes(3))
            .unwrap();
        assert!(session.is_finalized());
        assert_eq!(breakdown.end_reason, EndReason::ExitedEarly);

        // A finalized session cannot be finalized again
        assert!(engine
            .finalize_and_score(&mut session, EndReason::Completed, start + chrono::Duration::minutes(4))
            .is_err());
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.match_pieces.weights.accuracy = 0.9;
        assert!(matches!(
            ScoringEngine::new(config),
            Err(ScoreError::ConfigError(_))
        ));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScoringEngine>();
    }

    #[test]
    fn test_processor_tracks_progress() {
        let mut processor = ScoringProcessor::new();

        let first = processor
            .process_session(&parse_session(&memory_match_json("mm-a", 5, "Completed")).unwrap())
            .unwrap();
        assert_eq!(first.progress.attempts, 1);
        assert_eq!(first.progress.deviation_pct, None);

        let second = processor
            .process_session(&parse_session(&memory_match_json("mm-b", 10, "Completed")).unwrap())
            .unwrap();
        assert_eq!(second.progress.attempts, 2);
        assert!(second.progress.deviation_pct.unwrap() > 0.0);
        assert_eq!(processor.history_session_count(), 2);

        let saved = processor.save_history().unwrap();
        let mut restored = ScoringProcessor::with_history_window(10);
        restored.load_history(&saved).unwrap();
        assert_eq!(restored.history_session_count(), 2);

        restored.clear_history();
        assert_eq!(restored.history_session_count(), 0);

        assert!(matches!(
            restored.load_history("{ not history"),
            Err(ScoreError::JsonError(_))
        ));
    }

    #[test]
    fn test_processor_keeps_learners_apart() {
        let mut processor = ScoringProcessor::new();
        processor
            .process_session(&parse_session(&memory_match_json("mm-alice", 10, "Completed")).unwrap())
            .unwrap();

        let bob = memory_match_json("mm-bob", 2, "Completed").replace("learner-7", "learner-8");
        let attempt = processor
            .process_session(&parse_session(&bob).unwrap())
            .unwrap();

        assert_eq!(attempt.progress.subject_id, "learner-8");
        assert_eq!(attempt.progress.attempts, 1);
        assert_eq!(attempt.progress.deviation_pct, None);
        assert_eq!(processor.overview("learner-7").total_attempts, 1);
        assert_eq!(processor.overview("learner-8").total_attempts, 1);
    }

    #[test]
    fn test_processor_json_output() {
        let mut processor = ScoringProcessor::new();
        let output = processor.process(match_pieces_json()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["breakdown"]["compositeScore"], 38);
        assert_eq!(value["progress"]["attempts"], 1);
    }
}

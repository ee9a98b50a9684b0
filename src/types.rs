//! Core types for the Cogniscore engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: the telemetry session captured by an assessment, the normalized
//! dimension vector, and the immutable score breakdown handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::aptitude::AptitudeReport;
use crate::error::{ScoreError, ValidationError};

/// Assessment instrument that produced a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    MemoryMatch,
    MatchPieces,
    AptitudeTest,
}

impl AssessmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::MemoryMatch => "memory_match",
            AssessmentType::MatchPieces => "match_pieces",
            AssessmentType::AptitudeTest => "aptitude_test",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    #[serde(alias = "COMPLETED", alias = "completed")]
    Completed,
    #[serde(alias = "EXITED", alias = "exited", alias = "exited_early")]
    ExitedEarly,
    #[serde(alias = "TIME_UP", alias = "time_up", alias = "timed_out")]
    TimedOut,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Completed => "Completed",
            EndReason::ExitedEarly => "ExitedEarly",
            EndReason::TimedOut => "TimedOut",
        }
    }
}

/// Question difficulty level (aptitude test)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy")]
    Easy,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Hard")]
    Hard,
}

/// Output language for feedback and recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Hi,
}

impl std::str::FromStr for Locale {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "hi" | "hindi" => Ok(Locale::Hi),
            other => Err(ScoreError::ConfigError(format!("Unsupported locale: {other}"))),
        }
    }
}

/// Raw counters captured by the memory-match grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMatchCounters {
    /// Pairs on the board
    pub total_pairs: u32,
    /// Pairs found
    pub correct_pairs: u32,
    /// Every card flip, matched or not
    pub total_clicks: u32,
    /// Flips that formed a wrong pair
    pub incorrect_clicks: u32,
    /// Wrong pairs whose cards sat within two grid positions of each other
    #[serde(default)]
    pub nearby_clicks: u32,
    /// Solve time in seconds; falls back to the session duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<f64>,
}

/// Per-image outcome of the tile-reconstruction puzzle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerImageResult {
    #[serde(default)]
    pub image_index: u32,
    /// Pieces left in their correct slot
    pub correct_placements: u32,
    /// Piece-to-piece swaps inside the grid
    #[serde(default)]
    pub swap_count: u32,
    /// Drag moves spent on this image
    #[serde(default)]
    pub move_count: u32,
}

/// Raw counters captured by the match-pieces puzzle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPiecesCounters {
    pub total_images: u32,
    pub images_completed: u32,
    #[serde(default)]
    pub per_image: Vec<PerImageResult>,
    /// Total drag moves; when absent, the per-image move counts are summed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_moves: Option<u32>,
    /// Solve time in seconds; falls back to the session duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<f64>,
}

impl MatchPiecesCounters {
    pub fn total_correct_placements(&self) -> u32 {
        self.per_image.iter().map(|i| i.correct_placements).sum()
    }

    pub fn total_swaps(&self) -> u32 {
        self.per_image.iter().map(|i| i.swap_count).sum()
    }

    pub fn effective_total_moves(&self) -> u32 {
        self.total_moves
            .unwrap_or_else(|| self.per_image.iter().map(|i| i.move_count).sum())
    }
}

/// Assessment-specific raw counters (puzzles only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCounters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_match: Option<MemoryMatchCounters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pieces: Option<MatchPiecesCounters>,
}

/// Per-question telemetry recorded during an aptitude test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTelemetry {
    /// Position of the question in the test
    pub item_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Seconds spent on the question across all visits
    #[serde(default)]
    pub time_spent_seconds: f64,
    /// Number of times the question was opened
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub hint_used: bool,
    /// Answer changes before the final submission
    #[serde(default)]
    pub answer_change_count: u32,
    /// Selected option index; null or -1 when unanswered. The key itself is required.
    #[serde(deserialize_with = "answer_index")]
    pub selected_answer: Option<u32>,
    #[serde(default, deserialize_with = "answer_index")]
    pub correct_answer: Option<u32>,
    pub is_correct: bool,
    /// Per-question time allowance in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<f64>,
}

impl QuestionTelemetry {
    /// Unanswered question at `item_index`
    pub fn unanswered(item_index: u32) -> Self {
        Self {
            item_index,
            question_id: None,
            difficulty: None,
            time_spent_seconds: 0.0,
            visit_count: 0,
            hint_used: false,
            answer_change_count: 0,
            selected_answer: None,
            correct_answer: None,
            is_correct: false,
            time_limit_seconds: None,
        }
    }

    pub fn is_attempted(&self) -> bool {
        self.selected_answer.is_some()
    }
}

/// Negative option indices are the legacy "unanswered" sentinel.
fn answer_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| u32::try_from(v).ok()))
}

/// One assessment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySession {
    pub session_id: String,
    /// Learner identifier
    pub subject_id: String,
    pub assessment_type: AssessmentType,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    #[serde(default)]
    pub raw_counters: RawCounters,
    #[serde(default)]
    pub items: Vec<QuestionTelemetry>,
}

impl TelemetrySession {
    /// Start a new in-progress session with a fresh session id
    pub fn start(
        subject_id: impl Into<String>,
        assessment_type: AssessmentType,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            assessment_type,
            started_at,
            ended_at: None,
            end_reason: None,
            raw_counters: RawCounters::default(),
            items: Vec::new(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_reason.is_some()
    }

    fn ensure_open(&self) -> Result<(), ScoreError> {
        if self.is_finalized() {
            return Err(ScoreError::SessionFinalized(self.session_id.clone()));
        }
        Ok(())
    }

    /// Insert or replace the telemetry for one question, keeping items ordered by index
    pub fn upsert_item(&mut self, item: QuestionTelemetry) -> Result<(), ScoreError> {
        self.ensure_open()?;
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|q| q.item_index == item.item_index)
        {
            *existing = item;
        } else {
            let pos = self
                .items
                .partition_point(|q| q.item_index < item.item_index);
            self.items.insert(pos, item);
        }
        Ok(())
    }

    pub fn set_memory_match_counters(
        &mut self,
        counters: MemoryMatchCounters,
    ) -> Result<(), ScoreError> {
        self.ensure_open()?;
        self.raw_counters.memory_match = Some(counters);
        Ok(())
    }

    pub fn set_match_pieces_counters(
        &mut self,
        counters: MatchPiecesCounters,
    ) -> Result<(), ScoreError> {
        self.ensure_open()?;
        self.raw_counters.match_pieces = Some(counters);
        Ok(())
    }

    /// Close the session. After this the session is immutable.
    pub fn finalize(
        &mut self,
        end_reason: EndReason,
        ended_at: DateTime<Utc>,
    ) -> Result<(), ScoreError> {
        self.ensure_open()?;
        if ended_at < self.started_at {
            return Err(ValidationError::EndBeforeStart {
                started_at: self.started_at.to_rfc3339(),
                ended_at: ended_at.to_rfc3339(),
            }
            .into());
        }
        self.ended_at = Some(ended_at);
        self.end_reason = Some(end_reason);
        Ok(())
    }

    /// Wall-clock duration in seconds, if the session has an end time
    pub fn duration_seconds(&self) -> Option<f64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Solve time for puzzle sessions: explicit counter first, then wall clock
    pub fn time_taken_seconds(&self) -> Option<f64> {
        let explicit = match self.assessment_type {
            AssessmentType::MemoryMatch => self
                .raw_counters
                .memory_match
                .as_ref()
                .and_then(|c| c.time_taken_seconds),
            AssessmentType::MatchPieces => self
                .raw_counters
                .match_pieces
                .as_ref()
                .and_then(|c| c.time_taken_seconds),
            AssessmentType::AptitudeTest => None,
        };
        explicit.or_else(|| self.duration_seconds())
    }

    /// Reject sessions that cannot be scored
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingField("sessionId".to_string()));
        }
        if self.subject_id.trim().is_empty() {
            return Err(ValidationError::MissingField("subjectId".to_string()));
        }
        if self.end_reason.is_none() {
            return Err(ValidationError::NotFinalized(self.session_id.clone()));
        }
        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(ValidationError::EndBeforeStart {
                    started_at: self.started_at.to_rfc3339(),
                    ended_at: ended_at.to_rfc3339(),
                });
            }
        }

        match self.assessment_type {
            AssessmentType::MemoryMatch => {
                let counters = self.raw_counters.memory_match.as_ref().ok_or_else(|| {
                    ValidationError::MissingCounters {
                        assessment: self.assessment_type.as_str().to_string(),
                        counters: "memoryMatch".to_string(),
                    }
                })?;
                check_optional_number("timeTakenSeconds", counters.time_taken_seconds)?;
                self.require_time_taken()
            }
            AssessmentType::MatchPieces => {
                let counters = self.raw_counters.match_pieces.as_ref().ok_or_else(|| {
                    ValidationError::MissingCounters {
                        assessment: self.assessment_type.as_str().to_string(),
                        counters: "matchPieces".to_string(),
                    }
                })?;
                check_optional_number("timeTakenSeconds", counters.time_taken_seconds)?;
                self.require_time_taken()
            }
            AssessmentType::AptitudeTest => self.validate_items(),
        }
    }

    fn require_time_taken(&self) -> Result<(), ValidationError> {
        if self.time_taken_seconds().is_none() {
            return Err(ValidationError::MissingField(
                "endedAt or rawCounters.timeTakenSeconds".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_items(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.item_index) {
                return Err(ValidationError::DuplicateItem(item.item_index));
            }
            check_number("timeSpentSeconds", item.time_spent_seconds)?;
            check_optional_number("timeLimitSeconds", item.time_limit_seconds)?;
            if item.is_correct && !item.is_attempted() {
                return Err(ValidationError::CorrectWithoutAnswer(item.item_index));
            }
        }
        Ok(())
    }
}

fn check_number(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_optional_number(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) => check_number(field, v),
        None => Ok(()),
    }
}

/// Ordinal performance band, ascending from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    Low,
    BelowAverage,
    Average,
    High,
    Exceptional,
}

impl PerformanceBand {
    /// Bands from highest to lowest, matching threshold order
    pub const DESCENDING: [PerformanceBand; 5] = [
        PerformanceBand::Exceptional,
        PerformanceBand::High,
        PerformanceBand::Average,
        PerformanceBand::BelowAverage,
        PerformanceBand::Low,
    ];
}

/// Degenerate conditions absorbed by documented defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Zero pairs or zero images on the board
    DegenerateTotals,
    /// No pair found and at most one move made
    NoMeaningfulInteraction,
    /// Aptitude test without any question telemetry
    NoItems,
    /// Aptitude test where no question was answered
    NoAttemptedItems,
}

/// Scored result of one finalized session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub session_id: String,
    pub subject_id: String,
    pub assessment_type: AssessmentType,
    pub end_reason: EndReason,
    /// Named sub-metrics, each in [0,1]
    pub dimension_scores: BTreeMap<String, f64>,
    /// Weighted sum before the termination penalty
    pub raw_score: f64,
    /// Penalty subtracted before rounding, in [0,1]
    pub applied_penalty: f64,
    /// clamp01(raw_score - applied_penalty)
    pub final_score: f64,
    /// round(final_score * 100)
    pub composite_score: u8,
    pub band: PerformanceBand,
    /// Assessment-specific band label
    pub classification: String,
    pub feedback: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aptitude: Option<AptitudeReport>,
    #[serde(default)]
    pub flags: Vec<QualityFlag>,
    pub locale: Locale,
    pub engine_version: String,
}

impl ScoreBreakdown {
    pub fn to_json(&self) -> Result<String, ScoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

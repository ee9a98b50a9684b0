//! Telemetry normalization
//!
//! This module turns raw assessment counters into per-dimension scores in [0,1].
//! - Every dimension is passed through `clamp01`
//! - Zero denominators resolve to documented zero values and raise a quality flag
//! - Missing counters are reported, never guessed

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{MatchPiecesConfig, MemoryMatchConfig, ScoringConfig};
use crate::error::{ScoreError, ValidationError};
use crate::types::{
    AssessmentType, MatchPiecesCounters, MemoryMatchCounters, QualityFlag, TelemetrySession,
};

/// Restrict a value to [0,1]. NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// `numerator / denominator`, or `None` when the denominator is not positive
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Memory-match dimension scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatchDimensions {
    pub working_memory: f64,
    pub attention_control: f64,
    pub processing_speed: f64,
    pub strategic_efficiency: f64,
}

/// Match-pieces dimension scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPiecesDimensions {
    pub accuracy: f64,
    pub completion: f64,
    pub efficiency: f64,
    pub speed: f64,
    pub swap_efficiency: f64,
    pub sequential_bonus: f64,
    pub spatial_reasoning: f64,
}

/// Aptitude-test inputs to the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AptitudeDimensions {
    /// correct / total
    pub accuracy: f64,
}

/// Normalized dimensions, one variant per assessment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dimensions {
    MemoryMatch(MemoryMatchDimensions),
    MatchPieces(MatchPiecesDimensions),
    AptitudeTest(AptitudeDimensions),
}

impl Dimensions {
    /// Named view used in the score breakdown
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let pairs: Vec<(&str, f64)> = match self {
            Dimensions::MemoryMatch(d) => vec![
                ("working_memory", d.working_memory),
                ("attention_control", d.attention_control),
                ("processing_speed", d.processing_speed),
                ("strategic_efficiency", d.strategic_efficiency),
            ],
            Dimensions::MatchPieces(d) => vec![
                ("accuracy", d.accuracy),
                ("completion", d.completion),
                ("efficiency", d.efficiency),
                ("speed", d.speed),
                ("swap_efficiency", d.swap_efficiency),
                ("sequential_bonus", d.sequential_bonus),
                ("spatial_reasoning", d.spatial_reasoning),
            ],
            Dimensions::AptitudeTest(d) => vec![("accuracy", d.accuracy)],
        };
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), clamp01(value)))
            .collect()
    }
}

/// Output of the normalization stage
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSession {
    pub assessment_type: AssessmentType,
    pub dimensions: Dimensions,
    /// Fraction of the primary unit completed (pairs, pieces, or answered questions)
    pub completion_ratio: f64,
    pub quality_flags: Vec<QualityFlag>,
}

/// Normalizer for converting raw counters to dimension scores
pub struct TelemetryNormalizer;

impl TelemetryNormalizer {
    /// Normalize a validated session
    pub fn normalize(
        session: &TelemetrySession,
        config: &ScoringConfig,
    ) -> Result<NormalizedSession, ScoreError> {
        let time_taken = session.time_taken_seconds().unwrap_or(0.0);

        match session.assessment_type {
            AssessmentType::MemoryMatch => {
                let counters = session
                    .raw_counters
                    .memory_match
                    .as_ref()
                    .ok_or_else(|| missing_counters(session, "memoryMatch"))?;
                let (dims, flags) = normalize_memory_match(counters, time_taken, &config.memory_match);
                if flags.contains(&QualityFlag::DegenerateTotals) {
                    warn!(session_id = %session.session_id, "memory match with zero pairs");
                }
                Ok(NormalizedSession {
                    assessment_type: session.assessment_type,
                    completion_ratio: dims.working_memory,
                    dimensions: Dimensions::MemoryMatch(dims),
                    quality_flags: flags,
                })
            }
            AssessmentType::MatchPieces => {
                let counters = session
                    .raw_counters
                    .match_pieces
                    .as_ref()
                    .ok_or_else(|| missing_counters(session, "matchPieces"))?;
                let (dims, flags) = normalize_match_pieces(counters, time_taken, &config.match_pieces);
                if flags.contains(&QualityFlag::DegenerateTotals) {
                    warn!(session_id = %session.session_id, "match pieces with zero images");
                }
                Ok(NormalizedSession {
                    assessment_type: session.assessment_type,
                    completion_ratio: dims.accuracy,
                    dimensions: Dimensions::MatchPieces(dims),
                    quality_flags: flags,
                })
            }
            AssessmentType::AptitudeTest => {
                let total = session.items.len() as f64;
                let correct = session.items.iter().filter(|q| q.is_correct).count() as f64;
                let attempted = session.items.iter().filter(|q| q.is_attempted()).count();

                let mut flags = Vec::new();
                if session.items.is_empty() {
                    flags.push(QualityFlag::NoItems);
                } else if attempted == 0 {
                    flags.push(QualityFlag::NoAttemptedItems);
                }

                Ok(NormalizedSession {
                    assessment_type: session.assessment_type,
                    completion_ratio: clamp01(safe_ratio(attempted as f64, total).unwrap_or(0.0)),
                    dimensions: Dimensions::AptitudeTest(AptitudeDimensions {
                        accuracy: clamp01(safe_ratio(correct, total).unwrap_or(0.0)),
                    }),
                    quality_flags: flags,
                })
            }
        }
    }
}

fn missing_counters(session: &TelemetrySession, counters: &str) -> ScoreError {
    ValidationError::MissingCounters {
        assessment: session.assessment_type.as_str().to_string(),
        counters: counters.to_string(),
    }
    .into()
}

/// Normalize memory-match counters
fn normalize_memory_match(
    counters: &MemoryMatchCounters,
    time_taken_sec: f64,
    config: &MemoryMatchConfig,
) -> (MemoryMatchDimensions, Vec<QualityFlag>) {
    let mut flags = Vec::new();
    let total_pairs = counters.total_pairs as f64;
    let correct_pairs = counters.correct_pairs as f64;

    if counters.total_pairs == 0 {
        flags.push(QualityFlag::DegenerateTotals);
    }
    // One flip pair or less and nothing matched
    if counters.correct_pairs == 0 && counters.total_clicks / 2 <= 1 {
        flags.push(QualityFlag::NoMeaningfulInteraction);
    }

    let working_memory = safe_ratio(correct_pairs, total_pairs)
        .map(clamp01)
        .unwrap_or(0.0);

    // Nearby wrong pairs are partially forgiven
    let effective_errors = (counters.incorrect_clicks as f64
        - config.nearby_forgiveness * counters.nearby_clicks as f64)
        .max(0.0);
    let attention_control = safe_ratio(effective_errors, total_pairs)
        .map(|rate| clamp01(1.0 - rate))
        .unwrap_or(0.0);

    let processing_speed = processing_speed(time_taken_sec, config.max_time_sec);

    let excess_clicks = (counters.total_clicks as f64
        - config.optimal_clicks_per_pair * correct_pairs)
        .max(0.0);
    let strategic_efficiency = safe_ratio(excess_clicks, config.excess_click_allowance * total_pairs)
        .map(|rate| clamp01(1.0 - rate))
        .unwrap_or(0.0);

    (
        MemoryMatchDimensions {
            working_memory,
            attention_control,
            processing_speed,
            strategic_efficiency,
        },
        flags,
    )
}

/// Normalize match-pieces counters
fn normalize_match_pieces(
    counters: &MatchPiecesCounters,
    time_taken_sec: f64,
    config: &MatchPiecesConfig,
) -> (MatchPiecesDimensions, Vec<QualityFlag>) {
    let mut flags = Vec::new();
    let total_pieces = config.total_pieces as f64;
    let correct = counters.total_correct_placements() as f64;

    if counters.total_images == 0 {
        flags.push(QualityFlag::DegenerateTotals);
    }

    let accuracy = safe_ratio(correct, total_pieces).map(clamp01).unwrap_or(0.0);
    let completion = safe_ratio(counters.images_completed as f64, counters.total_images as f64)
        .map(clamp01)
        .unwrap_or(0.0);

    // Each correct placement costs one move under optimal play
    let extra_moves = (counters.effective_total_moves() as f64 - correct).max(0.0);
    let efficiency = safe_ratio(extra_moves, total_pieces * config.excess_move_allowance)
        .map(|rate| clamp01(1.0 - rate))
        .unwrap_or(0.0);

    let speed = processing_speed(time_taken_sec, config.max_time_sec);

    let swap_efficiency = safe_ratio(counters.total_swaps() as f64, total_pieces * config.swap_allowance)
        .map(|rate| clamp01(1.0 - rate))
        .unwrap_or(0.0);

    let sequential_bonus = sequential_bonus(counters.images_completed, &config.sequential_bonus);
    let spatial_reasoning = clamp01(
        swap_efficiency * config.swap_efficiency_weight
            + sequential_bonus
            + accuracy * config.accuracy_weight_in_spatial,
    );

    (
        MatchPiecesDimensions {
            accuracy,
            completion,
            efficiency,
            speed,
            swap_efficiency,
            sequential_bonus,
            spatial_reasoning,
        },
        flags,
    )
}

/// Faster is better; zero at or beyond the solve window
fn processing_speed(time_taken_sec: f64, max_time_sec: f64) -> f64 {
    safe_ratio(time_taken_sec, max_time_sec)
        .map(|ratio| clamp01(1.0 - ratio))
        .unwrap_or(0.0)
}

/// Cumulative bonus for each completed image, in order
fn sequential_bonus(images_completed: u32, steps: &[f64; 3]) -> f64 {
    steps
        .iter()
        .take(images_completed.min(3) as usize)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EndReason, PerImageResult};
    use chrono::{TimeZone, Utc};

    fn memory_counters() -> MemoryMatchCounters {
        MemoryMatchCounters {
            total_pairs: 10,
            correct_pairs: 10,
            total_clicks: 20,
            incorrect_clicks: 0,
            nearby_clicks: 0,
            time_taken_seconds: Some(60.0),
        }
    }

    fn pieces_counters() -> MatchPiecesCounters {
        MatchPiecesCounters {
            total_images: 3,
            images_completed: 1,
            per_image: vec![
                PerImageResult { image_index: 0, correct_placements: 9, swap_count: 2, move_count: 11 },
                PerImageResult { image_index: 1, correct_placements: 1, swap_count: 1, move_count: 4 },
                PerImageResult { image_index: 2, correct_placements: 0, swap_count: 0, move_count: 0 },
            ],
            total_moves: Some(15),
            time_taken_seconds: Some(90.0),
        }
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(1.0, 4.0), Some(0.25));
        assert_eq!(safe_ratio(1.0, 0.0), None);
    }

    #[test]
    fn test_memory_match_perfect_game() {
        let config = MemoryMatchConfig::default();
        let (dims, flags) = normalize_memory_match(&memory_counters(), 60.0, &config);

        assert_eq!(dims.working_memory, 1.0);
        assert_eq!(dims.attention_control, 1.0);
        assert_eq!(dims.strategic_efficiency, 1.0);
        assert!((dims.processing_speed - (1.0 - 60.0 / 180.0)).abs() < 1e-12);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_nearby_clicks_are_partially_forgiven() {
        let config = MemoryMatchConfig::default();
        let mut counters = memory_counters();
        counters.incorrect_clicks = 4;
        counters.nearby_clicks = 0;
        let (strict, _) = normalize_memory_match(&counters, 60.0, &config);

        counters.nearby_clicks = 4;
        let (forgiving, _) = normalize_memory_match(&counters, 60.0, &config);

        // 1 - 4/10 vs 1 - (4 - 1.2)/10
        assert!((strict.attention_control - 0.6).abs() < 1e-12);
        assert!((forgiving.attention_control - 0.72).abs() < 1e-12);
    }

    #[test]
    fn test_excess_clicks_reduce_strategic_efficiency() {
        let config = MemoryMatchConfig::default();
        let mut counters = memory_counters();
        counters.total_clicks = 40;
        let (dims, _) = normalize_memory_match(&counters, 60.0, &config);

        // 20 excess clicks over an allowance of 40
        assert!((dims.strategic_efficiency - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_pairs_is_degenerate_not_an_error() {
        let config = MemoryMatchConfig::default();
        let counters = MemoryMatchCounters {
            total_pairs: 0,
            correct_pairs: 0,
            total_clicks: 0,
            incorrect_clicks: 0,
            nearby_clicks: 0,
            time_taken_seconds: Some(10.0),
        };
        let (dims, flags) = normalize_memory_match(&counters, 10.0, &config);

        assert_eq!(dims.working_memory, 0.0);
        assert_eq!(dims.attention_control, 0.0);
        assert_eq!(dims.strategic_efficiency, 0.0);
        assert!(dims.processing_speed.is_finite());
        assert!(flags.contains(&QualityFlag::DegenerateTotals));
        assert!(flags.contains(&QualityFlag::NoMeaningfulInteraction));
    }

    #[test]
    fn test_time_beyond_window_is_zero_speed() {
        assert_eq!(processing_speed(400.0, 180.0), 0.0);
        assert_eq!(processing_speed(0.0, 180.0), 1.0);
    }

    #[test]
    fn test_match_pieces_dimensions() {
        let config = MatchPiecesConfig::default();
        let (dims, flags) = normalize_match_pieces(&pieces_counters(), 90.0, &config);

        assert!((dims.accuracy - 10.0 / 27.0).abs() < 1e-12);
        assert!((dims.completion - 1.0 / 3.0).abs() < 1e-12);
        assert!((dims.efficiency - (1.0 - 5.0 / 81.0)).abs() < 1e-12);
        assert!((dims.speed - 0.5).abs() < 1e-12);
        assert!((dims.swap_efficiency - (1.0 - 3.0 / 54.0)).abs() < 1e-12);
        assert!((dims.sequential_bonus - 0.1).abs() < 1e-12);

        let expected_spatial = (1.0 - 3.0 / 54.0) * 0.7 + 0.1 + (10.0 / 27.0) * 0.15;
        assert!((dims.spatial_reasoning - expected_spatial).abs() < 1e-12);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_sequential_bonus_is_cumulative() {
        let steps = [0.10, 0.10, 0.15];
        assert_eq!(sequential_bonus(0, &steps), 0.0);
        assert!((sequential_bonus(1, &steps) - 0.10).abs() < 1e-12);
        assert!((sequential_bonus(2, &steps) - 0.20).abs() < 1e-12);
        assert!((sequential_bonus(3, &steps) - 0.35).abs() < 1e-12);
        assert!((sequential_bonus(7, &steps) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_zero_images_is_degenerate() {
        let config = MatchPiecesConfig::default();
        let counters = MatchPiecesCounters {
            total_images: 0,
            images_completed: 0,
            per_image: vec![],
            total_moves: Some(0),
            time_taken_seconds: Some(0.0),
        };
        let (dims, flags) = normalize_match_pieces(&counters, 0.0, &config);
        assert_eq!(dims.completion, 0.0);
        assert!(flags.contains(&QualityFlag::DegenerateTotals));
    }

    #[test]
    fn test_normalize_session_dispatch() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut session = TelemetrySession::start("learner", AssessmentType::MemoryMatch, start);
        session.set_memory_match_counters(memory_counters()).unwrap();
        session
            .finalize(EndReason::Completed, start + chrono::Duration::seconds(75))
            .unwrap();

        let normalized = TelemetryNormalizer::normalize(&session, &ScoringConfig::default()).unwrap();
        assert_eq!(normalized.completion_ratio, 1.0);

        // Explicit time wins over the 75 s wall clock
        let map = normalized.dimensions.to_map();
        assert!((map["processing_speed"] - (1.0 - 60.0 / 180.0)).abs() < 1e-12);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_normalize_reports_missing_counters() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let session = TelemetrySession::start("learner", AssessmentType::MatchPieces, start);
        let result = TelemetryNormalizer::normalize(&session, &ScoringConfig::default());
        assert!(matches!(
            result,
            Err(ScoreError::Validation(ValidationError::MissingCounters { .. }))
        ));
    }
}

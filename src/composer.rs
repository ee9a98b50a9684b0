//! Score composition
//!
//! Combines per-dimension scores into one composite in [0,1] using the weight table
//! configured for the assessment type.

use crate::config::{MatchPiecesWeights, MemoryMatchWeights, ScoringConfig};
use crate::normalizer::{clamp01, Dimensions, MatchPiecesDimensions, MemoryMatchDimensions};

/// Weighted composer for normalized dimensions
pub struct ScoreComposer;

impl ScoreComposer {
    /// Weighted sum of the dimension scores, before any penalty
    pub fn compose(dimensions: &Dimensions, config: &ScoringConfig) -> f64 {
        match dimensions {
            Dimensions::MemoryMatch(d) => compose_memory_match(d, &config.memory_match.weights),
            Dimensions::MatchPieces(d) => compose_match_pieces(d, &config.match_pieces.weights),
            // Accuracy carries the full weight
            Dimensions::AptitudeTest(d) => clamp01(d.accuracy),
        }
    }
}

fn compose_memory_match(d: &MemoryMatchDimensions, w: &MemoryMatchWeights) -> f64 {
    clamp01(
        w.working_memory * d.working_memory
            + w.attention_control * d.attention_control
            + w.processing_speed * d.processing_speed
            + w.strategic_efficiency * d.strategic_efficiency,
    )
}

fn compose_match_pieces(d: &MatchPiecesDimensions, w: &MatchPiecesWeights) -> f64 {
    clamp01(
        w.accuracy * d.accuracy
            + w.completion * d.completion
            + w.efficiency * d.efficiency
            + w.speed * d.speed
            + w.spatial_reasoning * d.spatial_reasoning,
    )
}

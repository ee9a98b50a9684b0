//! Scoring configuration
//!
//! Every constant, weight table and band threshold the engine uses lives here,
//! grouped per assessment type. Defaults reproduce the production tables; a JSON
//! document may override any subset of them.

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::types::{AssessmentType, Locale};

/// Memory-match solve window in seconds
pub const MEMORY_MATCH_MAX_TIME_SEC: f64 = 180.0;

/// Share of a nearby wrong pair that is forgiven as partial recall
pub const NEARBY_CLICK_FORGIVENESS: f64 = 0.3;

/// Clicks per pair under optimal play
pub const OPTIMAL_CLICKS_PER_PAIR: f64 = 2.0;

/// Excess-click normalizer, in multiples of the pair count
pub const EXCESS_CLICK_ALLOWANCE: f64 = 4.0;

/// 3 images x 9 pieces
pub const MATCH_PIECES_TOTAL_PIECES: u32 = 27;

/// Match-pieces solve window in seconds
pub const MATCH_PIECES_MAX_TIME_SEC: f64 = 180.0;

/// Excess-move normalizer, in multiples of the piece count
pub const EXCESS_MOVE_ALLOWANCE: f64 = 3.0;

/// Swap normalizer, in multiples of the piece count
pub const SWAP_ALLOWANCE: f64 = 2.0;

/// Exit penalty at zero completion
pub const EXIT_PENALTY_WEIGHT: f64 = 0.25;

/// Flat time-out penalty
pub const TIMEOUT_PENALTY: f64 = 0.08;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Memory-match weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryMatchWeights {
    pub working_memory: f64,
    pub attention_control: f64,
    pub processing_speed: f64,
    pub strategic_efficiency: f64,
}

impl Default for MemoryMatchWeights {
    fn default() -> Self {
        Self {
            working_memory: 0.40,
            attention_control: 0.25,
            processing_speed: 0.20,
            strategic_efficiency: 0.15,
        }
    }
}

impl MemoryMatchWeights {
    fn values(&self) -> [f64; 4] {
        [
            self.working_memory,
            self.attention_control,
            self.processing_speed,
            self.strategic_efficiency,
        ]
    }
}

/// Match-pieces weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchPiecesWeights {
    pub accuracy: f64,
    pub completion: f64,
    pub efficiency: f64,
    pub speed: f64,
    pub spatial_reasoning: f64,
}

impl Default for MatchPiecesWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.30,
            completion: 0.25,
            efficiency: 0.15,
            speed: 0.15,
            spatial_reasoning: 0.15,
        }
    }
}

impl MatchPiecesWeights {
    fn values(&self) -> [f64; 5] {
        [
            self.accuracy,
            self.completion,
            self.efficiency,
            self.speed,
            self.spatial_reasoning,
        ]
    }
}

/// Memory-match constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryMatchConfig {
    pub max_time_sec: f64,
    pub nearby_forgiveness: f64,
    pub optimal_clicks_per_pair: f64,
    pub excess_click_allowance: f64,
    pub weights: MemoryMatchWeights,
}

impl Default for MemoryMatchConfig {
    fn default() -> Self {
        Self {
            max_time_sec: MEMORY_MATCH_MAX_TIME_SEC,
            nearby_forgiveness: NEARBY_CLICK_FORGIVENESS,
            optimal_clicks_per_pair: OPTIMAL_CLICKS_PER_PAIR,
            excess_click_allowance: EXCESS_CLICK_ALLOWANCE,
            weights: MemoryMatchWeights::default(),
        }
    }
}

/// Match-pieces constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchPiecesConfig {
    pub total_pieces: u32,
    pub max_time_sec: f64,
    pub excess_move_allowance: f64,
    pub swap_allowance: f64,
    /// Bonus granted on completing the 1st, 2nd and 3rd image
    pub sequential_bonus: [f64; 3],
    pub swap_efficiency_weight: f64,
    pub accuracy_weight_in_spatial: f64,
    pub weights: MatchPiecesWeights,
}

impl Default for MatchPiecesConfig {
    fn default() -> Self {
        Self {
            total_pieces: MATCH_PIECES_TOTAL_PIECES,
            max_time_sec: MATCH_PIECES_MAX_TIME_SEC,
            excess_move_allowance: EXCESS_MOVE_ALLOWANCE,
            swap_allowance: SWAP_ALLOWANCE,
            sequential_bonus: [0.10, 0.10, 0.15],
            swap_efficiency_weight: 0.7,
            accuracy_weight_in_spatial: 0.15,
            weights: MatchPiecesWeights::default(),
        }
    }
}

/// Termination penalty constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PenaltyConfig {
    pub exit_weight: f64,
    pub timeout_penalty: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            exit_weight: EXIT_PENALTY_WEIGHT,
            timeout_penalty: TIMEOUT_PENALTY,
        }
    }
}

/// Lower bounds of the four upper bands, highest band first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandThresholds {
    pub puzzle: [f64; 4],
    pub aptitude: [f64; 4],
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            puzzle: [0.85, 0.70, 0.55, 0.40],
            aptitude: [0.90, 0.75, 0.60, 0.40],
        }
    }
}

impl BandThresholds {
    pub fn for_assessment(&self, assessment: AssessmentType) -> &[f64; 4] {
        match assessment {
            AssessmentType::MemoryMatch | AssessmentType::MatchPieces => &self.puzzle,
            AssessmentType::AptitudeTest => &self.aptitude,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub memory_match: MemoryMatchConfig,
    pub match_pieces: MatchPiecesConfig,
    pub penalty: PenaltyConfig,
    pub bands: BandThresholds,
    pub locale: Locale,
}

impl ScoringConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        let config: ScoringConfig = serde_json::from_str(json)
            .map_err(|e| ScoreError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ScoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check weight tables, thresholds and normalizers
    pub fn validate(&self) -> Result<(), ScoreError> {
        check_weights("memoryMatch.weights", &self.memory_match.weights.values())?;
        check_weights("matchPieces.weights", &self.match_pieces.weights.values())?;

        check_positive("memoryMatch.maxTimeSec", self.memory_match.max_time_sec)?;
        check_positive(
            "memoryMatch.excessClickAllowance",
            self.memory_match.excess_click_allowance,
        )?;
        check_unit("memoryMatch.nearbyForgiveness", self.memory_match.nearby_forgiveness)?;
        check_positive("matchPieces.maxTimeSec", self.match_pieces.max_time_sec)?;
        check_positive(
            "matchPieces.totalPieces",
            self.match_pieces.total_pieces as f64,
        )?;
        check_positive(
            "matchPieces.excessMoveAllowance",
            self.match_pieces.excess_move_allowance,
        )?;
        check_positive("matchPieces.swapAllowance", self.match_pieces.swap_allowance)?;
        for bonus in self.match_pieces.sequential_bonus {
            check_unit("matchPieces.sequentialBonus", bonus)?;
        }
        check_unit(
            "matchPieces.swapEfficiencyWeight",
            self.match_pieces.swap_efficiency_weight,
        )?;
        check_unit(
            "matchPieces.accuracyWeightInSpatial",
            self.match_pieces.accuracy_weight_in_spatial,
        )?;

        check_unit("penalty.exitWeight", self.penalty.exit_weight)?;
        check_unit("penalty.timeoutPenalty", self.penalty.timeout_penalty)?;

        check_thresholds("bands.puzzle", &self.bands.puzzle)?;
        check_thresholds("bands.aptitude", &self.bands.aptitude)?;
        Ok(())
    }
}

fn check_weights(name: &str, weights: &[f64]) -> Result<(), ScoreError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ScoreError::ConfigError(format!(
            "{name} must be non-negative"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ScoreError::ConfigError(format!(
            "{name} must sum to 1.0 (got {sum})"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), ScoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScoreError::ConfigError(format!(
            "{name} must be positive (got {value})"
        )));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<(), ScoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScoreError::ConfigError(format!(
            "{name} must lie in [0, 1] (got {value})"
        )));
    }
    Ok(())
}

fn check_thresholds(name: &str, thresholds: &[f64; 4]) -> Result<(), ScoreError> {
    for t in thresholds {
        if !(*t > 0.0 && *t <= 1.0) {
            return Err(ScoreError::ConfigError(format!(
                "{name} thresholds must lie in (0, 1] (got {t})"
            )));
        }
    }
    if thresholds.windows(2).any(|w| w[0] <= w[1]) {
        return Err(ScoreError::ConfigError(format!(
            "{name} thresholds must be strictly descending"
        )));
    }
    Ok(())
}

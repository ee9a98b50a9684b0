//! Termination penalty
//!
//! Deduction applied to the raw composite according to how the session ended:
//! - Completed: nothing
//! - ExitedEarly: proportional to the unfinished share of the task
//! - TimedOut: flat
//!
//! Aptitude tests are exempt; unanswered questions already lower their accuracy.

use crate::config::PenaltyConfig;
use crate::normalizer::clamp01;
use crate::types::{AssessmentType, EndReason};

/// Final score after the penalty, before and after rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenalizedScore {
    pub penalty: f64,
    /// clamp01(raw - penalty)
    pub final_score: f64,
    /// round(final_score * 100)
    pub composite: u8,
}

/// Penalty policy keyed by end reason
pub struct TerminationPenaltyPolicy;

impl TerminationPenaltyPolicy {
    /// Penalty in [0,1] for a session
    pub fn penalty(
        assessment: AssessmentType,
        end_reason: EndReason,
        completion_ratio: f64,
        config: &PenaltyConfig,
    ) -> f64 {
        if assessment == AssessmentType::AptitudeTest {
            return 0.0;
        }
        let penalty = match end_reason {
            EndReason::Completed => 0.0,
            EndReason::ExitedEarly => config.exit_weight * (1.0 - clamp01(completion_ratio)),
            EndReason::TimedOut => config.timeout_penalty,
        };
        clamp01(penalty)
    }

    /// Subtract the penalty and scale to an integer composite
    pub fn apply(raw: f64, penalty: f64) -> PenalizedScore {
        let penalty = clamp01(penalty);
        let final_score = clamp01(raw - penalty);
        PenalizedScore {
            penalty,
            final_score,
            composite: to_composite(final_score),
        }
    }
}

/// round(score * 100) as an integer in [0,100]
pub fn to_composite(score: f64) -> u8 {
    (clamp01(score) * 100.0).round() as u8
}

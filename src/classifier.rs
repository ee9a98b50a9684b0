//! Performance classification
//!
//! Maps a final score to an ordinal band. Boundary values belong to the higher band.

use crate::config::BandThresholds;
use crate::messages;
use crate::normalizer::clamp01;
use crate::types::{AssessmentType, Locale, PerformanceBand};

/// Floating-point slack when comparing against a band's lower bound
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Band plus its rendered label and feedback
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub band: PerformanceBand,
    pub label: &'static str,
    pub feedback: &'static str,
}

pub struct PerformanceClassifier;

impl PerformanceClassifier {
    /// Band for a pre-rounding final score
    pub fn band(
        assessment: AssessmentType,
        final_score: f64,
        thresholds: &BandThresholds,
    ) -> PerformanceBand {
        let score = clamp01(final_score);
        let bounds = thresholds.for_assessment(assessment);

        bounds
            .iter()
            .zip(PerformanceBand::DESCENDING.iter())
            .find(|(lower, _)| score + BOUNDARY_TOLERANCE >= **lower)
            .map(|(_, band)| *band)
            .unwrap_or(PerformanceBand::Low)
    }

    pub fn classify(
        assessment: AssessmentType,
        final_score: f64,
        thresholds: &BandThresholds,
        locale: Locale,
    ) -> Classification {
        let band = Self::band(assessment, final_score, thresholds);
        Classification {
            band,
            label: messages::band_label(assessment, band),
            feedback: messages::feedback(assessment, band, locale),
        }
    }
}

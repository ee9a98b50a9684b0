//! Cogniscore - Deterministic scoring engine for assessment interaction telemetry
//!
//! Cogniscore turns a finalized telemetry session from a memory-matching game, a
//! tile-reconstruction puzzle or an aptitude test into a score breakdown through a
//! deterministic pipeline: validation → normalization → weighted composition →
//! termination penalty → classification → (aptitude) behavior analysis and
//! recommendations.
//!
//! ## Surfaces
//!
//! - **Library**: `score_session` (one-shot JSON), `ScoringEngine` (configured, shareable)
//!   and `ScoringProcessor` (with progress history)
//! - **C ABI**: `ffi` module, JSON strings in and out
//! - **CLI**: `cogniscore` binary behind the `cli` feature

pub mod aptitude;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod error;
pub mod history;
pub mod messages;
pub mod normalizer;
pub mod penalty;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aptitude::{AptitudeReport, BehaviorMetricsEngine, LearningBehavior, RecommendationGenerator};
pub use classifier::PerformanceClassifier;
pub use composer::ScoreComposer;
pub use config::ScoringConfig;
pub use error::{ScoreError, ValidationError};
pub use history::{ProgressContext, ProgressOverview, ProgressTracker};
pub use normalizer::{clamp01, TelemetryNormalizer};
pub use penalty::TerminationPenaltyPolicy;
pub use pipeline::{parse_session, score_session, ScoredAttempt, ScoringEngine, ScoringProcessor};
pub use types::{
    AssessmentType, EndReason, Locale, PerformanceBand, QuestionTelemetry, ScoreBreakdown,
    TelemetrySession,
};

/// Engine version embedded in every score breakdown
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "cogniscore";

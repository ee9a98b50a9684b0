//! Data types produced by the aptitude-test analytics

use serde::{Deserialize, Serialize};

use crate::types::Difficulty;

/// Learning behavior sub-scores, each an integer in [0,100]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningBehavior {
    pub focus_score: u32,
    pub consistency_score: u32,
    pub thoughtfulness_score: u32,
    /// Higher means more guessing
    pub random_clicking_indicator: u32,
    pub hints_utilization: u32,
    pub overall_learning_score: u32,
}

impl LearningBehavior {
    /// Scores reported when a test has no item telemetry
    pub fn neutral() -> Self {
        Self {
            focus_score: 50,
            consistency_score: 50,
            thoughtfulness_score: 50,
            random_clicking_indicator: 0,
            hints_utilization: 0,
            overall_learning_score: 50,
        }
    }
}

/// Answer counts for one test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTally {
    pub correct: u32,
    /// Attempted and wrong
    pub incorrect: u32,
    pub unattempted: u32,
    pub total: u32,
    /// round(correct / total * 100)
    pub percentage: u32,
}

/// Results for one difficulty level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    pub attempted: u32,
    pub correct: u32,
    /// round(correct / attempted * 100), 0 when nothing was attempted
    pub accuracy: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub easy: DifficultyStats,
    pub medium: DifficultyStats,
    pub hard: DifficultyStats,
}

impl DifficultyBreakdown {
    pub fn get(&self, difficulty: Difficulty) -> &DifficultyStats {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn get_mut(&mut self, difficulty: Difficulty) -> &mut DifficultyStats {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Timing over attempted items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedAnalytics {
    /// Rounded to whole seconds
    pub average_time_per_item: f64,
    pub fastest_item_seconds: f64,
    pub slowest_item_seconds: f64,
    pub answered_under_time: u32,
    pub answered_over_time: u32,
}

/// Condition-triggered advice, in rule order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ExcellentPerformance,
    GoodPerformance,
    NeedsImprovement,
    FoundationalWork,
    LowFocus,
    StrongFocus,
    SlowDown,
    SpeedUp,
    IdealPace,
    StopGuessing,
    SomeRushing,
    Deliberate,
    ThinkMore,
    StrongThoughtfulness,
    TrustYourAnswers,
    StaySystematic,
    RelyLessOnHints,
    GoodHintUse,
    UseHints,
    StrengthenBasics,
    GoodOnMedium,
    PracticeMedium,
    StrongOnHard,
    LearnAdvancedTechniques,
    ExcellentLearning,
    GoodLearning,
    ImproveLearningStrategy,
    ChangeLearningApproach,
    ReinforceStrengths(Vec<Difficulty>),
}

/// Aptitude section of a score breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AptitudeReport {
    pub tally: AnswerTally,
    pub difficulty_breakdown: DifficultyBreakdown,
    pub speed: SpeedAnalytics,
    pub learning_behavior: LearningBehavior,
    pub strength_areas: Vec<Difficulty>,
    pub weakness_areas: Vec<Difficulty>,
    pub recommendation_kinds: Vec<RecommendationKind>,
}

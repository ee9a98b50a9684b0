//! Localized message catalog
//!
//! Band labels are fixed identifiers and are not translated. Feedback sentences and
//! recommendations have one rendering per locale.

use crate::aptitude::RecommendationKind;
use crate::types::{AssessmentType, Difficulty, Locale, PerformanceBand};

/// Assessment-specific label for a band
pub fn band_label(assessment: AssessmentType, band: PerformanceBand) -> &'static str {
    use PerformanceBand::*;
    match (assessment, band) {
        (AssessmentType::MemoryMatch, Exceptional) => "Exceptional",
        (AssessmentType::MemoryMatch, High) => "High",
        (AssessmentType::MemoryMatch, Average) => "Average",
        (AssessmentType::MemoryMatch, BelowAverage) => "Below Average",
        (AssessmentType::MemoryMatch, Low) => "Low",

        (AssessmentType::MatchPieces, Exceptional) => "Exceptional",
        (AssessmentType::MatchPieces, High) => "Strong",
        (AssessmentType::MatchPieces, Average) => "Moderate",
        (AssessmentType::MatchPieces, BelowAverage) => "Developing",
        (AssessmentType::MatchPieces, Low) => "Needs Practice",

        (AssessmentType::AptitudeTest, Exceptional) => "Outstanding",
        (AssessmentType::AptitudeTest, High) => "Very Good",
        (AssessmentType::AptitudeTest, Average) => "Good",
        (AssessmentType::AptitudeTest, BelowAverage) => "Average",
        (AssessmentType::AptitudeTest, Low) => "Needs Improvement",
    }
}

/// One fixed feedback sentence per assessment, band and locale
pub fn feedback(assessment: AssessmentType, band: PerformanceBand, locale: Locale) -> &'static str {
    use PerformanceBand::*;
    match locale {
        Locale::En => match (assessment, band) {
            (AssessmentType::MemoryMatch, Exceptional) => {
                "Excellent recall and strategic thinking."
            }
            (AssessmentType::MemoryMatch, High) => {
                "Strong working memory and efficient search behavior."
            }
            (AssessmentType::MemoryMatch, Average) => {
                "Typical cognitive performance with room to improve."
            }
            (AssessmentType::MemoryMatch, BelowAverage) => "Memory and attention need practice.",
            (AssessmentType::MemoryMatch, Low) => {
                "Weak recall and attention control. Keep practicing."
            }

            (AssessmentType::MatchPieces, Exceptional) => {
                "Outstanding spatial reasoning and precise placement."
            }
            (AssessmentType::MatchPieces, High) => {
                "Strong visual assembly with few wasted moves."
            }
            (AssessmentType::MatchPieces, Average) => {
                "Reasonable spatial skills; plan placements before moving pieces."
            }
            (AssessmentType::MatchPieces, BelowAverage) => {
                "Spatial reasoning is developing. Study the whole image before starting."
            }
            (AssessmentType::MatchPieces, Low) => {
                "Piece placement needs practice. Start with corners and edges."
            }

            (AssessmentType::AptitudeTest, Exceptional) => {
                "Outstanding result. You have mastered this module."
            }
            (AssessmentType::AptitudeTest, High) => {
                "Very good result. A little more practice will take you to the top."
            }
            (AssessmentType::AptitudeTest, Average) => {
                "Good result. Focus on your weaker topics."
            }
            (AssessmentType::AptitudeTest, BelowAverage) => {
                "Average result. Revise the concepts and practice regularly."
            }
            (AssessmentType::AptitudeTest, Low) => {
                "This module needs more work. Start again from the basics."
            }
        },
        Locale::Hi => match (assessment, band) {
            (AssessmentType::MemoryMatch, Exceptional) => "उत्कृष्ट याददाश्त और रणनीतिक सोच।",
            (AssessmentType::MemoryMatch, High) => "मजबूत कार्यशील स्मृति और कुशल खोज व्यवहार।",
            (AssessmentType::MemoryMatch, Average) => {
                "सामान्य संज्ञानात्मक प्रदर्शन, सुधार की गुंजाइश है।"
            }
            (AssessmentType::MemoryMatch, BelowAverage) => "स्मृति और ध्यान को अभ्यास की आवश्यकता है।",
            (AssessmentType::MemoryMatch, Low) => {
                "कमजोर स्मृति पुनर्स्मरण और ध्यान नियंत्रण। अधिक अभ्यास करें।"
            }

            (AssessmentType::MatchPieces, Exceptional) => {
                "उत्कृष्ट स्थानिक तर्क और सटीक टुकड़े लगाना।"
            }
            (AssessmentType::MatchPieces, High) => "मजबूत दृश्य संयोजन, बहुत कम व्यर्थ चालें।",
            (AssessmentType::MatchPieces, Average) => {
                "ठीक-ठाक स्थानिक कौशल; टुकड़े हिलाने से पहले योजना बनाएं।"
            }
            (AssessmentType::MatchPieces, BelowAverage) => {
                "स्थानिक तर्क विकसित हो रहा है। शुरू करने से पहले पूरी तस्वीर देखें।"
            }
            (AssessmentType::MatchPieces, Low) => {
                "टुकड़े लगाने में अभ्यास की आवश्यकता है। कोनों और किनारों से शुरू करें।"
            }

            (AssessmentType::AptitudeTest, Exceptional) => {
                "उत्कृष्ट परिणाम! आपने इस मॉड्यूल में महारत हासिल कर ली है।"
            }
            (AssessmentType::AptitudeTest, High) => {
                "बहुत अच्छा परिणाम। थोड़ा और अभ्यास आपको शीर्ष पर ले जाएगा।"
            }
            (AssessmentType::AptitudeTest, Average) => {
                "अच्छा परिणाम। कमजोर विषयों पर ध्यान दें।"
            }
            (AssessmentType::AptitudeTest, BelowAverage) => {
                "औसत परिणाम। अवधारणाओं को दोहराएं और नियमित अभ्यास करें।"
            }
            (AssessmentType::AptitudeTest, Low) => {
                "इस मॉड्यूल पर अधिक काम की आवश्यकता है। मूल बातों से फिर शुरू करें।"
            }
        },
    }
}

/// Display name of a difficulty level
pub fn difficulty_label(difficulty: Difficulty, locale: Locale) -> &'static str {
    match (locale, difficulty) {
        (Locale::En, Difficulty::Easy) => "easy questions",
        (Locale::En, Difficulty::Medium) => "medium questions",
        (Locale::En, Difficulty::Hard) => "hard questions",
        (Locale::Hi, Difficulty::Easy) => "आसान प्रश्न",
        (Locale::Hi, Difficulty::Medium) => "मध्यम प्रश्न",
        (Locale::Hi, Difficulty::Hard) => "कठिन प्रश्न",
    }
}

/// Render one recommendation
pub fn recommendation(kind: &RecommendationKind, locale: Locale) -> String {
    use RecommendationKind::*;

    if let ReinforceStrengths(areas) = kind {
        let names: Vec<&str> = areas.iter().map(|d| difficulty_label(*d, locale)).collect();
        let joined = names.join(", ");
        return match locale {
            Locale::En => format!("Build on your strengths: you do well on {joined}. Keep it up!"),
            Locale::Hi => format!("अपनी ताकत का उपयोग करें: आप {joined} में अच्छे हैं। इसे बनाए रखें!"),
        };
    }

    let text = match locale {
        Locale::En => match kind {
            ExcellentPerformance => "Excellent performance! You are mastering this module. Keep up the level.",
            GoodPerformance => "Good performance! Give weaker areas more attention and aim for 80%.",
            NeedsImprovement => "Needs improvement. Revisit the concepts and practice regularly.",
            FoundationalWork => "The core concepts need more work. Start slowly and strengthen the basics.",
            LowFocus => "Stay focused: cut distractions and finish one question before moving on.",
            StrongFocus => "Excellent focus! You stayed concentrated throughout the test.",
            SlowDown => "Slow down: you are going too fast. Take 30-60 seconds to read each question carefully.",
            SpeedUp => "Pick up the pace: don't overthink. Your first response is often right (aim for 45-60 seconds per question).",
            IdealPace => "Ideal pace! You spend a sensible amount of time on each question.",
            StopGuessing => "Stop guessing: many questions were answered too quickly. Read the options and choose deliberately.",
            SomeRushing => "Some questions were rushed: weigh every option before guessing.",
            Deliberate => "Thoughtful approach! You answer deliberately rather than guessing.",
            ThinkMore => "Think more: spend 30-60 seconds on each question and compare the options.",
            StrongThoughtfulness => "Excellent thoughtfulness! You take the right amount of time to answer.",
            TrustYourAnswers => "Trust your answers: you change them too often. Your first thought is often right.",
            StaySystematic => "Stay systematic: too much jumping between questions. Work through them in order.",
            RelyLessOnHints => "Rely less on hints: try on your own first and open a hint only when stuck.",
            GoodHintUse => "Good use of hints! You use them strategically.",
            UseHints => "Use hints: they can help when you are stuck. Don't hesitate to open them.",
            StrengthenBasics => "Strengthen the basics: easy questions need improvement. Revisit the concepts.",
            GoodOnMedium => "Good work on medium questions! You are making steady progress.",
            PracticeMedium => "Practice more medium questions: solve a wider variety of problems.",
            StrongOnHard => "Excellent on hard questions! You can handle challenging problems.",
            LearnAdvancedTechniques => "For hard questions: learn advanced techniques and seek expert guidance.",
            ExcellentLearning => "Excellent learning behavior! You are learning effectively. Keep going!",
            GoodLearning => "Good learning approach. A few adjustments will make you even better.",
            ImproveLearningStrategy => "Your learning strategy needs work. Go slowly, think it through and practice regularly.",
            ChangeLearningApproach => "Change your learning approach: don't rush, pay attention and understand the concepts.",
            ReinforceStrengths(_) => "",
        },
        Locale::Hi => match kind {
            ExcellentPerformance => "उत्कृष्ट प्रदर्शन! आप इस मॉड्यूल में महारत हासिल कर रहे हैं। अपना स्तर बनाए रखें।",
            GoodPerformance => "अच्छा प्रदर्शन! कमजोर क्षेत्रों पर अधिक ध्यान दें और 80% के लक्ष्य के लिए प्रयास करें।",
            NeedsImprovement => "सुधार की आवश्यकता। अवधारणाओं को फिर से पढ़ें और नियमित अभ्यास करें।",
            FoundationalWork => "मूल अवधारणाओं पर अधिक काम की आवश्यकता। धीरे-धीरे शुरू करें और मूल बातें मजबूत करें।",
            LowFocus => "ध्यान केंद्रित करें: विकर्षणों को कम करें और एक प्रश्न को पूरा करने के बाद अगले पर जाएं।",
            StrongFocus => "उत्कृष्ट ध्यान केंद्रण! आप परीक्षा के दौरान केंद्रित रहे।",
            SlowDown => "धीमा करें: आप बहुत तेज़ जा रहे हैं। प्रत्येक प्रश्न को ध्यान से पढ़ने के लिए समय लें (30-60 सेकंड)।",
            SpeedUp => "गति बढ़ाएं: अत्यधिक विचार न करें। पहली प्रतिक्रिया अक्सर सही होती है (लक्ष्य: 45-60 सेकंड/प्रश्न)।",
            IdealPace => "आदर्श गति! आप प्रत्येक प्रश्न पर उचित समय बिता रहे हैं।",
            StopGuessing => "टुक्का मत लगाओ: कई प्रश्न बहुत जल्दी उत्तरित हुए। विकल्पों को पढ़ें और सोच-समझकर चुनें।",
            SomeRushing => "कुछ प्रश्नों पर जल्दबाजी: अनुमान लगाने से पहले सभी विकल्पों का मूल्यांकन करें।",
            Deliberate => "विचारशील दृष्टिकोण! आप अनुमान लगाने के बजाय सोच-समझकर उत्तर दे रहे हैं।",
            ThinkMore => "अधिक सोचें: प्रत्येक प्रश्न पर 30-60 सेकंड बिताएं। विकल्पों की तुलना करें।",
            StrongThoughtfulness => "उत्कृष्ट विचारशीलता! आप उचित समय लेकर उत्तर दे रहे हैं।",
            TrustYourAnswers => "अपने उत्तरों पर विश्वास करें: बहुत सारे उत्तर बदल रहे हैं। पहली सोच अक्सर सही होती है।",
            StaySystematic => "व्यवस्थित रहें: प्रश्नों के बीच बहुत अधिक कूदना। क्रम में आगे बढ़ें।",
            RelyLessOnHints => "संकेतों पर कम निर्भर रहें: पहले स्वयं प्रयास करें। संकेत केवल फंसने पर देखें।",
            GoodHintUse => "संकेतों का अच्छा उपयोग! आप उन्हें रणनीतिक रूप से उपयोग कर रहे हैं।",
            UseHints => "संकेतों का उपयोग करें: जब फंस जाएं तो संकेत मदद कर सकते हैं। उनका उपयोग करने में संकोच न करें।",
            StrengthenBasics => "मूल बातें मजबूत करें: आसान प्रश्नों में सुधार की आवश्यकता। अवधारणाओं को फिर से पढ़ें।",
            GoodOnMedium => "मध्यम स्तर में अच्छा! आप अच्छी प्रगति कर रहे हैं।",
            PracticeMedium => "मध्यम प्रश्नों पर अधिक अभ्यास करें: विभिन्न प्रकार के प्रश्नों को हल करें।",
            StrongOnHard => "कठिन प्रश्नों में उत्कृष्ट! आप चुनौतीपूर्ण समस्याओं को संभाल सकते हैं।",
            LearnAdvancedTechniques => "कठिन प्रश्नों के लिए: उन्नत तकनीकें सीखें और विशेषज्ञों से मार्गदर्शन लें।",
            ExcellentLearning => "उत्कृष्ट सीखने का व्यवहार! आप प्रभावी ढंग से सीख रहे हैं। ऐसे ही जारी रखें!",
            GoodLearning => "अच्छा सीखने का दृष्टिकोण। कुछ सुधारों के साथ आप और भी बेहतर कर सकते हैं।",
            ImproveLearningStrategy => "सीखने की रणनीति में सुधार की आवश्यकता। धीरे-धीरे, सोच-समझकर और नियमित अभ्यास करें।",
            ChangeLearningApproach => "सीखने के दृष्टिकोण को बदलें: जल्दबाजी न करें, ध्यान दें और अवधारणाओं को समझें।",
            ReinforceStrengths(_) => "",
        },
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_labels_are_distinct_per_assessment() {
        for assessment in [
            AssessmentType::MemoryMatch,
            AssessmentType::MatchPieces,
            AssessmentType::AptitudeTest,
        ] {
            let mut labels: Vec<&str> = PerformanceBand::DESCENDING
                .iter()
                .map(|b| band_label(assessment, *b))
                .collect();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), 5, "{:?}", assessment);
        }
    }

    #[test]
    fn test_feedback_has_both_locales() {
        for band in PerformanceBand::DESCENDING {
            let en = feedback(AssessmentType::MatchPieces, band, Locale::En);
            let hi = feedback(AssessmentType::MatchPieces, band, Locale::Hi);
            assert!(!en.is_empty());
            assert!(!hi.is_empty());
            assert_ne!(en, hi);
        }
    }

    #[test]
    fn test_strength_reinforcement_lists_areas() {
        let kind = RecommendationKind::ReinforceStrengths(vec![Difficulty::Easy, Difficulty::Hard]);
        let en = recommendation(&kind, Locale::En);
        assert!(en.contains("easy questions, hard questions"));

        let hi = recommendation(&kind, Locale::Hi);
        assert!(hi.contains("आसान प्रश्न, कठिन प्रश्न"));
    }

    #[test]
    fn test_recommendation_renders_in_locale() {
        let en = recommendation(&RecommendationKind::IdealPace, Locale::En);
        assert!(en.starts_with("Ideal pace"));
        let hi = recommendation(&RecommendationKind::IdealPace, Locale::Hi);
        assert!(hi.starts_with("आदर्श गति"));
    }
}

//! Answer analysis through the text generator.

use crate::error::CollaboratorError;
use crate::llm::prompts::analysis_prompt;
use crate::llm::TextGenerator;
use crate::models::{AnswerAnalysis, Phase};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Asks the model for a structured assessment of one answer.
pub struct AnswerAnalyzer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    timeout: Duration,
}

impl AnswerAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            generator,
            max_tokens,
            timeout,
        }
    }

    /// Analyze one answer. Any failure, including an elapsed deadline or an
    /// object that carries none of the expected fields, is an error.
    pub async fn analyze(
        &self,
        job_role: &str,
        phase: Phase,
        question: &str,
        answer: &str,
    ) -> Result<AnswerAnalysis, CollaboratorError> {
        let prompt = analysis_prompt(job_role, phase, question, answer);

        let value = tokio::time::timeout(
            self.timeout,
            self.generator.ask_structured(&prompt, self.max_tokens),
        )
        .await
        .map_err(|_| CollaboratorError::Timeout(self.timeout.as_secs()))??;

        if !looks_like_analysis(&value) {
            return Err(CollaboratorError::Malformed(
                "analysis carries no score fields".to_string(),
            ));
        }

        let analysis = AnswerAnalysis::from_value(&value);
        debug!(
            quality = analysis.quality,
            relevance = analysis.relevance,
            completeness = analysis.completeness,
            "Answer analyzed"
        );
        Ok(analysis)
    }
}

fn looks_like_analysis(value: &Value) -> bool {
    const SCORE_FIELDS: [&str; 5] = [
        "quality_score",
        "relevance_score",
        "completeness_score",
        "technical_depth",
        "communication_quality",
    ];
    value.is_object() && SCORE_FIELDS.iter().any(|f| value.get(f).is_some())
}

/// True when an answer is too short to be worth sending to the analyzer.
pub fn is_trivial_answer(answer: &str, min_chars: usize) -> bool {
    answer.chars().filter(|c| !c.is_whitespace()).count() < min_chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;
    use serde_json::json;

    #[tokio::test]
    async fn test_analysis_parsed_and_clamped() {
        let generator = Arc::new(ScriptedGenerator::new().with_structured(Ok(json!({
            "quality_score": 12,
            "relevance_score": 7,
            "completeness_score": 6,
            "technical_depth": 8,
            "communication_quality": 9,
            "areas_to_probe": ["caching"]
        }))));
        let analyzer = AnswerAnalyzer::new(generator.clone(), 500, Duration::from_secs(1));

        let analysis = analyzer
            .analyze("Engineer", Phase::Technical, "Q?", "A detailed answer")
            .await
            .unwrap();
        assert_eq!(analysis.quality, 10);
        assert_eq!(analysis.areas_to_probe, vec!["caching"]);
        assert_eq!(generator.structured_calls(), 1);
    }

    #[tokio::test]
    async fn test_object_without_scores_is_malformed() {
        let generator = Arc::new(ScriptedGenerator::new().with_structured(Ok(json!({"foo": 1}))));
        let analyzer = AnswerAnalyzer::new(generator, 500, Duration::from_secs(1));
        let err = analyzer
            .analyze("Engineer", Phase::Technical, "Q?", "An answer")
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_analyzer_times_out() {
        let generator = Arc::new(ScriptedGenerator::new().with_delay(Duration::from_secs(5)));
        let analyzer = AnswerAnalyzer::new(generator, 500, Duration::from_millis(50));
        let err = analyzer
            .analyze("Engineer", Phase::Technical, "Q?", "An answer")
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Timeout(_)));
    }

    #[test]
    fn test_trivial_answer() {
        assert!(is_trivial_answer("  ok ", 5));
        assert!(is_trivial_answer("", 5));
        assert!(!is_trivial_answer("I used Rust", 5));
    }
}

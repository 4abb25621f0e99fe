use async_trait::async_trait;

use crate::contracts::CoreError;
use crate::data_models::interaction::Sentiment;

/// Structured output of natural-language understanding over a raw message
/// body. NLU itself is out of scope; this is the pluggable seam a real
/// implementation attaches to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedResponse {
    pub sentiment: Sentiment,
    pub intent_signals: Vec<String>,
    pub requires_escalation: bool,
}

/// # NDOC
/// component: `external::response_analyzer`
/// purpose: Pluggable NLU seam producing a structured record from free
///   text, per the stated non-goal of implementing NLU in the core.
#[async_trait]
pub trait ResponseAnalyzer: Send + Sync {
    async fn analyze(&self, raw_text: &str) -> Result<AnalyzedResponse, CoreError>;
}

/// Deterministic keyword-based analyzer used where no real NLU backend is
/// wired in (tests, local runs). Not a substitute for a production NLU
/// provider.
pub struct KeywordResponseAnalyzer;

#[async_trait]
impl ResponseAnalyzer for KeywordResponseAnalyzer {
    async fn analyze(&self, raw_text: &str) -> Result<AnalyzedResponse, CoreError> {
        let lower = raw_text.to_lowercase();
        let score = if lower.contains("great") || lower.contains("thanks") || lower.contains("yes") {
            0.7
        } else if lower.contains("no") || lower.contains("stop") || lower.contains("angry") {
            -0.7
        } else {
            0.0
        };
        let requires_escalation = lower.contains("lawyer") || lower.contains("complaint");
        Ok(AnalyzedResponse {
            sentiment: Sentiment {
                score,
                confidence: if score == 0.0 { 0.3 } else { 0.6 },
            },
            intent_signals: Vec::new(),
            requires_escalation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn positive_keyword_yields_positive_sentiment() {
        let analyzer = KeywordResponseAnalyzer;
        let result = analyzer.analyze("Yes, thanks for reaching out!").await.unwrap();
        assert!(result.sentiment.score > 0.0);
    }

    #[tokio::test]
    async fn escalation_keyword_sets_flag() {
        let analyzer = KeywordResponseAnalyzer;
        let result = analyzer
            .analyze("I'm filing a complaint with my lawyer")
            .await
            .unwrap();
        assert!(result.requires_escalation);
    }
}

//! Query complexity classifier.
//!
//! A deterministic keyword score decides most queries. Only a low-confidence
//! COMPLEX verdict is escalated to a completion model, and the model's reply
//! replaces the rule verdict only when it validates.

use std::sync::Arc;

use tracing::{debug, warn};
use vaxchecker_config::ClassifierConfig;
use vaxchecker_core::classification::ClassificationVerdict;
use vaxchecker_core::completion::{CompletionRequest, CompletionService};

use super::extract_json;
use super::patterns::PatternSet;

/// Sampling and escalation knobs for the complexity classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// COMPLEX verdicts scoring below this are sent to the model.
    pub escalation_threshold: u8,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 200,
            escalation_threshold: 3,
        }
    }
}

impl From<&ClassifierConfig> for ClassifierSettings {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            ..Self::default()
        }
    }
}

pub struct ComplexityClassifier {
    completion: Arc<dyn CompletionService>,
    patterns: PatternSet,
    settings: ClassifierSettings,
}

impl ComplexityClassifier {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            patterns: PatternSet::vaccine_default(),
            settings: ClassifierSettings::default(),
        }
    }

    pub fn with_patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Pure rule evaluation; never touches the model.
    pub fn rule_verdict(&self, query: &str) -> ClassificationVerdict {
        let query_lower = query.to_lowercase();
        let complex_matches = self.patterns.complex_matches(&query_lower);
        let is_broad = self.patterns.is_broad(&query_lower);
        let word_count = query_lower.split_whitespace().count();
        let length_score = length_score(word_count);

        if complex_matches == 0 && is_broad {
            ClassificationVerdict::broad(1)
        } else if complex_matches == 0 && word_count <= 7 {
            ClassificationVerdict::broad(1 + length_score)
        } else {
            let matches = complex_matches.min(ClassificationVerdict::MAX_COMPLEXITY as usize) as u8;
            let score = 2 + matches + length_score;
            ClassificationVerdict::complex(score.min(ClassificationVerdict::MAX_COMPLEXITY))
        }
    }

    /// Classify a query, consulting the model for low-confidence COMPLEX verdicts.
    ///
    /// Never fails: model errors and invalid replies keep the rule verdict.
    pub async fn classify(&self, query: &str) -> ClassificationVerdict {
        let verdict = self.rule_verdict(query);
        if !self.needs_escalation(&verdict) {
            debug!(?verdict, "Rule-based classification");
            return verdict;
        }

        let request = CompletionRequest::new(
            escalation_prompt(query),
            self.settings.temperature,
            self.settings.max_tokens,
        );

        match self.completion.invoke(request).await {
            Ok(reply) => match parse_verdict(&reply) {
                Some(model_verdict) => {
                    debug!(?model_verdict, rule = ?verdict, "Model classification accepted");
                    model_verdict
                }
                None => {
                    warn!(reply = %reply, "Model classification invalid, using rule-based result");
                    verdict
                }
            },
            Err(e) => {
                warn!(error = %e, "Query analysis failed, using rule-based result");
                verdict
            }
        }
    }

    fn needs_escalation(&self, verdict: &ClassificationVerdict) -> bool {
        verdict.query_type == vaxchecker_core::QueryType::Complex
            && verdict.complexity < self.settings.escalation_threshold
    }
}

/// `clamp((word_count - 3) div 4, 0, 2)`.
fn length_score(word_count: usize) -> u8 {
    (word_count.saturating_sub(3) / 4).min(2) as u8
}

fn escalation_prompt(query: &str) -> String {
    format!(
        "Analyze vaccine question type (BROAD/COMPLEX) and complexity (1-5).\n\
         Question: {query}\n\
         Return JSON only: {{\"type\": \"BROAD\", \"complexity\": 1}}"
    )
}

fn parse_verdict(reply: &str) -> Option<ClassificationVerdict> {
    let value: serde_json::Value = serde_json::from_str(extract_json(reply)).ok()?;
    ClassificationVerdict::from_json(&value)
}

//! Rule-based intent classifier.

use std::collections::HashSet;
use std::sync::Arc;

use rand::prelude::*;

use crate::catalog::{DEFAULT_TAG, ERROR_TAG, IntentCatalog};
use crate::error::Result;

use super::{Classifier, ClassificationResult, ERROR_RESPONSE, FALLBACK_RESPONSE};

/// Rule-based intent classifier.
///
/// Matches queries against the catalog in two tiers, in strict priority
/// order: first a literal-substring scan over every pattern, then a
/// token-overlap scan. Within each tier the first match in catalog order
/// wins; the tie-break is intentional and observable.
#[derive(Debug)]
pub struct RuleBasedClassifier {
    catalog: Arc<IntentCatalog>,
}

impl RuleBasedClassifier {
    /// Create a new rule-based classifier over the given catalog.
    pub fn new(catalog: Arc<IntentCatalog>) -> Self {
        Self { catalog }
    }

    /// Classify a query to an intent tag.
    ///
    /// Returns [`DEFAULT_TAG`] when neither tier matches.
    pub fn classify(&self, query: &str) -> String {
        let query = query.to_lowercase();

        // Substring tier: any pattern that is a literal substring of the
        // query wins, first match in catalog order.
        for intent in self.catalog.intents() {
            for pattern in &intent.patterns {
                if query.contains(&pattern.to_lowercase()) {
                    return intent.tag.clone();
                }
            }
        }

        // Token-overlap tier: one shared whitespace token is enough.
        let query_tokens: HashSet<&str> = query.split_whitespace().collect();
        for intent in self.catalog.intents() {
            for pattern in &intent.patterns {
                let pattern = pattern.to_lowercase();
                let pattern_tokens: HashSet<&str> = pattern.split_whitespace().collect();
                if !query_tokens.is_disjoint(&pattern_tokens) {
                    return intent.tag.clone();
                }
            }
        }

        DEFAULT_TAG.to_string()
    }

    fn predict_impl(&self, query: &str) -> ClassificationResult {
        let tag = self.classify(query);

        if tag == DEFAULT_TAG {
            return ClassificationResult {
                response: FALLBACK_RESPONSE.to_string(),
                intent: DEFAULT_TAG.to_string(),
                confidence: 0.0,
            };
        }

        // A tag produced by classify() always exists in the catalog; a miss
        // here is an internal fault and degrades to the error fallback so the
        // serving path is never interrupted.
        match self.catalog.get(&tag) {
            Some(intent) => {
                let mut rng = rand::rng();
                let response = intent
                    .responses
                    .choose(&mut rng)
                    .cloned()
                    .unwrap_or_else(|| FALLBACK_RESPONSE.to_string());
                ClassificationResult {
                    response,
                    intent: tag,
                    confidence: 1.0,
                }
            }
            None => ClassificationResult {
                response: ERROR_RESPONSE.to_string(),
                intent: ERROR_TAG.to_string(),
                confidence: 0.0,
            },
        }
    }
}

impl Classifier for RuleBasedClassifier {
    fn predict(&self, query: &str) -> Result<ClassificationResult> {
        Ok(self.predict_impl(query))
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Intent;

    fn catalog() -> Arc<IntentCatalog> {
        let intents = vec![
            Intent {
                tag: "greeting".to_string(),
                patterns: vec!["Hi".to_string(), "Hello".to_string(), "Hey".to_string()],
                responses: vec!["Hello! How can I help you today?".to_string()],
            },
            Intent {
                tag: "headache".to_string(),
                patterns: vec![
                    "I have a headache".to_string(),
                    "My head hurts".to_string(),
                ],
                responses: vec!["Rest in a quiet, dark room.".to_string()],
            },
            Intent {
                tag: "emergency".to_string(),
                patterns: vec!["chest pain".to_string(), "heart attack".to_string()],
                responses: vec![
                    "This sounds like a medical emergency. Please call emergency services immediately!"
                        .to_string(),
                ],
            },
        ];
        Arc::new(IntentCatalog::new(intents).unwrap())
    }

    #[test]
    fn test_substring_match() {
        let classifier = RuleBasedClassifier::new(catalog());
        assert_eq!(classifier.classify("Hello there!"), "greeting");
    }

    #[test]
    fn test_substring_beats_token_overlap() {
        // "i have chest pain" overlaps on "i"/"have" with the headache
        // pattern, which appears earlier in catalog order, but the literal
        // substring "chest pain" must win outright.
        let classifier = RuleBasedClassifier::new(catalog());
        assert_eq!(classifier.classify("I have chest pain"), "emergency");
    }

    #[test]
    fn test_token_overlap_tier() {
        let classifier = RuleBasedClassifier::new(catalog());
        // No pattern is a substring, but "head" is shared with "My head hurts".
        assert_eq!(classifier.classify("head feels heavy"), "headache");
    }

    #[test]
    fn test_empty_query_returns_default() {
        let classifier = RuleBasedClassifier::new(catalog());
        assert_eq!(classifier.classify(""), DEFAULT_TAG);
    }

    #[test]
    fn test_no_match_returns_default() {
        let classifier = RuleBasedClassifier::new(catalog());
        assert_eq!(classifier.classify("zyzzogeton"), DEFAULT_TAG);
    }

    #[test]
    fn test_predict_emergency_confidence() {
        let classifier = RuleBasedClassifier::new(catalog());
        let result = classifier
            .predict("I'm having severe chest pain right now")
            .unwrap();

        assert_eq!(result.intent, "emergency");
        assert_eq!(result.confidence, 1.0);
        assert!(result.response.contains("emergency services"));
    }

    #[test]
    fn test_predict_default_fallback() {
        let classifier = RuleBasedClassifier::new(catalog());
        let result = classifier.predict("qwertyuiop").unwrap();

        assert_eq!(result.intent, DEFAULT_TAG);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.response, FALLBACK_RESPONSE);
    }

    #[test]
    fn test_predict_response_comes_from_matched_intent() {
        let catalog = catalog();
        let classifier = RuleBasedClassifier::new(Arc::clone(&catalog));
        let responses = &catalog.get("greeting").unwrap().responses;

        for _ in 0..10 {
            let result = classifier.predict("hello").unwrap();
            assert!(responses.contains(&result.response));
        }
    }
}

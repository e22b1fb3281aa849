use hark_nlp::{Language, Normalizer, TextClassifier};
use tracing::{debug, warn};

use crate::message::{Message, MessageNormalizer};

/// Score used when a category trigger does not declare one.
pub const DEFAULT_SCORE: f64 = 0.75;

/// Applies when the message classifies into `category` with at least
/// `score` similarity.
#[derive(Debug, Clone)]
pub struct CategoryTrigger {
    name: String,
    classifier: TextClassifier,
    category: String,
    score: f64,
    message_normalizer: MessageNormalizer,
}

impl CategoryTrigger {
    pub fn new(
        name: impl Into<String>,
        classifier: TextClassifier,
        category: impl Into<String>,
        score: f64,
    ) -> Self {
        let message_normalizer = MessageNormalizer::new(classifier.normalizer());
        CategoryTrigger {
            name: name.into(),
            classifier,
            category: category.into(),
            score,
            message_normalizer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn applies(&self, message: &Message, language: Language) -> bool {
        let normalized = self.message_normalizer.normalize(message, language);
        let results = match self.classifier.classify_normalized(&normalized, language) {
            Ok(results) => results,
            Err(error) => {
                warn!("trigger '{}' cannot classify the message: {error}", self.name);
                return false;
            }
        };

        let labels: &Normalizer = self.classifier.normalizer();
        let target = labels.normalize(&self.category, language);
        let applies = results.iter().any(|result| {
            labels.normalize(&result.category, language) == target && result.score >= self.score
        });

        debug!(
            "trigger '{}' wants '{}' >= {}: {applies}",
            self.name, self.category, self.score
        );
        applies
    }
}

//! Nearest-example text classification.
//!
//! A [`TextClassifier`] stores labeled examples in an [`Index`] partition
//! (its namespace plus the example language) and scores a query against
//! every example of the partition with the Jaro-Winkler similarity. A
//! category scores the best similarity among its examples, so one excellent
//! example outweighs many mediocre ones.
//!
//! Examples are stemmed but keep their stop words; queries are stemmed and
//! lose their stop words.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{NlpError, NlpResult};
use crate::index::{Document, Field, Filter, Index, Query};
use crate::language::Language;
use crate::normalize::Normalizer;
use crate::training::TrainingDataSet;

const CATEGORY_FIELD: &str = "category";
const TEXT_FIELD: &str = "text";

/// A category with the best similarity any of its examples reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: String,
    pub score: f64,
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3})", self.category, self.score)
    }
}

#[derive(Clone)]
pub struct TextClassifier {
    index: Arc<dyn Index>,
    namespace: String,
    normalizer: Normalizer,
}

impl fmt::Debug for TextClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextClassifier")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl TextClassifier {
    pub fn new(index: Arc<dyn Index>, namespace: impl Into<String>, normalizer: Normalizer) -> Self {
        TextClassifier {
            index,
            namespace: namespace.into(),
            normalizer: normalizer.reset(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Store `text` as an example of `category`.
    ///
    /// Blank text is ignored. The example is staged in the index and becomes
    /// visible to classification after the index is synced.
    pub fn train(&self, category: &str, text: &str, language: Language) -> NlpResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(NlpError::configuration("training requires a namespace"));
        }
        if category.trim().is_empty() {
            return Err(NlpError::configuration(format!(
                "training example {text:?} has no category"
            )));
        }

        let normalized = self.normalizer.normalize(text, language);
        if normalized.is_empty() {
            debug!("skipping empty training example for '{category}'");
            return Ok(());
        }

        self.index.index(Document::new(
            self.namespace.clone(),
            language,
            vec![
                Field::string(CATEGORY_FIELD, category),
                Field::text(TEXT_FIELD, normalized),
            ],
        ))
    }

    /// Train every value of every data set under each of its categories.
    pub fn train_all(&self, data_sets: &[TrainingDataSet]) -> NlpResult<()> {
        for data_set in data_sets {
            for category in &data_set.categories {
                for value in &data_set.values {
                    self.train(category, value, data_set.language)?;
                }
            }
        }
        Ok(())
    }

    /// The top category for `text`, if the partition has any example.
    pub fn classify(&self, text: &str, language: Language) -> NlpResult<Option<String>> {
        Ok(self
            .classify_all(text, language)?
            .into_iter()
            .next()
            .map(|result| result.category))
    }

    /// Every category of the partition, best first.
    pub fn classify_all(
        &self,
        text: &str,
        language: Language,
    ) -> NlpResult<Vec<ClassificationResult>> {
        let normalized = self
            .normalizer
            .clone()
            .remove_stop_words()
            .normalize(text, language);
        self.classify_normalized(&normalized, language)
    }

    /// Like [`TextClassifier::classify_all`] for text that is already
    /// normalized.
    pub fn classify_normalized(
        &self,
        normalized: &str,
        language: Language,
    ) -> NlpResult<Vec<ClassificationResult>> {
        let query = Query::new(self.namespace.clone(), language)
            .filter(TEXT_FIELD, Filter::Any)
            .filter(CATEGORY_FIELD, Filter::Any);
        let examples = self.index.search(&query, usize::MAX)?;

        let mut results: Vec<ClassificationResult> = Vec::new();
        for example in &examples {
            let (Some(category), Some(text)) =
                (example.field(CATEGORY_FIELD), example.field(TEXT_FIELD))
            else {
                continue;
            };
            let score = self.distance(normalized, text);
            match results.iter_mut().find(|result| result.category == category) {
                Some(result) => result.score = result.score.max(score),
                None => results.push(ClassificationResult {
                    category: category.to_string(),
                    score,
                }),
            }
        }

        // Stable sort: equal scores keep first-indexed order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        debug!(
            "classified {normalized:?} in {query}: {}",
            results
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(results)
    }

    /// See [`similarity`].
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        similarity(a, b)
    }
}

/// Jaro-Winkler similarity of two strings, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

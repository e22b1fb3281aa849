use hark_nlp::{Language, NlpError, NlpResult, Normalizer, similarity};
use regex::Regex;
use tracing::debug;

use crate::message::{Message, MessageNormalizer};

/// Applies when the message text has a given shape.
///
/// Every configured condition must hold; unset conditions always hold.
/// `contains` holds when the text contains any of its entries, or, with a
/// positive `distance`, when the text is at least that similar to one.
#[derive(Debug, Clone)]
pub struct TextTrigger {
    name: String,
    starts_with: Option<String>,
    ends_with: Option<String>,
    contains: Vec<String>,
    distance: f64,
    ignore_case: bool,
    regex: Option<Regex>,
    normalize: bool,
    message_normalizer: MessageNormalizer,
}

impl TextTrigger {
    pub fn new(name: impl Into<String>, normalizer: &Normalizer) -> Self {
        TextTrigger {
            name: name.into(),
            starts_with: None,
            ends_with: None,
            contains: Vec::new(),
            distance: 0.0,
            ignore_case: true,
            regex: None,
            normalize: false,
            message_normalizer: MessageNormalizer::new(normalizer),
        }
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    pub fn ends_with(mut self, suffix: impl Into<String>) -> Self {
        self.ends_with = Some(suffix.into());
        self
    }

    pub fn contains<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Minimum similarity for a fuzzy `contains` match. Zero disables it.
    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Match against the normalized message instead of the raw text.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// The whole text must match `pattern`.
    pub fn regex(mut self, pattern: &str) -> NlpResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|error| {
            NlpError::configuration(format!(
                "trigger '{}' has an invalid regex: {error}",
                self.name
            ))
        })?;
        self.regex = Some(regex);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applies(&self, message: &Message, language: Language) -> bool {
        let text = if self.normalize {
            self.message_normalizer.normalize(message, language)
        } else {
            message.text.clone()
        };

        let starts = self
            .starts_with
            .as_deref()
            .is_none_or(|prefix| self.fold(&text).starts_with(&self.fold(prefix)));
        let ends = self
            .ends_with
            .as_deref()
            .is_none_or(|suffix| self.fold(&text).ends_with(&self.fold(suffix)));
        let matches = self.regex.as_ref().is_none_or(|regex| regex.is_match(&text));
        let folded = self.fold(&text);
        let contains = self.contains.is_empty()
            || self.contains.iter().any(|term| {
                let term = self.fold(term);
                folded.contains(&term)
                    || (self.distance > 0.0 && similarity(&folded, &term) >= self.distance)
            });

        debug!(
            "trigger '{}': starts {starts}, ends {ends}, contains {contains}, matches {matches}",
            self.name
        );
        starts && ends && contains && matches
    }

    fn fold(&self, text: &str) -> String {
        if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

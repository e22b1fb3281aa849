//! Language resources used by the normalizer: stop-word lists and stemmers.
//!
//! A [`Lexicon`] is built once at startup. Building fails with a
//! configuration error if any supported language lacks a resource, so that
//! normalization itself never has to fail.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{NlpError, NlpResult};
use crate::language::Language;

const ENGLISH_STOP_WORDS: &str = include_str!("../resources/stopwords/english.txt");
const SPANISH_STOP_WORDS: &str = include_str!("../resources/stopwords/spanish.txt");
const PORTUGUESE_STOP_WORDS: &str = include_str!("../resources/stopwords/portuguese.txt");

/// Stop words and a Snowball stemmer for every supported language.
pub struct Lexicon {
    stop_words: HashMap<Language, HashSet<String>>,
    stemmers: HashMap<Language, Stemmer>,
}

impl Lexicon {
    /// The lexicon with the embedded stop-word lists.
    pub fn builtin() -> NlpResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    /// Whether `word` is a stop word of `language`.
    ///
    /// The comparison ignores case, and also matches words whose diacritics
    /// were already stripped ("mas" matches "más").
    pub fn is_stop_word(&self, word: &str, language: Language) -> bool {
        self.stop_words
            .get(&language)
            .is_some_and(|words| words.contains(&word.to_lowercase()))
    }

    /// Stem `word` until the stem no longer changes.
    ///
    /// A single Snowball pass is not always a fixed point ("numeros" stems
    /// to "numer", which stems to "num").
    pub fn stem<'a>(&self, word: &'a str, language: Language) -> Cow<'a, str> {
        let Some(stemmer) = self.stemmers.get(&language) else {
            return Cow::Borrowed(word);
        };

        let mut current = Cow::Borrowed(word);
        // Bounded in case two stems of equal length alternate.
        for _ in 0..=word.len() {
            let next = stemmer.stem(&current).into_owned();
            if next == *current || next.len() > current.len() {
                break;
            }
            current = Cow::Owned(next);
        }
        current
    }
}

impl fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexicon")
            .field(
                "stop_words",
                &self
                    .stop_words
                    .iter()
                    .map(|(language, words)| (language, words.len()))
                    .collect::<HashMap<_, _>>(),
            )
            .field("stemmers", &self.stemmers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for a [`Lexicon`] with per-language stop-word overrides.
#[derive(Debug, Default)]
pub struct LexiconBuilder {
    stop_words: HashMap<Language, Vec<String>>,
}

impl LexiconBuilder {
    /// Replace the stop-word list of a language.
    pub fn stop_words<I, S>(mut self, language: Language, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words
            .insert(language, words.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(mut self) -> NlpResult<Lexicon> {
        let mut stop_words = HashMap::new();
        let mut stemmers = HashMap::new();

        for language in Language::ALL {
            let words = self
                .stop_words
                .remove(&language)
                .unwrap_or_else(|| builtin_stop_words(language));
            let words = stop_word_set(words);
            if words.is_empty() {
                return Err(NlpError::configuration(format!(
                    "no stop words available for language {language}"
                )));
            }
            stop_words.insert(language, words);
            stemmers.insert(language, Stemmer::create(algorithm(language)));
        }

        Ok(Lexicon {
            stop_words,
            stemmers,
        })
    }
}

fn algorithm(language: Language) -> Algorithm {
    match language {
        Language::English => Algorithm::English,
        Language::Spanish => Algorithm::Spanish,
        Language::Portuguese => Algorithm::Portuguese,
    }
}

fn builtin_stop_words(language: Language) -> Vec<String> {
    let source = match language {
        Language::English => ENGLISH_STOP_WORDS,
        Language::Spanish => SPANISH_STOP_WORDS,
        Language::Portuguese => PORTUGUESE_STOP_WORDS,
    };
    source.lines().map(str::to_string).collect()
}

fn stop_word_set(words: Vec<String>) -> HashSet<String> {
    let mut set = HashSet::new();
    for word in words {
        let word = word.trim().to_lowercase();
        if word.is_empty() || word.starts_with('#') {
            continue;
        }
        set.insert(strip_diacritics(&word));
        set.insert(word);
    }
    set
}

/// Decompose `text` and drop its combining marks.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lexicon_covers_every_language() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.is_stop_word("the", Language::English));
        assert!(lexicon.is_stop_word("de", Language::Spanish));
        assert!(lexicon.is_stop_word("não", Language::Portuguese));
        assert!(!lexicon.is_stop_word("romanos", Language::Spanish));
    }

    #[test]
    fn stop_words_match_without_diacritics_and_case() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.is_stop_word("mas", Language::Spanish));
        assert!(lexicon.is_stop_word("MÁS", Language::Spanish));
    }

    #[test]
    fn empty_stop_word_override_is_a_configuration_error() {
        let result = Lexicon::builder()
            .stop_words(Language::Portuguese, Vec::<String>::new())
            .build();
        assert!(matches!(result, Err(NlpError::Configuration(_))));
    }

    #[test]
    fn stems_per_language() {
        let lexicon = Lexicon::builtin().unwrap();
        assert_eq!(lexicon.stem("running", Language::English), "run");
        assert_eq!(lexicon.stem("run", Language::English), "run");
    }

    #[test]
    fn stems_are_fixed_points() {
        let lexicon = Lexicon::builtin().unwrap();
        for (word, language) in [
            ("numeros", Language::Spanish),
            ("romanos", Language::Spanish),
            ("conversões", Language::Portuguese),
            ("agreed", Language::English),
            ("university", Language::English),
        ] {
            let stem = lexicon.stem(word, language);
            assert_eq!(lexicon.stem(&stem, language), stem, "{word}");
        }
    }
}

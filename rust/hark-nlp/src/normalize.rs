//! Text normalization.
//!
//! By default the normalizer decomposes the text (NFD), strips diacritics,
//! splits it into words, stems every word with the language's Snowball
//! stemmer, lowercases, and joins the words with a single space. Every step
//! can be toggled; option methods return a modified copy so a configured
//! normalizer can be shared and specialized freely.
//!
//! ```rust,ignore
//! let normalizer = Normalizer::new(Arc::new(Lexicon::builtin()?));
//! assert_eq!(normalizer.skip_stemming().normalize("¡Café Olé!", Language::Spanish), "cafe ole");
//! ```

use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

use crate::language::Language;
use crate::lexicon::Lexicon;

/// Unicode normalization form applied before any other step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    #[default]
    Nfd,
    Nfc,
    Nfkd,
    Nfkc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub case_sensitive: bool,
    pub form: Form,
    pub remove_diacritics: bool,
    pub remove_stop_words: bool,
    pub stemming: bool,
    pub tokenize: bool,
    pub join_with: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            case_sensitive: false,
            form: Form::Nfd,
            remove_diacritics: true,
            remove_stop_words: false,
            stemming: true,
            tokenize: true,
            join_with: " ".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    lexicon: Arc<Lexicon>,
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Normalizer {
            lexicon,
            options: NormalizeOptions::default(),
        }
    }

    pub fn with_options(lexicon: Arc<Lexicon>, options: NormalizeOptions) -> Self {
        Normalizer { lexicon, options }
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// The same lexicon with default options.
    pub fn reset(&self) -> Self {
        Normalizer::new(self.lexicon.clone())
    }

    pub fn case_sensitive(mut self) -> Self {
        self.options.case_sensitive = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.options.case_sensitive = false;
        self
    }

    pub fn form(mut self, form: Form) -> Self {
        self.options.form = form;
        self
    }

    pub fn remove_diacritics(mut self) -> Self {
        self.options.remove_diacritics = true;
        self
    }

    pub fn keep_diacritics(mut self) -> Self {
        self.options.remove_diacritics = false;
        self
    }

    pub fn remove_stop_words(mut self) -> Self {
        self.options.remove_stop_words = true;
        self
    }

    pub fn keep_stop_words(mut self) -> Self {
        self.options.remove_stop_words = false;
        self
    }

    pub fn apply_stemming(mut self) -> Self {
        self.options.stemming = true;
        self
    }

    pub fn skip_stemming(mut self) -> Self {
        self.options.stemming = false;
        self
    }

    pub fn apply_tokenizer(mut self) -> Self {
        self.options.tokenize = true;
        self
    }

    pub fn skip_tokenizer(mut self) -> Self {
        self.options.tokenize = false;
        self
    }

    pub fn join_with(mut self, separator: impl Into<String>) -> Self {
        self.options.join_with = separator.into();
        self
    }

    /// Normalize `text` as written in `language`.
    pub fn normalize(&self, text: &str, language: Language) -> String {
        self.tokens(text, language).join(&self.options.join_with)
    }

    /// Normalize `text` and return the resulting tokens without joining them.
    pub fn tokens(&self, text: &str, language: Language) -> Vec<String> {
        let options = &self.options;

        let composed: String = match options.form {
            Form::Nfd => text.nfd().collect(),
            Form::Nfc => text.nfc().collect(),
            Form::Nfkd => text.nfkd().collect(),
            Form::Nfkc => text.nfkc().collect(),
        };

        let cleaned: String = if options.remove_diacritics {
            composed.chars().filter(|c| !is_combining_mark(*c)).collect()
        } else {
            composed
        };

        let words: Vec<&str> = if options.tokenize {
            cleaned.unicode_words().collect()
        } else {
            vec![cleaned.as_str()]
        };

        // Stemmers expect lowercase input, so folding happens before stemming.
        words
            .into_iter()
            .map(|word| {
                if options.case_sensitive {
                    word.to_string()
                } else {
                    word.to_lowercase()
                }
            })
            .filter(|word| {
                !(options.remove_stop_words && self.lexicon.is_stop_word(word, language))
            })
            .map(|word| {
                if options.stemming {
                    self.lexicon.stem(&word, language).into_owned()
                } else {
                    word
                }
            })
            // A stem can itself be a stop word ("estas" -> "esta").
            .filter(|word| {
                !word.is_empty()
                    && !(options.remove_stop_words && self.lexicon.is_stop_word(word, language))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(Lexicon::builtin().unwrap()))
    }

    #[test]
    fn strips_diacritics_and_punctuation() {
        let normalized = normalizer()
            .skip_stemming()
            .normalize("¡Café con Leche, señor!", Language::Spanish);
        assert_eq!(normalized, "cafe con leche senor");
    }

    #[test]
    fn stripped_output_has_no_combining_marks() {
        let normalized = normalizer().normalize("café", Language::Spanish);
        assert!(!normalized.chars().any(is_combining_mark));
        assert!(normalized.starts_with("caf"));
    }

    #[test]
    fn keeps_diacritics_when_asked() {
        let normalized = normalizer()
            .skip_stemming()
            .keep_diacritics()
            .form(Form::Nfc)
            .normalize("Café", Language::Spanish);
        assert_eq!(normalized, "café");
    }

    #[test]
    fn normalization_is_idempotent() {
        let normalizer = normalizer().skip_stemming().remove_stop_words();
        let once = normalizer.normalize("Él dijo: ¿Qué HORA es en Montréal?", Language::Spanish);
        let twice = normalizer.normalize(&once, Language::Spanish);
        assert_eq!(once, twice);

        let stemming = normalizer.apply_stemming();
        let once = stemming.normalize("running dogs", Language::English);
        assert_eq!(once, "run dog");
        assert_eq!(stemming.normalize(&once, Language::English), once);
    }

    #[test]
    fn default_normalization_is_idempotent() {
        let normalizer = normalizer();
        for (text, language) in [
            ("números romanos", Language::Spanish),
            ("convertir decimales a romanos", Language::Spanish),
            ("conversões de números", Language::Portuguese),
            ("agreed", Language::English),
            ("university", Language::English),
        ] {
            let once = normalizer.normalize(text, language);
            assert_eq!(normalizer.normalize(&once, language), once, "{text}");

            let stripped = normalizer.clone().remove_stop_words();
            let once = stripped.normalize(text, language);
            assert_eq!(stripped.normalize(&once, language), once, "{text}");
        }
    }

    #[test]
    fn stop_words_never_survive_removal() {
        let normalizer = normalizer().skip_stemming().remove_stop_words();
        let text = "convertir de decimales a romanos por favor y más";
        let tokens = normalizer.tokens(text, Language::Spanish);
        for token in &tokens {
            assert!(!normalizer.lexicon().is_stop_word(token, Language::Spanish));
        }
        assert_eq!(tokens, vec!["convertir", "decimales", "romanos", "favor"]);
    }

    #[test]
    fn case_sensitive_mode_keeps_case() {
        let normalized = normalizer()
            .skip_stemming()
            .case_sensitive()
            .normalize("Hola Mundo", Language::Spanish);
        assert_eq!(normalized, "Hola Mundo");
    }

    #[test]
    fn untokenized_text_is_a_single_token() {
        let normalized = normalizer()
            .skip_stemming()
            .skip_tokenizer()
            .normalize("Qué hora es?", Language::Spanish);
        assert_eq!(normalized, "que hora es?");
    }

    #[test]
    fn joins_with_custom_separator() {
        let normalized = normalizer()
            .skip_stemming()
            .join_with("-")
            .normalize("uno dos tres", Language::Spanish);
        assert_eq!(normalized, "uno-dos-tres");
    }
}

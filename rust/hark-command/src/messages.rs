//! Reply templates.
//!
//! A [`MessageSource`] holds, per language, named lists of candidate
//! replies. Asking for a message picks one candidate at random and expands
//! its `{name}` placeholders with a candidate of the named message, so
//! replies can share fragments:
//!
//! ```json
//! { "greeting": ["hola", "buenas"], "help": "{greeting}, decime un número" }
//! ```
//!
//! Expansion is a single pass: substituted text is not scanned again, and
//! placeholders naming no message stay as they are.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use hark_nlp::{Language, NlpError, NlpResult};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Messages of one language, by name.
pub type MessageBank = BTreeMap<String, Vec<String>>;

/// Chooses one of `len` candidates.
pub trait RandomSource: Send + Sync {
    /// An index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// A reproducible sequence of picks.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, len: usize) -> usize {
        self.rng.lock().gen_range(0..len)
    }
}

/// A configured message: one text or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    One(String),
    Many(Vec<String>),
}

impl From<MessageValue> for Vec<String> {
    fn from(value: MessageValue) -> Self {
        match value {
            MessageValue::One(text) => vec![text],
            MessageValue::Many(texts) => texts,
        }
    }
}

#[derive(Clone)]
pub struct MessageSource {
    messages: Arc<HashMap<Language, MessageBank>>,
    default_language: Language,
    random: Arc<dyn RandomSource>,
}

impl fmt::Debug for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSource")
            .field("messages", &self.messages)
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}

impl MessageSource {
    pub fn new(messages: HashMap<Language, MessageBank>, default_language: Language) -> Self {
        MessageSource {
            messages: Arc::new(messages),
            default_language,
            random: Arc::new(ThreadRandom),
        }
    }

    /// A source without messages; every lookup fails.
    pub fn empty(default_language: Language) -> Self {
        Self::new(HashMap::new(), default_language)
    }

    pub fn from_config(
        config: HashMap<Language, BTreeMap<String, MessageValue>>,
        default_language: Language,
    ) -> Self {
        let messages = config
            .into_iter()
            .map(|(language, bank)| {
                let bank = bank
                    .into_iter()
                    .map(|(name, value)| (name, Vec::from(value)))
                    .collect();
                (language, bank)
            })
            .collect();
        Self::new(messages, default_language)
    }

    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Arc::new(random);
        self
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    /// A random candidate of `name` in the default language, expanded.
    pub fn get(&self, name: &str) -> NlpResult<String> {
        self.get_in(self.default_language, name)
    }

    pub fn get_in(&self, language: Language, name: &str) -> NlpResult<String> {
        let bank = self.bank(language, name)?;
        let template = self.pick(bank, name)?;
        Ok(self.expand(bank, template))
    }

    /// Like [`MessageSource::get`], then replaces every `{i}` with the
    /// expanded `args[i]`.
    pub fn format(&self, name: &str, args: &[&dyn fmt::Display]) -> NlpResult<String> {
        let bank = self.bank(self.default_language, name)?;
        let message = self.expand(bank, self.pick(bank, name)?);
        let args: Vec<String> = args
            .iter()
            .map(|arg| self.expand(bank, &arg.to_string()))
            .collect();
        Ok(substitute(&message, |key| {
            key.parse::<usize>()
                .ok()
                .and_then(|position| args.get(position).cloned())
        }))
    }

    fn bank(&self, language: Language, name: &str) -> NlpResult<&MessageBank> {
        self.messages
            .get(&language)
            .ok_or_else(|| NlpError::MessageNotFound {
                name: format!("{name} ({language})"),
            })
    }

    fn pick<'a>(&self, bank: &'a MessageBank, name: &str) -> NlpResult<&'a str> {
        match bank.get(name) {
            Some(candidates) if !candidates.is_empty() => {
                Ok(&candidates[self.random.pick(candidates.len())])
            }
            _ => Err(NlpError::MessageNotFound {
                name: name.to_string(),
            }),
        }
    }

    fn expand(&self, bank: &MessageBank, template: &str) -> String {
        let mut picked: HashMap<String, String> = HashMap::new();
        substitute(template, |key| {
            if let Some(text) = picked.get(key) {
                return Some(text.clone());
            }
            let candidates = bank.get(key).filter(|candidates| !candidates.is_empty())?;
            let text = candidates[self.random.pick(candidates.len())].clone();
            picked.insert(key.to_string(), text.clone());
            Some(text)
        })
    }
}

/// Replaces each `{key}` of `template` for which `lookup` has a value.
fn substitute(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key = match after.find('}') {
            Some(close) if !after[..close].contains('{') => &after[..close],
            _ => {
                output.push('{');
                rest = after;
                continue;
            }
        };
        match lookup(key) {
            Some(value) => output.push_str(&value),
            None => {
                output.push('{');
                output.push_str(key);
                output.push('}');
            }
        }
        rest = &after[key.len() + 1..];
    }

    output.push_str(rest);
    output
}

//! Command configuration.
//!
//! Commands declare their triggers and replies in JSON, keyed by command
//! name:
//!
//! ```json
//! { "ConvertNumbers": {
//!     "default-language": "spanish",
//!     "triggers": [
//!       { "type": "category", "name": "convert", "category": "convert", "score": 0.75 },
//!       { "type": "text", "name": "cancel", "contains": ["cancelar"] } ],
//!     "messages": { "spanish": { "help": ["decime qué convertir"] } } } }
//! ```
//!
//! Resolving a configuration builds the triggers against the index that
//! holds the command's training, under the command name as namespace.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hark_nlp::{Index, Language, NlpError, NlpResult, Normalizer, TextClassifier};
use serde::Deserialize;
use tracing::debug;

use crate::messages::{MessageSource, MessageValue};
use crate::trigger::{CategoryTrigger, DEFAULT_SCORE, TextTrigger, Trigger};

/// Every command configuration, by command name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CommandsConfig {
    pub commands: BTreeMap<String, CommandConfig>,
}

impl CommandsConfig {
    pub fn from_json(json: &str) -> NlpResult<Self> {
        serde_json::from_str(json).map_err(|error| {
            NlpError::configuration(format!("invalid command configuration: {error}"))
        })
    }

    pub fn get(&self, name: &str) -> Option<&CommandConfig> {
        self.commands.get(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandConfig {
    pub default_language: Language,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
    #[serde(default)]
    pub messages: HashMap<Language, BTreeMap<String, MessageValue>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerConfig {
    /// `category` or `text`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub starts_with: Option<String>,
    #[serde(default)]
    pub ends_with: Option<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub normalize: bool,
}

fn default_ignore_case() -> bool {
    true
}

/// A configuration turned into the parts of a command.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    pub name: String,
    pub language: Language,
    pub triggers: Vec<Trigger>,
    pub messages: MessageSource,
}

impl CommandConfig {
    pub fn from_json(json: &str) -> NlpResult<Self> {
        serde_json::from_str(json).map_err(|error| {
            NlpError::configuration(format!("invalid command configuration: {error}"))
        })
    }

    pub fn resolve(
        &self,
        name: &str,
        index: &Arc<dyn Index>,
        normalizer: &Normalizer,
    ) -> NlpResult<ResolvedCommand> {
        let triggers = self
            .triggers
            .iter()
            .map(|trigger| trigger.resolve(name, index, normalizer))
            .collect::<NlpResult<Vec<_>>>()?;
        debug!("command '{name}' resolved {} triggers", triggers.len());

        Ok(ResolvedCommand {
            name: name.to_string(),
            language: self.default_language,
            triggers,
            messages: MessageSource::from_config(self.messages.clone(), self.default_language),
        })
    }
}

impl TriggerConfig {
    fn resolve(
        &self,
        namespace: &str,
        index: &Arc<dyn Index>,
        normalizer: &Normalizer,
    ) -> NlpResult<Trigger> {
        match self.kind.as_str() {
            "category" => {
                let category = self.category.as_deref().ok_or_else(|| {
                    NlpError::configuration(format!(
                        "category trigger '{}' has no category",
                        self.name
                    ))
                })?;
                let classifier = TextClassifier::new(index.clone(), namespace, normalizer.clone());
                Ok(CategoryTrigger::new(
                    &self.name,
                    classifier,
                    category,
                    self.score.unwrap_or(DEFAULT_SCORE),
                )
                .into())
            }
            "text" => {
                let mut trigger = TextTrigger::new(&self.name, normalizer)
                    .contains(self.contains.iter().cloned())
                    .distance(self.distance)
                    .ignore_case(self.ignore_case)
                    .normalize(self.normalize);
                if let Some(prefix) = &self.starts_with {
                    trigger = trigger.starts_with(prefix);
                }
                if let Some(suffix) = &self.ends_with {
                    trigger = trigger.ends_with(suffix);
                }
                if let Some(pattern) = &self.regex {
                    trigger = trigger.regex(pattern)?;
                }
                Ok(trigger.into())
            }
            other => Err(NlpError::configuration(format!(
                "trigger type not supported: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_nlp::{Lexicon, MemoryIndex};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn resolve(json: &str) -> NlpResult<ResolvedCommand> {
        let index: Arc<dyn Index> = Arc::new(MemoryIndex::new());
        let normalizer = Normalizer::new(Arc::new(Lexicon::builtin()?));
        CommandConfig::from_json(json)?.resolve("ConvertNumbers", &index, &normalizer)
    }

    #[test]
    fn triggers_and_messages_are_resolved() -> TestResult {
        let command = resolve(
            r#"{
                "default-language": "es",
                "triggers": [
                    { "type": "category", "name": "convert", "category": "convert" },
                    { "type": "text", "name": "cancel", "contains": ["cancelar"],
                      "starts-with": null, "ends-with": null, "regex": null,
                      "ignore-case": true, "normalize": false, "distance": 0.0 }
                ],
                "messages": { "spanish": { "help": "decime qué convertir" } }
            }"#,
        )?;

        assert_eq!(command.language, Language::Spanish);
        let names: Vec<&str> = command.triggers.iter().map(Trigger::name).collect();
        assert_eq!(names, vec!["convert", "cancel"]);
        match &command.triggers[0] {
            Trigger::Category(trigger) => assert_eq!(trigger.score(), DEFAULT_SCORE),
            other => panic!("unexpected trigger {other:?}"),
        }
        assert_eq!(command.messages.get("help")?, "decime qué convertir");
        Ok(())
    }

    #[test]
    fn unknown_trigger_types_are_rejected() {
        let result = resolve(
            r#"{ "default-language": "spanish",
                 "triggers": [ { "type": "voice", "name": "listen" } ] }"#,
        );
        assert!(matches!(
            result,
            Err(NlpError::Configuration(message)) if message.contains("not supported")
        ));
    }

    #[test]
    fn category_triggers_need_a_category() {
        let result = resolve(
            r#"{ "default-language": "spanish",
                 "triggers": [ { "type": "category", "name": "convert" } ] }"#,
        );
        assert!(matches!(result, Err(NlpError::Configuration(_))));
    }

    #[test]
    fn commands_are_keyed_by_name() -> TestResult {
        let config = CommandsConfig::from_json(
            r#"{ "Cancel": { "default-language": "spanish" },
                 "ConvertNumbers": { "default-language": "english" } }"#,
        )?;
        assert_eq!(config.commands.len(), 2);
        assert_eq!(
            config.get("ConvertNumbers").map(|command| command.default_language),
            Some(Language::English)
        );
        assert!(CommandsConfig::from_json("[]").is_err());
        Ok(())
    }
}

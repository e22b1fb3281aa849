//! Incoming chat messages.
//!
//! A [`Message`] is the text the user sent plus the entities the transport
//! recognized in it: bot commands, mentions, hashtags, links. Entities other
//! than rich text are noise to the classifier, so [`MessageNormalizer`]
//! removes them before normalizing.

use hark_nlp::{Language, Normalizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A `/command` addressed to the bot.
    BotCommand,
    Mention,
    Hashtag,
    Url,
    /// Formatting (bold, italics, code). Its text is part of the message.
    RichText,
    Other,
}

/// A span of the message text recognized by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    /// The literal text the entity covers.
    pub value: String,
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>) -> Self {
        Entity {
            kind,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub entities: Vec<Entity>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Message {
            text: text.into(),
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, kind: EntityKind, value: impl Into<String>) -> Self {
        self.entities.push(Entity::new(kind, value));
        self
    }

    pub fn is_bot_command(&self) -> bool {
        self.entities
            .iter()
            .any(|entity| entity.kind == EntityKind::BotCommand)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::new(text)
    }
}

/// Normalizes a [`Message`] for classification: entity text is removed,
/// then the rest is stemmed and stripped of stop words.
#[derive(Debug, Clone)]
pub struct MessageNormalizer {
    normalizer: Normalizer,
    strip_entities: bool,
}

impl MessageNormalizer {
    pub fn new(normalizer: &Normalizer) -> Self {
        MessageNormalizer {
            normalizer: normalizer.reset().apply_stemming().remove_stop_words(),
            strip_entities: true,
        }
    }

    pub fn keep_stop_words(mut self) -> Self {
        self.normalizer = self.normalizer.keep_stop_words();
        self
    }

    pub fn keep_entities(mut self) -> Self {
        self.strip_entities = false;
        self
    }

    pub fn normalize(&self, message: &Message, language: Language) -> String {
        let text = if self.strip_entities {
            strip_entities(message)
        } else {
            message.text.clone()
        };
        self.normalizer.normalize(&text, language)
    }
}

fn strip_entities(message: &Message) -> String {
    message
        .entities
        .iter()
        .filter(|entity| entity.kind != EntityKind::RichText && !entity.value.is_empty())
        .fold(message.text.clone(), |text, entity| {
            text.replace(&entity.value, "")
        })
}

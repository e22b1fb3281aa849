//! The document index boundary.
//!
//! Training examples are stored as documents in an [`Index`], partitioned by
//! namespace and language so that the vocabulary of one command never leaks
//! into another command's classifier. The durable backend is an external
//! collaborator; [`MemoryIndex`] is the in-process implementation.
//!
//! Documents become visible to [`Index::search`] only after [`Index::sync`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NlpResult;
use crate::language::Language;

mod memory;

pub use memory::MemoryIndex;

/// How a field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Stored as-is, matched by equality.
    String,
    /// Stored already normalized (tokenized) text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            kind: FieldKind::String,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            kind: FieldKind::Text,
        }
    }
}

/// A namespace- and language-tagged set of named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub namespace: String,
    pub language: Language,
    pub fields: Vec<Field>,
}

impl Document {
    /// Create a document whose id is derived from its content, so indexing
    /// the same content twice yields the same document.
    pub fn new(namespace: impl Into<String>, language: Language, fields: Vec<Field>) -> Self {
        let namespace = namespace.into();
        let id = content_id(&namespace, language, &fields);
        Document {
            id,
            namespace,
            language,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

fn content_id(namespace: &str, language: Language, fields: &[Field]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(namespace.as_bytes());
    hasher.update(&[0]);
    hasher.update(language.locale().as_bytes());
    for field in fields {
        hasher.update(&[0]);
        hasher.update(field.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(field.value.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// A constraint on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Equals(String),
    /// The field must exist, with any value.
    Any,
}

/// Selects documents of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub namespace: String,
    pub language: Language,
    pub filters: Vec<(String, Filter)>,
}

impl Query {
    pub fn new(namespace: impl Into<String>, language: Language) -> Self {
        Query {
            namespace: namespace.into(),
            language,
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.push((field.into(), filter));
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        document.namespace == self.namespace
            && document.language == self.language
            && self.filters.iter().all(|(name, filter)| {
                match (document.field(name), filter) {
                    (Some(value), Filter::Equals(expected)) => value == expected,
                    (Some(_), Filter::Any) => true,
                    (None, _) => false,
                }
            })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.language.locale())?;
        for (name, filter) in &self.filters {
            match filter {
                Filter::Equals(value) => write!(f, " {name}={value:?}")?,
                Filter::Any => write!(f, " {name}=*")?,
            }
        }
        Ok(())
    }
}

/// A document-indexed retrieval backend keyed by namespace and language.
pub trait Index: Send + Sync {
    /// Stage a document. A document whose id is already present in its
    /// partition replaces the previous one in place.
    fn index(&self, document: Document) -> NlpResult<()>;

    /// Committed documents matching `query`, in indexing order.
    fn search(&self, query: &Query, limit: usize) -> NlpResult<Vec<Document>>;

    /// Make every staged document visible to [`Index::search`].
    fn sync(&self) -> NlpResult<()>;

    /// Drop staged documents that were never synced.
    fn discard(&self) -> NlpResult<()>;

    /// Whether synced documents survive a process restart.
    fn is_durable(&self) -> bool;
}

//! # Hark NLP — normalization and nearest-example classification
//!
//! The language layer of the hark trigger engine:
//!
//! - [`Normalizer`] canonicalizes text: Unicode decomposition, diacritic
//!   stripping, word tokenization, stop-word removal, Snowball stemming and
//!   case folding, each step independently switchable.
//! - [`Lexicon`] holds the per-language stop words and stemmers the
//!   normalizer draws from. It is built once; a missing resource is a
//!   configuration error at startup.
//! - [`Index`] is the boundary to the document store that keeps training
//!   examples, partitioned by namespace and language. [`MemoryIndex`]
//!   implements it in process.
//! - [`TextClassifier`] trains examples into a namespace and ranks
//!   categories by their best Jaro-Winkler similarity to a query.
//! - [`TrainingService`] applies training resources at startup and records
//!   what it applied in a [`StateStore`].
//!
//! ```text
//! training resources ─▶ TrainingService ─▶ TextClassifier::train ─▶ Index
//!                                                                    │ sync
//! message ─▶ Normalizer ─▶ TextClassifier::classify_all ◀────────────┘
//! ```

pub mod classifier;
pub mod error;
pub mod index;
pub mod language;
pub mod lexicon;
pub mod normalize;
pub mod training;

pub use classifier::{ClassificationResult, TextClassifier, similarity};
pub use error::{NlpError, NlpResult};
pub use index::{Document, Field, FieldKind, Filter, Index, MemoryIndex, Query};
pub use language::Language;
pub use lexicon::{Lexicon, LexiconBuilder};
pub use normalize::{Form, NormalizeOptions, Normalizer};
pub use training::{
    DEFAULT_CATEGORY, FileStateStore, MemoryStateStore, StateStore, TrainingDataSet,
    TrainingReport, TrainingResource, TrainingService, TrainingState,
};

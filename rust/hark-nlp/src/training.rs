//! Startup training from training resources.
//!
//! A training resource is a JSON document holding one or more training sets,
//! each aimed at a namespace:
//!
//! ```json
//! { "training-set": [
//!     { "force": false, "namespace": "ConvertNumbers",
//!       "training": [
//!         { "language": "spanish", "categories": ["convert"],
//!           "values": ["convertir numeros", "pasar a romanos"] } ] } ] }
//! ```
//!
//! Every value is trained under every category of its block. A block without
//! categories trains its values under [`DEFAULT_CATEGORY`].
//!
//! The [`TrainingService`] remembers which resources it already applied in a
//! [`StateStore`], so restarting the process does not index them again
//! unless a training set is marked `force`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::TextClassifier;
use crate::error::{NlpError, NlpResult};
use crate::index::Index;
use crate::language::Language;
use crate::normalize::Normalizer;

mod state;

pub use state::{FileStateStore, MemoryStateStore, StateStore, TrainingState};

/// Category assigned to values of a block that declares none.
pub const DEFAULT_CATEGORY: &str = "default";

/// One block of examples, tied to the namespace it trains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingDataSet {
    pub namespace: String,
    pub language: Language,
    pub categories: Vec<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TrainingBlock {
    language: Language,
    #[serde(default = "default_categories")]
    categories: Vec<String>,
    values: Vec<String>,
}

fn default_categories() -> Vec<String> {
    vec![DEFAULT_CATEGORY.to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrainingSet {
    #[serde(default)]
    pub force: bool,
    pub namespace: String,
    training: Vec<TrainingBlock>,
}

impl TrainingSet {
    pub fn data_sets(&self) -> Vec<TrainingDataSet> {
        self.training
            .iter()
            .map(|block| TrainingDataSet {
                namespace: self.namespace.clone(),
                language: block.language,
                categories: block.categories.clone(),
                values: block.values.clone(),
            })
            .collect()
    }
}

/// A named training document.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingResource {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "training-set")]
    pub training_sets: Vec<TrainingSet>,
}

impl TrainingResource {
    /// Parse and validate a resource.
    pub fn from_json(id: impl Into<String>, json: &str) -> NlpResult<Self> {
        let id = id.into();
        let mut resource: TrainingResource = serde_json::from_str(json).map_err(|error| {
            NlpError::configuration(format!("malformed training resource {id}: {error}"))
        })?;

        for set in &resource.training_sets {
            if set.namespace.trim().is_empty() {
                return Err(NlpError::configuration(format!(
                    "training resource {id} has a training set without namespace"
                )));
            }
            if set.training.iter().any(|block| block.categories.is_empty()) {
                return Err(NlpError::configuration(format!(
                    "training resource {id} declares an empty category list"
                )));
            }
        }

        resource.id = id;
        Ok(resource)
    }
}

/// Which resources a [`TrainingService::load`] call indexed or skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    /// Data sets re-indexed from the stored state into a volatile index.
    pub replayed: usize,
}

pub struct TrainingService {
    index: Arc<dyn Index>,
    normalizer: Normalizer,
    store: Arc<dyn StateStore>,
}

impl TrainingService {
    pub fn new(index: Arc<dyn Index>, normalizer: Normalizer, store: Arc<dyn StateStore>) -> Self {
        TrainingService {
            index,
            normalizer,
            store,
        }
    }

    pub fn classifier(&self, namespace: &str) -> TextClassifier {
        TextClassifier::new(self.index.clone(), namespace, self.normalizer.clone())
    }

    /// Load every `*.json` file of `dir`, in file name order, as a training
    /// resource identified by its file name.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> NlpResult<TrainingReport> {
        let mut paths = fs::read_dir(dir.as_ref())?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|path| path.extension().is_some_and(|extension| extension == "json"));
        paths.sort();

        let mut resources = Vec::with_capacity(paths.len());
        for path in paths {
            let id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let json = fs::read_to_string(&path)?;
            resources.push(TrainingResource::from_json(id, &json)?);
        }

        self.load(&resources)
    }

    /// Train the resources that were not applied yet, sync the index, and
    /// commit the new state.
    ///
    /// If anything fails before the index is synced, staged documents are
    /// discarded and the stored state is left untouched.
    pub fn load(&self, resources: &[TrainingResource]) -> NlpResult<TrainingReport> {
        let mut state = self.store.load()?;

        let report = match self.train(&mut state, resources) {
            Ok(report) => report,
            Err(error) => {
                self.index.discard()?;
                return Err(error);
            }
        };

        // Document ids are content hashes: if the process dies between the
        // sync and the commit, the next start re-indexes identical documents.
        self.index.sync()?;
        self.store.commit(&state)?;

        info!(
            "training finished: {} applied, {} skipped, {} replayed",
            report.applied.len(),
            report.skipped.len(),
            report.replayed
        );
        Ok(report)
    }

    fn train(
        &self,
        state: &mut TrainingState,
        resources: &[TrainingResource],
    ) -> NlpResult<TrainingReport> {
        let mut report = TrainingReport::default();

        if !self.index.is_durable() {
            for data_set in &state.training_sets {
                self.classifier(&data_set.namespace)
                    .train_all(std::slice::from_ref(data_set))?;
            }
            report.replayed = state.training_sets.len();
        }

        for resource in resources {
            let already_applied = state.applied.contains(&resource.id);
            let mut trained = false;

            for set in &resource.training_sets {
                if already_applied && !set.force {
                    continue;
                }
                info!("training namespace '{}' from {}", set.namespace, resource.id);

                let data_sets = set.data_sets();
                self.classifier(&set.namespace).train_all(&data_sets)?;
                for data_set in data_sets {
                    if !state.training_sets.contains(&data_set) {
                        state.training_sets.push(data_set);
                    }
                }
                trained = true;
            }

            if trained {
                state.applied.insert(resource.id.clone());
                report.applied.push(resource.id.clone());
            } else {
                if resource.training_sets.is_empty() {
                    warn!("training resource {} has no training sets", resource.id);
                }
                report.skipped.push(resource.id.clone());
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::lexicon::Lexicon;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    const NUMBERS: &str = r#"{
        "training-set": [{
            "namespace": "ConvertNumbers",
            "training": [
                { "language": "spanish", "categories": ["convert"],
                  "values": ["convertir numeros", "pasar a romanos"] },
                { "language": "english", "values": ["convert numbers"] }
            ]
        }]
    }"#;

    const FORCED: &str = r#"{
        "training-set": [{
            "force": true,
            "namespace": "Cancel",
            "training": [{ "language": "es", "categories": ["cancel"], "values": ["cancelar"] }]
        }]
    }"#;

    fn service(index: Arc<MemoryIndex>, store: Arc<dyn StateStore>) -> TrainingService {
        let normalizer = Normalizer::new(Arc::new(Lexicon::builtin().unwrap()));
        TrainingService::new(index, normalizer, store)
    }

    #[test]
    fn applies_resources_and_records_state() -> TestResult {
        let index = Arc::new(MemoryIndex::new());
        let store = Arc::new(MemoryStateStore::new());
        let service = service(index.clone(), store.clone());

        let report = service.load(&[TrainingResource::from_json("numbers.json", NUMBERS)?])?;
        assert_eq!(report.applied, vec!["numbers.json".to_string()]);
        assert_eq!(index.len(), 3);

        let state = store.load()?;
        assert!(state.applied.contains("numbers.json"));
        assert_eq!(state.training_sets.len(), 2);
        assert_eq!(state.training_sets[1].categories, vec![DEFAULT_CATEGORY.to_string()]);

        let classifier = service.classifier("ConvertNumbers");
        assert_eq!(
            classifier.classify("convertir numeros", Language::Spanish)?,
            Some("convert".to_string())
        );
        Ok(())
    }

    #[test]
    fn applied_resources_are_skipped_unless_forced() -> TestResult {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
        let resources = [
            TrainingResource::from_json("numbers.json", NUMBERS)?,
            TrainingResource::from_json("cancel.json", FORCED)?,
        ];

        service(Arc::new(MemoryIndex::new()), store.clone()).load(&resources)?;

        let report = service(Arc::new(MemoryIndex::new()), store.clone()).load(&resources)?;
        assert_eq!(report.applied, vec!["cancel.json".to_string()]);
        assert_eq!(report.skipped, vec!["numbers.json".to_string()]);
        assert_eq!(report.replayed, 3);
        assert_eq!(store.load()?.training_sets.len(), 3);
        Ok(())
    }

    #[test]
    fn volatile_index_is_rebuilt_from_state() -> TestResult {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
        let resources = [TrainingResource::from_json("numbers.json", NUMBERS)?];
        service(Arc::new(MemoryIndex::new()), store.clone()).load(&resources)?;

        let index = Arc::new(MemoryIndex::new());
        let restarted = service(index.clone(), store);
        restarted.load(&resources)?;
        assert_eq!(index.len(), 3);
        Ok(())
    }

    #[test]
    fn file_state_survives_restarts() -> TestResult {
        let dir = tempfile::tempdir()?;
        let resources_dir = dir.path().join("training");
        fs::create_dir_all(&resources_dir)?;
        fs::write(resources_dir.join("numbers.json"), NUMBERS)?;
        fs::write(resources_dir.join("README.md"), "ignored")?;

        let store = Arc::new(FileStateStore::new(dir.path().join("state.json")));
        let first = service(Arc::new(MemoryIndex::new()), store.clone()).load_dir(&resources_dir)?;
        assert_eq!(first.applied, vec!["numbers.json".to_string()]);

        let second = service(Arc::new(MemoryIndex::new()), store).load_dir(&resources_dir)?;
        assert_eq!(second.skipped, vec!["numbers.json".to_string()]);
        Ok(())
    }

    #[test]
    fn malformed_resources_are_configuration_errors() {
        let missing_values = r#"{ "training-set": [{ "namespace": "x",
            "training": [{ "language": "spanish" }] }] }"#;
        assert!(matches!(
            TrainingResource::from_json("bad.json", missing_values),
            Err(NlpError::Configuration(_))
        ));

        let no_namespace = r#"{ "training-set": [{ "namespace": " ",
            "training": [{ "language": "spanish", "values": ["hola"] }] }] }"#;
        assert!(matches!(
            TrainingResource::from_json("bad.json", no_namespace),
            Err(NlpError::Configuration(_))
        ));
    }

    #[test]
    fn failed_training_leaves_state_untouched() -> TestResult {
        let index = Arc::new(MemoryIndex::new());
        let store = Arc::new(MemoryStateStore::new());
        let service = service(index.clone(), store.clone());

        let empty_category = r#"{ "training-set": [{ "namespace": "x",
            "training": [{ "language": "spanish", "categories": ["ok", ""], "values": ["hola"] }] }] }"#;
        let resource = TrainingResource::from_json("bad.json", empty_category)?;
        assert!(service.load(&[resource]).is_err());

        index.sync()?;
        assert!(index.is_empty());
        assert_eq!(store.load()?, TrainingState::default());
        Ok(())
    }
}

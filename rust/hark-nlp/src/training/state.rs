use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::TrainingDataSet;
use crate::error::{NlpError, NlpResult};

/// What training has already been applied.
///
/// Both slots are always written together: a resource is never marked
/// applied without its data sets, and never accumulated without the mark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Identifiers of the training resources already indexed.
    #[serde(rename = "appliedTrainingSets", default)]
    pub applied: BTreeSet<String>,
    /// Every data set indexed so far.
    #[serde(rename = "trainingSets", default)]
    pub training_sets: Vec<TrainingDataSet>,
}

/// Durable home of the [`TrainingState`].
pub trait StateStore: Send + Sync {
    fn load(&self) -> NlpResult<TrainingState>;

    /// Replace the stored state in a single atomic write.
    fn commit(&self, state: &TrainingState) -> NlpResult<()>;
}

/// A [`StateStore`] that forgets everything when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<TrainingState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> NlpResult<TrainingState> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, state: &TrainingState) -> NlpResult<()> {
        *self.state.write() = state.clone();
        Ok(())
    }
}

/// A [`StateStore`] backed by one JSON file.
///
/// Commits write a sibling temporary file and rename it over the target, so
/// a crash leaves either the old or the new state on disk.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileStateStore {
            path: path.as_ref().to_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> NlpResult<TrainingState> {
        if !self.path.exists() {
            return Ok(TrainingState::default());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        serde_json::from_reader(reader).map_err(|error| {
            NlpError::State(format!("cannot read {}: {error}", self.path.display()))
        })
    }

    fn commit(&self, state: &TrainingState) -> NlpResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp_file = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(&self.path)
            .map_err(|error| NlpError::State(format!("cannot persist state: {error}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn state() -> TrainingState {
        TrainingState {
            applied: BTreeSet::from(["numbers.json".to_string()]),
            training_sets: vec![TrainingDataSet {
                namespace: "ConvertNumbers".into(),
                language: Language::Spanish,
                categories: vec!["convert".into()],
                values: vec!["convertir numeros".into()],
            }],
        }
    }

    #[test]
    fn file_store_round_trips_both_slots() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStateStore::new(dir.path().join("state").join("training.json"));
        assert_eq!(store.load()?, TrainingState::default());

        store.commit(&state())?;
        assert_eq!(FileStateStore::new(store.path()).load()?, state());

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path())?)?;
        assert!(raw.get("appliedTrainingSets").is_some());
        assert!(raw.get("trainingSets").is_some());
        Ok(())
    }

    #[test]
    fn corrupt_state_is_reported() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("training.json");
        fs::write(&path, "{ not json")?;
        assert!(matches!(FileStateStore::new(&path).load(), Err(NlpError::State(_))));
        Ok(())
    }

    #[test]
    fn memory_store_keeps_last_commit() -> TestResult {
        let store = MemoryStateStore::new();
        store.commit(&state())?;
        assert_eq!(store.load()?, state());
        Ok(())
    }
}

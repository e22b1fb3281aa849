use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{Document, Index, Query};
use crate::error::NlpResult;
use crate::language::Language;

type Partitions = HashMap<(String, Language), Vec<Document>>;

/// An [`Index`] kept entirely in memory and never persisted.
///
/// Staged documents wait behind a mutex until [`Index::sync`] publishes a new
/// snapshot of the committed partitions. A search holds the read lock only
/// long enough to clone the current snapshot's `Arc` and filters outside of
/// it; `sync` takes the write lock only to swap in the rebuilt snapshot.
/// Once training is over nothing takes the write lock again, and concurrent
/// searches never block each other.
#[derive(Default)]
pub struct MemoryIndex {
    staged: Mutex<Vec<Document>>,
    committed: RwLock<Arc<Partitions>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed documents across all partitions.
    pub fn len(&self) -> usize {
        self.snapshot().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Partitions> {
        self.committed.read().clone()
    }
}

impl Index for MemoryIndex {
    fn index(&self, document: Document) -> NlpResult<()> {
        self.staged.lock().push(document);
        Ok(())
    }

    fn search(&self, query: &Query, limit: usize) -> NlpResult<Vec<Document>> {
        let snapshot = self.snapshot();
        let key = (query.namespace.clone(), query.language);
        let documents = snapshot
            .get(&key)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| query.matches(document))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    fn sync(&self) -> NlpResult<()> {
        // Holding the staging lock for the whole sync keeps syncs serialized.
        let mut staging = self.staged.lock();
        let staged = std::mem::take(&mut *staging);
        if staged.is_empty() {
            return Ok(());
        }

        let mut partitions = Partitions::clone(&self.snapshot());
        let count = staged.len();

        for document in staged {
            let partition = partitions
                .entry((document.namespace.clone(), document.language))
                .or_default();
            match partition.iter_mut().find(|existing| existing.id == document.id) {
                Some(existing) => *existing = document,
                None => partition.push(document),
            }
        }

        *self.committed.write() = Arc::new(partitions);
        drop(staging);
        debug!("synced {count} staged documents");
        Ok(())
    }

    fn discard(&self) -> NlpResult<()> {
        let dropped = std::mem::take(&mut *self.staged.lock()).len();
        if dropped > 0 {
            debug!("discarded {dropped} staged documents");
        }
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

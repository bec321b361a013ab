//! Embedded Document Engine
//!
//! A small collection-oriented JSON document store: named collections with
//! compound unique constraints and equality indices, sorted reads through an
//! injected comparator, and whole-engine snapshots to a single file.
//!
//! Every operation takes `&self`; collection state sits behind one
//! `parking_lot::RwLock`, so a uniqueness check and the insert it guards are a
//! single critical section. No lock is held across an `.await`.

pub mod collection;
pub mod persistence;

pub use collection::{Collection, CollectionOptions, DOC_ID_FIELD};

use crate::comparator::Comparator;
use crate::error::EngineError;
use parking_lot::RwLock;
use persistence::EngineSnapshot;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Live handle to one document store.
pub struct Engine {
    name: String,
    filename: Option<PathBuf>,
    comparator: Arc<dyn Comparator>,
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("collections", &self.collection_names())
            .finish()
    }
}

impl Engine {
    /// Create an engine with no backing file.
    pub fn in_memory(name: impl Into<String>, comparator: Arc<dyn Comparator>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            comparator,
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open the engine bound to `path`, loading every collection from it if a
    /// snapshot exists. A missing file yields an empty engine bound to `path`.
    pub async fn open(path: &Path, comparator: Arc<dyn Comparator>) -> Result<Self, EngineError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut collections = BTreeMap::new();
        if let Some(snapshot) = persistence::read_snapshot(path).await? {
            for coll in snapshot.collections {
                let coll = Collection::from_snapshot(coll)?;
                collections.insert(coll.name().to_string(), coll);
            }
        }

        Ok(Self {
            name,
            filename: Some(path.to_path_buf()),
            comparator,
            collections: RwLock::new(collections),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file, `None` for in-memory engines.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn comparator(&self) -> &dyn Comparator {
        self.comparator.as_ref()
    }

    /// Create a collection unless one with this name exists.
    ///
    /// Returns `true` when the collection was created. An existing collection
    /// keeps its original options.
    pub fn add_collection(&self, name: &str, options: CollectionOptions) -> bool {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return false;
        }
        collections.insert(name.to_string(), Collection::new(name, options));
        true
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Options a collection was created with.
    pub fn collection_options(&self, name: &str) -> Option<CollectionOptions> {
        self.collections.read().get(name).map(|c| c.options().clone())
    }

    /// Collection names in lexical order.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize, EngineError> {
        self.with_collection(collection, |c| c.len())
    }

    pub fn insert(&self, collection: &str, document: Value) -> Result<u64, EngineError> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::CollectionNotFound(collection.to_string()))?;
        coll.insert(document)
    }

    pub fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, EngineError> {
        self.with_collection(collection, |c| c.find_one(field, value))
    }

    pub fn find(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Value>, EngineError> {
        self.with_collection(collection, |c| c.find(field, value))
    }

    /// Every document in `collection`, ordered by `field` under the engine's comparator.
    pub fn find_sorted(&self, collection: &str, field: &str) -> Result<Vec<Value>, EngineError> {
        let comparator = self.comparator.clone();
        self.with_collection(collection, |c| c.sorted_by(field, comparator.as_ref()))
    }

    pub fn remove_where(&self, collection: &str, field: &str, value: &Value) -> Result<usize, EngineError> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::CollectionNotFound(collection.to_string()))?;
        Ok(coll.remove_where(field, value))
    }

    /// Serialize the full engine to its backing file. Returns bytes written.
    pub async fn save_database(&self) -> Result<usize, EngineError> {
        let path = self
            .filename
            .clone()
            .ok_or_else(|| EngineError::NotPersistent(self.name.clone()))?;
        let snapshot = self.snapshot();
        persistence::write_snapshot(&path, &snapshot).await
    }

    /// Point-in-time copy of every collection.
    pub fn snapshot(&self) -> EngineSnapshot {
        let collections = self.collections.read();
        EngineSnapshot {
            name: self.name.clone(),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            collections: collections.values().map(|c| c.to_snapshot()).collect(),
        }
    }

    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&Collection) -> T,
    ) -> Result<T, EngineError> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| EngineError::CollectionNotFound(collection.to_string()))?;
        Ok(f(coll))
    }
}

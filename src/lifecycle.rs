//! Persistence Lifecycle
//!
//! `StoreSession` owns the single engine handle. It moves from uninitialized to
//! active on a successful `start` and stays active; a failed `start` leaves the
//! previous state untouched. The session does no locking of its own: callers
//! serialize `start` ahead of everything else and order `save` after the
//! writes it should capture.

use crate::comparator::{Comparator, LegacyComparator};
use crate::engine::Engine;
use crate::error::{EngineError, StoreError};
use crate::registry::CollectionRegistry;
use crate::schema::ensure_meta_collections;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Options recognised by `StoreSession::start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Snapshot file; `None` selects in-memory mode.
    #[serde(default)]
    pub save_file: Option<PathBuf>,
}

impl StartOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_save_file(path: impl Into<PathBuf>) -> Self {
        Self {
            save_file: Some(path.into()),
        }
    }

    /// Parse options from an untyped object such as `{"saveFile": "/tmp/db.json"}`.
    ///
    /// A `saveFile` that is present but not a string (or null) is `InvalidArgument`.
    pub fn from_value(value: &Value) -> Result<Self, StoreError> {
        let Some(object) = value.as_object() else {
            return Err(StoreError::InvalidArgument(format!(
                "start options must be an object, got {}",
                value
            )));
        };
        match object.get("saveFile") {
            None | Some(Value::Null) => Ok(Self::in_memory()),
            Some(Value::String(path)) => Ok(Self::with_save_file(path)),
            Some(other) => Err(StoreError::InvalidArgument(format!(
                "saveFile must be a path string, got {}",
                other
            ))),
        }
    }
}

/// Reject save paths that cannot name a file.
pub fn validate_save_file(path: &Path) -> Result<(), StoreError> {
    let display = path.display();
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidArgument("saveFile is empty".to_string()));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(StoreError::InvalidArgument(format!(
            "saveFile {} contains a NUL byte",
            display
        )));
    }
    // `components()` drops a trailing `.`, so check the raw text as well.
    let raw = path.to_string_lossy();
    let names_file = matches!(path.components().next_back(), Some(Component::Normal(_)));
    let trailing_dot = raw == "." || raw.ends_with(&format!("{}.", std::path::MAIN_SEPARATOR));
    if !names_file || trailing_dot || raw.ends_with(std::path::MAIN_SEPARATOR) {
        return Err(StoreError::InvalidArgument(format!(
            "saveFile {} does not name a file",
            display
        )));
    }
    if path.is_dir() {
        return Err(StoreError::InvalidArgument(format!(
            "saveFile {} is a directory",
            display
        )));
    }
    Ok(())
}

/// Owner of the process's engine handle.
pub struct StoreSession {
    engine: Option<Engine>,
    comparator: Arc<dyn Comparator>,
}

impl Default for StoreSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreSession {
    /// Session using the legacy comparator policy.
    pub fn new() -> Self {
        Self::with_comparator(Arc::new(LegacyComparator))
    }

    /// Session whose engines are built with `comparator`.
    pub fn with_comparator(comparator: Arc<dyn Comparator>) -> Self {
        Self {
            engine: None,
            comparator,
        }
    }

    /// Open (or create) the store and ensure the meta-collections.
    ///
    /// With a save file, its parent directory is created and any existing
    /// snapshot is fully loaded before this returns. Without one, a fresh
    /// in-memory engine with a random name is created.
    pub async fn start(&mut self, options: StartOptions) -> Result<(), StoreError> {
        let engine = match options.save_file {
            Some(path) => {
                validate_save_file(&path)?;
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        StoreError::StorageUnavailable(EngineError::io(parent, e))
                    })?;
                }
                let engine = Engine::open(&path, self.comparator.clone()).await?;
                info!(
                    "Opened store {:?} ({} collections loaded)",
                    path,
                    engine.collection_names().len()
                );
                engine
            }
            None => {
                let name = format!("{}.db", uuid::Uuid::new_v4());
                debug!("Opened in-memory store {}", name);
                Engine::in_memory(name, self.comparator.clone())
            }
        };

        ensure_meta_collections(&engine)?;
        self.engine = Some(engine);
        Ok(())
    }

    /// Write the full engine state to the configured save file.
    ///
    /// Fails with `NoActiveDatabase` before `start`, and also for in-memory
    /// sessions, which have nowhere to write.
    pub async fn save(&self) -> Result<(), StoreError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or(StoreError::NoActiveDatabase("start has not been called"))?;
        let Some(path) = engine.filename() else {
            return Err(StoreError::NoActiveDatabase(
                "in-memory session has no save file",
            ));
        };
        let bytes = engine.save_database().await?;
        info!("Saved store {:?} ({} bytes)", path, bytes);
        Ok(())
    }

    /// Current engine handle, `None` before `start`.
    pub fn handle(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Registry over the active engine.
    pub fn registry(&self) -> Result<CollectionRegistry<'_>, StoreError> {
        self.engine
            .as_ref()
            .map(CollectionRegistry::new)
            .ok_or(StoreError::NoActiveDatabase("start has not been called"))
    }
}

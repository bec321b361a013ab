//! Snapshot persistence for the engine.
//!
//! The whole engine is serialized as one JSON document. Writes go to a sibling
//! temp file that is synced, renamed over the target, and then the parent
//! directory is synced, so a crash mid-write leaves the previous snapshot intact.

use crate::engine::collection::CollectionSnapshot;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// On-disk representation of an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub name: String,
    #[serde(default)]
    pub saved_at: Option<String>,
    pub collections: Vec<CollectionSnapshot>,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a snapshot. A missing file is `Ok(None)`; any other failure is an error.
pub async fn read_snapshot(path: &Path) -> Result<Option<EngineSnapshot>, EngineError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(EngineError::io(path, e)),
    };
    let snapshot: EngineSnapshot =
        serde_json::from_slice(&bytes).map_err(|source| EngineError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        "Read snapshot {:?} ({} bytes, {} collections)",
        path,
        bytes.len(),
        snapshot.collections.len()
    );
    Ok(Some(snapshot))
}

/// Write a snapshot atomically. Returns the number of bytes written.
pub async fn write_snapshot(path: &Path, snapshot: &EngineSnapshot) -> Result<usize, EngineError> {
    let bytes = serde_json::to_vec(snapshot).map_err(|source| EngineError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = temp_path(path);
    if let Err(e) = write_synced(&tmp_path, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(EngineError::io(&tmp_path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(EngineError::io(path, e));
    }
    if let Err(e) = sync_parent_dir(path).await {
        tracing::warn!("Failed to sync directory of {:?}: {}", path, e);
    }

    Ok(bytes.len())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Flush the directory entry so the rename itself survives a crash.
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tokio::fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

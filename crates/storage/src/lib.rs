//! Storage layer: the learning-state snapshot on disk.
//!
//! One JSON document holding two nested count tables. Written once at the end of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// label -> occurrence count
pub type LabelCounts = BTreeMap<String, u64>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {} is not valid: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningSnapshot {
    #[serde(default, alias = "extensionLabels")]
    pub extension_labels: BTreeMap<String, LabelCounts>,
    #[serde(default, alias = "mimeLabels")]
    pub mime_labels: BTreeMap<String, LabelCounts>,
}

/// Reads a snapshot. `Ok(None)` when no file exists yet.
pub fn load(path: &Path) -> Result<Option<LearningSnapshot>, StateError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no learning state at {}", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let snapshot = serde_json::from_str(&raw).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(snapshot))
}

pub fn save(path: &Path, snapshot: &LearningSnapshot) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let payload = serde_json::to_string_pretty(snapshot).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, payload).map_err(io_err)
}

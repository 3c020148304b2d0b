//! Extraction backends: MIME detection, metadata/text extraction, term ranking.
//!
//! The core only talks to these through the traits below, so richer backends
//! can be swapped in behind feature flags without touching the pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod mime;
pub mod text;
pub mod tfidf;

pub use mime::{ChainedDetector, ExtensionMimeDetector, InferMimeDetector, OCTET_STREAM};
pub use text::PlainTextExtractor;
pub use tfidf::TfIdfRanker;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("term ranking failed: {0}")]
    Ranking(String),
}

impl ExtractError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            ExtractError::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

/// Metadata and text pulled out of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub metadata: BTreeMap<String, String>,
    pub content: String,
}

impl Extraction {
    /// Records a metadata value under its lower-cased key. Blank values are dropped.
    pub fn insert_metadata(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.metadata.insert(key.trim().to_lowercase(), value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTerm {
    pub term: String,
    pub weight: f64,
}

pub trait MimeDetector: Send + Sync {
    /// Returns `None` when this detector has no opinion about the file.
    fn detect(&self, path: &Path) -> Option<String>;
}

pub trait MetadataExtractor: Send + Sync {
    /// `mime` is the already-detected type; extractors use it to decide how to read the file.
    fn extract(&self, path: &Path, mime: &str) -> Result<Extraction, ExtractError>;
}

pub trait TermRanker: Send + Sync {
    /// Best terms first, at most `limit` of them.
    fn rank(&self, text: &str, limit: usize) -> Result<Vec<RankedTerm>, ExtractError>;
}

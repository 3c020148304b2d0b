use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One file under processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub mime_type: String,
    pub metadata: BTreeMap<String, String>,
    pub labels: Vec<String>,
    pub confidence_score: f64,
    pub is_consistent: bool,
    /// Set only once the file was physically moved.
    pub target_path: Option<PathBuf>,
    pub errors: Vec<String>,
    pub placement: Option<Placement>,
}

impl FileRecord {
    pub fn new(path: PathBuf, mime_type: impl Into<String>) -> Self {
        Self {
            path,
            mime_type: mime_type.into(),
            metadata: BTreeMap::new(),
            labels: Vec::new(),
            confidence_score: 0.0,
            is_consistent: true,
            target_path: None,
            errors: Vec::new(),
            placement: None,
        }
    }

    /// Lower-cased extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Routed into a category and sitting there now.
    pub fn is_organized(&self) -> bool {
        self.errors.is_empty()
            && matches!(
                &self.placement,
                Some(Placement {
                    route: Route::Category { .. },
                    status: MoveStatus::Moved | MoveStatus::AlreadyPlaced,
                })
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageReason {
    Errors,
    LowConfidence,
    /// The category path would leave the root.
    UnsafeDestination,
}

impl StageReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageReason::Errors => "errors",
            StageReason::LowConfidence => "low_confidence",
            StageReason::UnsafeDestination => "unsafe_destination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Relative category directory under the root.
    Category { dir: PathBuf },
    Staging { reason: StageReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    Moved,
    AlreadyPlaced,
    /// Destination name taken and the conflict policy said to leave it.
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub route: Route,
    pub status: MoveStatus,
}

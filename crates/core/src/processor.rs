//! Per-file classification: MIME detection, extraction, consistency check, labeling, learning.

use crate::labeler;
use crate::learning::{LearningStore, DEFAULT_SUGGESTION_LIMIT};
use crate::models::FileRecord;
use providers::{
    ChainedDetector, ExtractError, MetadataExtractor, PlainTextExtractor, TermRanker,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, warn};

/// The swappable extraction strategies a processor runs with.
pub struct Backends {
    pub mime: ChainedDetector,
    pub extractor: Box<dyn MetadataExtractor>,
    pub ranker: Option<Box<dyn TermRanker>>,
}

impl Backends {
    pub fn with_ranker(mut self, ranker: impl TermRanker + 'static) -> Self {
        self.ranker = Some(Box::new(ranker));
        self
    }

    pub fn with_extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            mime: ChainedDetector::default(),
            extractor: Box::new(PlainTextExtractor::default()),
            ranker: None,
        }
    }
}

pub struct MetadataProcessor<'a> {
    backends: &'a Backends,
    learning: Option<&'a LearningStore>,
    suggestion_limit: usize,
}

impl<'a> MetadataProcessor<'a> {
    pub fn new(backends: &'a Backends) -> Self {
        Self {
            backends,
            learning: None,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_learning(mut self, store: &'a LearningStore, limit: usize) -> Self {
        self.learning = Some(store);
        self.suggestion_limit = limit;
        self
    }

    pub fn detect_mime_type(&self, path: &Path) -> String {
        self.backends.mime.detect_or_default(path)
    }

    /// True when there is no title, or the title matches the file stem ignoring case.
    pub fn validate_filename(path: &Path, metadata: &BTreeMap<String, String>) -> bool {
        let Some(title) = metadata.get("title").filter(|t| !t.trim().is_empty()) else {
            return true;
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_lowercase())
            .unwrap_or_default();
        stem == title.trim().to_lowercase()
    }

    /// Never fails; problems end up in `record.errors`.
    pub fn process_file(&self, path: &Path) -> FileRecord {
        let mut record = FileRecord::new(path.to_path_buf(), self.detect_mime_type(path));

        let extraction = match self.backends.extractor.extract(path, &record.mime_type) {
            Ok(extraction) => extraction,
            Err(e) => {
                if e.is_permission_denied() {
                    warn!("PERMISSION ERROR reading {}: {}", path.display(), e);
                } else {
                    warn!("EXTRACTION ERROR {}: {}", path.display(), e);
                }
                record.errors.push(e.to_string());
                return record;
            }
        };

        record.metadata = extraction.metadata;
        record.is_consistent = Self::validate_filename(path, &record.metadata);
        if !record.is_consistent {
            warn!(
                "FILENAME MISMATCH: {} metadata title={}",
                path.display(),
                record.metadata.get("title").map(String::as_str).unwrap_or("")
            );
        }

        if let Err(e) = self.classify(&mut record, &extraction.content) {
            error!("METADATA ERROR {}: {}", path.display(), e);
            record.errors.push(e.to_string());
        }
        record
    }

    fn classify(&self, record: &mut FileRecord, content: &str) -> Result<(), ExtractError> {
        let mut labeling =
            labeler::generate_labels(content, &record.metadata, self.backends.ranker.as_deref())?;
        labeler::apply_media_override(&mut labeling, &record.mime_type, &record.extension());

        if let Some(store) = self.learning {
            let (suggested, boost) = store.suggest_labels(record, self.suggestion_limit);
            if !suggested.is_empty() {
                info!(
                    "LEARNING SUGGESTION: {} -> {:?} (+{})",
                    record.path.display(),
                    suggested,
                    boost
                );
                if labeling.labels.is_empty() || labeler::is_media_placeholder(&labeling.labels) {
                    labeling.labels = suggested;
                }
                labeling.confidence = (labeling.confidence + boost).min(100.0);
            }
        }

        record.labels = labeling.labels;
        record.confidence_score = labeling.confidence;
        Ok(())
    }
}

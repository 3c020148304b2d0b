//! Self-healing label memory: which labels past runs settled on per extension and MIME type.

use crate::models::FileRecord;
use std::collections::BTreeMap;
use std::path::Path;
use storage::{LabelCounts, LearningSnapshot};
use tracing::{debug, warn};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;
const MAX_BOOST: f64 = 20.0;
const BOOST_PER_COUNT: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearningStore {
    pub extension_labels: BTreeMap<String, LabelCounts>,
    pub mime_labels: BTreeMap<String, LabelCounts>,
}

impl LearningStore {
    /// Never fails: a missing or unreadable state file gives an empty store.
    pub fn load(path: &Path) -> Self {
        match storage::load(path) {
            Ok(Some(snapshot)) => {
                debug!("loaded learning state from {}", path.display());
                snapshot.into()
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("LEARNING STATE IGNORED: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        storage::save(path, &self.snapshot())?;
        Ok(())
    }

    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            extension_labels: self.extension_labels.clone(),
            mime_labels: self.mime_labels.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extension_labels.is_empty() && self.mime_labels.is_empty()
    }

    /// Labels seen for this file's extension and MIME type, most frequent first,
    /// with a confidence boost of `min(20, 2 * top count)`.
    pub fn suggest_labels(&self, record: &FileRecord, limit: usize) -> (Vec<String>, f64) {
        let mut candidates: Vec<(String, u64)> = Vec::new();
        let tables = [
            self.extension_labels.get(&record.extension()),
            self.mime_labels.get(&record.mime_type),
        ];
        for counts in tables.into_iter().flatten() {
            for (label, count) in counts {
                match candidates.iter_mut().find(|(l, _)| l.as_str() == label.as_str()) {
                    Some((_, total)) => *total += count,
                    None => candidates.push((label.clone(), *count)),
                }
            }
        }
        if candidates.is_empty() {
            return (Vec::new(), 0.0);
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        let boost = (candidates[0].1 as f64 * BOOST_PER_COUNT).min(MAX_BOOST);
        let labels = candidates
            .into_iter()
            .take(limit)
            .map(|(label, _)| label)
            .collect();
        (labels, boost)
    }

    /// Counts the record's primary label once under its extension and once under its MIME type.
    pub fn update(&mut self, record: &FileRecord) {
        let Some(primary) = record.primary_label() else {
            return;
        };
        let primary = primary.to_lowercase();
        *self
            .extension_labels
            .entry(record.extension())
            .or_default()
            .entry(primary.clone())
            .or_insert(0) += 1;
        *self
            .mime_labels
            .entry(record.mime_type.clone())
            .or_default()
            .entry(primary)
            .or_insert(0) += 1;
    }
}

impl From<LearningSnapshot> for LearningStore {
    fn from(snapshot: LearningSnapshot) -> Self {
        Self {
            extension_labels: snapshot.extension_labels,
            mime_labels: snapshot.mime_labels,
        }
    }
}

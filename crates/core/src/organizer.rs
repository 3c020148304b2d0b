//! Decides where each record belongs and moves it there.

use crate::config::ConflictPolicy;
use crate::models::{FileRecord, MoveStatus, Placement, Route, StageReason};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{error, info, warn};

pub const CODE_EXTENSIONS: [&str; 6] = [".py", ".js", ".ts", ".java", ".go", ".rb"];
const DEFAULT_LABEL: &str = "uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeSummary {
    /// Routed to a category (including files already in place).
    pub moved: usize,
    /// Routed to staging.
    pub staged: usize,
    /// Left where they were: already placed, or skipped on a name conflict.
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct OrganizationEngine {
    confidence_threshold: f64,
    staging_dir_name: String,
    conflict: ConflictPolicy,
    copy_then_delete: bool,
}

impl OrganizationEngine {
    pub fn new(confidence_threshold: f64, staging_dir_name: impl Into<String>) -> Self {
        Self {
            confidence_threshold,
            staging_dir_name: staging_dir_name.into(),
            conflict: ConflictPolicy::default(),
            copy_then_delete: false,
        }
    }

    pub fn with_conflict_policy(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_copy_then_delete(mut self, copy_then_delete: bool) -> Self {
        self.copy_then_delete = copy_then_delete;
        self
    }

    /// Relative category directory. First matching rule wins.
    pub fn determine_category(record: &FileRecord) -> PathBuf {
        let mime = record.mime_type.as_str();
        let extension = record.extension();
        let base = Path::new("Documents");

        if mime.starts_with("image/") {
            return Path::new("Media").join("Photos");
        }
        if mime.starts_with("video/") {
            return Path::new("Media").join("Videos");
        }
        if mime.starts_with("audio/") {
            return Path::new("Media").join("Audio");
        }
        if mime == "application/pdf" {
            return base.join("PDFs");
        }
        if CODE_EXTENSIONS.contains(&extension.as_str()) {
            return Path::new("Code").join("Scripts");
        }
        if mime.starts_with("text/") {
            return base.join("Text");
        }
        base.join(title_case(&path_safe_label(
            record.primary_label().unwrap_or(DEFAULT_LABEL),
        )))
    }

    pub fn route(&self, record: &FileRecord) -> Route {
        if !record.errors.is_empty() {
            Route::Staging {
                reason: StageReason::Errors,
            }
        } else if record.confidence_score < self.confidence_threshold {
            Route::Staging {
                reason: StageReason::LowConfidence,
            }
        } else {
            Route::Category {
                dir: Self::determine_category(record),
            }
        }
    }

    /// Moves every record to its category or to staging. Failures are logged per file.
    pub fn organize_files(&self, root: &Path, records: &mut [FileRecord]) -> OrganizeSummary {
        let mut summary = OrganizeSummary::default();
        let staging_root = root.join(&self.staging_dir_name);

        for record in records.iter_mut() {
            let mut route = self.route(record);
            if let Route::Category { dir } = &route {
                if !stays_within(root, &root.join(dir)) {
                    warn!(
                        "UNSAFE CATEGORY {} for {}",
                        dir.display(),
                        record.path.display()
                    );
                    route = Route::Staging {
                        reason: StageReason::UnsafeDestination,
                    };
                }
            }
            let destination_dir = match &route {
                Route::Staging { reason } => {
                    summary.staged += 1;
                    info!("STAGING ({}): {}", reason.as_str(), record.path.display());
                    staging_root.clone()
                }
                Route::Category { dir } => {
                    summary.moved += 1;
                    root.join(dir)
                }
            };

            let status = self.place(record, &destination_dir);
            match &status {
                MoveStatus::AlreadyPlaced | MoveStatus::Skipped => summary.unchanged += 1,
                MoveStatus::Failed { .. } => summary.failed += 1,
                MoveStatus::Moved => {}
            }
            record.placement = Some(Placement { route, status });
        }
        summary
    }

    fn place(&self, record: &mut FileRecord, destination_dir: &Path) -> MoveStatus {
        let Some(file_name) = record.path.file_name() else {
            return MoveStatus::Failed {
                error: format!("{} has no file name", record.path.display()),
            };
        };
        let mut destination = destination_dir.join(file_name);
        if destination == record.path {
            info!("SKIP MOVE (already placed): {}", destination.display());
            return MoveStatus::AlreadyPlaced;
        }

        if let Err(e) = fs::create_dir_all(destination_dir) {
            return self.failure(record, destination_dir, e);
        }

        if fs::symlink_metadata(&destination).is_ok() {
            match self.conflict {
                ConflictPolicy::Skip => {
                    warn!(
                        "SKIP MOVE (name taken): {} -> {}",
                        record.path.display(),
                        destination.display()
                    );
                    return MoveStatus::Skipped;
                }
                ConflictPolicy::Overwrite => {}
                ConflictPolicy::Rename => destination = resolve_conflict(&destination),
            }
        }

        match move_file(&record.path, &destination, self.copy_then_delete) {
            Ok(()) => {
                info!("MOVED: {} -> {}", record.path.display(), destination.display());
                record.path = destination.clone();
                record.target_path = Some(destination);
                MoveStatus::Moved
            }
            Err(e) => self.failure(record, &destination, e),
        }
    }

    fn failure(&self, record: &FileRecord, target: &Path, e: io::Error) -> MoveStatus {
        if e.kind() == io::ErrorKind::PermissionDenied {
            warn!(
                "PERMISSION ERROR moving {} -> {}: {}",
                record.path.display(),
                target.display(),
                e
            );
        } else {
            error!(
                "MOVE ERROR {} -> {}: {}",
                record.path.display(),
                target.display(),
                e
            );
        }
        MoveStatus::Failed {
            error: e.to_string(),
        }
    }
}

/// Capitalises the first letter of every word, lower-casing the rest.
pub fn title_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut at_word_start = true;
    for c in label.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// A label usable as one directory name: separators become `_`, and blank or
/// dot-only names fall back to `uncategorized`.
pub fn path_safe_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        DEFAULT_LABEL.to_string()
    } else {
        cleaned
    }
}

/// `dir` is lexically under `root` with no `..` hops or prefixes.
fn stays_within(root: &Path, dir: &Path) -> bool {
    match dir.strip_prefix(root) {
        Ok(rest) => rest.components().all(|c| matches!(c, Component::Normal(_))),
        Err(_) => false,
    }
}

/// First free `stem_N.ext` next to `dest`.
fn resolve_conflict(dest: &Path) -> PathBuf {
    let stem = dest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    let ext = dest
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut counter = 1;
    loop {
        let name = if ext.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, ext)
        };
        let candidate = parent.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        counter += 1;
    }
}

fn move_file(from: &Path, to: &Path, copy_then_delete: bool) -> io::Result<()> {
    if copy_then_delete {
        fs::copy(from, to)?;
        fs::remove_file(from)
    } else {
        fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: PathBuf, mime: &str, labels: &[&str], confidence: f64) -> FileRecord {
        let mut record = FileRecord::new(path, mime);
        record.labels = labels.iter().map(|l| l.to_string()).collect();
        record.confidence_score = confidence;
        record
    }

    fn category(path: &str, mime: &str, labels: &[&str]) -> PathBuf {
        OrganizationEngine::determine_category(&record(PathBuf::from(path), mime, labels, 100.0))
    }

    #[test]
    fn category_priority_order() {
        assert_eq!(category("/r/a.png", "image/png", &[]), Path::new("Media/Photos"));
        assert_eq!(category("/r/a.mp4", "video/mp4", &[]), Path::new("Media/Videos"));
        assert_eq!(category("/r/a.mp3", "audio/mpeg", &[]), Path::new("Media/Audio"));
        assert_eq!(category("/r/a.pdf", "application/pdf", &[]), Path::new("Documents/PDFs"));
        assert_eq!(category("/r/a.py", "text/x-python", &[]), Path::new("Code/Scripts"));
        assert_eq!(category("/r/a.txt", "text/plain", &[]), Path::new("Documents/Text"));
        assert_eq!(
            category("/r/a.docx", "application/zip", &["tax return"]),
            Path::new("Documents/Tax Return")
        );
        assert_eq!(
            category("/r/a.bin", "application/octet-stream", &[]),
            Path::new("Documents/Uncategorized")
        );
    }

    #[test]
    fn errors_always_stage_even_with_high_confidence() {
        let engine = OrganizationEngine::new(70.0, "_STAGE");
        let mut r = record(PathBuf::from("/r/a.txt"), "text/plain", &["notes"], 100.0);
        r.errors.push("boom".into());
        assert_eq!(
            engine.route(&r),
            Route::Staging {
                reason: StageReason::Errors
            }
        );
    }

    #[test]
    fn threshold_splits_stage_and_category() {
        let engine = OrganizationEngine::new(70.0, "_STAGE");
        let low = record(PathBuf::from("/r/a.txt"), "text/plain", &["notes"], 69.9);
        let high = record(PathBuf::from("/r/a.txt"), "text/plain", &["notes"], 70.0);
        assert_eq!(
            engine.route(&low),
            Route::Staging {
                reason: StageReason::LowConfidence
            }
        );
        assert_eq!(
            engine.route(&high),
            Route::Category {
                dir: PathBuf::from("Documents/Text")
            }
        );
    }

    #[test]
    fn moves_and_stages_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("notes.txt"), "notes").unwrap();
        fs::write(root.join("mystery.bin"), b"").unwrap();

        let mut records = vec![
            record(root.join("notes.txt"), "text/plain", &["notes"], 80.0),
            record(root.join("mystery.bin"), "application/octet-stream", &[], 0.0),
        ];
        let engine = OrganizationEngine::new(70.0, "_STAGE");
        let summary = engine.organize_files(root, &mut records);

        assert_eq!(summary.moved, 1);
        assert_eq!(summary.staged, 1);
        assert_eq!(summary.failed, 0);
        let moved_to = root.join("Documents/Text/notes.txt");
        assert!(moved_to.exists());
        assert_eq!(records[0].target_path.as_deref(), Some(moved_to.as_path()));
        assert_eq!(records[0].path, moved_to);
        assert!(records[0].is_organized());
        assert!(root.join("_STAGE/mystery.bin").exists());
        assert!(!records[1].is_organized());
    }

    #[test]
    fn already_placed_file_is_not_moved() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let dir = root.join("Documents/Text");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "notes").unwrap();

        let mut records = vec![record(dir.join("notes.txt"), "text/plain", &["notes"], 90.0)];
        let summary = OrganizationEngine::new(70.0, "_STAGE").organize_files(root, &mut records);

        assert_eq!(summary.moved, 1);
        assert_eq!(summary.unchanged, 1);
        assert!(records[0].target_path.is_none());
        assert_eq!(
            records[0].placement.as_ref().map(|p| &p.status),
            Some(&MoveStatus::AlreadyPlaced)
        );
    }

    #[test]
    fn name_conflicts_are_renamed_by_default() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let dir = root.join("Documents/Text");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "existing").unwrap();
        fs::create_dir(root.join("inbox")).unwrap();
        fs::write(root.join("inbox/notes.txt"), "incoming").unwrap();

        let mut records = vec![record(
            root.join("inbox/notes.txt"),
            "text/plain",
            &["notes"],
            90.0,
        )];
        OrganizationEngine::new(70.0, "_STAGE").organize_files(root, &mut records);

        assert_eq!(fs::read_to_string(dir.join("notes.txt")).unwrap(), "existing");
        assert_eq!(fs::read_to_string(dir.join("notes_1.txt")).unwrap(), "incoming");
    }

    #[test]
    fn skip_policy_leaves_file_in_place() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let dir = root.join("Documents/Text");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "existing").unwrap();
        fs::write(root.join("notes.txt"), "incoming").unwrap();

        let mut records = vec![record(root.join("notes.txt"), "text/plain", &["notes"], 90.0)];
        let summary = OrganizationEngine::new(70.0, "_STAGE")
            .with_conflict_policy(ConflictPolicy::Skip)
            .organize_files(root, &mut records);

        assert_eq!(summary.unchanged, 1);
        assert!(root.join("notes.txt").exists());
        assert!(!records[0].is_organized());
    }

    #[test]
    fn missing_source_fails_without_aborting_batch() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("real.txt"), "here").unwrap();

        let mut records = vec![
            record(root.join("ghost.txt"), "text/plain", &["notes"], 90.0),
            record(root.join("real.txt"), "text/plain", &["notes"], 90.0),
        ];
        let summary = OrganizationEngine::new(70.0, "_STAGE")
            .with_copy_then_delete(true)
            .organize_files(root, &mut records);

        assert_eq!(summary.failed, 1);
        assert!(records[0].target_path.is_none());
        assert!(root.join("Documents/Text/real.txt").exists());
        assert!(!root.join("real.txt").exists());
    }

    #[test]
    fn labels_cannot_climb_out_of_documents() {
        let dotted = category("/r/a.zzq", "application/octet-stream", &["x/../../../escaped"]);
        assert_eq!(dotted, Path::new("Documents/X_.._.._.._Escaped"));
        assert_eq!(dotted.components().count(), 2);

        let absolute = category("/r/a.zzq", "application/octet-stream", &["/etc/cron.d"]);
        assert_eq!(absolute, Path::new("Documents/_Etc_Cron.D"));

        for label in ["..", ".", "  "] {
            assert_eq!(
                category("/r/a.zzq", "application/octet-stream", &[label]),
                Path::new("Documents/Uncategorized")
            );
        }
    }

    #[test]
    fn path_safe_label_rules() {
        assert_eq!(path_safe_label("tax return"), "tax return");
        assert_eq!(path_safe_label("a\\b/c"), "a_b_c");
        assert_eq!(path_safe_label(" .. "), "uncategorized");
        assert_eq!(path_safe_label(""), "uncategorized");
    }

    #[test]
    fn destinations_outside_root_are_refused() {
        let root = Path::new("/srv/root");
        assert!(stays_within(root, &root.join("Documents/Notes")));
        assert!(!stays_within(root, &root.join("Documents/../../etc")));
        assert!(!stays_within(root, &root.join("/etc")));
        assert!(!stays_within(root, Path::new("/srv/other")));
    }

    #[test]
    fn content_label_with_path_syntax_stays_under_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("blob.zzq"), "x").unwrap();
        fs::write(root.join("other.zzq"), "y").unwrap();

        let mut records = vec![
            record(
                root.join("blob.zzq"),
                "application/octet-stream",
                &["x/../../../escaped"],
                90.0,
            ),
            record(root.join("other.zzq"), "application/octet-stream", &["/escaped"], 90.0),
        ];
        let summary = OrganizationEngine::new(70.0, "_STAGE").organize_files(&root, &mut records);

        assert_eq!(summary.failed, 0);
        for r in &records {
            assert!(r.target_path.as_ref().unwrap().starts_with(root.join("Documents")));
            assert!(r.is_organized());
        }
        assert!(root.join("Documents/X_.._.._.._Escaped/blob.zzq").exists());
        assert!(root.join("Documents/_Escaped/other.zzq").exists());
        assert!(!temp.path().join("Escaped").exists());
        assert!(!Path::new("/escaped").exists());
    }

    #[test]
    fn title_cases_labels() {
        assert_eq!(title_case("quarterly report"), "Quarterly Report");
        assert_eq!(title_case("o'neil-smith"), "O'Neil-Smith");
        assert_eq!(title_case("uncategorized"), "Uncategorized");
    }
}

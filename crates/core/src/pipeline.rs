use crate::cleanup;
use crate::config::{
    AppConfig, ConflictPolicy, LabelingConfig, RankerKind, LEARNING_STATE_FILENAME,
};
use crate::learning::LearningStore;
use crate::models::FileRecord;
use crate::organizer::OrganizationEngine;
use crate::processor::{Backends, MetadataProcessor};
use crate::scanner::{self, ScanOptions};
use anyhow::{bail, Context};
use providers::TfIdfRanker;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

/// Everything one run needs, resolved up front.
pub struct PipelineContext {
    pub root: PathBuf,
    pub confidence_threshold: f64,
    pub staging_dir_name: String,
    pub learning_state_path: PathBuf,
    pub exclude_globs: Vec<String>,
    pub conflict: ConflictPolicy,
    pub copy_then_delete: bool,
    pub suggestion_limit: usize,
    pub span: tracing::Span,
    pub learning: LearningStore,
}

impl PipelineContext {
    /// Fails when `root` is missing, unreadable or not a directory.
    pub fn from_config(root: &Path, config: &AppConfig) -> anyhow::Result<Self> {
        let root = fs::canonicalize(root)
            .with_context(|| format!("root directory {} is not accessible", root.display()))?;
        if !root.is_dir() {
            bail!("root {} is not a directory", root.display());
        }
        fs::read_dir(&root)
            .with_context(|| format!("root directory {} is not readable", root.display()))?;

        let learning_state_path = match &config.learning.state_path {
            Some(p) => PathBuf::from(p),
            None => root.join(LEARNING_STATE_FILENAME),
        };
        let learning = LearningStore::load(&learning_state_path);
        if learning.is_empty() {
            info!(
                "No learned labels yet; starting fresh at {}",
                learning_state_path.display()
            );
        }
        let span = info_span!("run", root = %root.display());

        Ok(Self {
            confidence_threshold: config.organize.confidence_threshold,
            staging_dir_name: config.organize.staging_dir_name.clone(),
            exclude_globs: config.scan.exclude.clone(),
            conflict: config.organize.conflict,
            copy_then_delete: config.organize.copy_then_delete,
            suggestion_limit: config.learning.suggestion_limit,
            learning_state_path,
            span,
            learning,
            root,
        })
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(&self.staging_dir_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub removed_dirs: usize,
    pub discovered: usize,
    pub processed: usize,
    pub errored: usize,
    pub moved: usize,
    pub staged: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub learned: usize,
}

pub fn build_backends(config: &LabelingConfig) -> Backends {
    match config.ranker {
        RankerKind::Frequency => Backends::default(),
        RankerKind::Tfidf => Backends::default().with_ranker(TfIdfRanker),
    }
}

/// One full pass: cleanup, scan, process, organize, learn, persist.
pub fn run(ctx: &mut PipelineContext, backends: &Backends) -> anyhow::Result<PipelineSummary> {
    let span = ctx.span.clone();
    let _enter = span.enter();
    let mut summary = PipelineSummary::default();

    info!("Starting cleanup phase...");
    summary.removed_dirs = cleanup::remove_empty_directories(&ctx.root);

    info!("Starting scan phase...");
    let options = ScanOptions {
        exclude_dirs: vec![ctx.staging_dir()],
        exclude_globs: ctx.exclude_globs.clone(),
        state_file_name: ctx.learning_state_path.file_name().map(|n| n.to_os_string()),
    };
    let mut records: Vec<FileRecord> = {
        let processor = MetadataProcessor::new(backends)
            .with_learning(&ctx.learning, ctx.suggestion_limit);
        scanner::scan(&ctx.root, &options)?
            .map(|path| {
                debug!("processing {}", path.display());
                processor.process_file(&path)
            })
            .collect()
    };
    summary.discovered = records.len();
    summary.errored = records.iter().filter(|r| !r.errors.is_empty()).count();
    summary.processed = summary.discovered - summary.errored;
    info!(
        "Processing complete. {} files, {} with errors.",
        summary.discovered, summary.errored
    );

    info!("Starting organize phase...");
    let engine = OrganizationEngine::new(ctx.confidence_threshold, ctx.staging_dir_name.clone())
        .with_conflict_policy(ctx.conflict)
        .with_copy_then_delete(ctx.copy_then_delete);
    let organized = engine.organize_files(&ctx.root, &mut records);
    summary.moved = organized.moved;
    summary.staged = organized.staged;
    summary.unchanged = organized.unchanged;
    summary.failed = organized.failed;

    for record in records.iter().filter(|r| r.is_organized()) {
        if record.primary_label().is_some() {
            ctx.learning.update(record);
            summary.learned += 1;
        }
    }
    ctx.learning.save(&ctx.learning_state_path).with_context(|| {
        format!(
            "saving learning state to {}",
            ctx.learning_state_path.display()
        )
    })?;

    info!(
        "Run complete. moved={} staged={} unchanged={} failed={} learned={}",
        summary.moved, summary.staged, summary.unchanged, summary.failed, summary.learned
    );
    Ok(summary)
}

use crate::logging;
use anyhow::{Context, Result};
use selfsort_core::config::AppConfig;
use selfsort_core::pipeline::{self, PipelineContext, PipelineSummary};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Runs one full pass over `root` with its own report log.
pub fn run(root: &Path, cfg: &AppConfig) -> Result<PipelineSummary> {
    let root = root
        .canonicalize()
        .with_context(|| format!("root directory {} is not accessible", root.display()))?;
    let log_dir = cfg
        .logging
        .dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.clone());
    let log = logging::start_run_log(&log_dir, &cfg.logging.level)?;
    info!("Report log: {}", log.path.display());

    let result = PipelineContext::from_config(&root, cfg).and_then(|mut ctx| {
        let backends = pipeline::build_backends(&cfg.labeling);
        pipeline::run(&mut ctx, &backends)
    });
    if let Err(e) = &result {
        error!("RUN FAILED: {:#}", e);
    }
    result
}

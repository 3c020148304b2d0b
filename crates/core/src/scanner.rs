//! Walks the root and yields candidate files, skipping excluded trees and our own artifacts.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

pub const REPORT_PREFIX: &str = "cleanup_report_";
pub const REPORT_SUFFIX: &str = ".log";

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Directories whose whole subtree is skipped.
    pub exclude_dirs: Vec<PathBuf>,
    /// Glob patterns matched against full paths.
    pub exclude_globs: Vec<String>,
    /// File name of the learning-state file.
    pub state_file_name: Option<OsString>,
}

/// Lazily enumerates regular files under `root`. Order follows the filesystem.
pub fn scan(
    root: &Path,
    options: &ScanOptions,
) -> anyhow::Result<impl Iterator<Item = PathBuf>> {
    let excluded: Vec<PathBuf> = options
        .exclude_dirs
        .iter()
        .map(|d| fs::canonicalize(d).unwrap_or_else(|_| d.clone()))
        .collect();
    let exclude_set = build_globset(&options.exclude_globs)?;
    let file_globs = exclude_set.clone();
    let state_file = options.state_file_name.clone();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |e| should_descend(e, &excluded, &exclude_set));

    Ok(walker.filter_map(move |entry| {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("SCAN ERROR: {}", e);
                return None;
            }
        };
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.into_path();
        if file_globs.is_match(&path) || is_artifact(&path, state_file.as_deref()) {
            return None;
        }
        Some(path)
    }))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn should_descend(entry: &DirEntry, excluded: &[PathBuf], globs: &GlobSet) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return true;
    }
    let path = entry.path();
    if globs.is_match(path) {
        return false;
    }
    if excluded.iter().any(|ex| ex == path) {
        return false;
    }
    match fs::canonicalize(path) {
        Ok(resolved) => !excluded.contains(&resolved),
        Err(_) => true,
    }
}

fn is_artifact(path: &Path, state_file: Option<&std::ffi::OsStr>) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    if state_file.is_some_and(|s| s == name) {
        return true;
    }
    name.to_str()
        .map(|n| n.starts_with(REPORT_PREFIX) && n.ends_with(REPORT_SUFFIX))
        .unwrap_or(false)
}

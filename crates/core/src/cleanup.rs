use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Removes empty directories below `root` in one deepest-first sweep.
///
/// A parent emptied by removing its children is still caught because it is
/// evaluated after them. `root` itself is never removed.
pub fn remove_empty_directories(root: &Path) -> usize {
    let mut directories: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_dir() => Some(e.into_path()),
            Ok(_) => None,
            Err(e) => {
                warn!("CLEANUP WALK ERROR: {}", e);
                None
            }
        })
        .collect();
    directories.sort_by_key(|d| Reverse(d.components().count()));

    let mut removed = 0;
    for dir in directories {
        match is_empty(&dir).and_then(|empty| {
            if empty {
                fs::remove_dir(&dir).map(|_| true)
            } else {
                Ok(false)
            }
        }) {
            Ok(true) => {
                removed += 1;
                info!("REMOVED EMPTY DIR: {}", dir.display());
            }
            Ok(false) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("PERMISSION ERROR removing {}: {}", dir.display(), e);
            }
            Err(e) => warn!("CLEANUP ERROR {}: {}", dir.display(), e),
        }
    }
    removed
}

fn is_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

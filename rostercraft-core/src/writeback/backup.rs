//! Timestamped roster backups

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Stem and extension of the roster file
fn name_parts(target: &Path) -> (String, String) {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (stem, ext)
}

/// `<stem>_<timestamp>.<ext>`
pub fn backup_file_name(target: &Path, at: NaiveDateTime) -> String {
    let (stem, ext) = name_parts(target);
    format!("{}_{}.{}", stem, at.format(STAMP_FORMAT), ext)
}

/// Whether `file_name` is a backup of `target`
fn is_backup_of(file_name: &str, stem: &str, ext: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(stem).and_then(|r| r.strip_prefix('_')) else {
        return false;
    };
    let Some(stamp) = rest.strip_suffix(ext).and_then(|r| r.strip_suffix('.')) else {
        return false;
    };
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).is_ok()
}

/// Copy the committed roster into `<dir>/<backup_dir>` and prune old copies
pub fn create_backup(target: &Path, backup_dir: &Path, keep: usize) -> Result<PathBuf> {
    let dir = target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(backup_dir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create backup directory {}", dir.display()))?;

    let destination = dir.join(backup_file_name(target, Local::now().naive_local()));
    fs::copy(target, &destination)
        .with_context(|| format!("Failed to copy backup to {}", destination.display()))?;
    log::debug!("backup written to {}", destination.display());

    let removed = prune_backups(target, &dir, keep)?;
    if !removed.is_empty() {
        log::debug!("pruned {} old backups", removed.len());
    }

    Ok(destination)
}

/// Keep the newest `keep` backups of `target` in `dir`; returns removed paths
pub fn prune_backups(target: &Path, dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let (stem, ext) = name_parts(target);
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| is_backup_of(n, &stem, &ext))
        })
        .collect();

    // Timestamps sort lexicographically; newest first
    backups.sort();
    backups.reverse();

    let stale = backups.split_off(keep.min(backups.len()));
    for path in &stale {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove old backup {}", path.display()))?;
    }
    Ok(stale)
}

//! Cooperative file locking next to the roster

use crate::error::WriteBackError;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Suffix of the sentinel file our writers create
pub const SENTINEL_SUFFIX: &str = ".writelock";

fn file_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sibling(target: &Path, name: String) -> PathBuf {
    target.with_file_name(name)
}

/// Lock files the authoring applications leave next to an open workbook
pub fn author_lock_markers(target: &Path) -> Vec<PathBuf> {
    let name = file_name(target);
    let mut markers = vec![sibling(target, format!("~${}", name))];

    // Long names get their first two characters replaced
    let shortened: String = name.chars().skip(2).collect();
    if !shortened.is_empty() {
        markers.push(sibling(target, format!("~${}", shortened)));
    }

    markers.push(sibling(target, format!(".~lock.{}#", name)));
    markers
}

/// First authoring-application marker present next to `target`
pub fn find_author_lock(target: &Path) -> Option<PathBuf> {
    author_lock_markers(target)
        .into_iter()
        .find(|marker| marker.exists())
}

pub fn sentinel_path(target: &Path) -> PathBuf {
    sibling(target, format!("{}{}", file_name(target), SENTINEL_SUFFIX))
}

/// Exclusive ownership of the sentinel file; removed when dropped
#[derive(Debug)]
pub struct LockToken {
    path: PathBuf,
    created: DateTime<Local>,
    /// Exact content we wrote, to recognise our own sentinel on release
    stamp: String,
    released: bool,
}

impl LockToken {
    /// Create the sentinel for `target`.
    ///
    /// An existing sentinel younger than `stale_after` aborts the attempt. An
    /// older one is treated as abandoned, claimed, and acquisition is retried
    /// once.
    pub fn acquire(target: &Path, stale_after: Duration) -> Result<Self, WriteBackError> {
        let path = sentinel_path(target);

        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let created = Local::now();
                    let stamp = format!("{}\npid {}\n", created.to_rfc3339(), std::process::id());
                    if let Err(e) = file.write_all(stamp.as_bytes()) {
                        drop(file);
                        remove_if_present(&path)?;
                        return Err(e.into());
                    }
                    log::debug!("acquired {}", path.display());
                    return Ok(Self {
                        path,
                        created,
                        stamp,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let age = sentinel_age(&path);
                    if age < stale_after || attempt > 0 {
                        return Err(WriteBackError::LockedByConcurrentWriter {
                            sentinel: path,
                            age,
                        });
                    }
                    log::warn!(
                        "removing abandoned lock {} ({}s old)",
                        path.display(),
                        age.as_secs()
                    );
                    claim_stale(&path, stale_after)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(WriteBackError::LockedByConcurrentWriter {
            sentinel: path,
            age: Duration::ZERO,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created(&self) -> DateTime<Local> {
        self.created
    }

    /// Remove the sentinel now, reporting failures
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        remove_if_owned(&self.path, &self.stamp)
    }
}

impl Drop for LockToken {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_if_owned(&self.path, &self.stamp) {
            log::warn!("failed to remove {}: {}", self.path.display(), e);
        }
    }
}

/// Move a stale sentinel out of the way.
///
/// The rename succeeds for exactly one writer. When the claimed file turns
/// out to be fresh, another writer replaced the stale sentinel in between;
/// it is put back and the attempt aborts.
fn claim_stale(path: &Path, stale_after: Duration) -> Result<(), WriteBackError> {
    let nanos = Local::now().timestamp_nanos_opt().unwrap_or_default();
    let claimed = sibling(
        path,
        format!("{}.stale.{}.{}", file_name(path), std::process::id(), nanos),
    );

    match fs::rename(path, &claimed) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    let age = sentinel_age(&claimed);
    if age < stale_after {
        log::debug!("{} was replaced meanwhile, restoring it", path.display());
        match fs::hard_link(&claimed, path) {
            Ok(()) => remove_if_present(&claimed)?,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => remove_if_present(&claimed)?,
            Err(_) => fs::rename(&claimed, path)?,
        }
        return Err(WriteBackError::LockedByConcurrentWriter {
            sentinel: path.to_path_buf(),
            age,
        });
    }

    remove_if_present(&claimed)?;
    Ok(())
}

/// Remove the sentinel only while it still carries `stamp`
fn remove_if_owned(path: &Path, stamp: &str) -> io::Result<()> {
    match fs::read_to_string(path) {
        Ok(content) if content == stamp => remove_if_present(path),
        Ok(_) => {
            log::warn!("{} belongs to another writer, leaving it", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Age of a sentinel from the timestamp it carries, else from its mtime.
///
/// An unreadable sentinel counts as brand new.
pub fn sentinel_age(path: &Path) -> Duration {
    let stamped = fs::read_to_string(path).ok().and_then(|content| {
        let first = content.lines().next()?.trim().to_string();
        DateTime::parse_from_rfc3339(&first).ok()
    });

    if let Some(created) = stamped {
        let elapsed = Local::now().signed_duration_since(created);
        return elapsed.to_std().unwrap_or(Duration::ZERO);
    }

    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .unwrap_or(Duration::ZERO)
}

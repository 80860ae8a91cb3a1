//! Guarded write-back of one roster row.
//!
//! Several people edit the same workbook on a shared drive, so every attempt
//! walks Idle → Locked → Writing → Committed, or ends in Aborted:
//!
//! 1. refuse when the authoring application holds the file open,
//! 2. make sure the file opens read-write,
//! 3. create the `<name>.writelock` sentinel exclusively,
//! 4. rewrite the duty, start and end cells into a sibling temp file,
//! 5. check the authoring application again, then rename over the target,
//! 6. copy the result into the backup directory and prune old copies.
//!
//! Our sentinel and temp file are removed on every exit path. A foreign
//! sentinel that caused an abort stays where it is.

pub mod backup;
pub mod lock;
pub mod xlsx_writer;

use crate::config::WriteBackConfig;
use crate::error::WriteBackError;
use crate::reader::{self, xml_parser};
use crate::roster::{ClockTime, ColumnMap};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub use lock::LockToken;
pub use xlsx_writer::CellEdit;

/// What happens to one editable cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Change<T> {
    /// Leave the cell exactly as it is
    #[default]
    Keep,
    /// Drop the value, keep the style
    Clear,
    Set(T),
}

impl<T> Change<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Change::Keep)
    }
}

impl<T> From<Option<T>> for Change<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Change::Set(v),
            None => Change::Clear,
        }
    }
}

/// Changes to the editable cells of a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowEdit {
    pub duty: Change<String>,
    pub start: Change<ClockTime>,
    pub end: Change<ClockTime>,
}

impl RowEdit {
    /// True when no cell would change
    pub fn is_empty(&self) -> bool {
        self.duty.is_keep() && self.start.is_keep() && self.end.is_keep()
    }

    /// Column edits for the changed columns present in `columns`
    pub fn cell_edits(&self, columns: &ColumnMap) -> BTreeMap<u32, CellEdit> {
        let mut edits = BTreeMap::new();

        match &self.duty {
            Change::Keep => {}
            Change::Clear => {
                edits.insert(columns.duty, CellEdit::Clear);
            }
            Change::Set(duty) => {
                let duty = duty.trim();
                let edit = if duty.is_empty() {
                    CellEdit::Clear
                } else {
                    CellEdit::Text(duty.to_uppercase())
                };
                edits.insert(columns.duty, edit);
            }
        }

        for (col, change) in [(columns.start, &self.start), (columns.end, &self.end)] {
            let Some(col) = col else { continue };
            match change {
                Change::Keep => {}
                Change::Clear => {
                    edits.insert(col, CellEdit::Clear);
                }
                Change::Set(time) => {
                    edits.insert(col, CellEdit::Time(*time));
                }
            }
        }

        edits
    }
}

/// Where a write-back attempt is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Locked,
    Writing,
    Committed,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Locked => "locked",
            Phase::Writing => "writing",
            Phase::Committed => "committed",
            Phase::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Successful write-back
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub target: PathBuf,
    /// `None` when the backup copy failed after the commit
    pub backup: Option<PathBuf>,
}

fn enter(target: &Path, phase: Phase) {
    log::debug!("{}: {}", target.display(), phase);
}

/// Rewrite the duty, start and end cells of `row` in `target`
pub fn write_back(
    target: &Path,
    columns: &ColumnMap,
    row: u32,
    edit: &RowEdit,
    config: &WriteBackConfig,
) -> Result<WriteOutcome, WriteBackError> {
    enter(target, Phase::Idle);
    let result = write_back_inner(target, columns, row, edit, config, || {});
    if let Err(e) = &result {
        enter(target, Phase::Aborted);
        log::debug!("{}: {}", target.display(), e);
    }
    result
}

fn write_back_inner(
    target: &Path,
    columns: &ColumnMap,
    row: u32,
    edit: &RowEdit,
    config: &WriteBackConfig,
    before_commit: impl FnOnce(),
) -> Result<WriteOutcome, WriteBackError> {
    if !reader::is_xlsx(target) {
        return Err(
            anyhow::anyhow!("Only .xlsx/.xlsm rosters can be written: {}", target.display())
                .into(),
        );
    }
    if row <= columns.header_row {
        return Err(anyhow::anyhow!(
            "Row {} is not below the header row {}",
            row + 1,
            columns.header_row + 1
        )
        .into());
    }

    check_author_lock(target)?;
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(target)
        .map_err(|source| WriteBackError::Unreadable {
            path: target.to_path_buf(),
            source,
        })?;

    let token = LockToken::acquire(target, config.stale_after())?;
    enter(target, Phase::Locked);

    let sheet_path = active_sheet_path(target)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(dir)
        .context("Failed to create temporary file")?;
    enter(target, Phase::Writing);

    let edits = edit.cell_edits(columns);
    xlsx_writer::rewrite_cells(target, temp.as_file_mut(), &sheet_path, row, &edits)
        .with_context(|| format!("Failed to rewrite row {}", row + 1))?;
    temp.as_file().sync_all()?;

    before_commit();
    check_author_lock(target)?;
    temp.persist(target)
        .map_err(|e| anyhow::anyhow!("Failed to replace {}: {}", target.display(), e.error))?;
    enter(target, Phase::Committed);
    log::info!("{}: row {} written", target.display(), row + 1);

    let backup = match backup::create_backup(target, &config.backup_dir, config.max_backups) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("{}: backup failed: {:#}", target.display(), e);
            None
        }
    };

    if let Err(e) = token.release() {
        log::warn!("failed to remove lock for {}: {}", target.display(), e);
    }

    Ok(WriteOutcome {
        target: target.to_path_buf(),
        backup,
    })
}

fn check_author_lock(target: &Path) -> Result<(), WriteBackError> {
    match lock::find_author_lock(target) {
        Some(marker) => Err(WriteBackError::LockedByAuthor { marker }),
        None => Ok(()),
    }
}

fn active_sheet_path(target: &Path) -> anyhow::Result<String> {
    let file = File::open(target)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Not a valid XLSX package: {}", target.display()))?;
    xml_parser::active_sheet_path(&mut archive)
}

//! Error types for the read and write paths

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal problems that abort a whole parse
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Header row not found within the first {scanned} rows (required: NAME, DIENST)")]
    HeaderNotFound { scanned: u32 },

    #[error("Failed to read roster: {0:#}")]
    Read(#[from] anyhow::Error),
}

/// Distinguishable reasons a write-back attempt was refused or failed
#[derive(Error, Debug)]
pub enum WriteBackError {
    #[error("The file is open in the spreadsheet application (lock file {})", .marker.display())]
    LockedByAuthor { marker: PathBuf },

    #[error("Another writer is active (lock file {} is {}s old)", .sentinel.display(), .age.as_secs())]
    LockedByConcurrentWriter { sentinel: PathBuf, age: Duration },

    #[error("Cannot open {} for reading and writing: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write-back failed: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<std::io::Error> for WriteBackError {
    fn from(e: std::io::Error) -> Self {
        WriteBackError::Unexpected(e.into())
    }
}

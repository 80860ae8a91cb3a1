//! rostercraft-core: duty roster spreadsheet parsing and guarded write-back
//!
//! The read path turns the active sheet of a roster workbook into grouped
//! per-person duty records. The write path updates one row of the same file
//! while other people may be editing it on a shared drive.

pub mod config;
pub mod error;
pub mod reader;
pub mod roster;
pub mod writeback;

use std::path::Path;

pub use config::{RosterConfig, WriteBackConfig};
pub use error::{RosterError, WriteBackError};
pub use roster::{
    ClockTime, ColumnMap, DutyGroup, ExclusionSource, NoExclusions, ParseMode, ParseResult,
    PersonDutyRecord, ShiftBucket, SickInference,
};
pub use writeback::{Change, RowEdit, WriteOutcome};

/// Main roster interface
pub struct RosterParser {
    config: RosterConfig,
}

impl RosterParser {
    /// Create a parser with default configuration
    pub fn new() -> Self {
        Self::with_config(RosterConfig::default())
    }

    /// Create a parser with custom configuration
    pub fn with_config(config: RosterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Parse a roster file; failures are reported inside the result
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult {
        roster::parse_file(path, self.config.parse_mode(), &self.config)
    }

    /// Parse with an explicit mode, overriding the configuration
    pub fn parse_file_with_mode<P: AsRef<Path>>(&self, path: P, mode: ParseMode) -> ParseResult {
        roster::parse_file(path, mode, &self.config)
    }

    /// Write new duty, start and end values into one row of a roster
    pub fn write_row<P: AsRef<Path>>(
        &self,
        path: P,
        columns: &ColumnMap,
        row: u32,
        edit: &RowEdit,
    ) -> Result<WriteOutcome, WriteBackError> {
        writeback::write_back(path.as_ref(), columns, row, edit, &self.config.write_back)
    }
}

impl Default for RosterParser {
    fn default() -> Self {
        Self::new()
    }
}

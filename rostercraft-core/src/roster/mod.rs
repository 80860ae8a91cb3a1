//! Roster parsing pipeline: header, sections, rows, exclusions, display names

use crate::error::RosterError;
use crate::reader::{self, Sheet};
use std::collections::BTreeSet;
use std::path::Path;

pub mod classify;
pub mod colors;
pub mod date;
pub mod dedup;
pub mod exclusion;
pub mod header;
pub mod model;
pub mod section;
pub mod sick;
pub mod vocab;

pub use exclusion::{ExclusionSource, NoExclusions};
pub use model::{
    ClockTime, ColumnMap, DutyGroup, ParseResult, PersonDutyRecord, ShiftBucket, SickInference,
};

use section::{RowKind, SectionTracker};

/// Which rows make it into the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Silent codes and excluded persons are dropped
    #[default]
    Export,
    /// Every parsable row is kept
    DisplayAll,
}

/// State carried through one parse call
#[derive(Debug)]
pub struct ParseContext {
    pub mode: ParseMode,
    pub unrecognized: BTreeSet<String>,
}

impl ParseContext {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            unrecognized: BTreeSet::new(),
        }
    }
}

/// Parse an already loaded sheet
pub fn parse_sheet(
    sheet: &Sheet,
    mode: ParseMode,
    exclusions: &dyn ExclusionSource,
    source: &Path,
) -> Result<ParseResult, RosterError> {
    let columns = header::locate_columns(sheet)?;
    let mut ctx = ParseContext::new(mode);
    let mut tracker = SectionTracker::new();

    let mut caregivers = Vec::new();
    let mut dispatchers = Vec::new();
    let mut sick = Vec::new();

    let last_row = sheet.max_row().unwrap_or(columns.header_row);
    for row in columns.header_row + 1..=last_row {
        match tracker.observe(sheet, row, &columns) {
            RowKind::Section(_) | RowKind::Blank => continue,
            RowKind::Data => {}
        }

        let Some(record) =
            classify::classify_row(sheet, row, &columns, tracker.current(), &mut ctx)
        else {
            continue;
        };

        if record.is_sick {
            sick.push(record);
        } else if record.is_dispatcher {
            dispatchers.push(record);
        } else {
            caregivers.push(record);
        }
    }

    if mode == ParseMode::Export {
        let excluded = exclusion::excluded_set(exclusions);
        for group in [&mut caregivers, &mut dispatchers, &mut sick] {
            exclusion::apply_exclusions(group, &excluded);
        }
    }

    dedup::assign_display_names(&mut [&mut caregivers, &mut dispatchers, &mut sick]);

    let date = date::locate_date(sheet, columns.header_row);

    log::debug!(
        "parsed {}: {} caregivers, {} dispatchers, {} sick, {} unrecognized codes",
        source.display(),
        caregivers.len(),
        dispatchers.len(),
        sick.len(),
        ctx.unrecognized.len()
    );

    Ok(ParseResult {
        success: true,
        caregivers,
        dispatchers,
        sick,
        error: None,
        unrecognized_duties: ctx.unrecognized,
        date,
        columns: Some(columns),
        source: source.to_path_buf(),
    })
}

/// Read and parse a roster file.
///
/// Never fails: read and structural errors become a failed `ParseResult`.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    mode: ParseMode,
    exclusions: &dyn ExclusionSource,
) -> ParseResult {
    let path = path.as_ref();
    let outcome = reader::read_active_sheet(path)
        .map_err(RosterError::from)
        .and_then(|sheet| parse_sheet(&sheet, mode, exclusions, path));

    match outcome {
        Ok(result) => result,
        Err(e) => {
            log::warn!("{}: {}", path.display(), e);
            ParseResult::failure(path, e.to_string())
        }
    }
}

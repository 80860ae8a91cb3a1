//! Header row and column discovery

use super::model::ColumnMap;
use super::vocab::{DUTY_LABEL, END_LABEL, NAME_LABEL, START_LABEL};
use crate::error::RosterError;
use crate::reader::Sheet;

/// Number of leading rows searched for the header
pub const HEADER_SCAN_ROWS: u32 = 20;

/// Find the first row carrying both a NAME and a DIENST label.
///
/// BEGINN and ENDE are picked up from the same row when present.
pub fn locate_columns(sheet: &Sheet) -> Result<ColumnMap, RosterError> {
    for row in 0..HEADER_SCAN_ROWS {
        let mut name = None;
        let mut duty = None;
        let mut start = None;
        let mut end = None;

        for cell in sheet.row_cells(row) {
            let Some(text) = cell.value.as_text() else {
                continue;
            };
            match text.trim().to_uppercase().as_str() {
                NAME_LABEL => name = Some(cell.col),
                DUTY_LABEL => duty = Some(cell.col),
                START_LABEL => start = Some(cell.col),
                END_LABEL => end = Some(cell.col),
                _ => {}
            }
        }

        if let (Some(name), Some(duty)) = (name, duty) {
            log::debug!("header found in row {}", row + 1);
            return Ok(ColumnMap {
                name,
                duty,
                start,
                end,
                header_row: row,
            });
        }
    }

    Err(RosterError::HeaderNotFound {
        scanned: HEADER_SCAN_ROWS,
    })
}

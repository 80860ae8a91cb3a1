//! Roster date discovery in the rows above the header

use crate::reader::{CellValue, Sheet};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static GERMAN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").expect("valid date pattern"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid date pattern"));

const DATE_FORMAT: &str = "%d.%m.%Y";

/// First date found in rows `0..=header_row`, formatted `DD.MM.YYYY`
pub fn locate_date(sheet: &Sheet, header_row: u32) -> Option<String> {
    (0..=header_row)
        .flat_map(|row| sheet.row_cells(row))
        .find_map(|cell| cell_date(&cell.value))
        .map(|date| date.format(DATE_FORMAT).to_string())
}

fn cell_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(text) => text_date(text),
        _ => None,
    }
}

/// Find a valid calendar date in free text
fn text_date(text: &str) -> Option<NaiveDate> {
    let german = GERMAN_DATE.captures_iter(text).find_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    german.or_else(|| {
        ISO_DATE.captures_iter(text).find_map(|caps| {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    })
}

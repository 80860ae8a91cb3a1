//! Roster sheet reader using calamine for values and XML for fills

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

pub mod workbook;
pub mod xml_parser;

pub use workbook::{Cell, CellValue, Sheet};

/// Whether the path names an OOXML workbook we can read styles from and write to
pub fn is_xlsx<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("xlsx") || s.eq_ignore_ascii_case("xlsm"))
        .unwrap_or(false)
}

/// Read the active worksheet of a roster workbook.
///
/// Values come from calamine for every format it supports. For XLSX files the
/// solid fill colour of each styled cell is attached as well.
pub fn read_active_sheet<P: AsRef<Path>>(path: P) -> Result<Sheet> {
    let path = path.as_ref();
    let mut excel: Sheets<_> = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let mut archive = if is_xlsx(path) {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        Some(ZipArchive::new(BufReader::new(file)).context("Failed to open zip archive")?)
    } else {
        None
    };

    let sheet_names = excel.sheet_names();
    let active = match archive.as_mut() {
        Some(archive) => xml_parser::active_sheet_index(archive).unwrap_or(0),
        None => 0,
    };
    let sheet_name = sheet_names
        .get(active)
        .or_else(|| sheet_names.first())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Workbook has no sheets: {}", path.display()))?;

    let range = excel
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;
    let mut sheet = parse_sheet(&sheet_name, &range);

    if let Some(archive) = archive.as_mut() {
        let sheet_path = xml_parser::get_xlsx_sheet_path(archive, &sheet_name)?;
        let fills = xml_parser::parse_fill_styles(archive).unwrap_or_default();
        if !fills.is_empty() {
            let cell_styles =
                xml_parser::extract_cell_style_indices_from_xlsx(archive, &sheet_path)?;
            for ((row, col), style_idx) in cell_styles {
                if let Some(Some(argb)) = fills.get(style_idx) {
                    sheet.set_fill(row, col, argb.clone());
                }
            }
        }
        sheet.sheet_path = Some(sheet_path);
    }

    log::debug!(
        "read sheet '{}' from {} ({} cells)",
        sheet.name,
        path.display(),
        sheet.cells.len()
    );

    Ok(sheet)
}

fn parse_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let Some((start_row, start_col)) = range.start() else {
        return sheet;
    };

    for (rel_row, rel_col, data) in range.used_cells() {
        let value = parse_cell_value(data);
        if !matches!(value, CellValue::Empty) {
            sheet.set(start_row + rel_row as u32, start_col + rel_col as u32, value);
        }
    }

    sheet
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(_) => CellValue::Empty,
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => serial_to_value(dt.as_f64()).unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => parse_iso_duration(s).unwrap_or_else(|| CellValue::Text(s.clone())),
    }
}

/// First serial after the last representable spreadsheet date
const MAX_SERIAL: f64 = 2_958_466.0;

/// Convert a spreadsheet serial number into a temporal value.
///
/// Serials below one day carry only a time of day. Serials past 9999-12-31
/// have no date and yield `None`.
pub fn serial_to_value(serial: f64) -> Option<CellValue> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;

    if days == 0 {
        let seconds = seconds.min(86_399) as u32;
        return NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).map(CellValue::Time);
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let value = epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)?;
    Some(CellValue::DateTime(value))
}

fn parse_iso_datetime(s: &str) -> Option<CellValue> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::DateTime(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(CellValue::DateTime)
}

/// Parse ODS durations such as `PT06H30M00S` into a time of day
fn parse_iso_duration(s: &str) -> Option<CellValue> {
    let rest = s.strip_prefix("PT")?;
    let (hours, rest) = rest.split_once('H')?;
    let (minutes, rest) = rest.split_once('M')?;
    let seconds = rest.strip_suffix('S').unwrap_or("0");
    let hours = hours.parse::<u32>().ok()?;
    let minutes = minutes.parse::<u32>().ok()?;
    let seconds = seconds.parse::<f64>().ok()? as u32;
    NaiveTime::from_hms_opt(hours % 24, minutes, seconds).map(CellValue::Time)
}

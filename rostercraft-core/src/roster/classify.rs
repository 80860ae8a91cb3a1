//! Per-row classification

use super::colors::{duty_fill_tag, is_driver_yellow, is_zebra_gray};
use super::model::{ClockTime, ColumnMap, DutyGroup, PersonDutyRecord, ShiftBucket};
use super::sick::{infer_sick_duty, to_dispatcher_code};
use super::vocab::{is_caregiver_code, is_dispatcher_code, is_sick_marker, is_silent_code};
use super::{ParseContext, ParseMode};
use crate::reader::{CellValue, Sheet};
use regex::Regex;
use std::sync::LazyLock;

static NAME_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\säöüÄÖÜß\-,]").expect("valid name pattern"));
static COLON_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})").expect("valid time pattern"));
static COMPACT_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})").expect("valid time pattern"));

/// Given name and surname split out of a name cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub given: String,
    pub surname: String,
}

/// Parse `"Surname, Given"` or `"Given Surname"`
pub fn parse_name(text: &str) -> Option<ParsedName> {
    let cleaned = NAME_NOISE.replace_all(text.trim(), "");
    let cleaned = cleaned.trim();

    let parts: Vec<&str> = cleaned.split(',').collect();
    if parts.len() == 2 {
        let surname = parts[0].trim();
        let given = parts[1].split_whitespace().next()?;
        if surname.is_empty() {
            return None;
        }
        return Some(ParsedName {
            given: given.to_string(),
            surname: surname.to_string(),
        });
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() >= 2 {
        return Some(ParsedName {
            given: tokens[0].to_string(),
            surname: tokens[1..].join(" "),
        });
    }

    None
}

/// Outcome of reading the duty cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DutyClass {
    /// No duty text
    Blank,
    /// Code that hides the row unless everything is displayed
    Silent(String),
    Sick,
    Caregiver(String),
    Dispatcher(String),
    /// Code outside every vocabulary; still recorded
    Unrecognized(String),
}

impl DutyClass {
    /// Category recorded on the person, if any
    pub fn category(&self) -> Option<&str> {
        match self {
            DutyClass::Silent(c)
            | DutyClass::Caregiver(c)
            | DutyClass::Dispatcher(c)
            | DutyClass::Unrecognized(c) => Some(c),
            DutyClass::Blank | DutyClass::Sick => None,
        }
    }
}

/// Classify the duty cell against the fixed vocabularies
pub fn classify_duty(value: &CellValue) -> DutyClass {
    let Some(text) = value.display_text() else {
        return DutyClass::Blank;
    };
    let code = text.trim().to_uppercase();

    if code.is_empty() {
        DutyClass::Blank
    } else if is_silent_code(&code) {
        DutyClass::Silent(code)
    } else if is_sick_marker(&code) {
        DutyClass::Sick
    } else if is_caregiver_code(&code) {
        DutyClass::Caregiver(code)
    } else if is_dispatcher_code(&code) {
        DutyClass::Dispatcher(code)
    } else {
        DutyClass::Unrecognized(code)
    }
}

/// Parse `H:MM`, `HH:MM` or compact `HHMM` text
pub fn parse_time_text(text: &str) -> Option<ClockTime> {
    let text = text.trim();
    let caps = COLON_TIME
        .captures(text)
        .or_else(|| COMPACT_TIME.captures(text))?;
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = caps[2].parse::<u32>().ok()?;
    ClockTime::new(hour, minute)
}

/// Read a start or end time from a cell
pub fn parse_time(value: &CellValue, round_to_hour: bool) -> Option<ClockTime> {
    use chrono::Timelike;

    let time = match value {
        CellValue::DateTime(dt) => ClockTime::new(dt.hour(), dt.minute()),
        CellValue::Time(t) => ClockTime::new(t.hour(), t.minute()),
        CellValue::Text(s) => parse_time_text(s),
        _ => None,
    }?;

    Some(if round_to_hour {
        time.to_full_hour()
    } else {
        time
    })
}

/// Turn one data row into a record.
///
/// Returns `None` for rows that are skipped without a diagnostic: missing or
/// unparsable names, and silent duty codes outside display-all mode.
pub fn classify_row(
    sheet: &Sheet,
    row: u32,
    columns: &ColumnMap,
    group: DutyGroup,
    ctx: &mut ParseContext,
) -> Option<PersonDutyRecord> {
    let name_text = sheet.value(row, columns.name).as_text()?;
    let name = parse_name(name_text)?;
    let full_name = format!("{} {}", name.given, name.surname);

    let duty = classify_duty(sheet.value(row, columns.duty));
    match &duty {
        DutyClass::Silent(code) if ctx.mode == ParseMode::Export => {
            log::trace!("row {}: silent duty {}", row + 1, code);
            return None;
        }
        DutyClass::Unrecognized(code) => {
            ctx.unrecognized.insert(code.clone());
        }
        _ => {}
    }

    let is_sick = duty == DutyClass::Sick;
    let category = duty.category().map(str::to_string);
    let round_times = matches!(duty, DutyClass::Dispatcher(_));

    let read_time = |col: Option<u32>| col.and_then(|c| parse_time(sheet.value(row, c), round_times));
    let mut start = read_time(columns.start);
    let mut end = read_time(columns.end);
    let shift = start.and_then(|s| ShiftBucket::from_start_hour(s.hour));

    let mut is_special_driver = false;
    let mut zebra_row = false;
    let mut duty_fill = None;
    for col in [columns.name, columns.duty] {
        let Some(fill) = sheet.get_cell(row, col).and_then(|c| c.fill.as_deref()) else {
            continue;
        };
        is_special_driver |= is_driver_yellow(fill);
        zebra_row |= is_zebra_gray(fill);
        if col == columns.duty {
            duty_fill = duty_fill_tag(fill);
        }
    }

    let mut is_dispatcher = matches!(duty, DutyClass::Dispatcher(_));
    let mut sick = is_sick.then(|| infer_sick_duty(start, end, &full_name));

    if group == DutyGroup::Dispatcher {
        is_dispatcher = true;
        if let Some(inference) = sick.as_mut() {
            inference.is_dispatcher = true;
            inference.duty_code = to_dispatcher_code(&inference.duty_code);
            start = start.map(ClockTime::to_full_hour);
            end = end.map(ClockTime::to_full_hour);
        }
    }

    Some(PersonDutyRecord {
        display_name: name.surname.clone(),
        given_name: name.given,
        surname: name.surname,
        full_name,
        duty: category,
        start,
        end,
        shift,
        is_dispatcher,
        is_sick,
        sick,
        is_special_driver,
        zebra_row,
        duty_fill,
        row,
    })
}

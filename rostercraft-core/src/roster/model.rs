//! Roster data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Column positions discovered in the header row (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub name: u32,
    pub duty: u32,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub header_row: u32,
}

/// Duty group a row belongs to by section context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyGroup {
    #[default]
    Caregiver,
    Dispatcher,
}

/// Shift classification derived from the start hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftBucket {
    /// Start 05:00 to 11:59
    DayMorning,
    /// Start 12:00 to 18:59
    DayAfternoon,
    /// Start 19:00 to 23:59
    NightEarly,
    /// Start 00:00 to 04:59
    NightLate,
}

impl ShiftBucket {
    /// Classify a start hour
    pub fn from_start_hour(hour: u32) -> Option<Self> {
        match hour {
            5..=11 => Some(ShiftBucket::DayMorning),
            12..=18 => Some(ShiftBucket::DayAfternoon),
            19..=23 => Some(ShiftBucket::NightEarly),
            0..=4 => Some(ShiftBucket::NightLate),
            _ => None,
        }
    }

    pub fn is_day(self) -> bool {
        matches!(self, ShiftBucket::DayMorning | ShiftBucket::DayAfternoon)
    }
}

impl fmt::Display for ShiftBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShiftBucket::DayMorning => "day (morning)",
            ShiftBucket::DayAfternoon => "day (afternoon)",
            ShiftBucket::NightEarly => "night (early)",
            ShiftBucket::NightLate => "night (late)",
        };
        f.write_str(label)
    }
}

/// Wall-clock time of day with minute precision, rendered as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Truncate the minute component
    pub fn to_full_hour(self) -> Self {
        Self {
            hour: self.hour,
            minute: 0,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::classify::parse_time_text(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", text)))
    }
}

/// What sick-leave inference derived for a person marked sick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SickInference {
    pub duty_code: String,
    pub is_dispatcher: bool,
    pub bucket: Option<ShiftBucket>,
    /// False when no exact shift template matched
    pub confirmed: bool,
}

/// One row's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDutyRecord {
    pub given_name: String,
    pub surname: String,
    pub full_name: String,
    pub display_name: String,
    pub duty: Option<String>,
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub shift: Option<ShiftBucket>,
    pub is_dispatcher: bool,
    pub is_sick: bool,
    /// Present only for sick records
    pub sick: Option<SickInference>,
    pub is_special_driver: bool,
    pub zebra_row: bool,
    /// Raw ARGB fill of the duty cell when not default
    pub duty_fill: Option<String>,
    /// 0-based row in the source sheet
    pub row: u32,
}

impl PersonDutyRecord {
    /// Lower-cased, trimmed full name used for exclusion lookups
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.full_name)
    }
}

/// Normalize a full name for comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Result of one parse invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub caregivers: Vec<PersonDutyRecord>,
    pub dispatchers: Vec<PersonDutyRecord>,
    pub sick: Vec<PersonDutyRecord>,
    pub error: Option<String>,
    pub unrecognized_duties: BTreeSet<String>,
    pub date: Option<String>,
    pub columns: Option<ColumnMap>,
    pub source: PathBuf,
}

impl ParseResult {
    /// Structural failure with no partial results
    pub fn failure(source: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            source: source.into(),
            ..Default::default()
        }
    }

    /// All records in group order
    pub fn records(&self) -> impl Iterator<Item = &PersonDutyRecord> {
        self.caregivers
            .iter()
            .chain(self.dispatchers.iter())
            .chain(self.sick.iter())
    }

    /// Find the record parsed from a given sheet row
    pub fn record_at_row(&self, row: u32) -> Option<&PersonDutyRecord> {
        self.records().find(|r| r.row == row)
    }

    pub fn len(&self) -> usize {
        self.caregivers.len() + self.dispatchers.len() + self.sick.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Fixed duty-code vocabularies

/// Duty codes worked by caregivers
pub const CAREGIVER_CODES: &[&str] = &["T", "T10", "N", "N10", "NF", "FB1", "FB2", "FB"];

/// Duty codes worked by dispatchers
pub const DISPATCHER_CODES: &[&str] = &["DT", "DT3", "DN", "DN3", "D"];

/// Markers for sick leave
pub const SICK_MARKERS: &[&str] = &["KRANK", "K"];

/// Codes dropped without a diagnostic unless every row is displayed
pub const SILENT_CODES: &[&str] = &["R", "B1", "B2"];

/// Full names (normalized) that never appear in exports
pub const EXCLUDED_FULL_NAMES: &[&str] = &["lars peters"];

/// Full names (normalized) whose sick entries always count as dispatcher duty
pub const DISPATCHER_FULL_NAMES: &[&str] = &["jens hartmann"];

/// Header labels, compared upper-cased
pub const NAME_LABEL: &str = "NAME";
pub const DUTY_LABEL: &str = "DIENST";
pub const START_LABEL: &str = "BEGINN";
pub const END_LABEL: &str = "ENDE";

/// Section header prefixes, compared lower-cased
pub const DISPATCHER_SECTION_PREFIXES: &[&str] = &["dispo"];
pub const CAREGIVER_SECTION_PREFIXES: &[&str] = &["stamm", "betreuer"];

pub fn is_caregiver_code(code: &str) -> bool {
    CAREGIVER_CODES.contains(&code)
}

pub fn is_dispatcher_code(code: &str) -> bool {
    DISPATCHER_CODES.contains(&code)
}

pub fn is_sick_marker(code: &str) -> bool {
    SICK_MARKERS.contains(&code)
}

pub fn is_silent_code(code: &str) -> bool {
    SILENT_CODES.contains(&code)
}

//! Duty inference for personnel marked sick

use super::model::{ClockTime, ShiftBucket, SickInference, normalize_name};
use super::vocab::DISPATCHER_FULL_NAMES;

/// A known shift with exact start and end times
#[derive(Debug, Clone, Copy)]
pub struct ShiftTemplate {
    pub start: (u32, u32),
    pub end: (u32, u32),
    pub code: &'static str,
    pub dispatcher: bool,
    pub bucket: ShiftBucket,
}

pub const SHIFT_TEMPLATES: [ShiftTemplate; 7] = [
    ShiftTemplate {
        start: (6, 0),
        end: (18, 0),
        code: "T",
        dispatcher: false,
        bucket: ShiftBucket::DayMorning,
    },
    ShiftTemplate {
        start: (9, 0),
        end: (19, 0),
        code: "T10",
        dispatcher: false,
        bucket: ShiftBucket::DayMorning,
    },
    ShiftTemplate {
        start: (10, 0),
        end: (18, 0),
        code: "DT3",
        dispatcher: true,
        bucket: ShiftBucket::DayMorning,
    },
    ShiftTemplate {
        start: (7, 0),
        end: (19, 0),
        code: "DT",
        dispatcher: true,
        bucket: ShiftBucket::DayMorning,
    },
    ShiftTemplate {
        start: (18, 0),
        end: (6, 0),
        code: "N",
        dispatcher: false,
        bucket: ShiftBucket::NightEarly,
    },
    ShiftTemplate {
        start: (21, 0),
        end: (7, 0),
        code: "N10",
        dispatcher: false,
        bucket: ShiftBucket::NightEarly,
    },
    ShiftTemplate {
        start: (19, 0),
        end: (7, 0),
        code: "DN",
        dispatcher: true,
        bucket: ShiftBucket::NightEarly,
    },
];

/// Codes emitted when no template matched
pub const UNCONFIRMED_DAY: &str = "T?";
pub const UNCONFIRMED_NIGHT: &str = "N?";
pub const UNCONFIRMED_OTHER: &str = "X?";
pub const UNCONFIRMED_DISPATCHER: &str = "D?";

fn find_template(start: ClockTime, end: ClockTime) -> Option<&'static ShiftTemplate> {
    SHIFT_TEMPLATES.iter().find(|t| {
        (start.hour, start.minute) == t.start && (end.hour, end.minute) == t.end
    })
}

/// Derive duty code, dispatcher flag and shift bucket for a sick person.
///
/// Only exact start/end matches count as confirmed. Anything else falls back
/// to the start-hour bucket with an unconfirmed code.
pub fn infer_sick_duty(
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    full_name: &str,
) -> SickInference {
    let template = match (start, end) {
        (Some(start), Some(end)) => find_template(start, end),
        _ => None,
    };

    let mut inference = match template {
        Some(t) => SickInference {
            duty_code: t.code.to_string(),
            is_dispatcher: t.dispatcher,
            bucket: Some(t.bucket),
            confirmed: true,
        },
        None => {
            let bucket = start.and_then(|s| ShiftBucket::from_start_hour(s.hour));
            let code = match bucket {
                Some(b) if b.is_day() => UNCONFIRMED_DAY,
                Some(_) => UNCONFIRMED_NIGHT,
                None => UNCONFIRMED_OTHER,
            };
            SickInference {
                duty_code: code.to_string(),
                is_dispatcher: false,
                bucket,
                confirmed: false,
            }
        }
    };

    let normalized = normalize_name(full_name);
    if DISPATCHER_FULL_NAMES.contains(&normalized.as_str()) {
        inference.is_dispatcher = true;
        inference.duty_code = to_dispatcher_code(&inference.duty_code);
    }

    inference
}

/// Rewrite a caregiver-style code to its dispatcher counterpart
pub fn to_dispatcher_code(code: &str) -> String {
    match code.chars().next() {
        Some('D') => code.to_string(),
        Some('T') | Some('N') => format!("D{}", code),
        _ => UNCONFIRMED_DISPATCHER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> Option<ClockTime> {
        ClockTime::new(hour, minute)
    }

    #[test]
    fn test_every_template_matches_exactly() {
        for template in &SHIFT_TEMPLATES {
            let inference = infer_sick_duty(
                t(template.start.0, template.start.1),
                t(template.end.0, template.end.1),
                "Anna Meier",
            );
            assert_eq!(inference.duty_code, template.code);
            assert_eq!(inference.is_dispatcher, template.dispatcher);
            assert!(inference.confirmed);
        }
    }

    #[test]
    fn test_caregiver_day_template() {
        let inference = infer_sick_duty(t(6, 0), t(18, 0), "Anna Meier");
        assert_eq!(inference.duty_code, "T");
        assert!(!inference.is_dispatcher);
        assert_eq!(inference.bucket, Some(ShiftBucket::DayMorning));
    }

    #[test]
    fn test_near_miss_is_unconfirmed() {
        let inference = infer_sick_duty(t(6, 5), t(18, 0), "Anna Meier");
        assert_eq!(inference.duty_code, UNCONFIRMED_DAY);
        assert!(!inference.confirmed);

        let inference = infer_sick_duty(t(22, 0), t(6, 0), "Anna Meier");
        assert_eq!(inference.duty_code, UNCONFIRMED_NIGHT);
        assert_eq!(inference.bucket, Some(ShiftBucket::NightEarly));

        let inference = infer_sick_duty(None, t(6, 0), "Anna Meier");
        assert_eq!(inference.duty_code, UNCONFIRMED_OTHER);
        assert_eq!(inference.bucket, None);
    }

    #[test]
    fn test_name_override_forces_dispatcher() {
        let inference = infer_sick_duty(t(6, 0), t(18, 0), "  Jens Hartmann ");
        assert!(inference.is_dispatcher);
        assert_eq!(inference.duty_code, "DT");

        let inference = infer_sick_duty(None, None, "Jens Hartmann");
        assert!(inference.is_dispatcher);
        assert_eq!(inference.duty_code, UNCONFIRMED_DISPATCHER);
    }

    #[test]
    fn test_excluded_name_is_not_an_override() {
        let inference = infer_sick_duty(t(6, 0), t(18, 0), "Lars Peters");
        assert!(!inference.is_dispatcher);
        assert_eq!(inference.duty_code, "T");
    }

    #[test]
    fn test_dispatcher_code_mapping() {
        assert_eq!(to_dispatcher_code("T"), "DT");
        assert_eq!(to_dispatcher_code("N10"), "DN10");
        assert_eq!(to_dispatcher_code("T?"), "DT?");
        assert_eq!(to_dispatcher_code("DN"), "DN");
        assert_eq!(to_dispatcher_code("X?"), UNCONFIRMED_DISPATCHER);
        assert_eq!(to_dispatcher_code(""), UNCONFIRMED_DISPATCHER);
    }
}

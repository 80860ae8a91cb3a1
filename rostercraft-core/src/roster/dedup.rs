//! Display names for persons sharing a surname

use super::model::PersonDutyRecord;
use std::collections::HashMap;

/// Rewrite display names across all groups.
///
/// Surnames that occur more than once or contain a hyphen get a two-letter
/// given-name suffix; everybody else is shown by surname alone.
pub fn assign_display_names(groups: &mut [&mut Vec<PersonDutyRecord>]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in groups.iter().flat_map(|g| g.iter()) {
        *counts.entry(record.surname.clone()).or_default() += 1;
    }

    for record in groups.iter_mut().flat_map(|g| g.iter_mut()) {
        let shared = counts.get(&record.surname).copied().unwrap_or(0) > 1;
        record.display_name = if shared || record.surname.contains('-') {
            format!("{} {}", record.surname, abbreviate(&record.given_name))
        } else {
            record.surname.clone()
        };
    }
}

/// First letter upper-case, second lower-case
fn abbreviate(given: &str) -> String {
    let mut chars = given.chars();
    let mut short: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
    if let Some(second) = chars.next() {
        short.extend(second.to_lowercase());
    }
    short
}

//! Export-mode exclusion of persons by name

use super::model::{PersonDutyRecord, normalize_name};
use super::vocab::EXCLUDED_FULL_NAMES;
use std::collections::HashSet;

/// Supplies additional names to leave out of exported rosters
pub trait ExclusionSource {
    /// Normalized full names to exclude
    fn excluded_names(&self) -> anyhow::Result<HashSet<String>>;
}

/// A source that excludes nobody
pub struct NoExclusions;

impl ExclusionSource for NoExclusions {
    fn excluded_names(&self) -> anyhow::Result<HashSet<String>> {
        Ok(HashSet::new())
    }
}

/// Fixed names plus whatever the source provides.
///
/// A failing source contributes nothing.
pub fn excluded_set(source: &dyn ExclusionSource) -> HashSet<String> {
    let mut names: HashSet<String> = EXCLUDED_FULL_NAMES
        .iter()
        .map(|name| normalize_name(name))
        .collect();

    match source.excluded_names() {
        Ok(extra) => names.extend(extra.iter().map(|name| normalize_name(name))),
        Err(e) => log::warn!("exclusion settings unavailable, using fixed list: {:#}", e),
    }

    names
}

/// Drop records whose normalized full name is excluded
pub fn apply_exclusions(records: &mut Vec<PersonDutyRecord>, excluded: &HashSet<String>) {
    records.retain(|record| {
        let keep = !excluded.contains(&record.normalized_name());
        if !keep {
            log::debug!("row {}: excluded {}", record.row + 1, record.full_name);
        }
        keep
    });
}

//! Section tracking across roster rows

use super::model::{ColumnMap, DutyGroup};
use super::vocab::{CAREGIVER_SECTION_PREFIXES, DISPATCHER_SECTION_PREFIXES};
use crate::reader::Sheet;

/// What a row turned out to be for the section state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A section header that switched (or confirmed) the group
    Section(DutyGroup),
    /// A row without a name that carries no section keyword
    Blank,
    /// A row with something in the name column
    Data,
}

/// Current group while walking the sheet top to bottom
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionTracker {
    current: DutyGroup,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DutyGroup {
        self.current
    }

    /// Feed one row; section headers update the current group
    pub fn observe(&mut self, sheet: &Sheet, row: u32, columns: &ColumnMap) -> RowKind {
        if !sheet.value(row, columns.name).is_blank() {
            return RowKind::Data;
        }

        match section_keyword(sheet, row) {
            Some(group) => {
                if group != self.current {
                    log::debug!("row {}: switching section to {:?}", row + 1, group);
                }
                self.current = group;
                RowKind::Section(group)
            }
            None => RowKind::Blank,
        }
    }
}

/// Look for the first section keyword among the text cells of a row
fn section_keyword(sheet: &Sheet, row: u32) -> Option<DutyGroup> {
    sheet
        .row_cells(row)
        .into_iter()
        .filter_map(|cell| cell.value.as_text())
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty())
        .find_map(|text| {
            if DISPATCHER_SECTION_PREFIXES
                .iter()
                .any(|prefix| text.starts_with(prefix))
            {
                Some(DutyGroup::Dispatcher)
            } else if CAREGIVER_SECTION_PREFIXES
                .iter()
                .any(|prefix| text.starts_with(prefix))
            {
                Some(DutyGroup::Caregiver)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CellValue;

    const COLUMNS: ColumnMap = ColumnMap {
        name: 0,
        duty: 1,
        start: Some(2),
        end: Some(3),
        header_row: 0,
    };

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_section_switching() {
        let mut sheet = Sheet::new("Plan");
        sheet.set(1, 0, text("Meier, Anna"));
        sheet.set(2, 1, text("Dispo / Leitstelle"));
        sheet.set(3, 0, text("Schulz, Tom"));
        sheet.set(4, 2, text("Stammpersonal"));
        sheet.set(5, 0, text("   "));
        sheet.set(5, 3, text("Bemerkung"));

        let mut tracker = SectionTracker::new();
        assert_eq!(tracker.current(), DutyGroup::Caregiver);
        assert_eq!(tracker.observe(&sheet, 1, &COLUMNS), RowKind::Data);
        assert_eq!(
            tracker.observe(&sheet, 2, &COLUMNS),
            RowKind::Section(DutyGroup::Dispatcher)
        );
        assert_eq!(tracker.observe(&sheet, 3, &COLUMNS), RowKind::Data);
        assert_eq!(tracker.current(), DutyGroup::Dispatcher);
        assert_eq!(
            tracker.observe(&sheet, 4, &COLUMNS),
            RowKind::Section(DutyGroup::Caregiver)
        );
        assert_eq!(tracker.observe(&sheet, 5, &COLUMNS), RowKind::Blank);
        assert_eq!(tracker.current(), DutyGroup::Caregiver);
    }

    #[test]
    fn test_keyword_in_name_column_is_data() {
        let mut sheet = Sheet::new("Plan");
        sheet.set(1, 0, text("Dispo"));

        let mut tracker = SectionTracker::new();
        assert_eq!(tracker.observe(&sheet, 1, &COLUMNS), RowKind::Data);
        assert_eq!(tracker.current(), DutyGroup::Caregiver);
    }

    #[test]
    fn test_betreuer_prefix() {
        let mut sheet = Sheet::new("Plan");
        sheet.set(1, 1, text("DISPOSITION"));
        sheet.set(2, 1, text("Betreuer Terminal 1"));

        let mut tracker = SectionTracker::new();
        tracker.observe(&sheet, 1, &COLUMNS);
        assert_eq!(tracker.current(), DutyGroup::Dispatcher);
        tracker.observe(&sheet, 2, &COLUMNS);
        assert_eq!(tracker.current(), DutyGroup::Caregiver);
    }
}

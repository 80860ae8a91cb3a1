mod common;

use common::{
    PLAIN, TIME, Value, blank, create_mock_xlsx, create_xlsx_with_sheet, sample_roster, sheet_xml,
    text,
};
use rostercraft_core::writeback::{self, lock};
use rostercraft_core::{
    Change, ClockTime, ColumnMap, RosterParser, RowEdit, WriteBackConfig, WriteBackError,
};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use zip::ZipArchive;

fn sample_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    create_mock_xlsx(&path, &sample_roster()).unwrap();
    (dir, path)
}

fn columns(path: &Path) -> ColumnMap {
    RosterParser::new().parse_file(path).columns.unwrap()
}

fn night_shift() -> RowEdit {
    RowEdit {
        duty: Change::Set("N".into()),
        start: ClockTime::new(18, 0).into(),
        end: ClockTime::new(6, 0).into(),
    }
}

fn sample_columns() -> ColumnMap {
    ColumnMap {
        name: 0,
        duty: 1,
        start: Some(2),
        end: Some(3),
        header_row: 2,
    }
}

fn worksheet(path: &Path) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

/// Entries of the roster directory besides the roster itself
fn leftovers(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != "plan.xlsx" && n != "Backups")
        .collect();
    names.sort();
    names
}

fn backups(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir.join("Backups")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_write_back_updates_row() {
    let (dir, path) = sample_file();
    let cols = columns(&path);

    let outcome = writeback::write_back(
        &path,
        &cols,
        3,
        &night_shift(),
        &WriteBackConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.target, path);

    let result = RosterParser::new().parse_file(&path);
    assert!(result.success);
    let anna = result.record_at_row(3).unwrap();
    assert_eq!(anna.duty.as_deref(), Some("N"));
    assert_eq!(anna.start, ClockTime::new(18, 0));
    assert_eq!(anna.end, ClockTime::new(6, 0));

    // Neighbouring rows untouched
    let jonas = result.record_at_row(4).unwrap();
    assert_eq!(jonas.duty.as_deref(), Some("N"));
    assert_eq!(jonas.duty_fill.as_deref(), Some("FFC6EFCE"));
    assert_eq!(result.record_at_row(10).unwrap().duty.as_deref(), Some("DT"));

    assert_eq!(backups(dir.path()), vec![outcome.backup.unwrap()]);
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn test_calc_chain_dropped() {
    let (_dir, path) = sample_file();
    let cols = columns(&path);
    writeback::write_back(&path, &cols, 3, &night_shift(), &WriteBackConfig::default()).unwrap();

    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
    assert!(archive.by_name("xl/calcChain.xml").is_err());

    let mut types = String::new();
    archive
        .by_name("[Content_Types].xml")
        .unwrap()
        .read_to_string(&mut types)
        .unwrap();
    assert!(!types.contains("calcChain"));
    assert!(types.contains("/xl/styles.xml"));
}

#[test]
fn test_write_into_missing_cells() {
    let (_dir, path) = sample_file();
    let cols = columns(&path);

    // Schulz has no times and a silent code
    let edit = RowEdit {
        duty: Change::Set("t10".into()),
        start: ClockTime::new(9, 0).into(),
        end: ClockTime::new(19, 0).into(),
    };
    writeback::write_back(&path, &cols, 6, &edit, &WriteBackConfig::default()).unwrap();

    let tom = RosterParser::new().parse_file(&path);
    let tom = tom.record_at_row(6).unwrap();
    assert_eq!(tom.duty.as_deref(), Some("T10"));
    assert_eq!(tom.start, ClockTime::new(9, 0));
    assert_eq!(tom.end, ClockTime::new(19, 0));

    // A row that did not exist yet
    let edit = RowEdit {
        duty: Change::Set("N".into()),
        ..RowEdit::default()
    };
    writeback::write_back(&path, &cols, 20, &edit, &WriteBackConfig::default()).unwrap();
    let sheet = rostercraft_core::reader::read_active_sheet(&path).unwrap();
    assert_eq!(sheet.value(20, 1).as_text(), Some("N"));
}

#[test]
fn test_fresh_sentinel_blocks_and_stays() {
    let (dir, path) = sample_file();
    let cols = columns(&path);
    let before = fs::read(&path).unwrap();

    let sentinel = lock::sentinel_path(&path);
    fs::write(&sentinel, format!("{}\n", chrono::Local::now().to_rfc3339())).unwrap();

    let err = writeback::write_back(&path, &cols, 3, &night_shift(), &WriteBackConfig::default())
        .unwrap_err();
    assert!(matches!(err, WriteBackError::LockedByConcurrentWriter { .. }));

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(sentinel.exists());
    assert!(backups(dir.path()).is_empty());
    assert_eq!(leftovers(dir.path()), vec!["plan.xlsx.writelock".to_string()]);
}

#[test]
fn test_stale_sentinel_is_taken_over() {
    let (dir, path) = sample_file();
    let cols = columns(&path);

    let sentinel = lock::sentinel_path(&path);
    fs::write(&sentinel, "2020-01-01T08:00:00+01:00\n").unwrap();

    writeback::write_back(&path, &cols, 3, &night_shift(), &WriteBackConfig::default()).unwrap();
    assert!(!sentinel.exists());
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn test_author_lock_blocks() {
    let (dir, path) = sample_file();
    let cols = columns(&path);
    let before = fs::read(&path).unwrap();
    fs::write(dir.path().join("~$plan.xlsx"), b"owner").unwrap();

    let err = writeback::write_back(&path, &cols, 3, &night_shift(), &WriteBackConfig::default())
        .unwrap_err();
    match err {
        WriteBackError::LockedByAuthor { marker } => {
            assert_eq!(marker, dir.path().join("~$plan.xlsx"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(!lock::sentinel_path(&path).exists());
}

#[test]
fn test_failed_write_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    fs::write(&path, b"this is not a zip archive").unwrap();
    let cols = sample_columns();

    let err = writeback::write_back(&path, &cols, 3, &night_shift(), &WriteBackConfig::default())
        .unwrap_err();
    assert!(matches!(err, WriteBackError::Unexpected(_)));

    assert_eq!(fs::read(&path).unwrap(), b"this is not a zip archive");
    assert!(leftovers(dir.path()).is_empty());
    assert!(backups(dir.path()).is_empty());
}

#[test]
fn test_backups_are_pruned() {
    let (dir, path) = sample_file();
    let cols = columns(&path);
    let config = WriteBackConfig {
        max_backups: 2,
        ..WriteBackConfig::default()
    };

    for hour in [6, 7, 9] {
        let edit = RowEdit {
            duty: Change::Set("T".into()),
            start: ClockTime::new(hour, 0).into(),
            end: ClockTime::new(18, 0).into(),
        };
        writeback::write_back(&path, &cols, 3, &edit, &config).unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(backups(dir.path()).len(), 2);
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn test_time_into_empty_general_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    let mut rows = sample_roster();
    rows.push((14, vec![text(0, "Lang, Otto"), text(1, "T"), blank(2, PLAIN), blank(3, PLAIN)]));
    create_mock_xlsx(&path, &rows).unwrap();
    let cols = columns(&path);

    let edit = RowEdit {
        start: ClockTime::new(6, 0).into(),
        end: ClockTime::new(18, 0).into(),
        ..RowEdit::default()
    };
    writeback::write_back(&path, &cols, 14, &edit, &WriteBackConfig::default()).unwrap();

    let result = RosterParser::new().parse_file(&path);
    let otto = result.record_at_row(14).unwrap();
    assert_eq!(otto.start, ClockTime::new(6, 0));
    assert_eq!(otto.end, ClockTime::new(18, 0));
    assert_eq!(otto.duty.as_deref(), Some("T"));

    // Time-formatted cells still take a numeric value
    writeback::write_back(&path, &cols, 3, &edit, &WriteBackConfig::default()).unwrap();
    let xml = worksheet(&path);
    assert!(xml.contains(r#"<c r="C4" s="4"><v>0.25</v></c>"#));
    assert!(xml.contains(r#"<c r="C15" s="0" t="inlineStr"><is><t>06:00</t></is></c>"#));
}

#[test]
fn test_duty_only_edit_keeps_time_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    let mut rows = sample_roster();
    rows.push((
        14,
        vec![
            text(0, "Lang, Otto"),
            text(1, "T"),
            text(2, "ab 06:00"),
            (3, Value::Number(0.75), PLAIN),
        ],
    ));
    create_mock_xlsx(&path, &rows).unwrap();
    let cols = columns(&path);

    let start_cell = r#"<c r="C15" s="0" t="inlineStr"><is><t>ab 06:00</t></is></c>"#;
    let end_cell = r#"<c r="D15" s="0"><v>0.75</v></c>"#;
    let before = worksheet(&path);
    assert!(before.contains(start_cell) && before.contains(end_cell));

    let edit = RowEdit {
        duty: Change::Set("dt".into()),
        ..RowEdit::default()
    };
    writeback::write_back(&path, &cols, 14, &edit, &WriteBackConfig::default()).unwrap();

    let after = worksheet(&path);
    assert!(after.contains(r#"<c r="B15" s="0" t="inlineStr"><is><t>DT</t></is></c>"#));
    assert!(after.contains(start_cell));
    assert!(after.contains(end_cell));
}

#[test]
fn test_malformed_worksheet_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    let mut xml = sheet_xml(&sample_roster());
    // Cut the sheet off inside the duty cell of row 4
    let cut = xml.find(r#"<c r="B4""#).unwrap();
    xml.truncate(cut + r#"<c r="B4" s="0" t="inlineStr"><is><t>T</t>"#.len());
    create_xlsx_with_sheet(&path, &xml).unwrap();
    let before = fs::read(&path).unwrap();

    let err = writeback::write_back(
        &path,
        &sample_columns(),
        3,
        &night_shift(),
        &WriteBackConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, WriteBackError::Unexpected(_)));

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(leftovers(dir.path()).is_empty());
    assert!(backups(dir.path()).is_empty());
}

#[test]
fn test_huge_serial_in_time_cell_survives_edit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.xlsx");
    let mut rows = sample_roster();
    rows.push((14, vec![text(0, "Lang, Otto"), text(1, "T"), (2, Value::Number(1e12), TIME)]));
    create_mock_xlsx(&path, &rows).unwrap();
    let cols = columns(&path);

    let edit = RowEdit {
        start: ClockTime::new(7, 0).into(),
        ..RowEdit::default()
    };
    writeback::write_back(&path, &cols, 14, &edit, &WriteBackConfig::default()).unwrap();
    let result = RosterParser::new().parse_file(&path);
    assert_eq!(result.record_at_row(14).unwrap().start, ClockTime::new(7, 0));
}

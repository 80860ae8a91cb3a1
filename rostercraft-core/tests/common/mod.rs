#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Style indices into the mock `cellXfs`
pub const PLAIN: u32 = 0;
pub const YELLOW: u32 = 1;
pub const ZEBRA: u32 = 2;
pub const GREEN: u32 = 3;
pub const TIME: u32 = 4;

#[derive(Debug, Clone)]
pub enum Value {
    Text(&'static str),
    Number(f64),
    /// Styled cell without a value
    Blank,
}

/// One cell: 0-based column, value, style index
pub type MockCell = (u32, Value, u32);

/// One row: 0-based row index and its cells
pub type MockRow = (u32, Vec<MockCell>);

pub fn text(col: u32, s: &'static str) -> MockCell {
    (col, Value::Text(s), PLAIN)
}

pub fn styled(col: u32, s: &'static str, style: u32) -> MockCell {
    (col, Value::Text(s), style)
}

/// Empty cell that only carries a style
pub fn blank(col: u32, style: u32) -> MockCell {
    (col, Value::Blank, style)
}

/// Time-formatted numeric cell
pub fn time(col: u32, hour: u32, minute: u32) -> MockCell {
    (
        col,
        Value::Number(f64::from(hour * 60 + minute) / 1440.0),
        TIME,
    )
}

fn col_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn sheet_xml(rows: &[MockRow]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row, cells) in rows {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, value, style) in cells {
            let reference = format!("{}{}", col_letter(*col), row + 1);
            match value {
                Value::Text(s) => xml.push_str(&format!(
                    r#"<c r="{}" s="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference,
                    style,
                    escape(s)
                )),
                Value::Number(n) => xml.push_str(&format!(
                    r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                    reference, style, n
                )),
                Value::Blank => xml.push_str(&format!(r#"<c r="{}" s="{}"/>"#, reference, style)),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="5">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFF5F5F5"/><bgColor indexed="64"/></patternFill></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFC6EFCE"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="1"><border/></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="5">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
<xf numFmtId="0" fontId="0" fillId="3" borderId="0" xfId="0" applyFill="1"/>
<xf numFmtId="0" fontId="0" fillId="4" borderId="0" xfId="0" applyFill="1"/>
<xf numFmtId="20" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
</cellXfs>
</styleSheet>"#;

/// Write a single-sheet XLSX package with fills, time formats and a calc chain
pub fn create_mock_xlsx(path: &Path, rows: &[MockRow]) -> anyhow::Result<()> {
    create_xlsx_with_sheet(path, &sheet_xml(rows))
}

/// Same package as [`create_mock_xlsx`] around raw worksheet XML
pub fn create_xlsx_with_sheet(path: &Path, sheet: &str) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>
</Types>"#.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#.as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView activeTab="0"/></bookViews>
<sheets><sheet name="Plan" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#.as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/>
</Relationships>"#.as_bytes())?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES.as_bytes())?;

    zip.start_file("xl/calcChain.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="F4" i="1"/></calcChain>"#.as_bytes())?;

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet.as_bytes())?;

    zip.finish()?;
    Ok(())
}

/// A roster with both sections, sick entries, fills and mixed time formats
pub fn sample_roster() -> Vec<MockRow> {
    vec![
        (0, vec![text(0, "Dienstplan Flughafen 12.03.2024")]),
        (
            2,
            vec![
                text(0, "NAME"),
                text(1, "DIENST"),
                text(2, "BEGINN"),
                text(3, "ENDE"),
            ],
        ),
        (3, vec![text(0, "Meier, Anna"), text(1, "T"), time(2, 6, 0), time(3, 18, 0)]),
        (
            4,
            vec![
                text(0, "Meier, Jonas"),
                styled(1, "N", GREEN),
                text(2, "18:00"),
                text(3, "06:00"),
            ],
        ),
        (
            5,
            vec![
                styled(0, "Klein-Weber, Eva", YELLOW),
                text(1, "T10"),
                text(2, "0900"),
                text(3, "1900"),
            ],
        ),
        (6, vec![text(0, "Schulz, Tom"), text(1, "R")]),
        (
            7,
            vec![
                styled(0, "Wagner, Ida", ZEBRA),
                styled(1, "Schulung", ZEBRA),
                text(2, "08:00"),
                text(3, "16:00"),
            ],
        ),
        (8, vec![text(0, "Peters, Lars"), text(1, "K"), time(2, 6, 0), time(3, 18, 0)]),
        (9, vec![text(1, "Dispo")]),
        (
            10,
            vec![
                text(0, "Becker, Uwe"),
                text(1, "DT"),
                time(2, 7, 30),
                time(3, 19, 15),
            ],
        ),
        (
            11,
            vec![
                text(0, "Fischer, Jana"),
                text(1, "KRANK"),
                text(2, "06:00"),
                text(3, "18:00"),
            ],
        ),
        (12, vec![text(2, "Stammpersonal")]),
        (13, vec![text(0, "Wolf, Nina"), text(1, "FB"), text(2, "05:00")]),
    ]
}

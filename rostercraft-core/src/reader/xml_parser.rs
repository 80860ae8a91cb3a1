//! XML parsing utilities for extracting presentation metadata from XLSX files

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

/// Resolve sheet name to its XML path in the XLSX archive
pub fn get_xlsx_sheet_path(
    archive: &mut ZipArchive<impl Read + Seek>,
    sheet_name: &str,
) -> Result<String> {
    // 1. Get rId from xl/workbook.xml
    let mut rid = String::new();
    {
        let workbook_xml = archive
            .by_name("xl/workbook.xml")
            .context("Failed to find xl/workbook.xml")?;
        let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"sheet" {
                        let mut name = String::new();
                        let mut r_id = String::new();
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => name = attr.unescape_value()?.to_string(),
                                b"r:id" => r_id = attr.unescape_value()?.to_string(),
                                _ => {}
                            }
                        }
                        if name == sheet_name {
                            rid = r_id;
                            break;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    if rid.is_empty() {
        return Err(anyhow::anyhow!(
            "Sheet '{}' not found in workbook.xml",
            sheet_name
        ));
    }

    // 2. Resolve rId in xl/_rels/workbook.xml.rels
    let mut target = String::new();
    {
        let rels_xml = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .context("Failed to find xl/_rels/workbook.xml.rels")?;
        let mut reader = Reader::from_reader(BufReader::new(rels_xml));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"Relationship" {
                        let mut id = String::new();
                        let mut t = String::new();
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"Id" => id = attr.unescape_value()?.to_string(),
                                b"Target" => t = attr.unescape_value()?.to_string(),
                                _ => {}
                            }
                        }
                        if id == rid {
                            target = t;
                            break;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    if target.is_empty() {
        return Err(anyhow::anyhow!(
            "Relationship '{}' not found for sheet '{}'",
            rid,
            sheet_name
        ));
    }

    // Targets are relative to `xl/` unless absolute within the package
    if let Some(absolute) = target.strip_prefix('/') {
        Ok(absolute.to_string())
    } else if target.starts_with("xl/") {
        Ok(target)
    } else {
        Ok(format!("xl/{}", target))
    }
}

/// Index of the sheet selected when the workbook was last saved
pub fn active_sheet_index(archive: &mut ZipArchive<impl Read + Seek>) -> Result<usize> {
    let workbook_xml = match archive.by_name("xl/workbook.xml") {
        Ok(file) => file,
        Err(_) => return Ok(0),
    };
    let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"workbookView" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"activeTab" {
                        return Ok(attr.unescape_value()?.parse::<usize>().unwrap_or(0));
                    }
                }
                return Ok(0);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(0)
}

/// Sheet names in workbook order
pub fn sheet_names(archive: &mut ZipArchive<impl Read + Seek>) -> Result<Vec<String>> {
    let workbook_xml = archive
        .by_name("xl/workbook.xml")
        .context("Failed to find xl/workbook.xml")?;
    let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
    reader.config_mut().trim_text(true);

    let mut names = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                if let Some(name) = attr_value(&e, b"name")? {
                    names.push(name);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

/// Archive path of the worksheet selected when the workbook was last saved
pub fn active_sheet_path(archive: &mut ZipArchive<impl Read + Seek>) -> Result<String> {
    let names = sheet_names(archive)?;
    let active = active_sheet_index(archive)?;
    let name = names
        .get(active)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Workbook has no sheets"))?;
    get_xlsx_sheet_path(archive, &name)
}

/// Parse `xl/styles.xml` into the solid fill colour of every cell format.
///
/// The returned vector is indexed by the `s` attribute of worksheet cells
/// (the position inside `<cellXfs>`). Formats without a solid RGB fill map to
/// `None`.
pub fn parse_fill_styles(archive: &mut ZipArchive<impl Read + Seek>) -> Result<Vec<Option<String>>> {
    let styles_xml = match archive.by_name("xl/styles.xml") {
        Ok(file) => file,
        Err(_) => return Ok(Vec::new()),
    };

    let mut reader = Reader::from_reader(BufReader::new(styles_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut fills: Vec<Option<String>> = Vec::new();
    let mut xfs: Vec<Option<String>> = Vec::new();

    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut in_fill = false;
    let mut solid = false;
    let mut fg_rgb: Option<String> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"fills" => in_fills = !is_empty,
                b"fill" if in_fills => {
                    in_fill = true;
                    solid = false;
                    fg_rgb = None;
                    if is_empty {
                        fills.push(None);
                        in_fill = false;
                    }
                }
                b"patternFill" if in_fill => {
                    solid = attr_value(e, b"patternType")?
                        .map(|t| t == "solid")
                        .unwrap_or(false);
                }
                b"fgColor" if in_fill => {
                    fg_rgb = attr_value(e, b"rgb")?.map(|rgb| rgb.to_ascii_uppercase());
                }
                b"cellXfs" => in_cell_xfs = !is_empty,
                b"xf" if in_cell_xfs => {
                    let fill_id = attr_value(e, b"fillId")?
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    xfs.push(fills.get(fill_id).cloned().flatten());
                }
                _ => {}
            },
            Event::End(ref e) => match e.name().as_ref() {
                b"fills" => in_fills = false,
                b"fill" if in_fill => {
                    fills.push(if solid { fg_rgb.take() } else { None });
                    in_fill = false;
                }
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(xfs)
}

/// Built-in number formats that render dates or times
fn is_builtin_time_format(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Whether a custom format code renders a date or time part.
///
/// Quoted literals, escaped and padding characters and bracketed sections
/// such as colours are ignored; elapsed-time brackets like `[h]` count.
pub fn is_time_format_code(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                for quoted in chars.by_ref() {
                    if quoted == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let inner = inner.to_ascii_lowercase();
                if !inner.is_empty() && inner.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    return true;
                }
            }
            c if matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's' | 'd' | 'y') => return true,
            _ => {}
        }
    }
    false
}

/// Which cell formats display numbers as dates or times.
///
/// Indexed like [`parse_fill_styles`]; a package without styles yields an
/// empty vector.
pub fn parse_time_styles(archive: &mut ZipArchive<impl Read + Seek>) -> Result<Vec<bool>> {
    let styles_xml = match archive.by_name("xl/styles.xml") {
        Ok(file) => file,
        Err(_) => return Ok(Vec::new()),
    };

    let mut reader = Reader::from_reader(BufReader::new(styles_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut custom: HashMap<u32, bool> = HashMap::new();
    let mut xfs: Vec<bool> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(e, b"numFmtId")?.and_then(|v| v.parse::<u32>().ok());
                    if let Some(id) = id {
                        let code = attr_value(e, b"formatCode")?.unwrap_or_default();
                        custom.insert(id, is_time_format_code(&code));
                    }
                }
                b"cellXfs" => in_cell_xfs = !is_empty,
                b"xf" if in_cell_xfs => {
                    let id = attr_value(e, b"numFmtId")?
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(0);
                    let is_time = custom
                        .get(&id)
                        .copied()
                        .unwrap_or_else(|| is_builtin_time_format(id));
                    xfs.push(is_time);
                }
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(xfs)
}

/// Extract cell style indices from a worksheet
pub fn extract_cell_style_indices_from_xlsx(
    archive: &mut ZipArchive<impl Read + Seek>,
    sheet_path: &str,
) -> Result<HashMap<(u32, u32), usize>> {
    let mut cell_styles = HashMap::new();

    let sheet_xml = match archive.by_name(sheet_path) {
        Ok(file) => file,
        Err(_) => return Ok(cell_styles),
    };

    let mut reader = Reader::from_reader(BufReader::new(sheet_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current_row = 0u32;
    let mut next_row = 0u32;
    let mut current_col = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"row" => {
                    current_row = match attr_value(&e, b"r")? {
                        Some(r) => r.parse::<u32>()?.saturating_sub(1),
                        None => next_row,
                    };
                    next_row = current_row + 1;
                    current_col = 0;
                }
                b"c" => {
                    let (row, col) = match attr_value(&e, b"r")?.as_deref().and_then(parse_cell_ref)
                    {
                        Some((r, c)) => (r, c),
                        None => (current_row, current_col),
                    };
                    current_col = col + 1;

                    if let Some(s) = attr_value(&e, b"s")? {
                        if let Ok(style_index) = s.parse::<usize>() {
                            cell_styles.insert((row, col), style_index);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cell_styles)
}

/// Read a single attribute of an element as an owned string
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

/// Parse a cell reference like "A1" into (row, col) as 0-based indices
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        }
    }

    if row_str.is_empty() || col == 0 {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;

    // Convert to 0-based
    Some((row.saturating_sub(1), col - 1))
}

/// Convert 0-based coordinates to an Excel-style reference (e.g. "A1")
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Convert column number to letter (0 -> A, 1 -> B, 26 -> AA)
pub fn col_to_letter(mut col: u32) -> String {
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

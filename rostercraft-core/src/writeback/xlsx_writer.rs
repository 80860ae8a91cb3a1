//! Cell rewriting for XLSX packages

use crate::reader::xml_parser::{attr_value, cell_ref, parse_cell_ref, parse_time_styles};
use crate::roster::ClockTime;
use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Calculation chain part; stale after edits, rebuilt by the authoring application
const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// New content for one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEdit {
    Text(String),
    /// Written as a day fraction into numeric cells with a date or time
    /// format, as `HH:MM` text otherwise
    Time(ClockTime),
    /// Keep the cell and its style but drop the value
    Clear,
}

/// Copy `input` into `output`, replacing cells of one row of one worksheet.
///
/// `edits` maps 0-based column to new content. Every other part is copied
/// unchanged, except the calculation chain which is removed together with its
/// content type and relationship.
pub fn rewrite_cells<W: Write + Seek>(
    input: &Path,
    output: W,
    sheet_path: &str,
    row: u32,
    edits: &BTreeMap<u32, CellEdit>,
) -> Result<W> {
    let file = File::open(input)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Not a valid XLSX package: {}", input.display()))?;
    let time_styles = parse_time_styles(&mut archive)?;
    let mut zip_writer = ZipWriter::new(output);
    let mut sheet_found = false;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        let options = SimpleFileOptions::default().compression_method(file.compression());

        if name == CALC_CHAIN_PART {
            log::debug!("dropping {}", name);
            continue;
        }

        if file.is_dir() {
            zip_writer.add_directory(name.as_str(), options)?;
            continue;
        }

        let content = if name == sheet_path {
            sheet_found = true;
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            rewrite_sheet_row(&xml, row, edits, &time_styles)?.into_bytes()
        } else if name == "[Content_Types].xml" {
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            remove_calc_chain_content_type(&xml)?.into_bytes()
        } else if name == "xl/_rels/workbook.xml.rels" {
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            remove_calc_chain_relationship(&xml)?.into_bytes()
        } else {
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer)?;
            buffer
        };

        zip_writer.start_file(name.as_str(), options)?;
        zip_writer.write_all(&content)?;
    }

    if !sheet_found {
        anyhow::bail!("Worksheet '{}' not found in {}", sheet_path, input.display());
    }

    Ok(zip_writer.finish()?)
}

/// Stream a worksheet, replacing or inserting the edited cells of `row`.
///
/// Existing cells keep their style index. Missing cells are inserted in column
/// order and a missing row is inserted in row order. `time_styles` tells which
/// style indices display numbers as times.
pub fn rewrite_sheet_row(
    xml: &str,
    row: u32,
    edits: &BTreeMap<u32, CellEdit>,
    time_styles: &[bool],
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    let target = row + 1;
    let mut pending: BTreeMap<u32, &CellEdit> = edits.iter().map(|(c, e)| (*c, e)).collect();
    let mut in_target = false;
    let mut row_written = false;
    let mut skip_depth = 0usize;
    let mut current_row = 0u32;
    let mut next_col = 0u32;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        };

        // Content of a replaced cell
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => anyhow::bail!("Unexpected end of worksheet inside a cell"),
                _ => {}
            }
            buf.clear();
            continue;
        }

        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"row" => {
                        current_row = match attr_value(e, b"r")? {
                            Some(r) => r.parse::<u32>().context("Invalid row number")?,
                            None => current_row + 1,
                        };
                        next_col = 0;

                        if !row_written && current_row > target {
                            write_new_row(&mut writer, row, &mut pending)?;
                            row_written = true;
                        }

                        if current_row == target {
                            row_written = true;
                            writer.write_event(Event::Start(e.clone()))?;
                            if is_empty {
                                flush_cells(&mut writer, row, &mut pending, None)?;
                                writer.write_event(Event::End(BytesEnd::new("row")))?;
                            } else {
                                in_target = true;
                            }
                        } else {
                            writer.write_event(event.clone())?;
                        }
                    }
                    b"c" if in_target => {
                        let col = match attr_value(e, b"r")?.as_deref().and_then(parse_cell_ref) {
                            Some((_, col)) => col,
                            None => next_col,
                        };
                        next_col = col + 1;

                        flush_cells(&mut writer, row, &mut pending, Some(col))?;

                        match pending.remove(&col) {
                            Some(edit) => {
                                let style = attr_value(e, b"s")?;
                                let time_formatted = style
                                    .as_deref()
                                    .unwrap_or("0")
                                    .parse::<usize>()
                                    .ok()
                                    .and_then(|i| time_styles.get(i).copied())
                                    .unwrap_or(false);
                                let numeric = time_formatted
                                    && matches!(attr_value(e, b"t")?.as_deref(), None | Some("n"));
                                write_cell(&mut writer, row, col, style.as_deref(), edit, numeric)?;
                                if !is_empty {
                                    skip_depth = 1;
                                }
                            }
                            None => writer.write_event(event.clone())?,
                        }
                    }
                    b"sheetData" if is_empty && !row_written => {
                        writer.write_event(Event::Start(e.clone()))?;
                        write_new_row(&mut writer, row, &mut pending)?;
                        writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
                        row_written = true;
                    }
                    _ => writer.write_event(event.clone())?,
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"row" if in_target => {
                        flush_cells(&mut writer, row, &mut pending, None)?;
                        in_target = false;
                    }
                    b"sheetData" if !row_written => {
                        write_new_row(&mut writer, row, &mut pending)?;
                        row_written = true;
                    }
                    _ => {}
                }
                writer.write_event(event.clone())?;
            }
            Event::Eof => break,
            _ => writer.write_event(event.clone())?,
        }
        buf.clear();
    }

    if !row_written {
        anyhow::bail!("Worksheet has no sheetData element");
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

/// Write pending cells left of `before` (all when `None`) as new cells
fn flush_cells<W: Write>(
    writer: &mut Writer<W>,
    row: u32,
    pending: &mut BTreeMap<u32, &CellEdit>,
    before: Option<u32>,
) -> Result<()> {
    let cols: Vec<u32> = pending
        .keys()
        .copied()
        .filter(|col| before.is_none_or(|limit| *col < limit))
        .collect();

    for col in cols {
        if let Some(edit) = pending.remove(&col) {
            if *edit != CellEdit::Clear {
                write_cell(writer, row, col, None, edit, false)?;
            }
        }
    }
    Ok(())
}

fn write_new_row<W: Write>(
    writer: &mut Writer<W>,
    row: u32,
    pending: &mut BTreeMap<u32, &CellEdit>,
) -> Result<()> {
    let number = (row + 1).to_string();
    let mut start = BytesStart::new("row");
    start.push_attribute(("r", number.as_str()));
    writer.write_event(Event::Start(start))?;
    flush_cells(writer, row, pending, None)?;
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn write_cell<W: Write>(
    writer: &mut Writer<W>,
    row: u32,
    col: u32,
    style: Option<&str>,
    edit: &CellEdit,
    numeric: bool,
) -> Result<()> {
    let reference = cell_ref(row, col);
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    if let Some(style) = style {
        cell.push_attribute(("s", style));
    }

    match edit {
        CellEdit::Clear => {
            writer.write_event(Event::Empty(cell))?;
        }
        CellEdit::Time(time) if numeric => {
            let fraction = f64::from(time.hour * 60 + time.minute) / 1440.0;
            writer.write_event(Event::Start(cell))?;
            writer.write_event(Event::Start(BytesStart::new("v")))?;
            writer.write_event(Event::Text(BytesText::new(&fraction.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new("v")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellEdit::Time(time) => write_inline_string(writer, cell, &time.to_string())?,
        CellEdit::Text(text) => write_inline_string(writer, cell, text)?,
    }
    Ok(())
}

fn write_inline_string<W: Write>(
    writer: &mut Writer<W>,
    mut cell: BytesStart<'_>,
    text: &str,
) -> Result<()> {
    cell.push_attribute(("t", "inlineStr"));
    let mut t = BytesStart::new("t");
    if text.trim() != text {
        t.push_attribute(("xml:space", "preserve"));
    }

    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;
    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn remove_calc_chain_content_type(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) if e.name().as_ref() == b"Override" => {
                let part_name = attr_value(&e, b"PartName")?.unwrap_or_default();
                if part_name != format!("/{}", CALC_CHAIN_PART) {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(e) => writer.write_event(e)?,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn remove_calc_chain_relationship(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                let target = attr_value(&e, b"Target")?.unwrap_or_default();
                if !target.ends_with("calcChain.xml") {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(e) => writer.write_event(e)?,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

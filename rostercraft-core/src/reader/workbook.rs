//! Sheet data structures

use chrono::{NaiveDateTime, NaiveTime};
use std::collections::HashMap;

/// Represents the worksheet a roster is read from
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), Cell>,
    /// Archive path of the worksheet XML (XLSX only)
    pub sheet_path: Option<String>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get a cell at the given position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Get the value at the given position, `Empty` when the cell is missing
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.get_cell(row, col)
            .map(|c| &c.value)
            .unwrap_or(&CellValue::Empty)
    }

    /// Get the cells of a row ordered by column
    pub fn row_cells(&self, row: u32) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.cells.values().filter(|c| c.row == row).collect();
        cells.sort_by_key(|c| c.col);
        cells
    }

    /// Index of the last row holding any cell
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().map(|&(row, _)| row).max()
    }

    /// Insert or replace a cell
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells
            .entry((row, col))
            .and_modify(|c| c.value = value.clone())
            .or_insert(Cell {
                row,
                col,
                value,
                fill: None,
            });
    }

    /// Attach a fill colour to an existing or new cell
    pub fn set_fill(&mut self, row: u32, col: u32, argb: impl Into<String>) {
        let argb = argb.into();
        self.cells
            .entry((row, col))
            .and_modify(|c| c.fill = Some(argb.clone()))
            .or_insert(Cell {
                row,
                col,
                value: CellValue::Empty,
                fill: Some(argb),
            });
    }
}

/// Represents a single cell
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    /// Solid fill foreground colour as upper-case ARGB hex
    pub fill: Option<String>,
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl CellValue {
    /// Check if the cell is empty or holds only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Get the text if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value the way it would be typed into the cell
    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%d.%m.%Y %H:%M").to_string()),
            CellValue::Time(t) => Some(t.format("%H:%M").to_string()),
        }
    }
}

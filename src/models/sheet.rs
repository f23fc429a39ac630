use serde::{Deserialize, Serialize};
use std::fmt;

static EMPTY_CELL: Cell = Cell::Empty;

/// A single loosely typed cell value.
///
/// Values are compared by their display string, so `3` and `"3"` are the
/// same value. That is how number/string drift between sheets is tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse user input. Numbers are only recognised when they print back
    /// identically, so codes like `007` stay text.
    pub fn parse(input: &str) -> Self {
        if input.is_empty() {
            return Self::Empty;
        }
        if let Ok(n) = input.parse::<f64>() {
            if n.is_finite() && format_number(n) == input {
                return Self::Number(n);
            }
        }
        Self::Text(input.to_string())
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display-string equality
    pub fn same_as(&self, other: &Cell) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

/// Integers print without a fractional part, like a spreadsheet would
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Lowercased, trimmed header used for all column matching
pub fn header_key(header: &str) -> String {
    header.trim().to_lowercase()
}

/// A named table: one header row followed by data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn with_headers(name: &str, headers: &[&str]) -> Self {
        Self::new(name, headers.iter().map(|h| h.to_string()).collect())
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowercased headers, index-aligned with `headers`
    pub fn header_keys(&self) -> Vec<String> {
        self.headers.iter().map(|h| header_key(h)).collect()
    }

    /// Case-insensitive column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let key = header_key(name);
        self.headers.iter().position(|h| header_key(h) == key)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Display value of a named column, empty when the column is missing
    pub fn value(&self, row: usize, column: &str) -> String {
        self.column_index(column)
            .map(|c| self.cell(row, c).to_string())
            .unwrap_or_default()
    }

    /// Write a cell, padding the row if needed. Returns true if the value changed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) -> bool {
        let width = self.width().max(col + 1);
        let Some(cells) = self.rows.get_mut(row) else {
            return false;
        };
        if cells.len() < width {
            cells.resize(width, Cell::Empty);
        }
        if cells[col].same_as(&value) {
            return false;
        }
        cells[col] = value;
        true
    }

    /// First-column ID as a trimmed string
    pub fn row_id(&self, row: usize) -> String {
        self.cell(row, 0).to_string().trim().to_string()
    }

    /// Index of the first row whose ID matches
    pub fn find_row_by_id(&self, id: &str) -> Option<usize> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        (0..self.rows.len()).find(|&r| self.row_id(r) == id)
    }

    /// Append a row, padded or truncated to the header width
    pub fn push_row(&mut self, mut cells: Vec<Cell>) -> usize {
        cells.resize(self.width(), Cell::Empty);
        self.rows.push(cells);
        self.rows.len() - 1
    }

    /// Build a header-width row from (column, value) pairs; unknown columns are ignored
    pub fn record(&self, values: &[(&str, Cell)]) -> Vec<Cell> {
        let mut cells = vec![Cell::Empty; self.width()];
        for (column, value) in values {
            if let Some(idx) = self.column_index(column) {
                cells[idx] = value.clone();
            }
        }
        cells
    }

    /// Add a column if missing and return its index
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.resize(self.headers.len(), Cell::Empty);
        }
        self.headers.len() - 1
    }

    /// Pad every row to the header width
    pub fn normalize(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, Cell::Empty);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_codes_as_text() {
        assert_eq!(Cell::parse("42"), Cell::Number(42.0));
        assert_eq!(Cell::parse("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::parse("007"), Cell::Text("007".into()));
        assert_eq!(Cell::parse("1e3"), Cell::Text("1e3".into()));
        assert_eq!(Cell::parse(""), Cell::Empty);
    }

    #[test]
    fn test_number_and_text_compare_equal() {
        assert!(Cell::Number(3.0).same_as(&Cell::Text("3".into())));
        assert!(!Cell::Number(3.0).same_as(&Cell::Text("3.0".into())));
        assert!(Cell::Empty.same_as(&Cell::Text(String::new())));
    }

    #[test]
    fn test_json_shape() {
        let row = vec![Cell::Empty, Cell::Number(2.0), Cell::Text("a".into()), Cell::Bool(true)];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,2.0,"a",true]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_set_cell_reports_change() {
        let mut sheet = Sheet::with_headers("Product", &["product_id", "name"]);
        sheet.push_row(vec!["p1".into()]);
        assert!(sheet.set_cell(0, 1, "Print".into()));
        assert!(!sheet.set_cell(0, 1, "Print".into()));
        assert_eq!(sheet.value(0, "NAME"), "Print");
    }

    #[test]
    fn test_find_row_by_id_trims() {
        let mut sheet = Sheet::with_headers("Contacts", &["contact_id"]);
        sheet.push_row(vec![" c1 ".into()]);
        sheet.push_row(vec![Cell::Number(7.0)]);
        assert_eq!(sheet.find_row_by_id("c1"), Some(0));
        assert_eq!(sheet.find_row_by_id("7"), Some(1));
        assert_eq!(sheet.find_row_by_id(""), None);
    }

    #[test]
    fn test_ensure_column_pads_rows() {
        let mut sheet = Sheet::with_headers("Product_Units", &["inventory_id"]);
        sheet.push_row(vec!["u1".into()]);
        let idx = sheet.ensure_column("edition");
        assert_eq!(idx, 1);
        assert_eq!(sheet.rows[0].len(), 2);
        assert_eq!(sheet.ensure_column("EDITION"), 1);
    }
}

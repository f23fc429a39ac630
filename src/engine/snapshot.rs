//! Cached full-sheet reads shared by one propagation run.

use std::collections::HashMap;

use crate::db::Database;
use crate::error::Result;
use crate::models::{header_key, Cell, Sheet};

/// A loaded sheet indexed by first-column ID
#[derive(Debug, Clone)]
pub struct CachedSheet {
    pub sheet: Sheet,
    keys: Vec<String>,
    ids: HashMap<String, usize>,
}

impl CachedSheet {
    pub fn new(sheet: Sheet) -> Self {
        let keys = sheet.header_keys();
        let mut ids = HashMap::with_capacity(sheet.rows.len());
        for row in 0..sheet.rows.len() {
            let id = sheet.row_id(row);
            if !id.is_empty() {
                // Duplicate IDs resolve to the first row
                ids.entry(id).or_insert(row);
            }
        }
        Self { sheet, keys, ids }
    }

    pub fn has_column(&self, field_key: &str) -> bool {
        self.keys.iter().any(|k| k == field_key)
    }

    /// Value of `field_key` in the row whose ID is `id`
    pub fn field(&self, id: &str, field_key: &str) -> Option<&Cell> {
        let col = self.keys.iter().position(|k| k == field_key)?;
        let row = *self.ids.get(id.trim())?;
        Some(self.sheet.cell(row, col))
    }
}

/// Lazily loads each sheet at most once, keyed by lowercased name.
pub struct WorkbookSnapshot<'a> {
    db: &'a Database,
    names: Option<Vec<String>>,
    sheets: HashMap<String, Option<CachedSheet>>,
    loads: usize,
}

impl<'a> WorkbookSnapshot<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            names: None,
            sheets: HashMap::new(),
            loads: 0,
        }
    }

    /// The sheet whose name equals `name` ignoring case, loading it on first use
    pub fn get(&mut self, name: &str) -> Result<Option<&CachedSheet>> {
        let key = header_key(name);
        if !self.sheets.contains_key(&key) {
            let loaded = self.load(&key)?;
            self.sheets.insert(key.clone(), loaded);
        }
        Ok(self.sheets.get(&key).and_then(|s| s.as_ref()))
    }

    /// Refresh an entry after the sheet was written
    pub fn replace(&mut self, sheet: Sheet) {
        let key = header_key(&sheet.name);
        self.sheets.insert(key, Some(CachedSheet::new(sheet)));
    }

    /// Number of sheets read from the workbook so far
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn load(&mut self, key: &str) -> Result<Option<CachedSheet>> {
        if self.names.is_none() {
            self.names = Some(self.db.list_sheets()?);
        }
        let name = self
            .names
            .as_ref()
            .and_then(|names| names.iter().find(|n| header_key(n) == key).cloned());

        let Some(name) = name else {
            return Ok(None);
        };
        self.loads += 1;
        Ok(self.db.find_sheet(&name)?.map(CachedSheet::new))
    }
}

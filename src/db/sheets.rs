//! Sheet storage: whole-sheet reads and writes plus row-level edits.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{LadError, Result};
use crate::models::{header_key, Cell, Sheet};

impl Database {
    // ==================== SHEET READ ====================

    /// Sheet names in workbook order
    pub fn list_sheets(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sheets ORDER BY position ASC, name ASC")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Resolve a sheet name: exact, then case-insensitive, then substring match
    pub fn resolve_sheet_name(&self, name: &str) -> Result<Option<String>> {
        let names = self.list_sheets()?;
        if names.iter().any(|n| n == name) {
            return Ok(Some(name.to_string()));
        }

        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }
        if let Some(n) = names.iter().find(|n| n.to_lowercase() == wanted) {
            return Ok(Some(n.clone()));
        }
        Ok(names.into_iter().find(|n| n.to_lowercase().contains(&wanted)))
    }

    /// Load a sheet by (fuzzy) name, or `None` if nothing matches
    pub fn find_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        match self.resolve_sheet_name(name)? {
            Some(resolved) => self.load_sheet(&resolved),
            None => Ok(None),
        }
    }

    /// Load a sheet by (fuzzy) name
    pub fn get_sheet(&self, name: &str) -> Result<Sheet> {
        self.find_sheet(name)?
            .ok_or_else(|| LadError::SheetNotFound(name.to_string()))
    }

    fn load_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        let headers: Option<String> = self
            .conn
            .query_row(
                "SELECT headers FROM sheets WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        let Some(headers) = headers else {
            return Ok(None);
        };
        let headers: Vec<String> = serde_json::from_str(&headers)?;

        let mut stmt = self
            .conn
            .prepare("SELECT cells FROM sheet_rows WHERE sheet = ? ORDER BY row_index ASC")?;
        let raw = stmt
            .query_map([name], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(raw.len());
        for cells in raw {
            rows.push(serde_json::from_str::<Vec<Cell>>(&cells)?);
        }

        let mut sheet = Sheet {
            name: name.to_string(),
            headers,
            rows,
        };
        sheet.normalize();
        Ok(Some(sheet))
    }

    pub fn count_rows(&self, name: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sheet_rows WHERE sheet = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ==================== SHEET WRITE ====================

    /// Create a new sheet with its rows, appended after existing sheets
    pub fn create_sheet(&self, sheet: &Sheet) -> Result<()> {
        self.atomically(|| {
            let position: i64 = self.conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM sheets",
                [],
                |row| row.get(0),
            )?;
            self.conn.execute(
                "INSERT INTO sheets (name, position, headers, updated_at) VALUES (?, ?, ?, ?)",
                params![
                    sheet.name,
                    position,
                    serde_json::to_string(&sheet.headers)?,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            self.insert_rows(&sheet.name, 0, &sheet.rows)
        })
    }

    /// Load the sheet, or create it with `headers` when missing
    pub fn ensure_sheet(&self, name: &str, headers: &[&str]) -> Result<Sheet> {
        if let Some(sheet) = self.find_sheet(name)? {
            return Ok(sheet);
        }
        log::info!("creating sheet {}", name);
        let sheet = Sheet::with_headers(name, headers);
        self.create_sheet(&sheet)?;
        Ok(sheet)
    }

    /// Write a whole sheet back: headers and every row
    pub fn save_sheet(&self, sheet: &Sheet) -> Result<()> {
        self.atomically(|| {
            self.save_headers(sheet)?;
            self.conn
                .execute("DELETE FROM sheet_rows WHERE sheet = ?", [&sheet.name])?;
            self.insert_rows(&sheet.name, 0, &sheet.rows)
        })
    }

    /// Write only the header row
    pub fn save_headers(&self, sheet: &Sheet) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE sheets SET headers = ?, updated_at = ? WHERE name = ?",
            params![
                serde_json::to_string(&sheet.headers)?,
                Utc::now().to_rfc3339(),
                sheet.name,
            ],
        )?;
        if updated == 0 {
            return Err(LadError::SheetNotFound(sheet.name.clone()));
        }
        Ok(())
    }

    /// Append rows after the last row of the sheet
    pub fn append_rows(&self, name: &str, rows: &[Vec<Cell>]) -> Result<()> {
        self.atomically(|| {
            let start = self.count_rows(name)?;
            self.insert_rows(name, start, rows)?;
            self.touch_sheet(name)
        })
    }

    /// Overwrite one row in place (0-based data row index)
    pub fn update_row(&self, name: &str, row_index: usize, cells: &[Cell]) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE sheet_rows SET cells = ? WHERE sheet = ? AND row_index = ?",
            params![serde_json::to_string(cells)?, name, row_index as i64],
        )?;
        if updated == 0 {
            return Err(LadError::IdNotFound(format!("{} row {}", name, row_index + 1)));
        }
        self.touch_sheet(name)
    }

    /// Physically remove one row, shifting the rows below it up
    pub fn delete_row(&self, name: &str, row_index: usize) -> Result<()> {
        let mut sheet = self.get_sheet(name)?;
        if row_index >= sheet.rows.len() {
            return Err(LadError::IdNotFound(format!("{} row {}", name, row_index + 1)));
        }
        sheet.rows.remove(row_index);
        self.save_sheet(&sheet)
    }

    /// Add a column at the end of the header row if it is missing
    pub fn add_column(&self, name: &str, column: &str) -> Result<usize> {
        let mut sheet = self.get_sheet(name)?;
        let before = sheet.width();
        let idx = sheet.ensure_column(column);
        if sheet.width() != before {
            self.save_headers(&sheet)?;
        }
        Ok(idx)
    }

    fn insert_rows(&self, name: &str, start: usize, rows: &[Vec<Cell>]) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("INSERT INTO sheet_rows (sheet, row_index, cells) VALUES (?, ?, ?)")?;
        for (offset, cells) in rows.iter().enumerate() {
            stmt.execute(params![
                name,
                (start + offset) as i64,
                serde_json::to_string(cells)?
            ])?;
        }
        Ok(())
    }

    fn touch_sheet(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE sheets SET updated_at = ? WHERE name = ?",
            params![Utc::now().to_rfc3339(), name],
        )?;
        Ok(())
    }

    // ==================== VALIDATION LISTS ====================

    /// Set the allowed values for a column (an empty list removes the rule)
    pub fn set_validation(&self, sheet: &str, column: &str, options: &[String]) -> Result<()> {
        let sheet = self
            .resolve_sheet_name(sheet)?
            .ok_or_else(|| LadError::SheetNotFound(sheet.to_string()))?;

        if options.is_empty() {
            self.conn.execute(
                "DELETE FROM validations WHERE sheet = ? AND column_key = ?",
                params![sheet, header_key(column)],
            )?;
            return Ok(());
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO validations (sheet, column_key, options) VALUES (?, ?, ?)",
            params![sheet, header_key(column), serde_json::to_string(options)?],
        )?;
        Ok(())
    }

    /// Allowed values for a column, empty when no rule exists
    pub fn validation_options(&self, sheet: &str, column: &str) -> Result<Vec<String>> {
        let options: Option<String> = self
            .conn
            .query_row(
                "SELECT options FROM validations WHERE sheet = ? AND column_key = ?",
                params![sheet, header_key(column)],
                |row| row.get(0),
            )
            .optional()?;

        match options {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contacts() -> Sheet {
        let mut sheet = Sheet::with_headers("Contacts", &["contact_id", "name"]);
        sheet.push_row(vec!["c1".into(), "Ada".into()]);
        sheet.push_row(vec!["c2".into(), "Grace".into()]);
        sheet
    }

    #[test]
    fn test_create_and_load_sheet() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&contacts()).unwrap();

        let loaded = db.get_sheet("Contacts").unwrap();
        assert_eq!(loaded, contacts());
    }

    #[test]
    fn test_fuzzy_sheet_resolution() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&Sheet::with_headers("Product_Units", &["inventory_id"])).unwrap();
        db.create_sheet(&Sheet::with_headers("Product", &["product_id"])).unwrap();

        assert_eq!(db.resolve_sheet_name("Product").unwrap().as_deref(), Some("Product"));
        assert_eq!(db.resolve_sheet_name("product").unwrap().as_deref(), Some("Product"));
        assert_eq!(db.resolve_sheet_name("units").unwrap().as_deref(), Some("Product_Units"));
        assert!(db.resolve_sheet_name("Orders").unwrap().is_none());
        assert!(matches!(db.get_sheet("Orders"), Err(LadError::SheetNotFound(_))));
    }

    #[test]
    fn test_sheet_order_is_creation_order() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&Sheet::with_headers("Zeta", &["id"])).unwrap();
        db.create_sheet(&Sheet::with_headers("Alpha", &["id"])).unwrap();
        assert_eq!(db.list_sheets().unwrap(), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_append_update_delete_rows() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&contacts()).unwrap();

        db.append_rows("Contacts", &[vec!["c3".into(), "Linus".into()]]).unwrap();
        db.update_row("Contacts", 0, &["c1".into(), "Ada L.".into()]).unwrap();
        db.delete_row("Contacts", 1).unwrap();

        let sheet = db.get_sheet("Contacts").unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.value(0, "name"), "Ada L.");
        assert_eq!(sheet.value(1, "name"), "Linus");
    }

    #[test]
    fn test_update_missing_row_fails() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&contacts()).unwrap();
        assert!(db.update_row("Contacts", 9, &[]).is_err());
    }

    #[test]
    fn test_add_column_pads_existing_rows() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&contacts()).unwrap();
        assert_eq!(db.add_column("Contacts", "email").unwrap(), 2);

        let sheet = db.get_sheet("Contacts").unwrap();
        assert_eq!(sheet.headers.len(), 3);
        assert_eq!(sheet.rows[0].len(), 3);
    }

    #[test]
    fn test_validation_lists() {
        let db = Database::open_memory().unwrap();
        db.create_sheet(&Sheet::with_headers("Original", &["original_id", "type"])).unwrap();

        let options = vec!["Original".to_string(), "Print".to_string()];
        db.set_validation("original", "Type", &options).unwrap();
        assert_eq!(db.validation_options("Original", "type").unwrap(), options);

        db.set_validation("Original", "type", &[]).unwrap();
        assert!(db.validation_options("Original", "type").unwrap().is_empty());
    }
}

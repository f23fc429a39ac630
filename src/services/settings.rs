//! Key/value settings stored in the `Settings` sheet.

use crate::db::Database;
use crate::error::Result;
use crate::models::Cell;

pub const SETTINGS_SHEET: &str = "Settings";
pub const SETTINGS_HEADERS: &[&str] = &["key", "value"];

pub const SETTING_PDF_TEMPLATE: &str = "PDF_TEMPLATE";
pub const SETTING_PDF_FOLDER: &str = "PDF_FOLDER";
pub const SETTING_PDF_ITEMS_SHEET: &str = "PDF_ITEMS_SHEET";
pub const SETTING_ACCOUNTING_WORKBOOK: &str = "ACCOUNTING_WORKBOOK";
pub const SETTING_ACCOUNTING_DEBIT: &str = "ACCOUNTING_DEBIT_ACCOUNT";
pub const SETTING_ACCOUNTING_CREDIT: &str = "ACCOUNTING_CREDIT_ACCOUNT";

/// Value of the first row whose key matches exactly; blank values count as unset
pub fn get_setting(db: &Database, key: &str) -> Result<Option<String>> {
    let Some(sheet) = db.find_sheet(SETTINGS_SHEET)? else {
        return Ok(None);
    };
    let value = (0..sheet.rows.len())
        .find(|&row| sheet.cell(row, 0).to_string().trim() == key)
        .map(|row| sheet.cell(row, 1).to_string().trim().to_string())
        .filter(|v| !v.is_empty());
    Ok(value)
}

/// Insert or overwrite a setting, creating the sheet if needed
pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<()> {
    let sheet = db.ensure_sheet(SETTINGS_SHEET, SETTINGS_HEADERS)?;
    let existing = (0..sheet.rows.len()).find(|&row| sheet.cell(row, 0).to_string().trim() == key);

    let mut cells = match existing {
        Some(row) => sheet.rows[row].clone(),
        None => vec![Cell::Empty; sheet.width().max(2)],
    };
    if cells.len() < 2 {
        cells.resize(2, Cell::Empty);
    }
    cells[0] = Cell::text(key);
    cells[1] = Cell::text(value);

    match existing {
        Some(row) => db.update_row(&sheet.name, row, &cells),
        None => db.append_rows(&sheet.name, &[cells]),
    }
}

/// All non-blank keys in sheet order
pub fn list_settings(db: &Database) -> Result<Vec<(String, String)>> {
    let Some(sheet) = db.find_sheet(SETTINGS_SHEET)? else {
        return Ok(Vec::new());
    };
    Ok((0..sheet.rows.len())
        .map(|row| {
            (
                sheet.cell(row, 0).to_string().trim().to_string(),
                sheet.cell(row, 1).to_string(),
            )
        })
        .filter(|(k, _)| !k.is_empty())
        .collect())
}

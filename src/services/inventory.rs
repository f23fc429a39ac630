//! Creates individual inventory units for limited-edition products.

use uuid::Uuid;

use crate::db::Database;
use crate::engine::Propagation;
use crate::error::{LadError, Result};
use crate::models::{Cell, Sheet};

pub const PRODUCT_SHEET: &str = "Product";
pub const UNITS_SHEET: &str = "Product_Units";
/// Older workbooks keep their units here
pub const LEGACY_UNITS_SHEET: &str = "Inventar";

pub const DRAFT_STATUS: &str = "Draft";

const UNIT_COLUMNS: &[&str] = &["product_id", "edition", "status", "inventory_id"];

/// The units sheet under either of its names
pub fn find_units_sheet(db: &Database) -> Result<Sheet> {
    if let Some(sheet) = db.find_sheet(UNITS_SHEET)? {
        return Ok(sheet);
    }
    db.find_sheet(LEGACY_UNITS_SHEET)?
        .ok_or_else(|| LadError::SheetNotFound(UNITS_SHEET.to_string()))
}

/// Digits of a cell as a number: `"10 copies"` -> 10, `"N012"` -> 12
fn digits(value: &str) -> Option<u32> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

pub fn edition_label(n: u32) -> String {
    format!("N{:03}", n)
}

/// Top up every limited-edition product to its edition size, then rebuild
/// SKUs. Returns the number of units created.
pub fn sync_product_inventory(db: &Database) -> Result<usize> {
    let products = db.get_sheet(PRODUCT_SHEET)?;
    let mut units = find_units_sheet(db)?;

    let (Some(p_id), Some(p_limit)) = (
        products.column_index("product_id"),
        products.column_index("limited_edition"),
    ) else {
        log::warn!("{}: product_id or limited_edition column missing", products.name);
        return Ok(0);
    };

    let width = units.width();
    let cols: Vec<usize> = UNIT_COLUMNS.iter().map(|c| units.ensure_column(c)).collect();
    if units.width() != width {
        db.save_headers(&units)?;
    }
    let (u_product, u_edition, u_status, u_id) = (cols[0], cols[1], cols[2], cols[3]);

    let mut new_rows = Vec::new();
    for row in 0..products.rows.len() {
        let product_id = products.cell(row, p_id).to_string().trim().to_string();
        if product_id.is_empty() {
            continue;
        }
        let limit = match digits(&products.cell(row, p_limit).to_string()) {
            Some(n) if n > 0 => n,
            _ => continue,
        };

        let editions: Vec<u32> = (0..units.rows.len())
            .filter(|&r| units.cell(r, u_product).to_string().trim() == product_id)
            .map(|r| digits(&units.cell(r, u_edition).to_string()).unwrap_or(0))
            .collect();
        let existing = editions.len() as u32;
        if existing >= limit {
            continue;
        }

        let mut next = editions.iter().copied().max().unwrap_or(0);
        for _ in existing..limit {
            next += 1;
            let mut cells = vec![Cell::Empty; units.width()];
            cells[u_id] = Cell::text(Uuid::new_v4().to_string());
            cells[u_product] = products.cell(row, p_id).clone();
            cells[u_edition] = Cell::text(edition_label(next));
            cells[u_status] = Cell::text(DRAFT_STATUS);
            new_rows.push(cells);
        }
        log::info!("{}: {} units added", product_id, limit - existing);
    }

    if !new_rows.is_empty() {
        db.append_rows(&units.name, &new_rows)?;
    }
    Propagation::new(db).all_skus()?;
    Ok(new_rows.len())
}

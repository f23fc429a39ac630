use anyhow::Result;

use super::display::print_report;
use crate::db::Database;
use crate::engine::Propagation;
use crate::services::inventory::sync_product_inventory;

fn print_count(kind: &str, sheet: Option<&str>, changed: usize) {
    match sheet {
        Some(sheet) => println!("{}: {} {} updated", sheet, changed, kind),
        None => println!("{} {} updated", changed, kind),
    }
}

/// Execute the lookups command
pub fn run_lookups(db: &Database, sheet: Option<&str>) -> Result<()> {
    let mut propagation = Propagation::new(db);
    let changed = match sheet {
        Some(s) => propagation.lookups(s, None)?,
        None => propagation.all_lookups()?,
    };
    print_count("lookups", sheet, changed);
    Ok(())
}

/// Execute the short-values command
pub fn run_short_values(db: &Database, sheet: Option<&str>) -> Result<()> {
    let mut propagation = Propagation::new(db);
    let changed = match sheet {
        Some(s) => propagation.short_values(s, None)?,
        None => propagation.all_short_values()?,
    };
    print_count("short values", sheet, changed);
    Ok(())
}

/// Execute the skus command
pub fn run_skus(db: &Database, sheet: Option<&str>) -> Result<()> {
    let mut propagation = Propagation::new(db);
    let changed = match sheet {
        Some(s) => propagation.skus(s, None)?,
        None => propagation.all_skus()?,
    };
    print_count("SKUs", sheet, changed);
    Ok(())
}

/// Execute the sync command
pub fn run_sync(db: &Database) -> Result<()> {
    let report = Propagation::new(db).all()?;
    print_report(&report);
    Ok(())
}

/// Execute the inventory command
pub fn run_inventory(db: &Database) -> Result<()> {
    let created = sync_product_inventory(db)?;
    if created == 0 {
        println!("Inventory complete.");
    } else {
        println!("Created {} units.", created);
    }
    Ok(())
}

use anyhow::{anyhow, Context, Result};
use std::io;
use std::path::Path;

use super::display::{print_record, print_sheet};
use crate::db::Database;
use crate::services::interchange::{export_csv, export_csv_file, import_csv_file};
use crate::services::workbook::init_workbook;

/// Execute the init command
pub fn run_init(db: &Database) -> Result<()> {
    let created = init_workbook(db)?;
    if created.is_empty() {
        println!("Workbook already initialised.");
    } else {
        println!("Created {}.", created.join(", "));
    }
    Ok(())
}

/// Execute the sheets command
pub fn run_sheets(db: &Database) -> Result<()> {
    let names = db.list_sheets()?;
    if names.is_empty() {
        println!("No sheets. Run 'ladcmd init' to create the default layout.");
        return Ok(());
    }
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
    for name in names {
        println!("{:width$}  {}", name, db.count_rows(&name)?, width = width);
    }
    Ok(())
}

/// Execute the show command
pub fn run_show(db: &Database, sheet: &str, id: Option<&str>, limit: usize) -> Result<()> {
    let sheet = db.get_sheet(sheet)?;
    match id {
        Some(id) => {
            let row = sheet
                .find_row_by_id(id)
                .ok_or_else(|| anyhow!("No record with ID {} in {}", id.trim(), sheet.name))?;
            print_record(&sheet, row);
        }
        None if sheet.is_empty() => println!("{}: no rows.", sheet.name),
        None => print_sheet(&sheet, limit),
    }
    Ok(())
}

/// Execute the import command
pub fn run_import(db: &Database, file: &Path, sheet: Option<&str>, replace: bool) -> Result<()> {
    if !file.exists() {
        return Err(anyhow!("File not found: {}", file.display()));
    }
    let name = match sheet {
        Some(s) => s.to_string(),
        None => file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Cannot derive a sheet name from {}", file.display()))?,
    };

    let stats = import_csv_file(db, &name, file, replace)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    let verb = if stats.created { "Created" } else if replace { "Replaced" } else { "Appended to" };
    println!("{} {}: {} rows", verb, name, stats.rows);
    if stats.added_columns > 0 {
        println!("  {} new columns", stats.added_columns);
    }
    Ok(())
}

/// Execute the export command
pub fn run_export(db: &Database, sheet: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let rows = export_csv_file(db, sheet, path)?;
            eprintln!("Exported {} rows to {}", rows, path.display());
        }
        None => {
            export_csv(db, sheet, io::stdout().lock())?;
        }
    }
    Ok(())
}

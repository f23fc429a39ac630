//! CSV import and export of whole sheets.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Cell, Sheet};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub rows: usize,
    pub added_columns: usize,
    pub created: bool,
}

/// Read a CSV (header row first) into a sheet.
///
/// A new sheet is created when none matches `sheet_name`. With `replace`
/// an existing sheet is overwritten; otherwise rows are appended by
/// header name and unknown columns are added.
pub fn import_csv<R: Read>(db: &Database, sheet_name: &str, reader: R, replace: bool) -> Result<ImportStats> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        records.push(record.iter().map(Cell::parse).collect::<Vec<Cell>>());
    }

    let existing = db.find_sheet(sheet_name)?;
    let mut stats = ImportStats {
        rows: records.len(),
        ..Default::default()
    };

    match existing {
        Some(sheet) if !replace => {
            let mut sheet = sheet;
            let width = sheet.width();
            let cols: Vec<usize> = headers.iter().map(|h| sheet.ensure_column(h)).collect();
            stats.added_columns = sheet.width() - width;
            if stats.added_columns > 0 {
                db.save_headers(&sheet)?;
            }
            let rows: Vec<Vec<Cell>> = records
                .into_iter()
                .map(|record| {
                    let mut cells = vec![Cell::Empty; sheet.width()];
                    for (value, &col) in record.into_iter().zip(&cols) {
                        cells[col] = value;
                    }
                    cells
                })
                .collect();
            db.append_rows(&sheet.name, &rows)?;
        }
        Some(sheet) => {
            let mut replacement = Sheet::new(sheet.name, headers);
            for record in records {
                replacement.push_row(record);
            }
            db.save_sheet(&replacement)?;
        }
        None => {
            let mut sheet = Sheet::new(sheet_name.trim(), headers);
            for record in records {
                sheet.push_row(record);
            }
            db.create_sheet(&sheet)?;
            stats.created = true;
        }
    }

    log::info!("{}: imported {} rows", sheet_name, stats.rows);
    Ok(stats)
}

pub fn import_csv_file(db: &Database, sheet_name: &str, path: &Path, replace: bool) -> Result<ImportStats> {
    import_csv(db, sheet_name, File::open(path)?, replace)
}

/// Write a sheet as CSV. Returns the number of data rows written.
pub fn export_csv<W: Write>(db: &Database, sheet_name: &str, writer: W) -> Result<usize> {
    let sheet = db.get_sheet(sheet_name)?;
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv_writer.write_record(&sheet.headers)?;
    for row in 0..sheet.rows.len() {
        let cells: Vec<String> = (0..sheet.width()).map(|c| sheet.cell(row, c).to_string()).collect();
        csv_writer.write_record(&cells)?;
    }
    csv_writer.flush()?;
    Ok(sheet.rows.len())
}

pub fn export_csv_file(db: &Database, sheet_name: &str, path: &Path) -> Result<usize> {
    export_csv(db, sheet_name, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTACTS_CSV: &str = "contact_id,display_name,zip\nc1,Ada,007\nc2,\"Lovelace, Ada\",12345\n";

    #[test]
    fn test_import_creates_sheet() {
        let db = Database::open_memory().unwrap();
        let stats = import_csv(&db, "Contacts", CONTACTS_CSV.as_bytes(), false).unwrap();
        assert_eq!(stats, ImportStats { rows: 2, added_columns: 0, created: true });

        let sheet = db.get_sheet("Contacts").unwrap();
        assert_eq!(sheet.value(1, "display_name"), "Lovelace, Ada");
        // Leading zeros survive as text
        assert_eq!(sheet.cell(0, 2), &Cell::Text("007".to_string()));
        assert_eq!(sheet.cell(1, 2), &Cell::Number(12345.0));
    }

    #[test]
    fn test_import_appends_by_header_name() {
        let db = Database::open_memory().unwrap();
        import_csv(&db, "Contacts", CONTACTS_CSV.as_bytes(), false).unwrap();

        let more = "display_name,contact_id,email\nGrace,c3,g@example.com\n";
        let stats = import_csv(&db, "contacts", more.as_bytes(), false).unwrap();
        assert_eq!(stats.added_columns, 1);
        assert!(!stats.created);

        let sheet = db.get_sheet("Contacts").unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.row_id(2), "c3");
        assert_eq!(sheet.value(2, "email"), "g@example.com");
    }

    #[test]
    fn test_import_replace() {
        let db = Database::open_memory().unwrap();
        import_csv(&db, "Contacts", CONTACTS_CSV.as_bytes(), false).unwrap();
        import_csv(&db, "Contacts", "id,name\nx,Y\n".as_bytes(), true).unwrap();

        let sheet = db.get_sheet("Contacts").unwrap();
        assert_eq!(sheet.headers, vec!["id", "name"]);
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_export_pads_short_rows() {
        let db = Database::open_memory().unwrap();
        let mut sheet = Sheet::with_headers("Settings", &["key", "value"]);
        sheet.rows.push(vec!["PDF_FOLDER".into()]);
        db.create_sheet(&sheet).unwrap();

        let mut out = Vec::new();
        assert_eq!(export_csv(&db, "Settings", &mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "key,value\nPDF_FOLDER,\n");
    }
}

//! `[Sheet.Field]` lookup columns.

use super::columns::{row_range, ColumnRef, LinkRegistry};
use super::snapshot::WorkbookSnapshot;
use crate::error::Result;
use crate::models::Sheet;

/// Copy referenced fields into every `[Target.Field]` column of `sheet`.
///
/// Each row is joined to the target sheet through its link column. Only
/// cells whose value changed are rewritten; rows with a blank or unknown
/// link keep their current value. Returns the number of changed cells.
pub fn update_lookups(
    sheet: &mut Sheet,
    target_row: Option<usize>,
    snapshot: &mut WorkbookSnapshot<'_>,
    registry: &LinkRegistry,
) -> Result<usize> {
    let keys = sheet.header_keys();
    let computed: Vec<(usize, ColumnRef)> = sheet
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| ColumnRef::parse(h).map(|r| (i, r)))
        .collect();

    let mut changed = 0;
    for (col, reference) in computed {
        let Some(link_idx) = registry.find_link(&keys, &reference.sheet) else {
            log::debug!(
                "{}: no link column for [{}.{}]",
                sheet.name,
                reference.sheet,
                reference.field
            );
            continue;
        };

        let Some(target) = snapshot.get(&reference.sheet)? else {
            continue;
        };
        let field_key = reference.field_key();
        if !target.has_column(&field_key) {
            continue;
        }

        for row in row_range(sheet.rows.len(), target_row) {
            let link_id = sheet.cell(row, link_idx).to_string();
            if link_id.trim().is_empty() {
                continue;
            }
            if let Some(value) = target.field(&link_id, &field_key) {
                if sheet.set_cell(row, col, value.clone()) {
                    changed += 1;
                }
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Cell;

    fn fixture() -> Database {
        let db = Database::open_memory().unwrap();

        let mut contacts = Sheet::with_headers("Contacts", &["contact_id", "type", "display_name"]);
        contacts.push_row(vec!["c1".into(), "Artist".into(), "Ada".into()]);
        contacts.push_row(vec![Cell::Number(2.0), "Buyer".into(), "Grace".into()]);
        db.create_sheet(&contacts).unwrap();
        db
    }

    fn originals() -> Sheet {
        let mut sheet = Sheet::with_headers(
            "Original",
            &["original_id", "contact_id", "[Contacts.display_name]", "[Contacts.missing]"],
        );
        sheet.push_row(vec!["o1".into(), "c1".into()]);
        sheet.push_row(vec!["o2".into(), "2".into(), "stale".into()]);
        sheet.push_row(vec!["o3".into(), "c9".into(), "keep".into()]);
        sheet.push_row(vec!["o4".into()]);
        sheet
    }

    #[test]
    fn test_lookup_fills_and_rewrites_changed_cells() {
        let db = fixture();
        let mut sheet = originals();
        let mut snapshot = WorkbookSnapshot::new(&db);

        let changed =
            update_lookups(&mut sheet, None, &mut snapshot, &LinkRegistry::default()).unwrap();

        assert_eq!(changed, 2);
        assert_eq!(sheet.cell(0, 2).to_string(), "Ada");
        // Numeric ID in the target matches a text link
        assert_eq!(sheet.cell(1, 2).to_string(), "Grace");
        // Unknown and blank links leave the cell alone
        assert_eq!(sheet.cell(2, 2).to_string(), "keep");
        assert!(sheet.cell(3, 2).is_blank());
        // Missing target field is skipped
        assert!(sheet.cell(0, 3).is_blank());

        let again =
            update_lookups(&mut sheet, None, &mut snapshot, &LinkRegistry::default()).unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_lookup_single_row() {
        let db = fixture();
        let mut sheet = originals();
        let mut snapshot = WorkbookSnapshot::new(&db);

        let changed =
            update_lookups(&mut sheet, Some(1), &mut snapshot, &LinkRegistry::default()).unwrap();

        assert_eq!(changed, 1);
        assert!(sheet.cell(0, 2).is_blank());
        assert_eq!(sheet.cell(1, 2).to_string(), "Grace");
    }

    #[test]
    fn test_lookup_through_computed_link_and_plural_key() {
        let db = fixture();
        let mut sheet = Sheet::with_headers(
            "OrderDetails",
            &["orderdetails_id", "[Orders.contacts_id]", "[Contacts.type]"],
        );
        sheet.push_row(vec!["d1".into(), "c1".into()]);
        let mut snapshot = WorkbookSnapshot::new(&db);

        update_lookups(&mut sheet, None, &mut snapshot, &LinkRegistry::default()).unwrap();
        assert_eq!(sheet.cell(0, 2).to_string(), "Artist");
    }

    #[test]
    fn test_missing_target_sheet_is_ignored() {
        let db = fixture();
        let mut sheet = Sheet::with_headers("Product", &["product_id", "material_id", "[Material.name]"]);
        sheet.push_row(vec!["p1".into(), "m1".into()]);
        let mut snapshot = WorkbookSnapshot::new(&db);

        let changed =
            update_lookups(&mut sheet, None, &mut snapshot, &LinkRegistry::default()).unwrap();
        assert_eq!(changed, 0);
    }
}

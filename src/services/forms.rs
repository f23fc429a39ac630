//! Generic record create/update/delete for any sheet.

use std::time::Duration;

use uuid::Uuid;

use crate::db::Database;
use crate::engine::{is_computed, LinkRegistry, LinkRule, Propagation};
use crate::error::{LadError, Result};
use crate::models::{header_key, Cell, LinkedOption, Sheet};

/// Lock wait for a single form save
pub const SAVE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const CONTACTS_SHEET: &str = "Contacts";
const CONTACT_FIRST_NAME_COL: usize = 3;
const CONTACT_LAST_NAME_COL: usize = 5;

/// One editable column of a form
#[derive(Debug, Clone, PartialEq)]
pub struct FormColumn {
    pub name: String,
    pub index: usize,
    /// Dropdown choices; empty means free text
    pub options: Vec<LinkedOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub sheet_name: String,
    pub columns: Vec<FormColumn>,
    pub rows: Vec<Vec<String>>,
}

/// Field values entered in a form. A blank `id` creates a new record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    pub id: Option<String>,
    pub values: Vec<(String, String)>,
}

impl FormInput {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &str, value: &str) -> Self {
        self.values.push((column.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(String),
    Updated(String),
}

impl SaveOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Created(_) => "Created Successfully",
            Self::Updated(_) => "Updated Successfully",
        }
    }
}

// ==================== READ ====================

/// Everything a form needs: editable columns, their options, and the rows
pub fn form_view(db: &Database, sheet_name: &str) -> Result<FormView> {
    let sheet = db.get_sheet(sheet_name)?;
    if sheet.width() == 0 {
        return Err(LadError::EmptySheet(sheet.name));
    }
    let registry = LinkRegistry::default();

    let mut columns = Vec::new();
    for (index, header) in sheet.headers.iter().enumerate() {
        if is_computed(header) {
            continue;
        }
        let options = match registry.rule_for_key(header) {
            Some(rule) if !registry.is_self_id(&sheet.name, header) => linked_options(db, rule)?,
            _ => db
                .validation_options(&sheet.name, header)?
                .into_iter()
                .map(|v| LinkedOption {
                    id: v.clone(),
                    name: v,
                })
                .collect(),
        };
        columns.push(FormColumn {
            name: header.clone(),
            index,
            options,
        });
    }

    let rows = sheet
        .rows
        .iter()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect())
        .collect();

    Ok(FormView {
        sheet_name: sheet.name,
        columns,
        rows,
    })
}

/// `(id, label)` pairs for a foreign-key dropdown, sorted by label.
/// A missing target sheet yields no options.
pub fn linked_options(db: &Database, rule: &LinkRule) -> Result<Vec<LinkedOption>> {
    let Some(target) = db.find_sheet(&rule.sheet)? else {
        log::debug!("link target {} missing", rule.sheet);
        return Ok(Vec::new());
    };

    let mut options: Vec<LinkedOption> = (0..target.rows.len())
        .filter_map(|row| {
            let id = target.row_id(row);
            if id.is_empty() {
                return None;
            }
            Some(LinkedOption {
                name: row_label(&target, rule.label_col, row),
                id,
            })
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(options)
}

/// Label column value; contacts fall back to `first last`, anything else to the ID
pub fn row_label(sheet: &Sheet, label_col: usize, row: usize) -> String {
    let label = sheet.cell(row, label_col).to_string().trim().to_string();
    if !label.is_empty() {
        return label;
    }
    if header_key(&sheet.name) == header_key(CONTACTS_SHEET) {
        let full = format!(
            "{} {}",
            sheet.cell(row, CONTACT_FIRST_NAME_COL),
            sheet.cell(row, CONTACT_LAST_NAME_COL)
        );
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
    }
    sheet.row_id(row)
}

// ==================== WRITE ====================

/// Create or update a record, then refresh that row's derived columns.
///
/// Columns not mentioned in `input` keep their current values.
pub fn save_record(db: &Database, sheet_name: &str, input: &FormInput) -> Result<SaveOutcome> {
    db.with_lock(SAVE_LOCK_TIMEOUT, |db| {
        let mut sheet = db.get_sheet(sheet_name)?;
        if sheet.width() == 0 {
            return Err(LadError::EmptySheet(sheet.name));
        }

        // Validate every field before touching the sheet
        let mut updates = Vec::with_capacity(input.values.len());
        for (column, value) in &input.values {
            let idx = sheet
                .column_index(column)
                .ok_or_else(|| LadError::UnknownColumn {
                    sheet: sheet.name.clone(),
                    column: column.clone(),
                })?;
            if is_computed(&sheet.headers[idx]) {
                return Err(LadError::ReadOnlyColumn(sheet.headers[idx].clone()));
            }
            if idx == 0 {
                continue;
            }
            updates.push((idx, Cell::parse(value.trim())));
        }

        let id = input.id.as_deref().map(str::trim).unwrap_or_default();
        let (row, outcome) = if id.is_empty() {
            let new_id = Uuid::new_v4().to_string();
            let row = sheet.push_row(vec![Cell::text(new_id.clone())]);
            (row, SaveOutcome::Created(new_id))
        } else {
            let row = sheet
                .find_row_by_id(id)
                .ok_or_else(|| LadError::IdNotFound(id.to_string()))?;
            (row, SaveOutcome::Updated(id.to_string()))
        };

        for (idx, value) in updates {
            sheet.set_cell(row, idx, value);
        }

        match outcome {
            SaveOutcome::Created(_) => db.append_rows(&sheet.name, &[sheet.rows[row].clone()])?,
            SaveOutcome::Updated(_) => db.update_row(&sheet.name, row, &sheet.rows[row])?,
        }

        let report = Propagation::new(db).row(&sheet.name, row)?;
        log::info!(
            "{} {}: {} derived cells refreshed",
            sheet.name,
            outcome.id(),
            report.total()
        );
        Ok(outcome)
    })
}

/// Remove the first row with this ID
pub fn delete_record(db: &Database, sheet_name: &str, id: &str) -> Result<()> {
    let sheet = db.get_sheet(sheet_name)?;
    let row = sheet
        .find_row_by_id(id)
        .ok_or_else(|| LadError::IdNotFound(id.trim().to_string()))?;
    db.delete_row(&sheet.name, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Database {
        let db = Database::open_memory().unwrap();

        let mut contacts = Sheet::with_headers(
            "Contacts",
            &["contact_id", "type", "display_name", "first_name", "middle_name", "last_name"],
        );
        contacts.push_row(vec!["c1".into(), "Artist".into(), "Zoe".into()]);
        contacts.push_row(vec![
            "c2".into(),
            "Customer".into(),
            "".into(),
            "Ada".into(),
            "".into(),
            "Lovelace".into(),
        ]);
        contacts.push_row(vec!["c3".into()]);
        db.create_sheet(&contacts).unwrap();

        let mut original = Sheet::with_headers(
            "Original",
            &["original_id", "title", "contact_id", "[Contacts.display_name]", "type", "type_short_value"],
        );
        original.push_row(vec!["o1".into(), "Dunes".into(), "c1".into(), Cell::Empty, "Original".into()]);
        db.create_sheet(&original).unwrap();
        db.set_validation("Original", "type", &["Original".to_string(), "Print".to_string()])
            .unwrap();
        db
    }

    #[test]
    fn test_form_view_hides_computed_and_builds_options() {
        let db = fixture();
        let view = form_view(&db, "original").unwrap();

        assert_eq!(view.sheet_name, "Original");
        let names: Vec<&str> = view.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["original_id", "title", "contact_id", "type", "type_short_value"]);

        let contact = view.columns.iter().find(|c| c.name == "contact_id").unwrap();
        let labels: Vec<&str> = contact.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(labels, vec!["Ada Lovelace", "Zoe", "c3"]);

        let kind = view.columns.iter().find(|c| c.name == "type").unwrap();
        assert_eq!(kind.options.len(), 2);

        // The sheet's own ID never gets a dropdown
        assert!(view.columns[0].options.is_empty());
        assert_eq!(view.rows[0][0], "o1");
    }

    #[test]
    fn test_create_assigns_uuid_and_propagates() {
        let db = fixture();
        let input = FormInput::new(None)
            .set("title", "Tide")
            .set("contact_id", "c1")
            .set("type", "Print");

        let outcome = save_record(&db, "Original", &input).unwrap();
        assert_eq!(outcome.message(), "Created Successfully");
        assert!(Uuid::parse_str(outcome.id()).is_ok());

        let sheet = db.get_sheet("Original").unwrap();
        let row = sheet.find_row_by_id(outcome.id()).unwrap();
        assert_eq!(sheet.value(row, "[Contacts.display_name]"), "Zoe");
        assert_eq!(sheet.value(row, "type_short_value"), "PR");
    }

    #[test]
    fn test_update_keeps_unmentioned_columns() {
        let db = fixture();
        let input = FormInput::new(Some(" o1 ")).set("TITLE", "Dunes II");

        let outcome = save_record(&db, "Original", &input).unwrap();
        assert_eq!(outcome, SaveOutcome::Updated("o1".to_string()));

        let sheet = db.get_sheet("Original").unwrap();
        assert_eq!(sheet.value(0, "title"), "Dunes II");
        assert_eq!(sheet.value(0, "contact_id"), "c1");
        assert_eq!(sheet.value(0, "type_short_value"), "OR");
    }

    #[test]
    fn test_update_unknown_id() {
        let db = fixture();
        let err = save_record(&db, "Original", &FormInput::new(Some("o9"))).unwrap_err();
        assert!(matches!(err, LadError::IdNotFound(_)));
        assert_eq!(err.to_string(), "ID Not Found. It may have been deleted.");
    }

    #[test]
    fn test_computed_column_is_rejected_without_writing() {
        let db = fixture();
        let input = FormInput::new(Some("o1"))
            .set("title", "Changed")
            .set("[Contacts.display_name]", "Someone");

        let err = save_record(&db, "Original", &input).unwrap_err();
        assert!(matches!(err, LadError::ReadOnlyColumn(_)));
        assert_eq!(db.get_sheet("Original").unwrap().value(0, "title"), "Dunes");
    }

    #[test]
    fn test_unknown_column() {
        let db = fixture();
        let input = FormInput::new(None).set("colour", "red");
        assert!(matches!(
            save_record(&db, "Original", &input),
            Err(LadError::UnknownColumn { .. })
        ));
        assert_eq!(db.count_rows("Original").unwrap(), 1);
    }

    #[test]
    fn test_save_fails_busy_while_lock_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbook.db");
        let db = Database::open_at(&path).unwrap();
        db.create_sheet(&Sheet::with_headers("Contacts", &["contact_id", "display_name"]))
            .unwrap();
        let holder = Database::open_at(&path).unwrap();

        holder
            .with_lock(Duration::from_millis(50), |_| {
                let input = FormInput::new(None).set("display_name", "Ada");
                let err = save_record(&db, "Contacts", &input).unwrap_err();
                assert!(matches!(err, LadError::Busy));
                assert_eq!(err.to_string(), "System busy. Please try again.");
                Ok(())
            })
            .unwrap();

        assert!(db.get_sheet("Contacts").unwrap().rows.is_empty());
    }

    #[test]
    fn test_delete_record() {
        let db = fixture();
        delete_record(&db, "Contacts", "c2").unwrap();
        assert_eq!(db.count_rows("Contacts").unwrap(), 2);
        assert!(matches!(
            delete_record(&db, "Contacts", "c2"),
            Err(LadError::IdNotFound(_))
        ));
    }
}

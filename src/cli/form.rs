use anyhow::{anyhow, Result};

use super::display::print_record;
use super::ui::{self, confirm, prompt_choice, prompt_field, FormResult};
use crate::db::Database;
use crate::error::LadError;
use crate::services::forms::{delete_record, form_view, save_record, FormInput, SaveOutcome};

/// Split `column=value` arguments
pub fn parse_fields(fields: &[String]) -> Result<Vec<(String, String)>> {
    fields
        .iter()
        .map(|f| {
            f.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| anyhow!("Expected COLUMN=VALUE, got '{}'", f))
        })
        .collect()
}

/// Report a save the way the form does: message on success, `Error: ` otherwise.
/// Only storage failures propagate.
fn report_save(result: std::result::Result<SaveOutcome, LadError>) -> Result<Option<SaveOutcome>> {
    match result {
        Ok(outcome) => {
            ui::status(&format!("{} ({})", outcome.message(), outcome.id()));
            Ok(Some(outcome))
        }
        Err(e @ (LadError::Sqlite(_) | LadError::Io(_) | LadError::Json(_))) => Err(e.into()),
        Err(e) => {
            ui::error(&e.to_string());
            Ok(None)
        }
    }
}

/// Execute the save command
pub fn run_save(db: &Database, sheet: &str, id: Option<&str>, fields: &[String]) -> Result<()> {
    let input = FormInput {
        id: id.map(str::to_string),
        values: parse_fields(fields)?,
    };
    report_save(save_record(db, sheet, &input))?;
    Ok(())
}

/// Execute the form command: prompt for every editable column
pub fn run_form(db: &Database, sheet: &str, id: Option<&str>) -> Result<()> {
    let view = form_view(db, sheet)?;

    let current: Option<Vec<String>> = match id {
        Some(id) => {
            let row = view
                .rows
                .iter()
                .find(|r| r.first().map(|c| c.trim()) == Some(id.trim()))
                .cloned();
            if row.is_none() {
                ui::error(&LadError::IdNotFound(id.to_string()).to_string());
                return Ok(());
            }
            row
        }
        None => None,
    };

    println!("{}\n", view.sheet_name);
    let mut input = FormInput::new(id);
    for column in view.columns.iter().filter(|c| c.index != 0) {
        let existing = current
            .as_ref()
            .and_then(|r| r.get(column.index))
            .map(String::as_str);

        let result = if column.options.is_empty() {
            prompt_field(&column.name, existing)?
        } else {
            prompt_choice(&column.name, &column.options, existing)?
        };
        match result {
            FormResult::Value(v) => {
                if existing.unwrap_or("") != v {
                    input.values.push((column.name.clone(), v));
                }
            }
            FormResult::Cancelled => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    }

    if id.is_some() && input.values.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    if let Some(outcome) = report_save(save_record(db, sheet, &input))? {
        let sheet = db.get_sheet(sheet)?;
        if let Some(row) = sheet.find_row_by_id(outcome.id()) {
            println!();
            print_record(&sheet, row);
        }
    }
    Ok(())
}

/// Execute the delete command
pub fn run_delete(db: &Database, sheet: &str, id: &str, force: bool) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("ID cannot be empty."));
    }

    if !force {
        let data = db.get_sheet(sheet)?;
        match data.find_row_by_id(id) {
            Some(row) => {
                print_record(&data, row);
                println!();
                if !confirm("delete?")? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            None => {
                ui::error("ID Not Found");
                return Ok(());
            }
        }
    }

    match delete_record(db, sheet, id) {
        Ok(()) => ui::status("Deleted"),
        Err(LadError::IdNotFound(_)) => ui::error("ID Not Found"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

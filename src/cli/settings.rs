use anyhow::{anyhow, Result};

use super::{SettingsAction, ValidationAction};
use crate::db::Database;
use crate::services::settings::{get_setting, list_settings, set_setting};

/// Execute the settings command
pub fn run_settings(db: &Database, action: &SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Get { key } => match get_setting(db, key)? {
            Some(value) => println!("{}", value),
            None => return Err(anyhow!("{} is not set", key)),
        },
        SettingsAction::Set { key, value } => {
            set_setting(db, key.trim(), value)?;
            println!("Saved.");
        }
        SettingsAction::List => {
            let settings = list_settings(db)?;
            let width = settings.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in settings {
                println!("{:width$}  {}", key, value, width = width);
            }
        }
    }
    Ok(())
}

/// Execute the validation command
pub fn run_validation(db: &Database, action: &ValidationAction) -> Result<()> {
    match action {
        ValidationAction::Set { sheet, column, options } => {
            let data = db.get_sheet(sheet)?;
            if data.column_index(column).is_none() {
                return Err(anyhow!("No column '{}' in {}", column, data.name));
            }
            db.set_validation(&data.name, column, options)?;
            if options.is_empty() {
                println!("Removed list for {}.{}", data.name, column);
            } else {
                println!("{}.{}: {}", data.name, column, options.join(", "));
            }
        }
    }
    Ok(())
}

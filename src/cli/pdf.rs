use anyhow::Result;

use super::ui;
use crate::config::Config;
use crate::db::Database;
use crate::error::LadError;
use crate::services::invoice::generate_pdf;

/// Execute the pdf command
pub fn run_pdf(db: &Database, sheet: &str, id: &str) -> Result<()> {
    let config = Config::load(db)?;
    match generate_pdf(db, &config, sheet, id) {
        Ok(path) => println!("{}", path.display()),
        Err(e @ (LadError::MissingSetting(_) | LadError::IdNotFound(_))) => {
            ui::error(&e.to_string())
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

//! Runtime configuration
//!
//! The workbook path comes from the command line, `LAD_WORKBOOK` or the
//! per-user config directory. Everything else is read from the workbook's
//! `Settings` sheet, with environment variables taking precedence.

use std::env;
use std::path::PathBuf;

use crate::db::Database;
use crate::error::Result;
use crate::services::settings::{
    get_setting, SETTING_ACCOUNTING_CREDIT, SETTING_ACCOUNTING_DEBIT, SETTING_ACCOUNTING_WORKBOOK,
    SETTING_PDF_FOLDER, SETTING_PDF_ITEMS_SHEET, SETTING_PDF_TEMPLATE,
};

// Environment variable names
pub const ENV_WORKBOOK: &str = "LAD_WORKBOOK";
const ENV_PDF_TEMPLATE: &str = "LAD_PDF_TEMPLATE";
const ENV_PDF_FOLDER: &str = "LAD_PDF_FOLDER";
const ENV_ACCOUNTING_WORKBOOK: &str = "LAD_ACCOUNTING_WORKBOOK";

const DEFAULT_ITEMS_SHEET: &str = "OrderDetails";
const DEFAULT_DEBIT_ACCOUNT: &str = "Bank";
const DEFAULT_CREDIT_ACCOUNT: &str = "Sales";

/// Resolve the workbook file: explicit path, then environment, then default
pub fn workbook_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = env_value(ENV_WORKBOOK) {
        return Ok(PathBuf::from(path));
    }
    Database::default_path()
}

/// Where and how sales are mirrored into the bookkeeping workbook
#[derive(Debug, Clone, PartialEq)]
pub struct AccountingConfig {
    pub workbook: PathBuf,
    pub debit_account: String,
    pub credit_account: String,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub pdf_template: Option<PathBuf>,
    pub pdf_folder: Option<PathBuf>,
    pub pdf_items_sheet: String,
    pub accounting: Option<AccountingConfig>,
}

impl Config {
    /// Load from environment variables with Settings-sheet fallback
    pub fn load(db: &Database) -> Result<Self> {
        let pdf_template = env_value(ENV_PDF_TEMPLATE)
            .or(get_setting(db, SETTING_PDF_TEMPLATE)?)
            .map(PathBuf::from);
        let pdf_folder = env_value(ENV_PDF_FOLDER)
            .or(get_setting(db, SETTING_PDF_FOLDER)?)
            .map(PathBuf::from);
        let pdf_items_sheet = get_setting(db, SETTING_PDF_ITEMS_SHEET)?
            .unwrap_or_else(|| DEFAULT_ITEMS_SHEET.to_string());

        let accounting = match env_value(ENV_ACCOUNTING_WORKBOOK)
            .or(get_setting(db, SETTING_ACCOUNTING_WORKBOOK)?)
        {
            Some(path) => Some(AccountingConfig {
                workbook: PathBuf::from(path),
                debit_account: get_setting(db, SETTING_ACCOUNTING_DEBIT)?
                    .unwrap_or_else(|| DEFAULT_DEBIT_ACCOUNT.to_string()),
                credit_account: get_setting(db, SETTING_ACCOUNTING_CREDIT)?
                    .unwrap_or_else(|| DEFAULT_CREDIT_ACCOUNT.to_string()),
            }),
            None => None,
        };

        Ok(Self {
            pdf_template,
            pdf_folder,
            pdf_items_sheet,
            accounting,
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

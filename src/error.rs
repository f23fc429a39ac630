//! Error types for the workbook, engines and services.

use thiserror::Error;

/// Errors surfaced by workbook operations
#[derive(Error, Debug)]
pub enum LadError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet is empty: {0}")]
    EmptySheet(String),

    #[error("ID Not Found. It may have been deleted.")]
    IdNotFound(String),

    #[error("Unknown column '{column}' in sheet {sheet}")]
    UnknownColumn { sheet: String, column: String },

    #[error("Column '{0}' is computed and cannot be edited")]
    ReadOnlyColumn(String),

    #[error("System busy. Please try again.")]
    Busy,

    #[error("Config Missing in Settings sheet: {0}")]
    MissingSetting(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Row encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LadError>;

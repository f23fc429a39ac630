pub const SCHEMA_VERSION: i32 = 2;

/// V2 migration: data-validation lists that feed form dropdowns
pub const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS validations (
    sheet TEXT NOT NULL,
    column_key TEXT NOT NULL,
    options TEXT NOT NULL,
    PRIMARY KEY (sheet, column_key),
    FOREIGN KEY (sheet) REFERENCES sheets(name) ON DELETE CASCADE ON UPDATE CASCADE
);
"#;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- One entry per sheet; headers is a JSON array of strings
CREATE TABLE IF NOT EXISTS sheets (
    name TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    headers TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Data rows; cells is a JSON array aligned with the sheet headers
CREATE TABLE IF NOT EXISTS sheet_rows (
    sheet TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    cells TEXT NOT NULL,
    PRIMARY KEY (sheet, row_index),
    FOREIGN KEY (sheet) REFERENCES sheets(name) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sheet_position ON sheets(position);
"#;

//! `<base>_short_value` columns: abbreviated codes for categorical values.

use super::columns::row_range;
use crate::models::{Cell, Sheet};

pub const SHORT_VALUE_SUFFIX: &str = "_short_value";

/// Written when a source column has no dictionary and is not a size
pub const UNMAPPED_SHORT_VALUE: &str = "Error review columns names";

const TYPE_CODES: &[(&str, &str)] = &[
    ("Original", "OR"),
    ("Print", "PR"),
    ("Skulptur", "SC"),
    ("Sculpture", "SC"),
    ("Foto", "PH"),
    ("Photo", "PH"),
    ("Digital", "DG"),
    ("Digital Art", "DG"),
];

const STATUS_CODES: &[(&str, &str)] = &[
    ("Available", "AV"),
    ("Sold", "SD"),
    ("Reserved", "RS"),
];

const MEDIUM_CODES: &[(&str, &str)] = &[
    ("Reproduction on Paper", "RP"),
    ("Reproduction on Wood", "RW"),
    ("Reproduction on Glas", "RG"),
];

fn dictionary(base: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match base {
        "type" => Some(TYPE_CODES),
        "status" => Some(STATUS_CODES),
        "medium" => Some(MEDIUM_CODES),
        _ => None,
    }
}

/// Dictionary code for a value. Keys match exactly, case included.
pub fn dictionary_code(base: &str, value: &str) -> Option<&'static str> {
    dictionary(base)?
        .iter()
        .find(|(k, _)| *k == value)
        .map(|(_, code)| *code)
}

fn is_size_column(base: &str) -> bool {
    base == "size" || base.ends_with("_size")
}

/// `30 x 40 cm` -> `3040`
pub fn normalize_size(value: &str) -> String {
    value
        .to_lowercase()
        .replace('x', "")
        .replace("cm", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Short value for a trimmed, non-blank source value
pub fn short_value_for(base: &str, value: &str) -> String {
    if let Some(code) = dictionary_code(base, value) {
        code.to_string()
    } else if is_size_column(base) {
        normalize_size(value)
    } else {
        UNMAPPED_SHORT_VALUE.to_string()
    }
}

/// Recompute every `<base>_short_value` column whose `<base>` column exists.
/// Blank sources are skipped. Returns the number of changed cells.
pub fn update_short_values(sheet: &mut Sheet, target_row: Option<usize>) -> usize {
    let keys = sheet.header_keys();
    let pairs: Vec<(usize, usize, String)> = keys
        .iter()
        .enumerate()
        .filter_map(|(col, key)| {
            let base = key.strip_suffix(SHORT_VALUE_SUFFIX)?.trim().to_string();
            let source = keys.iter().position(|k| *k == base)?;
            Some((col, source, base))
        })
        .collect();

    let mut changed = 0;
    for (col, source, base) in &pairs {
        for row in row_range(sheet.rows.len(), target_row) {
            let value = sheet.cell(row, *source).to_string();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let short = short_value_for(base, value);
            if sheet.set_cell(row, *col, Cell::text(short)) {
                changed += 1;
            }
        }
    }
    changed
}

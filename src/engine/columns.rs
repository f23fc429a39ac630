//! Column resolution: header matching, computed-column syntax and the
//! foreign-key conventions that join one sheet to another.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::header_key;

/// A `[Sheet.Field]` reference, either as a computed header or a SKU placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub sheet: String,
    pub field: String,
}

impl ColumnRef {
    /// Parse a whole header such as `[Contacts.display_name]`
    pub fn parse(header: &str) -> Option<Self> {
        let caps = header_ref_re().captures(header.trim())?;
        Some(Self {
            sheet: caps[1].trim().to_string(),
            field: caps[2].trim().to_string(),
        })
    }

    pub fn sheet_key(&self) -> String {
        header_key(&self.sheet)
    }

    pub fn field_key(&self) -> String {
        header_key(&self.field)
    }
}

fn header_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[([\w\s]+)\.([\w\s]+)\]$").expect("computed header regex must compile")
    })
}

/// Placeholder pattern used inside SKU syntax strings
pub(crate) fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([\w\s]+)\.([\w\s]+)\]").expect("placeholder regex must compile")
    })
}

/// Bracket-named headers are derived, never user-entered
pub fn is_computed(header: &str) -> bool {
    let h = header.trim();
    h.starts_with('[') && h.ends_with(']')
}

/// A column equal to `key`, or a computed column ending in `.key]`
pub fn find_link_column(keys: &[String], key: &str) -> Option<usize> {
    let key = header_key(key);
    let suffix = format!(".{}]", key);
    keys.iter().position(|h| *h == key || h.ends_with(&suffix))
}

/// How a target sheet is referenced from other sheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRule {
    /// Foreign-key column name, e.g. `contact_id`
    pub key: String,
    pub sheet: String,
    /// Column shown as the label in dropdowns
    pub label_col: usize,
}

impl LinkRule {
    pub fn new(key: &str, sheet: &str, label_col: usize) -> Self {
        Self {
            key: key.to_string(),
            sheet: sheet.to_string(),
            label_col,
        }
    }
}

/// Known foreign-key columns and the sheets they point to
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    rules: Vec<LinkRule>,
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self {
            rules: vec![
                LinkRule::new("contact_id", "Contacts", 2),
                LinkRule::new("original_id", "Original", 1),
                LinkRule::new("product_id", "Product", 1),
                LinkRule::new("product_type_id", "Product_Type_Model", 1),
                LinkRule::new("material_id", "Material", 6),
                LinkRule::new("shipping_id", "Packaging", 10),
                LinkRule::new("inventory_id", "Product_Units", 0),
                LinkRule::new("orders_id", "Orders", 3),
            ],
        }
    }
}

impl LinkRegistry {
    pub fn new(rules: Vec<LinkRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    /// Rule for a foreign-key header such as `product_id`
    pub fn rule_for_key(&self, header: &str) -> Option<&LinkRule> {
        let key = header_key(header);
        self.rules.iter().find(|r| r.key == key)
    }

    /// Rule for a target sheet name (case-insensitive)
    pub fn rule_for_sheet(&self, sheet: &str) -> Option<&LinkRule> {
        let sheet = header_key(sheet);
        self.rules.iter().find(|r| header_key(&r.sheet) == sheet)
    }

    /// Candidate key columns for a target sheet, most specific first:
    /// the registered key, then `<sheet>_id`, then the singular `<sheet>_id`
    pub fn link_keys(&self, sheet: &str) -> Vec<String> {
        let base = header_key(sheet).replace(' ', "_");
        let mut keys = Vec::with_capacity(3);
        if let Some(rule) = self.rule_for_sheet(sheet) {
            keys.push(rule.key.clone());
        }
        for candidate in [
            format!("{}_id", base),
            format!("{}_id", base.strip_suffix('s').unwrap_or(&base)),
        ] {
            if !keys.contains(&candidate) {
                keys.push(candidate);
            }
        }
        keys
    }

    /// Column in `keys` that joins a row to `target_sheet`
    pub fn find_link(&self, keys: &[String], target_sheet: &str) -> Option<usize> {
        self.link_keys(target_sheet)
            .iter()
            .find_map(|k| find_link_column(keys, k))
    }

    /// True if `header` is the sheet's own ID column rather than a foreign key
    pub fn is_self_id(&self, sheet: &str, header: &str) -> bool {
        self.link_keys(sheet).contains(&header_key(header))
    }
}

/// Rows to process: one target row or every row
pub(crate) fn row_range(len: usize, target_row: Option<usize>) -> std::ops::Range<usize> {
    match target_row {
        Some(row) if row < len => row..row + 1,
        Some(_) => 0..0,
        None => 0..len,
    }
}

//! SKU codes assembled from per-sheet syntax patterns.
//!
//! Patterns live in the `SKU Syntax` sheet (sheet name, target column,
//! pattern) or in a per-row `sku_syntax` cell. A pattern is literal text
//! with `[Sheet.Field]` placeholders, e.g. `[Product.sku_code]-[Product_Units.edition]`.

use super::columns::{placeholder_re, row_range, LinkRegistry};
use super::snapshot::WorkbookSnapshot;
use crate::error::Result;
use crate::models::{header_key, Cell, Sheet};

pub const SKU_SYNTAX_SHEET: &str = "SKU Syntax";
pub const ROW_SYNTAX_COLUMN: &str = "sku_syntax";
pub const DEFAULT_SKU_COLUMN: &str = "sku_code";

/// One row of the `SKU Syntax` sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuRule {
    pub sheet: String,
    pub target_column: String,
    pub pattern: String,
}

/// Read all configured rules in sheet order
pub fn load_rules(snapshot: &mut WorkbookSnapshot<'_>) -> Result<Vec<SkuRule>> {
    let Some(config) = snapshot.get(SKU_SYNTAX_SHEET)? else {
        return Ok(Vec::new());
    };
    let sheet = &config.sheet;

    let rules = (0..sheet.rows.len())
        .filter_map(|row| {
            let name = sheet.cell(row, 0).to_string().trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(SkuRule {
                sheet: name,
                target_column: sheet.cell(row, 1).to_string().trim().to_string(),
                pattern: sheet.cell(row, 2).to_string().trim().to_string(),
            })
        })
        .collect();
    Ok(rules)
}

/// First rule whose sheet name matches, ignoring case
pub fn rule_for_sheet<'r>(rules: &'r [SkuRule], sheet: &str) -> Option<&'r SkuRule> {
    let key = header_key(sheet);
    rules
        .iter()
        .find(|r| header_key(&r.sheet) == key)
        .or_else(|| rules.iter().find(|r| is_same_sheet(&header_key(&r.sheet), &key)))
}

/// `Product_Units` is also known by its legacy name `Inventar`
pub fn legacy_alias(sheet: &str) -> Option<&'static str> {
    match header_key(sheet).as_str() {
        "product_units" => Some("Inventar"),
        "inventar" => Some("Product_Units"),
        _ => None,
    }
}

fn is_same_sheet(placeholder: &str, current: &str) -> bool {
    placeholder == current
        || legacy_alias(placeholder).is_some_and(|alias| header_key(alias) == current)
}

/// Expand a pattern for one row.
///
/// Placeholders naming the current sheet read from the row itself; others
/// are joined through the row's link column to the snapshot. Anything that
/// cannot be resolved becomes an empty string.
pub fn render_sku(
    pattern: &str,
    sheet: &Sheet,
    row: usize,
    snapshot: &mut WorkbookSnapshot<'_>,
    registry: &LinkRegistry,
) -> Result<String> {
    let keys = sheet.header_keys();
    let current = header_key(&sheet.name);
    let mut out = String::with_capacity(pattern.len());
    let mut last = 0;

    for caps in placeholder_re().captures_iter(pattern) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&pattern[last..whole.start()]);
        last = whole.end();

        let target = header_key(&caps[1]);
        let field = header_key(&caps[2]);

        if is_same_sheet(&target, &current) {
            if let Some(col) = keys.iter().position(|k| *k == field) {
                out.push_str(&sheet.cell(row, col).to_string());
            }
            continue;
        }

        let Some(link_idx) = registry.find_link(&keys, &target) else {
            continue;
        };
        let link_id = sheet.cell(row, link_idx).to_string();
        if let Some(cached) = snapshot.get(&target)? {
            if let Some(value) = cached.field(&link_id, &field) {
                out.push_str(&value.to_string());
            }
        }
    }
    out.push_str(&pattern[last..]);

    // Legacy patterns were spreadsheet formulas; drop their quoting residue
    Ok(out.replace("&\"\"-\"\"&", "-").replace('"', ""))
}

/// Write SKU codes for `sheet`. `rule` is the central configuration for this
/// sheet, if any; a non-blank `sku_syntax` cell overrides its pattern. A
/// blank central pattern renders an empty SKU.
/// Returns the number of changed SKU cells.
pub fn update_skus(
    sheet: &mut Sheet,
    rule: Option<&SkuRule>,
    target_row: Option<usize>,
    snapshot: &mut WorkbookSnapshot<'_>,
    registry: &LinkRegistry,
) -> Result<usize> {
    let row_syntax_col = sheet.column_index(ROW_SYNTAX_COLUMN);
    let target_column = match (rule, row_syntax_col) {
        (Some(rule), _) => rule.target_column.as_str(),
        (None, Some(_)) => DEFAULT_SKU_COLUMN,
        (None, None) => return Ok(0),
    };
    let Some(sku_col) = sheet.column_index(target_column) else {
        log::debug!("{}: SKU column '{}' not found", sheet.name, target_column);
        return Ok(0);
    };

    let mut changed = 0;
    for row in row_range(sheet.rows.len(), target_row) {
        let row_pattern = row_syntax_col
            .map(|c| sheet.cell(row, c).to_string().trim().to_string())
            .filter(|p| !p.is_empty());
        let pattern = match (&row_pattern, rule) {
            (Some(p), _) => p.as_str(),
            (None, Some(rule)) => rule.pattern.as_str(),
            (None, None) => continue,
        };

        let code = render_sku(pattern, sheet, row, snapshot, registry)?;
        if sheet.set_cell(row, sku_col, Cell::text(code)) {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn fixture() -> Database {
        let db = Database::open_memory().unwrap();

        let mut original = Sheet::with_headers("Original", &["original_id", "title", "sku_code"]);
        original.push_row(vec!["o1".into(), "Dunes".into(), "OR-DUN".into()]);
        db.create_sheet(&original).unwrap();

        let mut contacts = Sheet::with_headers("Contacts", &["contact_id", "type", "short_id"]);
        contacts.push_row(vec!["c1".into(), "Artist".into(), "AL".into()]);
        db.create_sheet(&contacts).unwrap();

        let mut config = Sheet::with_headers(SKU_SYNTAX_SHEET, &["sheet", "column", "syntax"]);
        config.push_row(vec![
            "product".into(),
            "SKU_Code".into(),
            "[Original.sku_code]-[Product.type_short_value]-[Contacts.short_id]".into(),
        ]);
        config.push_row(vec!["".into(), "ignored".into()]);
        db.create_sheet(&config).unwrap();
        db
    }

    fn products() -> Sheet {
        let mut sheet = Sheet::with_headers(
            "Product",
            &["product_id", "original_id", "contact_id", "type_short_value", "sku_code", "sku_syntax"],
        );
        sheet.push_row(vec!["p1".into(), "o1".into(), "c1".into(), "PR".into()]);
        sheet.push_row(vec!["p2".into(), "o9".into(), "".into(), "PH".into(), "stale".into()]);
        sheet.push_row(vec![
            "p3".into(),
            "o1".into(),
            "".into(),
            "DG".into(),
            "".into(),
            "X-[Product.product_id]".into(),
        ]);
        sheet
    }

    #[test]
    fn test_load_rules_skips_blank_rows() {
        let db = fixture();
        let mut snapshot = WorkbookSnapshot::new(&db);
        let rules = load_rules(&mut snapshot).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rule_for_sheet(&rules, "Product").unwrap().target_column, "SKU_Code");
        assert!(rule_for_sheet(&rules, "Original").is_none());

        let aliased = vec![SkuRule {
            sheet: "Product_Units".to_string(),
            target_column: "sku_code".to_string(),
            pattern: "X".to_string(),
        }];
        assert!(rule_for_sheet(&aliased, "Inventar").is_some());
    }

    #[test]
    fn test_update_skus_from_central_and_row_syntax() {
        let db = fixture();
        let mut snapshot = WorkbookSnapshot::new(&db);
        let rules = load_rules(&mut snapshot).unwrap();
        let rule = rule_for_sheet(&rules, "Product").cloned();
        let mut sheet = products();

        let changed = update_skus(
            &mut sheet,
            rule.as_ref(),
            None,
            &mut snapshot,
            &LinkRegistry::default(),
        )
        .unwrap();

        assert_eq!(changed, 3);
        assert_eq!(sheet.value(0, "sku_code"), "OR-DUN-PR-AL");
        // Unresolvable placeholders render empty
        assert_eq!(sheet.value(1, "sku_code"), "-PH-");
        assert_eq!(sheet.value(2, "sku_code"), "X-p3");

        let again = update_skus(
            &mut sheet,
            rule.as_ref(),
            None,
            &mut snapshot,
            &LinkRegistry::default(),
        )
        .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_blank_central_pattern_clears_sku() {
        let db = fixture();
        let mut snapshot = WorkbookSnapshot::new(&db);
        let rule = SkuRule {
            sheet: "Product".to_string(),
            target_column: "sku_code".to_string(),
            pattern: String::new(),
        };
        let mut sheet = Sheet::with_headers("Product", &["product_id", "sku_code"]);
        sheet.push_row(vec!["p1".into(), "STALE".into()]);

        let changed = update_skus(
            &mut sheet,
            Some(&rule),
            None,
            &mut snapshot,
            &LinkRegistry::default(),
        )
        .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(sheet.value(0, "sku_code"), "");
    }

    #[test]
    fn test_unconfigured_sheet_is_skipped() {
        let db = fixture();
        let mut snapshot = WorkbookSnapshot::new(&db);
        let mut sheet = Sheet::with_headers("Material", &["material_id", "sku_code"]);
        sheet.push_row(vec!["m1".into()]);

        let changed =
            update_skus(&mut sheet, None, None, &mut snapshot, &LinkRegistry::default()).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_formula_residue_is_cleaned() {
        let db = fixture();
        let mut snapshot = WorkbookSnapshot::new(&db);
        let mut sheet = Sheet::with_headers("Inventar", &["inventory_id", "edition"]);
        sheet.push_row(vec!["u1".into(), "N001".into()]);

        let code = render_sku(
            "\"LAD\"&\"\"-\"\"&[Product_Units.edition]",
            &sheet,
            0,
            &mut snapshot,
            &LinkRegistry::default(),
        )
        .unwrap();
        assert_eq!(code, "LAD-N001");
    }
}

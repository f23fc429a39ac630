//! Keeps derived columns in sync: lookups, short values and SKU codes.
//!
//! Each step loads a sheet, transforms it in memory and writes it back only
//! when something changed. One [`Propagation`] shares a single snapshot so
//! a full sync reads every sheet at most once.

use super::columns::LinkRegistry;
use super::lookup::update_lookups;
use super::short_value::update_short_values;
use super::sku::{self, SkuRule, ROW_SYNTAX_COLUMN};
use super::snapshot::WorkbookSnapshot;
use crate::db::Database;
use crate::error::Result;
use crate::models::Sheet;

/// Changed-cell counts per derived-column kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    pub lookups: usize,
    pub short_values: usize,
    pub skus: usize,
}

impl PropagationReport {
    pub fn total(&self) -> usize {
        self.lookups + self.short_values + self.skus
    }
}

impl std::ops::AddAssign for PropagationReport {
    fn add_assign(&mut self, other: Self) {
        self.lookups += other.lookups;
        self.short_values += other.short_values;
        self.skus += other.skus;
    }
}

pub struct Propagation<'a> {
    db: &'a Database,
    registry: LinkRegistry,
    snapshot: WorkbookSnapshot<'a>,
    rules: Option<Vec<SkuRule>>,
}

impl<'a> Propagation<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_registry(db, LinkRegistry::default())
    }

    pub fn with_registry(db: &'a Database, registry: LinkRegistry) -> Self {
        Self {
            db,
            registry,
            snapshot: WorkbookSnapshot::new(db),
            rules: None,
        }
    }

    // ==================== SINGLE SHEET ====================

    /// Recompute `[Sheet.Field]` columns of one sheet (or one row of it)
    pub fn lookups(&mut self, sheet: &str, target_row: Option<usize>) -> Result<usize> {
        let mut sheet = self.db.get_sheet(sheet)?;
        let changed = update_lookups(&mut sheet, target_row, &mut self.snapshot, &self.registry)?;
        self.finish(sheet, target_row, changed)
    }

    /// Recompute `_short_value` columns of one sheet (or one row of it)
    pub fn short_values(&mut self, sheet: &str, target_row: Option<usize>) -> Result<usize> {
        let mut sheet = self.db.get_sheet(sheet)?;
        let changed = update_short_values(&mut sheet, target_row);
        self.finish(sheet, target_row, changed)
    }

    /// Rebuild SKU codes of one sheet (or one row of it)
    pub fn skus(&mut self, sheet: &str, target_row: Option<usize>) -> Result<usize> {
        let mut sheet = self.db.get_sheet(sheet)?;
        let rule = self.rule_for(&sheet.name)?;
        let changed = sku::update_skus(
            &mut sheet,
            rule.as_ref(),
            target_row,
            &mut self.snapshot,
            &self.registry,
        )?;
        self.finish(sheet, target_row, changed)
    }

    /// Targeted update after a single row was saved
    pub fn row(&mut self, sheet: &str, row: usize) -> Result<PropagationReport> {
        let mut sheet = self.db.get_sheet(sheet)?;
        let rule = self.rule_for(&sheet.name)?;

        let report = PropagationReport {
            lookups: update_lookups(&mut sheet, Some(row), &mut self.snapshot, &self.registry)?,
            short_values: update_short_values(&mut sheet, Some(row)),
            skus: sku::update_skus(
                &mut sheet,
                rule.as_ref(),
                Some(row),
                &mut self.snapshot,
                &self.registry,
            )?,
        };
        self.finish(sheet, Some(row), report.total())?;
        Ok(report)
    }

    // ==================== WHOLE WORKBOOK ====================

    pub fn all_lookups(&mut self) -> Result<usize> {
        let mut changed = 0;
        for name in self.db.list_sheets()? {
            changed += self.lookups(&name, None)?;
        }
        Ok(changed)
    }

    pub fn all_short_values(&mut self) -> Result<usize> {
        let mut changed = 0;
        for name in self.db.list_sheets()? {
            changed += self.short_values(&name, None)?;
        }
        Ok(changed)
    }

    /// Rebuild SKUs for every configured sheet in configuration order, then
    /// for sheets that only carry per-row syntax
    pub fn all_skus(&mut self) -> Result<usize> {
        let rules = self.rules()?;
        let mut done: Vec<String> = Vec::new();
        let mut changed = 0;

        for rule in &rules {
            let resolved = match self.db.resolve_sheet_name(&rule.sheet)? {
                Some(name) => Some(name),
                None => match sku::legacy_alias(&rule.sheet) {
                    Some(alias) => self.db.resolve_sheet_name(alias)?,
                    None => None,
                },
            };
            let Some(name) = resolved else {
                log::debug!("SKU rule for missing sheet {}", rule.sheet);
                continue;
            };
            if done.contains(&name) {
                continue;
            }
            changed += self.skus(&name, None)?;
            done.push(name);
        }

        for name in self.db.list_sheets()? {
            if done.contains(&name) {
                continue;
            }
            let has_row_syntax = self
                .snapshot
                .get(&name)?
                .is_some_and(|s| s.has_column(ROW_SYNTAX_COLUMN));
            if has_row_syntax {
                changed += self.skus(&name, None)?;
            }
        }
        Ok(changed)
    }

    /// Full sync: lookups, then short values, then SKUs (which may use both)
    pub fn all(&mut self) -> Result<PropagationReport> {
        let report = PropagationReport {
            lookups: self.all_lookups()?,
            short_values: self.all_short_values()?,
            skus: self.all_skus()?,
        };
        log::info!(
            "sync complete: {} lookups, {} short values, {} SKUs",
            report.lookups,
            report.short_values,
            report.skus
        );
        Ok(report)
    }

    // ==================== HELPERS ====================

    fn rules(&mut self) -> Result<Vec<SkuRule>> {
        if self.rules.is_none() {
            self.rules = Some(sku::load_rules(&mut self.snapshot)?);
        }
        Ok(self.rules.clone().unwrap_or_default())
    }

    fn rule_for(&mut self, sheet: &str) -> Result<Option<SkuRule>> {
        let rules = self.rules()?;
        Ok(sku::rule_for_sheet(&rules, sheet).cloned())
    }

    /// Write back what changed and refresh the snapshot
    fn finish(&mut self, sheet: Sheet, target_row: Option<usize>, changed: usize) -> Result<usize> {
        if changed > 0 {
            match target_row {
                Some(row) if row < sheet.rows.len() => {
                    self.db.update_row(&sheet.name, row, &sheet.rows[row])?
                }
                _ => self.db.save_sheet(&sheet)?,
            }
            log::info!("{}: {} cells updated", sheet.name, changed);
        }
        self.snapshot.replace(sheet);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sku::SKU_SYNTAX_SHEET;
    use crate::models::Cell;

    /// Original → Product → Product_Units chain with SKUs that build on each other
    fn fixture() -> Database {
        let db = Database::open_memory().unwrap();

        let mut contacts = Sheet::with_headers("Contacts", &["contact_id", "type", "display_name"]);
        contacts.push_row(vec!["c1".into(), "Artist".into(), "Ada".into()]);
        db.create_sheet(&contacts).unwrap();

        let mut original = Sheet::with_headers(
            "Original",
            &["original_id", "title", "contact_id", "[Contacts.display_name]", "type", "type_short_value", "sku_code"],
        );
        original.push_row(vec!["o1".into(), "Dunes".into(), "c1".into(), Cell::Empty, "Original".into()]);
        db.create_sheet(&original).unwrap();

        let mut product = Sheet::with_headers(
            "Product",
            &["product_id", "name", "original_id", "size", "size_short_value", "sku_code"],
        );
        product.push_row(vec!["p1".into(), "Dunes print".into(), "o1".into(), "30 x 40 cm".into()]);
        db.create_sheet(&product).unwrap();

        let mut units = Sheet::with_headers(
            "Product_Units",
            &["inventory_id", "product_id", "[Product.name]", "edition", "sku_code"],
        );
        units.push_row(vec!["u1".into(), "p1".into(), Cell::Empty, "N001".into()]);
        db.create_sheet(&units).unwrap();

        let mut config = Sheet::with_headers(SKU_SYNTAX_SHEET, &["sheet", "column", "syntax"]);
        config.push_row(vec!["Original".into(), "sku_code".into(), "[Original.type_short_value]-[Original.original_id]".into()]);
        config.push_row(vec!["Product".into(), "sku_code".into(), "[Original.sku_code]-[Product.size_short_value]".into()]);
        config.push_row(vec!["Product_Units".into(), "sku_code".into(), "[Product.sku_code]-[Product_Units.edition]".into()]);
        db.create_sheet(&config).unwrap();
        db
    }

    #[test]
    fn test_full_sync_chains_skus() {
        let db = fixture();
        let report = Propagation::new(&db).all().unwrap();

        assert_eq!(report.lookups, 2);
        assert_eq!(report.short_values, 2);
        assert_eq!(report.skus, 3);

        let original = db.get_sheet("Original").unwrap();
        assert_eq!(original.value(0, "[Contacts.display_name]"), "Ada");
        assert_eq!(original.value(0, "sku_code"), "OR-o1");

        let units = db.get_sheet("Product_Units").unwrap();
        assert_eq!(units.value(0, "[Product.name]"), "Dunes print");
        assert_eq!(units.value(0, "sku_code"), "OR-o1-3040-N001");

        // A second run finds nothing to do
        assert_eq!(Propagation::new(&db).all().unwrap().total(), 0);
    }

    #[test]
    fn test_targeted_row_update() {
        let db = fixture();
        Propagation::new(&db).all().unwrap();

        let mut product = db.get_sheet("Product").unwrap();
        product.push_row(vec!["p2".into(), "Other".into(), "o1".into(), "10x10".into()]);
        product.set_cell(0, 3, "50 x 50".into());
        db.save_sheet(&product).unwrap();

        let report = Propagation::new(&db).row("Product", 1).unwrap();
        assert_eq!(report.lookups, 0);
        assert_eq!(report.short_values, 1);
        assert_eq!(report.skus, 1);

        let product = db.get_sheet("Product").unwrap();
        assert_eq!(product.value(1, "sku_code"), "OR-o1-1010");
        // Other rows are untouched by a targeted update
        assert_eq!(product.value(0, "size_short_value"), "3040");
    }

    #[test]
    fn test_per_row_syntax_without_central_rule() {
        let db = Database::open_memory().unwrap();
        let mut frames = Sheet::with_headers("Frames", &["frames_id", "wood", "sku_syntax", "sku_code"]);
        frames.push_row(vec!["f1".into(), "Oak".into(), "FR-[Frames.wood]".into()]);
        db.create_sheet(&frames).unwrap();

        assert_eq!(Propagation::new(&db).all_skus().unwrap(), 1);
        assert_eq!(db.get_sheet("Frames").unwrap().value(0, "sku_code"), "FR-Oak");
    }
}

//! Default studio workbook layout.

use crate::db::Database;
use crate::engine::sku::SKU_SYNTAX_SHEET;
use crate::error::Result;
use crate::models::{Cell, Sheet};

use super::inventory::{PRODUCT_SHEET, UNITS_SHEET};
use super::orders::{
    ORDERS_HEADERS, ORDERS_SHEET, ORDER_DETAILS_SHEET, TRANSACTIONS_HEADERS, TRANSACTIONS_SHEET,
};
use super::settings::{
    SETTINGS_HEADERS, SETTINGS_SHEET, SETTING_ACCOUNTING_CREDIT, SETTING_ACCOUNTING_DEBIT,
    SETTING_PDF_ITEMS_SHEET,
};

const CONTACTS_HEADERS: &[&str] = &[
    "contact_id",
    "contact_type",
    "display_name",
    "first_name",
    "middle_name",
    "last_name",
    "email",
    "phone",
    "address",
    "notes",
];

const ORIGINAL_HEADERS: &[&str] = &[
    "original_id",
    "title",
    "contact_id",
    "[Contacts.display_name]",
    "type",
    "type_short_value",
    "size",
    "size_short_value",
    "year",
    "status",
    "sku_code",
];

const PRODUCT_HEADERS: &[&str] = &[
    "product_id",
    "name",
    "original_id",
    "[Original.title]",
    "type",
    "type_short_value",
    "medium",
    "medium_short_value",
    "size",
    "size_short_value",
    "limited_edition",
    "price",
    "sku_code",
    "datasheet_link",
];

const UNITS_HEADERS: &[&str] = &[
    "inventory_id",
    "product_id",
    "[Product.name]",
    "[Product.price]",
    "edition",
    "status",
    "status_short_value",
    "sku_code",
];

const ORDER_DETAILS_HEADERS: &[&str] = &[
    "orderdetails_id",
    "orders_id",
    "inventory_id",
    "[Product_Units.sku_code]",
    "price",
    "qty",
];

const SKU_SYNTAX_HEADERS: &[&str] = &["sheet", "column", "syntax"];

const SKU_RULES: &[(&str, &str, &str)] = &[
    (
        "Original",
        "sku_code",
        "[Original.type_short_value]-[Original.size_short_value]-[Original.year]",
    ),
    (
        PRODUCT_SHEET,
        "sku_code",
        "[Original.sku_code]-[Product.medium_short_value]-[Product.size_short_value]",
    ),
    (
        UNITS_SHEET,
        "sku_code",
        "[Product.sku_code]-[Product_Units.edition]",
    ),
];

/// Create whichever default sheets are missing. Existing sheets are left
/// alone. Returns the names created.
pub fn init_workbook(db: &Database) -> Result<Vec<String>> {
    let mut layout: Vec<Sheet> = vec![
        Sheet::with_headers("Contacts", CONTACTS_HEADERS),
        Sheet::with_headers("Original", ORIGINAL_HEADERS),
        Sheet::with_headers(PRODUCT_SHEET, PRODUCT_HEADERS),
        Sheet::with_headers(UNITS_SHEET, UNITS_HEADERS),
        Sheet::with_headers(ORDERS_SHEET, ORDERS_HEADERS),
        Sheet::with_headers(ORDER_DETAILS_SHEET, ORDER_DETAILS_HEADERS),
        Sheet::with_headers(TRANSACTIONS_SHEET, TRANSACTIONS_HEADERS),
    ];

    let mut sku = Sheet::with_headers(SKU_SYNTAX_SHEET, SKU_SYNTAX_HEADERS);
    for (sheet, column, syntax) in SKU_RULES {
        sku.push_row(vec![Cell::text(*sheet), Cell::text(*column), Cell::text(*syntax)]);
    }
    layout.push(sku);

    let mut settings = Sheet::with_headers(SETTINGS_SHEET, SETTINGS_HEADERS);
    for (key, value) in [
        (SETTING_PDF_ITEMS_SHEET, ORDER_DETAILS_SHEET),
        (SETTING_ACCOUNTING_DEBIT, "Bank"),
        (SETTING_ACCOUNTING_CREDIT, "Sales"),
    ] {
        settings.push_row(vec![Cell::text(key), Cell::text(value)]);
    }
    layout.push(settings);

    let existing: Vec<String> = db
        .list_sheets()?
        .into_iter()
        .map(|n| n.to_lowercase())
        .collect();
    let mut created = Vec::new();
    for sheet in layout {
        if existing.contains(&sheet.name.to_lowercase()) {
            continue;
        }
        db.create_sheet(&sheet)?;
        created.push(sheet.name);
    }

    // Status dropdown for units
    if created.iter().any(|n| n == UNITS_SHEET) {
        let statuses: Vec<String> = ["Draft", "produced", "Reserved", "Sold"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        db.set_validation(UNITS_SHEET, "status", &statuses)?;
    }

    if !created.is_empty() {
        log::info!("created sheets: {}", created.join(", "));
    }
    Ok(created)
}

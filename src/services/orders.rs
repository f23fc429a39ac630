//! Point-of-sale: turning a cart into orders, order details and sold units.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;

use super::accounting::{self, JournalEntry};
use super::forms::{linked_options, row_label};
use super::inventory::find_units_sheet;
use crate::config::AccountingConfig;
use crate::db::Database;
use crate::engine::{LinkRegistry, Propagation};
use crate::error::{LadError, Result};
use crate::models::{
    AccountingSync, Cell, LinkedOption, OrderPayload, OrderReceipt, Sheet,
};

/// Lock wait for a whole order submission
pub const ORDER_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

pub const ORDERS_SHEET: &str = "Orders";
pub const ORDER_DETAILS_SHEET: &str = "OrderDetails";
pub const TRANSACTIONS_SHEET: &str = "Transactions";
const CONTACTS_SHEET: &str = "Contacts";

pub const ORDERS_HEADERS: &[&str] = &[
    "orders_id",
    "date",
    "contact_id",
    "customer_name",
    "total_amount",
    "item_count",
    "status",
];
pub const ORDER_DETAILS_HEADERS: &[&str] = &["orderdetails_id", "orders_id", "inventory_id", "price", "qty"];
pub const TRANSACTIONS_HEADERS: &[&str] = &[
    "transactions_id",
    "date",
    "orders_id",
    "contact_id",
    "amount",
    "accounting_ref",
];

pub const AVAILABLE_STATUS: &str = "produced";
pub const SOLD_STATUS: &str = "Sold";
const COMPLETED_STATUS: &str = "Completed";

/// A unit that can be put in the cart
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryOption {
    pub id: String,
    pub label: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderFormData {
    pub inventory: Vec<InventoryOption>,
    pub contacts: Vec<LinkedOption>,
}

/// Units with status `produced` and the contact list
pub fn order_form_data(db: &Database) -> Result<OrderFormData> {
    let units = find_units_sheet(db)?;
    let id_col = unit_id_column(&units)?;

    let inventory = match units.column_index("status") {
        Some(status_col) => (0..units.rows.len())
            .filter(|&r| {
                units
                    .cell(r, status_col)
                    .to_string()
                    .trim()
                    .eq_ignore_ascii_case(AVAILABLE_STATUS)
            })
            .filter_map(|r| {
                let id = units.cell(r, id_col).to_string().trim().to_string();
                if id.is_empty() {
                    return None;
                }
                let sku = units.value(r, "sku_code").trim().to_string();
                Some(InventoryOption {
                    id,
                    label: if sku.is_empty() { format!("Unit {}", r + 1) } else { sku },
                    price: unit_price(&units, r),
                })
            })
            .collect(),
        None => Vec::new(),
    };

    let registry = LinkRegistry::default();
    let contacts = match registry.rule_for_sheet(CONTACTS_SHEET) {
        Some(rule) => linked_options(db, rule)?,
        None => Vec::new(),
    };

    Ok(OrderFormData { inventory, contacts })
}

fn unit_id_column(units: &Sheet) -> Result<usize> {
    units
        .column_index("inventory_id")
        .ok_or_else(|| LadError::UnknownColumn {
            sheet: units.name.clone(),
            column: "inventory_id".to_string(),
        })
}

/// A unit's own `price`, else a looked-up `[...price]` column, else 0
fn unit_price(units: &Sheet, row: usize) -> f64 {
    let keys = units.header_keys();
    keys.iter()
        .position(|k| k == "price")
        .or_else(|| keys.iter().position(|k| k.ends_with(".price]")))
        .and_then(|col| units.cell(row, col).as_number())
        .unwrap_or(0.0)
}

fn check_cart(payload: &OrderPayload) -> Result<()> {
    if payload.items.is_empty() {
        return Err(LadError::InvalidOrder("cart is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for item in &payload.items {
        let id = item.unit_id.trim();
        if id.is_empty() {
            return Err(LadError::InvalidOrder("item without unit".to_string()));
        }
        if item.qty == 0 {
            return Err(LadError::InvalidOrder(format!("quantity of {} is zero", id)));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(LadError::InvalidOrder(format!("invalid price for {}", id)));
        }
        if !seen.insert(id.to_string()) {
            return Err(LadError::InvalidOrder(format!("unit {} is in the cart twice", id)));
        }
    }
    Ok(())
}

/// Record a sale: Orders and OrderDetails rows, units marked sold, and a
/// Transactions row carrying the accounting reference.
///
/// The whole submission holds the workbook lock. A failed accounting post
/// does not fail the order; the transaction is marked `SYNC_FAILED` instead.
pub fn submit_order(
    db: &Database,
    payload: &OrderPayload,
    accounting: Option<&AccountingConfig>,
) -> Result<OrderReceipt> {
    check_cart(payload)?;

    db.with_lock(ORDER_LOCK_TIMEOUT, |db| {
        // Resolve and check every unit before writing anything
        let mut units = find_units_sheet(db)?;
        let id_col = unit_id_column(&units)?;
        let status_col = units.column_index("status");

        let mut unit_rows = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let id = item.unit_id.trim();
            let row = (0..units.rows.len())
                .find(|&r| units.cell(r, id_col).to_string().trim() == id)
                .ok_or_else(|| LadError::InvalidOrder(format!("unknown unit {}", id)))?;
            let sold = status_col.is_some_and(|c| {
                units
                    .cell(row, c)
                    .to_string()
                    .trim()
                    .eq_ignore_ascii_case(SOLD_STATUS)
            });
            if sold {
                return Err(LadError::InvalidOrder(format!("unit {} is already sold", id)));
            }
            unit_rows.push(row);
        }

        let contact_id = payload.contact_id.trim();
        let customer_name = customer_name(db, contact_id)?;

        let now = Utc::now();
        let order_id = format!("ORD-{}", now.format("%Y%m%d-%H%M%S"));
        let date = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let total = payload.total();
        let item_count = payload.items.len();

        let orders = db.ensure_sheet(ORDERS_SHEET, ORDERS_HEADERS)?;
        let order_row = orders.record(&[
            ("orders_id", Cell::text(order_id.as_str())),
            ("date", Cell::text(date.as_str())),
            ("contact_id", Cell::text(contact_id)),
            ("customer_name", Cell::text(customer_name.as_str())),
            ("total_amount", Cell::Number(total)),
            ("item_count", Cell::from(item_count as u32)),
            ("status", Cell::text(COMPLETED_STATUS)),
        ]);
        db.append_rows(&orders.name, &[order_row])?;

        let details = db.ensure_sheet(ORDER_DETAILS_SHEET, ORDER_DETAILS_HEADERS)?;
        let first_detail = details.rows.len();
        let detail_rows: Vec<Vec<Cell>> = payload
            .items
            .iter()
            .enumerate()
            .map(|(n, item)| {
                details.record(&[
                    ("orderdetails_id", Cell::text(format!("DET-{}-{}", order_id, n + 1))),
                    ("orders_id", Cell::text(order_id.as_str())),
                    ("inventory_id", Cell::text(item.unit_id.trim())),
                    ("price", Cell::Number(item.price)),
                    ("qty", Cell::from(item.qty)),
                ])
            })
            .collect();
        db.append_rows(&details.name, &detail_rows)?;

        let status_col = match status_col {
            Some(c) => c,
            None => {
                let c = units.ensure_column("status");
                db.save_headers(&units)?;
                c
            }
        };
        let mut propagation = Propagation::new(db);
        for &row in &unit_rows {
            units.set_cell(row, status_col, Cell::text(SOLD_STATUS));
            db.update_row(&units.name, row, &units.rows[row])?;
            propagation.row(&units.name, row)?;
        }
        // Detail lookups read the units' refreshed values
        for row in first_detail..first_detail + detail_rows.len() {
            propagation.lookups(&details.name, Some(row))?;
        }

        let sync = match accounting {
            None => AccountingSync::Skipped,
            Some(config) => {
                let entry = JournalEntry {
                    date: date.clone(),
                    reference: order_id.clone(),
                    description: format!("Sale {}", customer_name).trim().to_string(),
                    amount: total,
                };
                match accounting::post_entry(config, &entry) {
                    Ok(journal_id) => AccountingSync::Posted(journal_id),
                    Err(e) => {
                        log::warn!("accounting sync failed for {}: {}", order_id, e);
                        AccountingSync::Failed(e.to_string())
                    }
                }
            }
        };

        let transactions = db.ensure_sheet(TRANSACTIONS_SHEET, TRANSACTIONS_HEADERS)?;
        let transaction = transactions.record(&[
            ("transactions_id", Cell::text(format!("TRX-{}", order_id))),
            ("date", Cell::text(date.as_str())),
            ("orders_id", Cell::text(order_id.as_str())),
            ("contact_id", Cell::text(contact_id)),
            ("amount", Cell::Number(total)),
            ("accounting_ref", Cell::text(sync.marker())),
        ]);
        db.append_rows(&transactions.name, &[transaction])?;

        log::info!("{}: {} items, total {}", order_id, item_count, total);
        Ok(OrderReceipt {
            order_id,
            customer_name,
            total,
            item_count,
            accounting: sync,
        })
    })
}

/// Contact label for the order; a blank contact is a walk-in sale
fn customer_name(db: &Database, contact_id: &str) -> Result<String> {
    if contact_id.is_empty() {
        return Ok(String::new());
    }
    let registry = LinkRegistry::default();
    let label_col = registry
        .rule_for_sheet(CONTACTS_SHEET)
        .map(|r| r.label_col)
        .unwrap_or(0);
    let contacts = db
        .find_sheet(CONTACTS_SHEET)?
        .ok_or_else(|| LadError::SheetNotFound(CONTACTS_SHEET.to_string()))?;
    let row = contacts
        .find_row_by_id(contact_id)
        .ok_or_else(|| LadError::InvalidOrder(format!("unknown contact {}", contact_id)))?;
    Ok(row_label(&contacts, label_col, row))
}

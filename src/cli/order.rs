use anyhow::{anyhow, Result};
use inquire::MultiSelect;

use super::ui::{self, minimal_render_config, option_label, select, visible_lines};
use crate::config::Config;
use crate::db::Database;
use crate::error::LadError;
use crate::models::{AccountingSync, OrderItem, OrderPayload, OrderReceipt};
use crate::services::orders::{order_form_data, submit_order, InventoryOption};

/// Parse `unit_id[:price[:qty]]`; a missing price comes from the inventory list
pub fn parse_cart_line(line: &str, inventory: &[InventoryOption]) -> Result<OrderItem> {
    let mut parts = line.split(':');
    let unit_id = parts.next().unwrap_or_default().trim().to_string();
    if unit_id.is_empty() {
        return Err(anyhow!("Empty unit in '{}'", line));
    }

    let price = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p.parse::<f64>().map_err(|_| anyhow!("Invalid price in '{}'", line))?,
        None => inventory
            .iter()
            .find(|o| o.id == unit_id)
            .map(|o| o.price)
            .unwrap_or(0.0),
    };
    let qty = match parts.next().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => q.parse::<u32>().map_err(|_| anyhow!("Invalid quantity in '{}'", line))?,
        None => 1,
    };

    Ok(OrderItem { unit_id, price, qty })
}

fn print_receipt(receipt: &OrderReceipt) {
    println!("{}", receipt.order_id);
    if !receipt.customer_name.is_empty() {
        println!("  {}", receipt.customer_name);
    }
    println!("  {} items, total {:.2}", receipt.item_count, receipt.total);
    match &receipt.accounting {
        AccountingSync::Skipped => {}
        AccountingSync::Posted(id) => println!("  booked as {}", id),
        AccountingSync::Failed(e) => ui::warning(&format!("accounting sync failed: {}", e)),
    }
}

/// Execute the order command. Without units, the cart is picked interactively.
pub fn run_order(db: &Database, contact: &str, units: &[String]) -> Result<()> {
    let data = order_form_data(db)?;

    let payload = if units.is_empty() {
        match pick_cart(&data.inventory, &data.contacts)? {
            Some(payload) => payload,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    } else {
        OrderPayload {
            contact_id: contact.trim().to_string(),
            items: units
                .iter()
                .map(|u| parse_cart_line(u, &data.inventory))
                .collect::<Result<Vec<_>>>()?,
        }
    };

    let config = Config::load(db)?;
    match submit_order(db, &payload, config.accounting.as_ref()) {
        Ok(receipt) => print_receipt(&receipt),
        Err(e @ (LadError::InvalidOrder(_) | LadError::Busy)) => ui::error(&e.to_string()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn pick_cart(
    inventory: &[InventoryOption],
    contacts: &[crate::models::LinkedOption],
) -> Result<Option<OrderPayload>> {
    if inventory.is_empty() {
        println!("No units available.");
        return Ok(None);
    }

    let labels: Vec<String> = inventory
        .iter()
        .map(|o| format!("{}  {:.2}", o.label, o.price))
        .collect();
    let Some(chosen) = MultiSelect::new("units:", labels.clone())
        .with_render_config(minimal_render_config())
        .with_page_size(visible_lines())
        .with_vim_mode(true)
        .prompt_skippable()?
    else {
        return Ok(None);
    };
    if chosen.is_empty() {
        return Ok(None);
    }

    let items = chosen
        .iter()
        .filter_map(|c| labels.iter().position(|l| l == c))
        .map(|i| OrderItem::new(inventory[i].id.clone(), inventory[i].price))
        .collect();

    let mut names: Vec<String> = vec!["(walk-in)".to_string()];
    names.extend(contacts.iter().map(option_label));
    let contact_id = match select("customer:", &names)? {
        Some(0) | None => String::new(),
        Some(i) => contacts[i - 1].id.clone(),
    };

    Ok(Some(OrderPayload { contact_id, items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sheet;

    fn inventory() -> Vec<InventoryOption> {
        vec![InventoryOption {
            id: "u1".to_string(),
            label: "DUN-N001".to_string(),
            price: 120.0,
        }]
    }

    #[test]
    fn test_parse_cart_line() {
        let item = parse_cart_line("u1", &inventory()).unwrap();
        assert_eq!(item, OrderItem::new("u1", 120.0));

        let item = parse_cart_line("u1:99.5:2", &inventory()).unwrap();
        assert_eq!(item.price, 99.5);
        assert_eq!(item.qty, 2);

        assert_eq!(parse_cart_line("u7", &inventory()).unwrap().price, 0.0);
        assert!(parse_cart_line(":5", &inventory()).is_err());
        assert!(parse_cart_line("u1:abc", &inventory()).is_err());
    }

    #[test]
    fn test_run_order_reports_invalid_cart() {
        let db = Database::open_memory().unwrap();
        let mut units = Sheet::with_headers("Product_Units", &["inventory_id", "status"]);
        units.push_row(vec!["u1".into(), "Sold".into()]);
        db.create_sheet(&units).unwrap();

        run_order(&db, "", &["u1".to_string()]).unwrap();
        assert!(db.find_sheet("Orders").unwrap().is_none());
    }
}

//! Merges a record (and its child rows) into a text template and exports it
//! as a PDF next to the record.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use url::Url;

use super::pdf;
use super::settings::{SETTING_PDF_FOLDER, SETTING_PDF_TEMPLATE};
use crate::config::Config;
use crate::db::Database;
use crate::engine::find_link_column;
use crate::error::{LadError, Result};
use crate::models::{header_key, Cell, Sheet};

const QR_CHART_URL: &str = "https://chart.googleapis.com/chart";
const QR_KEY: &str = "qr_code";
const ITEM_PREFIX: &str = "{{item.";

/// Lowercased header -> display value
pub type MergeData = BTreeMap<String, String>;

pub fn merge_data(sheet: &Sheet, row: usize) -> MergeData {
    sheet
        .header_keys()
        .into_iter()
        .enumerate()
        .filter(|(_, key)| !key.is_empty())
        .map(|(col, key)| (key, sheet.cell(row, col).to_string()))
        .collect()
}

/// Chart-service URL for a QR code encoding `<sheet>:<id>`
pub fn qr_code_url(sheet: &str, id: &str) -> Result<String> {
    let data = format!("{}:{}", sheet, id);
    let url = Url::parse_with_params(
        QR_CHART_URL,
        &[("chs", "150x150"), ("cht", "qr"), ("chl", data.as_str())],
    )
    .map_err(|e| LadError::Template(e.to_string()))?;
    Ok(url.to_string())
}

fn substitute(line: &str, prefix: &str, data: &MergeData) -> String {
    let mut out = line.to_string();
    for (key, value) in data {
        let token = format!("{{{{{}{}}}}}", prefix, key);
        if out.contains(&token) {
            out = out.replace(&token, value);
        }
    }
    out
}

/// Replace `{{key}}` tokens. A line containing `{{item.<field>}}` is
/// repeated once per item (and dropped when there are none). Unknown
/// tokens are left as they are.
pub fn render_template(template: &str, data: &MergeData, items: &[MergeData]) -> String {
    let mut out = Vec::new();
    for line in template.lines() {
        if line.contains(ITEM_PREFIX) {
            for item in items {
                let filled = substitute(line, "item.", item);
                out.push(substitute(&filled, "", data));
            }
        } else {
            out.push(substitute(line, "", data));
        }
    }
    out.join("\n")
}

/// Child rows whose link column matches the parent's ID
fn child_items(db: &Database, items_sheet: &str, parent: &Sheet, id: &str) -> Result<Vec<MergeData>> {
    let Some(children) = db.find_sheet(items_sheet)? else {
        return Ok(Vec::new());
    };
    if header_key(&children.name) == header_key(&parent.name) {
        return Ok(Vec::new());
    }
    let Some(parent_key) = parent.header_keys().into_iter().next() else {
        return Ok(Vec::new());
    };
    let Some(link) = find_link_column(&children.header_keys(), &parent_key) else {
        return Ok(Vec::new());
    };
    Ok((0..children.rows.len())
        .filter(|&r| children.cell(r, link).to_string().trim() == id)
        .map(|r| merge_data(&children, r))
        .collect())
}

/// Keep file names to one path component
fn file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') || c.is_control() { '_' } else { c })
        .collect()
}

/// Render the PDF for one record and store its path in the record's link
/// column. Returns the written file.
pub fn generate_pdf(db: &Database, config: &Config, sheet_name: &str, id: &str) -> Result<PathBuf> {
    let template_path = config
        .pdf_template
        .as_ref()
        .ok_or_else(|| LadError::MissingSetting(SETTING_PDF_TEMPLATE.to_string()))?;
    let folder = config
        .pdf_folder
        .as_ref()
        .ok_or_else(|| LadError::MissingSetting(SETTING_PDF_FOLDER.to_string()))?;

    let mut sheet = db.get_sheet(sheet_name)?;
    let id = id.trim();
    let row = sheet
        .find_row_by_id(id)
        .ok_or_else(|| LadError::IdNotFound(id.to_string()))?;

    let mut data = merge_data(&sheet, row);
    data.insert(QR_KEY.to_string(), qr_code_url(&sheet.name, id)?);
    let items = child_items(db, &config.pdf_items_sheet, &sheet, id)?;

    let template = fs::read_to_string(template_path)?;
    let text = render_template(&template, &data, &items);

    let stem = match data.get("sku_code").map(|s| file_stem(s)) {
        Some(sku) if !sku.is_empty() => sku,
        _ => format!("File_{}", row + 2),
    };
    fs::create_dir_all(folder)?;
    let path = folder.join(format!("{}.pdf", stem));
    pdf::write_pdf(&path, &stem, &text)?;
    log::info!("{} {}: wrote {}", sheet.name, id, path.display());

    let link_col = sheet
        .header_keys()
        .iter()
        .position(|k| k.contains("sheet") || k.contains("link"));
    match link_col {
        Some(col) => {
            if sheet.set_cell(row, col, Cell::text(path.display().to_string())) {
                db.update_row(&sheet.name, row, &sheet.rows[row])?;
            }
        }
        None => log::debug!("{}: no link column for the PDF path", sheet.name),
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn data(pairs: &[(&str, &str)]) -> MergeData {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_template_with_items() {
        let template = "Invoice {{orders_id}}\n- {{item.inventory_id}}: {{item.price}} ({{orders_id}})\nTotal {{total_amount}} {{unknown}}";
        let items = vec![
            data(&[("inventory_id", "u1"), ("price", "120")]),
            data(&[("inventory_id", "u2"), ("price", "80")]),
        ];
        let out = render_template(
            template,
            &data(&[("orders_id", "ORD-1"), ("total_amount", "200")]),
            &items,
        );
        assert_eq!(
            out,
            "Invoice ORD-1\n- u1: 120 (ORD-1)\n- u2: 80 (ORD-1)\nTotal 200 {{unknown}}"
        );
    }

    #[test]
    fn test_item_lines_dropped_without_items() {
        let out = render_template("A\n{{item.x}}\nB", &MergeData::new(), &[]);
        assert_eq!(out, "A\nB");
    }

    #[test]
    fn test_qr_code_url_is_encoded() {
        let url = qr_code_url("Product Units", "u1").unwrap();
        assert!(url.starts_with("https://chart.googleapis.com/chart?"));
        assert!(url.contains("cht=qr"));
        assert!(url.contains("chl=Product+Units%3Au1"));
    }

    fn fixture() -> Database {
        let db = Database::open_memory().unwrap();
        let mut orders = Sheet::with_headers(
            "Orders",
            &["orders_id", "customer_name", "total_amount", "datasheet_link"],
        );
        orders.push_row(vec!["ORD-1".into(), "Ada".into(), 200.0.into()]);
        orders.push_row(vec!["ORD-2".into(), "Bob".into(), 50.0.into()]);
        db.create_sheet(&orders).unwrap();

        let mut details = Sheet::with_headers("OrderDetails", &["orderdetails_id", "orders_id", "price"]);
        details.push_row(vec!["DET-ORD-1-1".into(), "ORD-1".into(), 120.0.into()]);
        details.push_row(vec!["DET-ORD-2-1".into(), "ORD-2".into(), 50.0.into()]);
        details.push_row(vec!["DET-ORD-1-2".into(), "ORD-1".into(), 80.0.into()]);
        db.create_sheet(&details).unwrap();
        db
    }

    #[test]
    fn test_generate_pdf_writes_file_and_link() {
        let db = fixture();
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("invoice.txt");
        fs::write(&template, "Invoice for {{customer_name}}\n{{item.orderdetails_id}} {{item.price}}\n{{qr_code}}").unwrap();

        let config = Config {
            pdf_template: Some(template),
            pdf_folder: Some(dir.path().join("out")),
            pdf_items_sheet: "OrderDetails".to_string(),
            accounting: None,
        };
        let path = generate_pdf(&db, &config, "Orders", "ORD-1").unwrap();
        assert_eq!(path, dir.path().join("out").join("File_2.pdf"));

        let bytes = fs::read(&path).unwrap();
        let pdf = String::from_utf8_lossy(&bytes);
        assert!(pdf.contains("(Invoice for Ada) Tj"));
        assert!(pdf.contains("(DET-ORD-1-1 120) Tj"));
        assert!(pdf.contains("(DET-ORD-1-2 80) Tj"));
        assert!(!pdf.contains("DET-ORD-2-1"));

        let orders = db.get_sheet("Orders").unwrap();
        assert_eq!(orders.value(0, "datasheet_link"), path.display().to_string());
    }

    #[test]
    fn test_generate_pdf_requires_settings() {
        let db = fixture();
        let err = generate_pdf(&db, &Config::default(), "Orders", "ORD-1").unwrap_err();
        assert!(matches!(err, LadError::MissingSetting(ref key) if key == "PDF_TEMPLATE"));
    }

    #[test]
    fn test_sku_names_the_file() {
        let db = Database::open_memory().unwrap();
        let mut product = Sheet::with_headers("Product", &["product_id", "sku_code"]);
        product.push_row(vec!["p1".into(), "OR/PR-3040".into()]);
        db.create_sheet(&product).unwrap();

        let dir = TempDir::new().unwrap();
        let template = dir.path().join("t.txt");
        fs::write(&template, "{{sku_code}}").unwrap();
        let config = Config {
            pdf_template: Some(template),
            pdf_folder: Some(dir.path().to_path_buf()),
            pdf_items_sheet: "OrderDetails".to_string(),
            accounting: None,
        };

        let path = generate_pdf(&db, &config, "Product", "p1").unwrap();
        assert_eq!(path.file_name().unwrap(), "OR_PR-3040.pdf");
    }
}

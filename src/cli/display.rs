use super::ui::{fit, term_size, truncate};
use crate::engine::PropagationReport;
use crate::models::Sheet;

const MIN_COL_WIDTH: usize = 4;
const MAX_COL_WIDTH: usize = 24;

/// Column widths sized to content, capped so wide sheets stay readable
fn column_widths(sheet: &Sheet, rows: usize) -> Vec<usize> {
    (0..sheet.width())
        .map(|col| {
            let content = (0..rows)
                .map(|r| sheet.cell(r, col).to_string().chars().count())
                .max()
                .unwrap_or(0);
            content
                .max(sheet.headers[col].chars().count())
                .clamp(MIN_COL_WIDTH, MAX_COL_WIDTH)
        })
        .collect()
}

/// Print a sheet as a plain table, cut to the terminal width
pub fn print_sheet(sheet: &Sheet, limit: usize) {
    let rows = if limit == 0 { sheet.rows.len() } else { limit.min(sheet.rows.len()) };
    let widths = column_widths(sheet, rows);
    let (term_width, _) = term_size();

    let line = |cells: Vec<String>| {
        let joined = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| fit(c, *w))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", truncate(joined.trim_end(), term_width));
    };

    println!("{}\n", sheet.name);
    line(sheet.headers.clone());
    for row in 0..rows {
        line((0..sheet.width()).map(|c| sheet.cell(row, c).to_string()).collect());
    }
    if rows < sheet.rows.len() {
        println!("\n{}/{} rows", rows, sheet.rows.len());
    }
}

/// Print one record as `header: value` lines, skipping blanks
pub fn print_record(sheet: &Sheet, row: usize) {
    println!("{} {}\n", sheet.name, sheet.row_id(row));
    let width = sheet
        .headers
        .iter()
        .map(|h| h.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_COL_WIDTH);
    for (col, header) in sheet.headers.iter().enumerate().skip(1) {
        let value = sheet.cell(row, col);
        if value.is_blank() {
            continue;
        }
        println!("  {}  {}", fit(header, width), value);
    }
}

pub fn print_report(report: &PropagationReport) {
    println!(
        "{} lookups, {} short values, {} SKUs updated",
        report.lookups, report.short_values, report.skus
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_widths_are_clamped() {
        let mut sheet = Sheet::with_headers("T", &["id", "description"]);
        sheet.push_row(vec!["1".into(), "x".repeat(100).into()]);
        assert_eq!(column_widths(&sheet, 1), vec![MIN_COL_WIDTH, MAX_COL_WIDTH]);
    }
}

//! Posts sales into the separate bookkeeping workbook.

use std::io;
use std::time::Duration;

use crate::config::AccountingConfig;
use crate::db::Database;
use crate::error::{LadError, Result};
use crate::models::{Cell, Sheet};

pub const JOURNAL_SHEET: &str = "Journal";
pub const JOURNAL_HEADERS: &[&str] = &[
    "journal_id",
    "date",
    "reference",
    "description",
    "account",
    "debit",
    "credit",
];

const LEDGER_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// A sale to be booked as one debit and one credit line
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub date: String,
    pub reference: String,
    pub description: String,
    pub amount: f64,
}

/// Append a balanced entry to the ledger's `Journal` sheet and return its ID.
///
/// The ledger file must already exist; a missing file is an error rather
/// than a fresh empty ledger.
pub fn post_entry(config: &AccountingConfig, entry: &JournalEntry) -> Result<String> {
    if !config.workbook.exists() {
        return Err(LadError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("accounting workbook {} not found", config.workbook.display()),
        )));
    }
    let ledger = Database::open_at(&config.workbook)?;
    let journal_id = format!("JRN-{}", entry.reference);

    ledger.with_lock(LEDGER_LOCK_TIMEOUT, |ledger| {
        let journal = ledger.ensure_sheet(JOURNAL_SHEET, JOURNAL_HEADERS)?;
        let lines = vec![
            line(&journal, &journal_id, entry, &config.debit_account, Some(entry.amount), None),
            line(&journal, &journal_id, entry, &config.credit_account, None, Some(entry.amount)),
        ];
        ledger.append_rows(&journal.name, &lines)
    })?;

    log::info!("posted {} to {}", journal_id, config.workbook.display());
    Ok(journal_id)
}

fn line(
    journal: &Sheet,
    journal_id: &str,
    entry: &JournalEntry,
    account: &str,
    debit: Option<f64>,
    credit: Option<f64>,
) -> Vec<Cell> {
    let amount = |v: Option<f64>| v.map(Cell::Number).unwrap_or_default();
    journal.record(&[
        ("journal_id", Cell::text(journal_id)),
        ("date", Cell::text(entry.date.as_str())),
        ("reference", Cell::text(entry.reference.as_str())),
        ("description", Cell::text(entry.description.as_str())),
        ("account", Cell::text(account)),
        ("debit", amount(debit)),
        ("credit", amount(credit)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry() -> JournalEntry {
        JournalEntry {
            date: "2026-03-01".to_string(),
            reference: "ORD-20260301-120000".to_string(),
            description: "Sale to Ada".to_string(),
            amount: 250.0,
        }
    }

    #[test]
    fn test_post_balanced_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        Database::open_at(&path).unwrap();

        let config = AccountingConfig {
            workbook: path.clone(),
            debit_account: "Bank".to_string(),
            credit_account: "Sales".to_string(),
        };
        let id = post_entry(&config, &entry()).unwrap();
        assert_eq!(id, "JRN-ORD-20260301-120000");

        let journal = Database::open_at(&path).unwrap().get_sheet(JOURNAL_SHEET).unwrap();
        assert_eq!(journal.rows.len(), 2);
        assert_eq!(journal.value(0, "account"), "Bank");
        assert_eq!(journal.value(0, "debit"), "250");
        assert_eq!(journal.value(0, "credit"), "");
        assert_eq!(journal.value(1, "account"), "Sales");
        assert_eq!(journal.value(1, "credit"), "250");
    }

    #[test]
    fn test_missing_ledger_fails() {
        let dir = TempDir::new().unwrap();
        let config = AccountingConfig {
            workbook: dir.path().join("nope.db"),
            debit_account: "Bank".to_string(),
            credit_account: "Sales".to_string(),
        };
        assert!(post_entry(&config, &entry()).is_err());
        assert!(!dir.path().join("nope.db").exists());
    }
}

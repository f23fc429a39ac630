use serde::{Deserialize, Serialize};

/// One line of a point-of-sale cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub unit_id: String,
    pub price: f64,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

impl OrderItem {
    pub fn new(unit_id: impl Into<String>, price: f64) -> Self {
        Self {
            unit_id: unit_id.into(),
            price,
            qty: 1,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.qty as f64
    }
}

/// A cart submitted from the order form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub contact_id: String,
    pub items: Vec<OrderItem>,
}

impl OrderPayload {
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// Outcome of mirroring a sale into the bookkeeping workbook
#[derive(Debug, Clone, PartialEq)]
pub enum AccountingSync {
    /// No bookkeeping workbook configured
    Skipped,
    /// Journal entry written; holds the journal ID
    Posted(String),
    /// Post failed; holds the error message
    Failed(String),
}

impl AccountingSync {
    pub const FAILED_MARKER: &'static str = "SYNC_FAILED";

    /// Value recorded in the Transactions sheet
    pub fn marker(&self) -> &str {
        match self {
            Self::Skipped => "",
            Self::Posted(id) => id,
            Self::Failed(_) => Self::FAILED_MARKER,
        }
    }
}

/// What a submitted order produced
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub customer_name: String,
    pub total: f64,
    pub item_count: usize,
    pub accounting: AccountingSync,
}

/// A selectable entry in a form dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedOption {
    pub id: String,
    pub name: String,
}

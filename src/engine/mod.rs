//! Computed-column propagation: lookups, short values and SKU codes.

pub mod columns;
pub mod lookup;
pub mod propagate;
pub mod short_value;
pub mod sku;
pub mod snapshot;

pub use columns::{find_link_column, is_computed, ColumnRef, LinkRegistry, LinkRule};
pub use propagate::{Propagation, PropagationReport};
pub use snapshot::{CachedSheet, WorkbookSnapshot};

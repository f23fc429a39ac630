mod order;
mod sheet;

pub use order::*;
pub use sheet::*;

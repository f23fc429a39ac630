//! Business operations on top of the workbook and the derived-column engine.

pub mod accounting;
pub mod forms;
pub mod interchange;
pub mod inventory;
pub mod invoice;
pub mod orders;
pub mod pdf;
pub mod settings;
pub mod workbook;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod compute;
pub mod display;
pub mod form;
pub mod menu;
pub mod order;
pub mod pdf;
pub mod settings;
pub mod sheet;
pub mod ui;

pub use compute::{run_inventory, run_lookups, run_short_values, run_skus, run_sync};
pub use form::{run_delete, run_form, run_save};
pub use menu::run_menu;
pub use order::run_order;
pub use pdf::run_pdf;
pub use settings::{run_settings, run_validation};
pub use sheet::{run_export, run_import, run_init, run_sheets, run_show};

#[derive(Parser)]
#[command(name = "ladcmd")]
#[command(about = "Studio workbook: contacts, artworks, inventory and sales")]
#[command(version)]
pub struct Cli {
    /// Workbook file (defaults to $LAD_WORKBOOK, then the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub workbook: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the default sheets that are missing
    Init,
    /// List sheets with row counts
    Sheets,
    /// Print a sheet, or one record of it
    Show(ShowArgs),
    /// Create or edit a record interactively
    Form(FormArgs),
    /// Create or update a record from field=value pairs
    Save(SaveArgs),
    /// Delete a record by ID
    Delete(DeleteArgs),
    /// Recompute [Sheet.Field] lookup columns
    Lookups(SheetScopeArgs),
    /// Recompute *_short_value columns
    ShortValues(SheetScopeArgs),
    /// Rebuild SKU codes
    Skus(SheetScopeArgs),
    /// Full sync: lookups, short values, then SKUs
    Sync,
    /// Create missing units for limited-edition products
    Inventory,
    /// Record a sale
    Order(OrderArgs),
    /// Render a record to PDF through the template
    Pdf(PdfArgs),
    /// Read and write the Settings sheet
    Settings(SettingsArgs),
    /// Manage dropdown lists
    Validation(ValidationArgs),
    /// Import a CSV file as a sheet
    Import(ImportArgs),
    /// Export a sheet as CSV
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    pub sheet: String,
    /// Show a single record
    #[arg(short, long)]
    pub id: Option<String>,
    /// Maximum rows to print (0 = all)
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

#[derive(Args)]
pub struct FormArgs {
    pub sheet: String,
    /// Edit this record instead of creating one
    #[arg(short, long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct SaveArgs {
    pub sheet: String,
    /// Record ID; omit to create a new record
    #[arg(short, long)]
    pub id: Option<String>,
    /// Field values as column=value
    #[arg(value_name = "COLUMN=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub sheet: String,
    pub id: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SheetScopeArgs {
    /// Limit to one sheet
    pub sheet: Option<String>,
}

#[derive(Args)]
pub struct OrderArgs {
    /// Customer contact ID (blank for a walk-in sale)
    #[arg(short, long, default_value = "")]
    pub contact: String,
    /// Cart line as unit_id[:price[:qty]]; price defaults to the unit's price
    #[arg(short = 'u', long = "unit", value_name = "UNIT")]
    pub units: Vec<String>,
}

#[derive(Args)]
pub struct PdfArgs {
    pub sheet: String,
    pub id: String,
}

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one setting
    Get { key: String },
    /// Set or overwrite a setting
    Set { key: String, value: String },
    /// Print all settings
    List,
}

#[derive(Args)]
pub struct ValidationArgs {
    #[command(subcommand)]
    pub action: ValidationAction,
}

#[derive(Subcommand)]
pub enum ValidationAction {
    /// Set the allowed values of a column (none removes the list)
    Set {
        sheet: String,
        column: String,
        options: Vec<String>,
    },
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// Target sheet (defaults to the file name)
    #[arg(short, long)]
    pub sheet: Option<String>,
    /// Overwrite an existing sheet instead of appending
    #[arg(short, long)]
    pub replace: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    pub sheet: String,
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use clap::Parser;
use ladcmd::cli::{
    run_delete, run_export, run_form, run_import, run_init, run_inventory, run_lookups, run_menu,
    run_order, run_pdf, run_save, run_settings, run_sheets, run_short_values, run_show, run_skus,
    run_sync, run_validation, Cli, Commands,
};
use ladcmd::config::workbook_path;
use ladcmd::db::Database;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let path = workbook_path(cli.workbook)?;
    log::debug!("workbook: {}", path.display());
    let db = Database::open_at(&path)?;

    match cli.command {
        None => {
            // No subcommand provided - show interactive menu
            run_menu(&db)?;
        }
        Some(Commands::Init) => run_init(&db)?,
        Some(Commands::Sheets) => run_sheets(&db)?,
        Some(Commands::Show(args)) => {
            run_show(&db, &args.sheet, args.id.as_deref(), args.limit)?;
        }
        Some(Commands::Form(args)) => run_form(&db, &args.sheet, args.id.as_deref())?,
        Some(Commands::Save(args)) => {
            run_save(&db, &args.sheet, args.id.as_deref(), &args.fields)?;
        }
        Some(Commands::Delete(args)) => run_delete(&db, &args.sheet, &args.id, args.force)?,
        Some(Commands::Lookups(args)) => run_lookups(&db, args.sheet.as_deref())?,
        Some(Commands::ShortValues(args)) => run_short_values(&db, args.sheet.as_deref())?,
        Some(Commands::Skus(args)) => run_skus(&db, args.sheet.as_deref())?,
        Some(Commands::Sync) => run_sync(&db)?,
        Some(Commands::Inventory) => run_inventory(&db)?,
        Some(Commands::Order(args)) => run_order(&db, &args.contact, &args.units)?,
        Some(Commands::Pdf(args)) => run_pdf(&db, &args.sheet, &args.id)?,
        Some(Commands::Settings(args)) => run_settings(&db, &args.action)?,
        Some(Commands::Validation(args)) => run_validation(&db, &args.action)?,
        Some(Commands::Import(args)) => {
            run_import(&db, &args.file, args.sheet.as_deref(), args.replace)?;
        }
        Some(Commands::Export(args)) => run_export(&db, &args.sheet, args.output.as_deref())?,
    }

    Ok(())
}

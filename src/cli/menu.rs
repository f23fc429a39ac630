//! Main menu for ladcmd
//!
//! Uses inquire for clean, reliable terminal interaction.

use anyhow::{anyhow, Result};
use inquire::Select;
use std::io::{self, IsTerminal};

use crate::cli::ui::{clear_screen, minimal_render_config, select, text_input, wait_for_continue};
use crate::cli::{
    run_delete, run_form, run_inventory, run_order, run_pdf, run_settings, run_sheets, run_show,
    run_sync, SettingsAction,
};
use crate::db::Database;

/// Menu options with type-safe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Sheets,
    Show,
    New,
    Edit,
    Delete,
    Order,
    Inventory,
    Sync,
    Pdf,
    Settings,
    Quit,
}

impl MenuOption {
    const ALL: &'static [MenuOption] = &[
        MenuOption::Sheets,
        MenuOption::Show,
        MenuOption::New,
        MenuOption::Edit,
        MenuOption::Delete,
        MenuOption::Order,
        MenuOption::Inventory,
        MenuOption::Sync,
        MenuOption::Pdf,
        MenuOption::Settings,
        MenuOption::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuOption::Sheets => "Sheets",
            MenuOption::Show => "Show",
            MenuOption::New => "New Record",
            MenuOption::Edit => "Edit Record",
            MenuOption::Delete => "Delete Record",
            MenuOption::Order => "Order",
            MenuOption::Inventory => "Sync Inventory",
            MenuOption::Sync => "Sync All",
            MenuOption::Pdf => "Generate PDF",
            MenuOption::Settings => "Settings",
            MenuOption::Quit => "Quit",
        }
    }

    fn from_label(s: &str) -> Option<MenuOption> {
        MenuOption::ALL.iter().find(|opt| opt.label() == s).copied()
    }
}

/// Run the interactive main menu
pub fn run_menu(db: &Database) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(anyhow!(
            "Interactive menu requires a terminal. Use subcommands for non-interactive use:\n  \
            ladcmd sheets\n  \
            ladcmd show <sheet>\n  \
            ladcmd save <sheet> column=value...\n  \
            Run 'ladcmd --help' for all options."
        ));
    }

    let menu_labels: Vec<&str> = MenuOption::ALL.iter().map(|opt| opt.label()).collect();

    loop {
        let _ = clear_screen();

        let selection = Select::new("ladcmd", menu_labels.clone())
            .with_render_config(minimal_render_config())
            .with_page_size(menu_labels.len())
            .with_vim_mode(true)
            .prompt_skippable();

        // Ctrl+C or terminal trouble ends the session quietly
        let Ok(Some(choice_label)) = selection else {
            return Ok(());
        };
        let Some(choice) = MenuOption::from_label(choice_label) else {
            continue;
        };
        if choice == MenuOption::Quit {
            return Ok(());
        }

        let _ = clear_screen();
        if let Err(e) = execute_command(db, choice) {
            eprintln!("\nError: {}", e);
        }
        wait_for_continue();
    }
}

fn execute_command(db: &Database, choice: MenuOption) -> Result<()> {
    match choice {
        MenuOption::Sheets => run_sheets(db),
        MenuOption::Show => match pick_sheet(db)? {
            Some(sheet) => run_show(db, &sheet, None, 0),
            None => Ok(()),
        },
        MenuOption::New => match pick_sheet(db)? {
            Some(sheet) => run_form(db, &sheet, None),
            None => Ok(()),
        },
        MenuOption::Edit => match pick_record(db)? {
            Some((sheet, id)) => run_form(db, &sheet, Some(&id)),
            None => Ok(()),
        },
        MenuOption::Delete => match pick_record(db)? {
            Some((sheet, id)) => run_delete(db, &sheet, &id, false),
            None => Ok(()),
        },
        MenuOption::Order => run_order(db, "", &[]),
        MenuOption::Inventory => run_inventory(db),
        MenuOption::Sync => run_sync(db),
        MenuOption::Pdf => match pick_record(db)? {
            Some((sheet, id)) => run_pdf(db, &sheet, &id),
            None => Ok(()),
        },
        MenuOption::Settings => run_settings(db, &SettingsAction::List),
        MenuOption::Quit => Ok(()),
    }
}

fn pick_sheet(db: &Database) -> Result<Option<String>> {
    let names = db.list_sheets()?;
    Ok(select("sheet:", &names)?.map(|i| names[i].clone()))
}

fn pick_record(db: &Database) -> Result<Option<(String, String)>> {
    let Some(sheet) = pick_sheet(db)? else {
        return Ok(None);
    };
    let id = text_input("id: ", None)?.unwrap_or_default();
    if id.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some((sheet, id.trim().to_string())))
}

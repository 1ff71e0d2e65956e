use anyhow::Result;
use colored::Colorize;

use slidenav::Theme;
use slidenav::config::Config;
use slidenav::store::{FileStore, PreferenceStore};
use slidenav::theme::ThemeManager;

use crate::cli::ThemeCommands;

pub fn run(command: ThemeCommands) -> Result<()> {
    let config = Config::load_or_default();
    let manager = ThemeManager::new(config.deck_options().storage_key);
    let mut store = FileStore::open_default()?;

    match command {
        ThemeCommands::Show => {
            let stored = store.get(manager.storage_key());
            println!(
                "{} {}",
                "Stored preference:".bold(),
                stored.as_deref().unwrap_or("none")
            );
            println!(
                "{} {}",
                "Decks open with:".bold(),
                manager.initial(&store, config.system_theme())
            );
            println!("{}", store.path().display().to_string().dimmed());
        }
        ThemeCommands::Set { theme } => {
            let theme = Theme::from(theme);
            store.set(manager.storage_key(), theme.name())?;
            println!("{} {theme}", "Theme set to".green());
        }
        ThemeCommands::Toggle => {
            let next = manager.initial(&store, config.system_theme()).toggled();
            store.set(manager.storage_key(), next.name())?;
            println!("{} {next}", "Theme set to".green());
        }
        ThemeCommands::Reset => {
            store.remove(manager.storage_key())?;
            println!(
                "{}",
                "Theme preference cleared; decks follow the system scheme.".green()
            );
        }
    }
    Ok(())
}

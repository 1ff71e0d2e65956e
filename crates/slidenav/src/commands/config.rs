use anyhow::Result;
use colored::Colorize;

use slidenav::config::Config;

use crate::cli::ConfigCommands;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();
    let options = config.deck_options();

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "  (not created yet, showing defaults)".dimmed());
    }
    println!();
    println!("  deck.container_id  {}", config.container_id());
    println!("  deck.breakpoint    {}", options.breakpoint);
    println!("  theme.storage_key  {}", options.storage_key);
    println!(
        "  theme.system       {}",
        config
            .system_theme()
            .map_or_else(|| "none".to_string(), |t| t.to_string())
    );
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let path = Config::path()?;
    let mut config = Config::load_from(&path)?;
    config.set(key, value)?;
    config.save_to(&path)?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}

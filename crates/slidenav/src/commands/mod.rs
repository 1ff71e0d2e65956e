pub mod completion;
pub mod config;
pub mod inspect;
pub mod play;
pub mod theme;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use slidenav::config::Config;
use slidenav::document::MemoryDocument;

/// Read and scan a deck file, bound to the configured container.
pub fn load_document(file: &Path, config: &Config) -> Result<MemoryDocument> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    MemoryDocument::parse(&content, config.container_id())
        .with_context(|| format!("No deck container in {}", file.display()))
}

pub fn print_version() {
    println!(
        "{} {}",
        "slidenav".bold(),
        env!("CARGO_PKG_VERSION").green()
    );
}

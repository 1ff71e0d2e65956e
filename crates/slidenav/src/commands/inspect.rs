use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use slidenav::config::Config;
use slidenav::deck::{ACTIVE_CLASS, Deck};
use slidenav::store::MemoryStore;
use slidenav::view::DeckView;

use super::load_document;

const TITLE_WIDTH: usize = 48;

struct SlideRow {
    title: String,
    marked_active: bool,
    phases: Option<usize>,
}

pub fn run(file: &Path, hash: Option<&str>) -> Result<()> {
    let config = Config::load_or_default();
    let mut doc = load_document(file, &config)?;
    if let Some(hash) = hash {
        doc = doc.with_fragment(hash);
    }

    let rows: Vec<SlideRow> = (0..doc.slide_count())
        .map(|i| SlideRow {
            title: doc
                .slide_title(i)
                .map(|t| truncate(&t, TITLE_WIDTH))
                .unwrap_or_else(|| "(untitled)".to_string()),
            marked_active: doc.slide_has_class(i, ACTIVE_CLASS),
            phases: doc
                .is_compare(i)
                .then(|| slidenav::deck::phase::max_phase(&doc.staged_classes(i))),
        })
        .collect();

    let Some(deck) = Deck::mount(
        doc,
        MemoryStore::default(),
        config.deck_options(),
        config.system_theme(),
    ) else {
        anyhow::bail!("No slides found in {}", file.display());
    };
    let state = deck.state();

    let compare = rows.iter().filter(|r| r.phases.is_some()).count();
    println!(
        "{} ({} slides, {} with staged reveal)",
        file.display().to_string().bold(),
        rows.len(),
        compare
    );
    println!();

    for (i, row) in rows.iter().enumerate() {
        let marker = if i == state.index { "\u{25B6}" } else { " " };
        let phases = match row.phases {
            Some(n) => format!("{n} phase(s)").cyan().to_string(),
            None => String::new(),
        };
        let active = if row.marked_active {
            "marked active".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {:>3}  {:<width$}  {}{}",
            marker.green().bold(),
            i,
            row.title,
            phases,
            active,
            width = TITLE_WIDTH
        );
    }

    println!();
    println!(
        "Opens on slide {} ({}) with the {} theme",
        state.index.to_string().bold(),
        deck.view().fragment(),
        state.theme
    );
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

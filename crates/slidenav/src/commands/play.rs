use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use slidenav::config::Config;
use slidenav::deck::{Action, Deck};
use slidenav::document::MemoryDocument;
use slidenav::input::{ClickTarget, FocusTarget, KeyInput};
use slidenav::store::{FileStore, MemoryStore, PreferenceStore};
use slidenav::view::DeckView;
use slidenav::{DeckState, Theme};

use super::load_document;

type PlayDeck = Deck<MemoryDocument, Box<dyn PreferenceStore>>;

pub struct PlayArgs {
    pub file: PathBuf,
    pub events: Vec<String>,
    pub hash: Option<String>,
    pub width: f64,
    pub system: Option<Theme>,
    pub persist: bool,
    pub json: bool,
}

/// One simulated input, parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyInput),
    /// Click on the background of the current slide.
    Click,
    ClickId(String),
    ClickSlide(usize),
    ClickStaged,
    Hash(String),
    Resize(f64),
    ToggleTheme,
    System(Theme),
    DenyFullscreen,
}

impl FromStr for Event {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };
        match (kind, arg) {
            ("key", Some(arg)) => Ok(Event::Key(parse_key(arg)?)),
            ("click", None) => Ok(Event::Click),
            ("click", Some("staged")) => Ok(Event::ClickStaged),
            ("click", Some(arg)) => {
                if let Some(id) = arg.strip_prefix('#') {
                    Ok(Event::ClickId(id.to_string()))
                } else if let Some(n) = arg.strip_prefix("slide=") {
                    let n = n
                        .parse()
                        .with_context(|| format!("Invalid slide number in {s:?}"))?;
                    Ok(Event::ClickSlide(n))
                } else {
                    anyhow::bail!("Unknown click target in {s:?}")
                }
            }
            ("hash", Some(fragment)) => Ok(Event::Hash(fragment.to_string())),
            ("resize", Some(width)) => {
                let width = width
                    .parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .ok_or_else(|| anyhow::anyhow!("Invalid width in {s:?}"))?;
                Ok(Event::Resize(width))
            }
            ("theme", None) => Ok(Event::ToggleTheme),
            ("system", Some(name)) => Theme::from_name(name)
                .map(Event::System)
                .ok_or_else(|| anyhow::anyhow!("Invalid system theme in {s:?}")),
            ("fullscreen-deny", None) => Ok(Event::DenyFullscreen),
            _ => anyhow::bail!("Unknown event {s:?}. Run `slidenav play --help` for the grammar."),
        }
    }
}

fn parse_key(arg: &str) -> Result<KeyInput> {
    let (key, target) = match arg.split_once('@') {
        Some((key, target)) => (key, Some(target)),
        None => (arg, None),
    };
    let key = match key {
        "" => anyhow::bail!("Missing key name"),
        "Space" => " ",
        other => other,
    };
    let input = KeyInput::new(key);
    Ok(match target {
        None => input,
        Some("editable") => input.on(FocusTarget::new("div", true)),
        Some(tag) => input.on(FocusTarget::new(tag, false)),
    })
}

/// Final deck state after a replay.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: DeckState,
    pub slides: usize,
    pub fullscreen: bool,
    pub compare: bool,
    pub phase: usize,
    pub max_phase: usize,
    pub fragment: String,
}

impl Snapshot {
    fn of(deck: &PlayDeck) -> Self {
        let state = *deck.state();
        Self {
            slides: deck.slide_count(),
            fullscreen: deck.view().is_fullscreen(),
            compare: deck.is_compare(state.index),
            phase: deck.current_phase(state.index),
            max_phase: deck.max_phase(state.index),
            fragment: deck.view().fragment(),
            state,
        }
    }
}

/// Apply one event the way the browser binding's listener for it would.
pub fn apply(deck: &mut PlayDeck, event: &Event) -> Result<()> {
    debug!(?event, "replay");
    match event {
        Event::Key(input) => {
            deck.handle_key(input);
        }
        Event::Click => {
            let target = ClickTarget::chrome(Some(deck.state().index));
            deck.handle_click(&target);
        }
        Event::ClickId(id) => {
            let node = deck
                .view()
                .find_by_id(id)
                .ok_or_else(|| anyhow::anyhow!("No element with id \"{id}\""))?;
            let target = deck.view().click_target(node);
            deck.handle_click(&target);
        }
        Event::ClickSlide(n) => {
            if *n >= deck.slide_count() {
                anyhow::bail!("Slide {n} does not exist");
            }
            deck.handle_click(&ClickTarget::chrome(Some(*n)));
        }
        Event::ClickStaged => {
            let index = deck.state().index;
            let node = deck
                .view()
                .first_staged(index)
                .ok_or_else(|| anyhow::anyhow!("Slide {index} has no staged content"))?;
            let target = deck.view().click_target(node);
            deck.handle_click(&target);
        }
        Event::Hash(fragment) => {
            deck.view_mut().set_fragment(fragment);
            deck.update(Action::FragmentChanged);
        }
        Event::Resize(width) => {
            deck.view_mut().set_viewport_width(*width);
            deck.update(Action::Resized);
        }
        Event::ToggleTheme => {
            if !deck.view().has_theme_toggle() {
                anyhow::bail!("Deck has no #theme-toggle control");
            }
            deck.update(Action::ToggleTheme);
        }
        Event::System(theme) => deck.update(Action::SystemThemeChanged(*theme)),
        Event::DenyFullscreen => deck.view_mut().deny_fullscreen(),
    }
    Ok(())
}

/// Mount `doc` and replay `events` against it.
pub fn replay(
    doc: MemoryDocument,
    store: Box<dyn PreferenceStore>,
    config: &Config,
    system: Option<Theme>,
    events: &[Event],
) -> Result<Snapshot> {
    let mut deck = Deck::mount(doc, store, config.deck_options(), system)
        .ok_or_else(|| anyhow::anyhow!("No slides found"))?;
    for event in events {
        apply(&mut deck, event)?;
    }
    Ok(Snapshot::of(&deck))
}

pub fn run(args: PlayArgs) -> Result<()> {
    let config = Config::load_or_default();
    let events = args
        .events
        .iter()
        .map(|e| e.parse())
        .collect::<Result<Vec<Event>>>()?;

    let mut doc = load_document(&args.file, &config)?.with_viewport_width(args.width);
    if let Some(hash) = &args.hash {
        doc = doc.with_fragment(hash);
    }

    let store: Box<dyn PreferenceStore> = if args.persist {
        Box::new(FileStore::open_default()?)
    } else {
        Box::new(MemoryStore::default())
    };
    let system = args.system.or_else(|| config.system_theme());

    let snapshot = replay(doc, store, &config, system, &events)
        .with_context(|| format!("Failed to play {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    let state = &snapshot.state;
    println!(
        "{} {} of {}  {}",
        "Slide".bold(),
        state.index.to_string().green().bold(),
        snapshot.slides.saturating_sub(1),
        snapshot.fragment.dimmed()
    );
    if snapshot.compare {
        println!(
            "{} {} of {}",
            "Phase".bold(),
            snapshot.phase,
            snapshot.max_phase
        );
    }
    let flag = |on: bool| if on { "on".green() } else { "off".dimmed() };
    println!("{} {}", "Overview".bold(), flag(state.overview));
    println!("{} {}", "Mobile".bold(), flag(state.mobile));
    println!("{} {}", "Fullscreen".bold(), flag(snapshot.fullscreen));
    println!("{} {}", "Theme".bold(), state.theme);
}

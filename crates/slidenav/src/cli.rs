use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use slidenav::Theme;

#[derive(Parser)]
#[command(name = "slidenav")]
#[command(author, version, about)]
#[command(long_about = "Keyboard, pointer and theme navigation for static HTML slide decks.\n\n\
    Inspect a deck, or replay input against it without a browser.\n\n\
    Examples:\n  \
    slidenav talk.html                          List slides and reveal phases\n  \
    slidenav play talk.html key:End key:Home    Replay key presses\n  \
    slidenav theme set light                    Store a theme preference")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// HTML deck to inspect
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a deck's slides, reveal phases and opening slide
    Inspect {
        /// HTML deck to inspect
        file: PathBuf,

        /// URL fragment the deck is opened with (e.g. "#3")
        #[arg(long)]
        hash: Option<String>,
    },

    /// Replay input events against a deck and print the resulting state
    #[command(long_about = "Replay input events against a deck and print the resulting state.\n\n\
        Events:\n  \
        key:<Key>[@<tag>|@editable]   Key press, e.g. key:ArrowRight, key:Space, key:o@input\n  \
        click                         Click on the current slide's background\n  \
        click:#<id>                   Click on the element with that id\n  \
        click:slide=<n>               Click on slide n\n  \
        click:staged                  Click on staged content of the current slide\n  \
        hash:<fragment>               Navigate to a URL fragment\n  \
        resize:<px>                   Resize the viewport\n  \
        theme                         Press the theme toggle\n  \
        system:<light|dark>           Change the system colour scheme\n  \
        fullscreen-deny               Refuse further fullscreen requests")]
    Play {
        /// HTML deck to play
        file: PathBuf,

        /// Events to replay, in order
        events: Vec<String>,

        /// URL fragment the deck is opened with
        #[arg(long)]
        hash: Option<String>,

        /// Viewport width in CSS pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// System colour scheme
        #[arg(long, value_enum)]
        system: Option<ThemeArg>,

        /// Read and write the stored theme preference instead of a throwaway one
        #[arg(long)]
        persist: bool,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the stored theme preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    /// Show the stored preference and the theme a deck would open with
    Show,

    /// Store a preference
    Set {
        #[arg(value_enum)]
        theme: ThemeArg,
    },

    /// Flip the current theme and store it
    Toggle,

    /// Forget the stored preference
    Reset,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. deck.container_id, deck.breakpoint, theme.storage_key)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Inspect { file, hash }) => {
                crate::commands::inspect::run(&file, hash.as_deref())
            }
            Some(Commands::Play {
                file,
                events,
                hash,
                width,
                system,
                persist,
                json,
            }) => crate::commands::play::run(crate::commands::play::PlayArgs {
                file,
                events,
                hash,
                width,
                system: system.map(Theme::from),
                persist,
                json,
            }),
            Some(Commands::Theme { command }) => crate::commands::theme::run(command),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::print_version();
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    crate::commands::inspect::run(&file, None)
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::deck::{DEFAULT_BREAKPOINT, DeckOptions};
use crate::theme::{DEFAULT_STORAGE_KEY, Theme};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidenav";

pub const DEFAULT_CONTAINER_ID: &str = "deck";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<DeckConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    /// Id of the element holding the slides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,

    /// Viewport width in CSS pixels at or below which the deck is in mobile mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,

    /// Colour scheme the command-line tool reports as the system preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<Theme>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// A missing file is the default config. A file that exists and does not
    /// parse is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Self::default()),
            Ok(contents) => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Defaults when there is no config file. An unreadable one is reported
    /// and ignored.
    pub fn load_or_default() -> Self {
        match Self::path().and_then(|p| Self::load_from(&p)) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e:#}; using default configuration");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidenav configuration\n{yaml}");
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn container_id(&self) -> &str {
        self.deck
            .as_ref()
            .and_then(|d| d.container_id.as_deref())
            .unwrap_or(DEFAULT_CONTAINER_ID)
    }

    pub fn system_theme(&self) -> Option<Theme> {
        self.theme.as_ref().and_then(|t| t.system)
    }

    pub fn deck_options(&self) -> DeckOptions {
        DeckOptions {
            breakpoint: self
                .deck
                .as_ref()
                .and_then(|d| d.breakpoint)
                .unwrap_or(DEFAULT_BREAKPOINT),
            storage_key: self
                .theme
                .as_ref()
                .and_then(|t| t.storage_key.clone())
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "deck.container_id" => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    anyhow::bail!("Invalid container id: {value:?}. Must be a non-empty HTML id.");
                }
                self.deck
                    .get_or_insert_with(DeckConfig::default)
                    .container_id = Some(value.to_string());
            }
            "deck.breakpoint" => {
                let breakpoint = value
                    .parse::<f64>()
                    .ok()
                    .filter(|b| b.is_finite() && *b > 0.0)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid breakpoint: {value}. Must be a positive width in pixels."
                        )
                    })?;
                self.deck
                    .get_or_insert_with(DeckConfig::default)
                    .breakpoint = Some(breakpoint);
            }
            "theme.storage_key" => {
                if value.is_empty() {
                    anyhow::bail!("Invalid storage key: must not be empty.");
                }
                self.theme
                    .get_or_insert_with(ThemeConfig::default)
                    .storage_key = Some(value.to_string());
            }
            "theme.system" => {
                let system = match value {
                    "none" => None,
                    _ => Some(Theme::from_name(value).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid system theme: {value}. Must be 'light', 'dark', or 'none'."
                        )
                    })?),
                };
                self.theme.get_or_insert_with(ThemeConfig::default).system = system;
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: deck.container_id, deck.breakpoint, theme.storage_key, theme.system"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.container_id(), "deck");
        assert_eq!(config.deck_options(), DeckOptions::default());
        assert_eq!(config.system_theme(), None);
    }

    #[test]
    fn test_set_valid_keys() {
        let mut config = Config::default();
        config.set("deck.container_id", "slides").unwrap();
        config.set("deck.breakpoint", "640").unwrap();
        config.set("theme.storage_key", "talk-theme").unwrap();
        config.set("theme.system", "light").unwrap();

        assert_eq!(config.container_id(), "slides");
        let options = config.deck_options();
        assert_eq!(options.breakpoint, 640.0);
        assert_eq!(options.storage_key, "talk-theme");
        assert_eq!(config.system_theme(), Some(Theme::Light));

        config.set("theme.system", "none").unwrap();
        assert_eq!(config.system_theme(), None);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("deck.container_id", "").is_err());
        assert!(config.set("deck.container_id", "my deck").is_err());
        assert!(config.set("deck.breakpoint", "wide").is_err());
        assert!(config.set("deck.breakpoint", "-5").is_err());
        assert!(config.set("theme.storage_key", "").is_err());
        assert!(config.set("theme.system", "sepia").is_err());
        assert!(config.set("deck.transition", "fade").is_err());
    }

    #[test]
    fn test_yaml_round_trip_skips_unset() {
        let mut config = Config::default();
        config.set("deck.breakpoint", "700").unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("breakpoint: 700"));
        assert!(!yaml.contains("theme"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.deck_options().breakpoint, 700.0);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.container_id(), DEFAULT_CONTAINER_ID);
    }

    #[test]
    fn test_load_rejects_unparseable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "deck: [unterminated\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_set_and_save_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slidenav").join("config.yaml");

        let mut config = Config::load_from(&path).unwrap();
        config.set("deck.container_id", "slides").unwrap();
        config.save_to(&path).unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.set("deck.breakpoint", "640").unwrap();
        config.save_to(&path).unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.container_id(), "slides");
        assert_eq!(saved.deck_options().breakpoint, 640.0);
    }
}

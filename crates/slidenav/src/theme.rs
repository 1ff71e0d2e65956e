use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::store::PreferenceStore;
use crate::view::ThemeSurface;

pub const DEFAULT_STORAGE_KEY: &str = "slides-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Strict lookup used for user input.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Interpret a stored preference. An empty value counts as unset and
    /// anything other than `light` falls back to dark.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "" => None,
            "light" => Some(Self::Light),
            _ => Some(Self::Dark),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored preference first, then the system colour scheme, then dark.
    pub fn resolve(stored: Option<&str>, system: Option<Theme>) -> Self {
        stored
            .and_then(Self::from_stored)
            .or(system)
            .unwrap_or_default()
    }

    /// Value of the root `data-theme` attribute. Dark is the stylesheet
    /// default, so it removes the attribute.
    pub fn root_attribute(self) -> Option<&'static str> {
        match self {
            Self::Light => Some("light"),
            Self::Dark => None,
        }
    }

    /// Icon shown on the toggle control: it points at the other theme.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Self::Light => "\u{1F319}",
            Self::Dark => "\u{2600}\u{FE0F}",
        }
    }

    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "Switch to dark theme",
            Self::Dark => "Switch to light theme",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Owns the storage key and the rules for when a theme change is persisted.
#[derive(Debug, Clone)]
pub struct ThemeManager {
    storage_key: String,
}

impl ThemeManager {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn stored(&self, store: &impl PreferenceStore) -> Option<Theme> {
        store
            .get(&self.storage_key)
            .and_then(|value| Theme::from_stored(&value))
    }

    pub fn initial(&self, store: &impl PreferenceStore, system: Option<Theme>) -> Theme {
        let stored = store.get(&self.storage_key);
        Theme::resolve(stored.as_deref(), system)
    }

    /// Flip `current`, apply it and persist the choice. A failed write still
    /// leaves the new theme applied for this session.
    pub fn toggle(
        &self,
        current: Theme,
        surface: &mut impl ThemeSurface,
        store: &mut impl PreferenceStore,
    ) -> Theme {
        let next = current.toggled();
        apply(surface, next);
        if let Err(e) = store.set(&self.storage_key, next.name()) {
            debug!(error = %e, "theme preference not saved");
        }
        next
    }

    /// Mirror a system colour-scheme change, unless the user picked a theme.
    pub fn system_changed(
        &self,
        system: Theme,
        surface: &mut impl ThemeSurface,
        store: &impl PreferenceStore,
    ) -> Option<Theme> {
        if self.stored(store).is_some() {
            trace!(%system, "system theme change ignored, preference stored");
            return None;
        }
        apply(surface, system);
        Some(system)
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY)
    }
}

pub fn apply(surface: &mut impl ThemeSurface, theme: Theme) {
    surface.set_root_theme(theme.root_attribute());
    if !surface.set_theme_toggle(theme.toggle_icon(), theme.toggle_label()) {
        trace!("no theme toggle control");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct Root {
        attr: Option<String>,
        toggle: Option<(String, String)>,
        has_toggle: bool,
    }

    impl ThemeSurface for Root {
        fn set_root_theme(&mut self, value: Option<&str>) {
            self.attr = value.map(str::to_string);
        }

        fn set_theme_toggle(&mut self, icon: &str, label: &str) -> bool {
            if self.has_toggle {
                self.toggle = Some((icon.to_string(), label.to_string()));
            }
            self.has_toggle
        }
    }

    #[test]
    fn test_resolve_order() {
        assert_eq!(Theme::resolve(Some("light"), Some(Theme::Dark)), Theme::Light);
        assert_eq!(Theme::resolve(Some("dark"), Some(Theme::Light)), Theme::Dark);
        assert_eq!(Theme::resolve(None, Some(Theme::Light)), Theme::Light);
        assert_eq!(Theme::resolve(None, None), Theme::Dark);
    }

    #[test]
    fn test_stored_garbage_is_dark_and_empty_is_unset() {
        assert_eq!(Theme::resolve(Some("sepia"), Some(Theme::Light)), Theme::Dark);
        assert_eq!(Theme::resolve(Some(""), Some(Theme::Light)), Theme::Light);
    }

    #[test]
    fn test_apply_sets_attribute_and_toggle() {
        let mut root = Root {
            has_toggle: true,
            ..Default::default()
        };
        apply(&mut root, Theme::Light);
        assert_eq!(root.attr.as_deref(), Some("light"));
        let (icon, label) = root.toggle.clone().unwrap();
        assert_eq!(icon, "\u{1F319}");
        assert_eq!(label, "Switch to dark theme");

        apply(&mut root, Theme::Dark);
        assert_eq!(root.attr, None);
        assert_eq!(root.toggle.unwrap().1, "Switch to light theme");
    }

    #[test]
    fn test_apply_without_toggle_still_sets_root() {
        let mut root = Root::default();
        apply(&mut root, Theme::Light);
        assert_eq!(root.attr.as_deref(), Some("light"));
        assert!(root.toggle.is_none());
    }

    #[test]
    fn test_toggle_persists() {
        let manager = ThemeManager::default();
        let mut root = Root::default();
        let mut store = MemoryStore::default();
        let next = manager.toggle(Theme::Dark, &mut root, &mut store);
        assert_eq!(next, Theme::Light);
        assert_eq!(store.get(DEFAULT_STORAGE_KEY).as_deref(), Some("light"));
        assert_eq!(manager.initial(&store, Some(Theme::Dark)), Theme::Light);
    }

    #[test]
    fn test_system_change_only_without_preference() {
        let manager = ThemeManager::default();
        let mut root = Root::default();
        let mut store = MemoryStore::default();
        assert_eq!(
            manager.system_changed(Theme::Light, &mut root, &store),
            Some(Theme::Light)
        );
        assert_eq!(root.attr.as_deref(), Some("light"));

        manager.toggle(Theme::Light, &mut root, &mut store);
        assert_eq!(manager.system_changed(Theme::Light, &mut root, &store), None);
        assert_eq!(root.attr, None);
    }
}

pub mod phase;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::fragment;
use crate::input::{self, ClickRoute, ClickTarget, KeyInput};
use crate::store::PreferenceStore;
use crate::theme::{self, Theme, ThemeManager};
use crate::view::{DeckView, Surface, ThemeSurface};

pub const ACTIVE_CLASS: &str = "active";
pub const OVERVIEW_CLASS: &str = "overview";
pub const MOBILE_CLASS: &str = "mobile";
pub const DEFAULT_BREAKPOINT: f64 = 820.0;

/// Every state change the deck accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Prev,
    First,
    Last,
    Jump(usize),
    /// Reveal the next phase of the current compare slide, if any is left.
    AdvancePhase,
    ToggleOverview,
    ToggleFullscreen,
    /// Leave overview and fullscreen.
    ExitModes,
    /// The URL fragment changed outside the deck's control.
    FragmentChanged,
    Resized,
    ToggleTheme,
    SystemThemeChanged(Theme),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckOptions {
    /// Viewport widths at or below this are mobile.
    pub breakpoint: f64,
    pub storage_key: String,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            breakpoint: DEFAULT_BREAKPOINT,
            storage_key: theme::DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeckState {
    pub index: usize,
    pub overview: bool,
    pub mobile: bool,
    pub theme: Theme,
}

/// How `set_index` treats the fragment and the destination's phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexSync {
    /// Ordinary navigation: write the fragment, reset phases.
    Navigate,
    /// Following a fragment change: reset phases, leave the fragment alone.
    FromFragment,
    /// First activation on mount: write the fragment, keep phases.
    Mount,
}

/// Controller for one deck. Owns the state and funnels every mutation
/// through [`Deck::update`].
pub struct Deck<V, S> {
    view: V,
    store: S,
    options: DeckOptions,
    themes: ThemeManager,
    state: DeckState,
}

impl<V, S> Deck<V, S>
where
    V: DeckView + ThemeSurface,
    S: PreferenceStore,
{
    /// Bind to a view. Returns `None` when the view has no slides.
    pub fn mount(view: V, store: S, options: DeckOptions, system: Option<Theme>) -> Option<Self> {
        let count = view.slide_count();
        if count == 0 {
            warn!("deck has no slides, navigation disabled");
            return None;
        }

        let index = (0..count)
            .find(|&i| view.slide_classes(i).iter().any(|c| c == ACTIVE_CLASS))
            .or_else(|| fragment::parse_index(&view.fragment(), count))
            .unwrap_or(0);

        let themes = ThemeManager::new(options.storage_key.clone());
        let mut deck = Self {
            view,
            store,
            options,
            themes,
            state: DeckState {
                index,
                overview: false,
                mobile: false,
                theme: Theme::default(),
            },
        };

        for i in 0..count {
            deck.reset_phases(i);
        }
        deck.set_index(index, IndexSync::Mount);
        deck.apply_responsive();

        let initial = deck.themes.initial(&deck.store, system);
        theme::apply(&mut deck.view, initial);
        deck.state.theme = initial;

        debug!(slides = count, index, theme = %initial, "deck mounted");
        Some(deck)
    }

    pub fn update(&mut self, action: Action) {
        trace!(?action, "update");
        match action {
            Action::Next => self.next(),
            Action::Prev => self.set_index(self.state.index.saturating_sub(1), IndexSync::Navigate),
            Action::First => self.set_index(0, IndexSync::Navigate),
            Action::Last => self.set_index(self.last_index(), IndexSync::Navigate),
            Action::Jump(n) => self.set_index(n, IndexSync::Navigate),
            Action::AdvancePhase => {
                self.advance_within_slide();
            }
            Action::ToggleOverview => self.set_overview(!self.state.overview),
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::ExitModes => {
                self.set_overview(false);
                if self.view.is_fullscreen() {
                    if let Err(e) = self.view.exit_fullscreen() {
                        debug!(error = %e, "exit fullscreen failed");
                    }
                }
            }
            Action::FragmentChanged => {
                match fragment::parse_index(&self.view.fragment(), self.slide_count()) {
                    Some(n) => self.set_index(n, IndexSync::FromFragment),
                    None => trace!("fragment names no slide"),
                }
            }
            Action::Resized => self.apply_responsive(),
            Action::ToggleTheme => {
                self.state.theme =
                    self.themes
                        .toggle(self.state.theme, &mut self.view, &mut self.store);
            }
            Action::SystemThemeChanged(system) => {
                if let Some(theme) = self.themes.system_changed(system, &mut self.view, &self.store)
                {
                    self.state.theme = theme;
                }
            }
        }
    }

    /// Route a key press. Returns whether the browser default should be prevented.
    pub fn handle_key(&mut self, key: &KeyInput) -> bool {
        match input::route_key(key) {
            Some(binding) => {
                self.update(binding.action);
                binding.prevent_default
            }
            None => false,
        }
    }

    /// Route a click. Returns whether the browser default should be prevented.
    pub fn handle_click(&mut self, target: &ClickTarget) -> bool {
        let index = self.state.index;
        let route = input::route_click(
            target,
            self.state.overview,
            index,
            self.view.is_compare(index),
        );
        trace!(?route, "click");
        match route {
            ClickRoute::Select(n) => self.update(Action::Jump(n)),
            ClickRoute::AdvancePhase => self.update(Action::AdvancePhase),
            ClickRoute::Next => self.update(Action::Next),
            ClickRoute::Native => {}
        }
        route.prevents_default()
    }

    pub fn state(&self) -> &DeckState {
        &self.state
    }

    pub fn slide_count(&self) -> usize {
        self.view.slide_count()
    }

    pub fn current_phase(&self, index: usize) -> usize {
        phase::current_phase(&self.view.slide_classes(index))
    }

    pub fn max_phase(&self, index: usize) -> usize {
        phase::max_phase(&self.view.staged_classes(index))
    }

    pub fn is_compare(&self, index: usize) -> bool {
        self.view.is_compare(index)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// For simulating platform changes (viewport, fragment) before the
    /// matching action is dispatched.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_parts(self) -> (V, S) {
        (self.view, self.store)
    }

    fn last_index(&self) -> usize {
        self.slide_count().saturating_sub(1)
    }

    fn next(&mut self) {
        if !self.advance_within_slide() {
            self.set_index(self.state.index.saturating_add(1), IndexSync::Navigate);
        }
    }

    /// Reveal one more phase on the current slide. Returns `false` when the
    /// slide is not a compare slide or is fully revealed.
    fn advance_within_slide(&mut self) -> bool {
        let index = self.state.index;
        if !self.view.is_compare(index) {
            return false;
        }
        let current = self.current_phase(index);
        let max = self.max_phase(index);
        if current >= max {
            return false;
        }
        self.view
            .set_slide_class(index, &phase::phase_class(current + 1), true);
        debug!(index, phase = current + 1, max, "phase advanced");
        true
    }

    fn reset_phases(&mut self, index: usize) {
        if !self.view.is_compare(index) {
            return;
        }
        for class in self.view.slide_classes(index) {
            if phase::is_phase_class(&class) {
                self.view.set_slide_class(index, &class, false);
            }
        }
        self.view
            .set_slide_class(index, &phase::phase_class(1), true);
    }

    fn set_index(&mut self, n: usize, sync: IndexSync) {
        let index = n.min(self.last_index());
        self.state.index = index;
        for i in 0..self.slide_count() {
            self.view.set_slide_class(i, ACTIVE_CLASS, i == index);
        }
        if sync != IndexSync::Mount {
            self.reset_phases(index);
        }
        self.set_overview(false);
        if sync != IndexSync::FromFragment {
            self.view.replace_fragment(&fragment::format_index(index));
        }
        if self.is_mobile_viewport() {
            self.view.scroll_slide_into_view(index);
        }
        debug!(index, ?sync, "slide activated");
    }

    fn set_overview(&mut self, on: bool) {
        self.state.overview = on;
        self.view.set_surface_class(Surface::Body, OVERVIEW_CLASS, on);
        self.view
            .set_surface_class(Surface::Container, OVERVIEW_CLASS, on);
    }

    fn toggle_fullscreen(&mut self) {
        let result = if self.view.is_fullscreen() {
            self.view.exit_fullscreen()
        } else {
            self.view.request_fullscreen()
        };
        if let Err(e) = result {
            debug!(error = %e, "fullscreen change refused");
        }
    }

    fn is_mobile_viewport(&self) -> bool {
        self.view.viewport_width() <= self.options.breakpoint
    }

    fn apply_responsive(&mut self) {
        let mobile = self.is_mobile_viewport();
        if mobile != self.state.mobile {
            debug!(mobile, "responsive mode changed");
        }
        self.state.mobile = mobile;
        self.view
            .set_surface_class(Surface::Container, MOBILE_CLASS, mobile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::store::MemoryStore;

    const PLAIN: &str = r#"
        <body>
          <div id="deck">
            <section class="slide">Zero</section>
            <section class="slide">One</section>
            <section class="slide">Two</section>
            <section class="slide">Three</section>
          </div>
        </body>"#;

    const COMPARE: &str = r#"
        <body>
          <button id="theme-toggle"><span class="sr-only">Toggle theme</span></button>
          <div id="deck">
            <section class="slide">Intro</section>
            <section class="slide phase-2" data-compare>
              <div class="phase-content phase-1">Before</div>
              <div class="phase-content phase-2"><a href="x">After</a></div>
              <div class="phase-content phase-3">Verdict</div>
            </section>
            <section class="slide">Outro</section>
          </div>
        </body>"#;

    fn mount(html: &str) -> Deck<MemoryDocument, MemoryStore> {
        let doc = MemoryDocument::parse(html, "deck").unwrap();
        Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap()
    }

    fn active_count(deck: &Deck<MemoryDocument, MemoryStore>) -> usize {
        (0..deck.slide_count())
            .filter(|&i| deck.view().slide_has_class(i, ACTIVE_CLASS))
            .count()
    }

    #[test]
    fn test_mount_defaults_to_first_slide() {
        let deck = mount(PLAIN);
        assert_eq!(deck.state().index, 0);
        assert_eq!(active_count(&deck), 1);
        assert_eq!(deck.view().fragment(), "#0");
        assert_eq!(deck.state().theme, Theme::Dark);
    }

    #[test]
    fn test_mount_prefers_marked_active_slide_over_fragment() {
        let html = PLAIN.replace(
            r#"<section class="slide">Two"#,
            r#"<section class="slide active">Two"#,
        );
        let doc = MemoryDocument::parse(&html, "deck")
            .unwrap()
            .with_fragment("#1");
        let deck = Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap();
        assert_eq!(deck.state().index, 2);
        assert_eq!(deck.view().fragment(), "#2");
    }

    #[test]
    fn test_mount_reads_fragment() {
        let doc = MemoryDocument::parse(PLAIN, "deck")
            .unwrap()
            .with_fragment("#2");
        let deck = Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap();
        assert_eq!(deck.state().index, 2);

        let doc = MemoryDocument::parse(PLAIN, "deck")
            .unwrap()
            .with_fragment("#40");
        let deck = Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap();
        assert_eq!(deck.state().index, 3);
    }

    #[test]
    fn test_mount_without_slides() {
        let doc = MemoryDocument::parse(r#"<div id="deck"></div>"#, "deck").unwrap();
        assert!(Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).is_none());
    }

    #[test]
    fn test_mount_resets_compare_slides_to_phase_one() {
        let deck = mount(COMPARE);
        assert_eq!(deck.current_phase(1), 1);
        assert!(deck.view().slide_has_class(1, "phase-1"));
        assert!(!deck.view().slide_has_class(1, "phase-2"));
        assert!(!deck.view().slide_has_class(0, "phase-1"));
    }

    #[test]
    fn test_jump_clamps() {
        let mut deck = mount(PLAIN);
        for n in [0, 1, 2, 3, 4, 17, usize::MAX] {
            deck.update(Action::Jump(n));
            assert_eq!(deck.state().index, n.min(3));
            assert_eq!(active_count(&deck), 1);
        }
    }

    #[test]
    fn test_next_and_prev_clamp_at_edges() {
        let mut deck = mount(PLAIN);
        deck.update(Action::Prev);
        assert_eq!(deck.state().index, 0);

        deck.update(Action::Last);
        deck.update(Action::Next);
        assert_eq!(deck.state().index, 3);
        assert_eq!(active_count(&deck), 1);

        deck.update(Action::First);
        assert_eq!(deck.state().index, 0);
    }

    #[test]
    fn test_compare_slide_phases_before_advance() {
        let mut deck = mount(COMPARE);
        deck.update(Action::Next);
        assert_eq!(deck.state().index, 1);
        assert_eq!(deck.max_phase(1), 3);
        assert_eq!(deck.current_phase(1), 1);

        deck.update(Action::Next);
        assert_eq!((deck.state().index, deck.current_phase(1)), (1, 2));
        deck.update(Action::Next);
        assert_eq!((deck.state().index, deck.current_phase(1)), (1, 3));
        deck.update(Action::Next);
        assert_eq!(deck.state().index, 2);
    }

    #[test]
    fn test_navigation_resets_destination_phases() {
        let mut deck = mount(COMPARE);
        deck.update(Action::Jump(1));
        deck.update(Action::Next);
        deck.update(Action::Next);
        assert_eq!(deck.current_phase(1), 3);

        deck.update(Action::Next);
        deck.update(Action::Prev);
        assert_eq!(deck.state().index, 1);
        assert_eq!(deck.current_phase(1), 1);
    }

    #[test]
    fn test_prev_leaves_departed_slide_phases() {
        let mut deck = mount(COMPARE);
        deck.update(Action::Jump(1));
        deck.update(Action::Next);
        deck.update(Action::Prev);
        assert_eq!(deck.state().index, 0);
        assert!(deck.view().slide_has_class(1, "phase-2"));
    }

    #[test]
    fn test_navigation_writes_fragment_without_history() {
        let mut deck = mount(PLAIN);
        let history = deck.view().history_len();
        deck.update(Action::Jump(2));
        assert_eq!(deck.view().fragment(), "#2");
        assert_eq!(deck.view().history_len(), history);
    }

    #[test]
    fn test_fragment_change_syncs_without_rewrite() {
        let mut deck = mount(PLAIN);
        let writes = deck.view().fragment_writes();
        deck.view_mut().set_fragment("#3");
        deck.update(Action::FragmentChanged);
        assert_eq!(deck.state().index, 3);
        assert_eq!(deck.view().fragment_writes(), writes);

        deck.view_mut().set_fragment("#notes");
        deck.update(Action::FragmentChanged);
        assert_eq!(deck.state().index, 3);
    }

    #[test]
    fn test_overview_toggle_and_selection() {
        let mut deck = mount(PLAIN);
        deck.update(Action::ToggleOverview);
        assert!(deck.state().overview);
        assert!(deck.view().body_has_class(OVERVIEW_CLASS));
        assert!(deck.view().container_has_class(OVERVIEW_CLASS));

        let prevented = deck.handle_click(&ClickTarget::chrome(Some(2)));
        assert!(!prevented);
        assert_eq!(deck.state().index, 2);
        assert!(!deck.state().overview);
        assert!(!deck.view().body_has_class(OVERVIEW_CLASS));
        assert!(!deck.view().container_has_class(OVERVIEW_CLASS));
    }

    #[test]
    fn test_navigation_exits_overview() {
        let mut deck = mount(PLAIN);
        deck.update(Action::ToggleOverview);
        deck.update(Action::Next);
        assert!(!deck.state().overview);
        assert_eq!(deck.state().index, 1);
    }

    #[test]
    fn test_click_on_chrome_advances() {
        let mut deck = mount(PLAIN);
        assert!(deck.handle_click(&ClickTarget::chrome(Some(0))));
        assert_eq!(deck.state().index, 1);
    }

    #[test]
    fn test_click_on_staged_content_advances_phase_only() {
        let mut deck = mount(COMPARE);
        deck.update(Action::Jump(1));
        let node = deck.view().first_staged(1).unwrap();
        let target = deck.view().click_target(node);
        assert!(deck.handle_click(&target));
        assert_eq!(deck.current_phase(1), 2);
        assert!(deck.handle_click(&target));
        assert!(deck.handle_click(&target));
        assert_eq!(deck.state().index, 1);
        assert_eq!(deck.current_phase(1), 3);
    }

    #[test]
    fn test_keys_drive_deck() {
        let mut deck = mount(PLAIN);
        assert!(deck.handle_key(&KeyInput::new("End")));
        assert_eq!(deck.state().index, 3);
        assert!(deck.handle_key(&KeyInput::new("Backspace")));
        assert_eq!(deck.state().index, 2);
        assert!(!deck.handle_key(&KeyInput::new("o")));
        assert!(deck.state().overview);
        deck.handle_key(&KeyInput::new("Escape"));
        assert!(!deck.state().overview);

        let typing = KeyInput::new("ArrowRight").on(input::FocusTarget::new("input", false));
        assert!(!deck.handle_key(&typing));
        assert_eq!(deck.state().index, 2);
    }

    #[test]
    fn test_fullscreen_toggle_and_refusal() {
        let mut deck = mount(PLAIN);
        deck.update(Action::ToggleFullscreen);
        assert!(deck.view().is_fullscreen());
        deck.update(Action::ExitModes);
        assert!(!deck.view().is_fullscreen());

        deck.view_mut().deny_fullscreen();
        deck.update(Action::ToggleFullscreen);
        assert!(!deck.view().is_fullscreen());
        assert_eq!(deck.view().fullscreen_refusals(), 1);
        assert_eq!(deck.state().index, 0);
    }

    #[test]
    fn test_rejected_fullscreen_is_retried_on_next_toggle() {
        let mut deck = mount(PLAIN);
        deck.view_mut().deny_fullscreen();
        deck.update(Action::ToggleFullscreen);
        deck.update(Action::ToggleFullscreen);
        assert!(!deck.view().is_fullscreen());
        assert_eq!(deck.view().fullscreen_refusals(), 2);
    }

    #[test]
    fn test_unsupported_fullscreen_is_swallowed() {
        let mut deck = mount(PLAIN);
        deck.view_mut().disable_fullscreen();
        deck.update(Action::ToggleFullscreen);
        assert!(!deck.view().is_fullscreen());
        assert_eq!(deck.view().fullscreen_refusals(), 0);
        assert!(!deck.state().overview);
    }

    #[test]
    fn test_responsive_mode_follows_viewport() {
        let doc = MemoryDocument::parse(PLAIN, "deck")
            .unwrap()
            .with_viewport_width(600.0);
        let mut deck =
            Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap();
        assert!(deck.state().mobile);
        assert!(deck.view().container_has_class(MOBILE_CLASS));
        assert_eq!(deck.view().scrolled_to(), &[0]);

        deck.update(Action::Next);
        assert_eq!(deck.view().scrolled_to(), &[0, 1]);

        deck.view_mut().set_viewport_width(1280.0);
        deck.update(Action::Resized);
        assert!(!deck.state().mobile);
        assert!(!deck.view().container_has_class(MOBILE_CLASS));
        deck.update(Action::Next);
        assert_eq!(deck.view().scrolled_to(), &[0, 1]);
    }

    #[test]
    fn test_breakpoint_is_inclusive() {
        let doc = MemoryDocument::parse(PLAIN, "deck")
            .unwrap()
            .with_viewport_width(DEFAULT_BREAKPOINT);
        let deck = Deck::mount(doc, MemoryStore::default(), DeckOptions::default(), None).unwrap();
        assert!(deck.state().mobile);
    }

    #[test]
    fn test_theme_toggle_survives_remount() {
        let mut deck = mount(COMPARE);
        assert_eq!(deck.view().toggle_label(), Some("Switch to light theme"));
        deck.update(Action::ToggleTheme);
        assert_eq!(deck.state().theme, Theme::Light);
        assert_eq!(deck.view().root_theme(), Some("light"));
        assert_eq!(deck.view().toggle_label(), Some("Switch to dark theme"));

        let (_, store) = deck.into_parts();
        let doc = MemoryDocument::parse(COMPARE, "deck").unwrap();
        let deck = Deck::mount(doc, store, DeckOptions::default(), Some(Theme::Dark)).unwrap();
        assert_eq!(deck.state().theme, Theme::Light);
    }

    #[test]
    fn test_system_theme_applies_until_user_chooses() {
        let doc = MemoryDocument::parse(PLAIN, "deck").unwrap();
        let mut deck = Deck::mount(
            doc,
            MemoryStore::default(),
            DeckOptions::default(),
            Some(Theme::Light),
        )
        .unwrap();
        assert_eq!(deck.state().theme, Theme::Light);

        deck.update(Action::SystemThemeChanged(Theme::Dark));
        assert_eq!(deck.state().theme, Theme::Dark);

        deck.update(Action::ToggleTheme);
        deck.update(Action::SystemThemeChanged(Theme::Dark));
        assert_eq!(deck.state().theme, Theme::Light);
        assert_eq!(deck.view().root_theme(), Some("light"));
    }
}

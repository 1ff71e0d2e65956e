//! Maps raw keyboard and pointer input to deck actions.
//!
//! Both routers are pure: they look at a description of the event target and
//! the relevant deck state, and say what should happen. The controller and the
//! browser binding do the rest.

use crate::deck::Action;

const FORM_CONTROLS: &[&str] = &["input", "textarea", "select", "button"];
const INTERACTIVE_TAGS: &[&str] = &["a", "input", "textarea", "select", "button", "label"];

/// The element that has keyboard focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    /// Lowercase tag name.
    pub tag: String,
    pub editable: bool,
}

impl FocusTarget {
    pub fn new(tag: &str, editable: bool) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            editable,
        }
    }

    pub fn body() -> Self {
        Self::new("body", false)
    }

    /// Keys typed here belong to the control, not the deck.
    pub fn captures_keys(&self) -> bool {
        self.editable || FORM_CONTROLS.contains(&self.tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// `KeyboardEvent.key` value, e.g. `ArrowRight` or `" "`.
    pub key: String,
    pub target: FocusTarget,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: FocusTarget::body(),
        }
    }

    pub fn on(mut self, target: FocusTarget) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub action: Action,
    pub prevent_default: bool,
}

pub fn route_key(input: &KeyInput) -> Option<KeyBinding> {
    if input.target.captures_keys() {
        return None;
    }
    let navigate = |action| {
        Some(KeyBinding {
            action,
            prevent_default: true,
        })
    };
    let toggle = |action| {
        Some(KeyBinding {
            action,
            prevent_default: false,
        })
    };
    match input.key.as_str() {
        "ArrowRight" | "PageDown" | " " => navigate(Action::Next),
        "ArrowLeft" | "PageUp" | "Backspace" => navigate(Action::Prev),
        "Home" => navigate(Action::First),
        "End" => navigate(Action::Last),
        "Escape" => toggle(Action::ExitModes),
        key if key.eq_ignore_ascii_case("f") => toggle(Action::ToggleFullscreen),
        key if key.eq_ignore_ascii_case("o") => toggle(Action::ToggleOverview),
        _ => None,
    }
}

/// What a pointer click landed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    /// Lowercase tag name of the clicked element.
    pub tag: String,
    pub editable: bool,
    /// Index of the slide containing the element, if any.
    pub slide: Option<usize>,
    /// The element is, or sits inside, a link or button.
    pub in_link_or_button: bool,
    /// The element is, or sits inside, staged reveal content.
    pub in_staged: bool,
}

impl ClickTarget {
    /// A click on plain deck chrome inside `slide`.
    pub fn chrome(slide: Option<usize>) -> Self {
        Self {
            tag: "div".to_string(),
            slide,
            ..Default::default()
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.editable
            || INTERACTIVE_TAGS.contains(&self.tag.as_str())
            || self.in_link_or_button
            || self.in_staged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickRoute {
    /// Overview selection of a slide.
    Select(usize),
    AdvancePhase,
    Next,
    /// Leave the click to its native behaviour.
    Native,
}

impl ClickRoute {
    pub fn prevents_default(self) -> bool {
        matches!(self, Self::AdvancePhase | Self::Next)
    }
}

pub fn route_click(
    target: &ClickTarget,
    overview: bool,
    current: usize,
    current_is_compare: bool,
) -> ClickRoute {
    if overview {
        return target.slide.map_or(ClickRoute::Native, ClickRoute::Select);
    }
    if !target.is_interactive() {
        return ClickRoute::Next;
    }
    if current_is_compare && target.in_staged && target.slide == Some(current) {
        ClickRoute::AdvancePhase
    } else {
        ClickRoute::Native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(key: &str) -> Option<Action> {
        route_key(&KeyInput::new(key)).map(|b| b.action)
    }

    #[test]
    fn test_key_table() {
        for key in ["ArrowRight", "PageDown", " "] {
            assert_eq!(action(key), Some(Action::Next), "{key:?}");
        }
        for key in ["ArrowLeft", "PageUp", "Backspace"] {
            assert_eq!(action(key), Some(Action::Prev), "{key:?}");
        }
        assert_eq!(action("Home"), Some(Action::First));
        assert_eq!(action("End"), Some(Action::Last));
        assert_eq!(action("f"), Some(Action::ToggleFullscreen));
        assert_eq!(action("F"), Some(Action::ToggleFullscreen));
        assert_eq!(action("o"), Some(Action::ToggleOverview));
        assert_eq!(action("O"), Some(Action::ToggleOverview));
        assert_eq!(action("Escape"), Some(Action::ExitModes));
        assert_eq!(action("x"), None);
        assert_eq!(action("ArrowUp"), None);
    }

    #[test]
    fn test_navigation_keys_prevent_default() {
        assert!(route_key(&KeyInput::new("ArrowRight")).unwrap().prevent_default);
        assert!(route_key(&KeyInput::new("End")).unwrap().prevent_default);
        assert!(!route_key(&KeyInput::new("o")).unwrap().prevent_default);
        assert!(!route_key(&KeyInput::new("Escape")).unwrap().prevent_default);
    }

    #[test]
    fn test_keys_ignored_in_form_controls() {
        for tag in ["input", "TEXTAREA", "select", "button"] {
            let input = KeyInput::new("ArrowRight").on(FocusTarget::new(tag, false));
            assert_eq!(route_key(&input), None, "{tag}");
        }
        let editable = KeyInput::new(" ").on(FocusTarget::new("div", true));
        assert_eq!(route_key(&editable), None);

        let link = KeyInput::new("ArrowRight").on(FocusTarget::new("a", false));
        assert!(route_key(&link).is_some());
    }

    #[test]
    fn test_click_overview_selects() {
        let target = ClickTarget::chrome(Some(4));
        assert_eq!(route_click(&target, true, 0, false), ClickRoute::Select(4));
        let outside = ClickTarget::chrome(None);
        assert_eq!(route_click(&outside, true, 0, false), ClickRoute::Native);
    }

    #[test]
    fn test_click_chrome_advances() {
        let target = ClickTarget::chrome(Some(0));
        let route = route_click(&target, false, 0, false);
        assert_eq!(route, ClickRoute::Next);
        assert!(route.prevents_default());
    }

    #[test]
    fn test_click_interactive_is_native() {
        let link = ClickTarget {
            tag: "a".to_string(),
            slide: Some(0),
            ..Default::default()
        };
        assert_eq!(route_click(&link, false, 0, true), ClickRoute::Native);

        let inside_button = ClickTarget {
            tag: "span".to_string(),
            slide: Some(0),
            in_link_or_button: true,
            ..Default::default()
        };
        assert_eq!(route_click(&inside_button, false, 0, false), ClickRoute::Native);
    }

    #[test]
    fn test_click_staged_advances_phase_on_current_compare() {
        let staged = ClickTarget {
            tag: "div".to_string(),
            slide: Some(2),
            in_staged: true,
            ..Default::default()
        };
        assert_eq!(route_click(&staged, false, 2, true), ClickRoute::AdvancePhase);
        assert_eq!(route_click(&staged, false, 2, false), ClickRoute::Native);
        assert_eq!(route_click(&staged, false, 1, true), ClickRoute::Native);
    }
}

//! Render targets the deck controller drives.
//!
//! A view exposes the fixed slide list and the handful of document-level
//! switches the controller toggles. The browser binding implements these on
//! the live DOM; `MemoryDocument` implements them on a scanned HTML tree.

use anyhow::Result;

/// Elements other than slides that carry mode classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Container,
    Body,
}

pub trait DeckView {
    fn slide_count(&self) -> usize;

    fn slide_classes(&self, index: usize) -> Vec<String>;

    fn set_slide_class(&mut self, index: usize, class: &str, on: bool);

    /// Whether the slide opted into staged reveal.
    fn is_compare(&self, index: usize) -> bool;

    /// Class lists of every staged-content element inside the slide.
    fn staged_classes(&self, index: usize) -> Vec<Vec<String>>;

    fn set_surface_class(&mut self, surface: Surface, class: &str, on: bool);

    /// Current URL fragment, including the leading `#` when present.
    fn fragment(&self) -> String;

    /// Rewrite the fragment in place, without a new history entry.
    fn replace_fragment(&mut self, fragment: &str);

    fn viewport_width(&self) -> f64;

    fn scroll_slide_into_view(&mut self, index: usize);

    fn is_fullscreen(&self) -> bool;

    /// Ask for fullscreen. A refusal that arrives later (a rejected
    /// promise) is handled by the view; only an immediate failure is
    /// returned.
    fn request_fullscreen(&mut self) -> Result<()>;

    fn exit_fullscreen(&mut self) -> Result<()>;
}

pub trait ThemeSurface {
    /// `None` removes the root theme attribute.
    fn set_root_theme(&mut self, value: Option<&str>);

    /// Update the toggle control. Returns `false` when there is none.
    fn set_theme_toggle(&mut self, icon: &str, label: &str) -> bool;
}

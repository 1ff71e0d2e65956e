//! An in-memory stand-in for the browser document.
//!
//! `MemoryDocument` scans an HTML deck once, then tracks the mutable parts the
//! controller touches: slide classes, the container and body mode classes, the
//! root theme attribute, the toggle control, the URL fragment, viewport width
//! and fullscreen.

pub mod html;

use anyhow::Result;

use crate::deck::phase::STAGED_CLASS;
use crate::input::ClickTarget;
use crate::view::{DeckView, Surface, ThemeSurface};
use html::{HtmlTree, NodeId};

pub const SLIDE_CLASS: &str = "slide";
pub const COMPARE_ATTR: &str = "data-compare";
pub const THEME_TOGGLE_ID: &str = "theme-toggle";
const SR_ONLY_CLASS: &str = "sr-only";
const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

#[derive(Debug, Clone)]
struct ToggleControl {
    icon: String,
    /// Present only when the control has a screen-reader label element.
    label: Option<String>,
}

/// How the document answers fullscreen requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullscreenPolicy {
    Grant,
    /// The request is issued and later rejected, as a browser does without
    /// a user gesture or permission.
    Reject,
    /// The request fails on the spot, as where the API is missing.
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    tree: HtmlTree,
    slides: Vec<NodeId>,
    slide_classes: Vec<Vec<String>>,
    container_classes: Vec<String>,
    body_classes: Vec<String>,
    root_theme: Option<String>,
    toggle: Option<ToggleControl>,
    fragment: String,
    history_len: usize,
    fragment_writes: usize,
    viewport_width: f64,
    fullscreen: bool,
    fullscreen_policy: FullscreenPolicy,
    fullscreen_refusals: usize,
    scrolled_to: Vec<usize>,
}

impl MemoryDocument {
    /// Scan `html` and bind to the element with id `container_id`.
    pub fn parse(html: &str, container_id: &str) -> Result<Self> {
        let tree = HtmlTree::parse(html);
        let container = tree
            .find_by_id(container_id)
            .ok_or_else(|| anyhow::anyhow!("No element with id \"{container_id}\""))?;

        let slides = tree.descendants_with_class(container, SLIDE_CLASS);
        let slide_classes = slides.iter().map(|&n| tree.node(n).classes()).collect();
        let container_classes = tree.node(container).classes();
        let body_classes = tree
            .find_by_tag("body")
            .map(|n| tree.node(n).classes())
            .unwrap_or_default();
        let root_theme = tree
            .find_by_tag("html")
            .and_then(|n| tree.node(n).attr("data-theme"))
            .map(str::to_string);
        let toggle = tree.find_by_id(THEME_TOGGLE_ID).map(|n| {
            let label = tree
                .descendants_with_class(n, SR_ONLY_CLASS)
                .first()
                .map(|&sr| tree.text(sr));
            ToggleControl {
                icon: tree.text(n),
                label,
            }
        });

        Ok(Self {
            tree,
            slides,
            slide_classes,
            container_classes,
            body_classes,
            root_theme,
            toggle,
            fragment: String::new(),
            history_len: 1,
            fragment_writes: 0,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            fullscreen: false,
            fullscreen_policy: FullscreenPolicy::Grant,
            fullscreen_refusals: 0,
            scrolled_to: Vec::new(),
        })
    }

    /// Fragment present before the deck mounts, as if loaded from the URL.
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.fragment = normalize_fragment(fragment);
        self
    }

    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = width;
        self
    }

    /// Navigate to a new fragment the way a link or the address bar would,
    /// pushing a history entry.
    pub fn set_fragment(&mut self, fragment: &str) {
        self.fragment = normalize_fragment(fragment);
        self.history_len += 1;
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    /// Reject further fullscreen requests after they are issued.
    pub fn deny_fullscreen(&mut self) {
        self.fullscreen_policy = FullscreenPolicy::Reject;
    }

    /// Make further fullscreen requests fail immediately.
    pub fn disable_fullscreen(&mut self) {
        self.fullscreen_policy = FullscreenPolicy::Unsupported;
    }

    /// Requests that were issued and then rejected.
    pub fn fullscreen_refusals(&self) -> usize {
        self.fullscreen_refusals
    }

    pub fn slide_has_class(&self, index: usize, class: &str) -> bool {
        self.slide_classes
            .get(index)
            .is_some_and(|classes| classes.iter().any(|c| c == class))
    }

    pub fn container_has_class(&self, class: &str) -> bool {
        self.container_classes.iter().any(|c| c == class)
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.iter().any(|c| c == class)
    }

    pub fn root_theme(&self) -> Option<&str> {
        self.root_theme.as_deref()
    }

    pub fn has_theme_toggle(&self) -> bool {
        self.toggle.is_some()
    }

    pub fn toggle_icon(&self) -> Option<&str> {
        self.toggle.as_ref().map(|t| t.icon.as_str())
    }

    pub fn toggle_label(&self) -> Option<&str> {
        self.toggle.as_ref().and_then(|t| t.label.as_deref())
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn fragment_writes(&self) -> usize {
        self.fragment_writes
    }

    /// Slides scrolled into view, in order.
    pub fn scrolled_to(&self) -> &[usize] {
        &self.scrolled_to
    }

    pub fn slide_node(&self, index: usize) -> Option<NodeId> {
        self.slides.get(index).copied()
    }

    pub fn slide_title(&self, index: usize) -> Option<String> {
        let node = self.slide_node(index)?;
        let heading = self
            .tree
            .descendants(node)
            .into_iter()
            .find(|&n| matches!(self.tree.node(n).tag.as_str(), "h1" | "h2" | "h3"))
            .unwrap_or(node);
        let text = self.tree.text(heading);
        (!text.is_empty()).then_some(text)
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_by_id(id)
    }

    /// First staged-content element of a slide.
    pub fn first_staged(&self, index: usize) -> Option<NodeId> {
        let slide = self.slide_node(index)?;
        self.tree
            .descendants_with_class(slide, STAGED_CLASS)
            .first()
            .copied()
    }

    /// Describe a click on `node` the way the browser binding describes DOM
    /// event targets.
    pub fn click_target(&self, node: NodeId) -> ClickTarget {
        let element = self.tree.node(node);
        let slide = self
            .tree
            .closest(node, |n| n.has_class(SLIDE_CLASS))
            .and_then(|s| self.slides.iter().position(|&n| n == s));
        ClickTarget {
            tag: element.tag.clone(),
            editable: element.is_editable(),
            slide,
            in_link_or_button: self
                .tree
                .closest(node, |n| n.tag == "a" || n.tag == "button")
                .is_some(),
            in_staged: self
                .tree
                .closest(node, |n| n.has_class(STAGED_CLASS))
                .is_some(),
        }
    }
}

fn normalize_fragment(fragment: &str) -> String {
    if fragment.is_empty() || fragment.starts_with('#') {
        fragment.to_string()
    } else {
        format!("#{fragment}")
    }
}

fn toggle_class(classes: &mut Vec<String>, class: &str, on: bool) {
    let present = classes.iter().any(|c| c == class);
    if on && !present {
        classes.push(class.to_string());
    } else if !on && present {
        classes.retain(|c| c != class);
    }
}

impl DeckView for MemoryDocument {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide_classes(&self, index: usize) -> Vec<String> {
        self.slide_classes.get(index).cloned().unwrap_or_default()
    }

    fn set_slide_class(&mut self, index: usize, class: &str, on: bool) {
        if let Some(classes) = self.slide_classes.get_mut(index) {
            toggle_class(classes, class, on);
        }
    }

    fn is_compare(&self, index: usize) -> bool {
        self.slide_node(index)
            .is_some_and(|n| self.tree.node(n).has_attr(COMPARE_ATTR))
    }

    fn staged_classes(&self, index: usize) -> Vec<Vec<String>> {
        let Some(slide) = self.slide_node(index) else {
            return Vec::new();
        };
        self.tree
            .descendants_with_class(slide, STAGED_CLASS)
            .into_iter()
            .map(|n| self.tree.node(n).classes())
            .collect()
    }

    fn set_surface_class(&mut self, surface: Surface, class: &str, on: bool) {
        match surface {
            Surface::Container => toggle_class(&mut self.container_classes, class, on),
            Surface::Body => toggle_class(&mut self.body_classes, class, on),
        }
    }

    fn fragment(&self) -> String {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, fragment: &str) {
        self.fragment = normalize_fragment(fragment);
        self.fragment_writes += 1;
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn scroll_slide_into_view(&mut self, index: usize) {
        self.scrolled_to.push(index);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        match self.fullscreen_policy {
            FullscreenPolicy::Grant => self.fullscreen = true,
            FullscreenPolicy::Reject => self.fullscreen_refusals += 1,
            FullscreenPolicy::Unsupported => anyhow::bail!("Fullscreen is not supported"),
        }
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = false;
        Ok(())
    }
}

impl ThemeSurface for MemoryDocument {
    fn set_root_theme(&mut self, value: Option<&str>) {
        self.root_theme = value.map(str::to_string);
    }

    fn set_theme_toggle(&mut self, icon: &str, label: &str) -> bool {
        let Some(toggle) = self.toggle.as_mut() else {
            return false;
        };
        toggle.icon = icon.to_string();
        if toggle.label.is_some() {
            toggle.label = Some(label.to_string());
        }
        true
    }
}

//! Browser binding.
//!
//! Binds a [`Deck`] to the live DOM: `DomView` implements the render-target
//! traits on `web-sys` elements, `LocalStore` keeps the theme preference in
//! `localStorage`, and [`mount`] wires keyboard, click, fragment, resize,
//! theme-toggle and colour-scheme listeners that live for the page lifetime.
//!
//! Log output goes to the browser console at `warn` unless the page URL
//! carries `?slidenav-log=<level>`.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use js_sys::Promise;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlElement, KeyboardEvent, MediaQueryList, MediaQueryListEvent,
    MouseEvent, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Storage, Window,
};

use crate::config::DEFAULT_CONTAINER_ID;
use crate::deck::phase::STAGED_CLASS;
use crate::deck::{Action, Deck, DeckOptions};
use crate::document::{COMPARE_ATTR, SLIDE_CLASS, THEME_TOGGLE_ID};
use crate::input::{ClickTarget, FocusTarget, KeyInput};
use crate::store::PreferenceStore;
use crate::theme::Theme;
use crate::view::{DeckView, Surface, ThemeSurface};

const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";
const LOG_PARAM: &str = "slidenav-log";

type WebDeck = Rc<RefCell<Deck<DomView, LocalStore>>>;

thread_local! {
    static MOUNTED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(method, catch, js_name = requestFullscreen)]
    fn request_fullscreen_promise(this: &Element) -> std::result::Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = exitFullscreen)]
    fn exit_fullscreen_promise(this: &Document) -> std::result::Result<Promise, JsValue>;
}

/// Attach a rejection handler so a refused request is logged instead of
/// surfacing as an unhandled rejection.
fn settle_quietly(promise: &Promise, what: &'static str) {
    let on_reject = Closure::once(move |err: JsValue| {
        debug!(error = ?err, "{what} refused");
    });
    let _ = promise.catch(&on_reject);
    on_reject.forget();
}

fn js_error(value: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{value:?}")
}

fn class_list(el: &Element) -> Vec<String> {
    el.class_name()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub struct DomView {
    window: Window,
    document: Document,
    root: Element,
    body: Option<HtmlElement>,
    container: Element,
    slides: Vec<Element>,
    toggle: Option<Element>,
}

impl DomView {
    /// Returns `None` when the page has no element with `container_id`.
    pub fn bind(window: Window, container_id: &str) -> Option<Self> {
        let document = window.document()?;
        let root = document.document_element()?;
        let container = document.get_element_by_id(container_id)?;

        let mut slides = Vec::new();
        if let Ok(list) = container.query_selector_all(&format!(".{SLIDE_CLASS}")) {
            for i in 0..list.length() {
                if let Some(el) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    slides.push(el);
                }
            }
        }

        Some(Self {
            body: document.body(),
            toggle: document.get_element_by_id(THEME_TOGGLE_ID),
            window,
            document,
            root,
            container,
            slides,
        })
    }

    fn slide_index(&self, el: &Element) -> Option<usize> {
        self.slides.iter().position(|s| s == el)
    }

    pub fn click_target(&self, el: &Element) -> ClickTarget {
        let editable = el
            .dyn_ref::<HtmlElement>()
            .is_some_and(|h| h.is_content_editable());
        let slide = el
            .closest(&format!(".{SLIDE_CLASS}"))
            .ok()
            .flatten()
            .and_then(|s| self.slide_index(&s));
        ClickTarget {
            tag: el.tag_name().to_ascii_lowercase(),
            editable,
            slide,
            in_link_or_button: el.closest("a,button").ok().flatten().is_some(),
            in_staged: el
                .closest(&format!(".{STAGED_CLASS}"))
                .ok()
                .flatten()
                .is_some(),
        }
    }

    fn surface(&self, surface: Surface) -> Option<&Element> {
        match surface {
            Surface::Container => Some(&self.container),
            Surface::Body => self.body.as_deref(),
        }
    }

    fn system_theme(&self) -> Option<Theme> {
        dark_scheme_query(&self.window).map(|mq| theme_for_scheme(mq.matches()))
    }
}

fn dark_scheme_query(window: &Window) -> Option<MediaQueryList> {
    window.match_media(DARK_SCHEME_QUERY).ok().flatten()
}

fn theme_for_scheme(prefers_dark: bool) -> Theme {
    if prefers_dark { Theme::Dark } else { Theme::Light }
}

fn focus_target(event: &Event) -> FocusTarget {
    event
        .target()
        .and_then(|t| t.dyn_into::<HtmlElement>().ok())
        .map_or_else(FocusTarget::body, |el| {
            FocusTarget::new(&el.tag_name(), el.is_content_editable())
        })
}

impl DeckView for DomView {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide_classes(&self, index: usize) -> Vec<String> {
        self.slides.get(index).map(class_list).unwrap_or_default()
    }

    fn set_slide_class(&mut self, index: usize, class: &str, on: bool) {
        if let Some(el) = self.slides.get(index) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    fn is_compare(&self, index: usize) -> bool {
        self.slides
            .get(index)
            .is_some_and(|el| el.has_attribute(COMPARE_ATTR))
    }

    fn staged_classes(&self, index: usize) -> Vec<Vec<String>> {
        let Some(slide) = self.slides.get(index) else {
            return Vec::new();
        };
        let Ok(list) = slide.query_selector_all(&format!(".{STAGED_CLASS}")) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .map(|el| class_list(&el))
            .collect()
    }

    fn set_surface_class(&mut self, surface: Surface, class: &str, on: bool) {
        if let Some(el) = self.surface(surface) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    fn fragment(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn replace_fragment(&mut self, fragment: &str) {
        if let Ok(history) = self.window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(fragment));
        }
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(f64::INFINITY)
    }

    fn scroll_slide_into_view(&mut self, index: usize) {
        if let Some(el) = self.slides.get(index) {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            options.set_inline(ScrollLogicalPosition::Start);
            options.set_block(ScrollLogicalPosition::Nearest);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }

    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some()
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        let promise = self.root.request_fullscreen_promise().map_err(js_error)?;
        settle_quietly(&promise, "fullscreen request");
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        let promise = self.document.exit_fullscreen_promise().map_err(js_error)?;
        settle_quietly(&promise, "fullscreen exit");
        Ok(())
    }
}

impl ThemeSurface for DomView {
    fn set_root_theme(&mut self, value: Option<&str>) {
        let _ = match value {
            Some(v) => self.root.set_attribute("data-theme", v),
            None => self.root.remove_attribute("data-theme"),
        };
    }

    fn set_theme_toggle(&mut self, icon: &str, label: &str) -> bool {
        let Some(toggle) = self.toggle.as_ref() else {
            return false;
        };
        // Replacing the text drops children, so carry the label element over.
        let sr_label = toggle.query_selector(".sr-only").ok().flatten();
        toggle.set_text_content(Some(icon));
        if let Some(sr) = sr_label {
            sr.set_text_content(Some(label));
            let _ = toggle.append_child(&sr);
        }
        true
    }
}

/// Theme preference in `localStorage`. Without storage (private mode,
/// sandboxed frames) reads find nothing and writes fail.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new(window: &Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }
}

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("localStorage unavailable"))?;
        storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match self.storage.as_ref() {
            Some(storage) => storage.remove_item(key).map_err(js_error),
            None => Ok(()),
        }
    }
}

fn listen<E: FromWasmAbi + 'static>(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    if target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .is_err()
    {
        warn!(event, "could not attach listener");
    }
    closure.forget();
}

fn dispatch(deck: &WebDeck, action: Action) -> impl FnMut(Event) + 'static {
    let deck = deck.clone();
    move |_event: Event| deck.borrow_mut().update(action)
}

/// Mount a deck on the element with `container_id`. Does nothing when the
/// element is missing, holds no slides or already has a deck.
pub fn mount(container_id: &str, options: DeckOptions) -> Result<(), JsValue> {
    if MOUNTED.with(|m| m.borrow().iter().any(|id| id == container_id)) {
        debug!(container_id, "deck already mounted");
        return Ok(());
    }
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let Some(view) = DomView::bind(window.clone(), container_id) else {
        warn!(container_id, "deck container not found");
        return Ok(());
    };
    let system = view.system_theme();
    let toggle = view.toggle.clone();
    let document = view.document.clone();
    let store = LocalStore::new(&window);

    let Some(deck) = Deck::mount(view, store, options, system) else {
        return Ok(());
    };
    let deck: WebDeck = Rc::new(RefCell::new(deck));
    MOUNTED.with(|m| m.borrow_mut().push(container_id.to_string()));

    {
        let deck = deck.clone();
        listen(&window, "keydown", move |event: KeyboardEvent| {
            let input = KeyInput {
                key: event.key(),
                target: focus_target(&event),
            };
            if deck.borrow_mut().handle_key(&input) {
                event.prevent_default();
            }
        });
    }

    {
        let deck = deck.clone();
        listen(&document, "click", move |event: MouseEvent| {
            let Some(el) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let mut deck = deck.borrow_mut();
            let target = deck.view().click_target(&el);
            if deck.handle_click(&target) {
                event.prevent_default();
            }
        });
    }

    listen(&window, "hashchange", dispatch(&deck, Action::FragmentChanged));
    listen(&window, "resize", dispatch(&deck, Action::Resized));

    if let Some(toggle) = toggle {
        listen(&toggle, "click", dispatch(&deck, Action::ToggleTheme));
    }

    if let Some(mq) = dark_scheme_query(&window) {
        let deck = deck.clone();
        listen(&mq, "change", move |event: MediaQueryListEvent| {
            deck.borrow_mut()
                .update(Action::SystemThemeChanged(theme_for_scheme(event.matches())));
        });
    }

    Ok(())
}

/// Mount from page script, e.g. `mountDeck("talk", 700)`. Missing or
/// invalid options fall back to the defaults.
#[wasm_bindgen(js_name = mountDeck)]
pub fn mount_deck(
    container_id: &str,
    breakpoint: Option<f64>,
    storage_key: Option<String>,
) -> Result<(), JsValue> {
    mount(container_id, page_options(breakpoint, storage_key))
}

fn page_options(breakpoint: Option<f64>, storage_key: Option<String>) -> DeckOptions {
    let defaults = DeckOptions::default();
    DeckOptions {
        breakpoint: breakpoint
            .filter(|b| b.is_finite() && *b > 0.0)
            .unwrap_or(defaults.breakpoint),
        storage_key: storage_key
            .filter(|k| !k.is_empty())
            .unwrap_or(defaults.storage_key),
    }
}

/// Console log level requested by the page URL's query string.
fn console_level(search: &str) -> log::Level {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == LOG_PARAM)
        .and_then(|(_, level)| level.parse().ok())
        .unwrap_or(log::Level::Warn)
}

/// Install the panic hook and console logger, then mount on `#deck` when the
/// page has one. Pages using another container call `mountDeck`.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let search = window.location().search().unwrap_or_default();
    let _ = console_log::init_with_level(console_level(&search));

    let has_default = window
        .document()
        .and_then(|d| d.get_element_by_id(DEFAULT_CONTAINER_ID))
        .is_some();
    if !has_default {
        debug!("no #{DEFAULT_CONTAINER_ID} element, waiting for mountDeck");
        return Ok(());
    }
    mount(DEFAULT_CONTAINER_ID, DeckOptions::default())
}

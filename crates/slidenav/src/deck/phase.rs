//! Reveal phases are encoded as `phase-N` classes. The slide element carries
//! the phases reached so far; staged children declare the phase they appear in.

use regex::Regex;
use std::sync::LazyLock;

static PHASE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^phase-(\d+)$").expect("valid phase class regex"));

pub const STAGED_CLASS: &str = "phase-content";

/// Phase number of a `phase-N` class. Numbers too large for `usize` are ignored.
pub fn phase_number(class: &str) -> Option<usize> {
    PHASE_CLASS
        .captures(class)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_phase_class(class: &str) -> bool {
    PHASE_CLASS.is_match(class)
}

pub fn phase_class(phase: usize) -> String {
    format!("phase-{phase}")
}

/// Highest phase marked on a slide, at least 1.
pub fn current_phase<S: AsRef<str>>(classes: &[S]) -> usize {
    classes
        .iter()
        .filter_map(|c| phase_number(c.as_ref()))
        .fold(1, usize::max)
}

/// Highest phase declared by any staged element, at least 1.
pub fn max_phase<S: AsRef<str>>(staged: &[Vec<S>]) -> usize {
    staged
        .iter()
        .flat_map(|classes| classes.iter())
        .filter_map(|c| phase_number(c.as_ref()))
        .fold(1, usize::max)
}

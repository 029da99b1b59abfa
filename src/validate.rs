//! Field validators: pure length predicates plus the whitespace normalizer.
//!
//! Lengths are counted in characters, not bytes, so Cyrillic input is
//! measured the way users perceive it. The engine normalizes text with
//! [`normalize_text`] before validating and storing; attachment handles are
//! never normalized.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Limits;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{A0}]+").expect("whitespace pattern is valid"));

/// Collapse runs of horizontal whitespace into single spaces, trim every
/// line, and drop blank lines.
///
/// Interior newlines are preserved: a place field keeps its address line and
/// map-link line separate.
pub fn normalize_text(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| HORIZONTAL_WS.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// Character count of the trimmed text, the unit all bounds are checked in.
fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// True when the trimmed character count falls in `[min, max]`.
pub fn within(text: &str, min: usize, max: usize) -> bool {
    let len = char_len(text);
    len >= min && len <= max
}

/// Theme bound check.
pub fn validate_theme(text: &str, limits: &Limits) -> bool {
    within(text, limits.theme_min, limits.theme_max)
}

/// Place bound check. The wider maximum leaves room for embedded map links.
pub fn validate_place(text: &str, limits: &Limits) -> bool {
    within(text, limits.place_min, limits.place_max)
}

/// Contact bound check.
pub fn validate_contact(text: &str, limits: &Limits) -> bool {
    within(text, limits.contact_min, limits.contact_max)
}

/// Time bound check. Free text, no semantic date parsing.
pub fn validate_time(text: &str, limits: &Limits) -> bool {
    within(text, limits.time_min, limits.time_max)
}

/// Description bound check. Empty is valid: the field is optional.
pub fn validate_description(text: &str, limits: &Limits) -> bool {
    char_len(text) <= limits.description_max
}

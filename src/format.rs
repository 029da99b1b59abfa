//! Rendering of event records into announcement text.
//!
//! All output uses HTML parse mode. User-entered text is escaped at render
//! time; extracted map links go into the anchor href raw (they already
//! matched a known URL pattern). Rendering is pure: the same unmodified
//! record always produces byte-identical output.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{EventRecord, UserRef};

/// Recognized map-link URL prefixes, matched anywhere in a line.
static MAP_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)https?://(maps\.google\.com/|www\.google\.com/maps/|goo\.gl/maps/|maps\.app\.goo\.gl/|www\.google\.ru/maps/|maps\.google\.ru/)",
    )
    .expect("map link pattern is valid")
});

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// True if the text contains a recognized map-link URL.
pub fn is_map_link(text: &str) -> bool {
    MAP_LINK.is_match(text)
}

/// Split a place text into its map link and its address lines.
///
/// Any line containing a recognized map-link URL becomes the link (last such
/// line wins); all other non-empty lines joined with spaces become the
/// address.
pub fn split_place(place: &str) -> (Option<&str>, Option<String>) {
    let mut link = None;
    let mut address_parts: Vec<&str> = Vec::new();

    for line in place.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_map_link(line) {
            link = Some(line);
        } else {
            address_parts.push(line);
        }
    }

    let address = if address_parts.is_empty() {
        None
    } else {
        Some(address_parts.join(" "))
    };
    (link, address)
}

/// Render a place value for announcement text.
///
/// Address and link together render as `{address} — <link>`; a bare link
/// renders as the anchor alone; plain text renders verbatim (escaped).
pub fn format_place(place: &str) -> String {
    match split_place(place) {
        (Some(link), Some(address)) => format!(
            "{} — <a href='{link}'>Открыть на карте</a>",
            escape_html(&address)
        ),
        (Some(link), None) => format!("<a href='{link}'>Открыть на карте</a>"),
        (None, _) => escape_html(place),
    }
}

/// Render the public announcement text for a record.
///
/// Empty fields are omitted, so the same renderer serves partial previews
/// and the final channel post.
pub fn render_public(event: &EventRecord) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(ref theme) = event.theme {
        lines.push(format!("🎉 <b>{}</b>", escape_html(theme)));
        lines.push(String::new());
    }

    if let Some(ref place) = event.place {
        lines.push(format!("📍 <b>Место:</b> {}", format_place(place)));
    }

    if let Some(ref time) = event.event_time {
        lines.push(format!("🕐 <b>Время:</b> {}", escape_html(time)));
    }

    if let Some(ref contact) = event.contact {
        lines.push(format!("📞 <b>Контакт:</b> {}", escape_html(contact)));
    }

    if let Some(ref description) = event.description {
        lines.push(String::new());
        lines.push("📝 <b>Описание:</b>".to_owned());
        lines.push(escape_html(description));
    }

    lines.push(String::new());
    lines.push("👥 Присоединяйтесь к нам!".to_owned());
    lines.push("#пошли_гулять #событие".to_owned());

    lines.join("\n")
}

/// Render the moderation-chat view: banner, author identity, record id, the
/// public rendering between separators, and an action prompt.
pub fn render_moderator(event: &EventRecord, author: &str) -> String {
    let separator = "=".repeat(30);
    let mut lines = vec![
        "🔔 <b>НОВЫЙ АНОНС НА МОДЕРАЦИЮ</b>".to_owned(),
        String::new(),
        format!("👤 <b>Автор:</b> {}", escape_html(author)),
        format!("🆔 <b>ID события:</b> {}", event.id),
        String::new(),
        "📋 <b>СОДЕРЖАНИЕ АНОНСА:</b>".to_owned(),
        separator.clone(),
    ];

    lines.push(render_public(event));

    lines.push(String::new());
    lines.push(separator);
    lines.push("⚡ Выберите действие:".to_owned());

    lines.join("\n")
}

/// Shorten text to `max` characters, ellipsized.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Identity string for a user: name parts and handle followed by the id,
/// or the bare id when no parts are available.
pub fn author_info(user: &UserRef) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(ref first) = user.first_name {
        if !first.is_empty() {
            parts.push(first.clone());
        }
    }
    if let Some(ref last) = user.last_name {
        if !last.is_empty() {
            parts.push(last.clone());
        }
    }
    if let Some(ref username) = user.username {
        if !username.is_empty() {
            parts.push(format!("@{username}"));
        }
    }

    if parts.is_empty() {
        format!("ID: {}", user.id)
    } else {
        format!("{} (ID: {})", parts.join(" "), user.id)
    }
}

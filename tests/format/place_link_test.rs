//! Map-link extraction from place text.

use anonsbot::format::{format_place, is_map_link, split_place};

#[test]
fn recognizes_known_map_hosts() {
    assert!(is_map_link("https://maps.google.com/abc"));
    assert!(is_map_link("http://www.google.com/maps/place/xyz"));
    assert!(is_map_link("https://goo.gl/maps/short"));
    assert!(is_map_link("https://maps.app.goo.gl/short"));
    assert!(is_map_link("https://www.google.ru/maps/xyz"));
    assert!(is_map_link("https://maps.google.ru/xyz"));
}

#[test]
fn recognition_is_case_insensitive() {
    assert!(is_map_link("HTTPS://MAPS.GOOGLE.COM/ABC"));
}

#[test]
fn rejects_other_urls_and_plain_text() {
    assert!(!is_map_link("https://example.com/maps.google.com/"));
    assert!(!is_map_link("Парк Горького, главный вход"));
    assert!(!is_map_link("https://yandex.ru/maps/xyz"));
}

#[test]
fn splits_address_and_link_lines() {
    let (link, address) = split_place("Парк Горького\nhttps://maps.google.com/xyz");
    assert_eq!(link, Some("https://maps.google.com/xyz"));
    assert_eq!(address.as_deref(), Some("Парк Горького"));
}

#[test]
fn joins_multiple_address_lines_with_spaces() {
    let (link, address) = split_place("Кафе 'Пушкин'\nглавный вход\nhttps://goo.gl/maps/abc");
    assert_eq!(link, Some("https://goo.gl/maps/abc"));
    assert_eq!(address.as_deref(), Some("Кафе 'Пушкин' главный вход"));
}

#[test]
fn address_with_link_renders_as_anchor_with_label() {
    let rendered = format_place("Парк Горького\nhttps://maps.google.com/xyz");
    assert_eq!(
        rendered,
        "Парк Горького — <a href='https://maps.google.com/xyz'>Открыть на карте</a>"
    );
}

#[test]
fn bare_link_renders_as_anchor_alone() {
    let rendered = format_place("https://maps.app.goo.gl/abc");
    assert_eq!(
        rendered,
        "<a href='https://maps.app.goo.gl/abc'>Открыть на карте</a>"
    );
}

#[test]
fn plain_address_renders_verbatim() {
    assert_eq!(format_place("Парк Горького"), "Парк Горького");
}

#[test]
fn plain_address_is_html_escaped() {
    assert_eq!(format_place("Кафе <У моста>"), "Кафе &lt;У моста&gt;");
}

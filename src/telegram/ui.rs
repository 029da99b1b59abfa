//! Conversion of transport-agnostic keyboards into Telegram markup.
//!
//! All outbound text uses HTML parse mode (never MarkdownV2) per project
//! convention; escaping lives in [`crate::format`].

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup,
};

use crate::channel::{Button, Keyboard};

/// Build Telegram inline markup from button rows.
pub fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.encode()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(keyboard)
}

/// Convert a [`Keyboard`] into the transport's reply markup.
pub fn to_reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::Menu(rows) => {
            let buttons: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|l| KeyboardButton::new(l.clone())).collect())
                .collect();
            ReplyMarkup::Keyboard(KeyboardMarkup::new(buttons).resize_keyboard())
        }
    }
}

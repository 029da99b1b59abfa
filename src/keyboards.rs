//! Keyboard layouts for every conversation surface.
//!
//! Transport-agnostic: each builder returns [`Keyboard`] data that the
//! Telegram adapter converts to inline or reply markup.

use crate::callback::CallbackAction;
use crate::channel::{Button, Keyboard};
use crate::types::EditField;

/// Label of the main-menu button that starts a new announcement.
pub const MENU_NEW_EVENT: &str = "📣 Пригласить на прогулку";
/// Label of the main-menu button that lists the user's announcements.
pub const MENU_MY_EVENTS: &str = "📋 Мои анонсы";
/// Label of the main-menu help button.
pub const MENU_HELP: &str = "ℹ️ Помощь";

/// Persistent main menu shown between flows.
pub fn main_menu() -> Keyboard {
    Keyboard::Menu(vec![
        vec![MENU_NEW_EVENT.to_owned()],
        vec![MENU_MY_EVENTS.to_owned(), MENU_HELP.to_owned()],
    ])
}

/// Preview controls: one edit button per field, then submit/cancel.
pub fn preview(event_id: i64) -> Keyboard {
    let edit = |label: &str, field: EditField| {
        Button::new(label, CallbackAction::Edit { field, event_id })
    };
    Keyboard::Inline(vec![
        vec![
            edit("✏️ Изменить тему", EditField::Theme),
            edit("📍 Изменить место", EditField::Place),
        ],
        vec![
            edit("📞 Изменить контакт", EditField::Contact),
            edit("🕐 Изменить время", EditField::Time),
        ],
        vec![
            edit("🖼 Изменить фото", EditField::Photo),
            edit("📝 Изменить описание", EditField::Description),
        ],
        vec![
            Button::new(
                "✅ Отправить на модерацию",
                CallbackAction::Submit { event_id },
            ),
            Button::new("❌ Отменить", CallbackAction::Cancel { event_id }),
        ],
    ])
}

/// Moderator controls attached to the moderation-chat message.
pub fn moderation(event_id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        Button::new("✅ Опубликовать", CallbackAction::Approve { event_id }),
        Button::new("❌ Отклонить", CallbackAction::Reject { event_id }),
    ]])
}

/// Skip control for the photo step.
pub fn skip_photo() -> Keyboard {
    Keyboard::Inline(vec![vec![Button::new(
        "⏭ Пропустить",
        CallbackAction::SkipPhoto,
    )]])
}

/// Cancel control attached to every collection-step prompt.
pub fn cancel_creation() -> Keyboard {
    Keyboard::Inline(vec![vec![Button::new(
        "❌ Отменить создание",
        CallbackAction::CancelCreation,
    )]])
}

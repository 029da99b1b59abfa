//! The finite-state conversation engine.
//!
//! Drives step-by-step field collection (`WAITING_THEME … WAITING_DESCRIPTION`),
//! the preview, and the edit-in-place flow. Each handler validates one input,
//! writes the field, and advances the per-user cursor; invalid input
//! re-prompts and leaves both the cursor and the record untouched.

use std::sync::Arc;

use tracing::{debug, info};

use crate::channel::{Channel, ChannelError, ReplySurface};
use crate::config::Limits;
use crate::format::{escape_html, render_public};
use crate::keyboards;
use crate::store::{EventPatch, EventStore, StoreError};
use crate::types::{ChatRef, ConversationState, EditField, PhotoRef, Step, UserRef};
use crate::validate;

/// Errors from conversation-engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The referenced record does not exist.
    #[error("event not found")]
    NotFound,

    /// The acting user is not the record's author.
    #[error("user is not the event author")]
    Unauthorized,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Outbound delivery failed.
    #[error(transparent)]
    Delivery(#[from] ChannelError),
}

/// The step-by-step collection and editing engine.
///
/// Holds shared references to the store and the messaging channel; one
/// instance serves all users.
pub struct Conversation {
    store: Arc<EventStore>,
    channel: Arc<dyn Channel>,
    limits: Limits,
}

impl Conversation {
    /// Build an engine over the given store and channel.
    pub fn new(store: Arc<EventStore>, channel: Arc<dyn Channel>, limits: Limits) -> Self {
        Self {
            store,
            channel,
            limits,
        }
    }

    /// Start a new announcement flow: create a draft record and ask for the
    /// theme.
    ///
    /// Any previous unfinished flow is superseded — the old state row is
    /// overwritten, and an unfinished draft record stays behind in
    /// `creating` status.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] or [`EngineError::Delivery`].
    pub async fn start(&self, user: &UserRef, chat: ChatRef) -> Result<(), EngineError> {
        let event_id = self
            .store
            .create_event(user.id, user.username.as_deref())
            .await?;
        self.store
            .set_state(user.id, &ConversationState::at(Step::WaitingTheme, event_id))
            .await?;

        info!(user_id = user.id, event_id, "announcement flow started");

        self.channel
            .send_text(
                chat,
                "🎉 Отлично! Давай создадим анонс события.\n\n\
                 1️⃣ Какая тема у нашей прогулки? Например:\n\
                 'Прогулка по центру города' или 'Встреча в парке'",
                Some(keyboards::cancel_creation()),
            )
            .await?;
        Ok(())
    }

    /// Handle free text while a conversation state is active.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] / [`EngineError::Unauthorized`]
    /// from the editing path, or store/delivery errors.
    pub async fn handle_text(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        raw: &str,
    ) -> Result<(), EngineError> {
        let text = validate::normalize_text(raw);

        match state.step {
            Step::WaitingTheme => self.collect_theme(user, chat, state, &text).await,
            Step::WaitingPlace => self.collect_place(user, chat, state, &text).await,
            Step::WaitingContact => self.collect_contact(user, chat, state, &text).await,
            Step::WaitingTime => self.collect_time(user, chat, state, &text).await,
            Step::WaitingPhoto => {
                // Wrong input kind: re-prompt, no state change.
                self.channel
                    .send_text(
                        chat,
                        "📷 Сейчас ожидается фото. Отправь изображение \
                         или нажми «Пропустить».",
                        Some(keyboards::skip_photo()),
                    )
                    .await?;
                Ok(())
            }
            Step::WaitingDescription => self.collect_description(user, chat, state, &text).await,
            Step::Preview => {
                // No edit target active: redirect to the menu.
                self.channel
                    .send_text(
                        chat,
                        "Используй кнопки меню для взаимодействия с ботом 👇",
                        Some(keyboards::main_menu()),
                    )
                    .await?;
                Ok(())
            }
            Step::Editing => self.apply_text_edit(user, chat, state, &text).await,
        }
    }

    async fn collect_theme(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        if !validate::validate_theme(text, &self.limits) {
            self.channel
                .send_text(
                    chat,
                    &format!(
                        "❌ Тема должна содержать от {} до {} символов. Попробуй еще раз:",
                        self.limits.theme_min, self.limits.theme_max
                    ),
                    None,
                )
                .await?;
            return Ok(());
        }

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    theme: Some(text.to_owned()),
                    ..EventPatch::default()
                },
            )
            .await?;
        self.store
            .set_state(user.id, &ConversationState::at(Step::WaitingPlace, event_id))
            .await?;

        self.channel
            .send_text(
                chat,
                &format!(
                    "✅ Тема сохранена: {}\n\n\
                     2️⃣ Где встречаемся?\n\n\
                     🗺 Лучший вариант: Скопируй ссылку из Google Maps\n\
                     📝 Альтернатива: Напиши адрес текстом\n\
                     💡 Совет: Можно написать название места и на следующей строке добавить ссылку\n\n\
                     Примеры:\n\
                     • https://maps.google.com/...\n\
                     • Парк Горького, главный вход\n\
                     • Кафе 'Пушкин'\nhttps://maps.google.com/...",
                    escape_html(text)
                ),
                Some(keyboards::cancel_creation()),
            )
            .await?;
        Ok(())
    }

    async fn collect_place(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        if !validate::validate_place(text, &self.limits) {
            self.channel
                .send_text(
                    chat,
                    &format!(
                        "❌ Место должно содержать от {} до {} символов. Попробуй еще раз:",
                        self.limits.place_min, self.limits.place_max
                    ),
                    None,
                )
                .await?;
            return Ok(());
        }

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    place: Some(text.to_owned()),
                    ..EventPatch::default()
                },
            )
            .await?;
        self.store
            .set_state(
                user.id,
                &ConversationState::at(Step::WaitingContact, event_id),
            )
            .await?;

        self.channel
            .send_text(
                chat,
                &format!(
                    "✅ Место сохранено: {}\n\n\
                     3️⃣ Контакт для связи\n\n\
                     Оставьте контакт для связи (ваш username в Telegram или номер телефона). \
                     Он будет виден всем в анонсе.\n\n\
                     Примеры:\n\
                     • @username\n\
                     • +7 900 123-45-67\n\
                     • Анна, @anna_walk",
                    escape_html(text)
                ),
                Some(keyboards::cancel_creation()),
            )
            .await?;
        Ok(())
    }

    async fn collect_contact(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        if !validate::validate_contact(text, &self.limits) {
            self.channel
                .send_text(
                    chat,
                    &format!(
                        "❌ Контакт должен содержать от {} до {} символов. Попробуй еще раз:",
                        self.limits.contact_min, self.limits.contact_max
                    ),
                    None,
                )
                .await?;
            return Ok(());
        }

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    contact: Some(text.to_owned()),
                    ..EventPatch::default()
                },
            )
            .await?;
        self.store
            .set_state(user.id, &ConversationState::at(Step::WaitingTime, event_id))
            .await?;

        self.channel
            .send_text(
                chat,
                &format!(
                    "✅ Контакт сохранен: {}\n\n\
                     4️⃣ Когда встречаемся?\n\n\
                     Укажите дату и время события.\n\n\
                     Примеры:\n\
                     • 25 декабря, 12:30\n\
                     • Завтра в 18:00\n\
                     • Суббота, 15 декабря в 14:00",
                    escape_html(text)
                ),
                Some(keyboards::cancel_creation()),
            )
            .await?;
        Ok(())
    }

    async fn collect_time(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        if !validate::validate_time(text, &self.limits) {
            self.channel
                .send_text(
                    chat,
                    &format!(
                        "❌ Время должно содержать от {} до {} символов. Попробуй еще раз:",
                        self.limits.time_min, self.limits.time_max
                    ),
                    None,
                )
                .await?;
            return Ok(());
        }

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    event_time: Some(text.to_owned()),
                    ..EventPatch::default()
                },
            )
            .await?;
        self.store
            .set_state(user.id, &ConversationState::at(Step::WaitingPhoto, event_id))
            .await?;

        self.channel
            .send_text(
                chat,
                &format!(
                    "✅ Время сохранено: {}\n\n\
                     5️⃣ Супер! Теперь загрузите фото или картинку для анонса. \
                     Форматы: .png, .jpeg, .jpg\n\
                     Если хотите продолжить без изображения, нажмите кнопку «Пропустить»",
                    escape_html(text)
                ),
                Some(keyboards::skip_photo()),
            )
            .await?;
        Ok(())
    }

    async fn collect_description(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        let description = if text == "/skip" {
            None
        } else {
            if !validate::validate_description(text, &self.limits) {
                self.channel
                    .send_text(
                        chat,
                        &format!(
                            "❌ Ваше описание слишком длинное ({}/{} символов). \
                             Пожалуйста, сократите его и отправьте снова.",
                            text.chars().count(),
                            self.limits.description_max
                        ),
                        None,
                    )
                    .await?;
                return Ok(());
            }
            Some(text.to_owned())
        };

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    description: Some(description),
                    ..EventPatch::default()
                },
            )
            .await?;

        self.show_preview(user.id, chat, event_id).await
    }

    /// Handle an inbound photo in `WAITING_PHOTO` or the photo-editing state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unauthorized`] from the editing path, or
    /// store/delivery errors.
    pub async fn handle_photo(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        photo: PhotoRef,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;

        match (state.step, state.edit_field) {
            (Step::WaitingPhoto, _) => {
                self.store
                    .update_event(
                        event_id,
                        &EventPatch {
                            photo_file_id: Some(Some(photo)),
                            ..EventPatch::default()
                        },
                    )
                    .await?;
                self.store
                    .set_state(
                        user.id,
                        &ConversationState::at(Step::WaitingDescription, event_id),
                    )
                    .await?;

                self.channel
                    .send_text(
                        chat,
                        &format!(
                            "✅ Фото сохранено!\n\n\
                             6️⃣ Добавьте короткое описание прогулки\n\
                             Расскажите, что планируете делать, что взять с собой \
                             (максимум {} символов):",
                            self.limits.description_max
                        ),
                        Some(keyboards::cancel_creation()),
                    )
                    .await?;
                Ok(())
            }
            (Step::Editing, Some(EditField::Photo)) => {
                self.require_owner(event_id, user.id).await?;

                self.store
                    .update_event(
                        event_id,
                        &EventPatch {
                            photo_file_id: Some(Some(photo)),
                            ..EventPatch::default()
                        },
                    )
                    .await?;

                self.channel
                    .send_text(chat, "✅ Фото обновлено!", None)
                    .await?;
                self.show_preview(user.id, chat, event_id).await
            }
            _ => {
                debug!(user_id = user.id, step = state.step.as_str(), "photo ignored");
                Ok(())
            }
        }
    }

    /// Enter the editing state for one field, prompted via the preview
    /// message.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the record is gone and
    /// [`EngineError::Unauthorized`] if the requester is not the author.
    pub async fn begin_edit(
        &self,
        user_id: i64,
        surface: &ReplySurface,
        field: EditField,
        event_id: i64,
    ) -> Result<(), EngineError> {
        self.require_owner(event_id, user_id).await?;

        self.store
            .set_state(user_id, &ConversationState::editing(event_id, field))
            .await?;

        let prompt = if field == EditField::Photo {
            "📝 Отправь новое фото для события или напиши 'удалить' чтобы убрать фото".to_owned()
        } else {
            format!("📝 Введи новое значение для поля '{}':", field.prompt_name())
        };
        surface.rewrite(self.channel.as_ref(), &prompt, None).await?;
        Ok(())
    }

    async fn apply_text_edit(
        &self,
        user: &UserRef,
        chat: ChatRef,
        state: &ConversationState,
        text: &str,
    ) -> Result<(), EngineError> {
        let event_id = state.event_id.ok_or(EngineError::NotFound)?;
        let Some(field) = state.edit_field else {
            self.channel
                .send_text(chat, "❌ Ошибка редактирования", None)
                .await?;
            return Ok(());
        };

        self.require_owner(event_id, user.id).await?;

        let remove_requested = text.to_lowercase() == "удалить";

        let patch = match field {
            EditField::Theme if validate::validate_theme(text, &self.limits) => EventPatch {
                theme: Some(text.to_owned()),
                ..EventPatch::default()
            },
            EditField::Place if validate::validate_place(text, &self.limits) => EventPatch {
                place: Some(text.to_owned()),
                ..EventPatch::default()
            },
            EditField::Contact if validate::validate_contact(text, &self.limits) => EventPatch {
                contact: Some(text.to_owned()),
                ..EventPatch::default()
            },
            EditField::Time if validate::validate_time(text, &self.limits) => EventPatch {
                event_time: Some(text.to_owned()),
                ..EventPatch::default()
            },
            EditField::Photo if remove_requested => EventPatch {
                photo_file_id: Some(None),
                ..EventPatch::default()
            },
            EditField::Description if remove_requested => EventPatch {
                description: Some(None),
                ..EventPatch::default()
            },
            EditField::Description if validate::validate_description(text, &self.limits) => {
                EventPatch {
                    description: Some(Some(text.to_owned())),
                    ..EventPatch::default()
                }
            }
            _ => {
                // Validation failure or, for the photo field, text that is
                // not the remove token: re-prompt, state unchanged.
                self.channel
                    .send_text(chat, "❌ Некорректное значение. Попробуйте еще раз.", None)
                    .await?;
                return Ok(());
            }
        };

        self.store.update_event(event_id, &patch).await?;

        self.channel
            .send_text(chat, "✅ Изменения сохранены!", None)
            .await?;
        self.show_preview(user.id, chat, event_id).await
    }

    /// Skip the photo step from its inline control.
    ///
    /// A stale press (state no longer `WAITING_PHOTO`) is logged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns store/delivery errors.
    pub async fn skip_photo(
        &self,
        user_id: i64,
        surface: &ReplySurface,
    ) -> Result<(), EngineError> {
        let Some(state) = self.store.get_state(user_id).await? else {
            debug!(user_id, "skip pressed with no active state, ignoring");
            return Ok(());
        };
        let Some(event_id) = state.event_id.filter(|_| state.step == Step::WaitingPhoto) else {
            debug!(user_id, step = state.step.as_str(), "stale skip press, ignoring");
            return Ok(());
        };

        self.store
            .set_state(
                user_id,
                &ConversationState::at(Step::WaitingDescription, event_id),
            )
            .await?;

        surface
            .rewrite(
                self.channel.as_ref(),
                &format!(
                    "6️⃣ Добавьте короткое описание прогулки\n\
                     Расскажите, что планируете делать, что взять с собой \
                     (максимум {} символов):",
                    self.limits.description_max
                ),
                None,
            )
            .await?;
        Ok(())
    }

    /// Render the record and show the preview with edit/submit controls,
    /// moving the cursor to `PREVIEW`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the record is gone, or
    /// store/delivery errors.
    pub async fn show_preview(
        &self,
        user_id: i64,
        chat: ChatRef,
        event_id: i64,
    ) -> Result<(), EngineError> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        self.store
            .set_state(user_id, &ConversationState::at(Step::Preview, event_id))
            .await?;

        let text = format!("🎯 <b>ПРЕДПРОСМОТР АНОНСА</b>\n\n{}", render_public(&event));
        let keyboard = Some(keyboards::preview(event_id));

        match event.photo_file_id {
            Some(ref photo) => {
                self.channel.send_photo(chat, photo, &text, keyboard).await?;
            }
            None => {
                self.channel.send_text(chat, &text, keyboard).await?;
            }
        }
        Ok(())
    }

    /// Cancel from the `/cancel` command or menu context: clear the state
    /// and restore the main menu.
    ///
    /// Idempotent — with no active state this only re-sends the menu.
    /// The draft record, if any, stays behind in `creating` status.
    ///
    /// # Errors
    ///
    /// Returns store/delivery errors.
    pub async fn cancel_command(&self, user_id: i64, chat: ChatRef) -> Result<(), EngineError> {
        self.store.clear_state(user_id).await?;
        self.channel
            .send_text(
                chat,
                "❌ Создание анонса отменено.",
                Some(keyboards::main_menu()),
            )
            .await?;
        Ok(())
    }

    /// Cancel from an inline control: clear the state, rewrite the carrying
    /// message, and restore the main menu.
    ///
    /// # Errors
    ///
    /// Returns store/delivery errors.
    pub async fn cancel_from_control(
        &self,
        user_id: i64,
        surface: &ReplySurface,
    ) -> Result<(), EngineError> {
        self.store.clear_state(user_id).await?;
        surface
            .rewrite(self.channel.as_ref(), "❌ Создание анонса отменено.", None)
            .await?;
        self.channel
            .send_text(
                ChatRef(user_id),
                "Главное меню:",
                Some(keyboards::main_menu()),
            )
            .await?;
        Ok(())
    }

    /// Load the record and verify the actor owns it.
    async fn require_owner(&self, event_id: i64, user_id: i64) -> Result<(), EngineError> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if event.user_id != user_id {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }
}

//! The dispatch router: maps inbound events to engine and workflow
//! operations.
//!
//! One entry point per inbound event category (command, free text, photo,
//! other media, control action). Every error is recovered here — logged,
//! answered with a user-visible message where one applies — so nothing
//! propagates past a single inbound-event handling cycle.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::callback::CallbackAction;
use crate::channel::{Channel, ReplySurface};
use crate::engine::{Conversation, EngineError};
use crate::format::{escape_html, truncate};
use crate::keyboards::{self, MENU_HELP, MENU_MY_EVENTS, MENU_NEW_EVENT};
use crate::moderation::{Moderation, ModerationError};
use crate::store::EventStore;
use crate::types::{ChatRef, EditField, EventStatus, MediaKind, PhotoRef, Step, UserRef};

/// Guidance shown for free text with no active conversation.
const MENU_GUIDANCE: &str = "Используй кнопки меню для взаимодействия с ботом 👇";

/// Generic failure shown when an operation dies unexpectedly.
const GENERIC_FAILURE: &str = "❌ Произошла ошибка. Попробуйте еще раз.";

/// A recognized slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start` — greeting and main menu.
    Start,
    /// `/help` — usage instructions.
    Help,
    /// `/cancel` — abandon the current flow.
    Cancel,
    /// `/skip` — skip the optional description step.
    Skip,
}

impl Command {
    /// Parse a bare command name (no leading slash, no bot-mention suffix).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "cancel" => Some(Self::Cancel),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Routes inbound events to the conversation engine and the moderation
/// workflow based on the user's current state and the event's content.
pub struct Router {
    store: Arc<EventStore>,
    channel: Arc<dyn Channel>,
    conversation: Conversation,
    moderation: Moderation,
}

impl Router {
    /// Assemble the router from its collaborators.
    pub fn new(
        store: Arc<EventStore>,
        channel: Arc<dyn Channel>,
        conversation: Conversation,
        moderation: Moderation,
    ) -> Self {
        Self {
            store,
            channel,
            conversation,
            moderation,
        }
    }

    /// Handle a slash command.
    pub async fn handle_command(&self, user: &UserRef, chat: ChatRef, command: Command) {
        debug!(user_id = user.id, ?command, "command received");
        let outcome = match command {
            Command::Start => self.send_greeting(user, chat).await,
            Command::Help => self.send_help(chat).await,
            Command::Cancel => self
                .conversation
                .cancel_command(user.id, chat)
                .await
                .map_err(anyhow::Error::from),
            Command::Skip => self.skip_description(user, chat).await,
        };
        if let Err(e) = outcome {
            error!(user_id = user.id, error = %e, "command handling failed");
            self.best_effort_send(chat, GENERIC_FAILURE).await;
        }
    }

    /// Handle free text: menu labels first, then the active conversation,
    /// then menu guidance.
    pub async fn handle_text(&self, user: &UserRef, chat: ChatRef, text: &str) {
        let outcome = match text.trim() {
            MENU_NEW_EVENT => self
                .conversation
                .start(user, chat)
                .await
                .map_err(anyhow::Error::from),
            MENU_MY_EVENTS => self.send_my_events(user, chat).await,
            MENU_HELP => self.send_help(chat).await,
            _ => self.route_free_text(user, chat, text).await,
        };
        if let Err(e) = outcome {
            error!(user_id = user.id, error = %e, "text handling failed");
            self.best_effort_send(chat, GENERIC_FAILURE).await;
        }
    }

    async fn route_free_text(
        &self,
        user: &UserRef,
        chat: ChatRef,
        text: &str,
    ) -> anyhow::Result<()> {
        let Some(state) = self.store.get_state(user.id).await? else {
            self.channel
                .send_text(chat, MENU_GUIDANCE, Some(keyboards::main_menu()))
                .await?;
            return Ok(());
        };

        match self.conversation.handle_text(user, chat, &state, text).await {
            Ok(()) => Ok(()),
            Err(EngineError::NotFound | EngineError::Unauthorized) => {
                self.best_effort_send(chat, "❌ Событие не найдено или у вас нет прав доступа")
                    .await;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Handle an inbound photo.
    pub async fn handle_photo(&self, user: &UserRef, chat: ChatRef, photo: PhotoRef) {
        let outcome = self.route_photo(user, chat, photo).await;
        if let Err(e) = outcome {
            error!(user_id = user.id, error = %e, "photo handling failed");
            self.best_effort_send(chat, GENERIC_FAILURE).await;
        }
    }

    async fn route_photo(
        &self,
        user: &UserRef,
        chat: ChatRef,
        photo: PhotoRef,
    ) -> anyhow::Result<()> {
        let state = self.store.get_state(user.id).await?;

        let accepting = state.as_ref().filter(|s| {
            s.step == Step::WaitingPhoto
                || (s.step == Step::Editing && s.edit_field == Some(EditField::Photo))
        });

        let Some(state) = accepting else {
            // A photo is an accepted kind, but not at this step.
            self.channel
                .send_text(
                    chat,
                    &format!("❌ Фото сейчас не ожидается. {MENU_GUIDANCE}"),
                    Some(keyboards::main_menu()),
                )
                .await?;
            return Ok(());
        };

        match self.conversation.handle_photo(user, chat, state, photo).await {
            Ok(()) => Ok(()),
            Err(EngineError::NotFound | EngineError::Unauthorized) => {
                self.best_effort_send(chat, "❌ Событие не найдено или у вас нет прав доступа")
                    .await;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Handle a non-photo attachment. Only answers when a photo was
    /// actually expected; anywhere else the media is logged and ignored.
    pub async fn handle_media(&self, user: &UserRef, chat: ChatRef, kind: MediaKind) {
        let state = match self.store.get_state(user.id).await {
            Ok(s) => s,
            Err(e) => {
                error!(user_id = user.id, error = %e, "state lookup failed");
                return;
            }
        };

        let rejection = format!(
            "❌ Пожалуйста, отправьте именно фото (не {}).\n\n\
             Поддерживаемые форматы: .png, .jpeg, .jpg",
            kind.label_ru()
        );

        match state {
            Some(ref s) if s.step == Step::WaitingPhoto => {
                self.best_effort_send_with(chat, &rejection, Some(keyboards::skip_photo()))
                    .await;
            }
            Some(ref s) if s.step == Step::Editing && s.edit_field == Some(EditField::Photo) => {
                self.best_effort_send(chat, &rejection).await;
            }
            _ => {
                debug!(user_id = user.id, ?kind, "media outside photo context, ignoring");
            }
        }
    }

    /// Handle a decoded control action (inline button press).
    ///
    /// `actor_chat` is the chat the button lives in — the moderator gate
    /// compares it against the configured moderation chat.
    pub async fn handle_control(
        &self,
        user: &UserRef,
        actor_chat: ChatRef,
        surface: ReplySurface,
        data: &str,
    ) {
        let Some(action) = CallbackAction::parse(data) else {
            warn!(user_id = user.id, data, "unrecognized control payload, ignoring");
            return;
        };
        info!(user_id = user.id, ?action, "control action received");

        match action {
            CallbackAction::Edit { field, event_id } => {
                match self
                    .conversation
                    .begin_edit(user.id, &surface, field, event_id)
                    .await
                {
                    Ok(()) => {}
                    Err(EngineError::NotFound | EngineError::Unauthorized) => {
                        self.best_effort_rewrite(
                            &surface,
                            "❌ Событие не найдено или у вас нет прав доступа",
                        )
                        .await;
                    }
                    Err(e) => self.report_control_failure(&surface, &e.to_string()).await,
                }
            }
            CallbackAction::Submit { event_id } => {
                match self.moderation.submit(user, &surface, event_id).await {
                    Ok(()) => {}
                    Err(ModerationError::NotFound) => {
                        self.best_effort_rewrite(&surface, "❌ Событие не найдено").await;
                    }
                    Err(ModerationError::Unauthorized) => {
                        self.best_effort_rewrite(&surface, "❌ У вас нет прав доступа")
                            .await;
                    }
                    Err(ModerationError::Incomplete) => {
                        self.best_effort_rewrite(
                            &surface,
                            "❌ Заполнены не все обязательные поля анонса.",
                        )
                        .await;
                    }
                    Err(ModerationError::InvalidTransition { .. }) => {
                        self.best_effort_rewrite(&surface, "⚠️ Анонс уже отправлен на модерацию.")
                            .await;
                    }
                    Err(ModerationError::Delivery(e)) => {
                        error!(event_id, error = %e, "moderation delivery failed");
                        self.best_effort_rewrite(&surface, "❌ Ошибка при отправке на модерацию")
                            .await;
                    }
                    Err(e) => self.report_control_failure(&surface, &e.to_string()).await,
                }
            }
            CallbackAction::Approve { event_id } => {
                match self.moderation.approve(actor_chat, &surface, event_id).await {
                    Ok(()) => {}
                    Err(e) => {
                        self.report_moderation_failure(
                            actor_chat,
                            &surface,
                            event_id,
                            "❌ Ошибка при публикации",
                            e,
                        )
                        .await;
                    }
                }
            }
            CallbackAction::Reject { event_id } => {
                match self.moderation.reject(actor_chat, &surface, event_id).await {
                    Ok(()) => {}
                    Err(e) => {
                        self.report_moderation_failure(
                            actor_chat,
                            &surface,
                            event_id,
                            GENERIC_FAILURE,
                            e,
                        )
                        .await;
                    }
                }
            }
            CallbackAction::SkipPhoto => {
                if let Err(e) = self.conversation.skip_photo(user.id, &surface).await {
                    self.report_control_failure(&surface, &e.to_string()).await;
                }
            }
            CallbackAction::Cancel { .. } | CallbackAction::CancelCreation => {
                if let Err(e) = self.conversation.cancel_from_control(user.id, &surface).await {
                    self.report_control_failure(&surface, &e.to_string()).await;
                }
            }
        }
    }

    async fn report_moderation_failure(
        &self,
        actor_chat: ChatRef,
        surface: &ReplySurface,
        event_id: i64,
        delivery_message: &str,
        e: ModerationError,
    ) {
        match e {
            ModerationError::Unauthorized => {
                self.best_effort_send(actor_chat, "❌ У вас нет прав администратора")
                    .await;
            }
            ModerationError::NotFound => {
                self.best_effort_rewrite(surface, "❌ Событие не найдено").await;
            }
            ModerationError::InvalidTransition { from, .. } => {
                let note = match from {
                    EventStatus::Published => "⚠️ Анонс уже опубликован.",
                    EventStatus::Rejected => "⚠️ Анонс уже отклонен.",
                    _ => "⚠️ Анонс еще не отправлен на модерацию.",
                };
                self.best_effort_rewrite(surface, note).await;
            }
            ModerationError::Delivery(err) => {
                error!(event_id, error = %err, "publish delivery failed");
                self.best_effort_rewrite(surface, delivery_message).await;
            }
            other => {
                error!(event_id, error = %other, "moderation action failed");
                self.report_control_failure(surface, &other.to_string()).await;
            }
        }
    }

    async fn skip_description(&self, user: &UserRef, chat: ChatRef) -> anyhow::Result<()> {
        let state = self.store.get_state(user.id).await?;
        match state {
            Some(ref s) if s.step == Step::WaitingDescription => {
                self.conversation.handle_text(user, chat, s, "/skip").await?;
            }
            _ => {
                self.channel
                    .send_text(chat, MENU_GUIDANCE, Some(keyboards::main_menu()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_greeting(&self, user: &UserRef, chat: ChatRef) -> anyhow::Result<()> {
        let name = user.first_name.as_deref().unwrap_or("гость");
        let text = format!(
            "👋 Привет, {}!\n\n\
             Я помогу тебе создать анонс для прогулки\n\
             и опубликовать его в канале «Айда гулять, Нови-Сад!»\n\n\
             Давай начнем! Нажми кнопку «{MENU_NEW_EVENT}», чтобы создать анонс!",
            escape_html(name)
        );
        self.channel
            .send_text(chat, &text, Some(keyboards::main_menu()))
            .await?;
        Ok(())
    }

    async fn send_help(&self, chat: ChatRef) -> anyhow::Result<()> {
        let text = format!(
            "ℹ️ Как пользоваться ботом:\n\n\
             1. Нажми «{MENU_NEW_EVENT}»\n\
             2. Пошагово заполни все поля:\n\
             \u{2022} Тема события\n\
             \u{2022} Место проведения\n\
             \u{2022} Контакт для связи\n\
             \u{2022} Время проведения\n\
             \u{2022} Фото (необязательно)\n\
             \u{2022} Описание (необязательно)\n\
             3. Проверь предпросмотр и отправь на модерацию\n\
             4. Дождись одобрения администратора\n\
             5. Получи уведомление о публикации\n\n\
             <b>Команды:</b>\n\
             /start - Начать работу\n\
             /help - Справка\n\
             /cancel - Отменить создание анонса"
        );
        self.channel
            .send_text(chat, &text, Some(keyboards::main_menu()))
            .await?;
        Ok(())
    }

    async fn send_my_events(&self, user: &UserRef, chat: ChatRef) -> anyhow::Result<()> {
        let events = self.store.events_by_author(user.id).await?;

        let text = if events.is_empty() {
            format!(
                "📋 У тебя пока нет анонсов.\n\
                 Нажми «{MENU_NEW_EVENT}», чтобы создать первый!"
            )
        } else {
            let mut lines = vec!["📋 <b>Твои анонсы:</b>".to_owned(), String::new()];
            for event in &events {
                let mark = match event.status {
                    EventStatus::Pending => "⏳",
                    EventStatus::Published => "✅",
                    EventStatus::Rejected => "❌",
                    EventStatus::Creating => "📝",
                };
                let theme = event.theme.as_deref().unwrap_or("(без темы)");
                lines.push(format!(
                    "{mark} #{} — {}",
                    event.id,
                    escape_html(&truncate(theme, 50))
                ));
            }
            lines.join("\n")
        };

        self.channel
            .send_text(chat, &text, Some(keyboards::main_menu()))
            .await?;
        Ok(())
    }

    async fn best_effort_send(&self, chat: ChatRef, text: &str) {
        self.best_effort_send_with(chat, text, None).await;
    }

    async fn best_effort_send_with(
        &self,
        chat: ChatRef,
        text: &str,
        keyboard: Option<crate::channel::Keyboard>,
    ) {
        if let Err(e) = self.channel.send_text(chat, text, keyboard).await {
            warn!(error = %e, "failed to deliver response");
        }
    }

    async fn best_effort_rewrite(&self, surface: &ReplySurface, text: &str) {
        if let Err(e) = surface.rewrite(self.channel.as_ref(), text, None).await {
            warn!(error = %e, "failed to rewrite message");
        }
    }

    async fn report_control_failure(&self, surface: &ReplySurface, error: &str) {
        error!(error, "control handling failed");
        self.best_effort_rewrite(surface, GENERIC_FAILURE).await;
    }
}

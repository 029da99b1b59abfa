//! The moderation workflow: submit → moderator decision → publish/notify.
//!
//! Delivery is deliberately non-transactional: a failed send leaves the
//! record exactly as it was, and effects already applied before a later
//! failure are not rolled back. The publish step only advances the status
//! after the channel post succeeds.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channel::{Channel, ChannelError, ReplySurface};
use crate::format::{author_info, escape_html, render_moderator, render_public};
use crate::keyboards;
use crate::store::{EventPatch, EventStore, StoreError};
use crate::types::{ChatRef, EventRecord, EventStatus, UserRef};

/// Errors from moderation-workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// The referenced record does not exist.
    #[error("event not found")]
    NotFound,

    /// The actor is not the record's author (submit) or not the configured
    /// moderation chat (approve/reject).
    #[error("actor is not authorized")]
    Unauthorized,

    /// The record is not ready for submission: a required field is empty.
    #[error("required fields are incomplete")]
    Incomplete,

    /// The record's status does not allow the requested transition.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: EventStatus,
        /// Requested status.
        to: EventStatus,
    },

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Outbound delivery failed.
    #[error(transparent)]
    Delivery(#[from] ChannelError),
}

/// The submit/approve/reject workflow bridging author, moderator, and the
/// public channel.
pub struct Moderation {
    store: Arc<EventStore>,
    channel: Arc<dyn Channel>,
    moderation_chat: ChatRef,
    publish_channel: ChatRef,
}

impl Moderation {
    /// Build a workflow over the given store, channel, and chat identities.
    pub fn new(
        store: Arc<EventStore>,
        channel: Arc<dyn Channel>,
        moderation_chat: ChatRef,
        publish_channel: ChatRef,
    ) -> Self {
        Self {
            store,
            channel,
            moderation_chat,
            publish_channel,
        }
    }

    /// Submit a finished record to the moderation chat.
    ///
    /// On success the record becomes `pending`, the requester's
    /// conversation state is cleared, and the preview message is rewritten
    /// into a confirmation. On delivery failure nothing is changed.
    ///
    /// # Errors
    ///
    /// [`ModerationError::NotFound`] for a missing record,
    /// [`ModerationError::Unauthorized`] when the requester is not the
    /// author, [`ModerationError::Incomplete`] when a required field is
    /// empty, [`ModerationError::InvalidTransition`] when the record was
    /// already submitted, plus store/delivery errors.
    pub async fn submit(
        &self,
        user: &UserRef,
        surface: &ReplySurface,
        event_id: i64,
    ) -> Result<(), ModerationError> {
        let event = self.load(event_id).await?;

        if event.user_id != user.id {
            warn!(
                user_id = user.id,
                event_id,
                author = event.user_id,
                "submit denied: not the author"
            );
            return Err(ModerationError::Unauthorized);
        }
        self.check_transition(&event, EventStatus::Pending)?;
        if !event.is_submittable() {
            return Err(ModerationError::Incomplete);
        }

        let author = author_info(user);
        let text = render_moderator(&event, &author);
        let keyboard = Some(keyboards::moderation(event_id));

        let admin_message = match event.photo_file_id {
            Some(ref photo) => {
                self.channel
                    .send_photo(self.moderation_chat, photo, &text, keyboard)
                    .await?
            }
            None => {
                self.channel
                    .send_text(self.moderation_chat, &text, keyboard)
                    .await?
            }
        };

        // No rollback past this point: the moderator already sees the
        // submission.
        self.store
            .update_event(
                event_id,
                &EventPatch {
                    status: Some(EventStatus::Pending),
                    admin_message_id: Some(i64::from(admin_message.message_id)),
                    ..EventPatch::default()
                },
            )
            .await?;
        self.store.clear_state(user.id).await?;

        info!(event_id, user_id = user.id, "event submitted for moderation");

        surface
            .rewrite(
                self.channel.as_ref(),
                "✅ Анонс отправлен на модерацию!\n\n\
                 Ты получишь уведомление, как только администратор рассмотрит заявку.",
                None,
            )
            .await?;
        self.channel
            .send_text(
                ChatRef(user.id),
                "Главное меню:",
                Some(keyboards::main_menu()),
            )
            .await?;
        Ok(())
    }

    /// Approve a pending record: publish it and notify the author.
    ///
    /// The status advances to `published` only after the channel post
    /// succeeds; a failed publish leaves the record `pending`.
    ///
    /// # Errors
    ///
    /// [`ModerationError::Unauthorized`] when the control was not pressed
    /// in the configured moderation chat, [`ModerationError::NotFound`],
    /// [`ModerationError::InvalidTransition`], plus store/delivery errors.
    pub async fn approve(
        &self,
        actor_chat: ChatRef,
        surface: &ReplySurface,
        event_id: i64,
    ) -> Result<(), ModerationError> {
        self.require_moderator(actor_chat)?;

        let event = self.load(event_id).await?;
        self.check_transition(&event, EventStatus::Published)?;

        let text = render_public(&event);
        let channel_message = match event.photo_file_id {
            Some(ref photo) => {
                self.channel
                    .send_photo(self.publish_channel, photo, &text, None)
                    .await?
            }
            None => {
                self.channel
                    .send_text(self.publish_channel, &text, None)
                    .await?
            }
        };

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    status: Some(EventStatus::Published),
                    channel_message_id: Some(i64::from(channel_message.message_id)),
                    ..EventPatch::default()
                },
            )
            .await?;

        info!(event_id, "event published");

        surface
            .rewrite(
                self.channel.as_ref(),
                &format!(
                    "✅ <b>АНОНС ОПУБЛИКОВАН</b>\n\n\
                     Событие #{event_id} успешно опубликовано в канале!"
                ),
                None,
            )
            .await?;

        let theme = escape_html(event.theme.as_deref().unwrap_or_default());
        self.channel
            .send_text(
                ChatRef(event.user_id),
                &format!(
                    "🎉 <b>Отличные новости!</b>\n\n\
                     Твой анонс '{theme}' одобрен и опубликован в канале!\n\n\
                     Спасибо за участие! 🙌"
                ),
                None,
            )
            .await?;
        Ok(())
    }

    /// Reject a pending record and notify the author. Terminal: there is no
    /// resubmission path for the record itself.
    ///
    /// # Errors
    ///
    /// Same authorization and lookup errors as [`Moderation::approve`].
    pub async fn reject(
        &self,
        actor_chat: ChatRef,
        surface: &ReplySurface,
        event_id: i64,
    ) -> Result<(), ModerationError> {
        self.require_moderator(actor_chat)?;

        let event = self.load(event_id).await?;
        self.check_transition(&event, EventStatus::Rejected)?;

        self.store
            .update_event(
                event_id,
                &EventPatch {
                    status: Some(EventStatus::Rejected),
                    ..EventPatch::default()
                },
            )
            .await?;

        info!(event_id, "event rejected");

        surface
            .rewrite(
                self.channel.as_ref(),
                &format!("❌ <b>АНОНС ОТКЛОНЕН</b>\n\nСобытие #{event_id} отклонено."),
                None,
            )
            .await?;

        let theme = escape_html(event.theme.as_deref().unwrap_or_default());
        self.channel
            .send_text(
                ChatRef(event.user_id),
                &format!(
                    "😔 К сожалению, твой анонс '{theme}' не прошел модерацию.\n\n\
                     Ты можешь создать новый анонс, исправив замечания."
                ),
                None,
            )
            .await?;
        Ok(())
    }

    fn require_moderator(&self, actor_chat: ChatRef) -> Result<(), ModerationError> {
        if actor_chat != self.moderation_chat {
            warn!(%actor_chat, "moderation action denied: wrong chat");
            return Err(ModerationError::Unauthorized);
        }
        Ok(())
    }

    async fn load(&self, event_id: i64) -> Result<EventRecord, ModerationError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(ModerationError::NotFound)
    }

    fn check_transition(
        &self,
        event: &EventRecord,
        to: EventStatus,
    ) -> Result<(), ModerationError> {
        if !event.status.can_transition_to(to) {
            return Err(ModerationError::InvalidTransition {
                from: event.status,
                to,
            });
        }
        Ok(())
    }
}

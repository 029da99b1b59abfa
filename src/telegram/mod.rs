//! Telegram adapter: the teloxide-based event loop and the [`Channel`]
//! implementation.
//!
//! The adapter's only jobs are classification and conversion: map each
//! inbound update to the matching [`Router`] entry point, and turn
//! channel-contract calls into Bot API requests. No conversation logic
//! lives here.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};
use tracing::{debug, info};

use crate::channel::{Channel, ChannelError, Keyboard, ReplySurface};
use crate::dispatch::{Command, Router};
use crate::types::{ChatRef, MediaKind, MessageRef, PhotoRef, UserRef};

pub mod ui;

// ---------------------------------------------------------------------------
// Channel implementation
// ---------------------------------------------------------------------------

/// [`Channel`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    /// Wrap a bot handle.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef {
        chat: ChatRef(message.chat.id.0),
        message_id: message.id.0,
    }
}

fn delivery_error(e: teloxide::RequestError) -> ChannelError {
    ChannelError::Delivery(e.to_string())
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_text(
        &self,
        to: ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        let mut req = self
            .bot
            .send_message(ChatId(to.0), text)
            .parse_mode(ParseMode::Html);
        if let Some(ref kb) = keyboard {
            req = req.reply_markup(ui::to_reply_markup(kb));
        }
        let message = req.await.map_err(delivery_error)?;
        Ok(message_ref(&message))
    }

    async fn send_photo(
        &self,
        to: ChatRef,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        let mut req = self
            .bot
            .send_photo(ChatId(to.0), InputFile::file_id(photo.0.clone()))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(ref kb) = keyboard {
            req = req.reply_markup(ui::to_reply_markup(kb));
        }
        let message = req.await.map_err(delivery_error)?;
        Ok(message_ref(&message))
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(message.chat.0), MessageId(message.message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(Keyboard::Inline(ref rows)) = keyboard {
            req = req.reply_markup(ui::inline_markup(rows));
        }
        req.await.map_err(delivery_error)?;
        Ok(())
    }

    async fn edit_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut req = self
            .bot
            .edit_message_caption(ChatId(message.chat.0), MessageId(message.message_id))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(Keyboard::Inline(ref rows)) = keyboard {
            req = req.reply_markup(ui::inline_markup(rows));
        }
        req.await.map_err(delivery_error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    router: Arc<Router>,
}

/// Run the Telegram event loop. Blocks until the bot is stopped (Ctrl+C).
///
/// # Errors
///
/// Returns an error if the dispatcher cannot be started.
pub async fn run_bot(bot: Bot, router: Arc<Router>) -> anyhow::Result<()> {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![SharedState { router }])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn user_ref(user: &teloxide::types::User) -> UserRef {
    UserRef {
        id: i64::try_from(user.id.0).unwrap_or(0),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Classify a non-text, non-photo message into a rejectable media kind.
fn classify_media(msg: &Message) -> Option<MediaKind> {
    if msg.video().is_some() {
        Some(MediaKind::Video)
    } else if msg.animation().is_some() {
        // Checked before documents: GIF messages carry both.
        Some(MediaKind::Animation)
    } else if let Some(doc) = msg.document() {
        let image = doc
            .mime_type
            .as_ref()
            .is_some_and(|m| m.to_string().starts_with("image/"));
        Some(MediaKind::Document { image })
    } else if msg.sticker().is_some() {
        Some(MediaKind::Sticker)
    } else if msg.voice().is_some() {
        Some(MediaKind::Voice)
    } else if msg.audio().is_some() {
        Some(MediaKind::Audio)
    } else if msg.video_note().is_some() {
        Some(MediaKind::VideoNote)
    } else {
        None
    }
}

/// Handle an incoming message: commands, menu/free text, photos, and
/// non-photo media, in that order.
async fn handle_message(msg: Message, state: SharedState) -> ResponseResult<()> {
    let user = match msg.from {
        Some(ref from) => user_ref(from),
        None => return Ok(()),
    };
    let chat = ChatRef(msg.chat.id.0);

    debug!(user_id = user.id, "telegram message received");

    if let Some(text) = msg.text() {
        if let Some(stripped) = text.strip_prefix('/') {
            let full_command = stripped.split_whitespace().next().unwrap_or(stripped);
            // Strip @bot_name suffixes like "/help@anonsbot_bot".
            let name = full_command.split('@').next().unwrap_or(full_command);
            match Command::parse(name) {
                Some(command) => state.router.handle_command(&user, chat, command).await,
                None => debug!(user_id = user.id, command = name, "unknown command, ignoring"),
            }
        } else {
            state.router.handle_text(&user, chat, text).await;
        }
        return Ok(());
    }

    if let Some(photos) = msg.photo() {
        // Largest size last, by Bot API convention.
        if let Some(photo) = photos.last() {
            state
                .router
                .handle_photo(&user, chat, PhotoRef(photo.file.id.clone()))
                .await;
        }
        return Ok(());
    }

    if let Some(kind) = classify_media(&msg) {
        state.router.handle_media(&user, chat, kind).await;
        return Ok(());
    }

    debug!(user_id = user.id, "unsupported message type, ignoring");
    Ok(())
}

/// Handle an inline keyboard callback: decode the surface, acknowledge the
/// query, and hand the raw payload to the router.
async fn handle_callback(bot: Bot, query: CallbackQuery, state: SharedState) -> ResponseResult<()> {
    let user = user_ref(&query.from);

    let data = match query.data {
        Some(ref d) => d.as_str(),
        None => {
            bot.answer_callback_query(&query.id).await?;
            return Ok(());
        }
    };

    let surface = match query.message {
        Some(ref message) => match message.regular_message() {
            Some(m) => {
                let reference = message_ref(m);
                if m.photo().is_some() {
                    ReplySurface::Caption(reference)
                } else {
                    ReplySurface::Plain(reference)
                }
            }
            // Inaccessible messages can still be located for edits.
            None => ReplySurface::Plain(MessageRef {
                chat: ChatRef(message.chat().id.0),
                message_id: message.id().0,
            }),
        },
        None => {
            bot.answer_callback_query(&query.id).await?;
            return Ok(());
        }
    };

    // Acknowledge first so the client stops its spinner; the real response
    // is message edits and sends from the router.
    bot.answer_callback_query(&query.id).await?;

    state
        .router
        .handle_control(&user, surface.chat(), surface, data)
        .await;

    Ok(())
}

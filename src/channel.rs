//! Abstract messaging-channel contract.
//!
//! The engine and the moderation workflow talk to the transport only
//! through [`Channel`], so both are testable against a recording mock.
//! Keyboards are plain data here; the Telegram adapter turns them into
//! transport markup.

use async_trait::async_trait;

use crate::callback::CallbackAction;
use crate::types::{ChatRef, MessageRef, PhotoRef};

/// A labeled inline button carrying a decoded action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Action delivered back when the button is pressed.
    pub action: CallbackAction,
}

impl Button {
    /// Convenience constructor.
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Inline action buttons under the message.
    Inline(Vec<Vec<Button>>),
    /// Persistent reply-keyboard of menu labels.
    Menu(Vec<Vec<String>>),
}

/// Transport delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The send or edit call failed at the transport.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound messaging capability consumed by handlers.
///
/// Implementations must support HTML markup (bold, anchors) in text and
/// captions.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send a text message, returning a handle for later edits.
    async fn send_text(
        &self,
        to: ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError>;

    /// Send a photo with a caption, returning a handle for later edits.
    async fn send_photo(
        &self,
        to: ChatRef,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError>;

    /// Replace the text (and keyboard) of a previously sent text message.
    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Replace the caption (and keyboard) of a previously sent photo message.
    async fn edit_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;
}

/// Whether the message an interaction arrived on is plain-text-capable or
/// photo-caption-capable.
///
/// Computed once per incoming context; every in-place rewrite goes through
/// [`ReplySurface::rewrite`] instead of re-checking for a photo at each
/// call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySurface {
    /// A plain text message; rewrites use `edit_text`.
    Plain(MessageRef),
    /// A photo message; rewrites use `edit_caption`.
    Caption(MessageRef),
}

impl ReplySurface {
    /// The chat the surface's message lives in.
    pub fn chat(&self) -> ChatRef {
        match self {
            Self::Plain(m) | Self::Caption(m) => m.chat,
        }
    }

    /// Rewrite the surface's message in place.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError`] from the underlying edit call.
    pub async fn rewrite(
        &self,
        channel: &dyn Channel,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        match self {
            Self::Plain(m) => channel.edit_text(m, text, keyboard).await,
            Self::Caption(m) => channel.edit_caption(m, text, keyboard).await,
        }
    }
}

//! Core domain types shared by the conversation engine, the moderation
//! workflow, and the transport adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a stored enum value cannot be parsed back.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {field} value: {value}")]
pub struct InvalidEnumValue {
    /// Column or field the value came from.
    pub field: &'static str,
    /// The offending stored value.
    pub value: String,
}

/// Identifier of a chat (a user's private chat, the moderation chat, or the
/// publish channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef(pub i64);

impl std::fmt::Display for ChatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle locating a previously sent message, used for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Chat the message lives in.
    pub chat: ChatRef,
    /// Transport-assigned message identifier within that chat.
    pub message_id: i32,
}

/// Opaque attachment handle for a photo. Never normalized or inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef(pub String);

/// Identity of the user behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Transport user id.
    pub id: i64,
    /// First name, when the transport provides one.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Public handle without the `@`.
    pub username: Option<String>,
}

/// Lifecycle status of an event record.
///
/// Monotonic: `creating → pending → published | rejected`. A rejected
/// record is terminal; there is no resubmission path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Draft being assembled in conversation.
    Creating,
    /// Submitted, awaiting a moderator decision.
    Pending,
    /// Approved and posted to the public channel.
    Published,
    /// Declined by the moderator. Terminal.
    Rejected,
}

impl EventStatus {
    /// Returns the SQLite-stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a stored string back into a status.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEnumValue`] if the string is unrecognized.
    pub fn parse(s: &str) -> Result<Self, InvalidEnumValue> {
        match s {
            "creating" => Ok(Self::Creating),
            "pending" => Ok(Self::Pending),
            "published" => Ok(Self::Published),
            "rejected" => Ok(Self::Rejected),
            other => Err(InvalidEnumValue {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }

    /// Check if transitioning to `target` is valid.
    pub fn can_transition_to(&self, target: EventStatus) -> bool {
        matches!(
            (self, target),
            (Self::Creating, EventStatus::Pending)
                | (Self::Pending, EventStatus::Published)
                | (Self::Pending, EventStatus::Rejected)
        )
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation cursor: which input the engine expects from the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Expecting the event theme.
    WaitingTheme,
    /// Expecting the meeting place (may contain a map link).
    WaitingPlace,
    /// Expecting a contact string.
    WaitingContact,
    /// Expecting the event time as free text.
    WaitingTime,
    /// Expecting a photo or the skip control.
    WaitingPhoto,
    /// Expecting an optional description or the skip token.
    WaitingDescription,
    /// Record assembled; showing the preview with edit/submit controls.
    Preview,
    /// One field is being revised; the target field is in the state's aux data.
    Editing,
}

impl Step {
    /// Returns the SQLite-stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingTheme => "waiting_theme",
            Self::WaitingPlace => "waiting_place",
            Self::WaitingContact => "waiting_contact",
            Self::WaitingTime => "waiting_time",
            Self::WaitingPhoto => "waiting_photo",
            Self::WaitingDescription => "waiting_description",
            Self::Preview => "preview",
            Self::Editing => "editing",
        }
    }

    /// Parse a stored string back into a step.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEnumValue`] if the string is unrecognized.
    pub fn parse(s: &str) -> Result<Self, InvalidEnumValue> {
        match s {
            "waiting_theme" => Ok(Self::WaitingTheme),
            "waiting_place" => Ok(Self::WaitingPlace),
            "waiting_contact" => Ok(Self::WaitingContact),
            "waiting_time" => Ok(Self::WaitingTime),
            "waiting_photo" => Ok(Self::WaitingPhoto),
            "waiting_description" => Ok(Self::WaitingDescription),
            "preview" => Ok(Self::Preview),
            "editing" => Ok(Self::Editing),
            other => Err(InvalidEnumValue {
                field: "step",
                value: other.to_owned(),
            }),
        }
    }
}

/// Field of an event record addressable from the preview's edit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditField {
    /// Event theme.
    Theme,
    /// Meeting place.
    Place,
    /// Contact string.
    Contact,
    /// Event time.
    Time,
    /// Photo attachment.
    Photo,
    /// Optional description.
    Description,
}

impl EditField {
    /// Returns the wire/storage string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::Place => "place",
            Self::Contact => "contact",
            Self::Time => "time",
            Self::Photo => "photo",
            Self::Description => "description",
        }
    }

    /// Parse a stored or wire string back into a field.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEnumValue`] if the string is unrecognized.
    pub fn parse(s: &str) -> Result<Self, InvalidEnumValue> {
        match s {
            "theme" => Ok(Self::Theme),
            "place" => Ok(Self::Place),
            "contact" => Ok(Self::Contact),
            "time" => Ok(Self::Time),
            "photo" => Ok(Self::Photo),
            "description" => Ok(Self::Description),
            other => Err(InvalidEnumValue {
                field: "edit_field",
                value: other.to_owned(),
            }),
        }
    }

    /// Human-readable field name used in edit prompts (accusative case).
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Self::Theme => "тему события",
            Self::Place => "место проведения",
            Self::Contact => "контакт для связи",
            Self::Time => "время проведения",
            Self::Photo => "фото события",
            Self::Description => "описание события",
        }
    }
}

/// The structured announcement being assembled and moderated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Opaque record id, immutable after creation.
    pub id: i64,
    /// Author's user id, immutable.
    pub user_id: i64,
    /// Author's handle at creation time, when available.
    pub username: Option<String>,
    /// Event theme (3–100 chars once set).
    pub theme: Option<String>,
    /// Meeting place (3–500 chars once set; may embed a map link).
    pub place: Option<String>,
    /// Contact string (3–100 chars once set).
    pub contact: Option<String>,
    /// Event time as free text (3–100 chars once set).
    pub event_time: Option<String>,
    /// Optional photo attachment handle.
    pub photo_file_id: Option<PhotoRef>,
    /// Optional description (≤500 chars).
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Message id of the moderation-chat message, once submitted.
    pub admin_message_id: Option<i64>,
    /// Message id of the published channel post, once approved.
    pub channel_message_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every field mutation.
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    /// True when the four required fields are present and non-empty.
    ///
    /// A record may transition to `pending` only when this holds; photo and
    /// description stay optional.
    pub fn is_submittable(&self) -> bool {
        let filled = |f: &Option<String>| f.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.theme)
            && filled(&self.place)
            && filled(&self.contact)
            && filled(&self.event_time)
    }
}

/// Per-user conversation cursor, overwritten on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    /// Current step.
    pub step: Step,
    /// Record being assembled. `None` only before the first step.
    pub event_id: Option<i64>,
    /// Which field is being revised. Set only in [`Step::Editing`].
    pub edit_field: Option<EditField>,
}

impl ConversationState {
    /// State at the beginning of a collection flow for `event_id`.
    pub fn at(step: Step, event_id: i64) -> Self {
        Self {
            step,
            event_id: Some(event_id),
            edit_field: None,
        }
    }

    /// Editing state targeting one field of `event_id`.
    pub fn editing(event_id: i64, field: EditField) -> Self {
        Self {
            step: Step::Editing,
            event_id: Some(event_id),
            edit_field: Some(field),
        }
    }
}

/// Non-photo media kinds the transport can hand us when a photo is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Video file.
    Video,
    /// Generic document; `image` is set when it declares an image content type.
    Document {
        /// Document declares an `image/*` MIME type.
        image: bool,
    },
    /// Sticker.
    Sticker,
    /// GIF animation.
    Animation,
    /// Voice message.
    Voice,
    /// Audio file.
    Audio,
    /// Round video note.
    VideoNote,
}

impl MediaKind {
    /// Wording inserted into the "please send a photo" rejection message.
    pub fn label_ru(&self) -> &'static str {
        match self {
            Self::Video => "видео",
            Self::Document { image: true } => {
                "документ-изображение (отправьте как фото, а не документ)"
            }
            Self::Document { image: false } => "документ",
            Self::Sticker => "стикер",
            Self::Animation => "GIF",
            Self::Voice => "голосовое сообщение",
            Self::Audio => "аудио",
            Self::VideoNote => "видеосообщение",
        }
    }
}

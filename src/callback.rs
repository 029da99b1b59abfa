//! Inline-button payloads as a tagged enum.
//!
//! The wire format (`edit_theme_42`, `submit_42`, `skip_photo`, …) exists
//! only at the transport boundary: payloads are encoded when a keyboard is
//! built and decoded once per incoming callback. Core dispatch logic never
//! sees raw strings.

use crate::types::EditField;

/// A decoded inline-button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Revise one field of a record from the preview.
    Edit {
        /// Field to revise.
        field: EditField,
        /// Target record.
        event_id: i64,
    },
    /// Submit a finished record to moderation.
    Submit {
        /// Target record.
        event_id: i64,
    },
    /// Abandon the flow from the preview of a specific record.
    Cancel {
        /// Record whose preview carried the button.
        event_id: i64,
    },
    /// Moderator approval of a pending record.
    Approve {
        /// Target record.
        event_id: i64,
    },
    /// Moderator rejection of a pending record.
    Reject {
        /// Target record.
        event_id: i64,
    },
    /// Skip the photo step.
    SkipPhoto,
    /// Abandon the flow from a collection-step prompt.
    CancelCreation,
}

impl CallbackAction {
    /// Encode into the wire payload carried by an inline button.
    pub fn encode(&self) -> String {
        match self {
            Self::Edit { field, event_id } => format!("edit_{}_{event_id}", field.as_str()),
            Self::Submit { event_id } => format!("submit_{event_id}"),
            Self::Cancel { event_id } => format!("cancel_{event_id}"),
            Self::Approve { event_id } => format!("approve_{event_id}"),
            Self::Reject { event_id } => format!("reject_{event_id}"),
            Self::SkipPhoto => "skip_photo".to_owned(),
            Self::CancelCreation => "cancel_creation".to_owned(),
        }
    }

    /// Decode a wire payload. Returns `None` for unrecognized payloads,
    /// which the router logs and ignores.
    pub fn parse(data: &str) -> Option<Self> {
        // Fixed payloads first: "cancel_creation" must not be read as a
        // "cancel_{id}" form.
        match data {
            "skip_photo" => return Some(Self::SkipPhoto),
            "cancel_creation" => return Some(Self::CancelCreation),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("edit_") {
            let (field, id) = rest.rsplit_once('_')?;
            return Some(Self::Edit {
                field: EditField::parse(field).ok()?,
                event_id: id.parse().ok()?,
            });
        }
        if let Some(id) = data.strip_prefix("submit_") {
            return Some(Self::Submit {
                event_id: id.parse().ok()?,
            });
        }
        if let Some(id) = data.strip_prefix("cancel_") {
            return Some(Self::Cancel {
                event_id: id.parse().ok()?,
            });
        }
        if let Some(id) = data.strip_prefix("approve_") {
            return Some(Self::Approve {
                event_id: id.parse().ok()?,
            });
        }
        if let Some(id) = data.strip_prefix("reject_") {
            return Some(Self::Reject {
                event_id: id.parse().ok()?,
            });
        }
        None
    }
}

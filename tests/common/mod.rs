//! Shared test fixtures: a recording mock channel and store seeding helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use anonsbot::channel::{Channel, ChannelError, Keyboard};
use anonsbot::store::{EventPatch, EventStore};
use anonsbot::types::{ChatRef, MessageRef, PhotoRef, UserRef};

/// One recorded outbound operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text {
        to: ChatRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        to: ChatRef,
        photo: PhotoRef,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    EditText {
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    EditCaption {
        message: MessageRef,
        caption: String,
        keyboard: Option<Keyboard>,
    },
}

impl Outbound {
    /// The user-visible text of the operation, whatever its kind.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text, .. } | Self::EditText { text, .. } => text,
            Self::Photo { caption, .. } | Self::EditCaption { caption, .. } => caption,
        }
    }
}

/// Recording [`Channel`] with a switchable failure mode.
#[derive(Debug, Default)]
pub struct MockChannel {
    sent: Mutex<Vec<Outbound>>,
    fail: AtomicBool,
    next_message_id: AtomicI32,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            next_message_id: AtomicI32::new(100),
        })
    }

    /// Make every subsequent call fail with a delivery error.
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().expect("mock lock poisoned").clone()
    }

    /// True if any recorded operation's body contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.sent().iter().any(|op| op.body().contains(needle))
    }

    fn check_failure(&self) -> Result<(), ChannelError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChannelError::Delivery("mock failure".to_owned()));
        }
        Ok(())
    }

    fn record(&self, op: Outbound, to: ChatRef) -> MessageRef {
        self.sent.lock().expect("mock lock poisoned").push(op);
        MessageRef {
            chat: to,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn send_text(
        &self,
        to: ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        self.check_failure()?;
        Ok(self.record(
            Outbound::Text {
                to,
                text: text.to_owned(),
                keyboard,
            },
            to,
        ))
    }

    async fn send_photo(
        &self,
        to: ChatRef,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        self.check_failure()?;
        Ok(self.record(
            Outbound::Photo {
                to,
                photo: photo.clone(),
                caption: caption.to_owned(),
                keyboard,
            },
            to,
        ))
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        self.check_failure()?;
        self.record(
            Outbound::EditText {
                message: *message,
                text: text.to_owned(),
                keyboard,
            },
            message.chat,
        );
        Ok(())
    }

    async fn edit_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        self.check_failure()?;
        self.record(
            Outbound::EditCaption {
                message: *message,
                caption: caption.to_owned(),
                keyboard,
            },
            message.chat,
        );
        Ok(())
    }
}

/// A user fixture with full identity parts.
pub fn user(id: i64) -> UserRef {
    UserRef {
        id,
        first_name: Some("Анна".to_owned()),
        last_name: Some("Иванова".to_owned()),
        username: Some("anna_walk".to_owned()),
    }
}

/// A plain-text reply surface in the user's private chat.
pub fn plain_surface(user_id: i64) -> anonsbot::channel::ReplySurface {
    anonsbot::channel::ReplySurface::Plain(MessageRef {
        chat: ChatRef(user_id),
        message_id: 1,
    })
}

/// Fresh in-memory store.
pub async fn store() -> Arc<EventStore> {
    Arc::new(
        EventStore::open_in_memory()
            .await
            .expect("in-memory store should open"),
    )
}

/// Create a record with all required fields filled, in `creating` status.
pub async fn seed_submittable(store: &EventStore, user_id: i64, with_photo: bool) -> i64 {
    let event_id = store
        .create_event(user_id, Some("anna_walk"))
        .await
        .expect("create should succeed");
    let patch = EventPatch {
        theme: Some("Прогулка в парке".to_owned()),
        place: Some("Парк Горького".to_owned()),
        contact: Some("@anna_walk".to_owned()),
        event_time: Some("Суббота, 14:00".to_owned()),
        photo_file_id: with_photo.then(|| Some(PhotoRef("photo-123".to_owned()))),
        ..EventPatch::default()
    };
    store
        .update_event(event_id, &patch)
        .await
        .expect("seed update should succeed");
    event_id
}

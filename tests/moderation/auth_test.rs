//! Ownership and moderator-identity gates.

use std::sync::Arc;

use anonsbot::channel::Channel;
use anonsbot::moderation::{Moderation, ModerationError};
use anonsbot::store::EventStore;
use anonsbot::types::{ChatRef, EventStatus};

use crate::common::{self, MockChannel};

const MODERATION_CHAT: ChatRef = ChatRef(-100);
const PUBLISH_CHANNEL: ChatRef = ChatRef(-200);

async fn fixture() -> (Arc<EventStore>, Arc<MockChannel>, Moderation) {
    let store = common::store().await;
    let channel = MockChannel::new();
    let moderation = Moderation::new(
        Arc::clone(&store),
        Arc::clone(&channel) as Arc<dyn Channel>,
        MODERATION_CHAT,
        PUBLISH_CHANNEL,
    );
    (store, channel, moderation)
}

async fn status_of(store: &EventStore, event_id: i64) -> EventStatus {
    store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("event should exist")
        .status
}

#[tokio::test]
async fn submit_by_non_author_never_mutates() {
    let (store, channel, moderation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;

    let intruder = common::user(999);
    let result = moderation
        .submit(&intruder, &common::plain_surface(999), event_id)
        .await;

    assert!(matches!(result, Err(ModerationError::Unauthorized)));
    assert_eq!(status_of(&store, event_id).await, EventStatus::Creating);
    // Nothing reached the moderation chat.
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn submit_of_missing_event_is_not_found() {
    let (_store, channel, moderation) = fixture().await;

    let result = moderation
        .submit(&common::user(7), &common::plain_surface(7), 9999)
        .await;

    assert!(matches!(result, Err(ModerationError::NotFound)));
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn approve_from_wrong_chat_never_changes_status() {
    let (store, channel, moderation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;
    moderation
        .submit(&common::user(7), &common::plain_surface(7), event_id)
        .await
        .expect("submit should succeed");
    let sends_after_submit = channel.sent().len();

    // A pressed approve control relayed from some other chat.
    let result = moderation
        .approve(ChatRef(-300), &common::plain_surface(7), event_id)
        .await;

    assert!(matches!(result, Err(ModerationError::Unauthorized)));
    assert_eq!(status_of(&store, event_id).await, EventStatus::Pending);
    assert_eq!(channel.sent().len(), sends_after_submit);
}

#[tokio::test]
async fn reject_from_wrong_chat_never_changes_status() {
    let (store, _channel, moderation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;
    moderation
        .submit(&common::user(7), &common::plain_surface(7), event_id)
        .await
        .expect("submit should succeed");

    let result = moderation
        .reject(ChatRef(7), &common::plain_surface(7), event_id)
        .await;

    assert!(matches!(result, Err(ModerationError::Unauthorized)));
    assert_eq!(status_of(&store, event_id).await, EventStatus::Pending);
}

#[tokio::test]
async fn author_identity_does_not_bypass_the_moderator_gate() {
    let (store, _channel, moderation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;
    moderation
        .submit(&common::user(7), &common::plain_surface(7), event_id)
        .await
        .expect("submit should succeed");

    // The author approving from their own chat must be refused.
    let result = moderation
        .approve(ChatRef(7), &common::plain_surface(7), event_id)
        .await;

    assert!(matches!(result, Err(ModerationError::Unauthorized)));
    assert_eq!(status_of(&store, event_id).await, EventStatus::Pending);
}

//! Cancellation: state cleared, draft record left behind.

use std::sync::Arc;

use anonsbot::channel::Channel;
use anonsbot::config::Limits;
use anonsbot::engine::Conversation;
use anonsbot::store::EventStore;
use anonsbot::types::{ChatRef, ConversationState, EventStatus, Step};

use crate::common::{self, MockChannel};

async fn fixture() -> (Arc<EventStore>, Arc<MockChannel>, Conversation) {
    let store = common::store().await;
    let channel = MockChannel::new();
    let conversation = Conversation::new(
        Arc::clone(&store),
        Arc::clone(&channel) as Arc<dyn Channel>,
        Limits::default(),
    );
    (store, channel, conversation)
}

#[tokio::test]
async fn cancel_clears_state_but_keeps_the_draft() {
    let (store, channel, conversation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;
    store
        .set_state(7, &ConversationState::at(Step::WaitingPhoto, event_id))
        .await
        .expect("set_state should succeed");

    conversation
        .cancel_command(7, ChatRef(7))
        .await
        .expect("cancel should succeed");

    assert!(store
        .get_state(7)
        .await
        .expect("get_state should succeed")
        .is_none());

    // The abandoned draft stays behind in creating status.
    let event = store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("draft should survive");
    assert_eq!(event.status, EventStatus::Creating);

    assert!(channel.saw("❌ Создание анонса отменено."));
}

#[tokio::test]
async fn cancel_with_no_state_is_a_no_op() {
    let (store, _channel, conversation) = fixture().await;

    conversation
        .cancel_command(7, ChatRef(7))
        .await
        .expect("cancel should not fail");

    assert!(store
        .get_state(7)
        .await
        .expect("get_state should succeed")
        .is_none());
}

#[tokio::test]
async fn cancel_from_control_rewrites_message_and_restores_menu() {
    let (store, channel, conversation) = fixture().await;
    let event_id = common::seed_submittable(&store, 7, false).await;
    store
        .set_state(7, &ConversationState::at(Step::Preview, event_id))
        .await
        .expect("set_state should succeed");

    conversation
        .cancel_from_control(7, &common::plain_surface(7))
        .await
        .expect("cancel should succeed");

    assert!(store
        .get_state(7)
        .await
        .expect("get_state should succeed")
        .is_none());
    assert!(channel.saw("❌ Создание анонса отменено."));
    assert!(channel.saw("Главное меню:"));
}

#[tokio::test]
async fn starting_a_new_flow_supersedes_the_old_state() {
    let (store, _channel, conversation) = fixture().await;
    let user = common::user(7);

    let old_event = common::seed_submittable(&store, 7, false).await;
    store
        .set_state(7, &ConversationState::at(Step::WaitingContact, old_event))
        .await
        .expect("set_state should succeed");

    conversation
        .start(&user, ChatRef(7))
        .await
        .expect("start should succeed");

    let state = store
        .get_state(7)
        .await
        .expect("get_state should succeed")
        .expect("state should exist");
    assert_eq!(state.step, Step::WaitingTheme);
    assert_ne!(state.event_id, Some(old_event));

    // The abandoned draft is not deleted.
    assert!(store
        .get_event(old_event)
        .await
        .expect("get should succeed")
        .is_some());
}

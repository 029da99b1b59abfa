//! The linear collection flow, theme through preview.

use std::sync::Arc;

use anonsbot::channel::Channel;
use anonsbot::config::Limits;
use anonsbot::engine::Conversation;
use anonsbot::store::EventStore;
use anonsbot::types::{ChatRef, ConversationState, EventStatus, PhotoRef, Step};

use crate::common::{self, MockChannel, Outbound};

struct Fixture {
    store: Arc<EventStore>,
    channel: Arc<MockChannel>,
    conversation: Conversation,
}

async fn fixture() -> Fixture {
    let store = common::store().await;
    let channel = MockChannel::new();
    let conversation = Conversation::new(
        Arc::clone(&store),
        Arc::clone(&channel) as Arc<dyn Channel>,
        Limits::default(),
    );
    Fixture {
        store,
        channel,
        conversation,
    }
}

async fn state_of(store: &EventStore, user_id: i64) -> ConversationState {
    store
        .get_state(user_id)
        .await
        .expect("get_state should succeed")
        .expect("state should exist")
}

#[tokio::test]
async fn start_creates_draft_and_asks_for_theme() {
    let f = fixture().await;
    let user = common::user(7);

    f.conversation
        .start(&user, ChatRef(7))
        .await
        .expect("start should succeed");

    let state = state_of(&f.store, 7).await;
    assert_eq!(state.step, Step::WaitingTheme);
    let event_id = state.event_id.expect("event should be linked");

    let event = f
        .store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("draft should exist");
    assert_eq!(event.status, EventStatus::Creating);
    assert_eq!(event.user_id, 7);

    assert!(f.channel.saw("1️⃣"));
}

#[tokio::test]
async fn valid_theme_advances_to_place() {
    let f = fixture().await;
    let user = common::user(7);
    f.conversation
        .start(&user, ChatRef(7))
        .await
        .expect("start should succeed");
    let state = state_of(&f.store, 7).await;
    let event_id = state.event_id.expect("event should be linked");

    f.conversation
        .handle_text(&user, ChatRef(7), &state, "Прогулка в парке")
        .await
        .expect("handle should succeed");

    let event = f
        .store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("event should exist");
    assert_eq!(event.theme.as_deref(), Some("Прогулка в парке"));
    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingPlace);
    assert!(f.channel.saw("✅ Тема сохранена: Прогулка в парке"));
}

#[tokio::test]
async fn too_short_theme_reprompts_without_advancing() {
    let f = fixture().await;
    let user = common::user(7);
    f.conversation
        .start(&user, ChatRef(7))
        .await
        .expect("start should succeed");
    let state = state_of(&f.store, 7).await;
    let event_id = state.event_id.expect("event should be linked");

    f.conversation
        .handle_text(&user, ChatRef(7), &state, "ab")
        .await
        .expect("handle should succeed");

    let event = f
        .store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("event should exist");
    assert!(event.theme.is_none(), "invalid input must not be stored");
    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingTheme);
    assert!(f.channel.saw("❌ Тема должна содержать от 3 до 100 символов"));
}

#[tokio::test]
async fn text_during_photo_step_reprompts_without_advancing() {
    let f = fixture().await;
    let user = common::user(7);
    let event_id = common::seed_submittable(&f.store, 7, false).await;
    f.store
        .set_state(7, &ConversationState::at(Step::WaitingPhoto, event_id))
        .await
        .expect("set_state should succeed");
    let state = state_of(&f.store, 7).await;

    f.conversation
        .handle_text(&user, ChatRef(7), &state, "вот текст вместо фото")
        .await
        .expect("handle should succeed");

    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingPhoto);
    let event = f
        .store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("event should exist");
    assert!(event.photo_file_id.is_none());
    assert!(f.channel.saw("Сейчас ожидается фото"));
}

#[tokio::test]
async fn full_happy_path_with_photo_skip_reaches_preview() {
    let f = fixture().await;
    let user = common::user(7);
    let chat = ChatRef(7);

    f.conversation
        .start(&user, chat)
        .await
        .expect("start should succeed");

    for text in [
        "Прогулка в парке",
        "Парк Горького\nhttps://maps.google.com/xyz",
        "@anna_walk",
        "Суббота, 14:00",
    ] {
        let state = state_of(&f.store, 7).await;
        f.conversation
            .handle_text(&user, chat, &state, text)
            .await
            .expect("step should succeed");
    }

    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingPhoto);

    f.conversation
        .skip_photo(7, &common::plain_surface(7))
        .await
        .expect("skip should succeed");
    let state = state_of(&f.store, 7).await;
    assert_eq!(state.step, Step::WaitingDescription);

    f.conversation
        .handle_text(&user, chat, &state, "/skip")
        .await
        .expect("description skip should succeed");

    let state = state_of(&f.store, 7).await;
    assert_eq!(state.step, Step::Preview);
    let event = f
        .store
        .get_event(state.event_id.expect("event should be linked"))
        .await
        .expect("get should succeed")
        .expect("event should exist");
    assert_eq!(event.status, EventStatus::Creating);
    assert!(event.is_submittable());
    assert!(event.photo_file_id.is_none());
    assert!(event.description.is_none());

    assert!(f.channel.saw("🎯 <b>ПРЕДПРОСМОТР АНОНСА</b>"));
}

#[tokio::test]
async fn photo_is_stored_and_preview_uses_caption() {
    let f = fixture().await;
    let user = common::user(7);
    let event_id = common::seed_submittable(&f.store, 7, false).await;
    f.store
        .set_state(7, &ConversationState::at(Step::WaitingPhoto, event_id))
        .await
        .expect("set_state should succeed");
    let state = state_of(&f.store, 7).await;

    f.conversation
        .handle_photo(&user, ChatRef(7), &state, PhotoRef("file-abc".to_owned()))
        .await
        .expect("photo should be accepted");

    let event = f
        .store
        .get_event(event_id)
        .await
        .expect("get should succeed")
        .expect("event should exist");
    assert_eq!(event.photo_file_id, Some(PhotoRef("file-abc".to_owned())));
    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingDescription);

    // Finishing the description must preview as a photo caption.
    let state = state_of(&f.store, 7).await;
    f.conversation
        .handle_text(&user, ChatRef(7), &state, "Берите термос")
        .await
        .expect("description should be accepted");

    let preview = f
        .channel
        .sent()
        .into_iter()
        .find(|op| matches!(op, Outbound::Photo { .. }))
        .expect("preview should be sent as a photo");
    assert!(preview.body().contains("ПРЕДПРОСМОТР"));
}

#[tokio::test]
async fn overlong_description_reprompts_with_char_count() {
    let f = fixture().await;
    let user = common::user(7);
    let event_id = common::seed_submittable(&f.store, 7, false).await;
    f.store
        .set_state(
            7,
            &ConversationState::at(Step::WaitingDescription, event_id),
        )
        .await
        .expect("set_state should succeed");
    let state = state_of(&f.store, 7).await;

    let long = "д".repeat(501);
    f.conversation
        .handle_text(&user, ChatRef(7), &state, &long)
        .await
        .expect("handle should succeed");

    assert_eq!(state_of(&f.store, 7).await.step, Step::WaitingDescription);
    assert!(f.channel.saw("слишком длинное (501/500 символов)"));
}

#[tokio::test]
async fn stale_skip_press_is_ignored() {
    let f = fixture().await;
    let event_id = common::seed_submittable(&f.store, 7, false).await;
    f.store
        .set_state(7, &ConversationState::at(Step::Preview, event_id))
        .await
        .expect("set_state should succeed");

    f.conversation
        .skip_photo(7, &common::plain_surface(7))
        .await
        .expect("stale skip should not fail");

    assert_eq!(state_of(&f.store, 7).await.step, Step::Preview);
    assert!(f.channel.sent().is_empty());
}

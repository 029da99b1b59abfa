//! Control-payload encoding and decoding at the transport boundary.

use anonsbot::callback::CallbackAction;
use anonsbot::types::EditField;

#[test]
fn encodes_the_fixed_prefix_scheme() {
    assert_eq!(
        CallbackAction::Edit {
            field: EditField::Theme,
            event_id: 42
        }
        .encode(),
        "edit_theme_42"
    );
    assert_eq!(CallbackAction::Submit { event_id: 42 }.encode(), "submit_42");
    assert_eq!(CallbackAction::Cancel { event_id: 42 }.encode(), "cancel_42");
    assert_eq!(
        CallbackAction::Approve { event_id: 42 }.encode(),
        "approve_42"
    );
    assert_eq!(CallbackAction::Reject { event_id: 42 }.encode(), "reject_42");
    assert_eq!(CallbackAction::SkipPhoto.encode(), "skip_photo");
    assert_eq!(CallbackAction::CancelCreation.encode(), "cancel_creation");
}

#[test]
fn roundtrips_every_variant() {
    let actions = [
        CallbackAction::Edit {
            field: EditField::Description,
            event_id: 7,
        },
        CallbackAction::Edit {
            field: EditField::Photo,
            event_id: 1,
        },
        CallbackAction::Submit { event_id: 9000 },
        CallbackAction::Cancel { event_id: 3 },
        CallbackAction::Approve { event_id: 12 },
        CallbackAction::Reject { event_id: 12 },
        CallbackAction::SkipPhoto,
        CallbackAction::CancelCreation,
    ];
    for action in actions {
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }
}

#[test]
fn cancel_creation_is_not_read_as_a_cancel_id() {
    assert_eq!(
        CallbackAction::parse("cancel_creation"),
        Some(CallbackAction::CancelCreation)
    );
}

#[test]
fn rejects_unknown_and_malformed_payloads() {
    assert_eq!(CallbackAction::parse(""), None);
    assert_eq!(CallbackAction::parse("frobnicate_42"), None);
    assert_eq!(CallbackAction::parse("edit_42"), None);
    assert_eq!(CallbackAction::parse("edit_theme_"), None);
    assert_eq!(CallbackAction::parse("edit_banana_42"), None);
    assert_eq!(CallbackAction::parse("submit_notanumber"), None);
    assert_eq!(CallbackAction::parse("approve_"), None);
}

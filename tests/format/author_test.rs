//! Author identity strings.

use anonsbot::format::author_info;
use anonsbot::types::UserRef;

#[test]
fn all_parts_present() {
    let user = UserRef {
        id: 7,
        first_name: Some("Анна".to_owned()),
        last_name: Some("Иванова".to_owned()),
        username: Some("anna_walk".to_owned()),
    };
    assert_eq!(author_info(&user), "Анна Иванова @anna_walk (ID: 7)");
}

#[test]
fn partial_parts_are_skipped() {
    let user = UserRef {
        id: 7,
        first_name: Some("Анна".to_owned()),
        last_name: None,
        username: None,
    };
    assert_eq!(author_info(&user), "Анна (ID: 7)");
}

#[test]
fn falls_back_to_bare_id() {
    let user = UserRef {
        id: 7,
        first_name: None,
        last_name: None,
        username: None,
    };
    assert_eq!(author_info(&user), "ID: 7");
}

#[test]
fn empty_strings_count_as_absent() {
    let user = UserRef {
        id: 7,
        first_name: Some(String::new()),
        last_name: None,
        username: Some(String::new()),
    };
    assert_eq!(author_info(&user), "ID: 7");
}

//! JSON shapes of the model types with the `serde` feature enabled.

use reelsync_model::{ItemId, MediaItemQuery, SessionState, UserId};

#[test]
fn logged_in_session_round_trips_through_json() {
    let session = SessionState::LoggedIn {
        server_url: "http://example.com".into(),
        auth_token: "tok".into(),
        user_id: UserId::from("u1"),
    };

    let value = serde_json::to_value(&session).expect("serialize");
    assert_eq!(value["LoggedIn"]["user_id"], "u1");

    let parsed: SessionState =
        serde_json::from_value(value).expect("deserialize");

    assert_eq!(parsed, session);
}

#[test]
fn ids_serialize_transparently() {
    let query = MediaItemQuery::ChildrenOf {
        parent_id: ItemId::from("lib"),
    };
    let value = serde_json::to_value(&query).expect("serialize");
    assert_eq!(value["ChildrenOf"]["parent_id"], "lib");
}

//! Tests for message types.

use super::*;

#[test]
fn test_message_ids_are_unique() {
    let first = MessageId::new();
    let second = MessageId::new();
    assert_ne!(first, second);
    assert!(uuid::Uuid::parse_str(first.as_str()).is_ok());
}

#[test]
fn test_message_id_from_str() {
    let id: MessageId = "abc-123".parse().unwrap();
    assert_eq!(id.as_str(), "abc-123");
    assert_eq!(id.to_string(), "abc-123");

    let empty = "".parse::<MessageId>();
    assert!(matches!(empty, Err(ValidationError::Required { .. })));

    let blank = "   ".parse::<MessageId>();
    assert!(blank.is_err());
}

#[test]
fn test_message_id_rejects_path_separators_and_control_characters() {
    for raw in ["a/b", "/", "line\nbreak", "tab\there"] {
        let result = raw.parse::<MessageId>();
        assert!(
            matches!(result, Err(ValidationError::InvalidFormat { .. })),
            "{raw:?} should be rejected"
        );
    }

    let id: MessageId = "with?query#and-fragment".parse().unwrap();
    assert_eq!(id.as_str(), "with?query#and-fragment");
}

#[test]
fn test_new_message_is_available() {
    let message = Message::new(
        MessageId::new(),
        "hello".to_string(),
        Some(serde_json::json!({"attempt": 1})),
    );

    assert!(message.is_available());
    assert!(!message.lease_state.is_leased());
    assert_eq!(message.body, "hello");
    assert_eq!(message.payload, Some(serde_json::json!({"attempt": 1})));
}

#[test]
fn test_lease_state_serializes_snake_case() {
    let json = serde_json::to_string(&LeaseState::Leased).unwrap();
    assert_eq!(json, "\"leased\"");

    let state: LeaseState = serde_json::from_str("\"available\"").unwrap();
    assert_eq!(state, LeaseState::Available);
}

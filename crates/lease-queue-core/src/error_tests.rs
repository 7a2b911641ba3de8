//! Tests for error types.

use super::*;

#[test]
fn test_error_kinds() {
    assert_eq!(
        QueueError::NotFound {
            id: "abc".to_string()
        }
        .kind(),
        ErrorKind::NotFound
    );

    assert_eq!(
        QueueError::LeaseExpiredOrInvalid {
            id: "abc".to_string()
        }
        .kind(),
        ErrorKind::LeaseExpiredOrInvalid
    );

    assert_eq!(
        QueueError::ValidationError(ValidationError::Required {
            field: "message_id".to_string()
        })
        .kind(),
        ErrorKind::InvalidArgument
    );

    assert_eq!(
        QueueError::from(ConfigurationError::Invalid {
            key: "lease_duration_ms".to_string(),
            message: "not a number".to_string()
        })
        .kind(),
        ErrorKind::Configuration
    );
}

#[test]
fn test_no_error_is_transient() {
    let errors = vec![
        QueueError::InvalidArgument {
            field: "body".to_string(),
            message: "must not be empty".to_string(),
        },
        QueueError::NotFound {
            id: "x".to_string(),
        },
        QueueError::LeaseExpiredOrInvalid {
            id: "x".to_string(),
        },
        QueueError::storage_fault("identifier collision"),
    ];

    for error in errors {
        assert!(!error.is_transient(), "{error} should not be transient");
    }
}

#[test]
fn test_error_display_includes_identifier() {
    let error = QueueError::LeaseExpiredOrInvalid {
        id: "msg-42".to_string(),
    };
    assert!(error.to_string().contains("msg-42"));
    assert_eq!(error.kind().to_string(), "lease_expired_or_invalid");
}

//! Tests for queue configuration.

use super::*;
use serial_test::serial;

mod parsing {
    use super::*;

    #[test]
    fn test_default_lease_duration() {
        let config = QueueConfig::default();
        assert_eq!(config.lease_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_is_legal() {
        let config = QueueConfig::parse_lease_duration("0").unwrap();
        assert_eq!(config.lease_duration(), Duration::ZERO);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let config = QueueConfig::parse_lease_duration(" 250 ").unwrap();
        assert_eq!(config.lease_duration_ms, 250);
    }

    #[test]
    fn test_non_numeric_is_rejected() {
        let result = QueueConfig::parse_lease_duration("ten seconds");
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));

        let negative = QueueConfig::parse_lease_duration("-5");
        assert!(negative.is_err());
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());

        let config: QueueConfig = serde_json::from_str(r#"{"lease_duration_ms": 5}"#).unwrap();
        assert_eq!(config.lease_duration(), Duration::from_millis(5));
    }
}

mod environment {
    use super::*;

    #[test]
    #[serial]
    fn test_from_env_unset_uses_default() {
        std::env::remove_var(LEASE_DURATION_ENV);
        let config = QueueConfig::from_env().unwrap();
        assert_eq!(config, QueueConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_milliseconds() {
        std::env::set_var(LEASE_DURATION_ENV, "1500");
        let config = QueueConfig::from_env();
        std::env::remove_var(LEASE_DURATION_ENV);

        assert_eq!(config.unwrap().lease_duration(), Duration::from_millis(1500));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        std::env::set_var(LEASE_DURATION_ENV, "soon");
        let config = QueueConfig::from_env();
        std::env::remove_var(LEASE_DURATION_ENV);

        assert!(config.is_err());
    }
}

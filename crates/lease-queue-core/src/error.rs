//! Error types for queue operations.

use thiserror::Error;

/// Stable classification of a [`QueueError`], used by boundary collaborators
/// to map failures onto their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    LeaseExpiredOrInvalid,
    StorageFault,
    Configuration,
}

impl ErrorKind {
    /// Get the kind as a snake_case string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::LeaseExpiredOrInvalid => "lease_expired_or_invalid",
            Self::StorageFault => "storage_fault",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for all queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Message not found: {id}")]
    NotFound { id: String },

    #[error("Lease for message '{id}' has expired or was never granted")]
    LeaseExpiredOrInvalid { id: String },

    #[error("Storage fault: {message}")]
    StorageFault { message: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
}

impl QueueError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::LeaseExpiredOrInvalid { .. } => ErrorKind::LeaseExpiredOrInvalid,
            Self::StorageFault { .. } => ErrorKind::StorageFault,
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::ValidationError(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Check if error is transient and should be retried.
    ///
    /// Nothing in this taxonomy is retried: redelivery happens through lease
    /// expiry, never by repeating a failed call.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } => false,
            Self::NotFound { .. } => false,
            Self::LeaseExpiredOrInvalid { .. } => false,
            Self::StorageFault { .. } => false,
            Self::ConfigurationError(_) => false,
            Self::ValidationError(_) => false,
        }
    }

    pub(crate) fn storage_fault(message: impl Into<String>) -> Self {
        Self::StorageFault {
            message: message.into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

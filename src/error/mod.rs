//! Error types shared across the cache and configuration layers.

use thiserror::Error;

use crate::http::StatusCode;

/// A failed fetch or mutation.
///
/// `FetchError` is `Clone` because a single in-flight request fans its result
/// out to every subscriber waiting on the same key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("backend reported failure: {0}")]
    Api(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("cached value for {key} has a different type than requested")]
    TypeMismatch { key: String },

    #[error("fetch was cancelled")]
    Cancelled,
}

impl FetchError {
    /// Builds a [`FetchError::Status`] from a numeric status code.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status: StatusCode::from_u16(code),
            message: message.into(),
        }
    }

    /// Returns `true` when the backend said the resource does not exist.
    ///
    /// Retrying such a failure would spend a round trip on an answer that
    /// will not change.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: StatusCode::NotFound,
                ..
            }
        )
    }

    /// The backend status attached to this error, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors raised while loading [`QueryClientConfig`](crate::config::QueryClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(FetchError::status(404, "no such service").is_not_found());
        assert!(!FetchError::status(500, "boom").is_not_found());
        assert!(!FetchError::Network("reset".into()).is_not_found());
    }

    #[test]
    fn status_code_accessor() {
        let err = FetchError::status(503, "maintenance");
        assert_eq!(err.status_code(), Some(StatusCode::ServiceUnavailable));
        assert_eq!(FetchError::Cancelled.status_code(), None);
    }

    #[test]
    fn display_includes_status() {
        let err = FetchError::status(404, "missing");
        assert_eq!(err.to_string(), "backend returned 404 Not Found: missing");
    }
}

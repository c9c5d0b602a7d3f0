use reqwest::StatusCode;
use thiserror::Error;

use crate::model::{EntityId, RecordError, Resource};

/// Everything that can end a single user action against the course API.
///
/// No variant is retried; the caller surfaces it and the user tries again.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("nothing to update")]
    EmptyPayload,

    #[error("no {resource} row with id {id}")]
    UnknownEntity { resource: Resource, id: EntityId },

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Text shown to the user in an error notice
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_uses_server_text() {
        let err = ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Progress cannot be changed after certification".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Progress cannot be changed after certification"
        );

        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: String::new(),
        };
        assert!(err.user_message().contains("502"));
    }

    #[test]
    fn test_rejected_message_passthrough() {
        let err = ApiError::Rejected("Location is in use".to_string());
        assert_eq!(err.user_message(), "Location is in use");
        assert!(!err.is_cancelled());
        assert!(ApiError::Cancelled.is_cancelled());
    }
}

// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Local key/value storage could not be read, written or parsed.
    Storage(String),

    // Transport failure or 5xx while talking to the quiz API.
    Network(String),

    // Webcam or fullscreen device refused, missing or busy.
    Device(String),

    // Malformed quiz payload (no questions, bad options, zero duration).
    InvalidQuiz(String),

    // 401 from the quiz API
    AuthError(String),

    // 404 from the quiz API
    NotFound(String),

    // Any other 4xx: the request itself was refused, resending will not help.
    Rejected(String),

    // The controller was torn down or its task has exited.
    SessionClosed,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "storage error: {}", msg),
            AppError::Network(msg) => write!(f, "network error: {}", msg),
            AppError::Device(msg) => write!(f, "device error: {}", msg),
            AppError::InvalidQuiz(msg) => write!(f, "invalid quiz: {}", msg),
            AppError::AuthError(msg) => write!(f, "unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Rejected(msg) => write!(f, "rejected: {}", msg),
            AppError::SessionClosed => write!(f, "quiz session is closed"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Text shown to the student for this error.
    /// Storage faults are never surfaced, so they map to `None`.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AppError::Storage(msg) => {
                tracing::warn!("Suppressed storage fault: {}", msg);
                None
            }
            AppError::Network(_) => Some(
                "Failed to submit quiz. Please check your connection and try again.".to_string(),
            ),
            AppError::Device(msg) => Some(format!("Webcam unavailable: {}", msg)),
            AppError::InvalidQuiz(_) => Some("Unable to load this quiz.".to_string()),
            AppError::AuthError(_) => Some("Please sign in again.".to_string()),
            AppError::NotFound(msg) => Some(msg.clone()),
            AppError::Rejected(_) => Some("The quiz server rejected the submission.".to_string()),
            AppError::SessionClosed => Some("This quiz session has ended.".to_string()),
        }
    }

    /// Whether the submission pipeline should retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_))
    }
}

/// Converts `sqlx::Error` into `AppError::Storage`.
/// Allows using `?` operator on store queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_faults_are_never_shown() {
        assert_eq!(AppError::Storage("bad json".into()).user_message(), None);
    }

    #[test]
    fn network_faults_ask_to_retry() {
        let msg = AppError::Network("timeout".into()).user_message().unwrap();
        assert!(msg.contains("check your connection and try again"));
        assert!(AppError::Network("timeout".into()).is_transient());
        assert!(!AppError::NotFound("quiz".into()).is_transient());
    }

    #[test]
    fn rejected_requests_are_final() {
        let err = AppError::Rejected("results returned 422".into());
        assert!(!err.is_transient());
        assert_eq!(
            err.user_message().as_deref(),
            Some("The quiz server rejected the submission.")
        );
    }
}

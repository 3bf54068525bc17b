//! Error types for the warehouse API client.
//!
//! # Design
//! Each variant is one outcome class the calling layer reacts to
//! differently. `AuthExpired`, `Unauthenticated`, `NotFound` and
//! `Redirected` are resolved by navigation (see [`ApiError::navigation`]);
//! `ValidationFailure` carries the backend's message for the UI to show.
//! `Transport` means no status was ever obtained.

use thiserror::Error;

use crate::navigation::{Navigation, Notice};

/// Fixed message for rejected logins. The backend's body is never surfaced.
pub const LOGIN_REJECTED_MESSAGE: &str = "invalid login or password";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No token in memory or storage and the caller is not on the login view.
    /// Raised before any request is sent.
    #[error("no session token, login required")]
    Unauthenticated,

    /// The backend answered 403. The session has been cleared.
    #[error("session expired or access denied")]
    AuthExpired,

    /// Task detail answered 404.
    #[error("task not found")]
    NotFound,

    /// Task detail answered some other non-200 status.
    #[error("unexpected status {status}")]
    Redirected { status: u16 },

    /// A mutating write did not answer 201. Displays the body verbatim.
    #[error("{0}")]
    ValidationFailure(String),

    #[error("{}", LOGIN_REJECTED_MESSAGE)]
    LoginRejected,

    /// The request never produced a status (connection refused, DNS, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Token storage could not be written.
    #[error("token storage failure: {0}")]
    Storage(String),

    /// The session token could not be decoded into an identity.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// The navigation the calling layer should perform for this error, if any.
    pub fn navigation(&self) -> Option<Navigation> {
        match self {
            ApiError::Unauthenticated | ApiError::AuthExpired => Some(Navigation::Login),
            ApiError::NotFound | ApiError::Redirected { .. } => Some(Navigation::Home),
            _ => None,
        }
    }

    /// A notice to show the user alongside the navigation.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ApiError::NotFound => Some(Notice::TaskNotFound),
            _ => None,
        }
    }

    /// Errors the caller can act on (show, retry) rather than being
    /// resolved by navigation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApiError::ValidationFailure(_) | ApiError::LoginRejected | ApiError::Transport(_)
        )
    }
}

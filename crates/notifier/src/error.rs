use reqwest::StatusCode;
use thiserror::Error;

/// Login against the chat backend failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The homeserver answered but refused the credentials.
    #[error("Login rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },

    /// The homeserver could not be reached.
    #[error("Homeserver unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The homeserver answered with something that is not a usable login.
    #[error("Invalid login response: {0}")]
    InvalidResponse(String),
}

/// Transmitting a message failed.
#[derive(Debug, Error)]
pub enum SendError {
    /// `send` was called without an authenticated session.
    #[error("Session is not connected")]
    NotConnected,

    /// The homeserver answered with an error status.
    #[error("Send rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },

    /// The request never completed.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

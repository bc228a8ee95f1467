//! Session state machine for the chat backend connection.
//!
//! ```text
//! Disconnected ──ensure_connected()──▶ Authenticating ──ok──▶ Connected
//!       ▲                                   │                    │
//!       └──────────── login error ──────────┘                    │
//!       └──────────── reset() after a send error ────────────────┘
//! ```
//!
//! The session never retries on its own. Whoever owns it decides when to
//! reconnect.

use async_trait::async_trait;

use crate::error::{AuthError, SendError};

/// Account credentials used to log in.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Outbound chat protocol operations.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Authenticate and obtain an access token.
    async fn login(&self, credentials: &Credentials) -> Result<AccessToken, AuthError>;

    /// Post `body` as a plain-text message to `room_id`.
    async fn send_text(
        &self,
        token: &AccessToken,
        room_id: &str,
        body: &str,
    ) -> Result<(), SendError>;
}

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Authenticating,
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Authenticating => write!(f, "authenticating"),
            SessionState::Connected => write!(f, "connected"),
        }
    }
}

#[derive(Debug)]
enum Connection {
    Disconnected,
    Authenticating,
    Connected(AccessToken),
}

/// Authenticated connection to the chat backend.
pub struct Session<B> {
    backend: B,
    credentials: Credentials,
    connection: Connection,
}

impl<B: ChatBackend> Session<B> {
    pub fn new(backend: B, credentials: Credentials) -> Self {
        Self {
            backend,
            credentials,
            connection: Connection::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.connection {
            Connection::Disconnected => SessionState::Disconnected,
            Connection::Authenticating => SessionState::Authenticating,
            Connection::Connected(_) => SessionState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    /// Log in unless already connected.
    pub async fn ensure_connected(&mut self) -> Result<(), AuthError> {
        if self.is_connected() {
            return Ok(());
        }

        self.connection = Connection::Authenticating;
        tracing::debug!(user = %self.credentials.user, "Logging in to chat backend");

        match self.backend.login(&self.credentials).await {
            Ok(token) => {
                self.connection = Connection::Connected(token);
                tracing::info!(user = %self.credentials.user, "Chat session established");
                Ok(())
            }
            Err(e) => {
                self.connection = Connection::Disconnected;
                Err(e)
            }
        }
    }

    /// Send a plain-text message. Requires a connected session.
    pub async fn send(&self, room_id: &str, message: &str) -> Result<(), SendError> {
        let Connection::Connected(token) = &self.connection else {
            return Err(SendError::NotConnected);
        };
        self.backend.send_text(token, room_id, message).await
    }

    /// Drop the current token and return to `Disconnected`.
    pub fn reset(&mut self) {
        self.connection = Connection::Disconnected;
    }

    #[cfg(test)]
    fn backend(&self) -> &B {
        &self.backend
    }
}

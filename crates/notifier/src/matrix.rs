//! Matrix client-server API backend.
//!
//! Only the two calls the relay needs: password login and posting an
//! `m.room.message` event. Every send uses a fresh transaction id so a
//! homeserver never collapses two distinct alerts into one event.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, SendError};
use crate::session::{AccessToken, ChatBackend, Credentials};

/// HTTP client for a single Matrix homeserver.
#[derive(Debug, Clone)]
pub struct MatrixClient {
    http: reqwest::Client,
    homeserver: Url,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    identifier: UserIdentifier<'a>,
    password: &'a str,
    initial_device_display_name: &'static str,
}

#[derive(Debug, Serialize)]
struct UserIdentifier<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    event_id: Option<String>,
}

/// Standard Matrix error body (`{"errcode": "...", "error": "..."}`).
#[derive(Debug, Deserialize)]
struct MatrixErrorBody {
    errcode: Option<String>,
    error: Option<String>,
}

impl MatrixClient {
    pub fn new(homeserver: &str, timeout: Duration) -> anyhow::Result<Self> {
        let homeserver = Url::parse(homeserver)
            .map_err(|e| anyhow::anyhow!("Invalid homeserver URL {homeserver:?}: {e}"))?;
        if homeserver.cannot_be_a_base() {
            anyhow::bail!("Homeserver URL {homeserver} cannot be used as a base URL");
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, homeserver })
    }

    /// Build `{homeserver}/_matrix/client/v3/{segments...}` with each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.homeserver.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["_matrix", "client", "v3"])
                .extend(segments);
        }
        url
    }
}

#[async_trait]
impl ChatBackend for MatrixClient {
    async fn login(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let request = LoginRequest {
            kind: "m.login.password",
            identifier: UserIdentifier {
                kind: "m.id.user",
                user: &credentials.user,
            },
            password: &credentials.password,
            initial_device_display_name: "alert-relay",
        };

        let response = self
            .http
            .post(self.endpoint(&["login"]))
            .json(&request)
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(AuthError::Rejected { status, detail });
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let token = login
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("no access_token in response".into()))?;

        tracing::debug!(
            user_id = login.user_id.as_deref().unwrap_or("unknown"),
            "Matrix login succeeded"
        );
        Ok(AccessToken::new(token))
    }

    async fn send_text(
        &self,
        token: &AccessToken,
        room_id: &str,
        body: &str,
    ) -> Result<(), SendError> {
        let txn_id = Uuid::new_v4().to_string();
        let url = self.endpoint(&["rooms", room_id, "send", "m.room.message", &txn_id]);

        let response = self
            .http
            .put(url)
            .bearer_auth(token.as_str())
            .json(&TextMessage {
                msgtype: "m.text",
                body,
            })
            .send()
            .await
            .map_err(SendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(SendError::Rejected { status, detail });
        }

        let event_id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.event_id);
        tracing::debug!(
            room_id,
            txn_id = %txn_id,
            event_id = event_id.as_deref().unwrap_or("unknown"),
            "Matrix event sent"
        );
        Ok(())
    }
}

/// Summarise an error response as `ERRCODE: message`, falling back to the raw
/// body or the status reason.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<MatrixErrorBody>(&body) {
        Ok(MatrixErrorBody {
            errcode: Some(code),
            error,
        }) => match error {
            Some(message) => format!("{code}: {message}"),
            None => code,
        },
        _ if !body.trim().is_empty() => body,
        _ => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
    }
}

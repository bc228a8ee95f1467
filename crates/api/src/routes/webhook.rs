//! Grafana webhook receiver.
//!
//! Accepting an alert only means it was queued. Delivery to the chat room
//! happens later on the delivery worker and its outcome is never reported
//! back to the caller.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use relay_common::error::AppError;
use relay_common::format::format_alert_message;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(receive_alert))
}

/// POST /webhook — format an alert and queue it for delivery.
async fn receive_alert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let alert = parse_alert(&body)?;
    let message = format_alert_message(&alert);

    let rule_id = alert.get("ruleId").cloned().unwrap_or_default();

    state.queue.enqueue(message);
    tracing::info!(
        status = alert.get("status").and_then(|v| v.as_str()).unwrap_or("unknown"),
        rule_id = %rule_id,
        "Alert accepted"
    );

    Ok(Json(json!({ "status": "success" })))
}

fn parse_alert(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyPayload);
    }

    let alert: Value =
        serde_json::from_slice(body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    if is_blank(&alert) {
        return Err(AppError::EmptyPayload);
    }
    Ok(alert)
}

/// Payloads that carry nothing worth relaying: `null`, `false`, `0`, `""`,
/// `[]` and `{}`.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

//! Grafana alert formatting.
//!
//! Turns a legacy Grafana webhook notification into the plain-text body that
//! is posted to the chat room. Formatting never fails: payloads that do not
//! have the expected shape are rendered as an error notice carrying the raw
//! JSON, so the alert still reaches the room.

use serde_json::Value;

/// Heading of every relayed alert.
pub const ALERT_HEADING: &str = "🚨 Grafana Alert";

/// Format a Grafana alert payload into a human-readable message.
pub fn format_alert_message(alert: &Value) -> String {
    match try_format(alert) {
        Ok(message) => message,
        Err(reason) => format!("Error formatting alert: {}\nRaw data: {}", reason, alert),
    }
}

fn try_format(alert: &Value) -> Result<String, String> {
    let fields = alert
        .as_object()
        .ok_or_else(|| "payload is not a JSON object".to_string())?;

    let status = display_field(fields.get("status"), "unknown");
    let rule_id = display_field(fields.get("ruleId"), "unknown");
    let message = display_field(fields.get("message"), "No message provided");

    let mut formatted = format!(
        "{}\nStatus: {}\nRule ID: {}\nMessage: {}",
        ALERT_HEADING, status, rule_id, message
    );

    if let Some(matches) = fields.get("evalMatches") {
        let matches = matches
            .as_array()
            .ok_or_else(|| "evalMatches is not a list".to_string())?;

        formatted.push_str("\n\nEvaluation Results:");
        for entry in matches {
            let entry = entry
                .as_object()
                .ok_or_else(|| "evalMatches entry is not an object".to_string())?;
            let metric = display_field(entry.get("metric"), "N/A");
            let value = display_field(entry.get("value"), "N/A");
            formatted.push_str(&format!("\n- {}: {}", metric, value));
        }
    }

    Ok(formatted)
}

/// Render a scalar field, falling back to `default` when absent or null.
fn display_field(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

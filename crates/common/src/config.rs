use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

/// Environment variables that must be present before the relay can start.
pub const REQUIRED_VARS: [&str; 4] = [
    "MATRIX_HOMESERVER",
    "MATRIX_USER",
    "MATRIX_PASSWORD",
    "MATRIX_ROOM_ID",
];

/// Global application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Matrix homeserver base URL (e.g. `https://matrix.example.org`)
    pub matrix_homeserver: String,

    /// Localpart or full user ID of the relay account
    pub matrix_user: String,

    /// Password for the relay account
    pub matrix_password: String,

    /// Room that receives every relayed alert
    pub matrix_room_id: String,

    /// Address the webhook listener binds to (default: 0.0.0.0:5000)
    pub listen_addr: SocketAddr,

    /// Fixed wait after a login or send failure, in seconds (default: 5)
    pub retry_backoff_secs: u64,

    /// Wait between empty-queue checks, in milliseconds (default: 1000)
    pub poll_interval_ms: u64,

    /// Per-request timeout for homeserver calls, in seconds (default: 30)
    pub matrix_request_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as missing. Every missing required variable
    /// is reported in a single error so operators can fix them in one pass.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        Ok(Self {
            matrix_homeserver: required("MATRIX_HOMESERVER")?
                .trim_end_matches('/')
                .to_string(),
            matrix_user: required("MATRIX_USER")?,
            matrix_password: required("MATRIX_PASSWORD")?,
            matrix_room_id: required("MATRIX_ROOM_ID")?,
            listen_addr: get("LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LISTEN_ADDR must be a valid socket address"))?,
            retry_backoff_secs: get("RETRY_BACKOFF_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .ok()
                .filter(|&secs: &u64| secs > 0)
                .ok_or_else(|| anyhow::anyhow!("RETRY_BACKOFF_SECS must be a positive u64"))?,
            poll_interval_ms: get("POLL_INTERVAL_MS")
                .unwrap_or_else(|| "1000".to_string())
                .parse()
                .ok()
                .filter(|&ms: &u64| ms > 0)
                .ok_or_else(|| anyhow::anyhow!("POLL_INTERVAL_MS must be a positive u64"))?,
            matrix_request_timeout_secs: get("MATRIX_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("MATRIX_REQUEST_TIMEOUT_SECS must be a valid u64")
                })?,
        })
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn matrix_request_timeout(&self) -> Duration {
        Duration::from_secs(self.matrix_request_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("matrix_homeserver", &self.matrix_homeserver)
            .field("matrix_user", &self.matrix_user)
            .field("matrix_password", &"<redacted>")
            .field("matrix_room_id", &self.matrix_room_id)
            .field("listen_addr", &self.listen_addr)
            .field("retry_backoff_secs", &self.retry_backoff_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("matrix_request_timeout_secs", &self.matrix_request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete() -> HashMap<String, String> {
        vars(&[
            ("MATRIX_HOMESERVER", "https://matrix.example.org/"),
            ("MATRIX_USER", "alertbot"),
            ("MATRIX_PASSWORD", "hunter2"),
            ("MATRIX_ROOM_ID", "!ops:example.org"),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let env = complete();
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.matrix_homeserver, "https://matrix.example.org");
        assert_eq!(config.listen_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.retry_backoff(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.matrix_request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_all_missing_vars_reported() {
        let env = vars(&[("MATRIX_USER", "alertbot"), ("MATRIX_PASSWORD", "  ")]);
        let err = AppConfig::from_lookup(|k| env.get(k).cloned())
            .unwrap_err()
            .to_string();

        assert!(err.contains("MATRIX_HOMESERVER"));
        assert!(err.contains("MATRIX_PASSWORD"));
        assert!(err.contains("MATRIX_ROOM_ID"));
        assert!(!err.contains("MATRIX_USER"));
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut env = complete();
        env.insert("RETRY_BACKOFF_SECS".into(), "soon".into());
        let err = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("RETRY_BACKOFF_SECS"));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        for key in ["RETRY_BACKOFF_SECS", "POLL_INTERVAL_MS"] {
            let mut env = complete();
            env.insert(key.into(), "0".into());
            let err = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
            assert!(err.to_string().contains(key), "{key}=0 should be rejected");
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let env = complete();
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}

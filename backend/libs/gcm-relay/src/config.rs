use std::str::FromStr;
use std::time::Duration;

use crate::errors::RelayError;
use crate::validation::{MessageLimits, MAX_REGISTRATION_IDS, MAX_TIME_TO_LIVE};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// FCM v1 send endpoint for a Firebase project
pub fn send_endpoint(project_id: &str) -> String {
    format!(
        "https://fcm.googleapis.com/v1/projects/{}/messages:send",
        project_id
    )
}

/// Relay client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Kept for compatibility with legacy callers; bearer tokens authenticate requests
    pub api_key: String,
    /// Deadline applied by the HTTP client to every request
    pub request_timeout: Duration,
    pub limits: MessageLimits,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            limits: MessageLimits::default(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_limits(mut self, limits: MessageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Load configuration from the process environment
    ///
    /// * `FCM_SEND_ENDPOINT` - full send URL; falls back to the v1 endpoint of `FCM_PROJECT_ID`
    /// * `FCM_API_KEY` - required
    /// * `FCM_REQUEST_TIMEOUT_SECS` - default 30
    /// * `FCM_MAX_TARGETS` - default 1000
    /// * `FCM_MAX_TIME_TO_LIVE` - default 2419200
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = match lookup("FCM_SEND_ENDPOINT") {
            Some(endpoint) => endpoint,
            None => {
                let project_id = lookup("FCM_PROJECT_ID").ok_or_else(|| {
                    RelayError::Config(
                        "either FCM_SEND_ENDPOINT or FCM_PROJECT_ID must be set".to_string(),
                    )
                })?;
                send_endpoint(&project_id)
            }
        };

        let api_key = lookup("FCM_API_KEY")
            .ok_or_else(|| RelayError::Config("FCM_API_KEY must be set".to_string()))?;

        let timeout_secs =
            parse_or(&lookup, "FCM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let max_targets = parse_or(&lookup, "FCM_MAX_TARGETS", MAX_REGISTRATION_IDS)?;
        let max_time_to_live = parse_or(&lookup, "FCM_MAX_TIME_TO_LIVE", MAX_TIME_TO_LIVE)?;

        Ok(Self {
            endpoint,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
            limits: MessageLimits {
                max_targets,
                max_time_to_live,
                ..MessageLimits::default()
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RelayError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            RelayError::Config(format!("Failed to parse environment variable {}", key))
        }),
        None => Ok(default),
    }
}

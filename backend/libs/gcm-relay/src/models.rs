use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{RelayError, ValidationError};

/// Custom key/value payload, kept in insertion order
pub type DataPayload = Map<String, Value>;

/// Legacy multi-target push request
///
/// Mirrors the legacy HTTP JSON shape (`registration_ids`, `time_to_live`, ...)
/// so existing producers can hand their payloads over unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "registration_ids", default)]
    pub targets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    #[serde(default)]
    pub notification: Notification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataPayload>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delay_while_idle: bool,
    #[serde(default)]
    pub time_to_live: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_package_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

impl Message {
    /// Create a message addressed to the given registration tokens
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: Some(targets.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Parse a legacy JSON payload.
    ///
    /// A literal `null` document is rejected as a missing message; every other
    /// rule is left to validation.
    pub fn from_legacy_json(bytes: &[u8]) -> Result<Self, RelayError> {
        let parsed: Option<Message> =
            serde_json::from_slice(bytes).map_err(RelayError::InvalidMessage)?;
        parsed.ok_or_else(|| ValidationError::MissingMessage.into())
    }

    /// Registration tokens, empty when none were supplied
    pub fn targets(&self) -> &[String] {
        self.targets.as_deref().unwrap_or_default()
    }

    pub fn with_collapse_key(mut self, collapse_key: impl Into<String>) -> Self {
        self.collapse_key = Some(collapse_key.into());
        self
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = notification;
        self
    }

    pub fn with_data(mut self, data: DataPayload) -> Self {
        self.data = Some(data);
        self
    }

    /// Insert a single custom payload entry
    pub fn with_data_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_delay_while_idle(mut self, delay_while_idle: bool) -> Self {
        self.delay_while_idle = delay_while_idle;
        self
    }

    /// Seconds the service may hold the message for an offline device
    pub fn with_time_to_live(mut self, seconds: i64) -> Self {
        self.time_to_live = seconds;
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_restricted_package_name(mut self, package: impl Into<String>) -> Self {
        self.restricted_package_name = Some(package.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Legacy display fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn with_click_action(mut self, click_action: impl Into<String>) -> Self {
        self.click_action = Some(click_action.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: WireMessage,
}

/// Single-recipient message in the v1 shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    pub notification: WireNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataPayload>,
    #[serde(skip_serializing_if = "is_false")]
    pub delay_while_idle: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub time_to_live: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_package_name: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
    pub android: AndroidConfig,
}

/// FCM Notification Payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Android-specific block; carries what the shared notification cannot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Decoded FCM API response, kept as the service sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryResult(pub Value);

impl DeliveryResult {
    /// Resource name of the accepted message (`projects/*/messages/*`), if present
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Outcome of one target in a best-effort multicast
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: String,
    pub result: Result<DeliveryResult, RelayError>,
}

/// Multicast send result
#[derive(Debug)]
pub struct MulticastSendResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<TargetOutcome>,
}

/// Firebase Service Account Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

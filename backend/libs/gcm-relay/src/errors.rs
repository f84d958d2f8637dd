use thiserror::Error;

/// Rejections produced by message validation, before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the message must not be null")]
    MissingMessage,

    #[error("the message's registration_ids field must not be null")]
    MissingTargets,

    #[error("the message must specify at least one registration ID")]
    EmptyTargets,

    #[error("the message may specify at most {max} registration IDs")]
    TooManyTargets { max: usize },

    #[error("the message's time_to_live field must be an integer between 0 and {max}, got {value}")]
    TimeToLiveOutOfRange { value: i64, max: i64 },

    #[error("priority must be one of [{}], got {value:?}", .allowed.join(", "))]
    InvalidPriority { value: String, allowed: Vec<String> },
}

/// Credential exchange failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid service account credentials: {0}")]
    InvalidCredentials(#[source] serde_json::Error),

    #[error("Failed to parse private key: {0}")]
    KeyParse(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to get access token: {0}")]
    TokenRequest(#[source] reqwest::Error),

    #[error("Token request failed with status {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Failed to parse token response: {0}")]
    TokenParse(#[source] reqwest::Error),
}

/// The delivery service answered, but not with something usable
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("FCM API error: {status} - {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse FCM response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Relay Client Error Types
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Malformed legacy message: {0}")]
    InvalidMessage(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Failed to encode FCM message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("FCM send request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RelayError {
    /// True when the failure happened before anything was sent to the service.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RelayError::Config(_)
                | RelayError::InvalidMessage(_)
                | RelayError::Validation(_)
                | RelayError::Encode(_)
        )
    }
}

impl From<RelayError> for String {
    fn from(err: RelayError) -> Self {
        err.to_string()
    }
}

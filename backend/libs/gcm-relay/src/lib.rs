//! GCM Relay Library
//!
//! Accepts push requests in the legacy GCM/FCM HTTP shape and delivers them
//! through the Firebase Cloud Messaging v1 API.
//!
//! It handles:
//! - Validation of legacy messages before any network call
//! - Translation into one v1 message per registration token
//! - OAuth2 access tokens from Google service-account credentials
//! - Sequential delivery with stop-on-first-error or best-effort multicast

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod translate;
pub mod validation;

pub use auth::{AccessToken, ServiceAccountTokenProvider, TokenProvider, FIREBASE_MESSAGING_SCOPE};
pub use client::FcmClient;
pub use config::{send_endpoint, ClientConfig};
pub use errors::{AuthError, ProtocolError, RelayError, ValidationError};
pub use models::{
    DataPayload, DeliveryResult, Message, MulticastSendResult, Notification, ServiceAccountKey,
    TargetOutcome, WireMessage,
};
pub use translate::translate;
pub use validation::MessageLimits;

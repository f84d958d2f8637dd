use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::{debug, error, info, warn};

use crate::auth::{ServiceAccountTokenProvider, TokenProvider};
use crate::config::ClientConfig;
use crate::errors::{ProtocolError, RelayError};
use crate::models::*;
use crate::translate::translate;
use crate::validation::MessageLimits;

/// Legacy-to-v1 Firebase Cloud Messaging Client
///
/// Accepts legacy multi-target messages, translates them into one v1 message
/// per registration token and posts them one after another. Tokens are
/// fetched per send and never cached.
pub struct FcmClient {
    endpoint: Url,
    api_key: String,
    limits: MessageLimits,
    http_client: reqwest::blocking::Client,
    token_provider: Arc<dyn TokenProvider>,
}

impl FcmClient {
    /// Create new client for the given send endpoint
    ///
    /// # Arguments
    /// * `endpoint` - FCM v1 `messages:send` URL
    /// * `api_key` - legacy server key; required but not used for authentication
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, RelayError> {
        Self::from_config(&ClientConfig::new(endpoint, api_key))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RelayError> {
        if config.endpoint.is_empty() {
            return Err(RelayError::Config("missing FCM endpoint url".to_string()));
        }

        if config.api_key.is_empty() {
            return Err(RelayError::Config("missing API Key".to_string()));
        }

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            RelayError::Config(format!("failed to parse URL {:?}: {}", config.endpoint, e))
        })?;

        let http_client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            endpoint = %endpoint,
            max_targets = config.limits.max_targets,
            "Initialized FCM relay client"
        );

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            limits: config.limits.clone(),
            token_provider: Arc::new(ServiceAccountTokenProvider::new(http_client.clone())),
            http_client,
        })
    }

    /// Replace the HTTP client used for deliveries
    pub fn with_http_client(mut self, http_client: reqwest::blocking::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Replace the credential exchange
    pub fn with_token_provider<P>(mut self, provider: P) -> Self
    where
        P: TokenProvider + 'static,
    {
        self.token_provider = Arc::new(provider);
        self
    }

    pub fn with_limits(mut self, limits: MessageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn limits(&self) -> &MessageLimits {
        &self.limits
    }

    /// Send a message to every target, stopping at the first failure.
    ///
    /// Returns one result per target, in target order. A failure partway
    /// through discards the collected results even though earlier targets
    /// have already been delivered.
    pub fn send(
        &self,
        message: &Message,
        credentials: &[u8],
    ) -> Result<Vec<DeliveryResult>, RelayError> {
        let access_token = self.authorize(message, credentials)?;
        let targets = message.targets();

        let mut results = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            match self.deliver(message, target, &access_token) {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(
                        index,
                        remaining = targets.len() - index - 1,
                        token = %token_prefix(target),
                        "FCM delivery failed, aborting batch: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(results)
    }

    /// Send a message to every target, continuing past individual failures.
    ///
    /// Validation and credential errors still abort before anything is sent.
    pub fn send_multicast(
        &self,
        message: &Message,
        credentials: &[u8],
    ) -> Result<MulticastSendResult, RelayError> {
        let access_token = self.authorize(message, credentials)?;

        let mut results = Vec::with_capacity(message.targets().len());
        let mut success_count = 0;
        let mut failure_count = 0;

        for target in message.targets() {
            let result = self.deliver(message, target, &access_token);
            match &result {
                Ok(_) => success_count += 1,
                Err(e) => {
                    warn!(token = %token_prefix(target), "FCM delivery failed: {}", e);
                    failure_count += 1;
                }
            }
            results.push(TargetOutcome {
                target: target.clone(),
                result,
            });
        }

        Ok(MulticastSendResult {
            success_count,
            failure_count,
            results,
        })
    }

    fn authorize(&self, message: &Message, credentials: &[u8]) -> Result<String, RelayError> {
        self.limits.validate(message)?;

        let token = self.token_provider.access_token(credentials)?;
        debug!(
            targets = message.targets().len(),
            expires_at = token.expires_at,
            "Acquired FCM access token"
        );

        Ok(token.access_token)
    }

    fn deliver(
        &self,
        message: &Message,
        target: &str,
        access_token: &str,
    ) -> Result<DeliveryResult, RelayError> {
        let envelope = FcmMessage {
            message: translate(message, target),
        };
        let body = serde_json::to_vec(&envelope).map_err(RelayError::Encode)?;

        debug!(token = %token_prefix(target), "Posting FCM message");

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(RelayError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProtocolError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = response.bytes().map_err(RelayError::Transport)?;
        let result: DeliveryResult =
            serde_json::from_slice(&bytes).map_err(ProtocolError::Decode)?;

        info!(
            token = %token_prefix(target),
            name = result.name().unwrap_or_default(),
            "FCM message accepted"
        );

        Ok(result)
    }
}

fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

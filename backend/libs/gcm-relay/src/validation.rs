//! Legacy message validation
//!
//! Limits are carried by [`MessageLimits`] rather than hard-coded so a client
//! can be configured for a different quota without touching the rules.

use crate::errors::ValidationError;
use crate::models::Message;

/// Max number of registration IDs in one message
pub const MAX_REGISTRATION_IDS: usize = 1000;

/// Max time (seconds) FCM storage keeps a message while the device is offline: 4 weeks
pub const MAX_TIME_TO_LIVE: i64 = 2_419_200;

pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_NORMAL: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLimits {
    pub max_targets: usize,
    pub max_time_to_live: i64,
    pub priorities: Vec<String>,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_targets: MAX_REGISTRATION_IDS,
            max_time_to_live: MAX_TIME_TO_LIVE,
            priorities: vec![PRIORITY_HIGH.to_string(), PRIORITY_NORMAL.to_string()],
        }
    }
}

impl MessageLimits {
    /// Check a message against these limits. First failing rule wins.
    pub fn validate(&self, message: &Message) -> Result<(), ValidationError> {
        let targets = message
            .targets
            .as_ref()
            .ok_or(ValidationError::MissingTargets)?;

        if targets.is_empty() {
            return Err(ValidationError::EmptyTargets);
        }

        if targets.len() > self.max_targets {
            return Err(ValidationError::TooManyTargets {
                max: self.max_targets,
            });
        }

        if message.time_to_live < 0 || message.time_to_live > self.max_time_to_live {
            return Err(ValidationError::TimeToLiveOutOfRange {
                value: message.time_to_live,
                max: self.max_time_to_live,
            });
        }

        match message.priority.as_deref() {
            None | Some("") => {}
            Some(priority) if self.priorities.iter().any(|p| p == priority) => {}
            Some(priority) => {
                return Err(ValidationError::InvalidPriority {
                    value: priority.to_string(),
                    allowed: self.priorities.clone(),
                })
            }
        }

        Ok(())
    }
}

impl Message {
    /// Validate against the default FCM limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        MessageLimits::default().validate(self)
    }
}

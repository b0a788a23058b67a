use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::STATUS_FAILURE;
use crate::CorrelationToken;

/// Completion notification published by the platform installer
///
/// `action` and `package` identify the broadcast channel and the receiving
/// application. A notification without a status is treated as a generic
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub action: String,
    pub package: String,
    #[serde(default = "default_status")]
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<CorrelationToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_action: Option<UserActionDescriptor>,
}

fn default_status() -> i32 {
    STATUS_FAILURE
}

impl CompletionEvent {
    /// Create a notification for a given channel and application
    #[must_use]
    pub fn new(action: impl Into<String>, package: impl Into<String>, status: i32) -> Self {
        Self {
            action: action.into(),
            package: package.into(),
            status,
            message: None,
            token: None,
            user_action: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: CorrelationToken) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn with_user_action(mut self, user_action: UserActionDescriptor) -> Self {
        self.user_action = Some(user_action);
        self
    }
}

/// What the platform needs the host to launch so the user can confirm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActionDescriptor {
    pub intent: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl UserActionDescriptor {
    #[must_use]
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            extras: BTreeMap::new(),
        }
    }
}

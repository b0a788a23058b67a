use serde::{Deserialize, Serialize};

/// The single terminal reply sent back to the caller over the method bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BridgeResponse {
    Success {
        status: i32,
        message: String,
    },
    Error {
        code: String,
        message: String,
        /// Installer status category, absent for setup errors
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    NotImplemented,
}

impl BridgeResponse {
    #[must_use]
    pub fn success(status: i32, message: impl Into<String>) -> Self {
        Self::Success {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Attach a status category; no-op on anything but an error
    #[must_use]
    pub fn with_status(mut self, value: i32) -> Self {
        if let Self::Error { status, .. } = &mut self {
            *status = Some(value);
        }
        self
    }

    /// Attach details; no-op on anything but an error
    #[must_use]
    pub fn with_details(mut self, value: impl Into<String>) -> Self {
        if let Self::Error { details, .. } = &mut self {
            *details = Some(value.into());
        }
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error code, when this is an error response
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

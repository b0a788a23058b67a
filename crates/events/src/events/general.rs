use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Events not tied to a single install attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    Warning {
        message: String,
        context: Option<String>,
    },

    Error {
        message: String,
        details: Option<String>,
    },

    DebugLog {
        message: String,
        context: HashMap<String, String>,
    },

    OperationStarted {
        operation: String,
    },

    OperationCompleted {
        operation: String,
        success: bool,
    },
}

impl GeneralEvent {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            details: None,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
            context: HashMap::new(),
        }
    }
}

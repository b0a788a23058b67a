use serde::{Deserialize, Serialize};

/// Placeholder used when the installer supplied no message
pub const NO_MESSAGE: &str = "No message";

/// Domain-level result of an install attempt
///
/// Every variant except [`InstallOutcome::UserActionPending`] is terminal.
/// Failure categories carry the installer's message verbatim when one was
/// supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstallOutcome {
    Success { message: Option<String> },
    UserActionPending { message: Option<String> },
    Cancelled { message: Option<String> },
    Blocked { message: Option<String> },
    Conflict { message: Option<String> },
    Incompatible { message: Option<String> },
    InvalidArtifact { message: Option<String> },
    StorageFailure { message: Option<String> },
    GenericFailure { message: Option<String> },
    UnknownStatus { code: i32, message: Option<String> },
    /// No completion arrived before the caller's deadline
    TimedOut,
}

impl InstallOutcome {
    /// Whether this outcome ends the request's lifecycle
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::UserActionPending { .. })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Raw message from the installer, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message }
            | Self::UserActionPending { message }
            | Self::Cancelled { message }
            | Self::Blocked { message }
            | Self::Conflict { message }
            | Self::Incompatible { message }
            | Self::InvalidArtifact { message }
            | Self::StorageFailure { message }
            | Self::GenericFailure { message }
            | Self::UnknownStatus { message, .. } => message.as_deref(),
            Self::TimedOut => None,
        }
    }

    /// Numeric status reported to the caller
    ///
    /// These are the bridge's own numbers, not the platform's raw codes:
    /// unknown statuses pass their raw code through unchanged.
    #[must_use]
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::Success { .. } => Some(0),
            Self::GenericFailure { .. } => Some(1),
            Self::Blocked { .. } => Some(2),
            Self::Cancelled { .. } => Some(3),
            Self::Conflict { .. } => Some(4),
            Self::Incompatible { .. } => Some(5),
            Self::InvalidArtifact { .. } => Some(6),
            Self::StorageFailure { .. } => Some(7),
            Self::UnknownStatus { code, .. } => Some(*code),
            Self::UserActionPending { .. } | Self::TimedOut => None,
        }
    }

    /// Error code for outcomes reported as bridge errors
    ///
    /// Success and user cancellation are reported as successful responses and
    /// have no error code.
    #[must_use]
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::GenericFailure { .. } => Some("INSTALL_FAILURE_DEVICE"),
            Self::Blocked { .. } => Some("INSTALL_BLOCKED"),
            Self::Conflict { .. } => Some("INSTALL_CONFLICT"),
            Self::Incompatible { .. } => Some("INSTALL_INCOMPATIBLE"),
            Self::InvalidArtifact { .. } => Some("INSTALL_INVALID_APK"),
            Self::StorageFailure { .. } => Some("INSTALL_STORAGE_ISSUE"),
            Self::UnknownStatus { .. } => Some("INSTALL_UNKNOWN_STATUS"),
            Self::TimedOut => Some("INSTALL_TIMED_OUT"),
            Self::Success { .. } | Self::Cancelled { .. } | Self::UserActionPending { .. } => None,
        }
    }

    /// Human-readable description for the caller
    #[must_use]
    pub fn describe(&self) -> String {
        let m = self.message().unwrap_or(NO_MESSAGE);
        match self {
            Self::Success { .. } => "Installation successful".to_string(),
            Self::UserActionPending { .. } => format!("Installation awaiting user action: {m}"),
            Self::Cancelled { .. } => format!("Installation cancelled by user: {m}"),
            Self::Blocked { .. } => format!("Installation blocked: {m}"),
            Self::Conflict { .. } => format!("Installation conflict: {m}"),
            Self::Incompatible { .. } => format!("Installation incompatible: {m}"),
            Self::InvalidArtifact { .. } => format!("Installation invalid APK: {m}"),
            Self::StorageFailure { .. } => format!("Installation storage issue: {m}"),
            Self::GenericFailure { .. } => format!("Installation failed: {m}"),
            Self::UnknownStatus { code, .. } => {
                format!("Installation unknown status {code}: {m}")
            }
            Self::TimedOut => "Installation timed out waiting for the installer".to_string(),
        }
    }
}

impl std::fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

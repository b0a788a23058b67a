//! Errors raised synchronously while setting up an installer session

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Failure before the OS installer takes over.
///
/// Every variant is reported to the caller immediately and never retried
/// automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SetupError {
    #[error("artifact not found at {path}")]
    ArtifactNotFound { path: String },

    #[error("failed to transfer artifact: {message}")]
    TransferFailed { message: String },

    #[error("an installation is already in progress ({token})")]
    InstallInProgress { token: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl SetupError {
    /// Build a transfer failure from an I/O error
    #[must_use]
    pub fn transfer(err: &std::io::Error) -> Self {
        Self::TransferFailed {
            message: err.to_string(),
        }
    }

    /// Stable code sent back over the method bridge
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InstallInProgress { .. } => "INSTALL_IN_PROGRESS",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
        }
    }
}

impl UserFacingError for SetupError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ArtifactNotFound { .. } => Some("Check that the artifact was fully downloaded."),
            Self::InstallInProgress { .. } => {
                Some("Wait for the current installation to finish before starting another.")
            }
            Self::TransferFailed { .. } => Some("Free some space on the device and retry."),
            Self::InvalidArgument { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(self.code())
    }
}

//! Errors surfaced by installer backends

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BackendError {
    #[error("failed to create installer session: {message}")]
    SessionCreateFailed { message: String },

    #[error("commit failed for session {session_id}: {message}")]
    CommitFailed { session_id: String, message: String },

    #[error("failed to launch user confirmation: {message}")]
    LaunchFailed { message: String },
}

impl UserFacingError for BackendError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::SessionCreateFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::SessionCreateFailed { .. } => "backend.session_create_failed",
            Self::CommitFailed { .. } => "backend.commit_failed",
            Self::LaunchFailed { .. } => "backend.launch_failed",
        })
    }
}

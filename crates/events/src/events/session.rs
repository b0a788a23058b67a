use serde::{Deserialize, Serialize};
use sideload_types::{CorrelationToken, InstallOutcome};
use std::path::PathBuf;

use super::FailureContext;

/// Installer session domain events, from request through final outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Caller asked for an artifact to be installed
    InstallRequested { path: PathBuf },

    /// Request failed before the installer took over
    InstallRejected {
        path: PathBuf,
        failure: FailureContext,
    },

    /// Installer session opened for an artifact of `artifact_size` bytes
    SessionCreated {
        session_id: String,
        artifact_size: u64,
    },

    /// All artifact bytes written and synced into the session
    TransferCompleted { session_id: String, bytes: u64 },

    /// Session discarded after a setup failure
    SessionAbandoned { session_id: String, reason: String },

    /// Session committed; the installer now owns the operation
    Committed {
        session_id: String,
        token: CorrelationToken,
    },

    /// Installer is waiting on the user to confirm
    UserActionRequired {
        token: CorrelationToken,
        has_descriptor: bool,
    },

    /// Terminal outcome delivered to the caller
    Completed {
        token: CorrelationToken,
        outcome: InstallOutcome,
    },

    /// Terminal outcome produced but the caller had already gone away
    OutcomeDropped {
        token: CorrelationToken,
        outcome: InstallOutcome,
    },

    /// Completion notification that matched no pending install
    Orphaned {
        token: Option<CorrelationToken>,
        status: i32,
    },

    /// Caller stopped waiting before the installer answered
    TimedOut { token: CorrelationToken },

    /// Completion channel subscribed or unsubscribed
    SubscriptionChanged { subscribed: bool },

    /// Notification ignored by the subscription
    NotificationIgnored {
        action: String,
        package: String,
        reason: String,
    },
}

impl SessionEvent {
    /// Correlation token carried by this event, if any
    #[must_use]
    pub fn correlation_token(&self) -> Option<CorrelationToken> {
        match self {
            Self::Committed { token, .. }
            | Self::UserActionRequired { token, .. }
            | Self::Completed { token, .. }
            | Self::OutcomeDropped { token, .. }
            | Self::TimedOut { token } => Some(*token),
            Self::Orphaned { token, .. } => *token,
            _ => None,
        }
    }
}

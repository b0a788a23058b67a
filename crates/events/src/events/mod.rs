use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use sideload_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod session;

pub use general::*;
pub use session::*;

/// Top-level application event enum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    General(GeneralEvent),
    Session(SessionEvent),
}

impl AppEvent {
    /// Identify the source component for this event.
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Session(
                SessionEvent::SubscriptionChanged { .. } | SessionEvent::NotificationIgnored { .. },
            ) => EventSource::SUBSCRIPTION,
            Self::Session(_) => EventSource::SESSION,
        }
    }

    /// Default severity used when no explicit level is given.
    #[must_use]
    pub fn log_level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Error { .. }) => EventLevel::Error,
            Self::General(GeneralEvent::Warning { .. }) => EventLevel::Warn,
            Self::General(GeneralEvent::DebugLog { .. }) => EventLevel::Debug,
            Self::General(_) => EventLevel::Info,
            Self::Session(event) => match event {
                SessionEvent::InstallRejected { .. }
                | SessionEvent::SessionAbandoned { .. }
                | SessionEvent::TimedOut { .. } => EventLevel::Warn,
                SessionEvent::Orphaned { .. }
                | SessionEvent::OutcomeDropped { .. }
                | SessionEvent::NotificationIgnored { .. } => EventLevel::Debug,
                SessionEvent::Completed { outcome, .. } if !outcome.is_success() => {
                    EventLevel::Warn
                }
                _ => EventLevel::Info,
            },
        }
    }

    #[must_use]
    pub fn correlation_token(&self) -> Option<sideload_types::CorrelationToken> {
        match self {
            Self::Session(event) => event.correlation_token(),
            Self::General(_) => None,
        }
    }
}

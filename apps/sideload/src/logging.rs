//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so the
//! serve loop's lifecycle ends up in the same log stream as library logging.

use sideload_events::{AppEvent, EventMessage, GeneralEvent, SessionEvent};
use tracing::{debug, error, info, warn};

/// Log an event at the level its kind calls for
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::Session(session_event) => match session_event {
            SessionEvent::InstallRequested { path } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    path = %path.display(),
                    "Install requested"
                );
            }
            SessionEvent::InstallRejected { path, failure } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    path = %path.display(),
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Install rejected"
                );
            }
            SessionEvent::SessionCreated {
                session_id,
                artifact_size,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    artifact_size = artifact_size,
                    "Installer session created"
                );
            }
            SessionEvent::TransferCompleted { session_id, bytes } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    bytes = bytes,
                    "Artifact transferred"
                );
            }
            SessionEvent::SessionAbandoned { session_id, reason } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    reason = %reason,
                    "Installer session abandoned"
                );
            }
            SessionEvent::Committed { session_id, .. } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation,
                    session_id = %session_id,
                    "Installer session committed"
                );
            }
            SessionEvent::UserActionRequired { has_descriptor, .. } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation,
                    has_descriptor = has_descriptor,
                    "Waiting for user confirmation"
                );
            }
            SessionEvent::Completed { outcome, .. } => {
                if outcome.is_success() {
                    info!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation,
                        outcome = %outcome,
                        "Install completed"
                    );
                } else {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation,
                        status = ?outcome.status_code(),
                        code = ?outcome.error_code(),
                        outcome = %outcome,
                        "Install did not succeed"
                    );
                }
            }
            SessionEvent::OutcomeDropped { outcome, .. } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation,
                    outcome = %outcome,
                    "Install outcome arrived after the caller left"
                );
            }
            SessionEvent::Orphaned { token, status } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    token = ?token,
                    status = status,
                    "Completion notification matched no pending install"
                );
            }
            SessionEvent::TimedOut { .. } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation,
                    "Install timed out"
                );
            }
            SessionEvent::SubscriptionChanged { subscribed } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    subscribed = subscribed,
                    "Completion channel subscription changed"
                );
            }
            SessionEvent::NotificationIgnored {
                action,
                package,
                reason,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    action = %action,
                    package = %package,
                    reason = %reason,
                    "Notification ignored"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::OperationStarted { operation } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    info!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        operation = %operation,
                        success = success,
                        "Operation completed successfully"
                    );
                } else {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        operation = %operation,
                        success = success,
                        "Operation completed with issues"
                    );
                }
            }
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    context = ?context,
                    "Warning"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    details = ?details,
                    "Error"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    context = ?context,
                    "Debug log"
                );
            }
        },
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in sideload
//!
//! Library crates report what they are doing by emitting [`AppEvent`]s
//! through an [`EventEmitter`]. Each emission is wrapped with [`EventMeta`]
//! so consumers can correlate everything that happened for one install
//! attempt. The host binary drains the channel and turns events into
//! tracing records.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, FailureContext, GeneralEvent, SessionEvent};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its emission metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        if let Some(token) = event.correlation_token() {
            meta = meta.with_correlation(token);
        }
        Self { meta, event }
    }
}

pub type EventSender = UnboundedSender<EventMessage>;

pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout sideload
///
/// Implementors only need to expose their sender; everything else has a
/// default. Emission never fails: if nobody is listening the event is
/// discarded.
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    /// Hook for implementors to add labels before the event is sent
    fn enrich_event_meta(&self, _event: &AppEvent, _meta: &mut EventMeta) {}

    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    fn emit(&self, event: AppEvent) {
        let EventMessage { mut meta, event } = EventMessage::from_event(event);
        self.enrich_event_meta(&event, &mut meta);
        self.emit_with_meta(meta, event);
    }

    fn emit_session(&self, event: SessionEvent) {
        self.emit(AppEvent::Session(event));
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

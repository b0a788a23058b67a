//! Lifecycle-bound subscription to the installer's completion channel
//!
//! The host subscribes while it is in the foreground and unsubscribes when
//! it is backgrounded. Notifications that arrive while unsubscribed are
//! lost: the completion channel is a broadcast without replay, and this
//! component does not try to hide that.

use sideload_events::{EventEmitter, EventSender, SessionEvent};
use sideload_types::CompletionEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Receives notifications that passed the subscription's filter
pub trait CompletionListener: Send + Sync {
    fn on_completion(&self, event: CompletionEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribed,
}

/// Accepts only notifications for this application's completion action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFilter {
    pub action: String,
    pub package: String,
}

impl ChannelFilter {
    #[must_use]
    pub fn new(action: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            package: package.into(),
        }
    }

    /// Reason the event is rejected, if it is
    #[must_use]
    pub fn rejection(&self, event: &CompletionEvent) -> Option<&'static str> {
        if event.action != self.action {
            Some("action mismatch")
        } else if event.package != self.package {
            Some("addressed to another application")
        } else {
            None
        }
    }
}

pub struct NotificationSubscription {
    filter: ChannelFilter,
    listener: Arc<dyn CompletionListener>,
    state: Mutex<SubscriptionState>,
    event_sender: Option<EventSender>,
}

impl NotificationSubscription {
    /// Create an unsubscribed subscription forwarding to `listener`
    #[must_use]
    pub fn new(filter: ChannelFilter, listener: Arc<dyn CompletionListener>) -> Self {
        Self {
            filter,
            listener,
            state: Mutex::new(SubscriptionState::Unsubscribed),
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, SubscriptionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, to: SubscriptionState) -> bool {
        let mut state = self.lock_state();
        if *state == to {
            return false;
        }
        *state = to;
        drop(state);

        let subscribed = to == SubscriptionState::Subscribed;
        debug!(subscribed, action = %self.filter.action, "completion channel subscription changed");
        self.emit_session(SessionEvent::SubscriptionChanged { subscribed });
        true
    }

    /// Host became visible. Returns whether the state changed.
    pub fn on_foreground(&self) -> bool {
        self.transition(SubscriptionState::Subscribed)
    }

    /// Host went to the background. Returns whether the state changed.
    pub fn on_background(&self) -> bool {
        self.transition(SubscriptionState::Unsubscribed)
    }

    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        *self.lock_state()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.state() == SubscriptionState::Subscribed
    }

    #[must_use]
    pub fn filter(&self) -> &ChannelFilter {
        &self.filter
    }

    /// Entry point for the completion channel.
    ///
    /// Forwards the event verbatim when subscribed and the filter matches.
    /// Returns whether the event was forwarded.
    pub fn deliver(&self, event: CompletionEvent) -> bool {
        // Held across forwarding so a background transition waits for an
        // in-flight delivery instead of racing it.
        let state = self.lock_state();

        let reason = if *state == SubscriptionState::Unsubscribed {
            Some("not subscribed")
        } else {
            self.filter.rejection(&event)
        };

        if let Some(reason) = reason {
            drop(state);
            debug!(
                action = %event.action,
                package = %event.package,
                status = event.status,
                reason,
                "completion notification ignored"
            );
            self.emit_session(SessionEvent::NotificationIgnored {
                action: event.action,
                package: event.package,
                reason: reason.to_string(),
            });
            return false;
        }

        self.listener.on_completion(event);
        true
    }
}

impl EventEmitter for NotificationSubscription {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl std::fmt::Debug for NotificationSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSubscription")
            .field("filter", &self.filter)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

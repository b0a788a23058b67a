//! Wiring of coordinator, subscription and bridge for one host process

use sideload_config::Config;
use sideload_events::EventSender;
use sideload_types::CompletionEvent;
use std::sync::Arc;

use crate::backend::{InstallerBackend, UserActionLauncher};
use crate::bridge::MethodBridge;
use crate::coordinator::{CoordinatorConfig, SessionCoordinator};
use crate::subscription::{CompletionListener, NotificationSubscription};

/// Everything the host needs: the bridge for callers, lifecycle hooks for
/// the UI framework and an entry point for the completion channel
pub struct InstallerHost<B> {
    coordinator: Arc<SessionCoordinator<B>>,
    subscription: NotificationSubscription,
    bridge: MethodBridge<B>,
}

impl<B: InstallerBackend + 'static> InstallerHost<B> {
    #[must_use]
    pub fn new(coordinator: SessionCoordinator<B>, event_sender: Option<EventSender>) -> Self {
        let coordinator = Arc::new(coordinator);
        let filter = coordinator.config().channel_filter();
        let listener: Arc<dyn CompletionListener> = coordinator.clone();
        let mut subscription = NotificationSubscription::new(filter, listener);
        if let Some(sender) = event_sender {
            subscription = subscription.with_event_sender(sender);
        }
        Self {
            bridge: MethodBridge::new(Arc::clone(&coordinator)),
            coordinator,
            subscription,
        }
    }

    /// Build a host from loaded configuration
    #[must_use]
    pub fn from_config(
        config: &Config,
        backend: B,
        launcher: Option<Arc<dyn UserActionLauncher>>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let mut coordinator = SessionCoordinator::new(
            backend,
            CoordinatorConfig::from_session_config(&config.session),
        );
        if let Some(launcher) = launcher {
            coordinator = coordinator.with_launcher(launcher);
        }
        if let Some(sender) = event_sender.clone() {
            coordinator = coordinator.with_event_sender(sender);
        }
        Self::new(coordinator, event_sender)
    }

    #[must_use]
    pub fn bridge(&self) -> &MethodBridge<B> {
        &self.bridge
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<SessionCoordinator<B>> {
        &self.coordinator
    }

    #[must_use]
    pub fn subscription(&self) -> &NotificationSubscription {
        &self.subscription
    }

    pub fn on_foreground(&self) -> bool {
        self.subscription.on_foreground()
    }

    pub fn on_background(&self) -> bool {
        self.subscription.on_background()
    }

    /// Feed a notification from the completion channel
    pub fn deliver(&self, event: CompletionEvent) -> bool {
        self.subscription.deliver(event)
    }
}

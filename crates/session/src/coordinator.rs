//! Installer session coordinator
//!
//! Drives one install attempt from artifact to committed session, then
//! matches the installer's asynchronous completion notification back to the
//! caller that asked for it.
//!
//! The synchronous half ([`SessionCoordinator::install`]) either fails
//! immediately with a [`SetupError`] or hands back an [`InstallHandle`]. The
//! handle resolves exactly once, when a terminal outcome for its correlation
//! token arrives through [`SessionCoordinator::handle_completion`].

use sideload_config::SessionConfig;
use sideload_errors::{SetupError, UserFacingError};
use sideload_events::{AppEvent, EventEmitter, EventMeta, EventSender, FailureContext, SessionEvent};
use sideload_types::{CompletionEvent, CorrelationToken, InstallMode, InstallOutcome};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backend::{
    CommitTarget, InstallerBackend, InstallerSession, SessionParams, UserActionLauncher,
};
use crate::registry::CorrelationRegistry;
use crate::status::translate;
use crate::subscription::{ChannelFilter, CompletionListener};

/// Coordinator settings, usually derived from [`SessionConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub app_id: String,
    pub completion_action: String,
    pub write_name: String,
    pub install_mode: InstallMode,
    pub pending_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    #[must_use]
    pub fn from_session_config(config: &SessionConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            completion_action: config.completion_action(),
            write_name: config.write_name.clone(),
            install_mode: config.install_mode,
            pending_timeout: config.pending_timeout(),
        }
    }

    #[must_use]
    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = Some(timeout);
        self
    }

    /// Filter matching the notifications this coordinator asks for
    #[must_use]
    pub fn channel_filter(&self) -> ChannelFilter {
        ChannelFilter::new(&self.completion_action, &self.app_id)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from_session_config(&SessionConfig::default())
    }
}

pub struct SessionCoordinator<B> {
    backend: B,
    config: CoordinatorConfig,
    registry: Arc<CorrelationRegistry>,
    launcher: Option<Arc<dyn UserActionLauncher>>,
    event_sender: Option<EventSender>,
}

impl<B: InstallerBackend> SessionCoordinator<B> {
    #[must_use]
    pub fn new(backend: B, config: CoordinatorConfig) -> Self {
        Self::with_registry(backend, config, Arc::new(CorrelationRegistry::new()))
    }

    /// Build a coordinator around an existing registry
    #[must_use]
    pub fn with_registry(
        backend: B,
        config: CoordinatorConfig,
        registry: Arc<CorrelationRegistry>,
    ) -> Self {
        Self {
            backend,
            config,
            registry,
            launcher: None,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn UserActionLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    /// Token of the outstanding install, if there is one
    #[must_use]
    pub fn pending_token(&self) -> Option<CorrelationToken> {
        self.registry.pending_token()
    }

    /// Start installing the artifact at `path`.
    ///
    /// Opens an installer session, streams the artifact into it and commits
    /// with a fresh correlation token. Nothing here waits on the installer.
    ///
    /// # Errors
    ///
    /// - [`SetupError::ArtifactNotFound`] if `path` is not a readable file;
    ///   no session is opened.
    /// - [`SetupError::InstallInProgress`] if another install is pending;
    ///   the pending install is not disturbed.
    /// - [`SetupError::TransferFailed`] if the session cannot be created,
    ///   written, synced or committed; the session is abandoned.
    pub fn install(&self, path: impl AsRef<Path>) -> Result<InstallHandle, SetupError> {
        let path = path.as_ref();
        self.emit_session(SessionEvent::InstallRequested {
            path: path.to_path_buf(),
        });

        self.try_install(path).inspect_err(|err| {
            warn!(path = %path.display(), code = err.code(), error = %err, "install rejected");
            self.emit_session(SessionEvent::InstallRejected {
                path: path.to_path_buf(),
                failure: FailureContext::from_error(err),
            });
        })
    }

    fn try_install(&self, path: &Path) -> Result<InstallHandle, SetupError> {
        let (file, length) = open_artifact(path)?;

        if let Some(token) = self.registry.pending_token() {
            return Err(SetupError::InstallInProgress {
                token: token.to_string(),
            });
        }

        let params = SessionParams {
            mode: self.config.install_mode,
            app_id: self.config.app_id.clone(),
            size_hint: Some(length),
        };
        let mut session =
            self.backend
                .create_session(&params)
                .map_err(|e| SetupError::TransferFailed {
                    message: e.to_string(),
                })?;
        let session_id = session.id().to_string();
        self.emit_session(SessionEvent::SessionCreated {
            session_id: session_id.clone(),
            artifact_size: length,
        });

        if let Err(err) = self.transfer(session.as_mut(), file, length) {
            self.abandon(session, &err);
            return Err(err);
        }
        self.emit_session(SessionEvent::TransferCompleted {
            session_id: session_id.clone(),
            bytes: length,
        });

        // Armed before commit so a fast completion always finds its token.
        let token = CorrelationToken::new();
        let (completion, receiver) = oneshot::channel();
        if let Err(err) = self.registry.register(token, completion) {
            self.abandon(session, &err);
            return Err(err);
        }

        let target = CommitTarget {
            action: self.config.completion_action.clone(),
            package: self.config.app_id.clone(),
            token,
        };
        // The backend closes the session whether or not the commit succeeds.
        if let Err(err) = session.commit(&target) {
            self.registry.clear(token);
            let err = SetupError::TransferFailed {
                message: err.to_string(),
            };
            self.emit_session(SessionEvent::SessionAbandoned {
                session_id,
                reason: err.to_string(),
            });
            return Err(err);
        }

        info!(%token, session_id = %session_id, bytes = length, "installer session committed");
        self.emit_session(SessionEvent::Committed { session_id, token });

        Ok(InstallHandle {
            token,
            receiver,
            registry: Arc::clone(&self.registry),
            timeout: self.config.pending_timeout,
            event_sender: self.event_sender.clone(),
        })
    }

    fn transfer(
        &self,
        session: &mut dyn InstallerSession,
        mut file: File,
        length: u64,
    ) -> Result<(), SetupError> {
        let mut writer = session
            .open_write(&self.config.write_name, length)
            .map_err(|e| SetupError::transfer(&e))?;
        let copied = io::copy(&mut file, &mut writer).map_err(|e| SetupError::transfer(&e))?;
        if copied != length {
            return Err(SetupError::TransferFailed {
                message: format!("wrote {copied} of {length} bytes"),
            });
        }
        writer.sync().map_err(|e| SetupError::transfer(&e))?;
        Ok(())
    }

    fn abandon(&self, session: Box<dyn InstallerSession>, err: &SetupError) {
        let session_id = session.id().to_string();
        session.abandon();
        debug!(session_id = %session_id, "installer session abandoned");
        self.emit_session(SessionEvent::SessionAbandoned {
            session_id,
            reason: err.to_string(),
        });
    }

    /// Route a completion notification to the install it belongs to.
    ///
    /// Notifications whose token matches no pending install are dropped. A
    /// pending-user-action status leaves the install pending; any other
    /// status resolves it.
    pub fn handle_completion(&self, event: CompletionEvent) {
        let Some(token) = event.token.filter(|token| self.registry.contains(*token)) else {
            self.orphan(event.token, event.status);
            return;
        };

        let outcome = translate(event.status, event.message.as_deref());

        if !outcome.is_terminal() {
            let has_descriptor = event.user_action.is_some();
            info!(%token, has_descriptor, "installer waiting on user action");
            self.emit_session(SessionEvent::UserActionRequired {
                token,
                has_descriptor,
            });
            if let (Some(descriptor), Some(launcher)) = (&event.user_action, &self.launcher) {
                if let Err(err) = launcher.launch(token, descriptor) {
                    warn!(
                        %token,
                        error = %err,
                        code = ?err.user_code(),
                        "could not launch user confirmation"
                    );
                }
            }
            return;
        }

        match self.registry.resolve(token) {
            Ok(pending) => match pending.complete(outcome.clone()) {
                Ok(()) => {
                    info!(%token, outcome = %outcome, "install completed");
                    self.emit_session(SessionEvent::Completed { token, outcome });
                }
                Err(outcome) => {
                    debug!(%token, outcome = %outcome, "caller went away before completion");
                    self.emit_session(SessionEvent::OutcomeDropped { token, outcome });
                }
            },
            // Cleared between the lookup and now, e.g. by a timed out caller.
            Err(miss) => self.orphan(Some(miss.token), event.status),
        }
    }

    fn orphan(&self, token: Option<CorrelationToken>, status: i32) {
        debug!(token = ?token, status, "dropping completion notification with no pending install");
        self.emit_session(SessionEvent::Orphaned { token, status });
    }
}

impl<B: InstallerBackend> CompletionListener for SessionCoordinator<B> {
    fn on_completion(&self, event: CompletionEvent) {
        self.handle_completion(event);
    }
}

impl<B> EventEmitter for SessionCoordinator<B> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.labels
            .insert("app_id".to_string(), self.config.app_id.clone());
    }
}

impl<B> std::fmt::Debug for SessionCoordinator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("config", &self.config)
            .field("pending", &self.registry.pending_token())
            .finish_non_exhaustive()
    }
}

fn open_artifact(path: &Path) -> Result<(File, u64), SetupError> {
    let not_found = || SetupError::ArtifactNotFound {
        path: path.display().to_string(),
    };
    let metadata = path.metadata().map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => not_found(),
        _ => SetupError::transfer(&e),
    })?;
    Ok((file, metadata.len()))
}

/// Caller's side of a committed install
///
/// Dropping the handle is allowed; the eventual outcome is then discarded.
#[derive(Debug)]
pub struct InstallHandle {
    token: CorrelationToken,
    receiver: oneshot::Receiver<InstallOutcome>,
    registry: Arc<CorrelationRegistry>,
    timeout: Option<Duration>,
    event_sender: Option<EventSender>,
}

impl InstallHandle {
    #[must_use]
    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Wait for the terminal outcome.
    ///
    /// With a pending timeout configured, gives up after the deadline,
    /// clears the pending install and returns [`InstallOutcome::TimedOut`].
    pub async fn wait(self) -> InstallOutcome {
        let Self {
            token,
            mut receiver,
            registry,
            timeout,
            event_sender,
        } = self;

        let received = match timeout {
            None => receiver.await.ok(),
            Some(limit) => match tokio::time::timeout(limit, &mut receiver).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    if registry.clear(token) {
                        warn!(
                            %token,
                            timeout_secs = limit.as_secs(),
                            "gave up waiting for the installer"
                        );
                        if let Some(sender) = &event_sender {
                            sender.emit_session(SessionEvent::TimedOut { token });
                        }
                        return InstallOutcome::TimedOut;
                    }
                    // A resolver already took the slot and holds the sender;
                    // its outcome is on the way.
                    receiver.await.ok()
                }
            },
        };

        received.unwrap_or_else(|| InstallOutcome::GenericFailure {
            message: Some("pending install was cleared before the installer answered".to_string()),
        })
    }
}

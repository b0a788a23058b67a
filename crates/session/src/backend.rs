//! Seams to the platform installer subsystem
//!
//! A backend opens sessions; a session accepts one sized artifact stream and
//! is then either committed or abandoned. Both consume the session, so a
//! session handle can never be reused after it has been handed back.

use sideload_errors::BackendError;
use sideload_types::{CorrelationToken, InstallMode, UserActionDescriptor};
use std::io::{self, Write};

/// Parameters for a new installer session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub mode: InstallMode,
    /// Application the session is created on behalf of
    pub app_id: String,
    /// Total artifact size, when known up front
    pub size_hint: Option<u64>,
}

/// Where and how the installer should report completion
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommitTarget {
    /// Broadcast action of the shared completion channel
    pub action: String,
    /// Application the notification is addressed to
    pub package: String,
    /// Echoed back in the completion notification
    pub token: CorrelationToken,
}

/// Write channel into a session
pub trait SessionWriter: Write {
    /// Force written bytes to durable storage
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn sync(&mut self) -> io::Result<()>;
}

pub trait InstallerSession: Send {
    fn id(&self) -> &str;

    /// Open a write channel for `length` bytes of artifact named `name`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the channel cannot be opened.
    fn open_write(&mut self, name: &str, length: u64) -> io::Result<Box<dyn SessionWriter + '_>>;

    /// Hand the session to the installer
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::CommitFailed`] if the installer refuses the
    /// session. The session is closed either way.
    fn commit(self: Box<Self>, target: &CommitTarget) -> Result<(), BackendError>;

    /// Discard the session and everything written to it
    fn abandon(self: Box<Self>);
}

pub trait InstallerBackend: Send + Sync {
    /// Create and open a new session
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::SessionCreateFailed`] when the installer cannot
    /// allocate a session.
    fn create_session(
        &self,
        params: &SessionParams,
    ) -> Result<Box<dyn InstallerSession>, BackendError>;
}

/// Starts the platform's confirmation UI when the installer asks for it
pub trait UserActionLauncher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BackendError::LaunchFailed`] if the prompt cannot be shown.
    fn launch(
        &self,
        token: CorrelationToken,
        descriptor: &UserActionDescriptor,
    ) -> Result<(), BackendError>;
}

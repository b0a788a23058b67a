#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installer session coordination for sideload
//!
//! Streams a local artifact into a platform installer session, commits it
//! with a correlation token, and matches the installer's out-of-band
//! completion notification back to the caller.
//!
//! ## Components
//!
//! - [`status::translate`]: raw installer status to [`InstallOutcome`]
//! - [`CorrelationRegistry`]: the single pending-install slot
//! - [`NotificationSubscription`]: completion channel bound to host lifecycle
//! - [`SessionCoordinator`]: setup, commit and completion routing
//! - [`MethodBridge`]: caller-facing method calls and responses
//!
//! [`InstallOutcome`]: sideload_types::InstallOutcome

pub mod backend;
pub mod bridge;
mod coordinator;
mod host;
pub mod memory;
mod registry;
pub mod staging;
pub mod status;
mod subscription;

pub use backend::{
    CommitTarget, InstallerBackend, InstallerSession, SessionParams, SessionWriter,
    UserActionLauncher,
};
pub use bridge::{MethodBridge, MethodCall, Reply};
pub use coordinator::{CoordinatorConfig, InstallHandle, SessionCoordinator};
pub use host::InstallerHost;
pub use memory::MemoryInstaller;
pub use registry::{CorrelationRegistry, PendingInstall, RegistryMiss};
pub use staging::StagingInstaller;
pub use subscription::{
    ChannelFilter, CompletionListener, NotificationSubscription, SubscriptionState,
};

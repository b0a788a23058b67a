//! Single-slot correlation registry
//!
//! Holds the completion handle of the one install that may be outstanding
//! at a time, keyed by its correlation token.

use sideload_errors::SetupError;
use sideload_types::{CorrelationToken, InstallOutcome};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;

/// The in-flight install: its token and the caller's completion handle
#[derive(Debug)]
pub struct PendingInstall {
    token: CorrelationToken,
    completion: oneshot::Sender<InstallOutcome>,
}

impl PendingInstall {
    #[must_use]
    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Whether the caller has stopped waiting for the outcome
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.completion.is_closed()
    }

    /// Deliver the terminal outcome to the caller.
    ///
    /// # Errors
    ///
    /// Hands the outcome back if the caller has already gone away.
    pub fn complete(self, outcome: InstallOutcome) -> Result<(), InstallOutcome> {
        self.completion.send(outcome)
    }
}

/// Lookup found no pending install for the token
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("no pending install for token {token}")]
pub struct RegistryMiss {
    pub token: CorrelationToken,
}

#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    slot: Mutex<Option<PendingInstall>>,
}

impl CorrelationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The slot is only ever replaced wholesale, so a poisoned guard still
    // holds consistent data.
    fn slot(&self) -> MutexGuard<'_, Option<PendingInstall>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the slot for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InstallInProgress`] if another install already
    /// owns the slot. The existing entry is left untouched.
    pub fn register(
        &self,
        token: CorrelationToken,
        completion: oneshot::Sender<InstallOutcome>,
    ) -> Result<(), SetupError> {
        let mut slot = self.slot();
        if let Some(existing) = slot.as_ref() {
            return Err(SetupError::InstallInProgress {
                token: existing.token.to_string(),
            });
        }
        *slot = Some(PendingInstall { token, completion });
        Ok(())
    }

    /// Take the pending install out of the slot if it belongs to `token`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryMiss`] when the slot is empty or holds a different
    /// token; the slot is not modified in that case.
    pub fn resolve(&self, token: CorrelationToken) -> Result<PendingInstall, RegistryMiss> {
        let mut slot = self.slot();
        match slot.take() {
            Some(pending) if pending.token == token => Ok(pending),
            other => {
                *slot = other;
                Err(RegistryMiss { token })
            }
        }
    }

    /// Drop the pending install for `token` without delivering an outcome.
    /// Returns whether anything was removed.
    pub fn clear(&self, token: CorrelationToken) -> bool {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|pending| pending.token == token) {
            *slot = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, token: CorrelationToken) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|pending| pending.token == token)
    }

    #[must_use]
    pub fn pending_token(&self) -> Option<CorrelationToken> {
        self.slot().as_ref().map(PendingInstall::token)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.slot().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_single_flight() {
        let registry = CorrelationRegistry::new();
        let first = CorrelationToken::new();
        let (tx, _rx) = oneshot::channel();
        registry.register(first, tx).unwrap();

        let (tx2, _rx2) = oneshot::channel();
        let err = registry.register(CorrelationToken::new(), tx2).unwrap_err();
        assert_eq!(
            err,
            SetupError::InstallInProgress {
                token: first.to_string()
            }
        );
        assert_eq!(registry.pending_token(), Some(first));
    }

    #[test]
    fn test_resolve_with_wrong_token_keeps_slot() {
        let registry = CorrelationRegistry::new();
        let token = CorrelationToken::new();
        let (tx, _rx) = oneshot::channel();
        registry.register(token, tx).unwrap();

        let stranger = CorrelationToken::new();
        assert_eq!(
            registry.resolve(stranger).unwrap_err(),
            RegistryMiss { token: stranger }
        );
        assert!(registry.contains(token));

        let pending = registry.resolve(token).unwrap();
        assert_eq!(pending.token(), token);
        assert!(registry.is_idle());
        assert!(registry.resolve(token).is_err());
    }

    #[test]
    fn test_complete_reports_abandoned_caller() {
        let registry = CorrelationRegistry::new();
        let token = CorrelationToken::new();
        let (tx, rx) = oneshot::channel();
        registry.register(token, tx).unwrap();
        drop(rx);

        let pending = registry.resolve(token).unwrap();
        assert!(pending.is_abandoned());
        let outcome = InstallOutcome::Success { message: None };
        assert_eq!(pending.complete(outcome.clone()), Err(outcome));
    }

    #[test]
    fn test_clear_only_matching_token() {
        let registry = CorrelationRegistry::new();
        let token = CorrelationToken::new();
        let (tx, _rx) = oneshot::channel();
        registry.register(token, tx).unwrap();

        assert!(!registry.clear(CorrelationToken::new()));
        assert!(registry.clear(token));
        assert!(registry.is_idle());
        assert!(!registry.clear(token));
    }
}

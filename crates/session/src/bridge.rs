//! Caller-facing method bridge
//!
//! Turns method calls from the application layer into install attempts and
//! renders every way an attempt can end as exactly one [`BridgeResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sideload_errors::SetupError;
use sideload_types::{BridgeResponse, InstallOutcome};
use std::sync::Arc;

use crate::backend::InstallerBackend;
use crate::coordinator::{InstallHandle, SessionCoordinator};

pub const INSTALL_ARTIFACT: &str = "installArtifact";
/// Older method name still sent by existing callers
pub const INSTALL_APK: &str = "installApk";

/// A method call as received from the application layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl MethodCall {
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Map::new(),
        }
    }

    #[must_use]
    pub fn install(path: impl Into<String>) -> Self {
        Self::new(INSTALL_ARTIFACT).with_arg("path", path.into())
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    fn string_arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }
}

/// What a dispatched call turned into
#[derive(Debug)]
pub enum Reply {
    /// Answered without involving the installer
    Ready(BridgeResponse),
    /// Committed; the answer arrives with the installer's outcome
    Pending(InstallHandle),
}

impl Reply {
    /// Resolve into the single response for the call
    pub async fn into_response(self) -> BridgeResponse {
        match self {
            Self::Ready(response) => response,
            Self::Pending(handle) => outcome_response(&handle.wait().await),
        }
    }
}

pub struct MethodBridge<B> {
    coordinator: Arc<SessionCoordinator<B>>,
}

impl<B> Clone for MethodBridge<B> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<B: InstallerBackend> MethodBridge<B> {
    #[must_use]
    pub fn new(coordinator: Arc<SessionCoordinator<B>>) -> Self {
        Self { coordinator }
    }

    /// Run the synchronous part of a call.
    pub fn dispatch(&self, call: &MethodCall) -> Reply {
        let path_key = match call.method.as_str() {
            INSTALL_ARTIFACT => "path",
            INSTALL_APK => "apkPath",
            _ => return Reply::Ready(BridgeResponse::NotImplemented),
        };

        let Some(path) = call.string_arg(path_key) else {
            return Reply::Ready(setup_response(&SetupError::InvalidArgument {
                message: format!("{path_key} is null"),
            }));
        };

        match self.coordinator.install(path) {
            Ok(handle) => Reply::Pending(handle),
            Err(err) => Reply::Ready(setup_response(&err)),
        }
    }

    /// Dispatch a call and wait for its response
    pub async fn call(&self, call: &MethodCall) -> BridgeResponse {
        self.dispatch(call).into_response().await
    }
}

/// Render a setup error for the caller
#[must_use]
pub fn setup_response(err: &SetupError) -> BridgeResponse {
    BridgeResponse::error(err.code(), err.to_string())
}

/// Render a terminal outcome for the caller
///
/// Success and user cancellation come back as successful responses carrying
/// their status; every other outcome is an error with a stable code.
#[must_use]
pub fn outcome_response(outcome: &InstallOutcome) -> BridgeResponse {
    let message = outcome.describe();
    let Some(code) = outcome.error_code() else {
        return BridgeResponse::success(outcome.status_code().unwrap_or_default(), message);
    };
    let mut response = BridgeResponse::error(code, message);
    if let Some(status) = outcome.status_code() {
        response = response.with_status(status);
    }
    if let InstallOutcome::UnknownStatus { code, .. } = outcome {
        response = response.with_details(code.to_string());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_success_shaped() {
        let response = outcome_response(&InstallOutcome::Cancelled {
            message: Some("user said no".into()),
        });
        assert_eq!(
            response,
            BridgeResponse::success(3, "Installation cancelled by user: user said no")
        );
    }

    #[test]
    fn test_unknown_status_carries_details() {
        let response = outcome_response(&InstallOutcome::UnknownStatus {
            code: 99,
            message: None,
        });
        assert_eq!(
            response,
            BridgeResponse::error(
                "INSTALL_UNKNOWN_STATUS",
                "Installation unknown status 99: No message"
            )
            .with_status(99)
            .with_details("99")
        );
    }

    #[test]
    fn test_timed_out_has_no_status() {
        let response = outcome_response(&InstallOutcome::TimedOut);
        assert_eq!(response.code(), Some("INSTALL_TIMED_OUT"));
        assert!(matches!(response, BridgeResponse::Error { status: None, .. }));
    }

    #[test]
    fn test_method_call_parses_from_json() {
        let call: MethodCall =
            serde_json::from_str(r#"{"method":"installApk","args":{"apkPath":"/tmp/a.apk"}}"#)
                .unwrap();
        assert_eq!(call.method, INSTALL_APK);
        assert_eq!(call.string_arg("apkPath"), Some("/tmp/a.apk"));
    }
}

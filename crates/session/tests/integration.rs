//! Integration tests for installer session coordination

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use sideload_config::Config;
    use sideload_events::{AppEvent, EventReceiver, SessionEvent};
    use sideload_session::bridge::{Reply, INSTALL_APK};
    use sideload_session::memory::FailPoint;
    use sideload_session::*;
    use sideload_types::status::{
        STATUS_FAILURE_ABORTED, STATUS_FAILURE_STORAGE, STATUS_PENDING_USER_ACTION,
        STATUS_SUCCESS,
    };
    use sideload_types::{
        BridgeResponse, CompletionEvent, CorrelationToken, InstallOutcome, UserActionDescriptor,
    };
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        artifact: PathBuf,
        backend: MemoryInstaller,
        host: InstallerHost<MemoryInstaller>,
    }

    fn fixture(bytes: &[u8]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, bytes).unwrap();
        let backend = MemoryInstaller::new();
        let host = InstallerHost::from_config(&Config::default(), backend.clone(), None, None);
        host.on_foreground();
        Fixture {
            _dir: dir,
            artifact,
            backend,
            host,
        }
    }

    fn notification<B: InstallerBackend + 'static>(host: &InstallerHost<B>, status: i32) -> CompletionEvent {
        let config = host.coordinator().config();
        CompletionEvent::new(&config.completion_action, &config.app_id, status)
    }

    fn pending(reply: Reply) -> InstallHandle {
        match reply {
            Reply::Pending(handle) => handle,
            Reply::Ready(response) => panic!("expected a pending install, got {response:?}"),
        }
    }

    fn session_events(rx: &mut EventReceiver) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Session(event) = message.event {
                events.push(event);
            }
        }
        events
    }

    #[tokio::test]
    async fn test_successful_install_round_trip() {
        let f = fixture(b"0123456789");
        let call = MethodCall::install(f.artifact.display().to_string());
        let handle = pending(f.host.bridge().dispatch(&call));
        let token = handle.token();

        let commit = f.backend.last_commit().unwrap();
        assert_eq!(commit.bytes, b"0123456789");
        assert_eq!(commit.declared_length, 10);
        assert!(commit.synced);
        assert_eq!(commit.stream_name, "sideload_update");
        assert_eq!(commit.target.token, token);
        assert_eq!(commit.target.action, "com.example.sideload.INSTALL_COMPLETE");

        assert!(f
            .host
            .deliver(notification(&f.host, STATUS_SUCCESS).with_token(token)));

        let response = Reply::Pending(handle).into_response().await;
        assert_eq!(response, BridgeResponse::success(0, "Installation successful"));
        assert!(f.host.coordinator().registry().is_idle());
    }

    #[tokio::test]
    async fn test_storage_failure_reports_category_and_message() {
        let f = fixture(b"payload");
        let handle = f.host.coordinator().install(&f.artifact).unwrap();
        let token = handle.token();

        f.host.deliver(
            notification(&f.host, STATUS_FAILURE_STORAGE)
                .with_token(token)
                .with_message("disk full"),
        );

        let response = Reply::Pending(handle).into_response().await;
        assert_eq!(
            response,
            BridgeResponse::error("INSTALL_STORAGE_ISSUE", "Installation storage issue: disk full")
                .with_status(7)
        );
    }

    #[tokio::test]
    async fn test_unknown_token_leaves_outstanding_request() {
        let f = fixture(b"abc");
        let handle = f.host.coordinator().install(&f.artifact).unwrap();
        let token = handle.token();

        let stranger = CorrelationToken::new();
        assert!(f
            .host
            .deliver(notification(&f.host, STATUS_SUCCESS).with_token(stranger)));
        assert_eq!(f.host.coordinator().pending_token(), Some(token));

        let mut wait = Box::pin(handle.wait());
        assert!((&mut wait).now_or_never().is_none());

        f.host.deliver(
            notification(&f.host, STATUS_FAILURE_ABORTED)
                .with_token(token)
                .with_message("user declined"),
        );
        assert_eq!(
            wait.await,
            InstallOutcome::Cancelled {
                message: Some("user declined".into())
            }
        );
    }

    #[tokio::test]
    async fn test_second_install_is_rejected_without_disturbing_first() {
        let f = fixture(b"abc");
        let call = MethodCall::install(f.artifact.display().to_string());
        let first = pending(f.host.bridge().dispatch(&call));

        let second = f.host.bridge().call(&call).await;
        assert_eq!(second.code(), Some("INSTALL_IN_PROGRESS"));
        assert_eq!(f.backend.sessions_created(), 1);
        assert_eq!(f.host.coordinator().pending_token(), Some(first.token()));

        f.host
            .deliver(notification(&f.host, STATUS_SUCCESS).with_token(first.token()));
        assert!(first.wait().await.is_success());
    }

    #[tokio::test]
    async fn test_missing_artifact_creates_no_session() {
        let f = fixture(b"abc");
        let response = f
            .host
            .bridge()
            .call(&MethodCall::install("/nonexistent/update.pkg"))
            .await;
        assert_eq!(
            response,
            BridgeResponse::error(
                "ARTIFACT_NOT_FOUND",
                "artifact not found at /nonexistent/update.pkg"
            )
        );
        assert_eq!(f.backend.sessions_created(), 0);
        assert!(f.host.coordinator().registry().is_idle());
    }

    #[tokio::test]
    async fn test_write_failure_abandons_and_reports_transfer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, b"abc").unwrap();
        let backend = MemoryInstaller::new().failing_at(FailPoint::Write);
        let host = InstallerHost::from_config(&Config::default(), backend.clone(), None, None);

        let response = host
            .bridge()
            .call(&MethodCall::install(artifact.display().to_string()))
            .await;
        assert_eq!(response.code(), Some("TRANSFER_FAILED"));
        assert_eq!(backend.abandoned().len(), 1);
        assert!(backend.committed().is_empty());
    }

    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<(CorrelationToken, String)>>,
    }

    impl UserActionLauncher for RecordingLauncher {
        fn launch(
            &self,
            token: CorrelationToken,
            descriptor: &UserActionDescriptor,
        ) -> Result<(), sideload_errors::BackendError> {
            self.launched
                .lock()
                .unwrap()
                .push((token, descriptor.intent.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_user_action_then_terminal_event() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, b"abc").unwrap();
        let launcher = Arc::new(RecordingLauncher::default());
        let shared: Arc<dyn UserActionLauncher> = launcher.clone();
        let host = InstallerHost::from_config(
            &Config::default(),
            MemoryInstaller::new(),
            Some(shared),
            None,
        );
        host.on_foreground();

        let handle = host.coordinator().install(&artifact).unwrap();
        let token = handle.token();
        let descriptor = UserActionDescriptor {
            intent: "android.content.pm.action.CONFIRM_INSTALL".into(),
            extras: Default::default(),
        };
        host.deliver(
            notification(&host, STATUS_PENDING_USER_ACTION)
                .with_token(token)
                .with_user_action(descriptor),
        );

        let mut wait = Box::pin(handle.wait());
        assert!((&mut wait).now_or_never().is_none());
        assert_eq!(
            *launcher.launched.lock().unwrap(),
            vec![(token, "android.content.pm.action.CONFIRM_INSTALL".to_string())]
        );

        host.deliver(notification(&host, STATUS_SUCCESS).with_token(token));
        assert!(wait.await.is_success());
    }

    #[tokio::test]
    async fn test_background_host_drops_notifications() {
        let f = fixture(b"abc");
        let handle = f.host.coordinator().install(&f.artifact).unwrap();
        let token = handle.token();

        assert!(f.host.on_background());
        assert!(!f.host.on_background());
        assert!(!f
            .host
            .deliver(notification(&f.host, STATUS_SUCCESS).with_token(token)));
        assert_eq!(f.host.coordinator().pending_token(), Some(token));

        // Notifications for other channels are filtered even when subscribed.
        f.host.on_foreground();
        let mut foreign = notification(&f.host, STATUS_SUCCESS).with_token(token);
        foreign.package = "org.other.app".into();
        assert!(!f.host.deliver(foreign));
        assert_eq!(f.host.coordinator().pending_token(), Some(token));

        assert!(f
            .host
            .deliver(notification(&f.host, STATUS_SUCCESS).with_token(token)));
        assert!(handle.wait().await.is_success());
    }

    #[tokio::test]
    async fn test_dropped_handle_discards_outcome() {
        let (tx, mut rx) = sideload_events::channel();
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, b"abc").unwrap();
        let host =
            InstallerHost::from_config(&Config::default(), MemoryInstaller::new(), None, Some(tx));
        host.on_foreground();

        let handle = host.coordinator().install(&artifact).unwrap();
        let token = handle.token();
        drop(handle);
        host.deliver(notification(&host, STATUS_SUCCESS).with_token(token));

        let events = session_events(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::OutcomeDropped { token: t, .. } if *t == token)));
        assert!(host.coordinator().registry().is_idle());
    }

    #[tokio::test]
    async fn test_lifecycle_events_are_emitted_in_order() {
        let (tx, mut rx) = sideload_events::channel();
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, b"abc").unwrap();
        let host =
            InstallerHost::from_config(&Config::default(), MemoryInstaller::new(), None, Some(tx));
        host.on_foreground();

        let handle = host.coordinator().install(&artifact).unwrap();
        host.deliver(notification(&host, STATUS_SUCCESS).with_token(handle.token()));
        handle.wait().await;

        let names: Vec<&str> = session_events(&mut rx)
            .iter()
            .map(|e| match e {
                SessionEvent::SubscriptionChanged { .. } => "subscribed",
                SessionEvent::InstallRequested { .. } => "requested",
                SessionEvent::SessionCreated { .. } => "created",
                SessionEvent::TransferCompleted { .. } => "transferred",
                SessionEvent::Committed { .. } => "committed",
                SessionEvent::Completed { .. } => "completed",
                _ => "other",
            })
            .collect();
        assert_eq!(
            names,
            vec!["subscribed", "requested", "created", "transferred", "committed", "completed"]
        );
    }

    #[tokio::test]
    async fn test_legacy_method_and_argument_errors() {
        let f = fixture(b"abc");
        let bridge = f.host.bridge();

        let legacy =
            MethodCall::new(INSTALL_APK).with_arg("apkPath", f.artifact.display().to_string());
        let handle = pending(bridge.dispatch(&legacy));
        assert_eq!(f.host.coordinator().pending_token(), Some(handle.token()));

        let missing = bridge.call(&MethodCall::new(INSTALL_APK)).await;
        assert_eq!(
            missing,
            BridgeResponse::error("INVALID_ARGUMENT", "invalid argument: apkPath is null")
        );

        let unknown = bridge.call(&MethodCall::new("uninstall")).await;
        assert_eq!(unknown, BridgeResponse::NotImplemented);
    }

    #[tokio::test]
    async fn test_staging_backend_end_to_end() {
        let staging = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("update.pkg");
        std::fs::write(&artifact, b"0123456789").unwrap();

        let backend = StagingInstaller::new(staging.path());
        let host = InstallerHost::from_config(&Config::default(), backend.clone(), None, None);
        host.on_foreground();

        let handle = host.coordinator().install(&artifact).unwrap();
        let token = handle.token();

        let session_dir = std::fs::read_dir(staging.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        let session_id = session_dir.file_name().to_string_lossy().to_string();
        let receipt = backend.receipt(&session_id).unwrap();
        assert_eq!(receipt.target.token, token);
        assert_eq!(
            std::fs::read(session_dir.path().join(&receipt.artifact)).unwrap(),
            b"0123456789"
        );

        host.deliver(notification(&host, STATUS_SUCCESS).with_token(token));
        assert!(handle.wait().await.is_success());
    }
}

//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sideload_types::status::*;
    use sideload_types::*;

    #[test]
    fn test_completion_event_round_trips_through_json() {
        let token = CorrelationToken::new();
        let event = CompletionEvent::new("app.INSTALL_COMPLETE", "app", STATUS_FAILURE_STORAGE)
            .with_message("disk full")
            .with_token(token);

        let json = serde_json::to_string(&event).unwrap();
        let back: CompletionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(!json.contains("user_action"));
    }

    #[test]
    fn test_bridge_response_shape() {
        let response = BridgeResponse::error("INSTALL_UNKNOWN_STATUS", "boom")
            .with_status(42)
            .with_details("42");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"], "error");
        assert_eq!(json["code"], "INSTALL_UNKNOWN_STATUS");
        assert_eq!(json["status"], 42);
        assert_eq!(json["details"], "42");
        assert_eq!(response.code(), Some("INSTALL_UNKNOWN_STATUS"));

        let ok = BridgeResponse::success(0, "Installation successful")
            .with_status(9)
            .with_details("ignored");
        assert_eq!(ok, BridgeResponse::success(0, "Installation successful"));
    }

    proptest! {
        #[test]
        fn test_every_terminal_failure_has_code_and_status(code in any::<i32>()) {
            let outcome = InstallOutcome::UnknownStatus { code, message: None };
            prop_assert!(outcome.is_terminal());
            prop_assert_eq!(outcome.status_code(), Some(code));
            prop_assert!(outcome.describe().ends_with("No message"));
        }
    }
}

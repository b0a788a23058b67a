//! Integration tests for error types

#[cfg(test)]
mod tests {
    use sideload_errors::*;

    #[test]
    fn test_error_conversion() {
        let setup = SetupError::ArtifactNotFound {
            path: "/data/update.pkg".into(),
        };
        let err: Error = setup.into();
        assert!(matches!(err, Error::Setup(_)));
    }

    #[test]
    fn test_setup_codes_are_stable() {
        let cases = [
            (
                SetupError::ArtifactNotFound { path: "x".into() },
                "ARTIFACT_NOT_FOUND",
            ),
            (
                SetupError::TransferFailed {
                    message: "short write".into(),
                },
                "TRANSFER_FAILED",
            ),
            (
                SetupError::InstallInProgress {
                    token: "abc".into(),
                },
                "INSTALL_IN_PROGRESS",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.user_code(), Some(code));
        }
    }

    #[test]
    fn test_error_display() {
        let err = SetupError::ArtifactNotFound {
            path: "/data/update.pkg".into(),
        };
        assert_eq!(err.to_string(), "artifact not found at /data/update.pkg");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(err.user_code(), Some("error.io"));
    }

    #[test]
    fn test_setup_errors_are_not_retryable() {
        let err: Error = SetupError::transfer(&std::io::Error::other("disk gone")).into();
        assert!(!err.is_retryable());
        assert_eq!(err.user_code(), Some("TRANSFER_FAILED"));
        assert!(err.user_message().contains("disk gone"));
    }
}

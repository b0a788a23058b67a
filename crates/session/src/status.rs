//! Translation from raw installer statuses to domain outcomes

use sideload_types::status::{
    STATUS_FAILURE, STATUS_FAILURE_ABORTED, STATUS_FAILURE_BLOCKED, STATUS_FAILURE_CONFLICT,
    STATUS_FAILURE_INCOMPATIBLE, STATUS_FAILURE_INVALID, STATUS_FAILURE_STORAGE,
    STATUS_PENDING_USER_ACTION, STATUS_SUCCESS,
};
use sideload_types::InstallOutcome;

/// Map a raw installer status and optional message to an [`InstallOutcome`].
///
/// Total over `i32`: codes outside the documented table become
/// [`InstallOutcome::UnknownStatus`] so newer platform releases never make
/// this fail.
#[must_use]
pub fn translate(raw_status: i32, raw_message: Option<&str>) -> InstallOutcome {
    let message = raw_message.map(str::to_owned);
    match raw_status {
        STATUS_PENDING_USER_ACTION => InstallOutcome::UserActionPending { message },
        STATUS_SUCCESS => InstallOutcome::Success { message },
        STATUS_FAILURE => InstallOutcome::GenericFailure { message },
        STATUS_FAILURE_BLOCKED => InstallOutcome::Blocked { message },
        STATUS_FAILURE_ABORTED => InstallOutcome::Cancelled { message },
        STATUS_FAILURE_INVALID => InstallOutcome::InvalidArtifact { message },
        STATUS_FAILURE_CONFLICT => InstallOutcome::Conflict { message },
        STATUS_FAILURE_STORAGE => InstallOutcome::StorageFailure { message },
        STATUS_FAILURE_INCOMPATIBLE => InstallOutcome::Incompatible { message },
        code => InstallOutcome::UnknownStatus { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_documented_table() {
        let cases = [
            (STATUS_SUCCESS, "Success"),
            (STATUS_FAILURE, "GenericFailure"),
            (STATUS_FAILURE_BLOCKED, "Blocked"),
            (STATUS_FAILURE_ABORTED, "Cancelled"),
            (STATUS_FAILURE_INVALID, "InvalidArtifact"),
            (STATUS_FAILURE_CONFLICT, "Conflict"),
            (STATUS_FAILURE_STORAGE, "StorageFailure"),
            (STATUS_FAILURE_INCOMPATIBLE, "Incompatible"),
            (STATUS_PENDING_USER_ACTION, "UserActionPending"),
        ];
        for (status, variant) in cases {
            let outcome = translate(status, Some("m"));
            assert!(
                format!("{outcome:?}").starts_with(variant),
                "{status} mapped to {outcome:?}"
            );
            assert_eq!(outcome.message(), Some("m"));
        }
    }

    #[test]
    fn test_storage_failure_description() {
        let outcome = translate(STATUS_FAILURE_STORAGE, Some("disk full"));
        assert_eq!(outcome.error_code(), Some("INSTALL_STORAGE_ISSUE"));
        assert_eq!(outcome.describe(), "Installation storage issue: disk full");
    }

    #[test]
    fn test_unknown_code_keeps_code_and_message() {
        assert_eq!(
            translate(-42, None),
            InstallOutcome::UnknownStatus {
                code: -42,
                message: None
            }
        );
    }

    proptest! {
        #[test]
        fn test_translate_is_total_and_deterministic(
            code in any::<i32>(),
            msg in proptest::option::of(".{0,16}"),
        ) {
            let first = translate(code, msg.as_deref());
            let second = translate(code, msg.as_deref());
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.message(), msg.as_deref());
            if !(-1..=7).contains(&code) {
                let is_unknown = matches!(
                    first,
                    InstallOutcome::UnknownStatus { code: c, .. } if c == code
                );
                prop_assert!(is_unknown);
            }
        }
    }
}

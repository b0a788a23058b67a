//! Raw status codes reported by the platform installer
//!
//! Values match the platform's documented status space. Anything outside of
//! it is still a valid `i32` and must be handled by callers.

pub const STATUS_PENDING_USER_ACTION: i32 = -1;
pub const STATUS_SUCCESS: i32 = 0;
pub const STATUS_FAILURE: i32 = 1;
pub const STATUS_FAILURE_BLOCKED: i32 = 2;
pub const STATUS_FAILURE_ABORTED: i32 = 3;
pub const STATUS_FAILURE_INVALID: i32 = 4;
pub const STATUS_FAILURE_CONFLICT: i32 = 5;
pub const STATUS_FAILURE_STORAGE: i32 = 6;
pub const STATUS_FAILURE_INCOMPATIBLE: i32 = 7;

/// Look up the symbolic name for a raw status
#[must_use]
pub fn status_name(status: i32) -> Option<&'static str> {
    Some(match status {
        STATUS_PENDING_USER_ACTION => "STATUS_PENDING_USER_ACTION",
        STATUS_SUCCESS => "STATUS_SUCCESS",
        STATUS_FAILURE => "STATUS_FAILURE",
        STATUS_FAILURE_BLOCKED => "STATUS_FAILURE_BLOCKED",
        STATUS_FAILURE_ABORTED => "STATUS_FAILURE_ABORTED",
        STATUS_FAILURE_INVALID => "STATUS_FAILURE_INVALID",
        STATUS_FAILURE_CONFLICT => "STATUS_FAILURE_CONFLICT",
        STATUS_FAILURE_STORAGE => "STATUS_FAILURE_STORAGE",
        STATUS_FAILURE_INCOMPATIBLE => "STATUS_FAILURE_INCOMPATIBLE",
        _ => return None,
    })
}

/// Parse either a symbolic name (`STATUS_SUCCESS`, `success`,
/// `failure_storage`) or a plain integer
#[must_use]
pub fn parse_status(value: &str) -> Option<i32> {
    if let Ok(code) = value.parse::<i32>() {
        return Some(code);
    }
    let upper = value.trim().to_ascii_uppercase();
    let name = upper.strip_prefix("STATUS_").unwrap_or(&upper);
    Some(match name {
        "PENDING_USER_ACTION" => STATUS_PENDING_USER_ACTION,
        "SUCCESS" => STATUS_SUCCESS,
        "FAILURE" => STATUS_FAILURE,
        "FAILURE_BLOCKED" => STATUS_FAILURE_BLOCKED,
        "FAILURE_ABORTED" => STATUS_FAILURE_ABORTED,
        "FAILURE_INVALID" => STATUS_FAILURE_INVALID,
        "FAILURE_CONFLICT" => STATUS_FAILURE_CONFLICT,
        "FAILURE_STORAGE" => STATUS_FAILURE_STORAGE,
        "FAILURE_INCOMPATIBLE" => STATUS_FAILURE_INCOMPATIBLE,
        _ => return None,
    })
}

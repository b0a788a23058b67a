//! Default locations and identities used when nothing is configured

pub const DEFAULT_APP_ID: &str = "com.example.sideload";

/// Suffix appended to the application id to form the completion action
pub const COMPLETION_ACTION_SUFFIX: &str = ".INSTALL_COMPLETE";

pub const DEFAULT_WRITE_NAME: &str = "sideload_update";

pub const STAGING_DIR: &str = "/var/tmp/sideload/staging";
pub const LOGS_DIR: &str = "/var/tmp/sideload/logs";

pub const CONFIG_FILE_NAME: &str = "config.toml";

//! CLI error handling

use std::fmt;

use sideload_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(sideload_errors::ConfigError),
    /// Error from the library crates
    Session(sideload_errors::Error),
    /// Malformed input on the serve channel
    InvalidInput(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Session(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidInput(_) => None,
        }
    }
}

impl From<sideload_errors::ConfigError> for CliError {
    fn from(e: sideload_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<sideload_errors::Error> for CliError {
    fn from(e: sideload_errors::Error) -> Self {
        CliError::Session(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidInput(e.to_string())
    }
}

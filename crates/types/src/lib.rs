#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for sideload
//!
//! This crate provides the vocabulary shared between the session core, the
//! host shim and the method bridge: correlation tokens, raw installer status
//! codes, domain install outcomes and the completion notifications the OS
//! sends back.

pub mod notification;
pub mod outcome;
pub mod response;
pub mod status;
pub mod token;

pub use notification::{CompletionEvent, UserActionDescriptor};
pub use outcome::InstallOutcome;
pub use response::BridgeResponse;
pub use token::CorrelationToken;
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// How the installer should treat an already-installed copy of the package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// Replace the installed package entirely
    #[default]
    Full,
    /// Add to or replace parts of the installed package
    InheritExisting,
}

impl std::fmt::Display for InstallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::InheritExisting => write!(f, "inherit_existing"),
        }
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque value attached to a session commit and echoed back by the
/// installer's completion notification.
///
/// A fresh token is generated for every install attempt, so a notification
/// for an earlier attempt can never match a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    /// Generate a new random token
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(CorrelationToken::new(), CorrelationToken::new());
    }

    #[test]
    fn test_token_parses_its_display_form() {
        let token = CorrelationToken::new();
        let parsed: CorrelationToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert!("not-a-token".parse::<CorrelationToken>().is_err());
    }
}

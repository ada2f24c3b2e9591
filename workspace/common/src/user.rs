use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Opaque identity of a dashboard user.
///
/// Passed explicitly into every persistence call; the backend never derives
/// it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseUserIdError {
    #[error("user id must not be empty")]
    Empty,
    #[error("user id is longer than {max} characters")]
    TooLong { max: usize },
    #[error("user id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

impl UserId {
    pub const MAX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = ParseUserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseUserIdError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ParseUserIdError::TooLong { max: Self::MAX_LEN });
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(ParseUserIdError::InvalidCharacter(c));
        }
        Ok(UserId(trimmed.to_string()))
    }
}

impl TryFrom<String> for UserId {
    type Error = ParseUserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response of the identity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserIdentityDto {
    pub user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_user_id() {
        let id: UserId = " user_1718000000000_k3j9x0abc ".parse().unwrap();
        assert_eq!(id.as_str(), "user_1718000000000_k3j9x0abc");
    }

    #[test]
    fn test_parse_invalid_user_ids() {
        assert_eq!("".parse::<UserId>(), Err(ParseUserIdError::Empty));
        assert_eq!(
            "user/../etc".parse::<UserId>(),
            Err(ParseUserIdError::InvalidCharacter('/'))
        );
        assert_eq!(
            "x".repeat(65).parse::<UserId>(),
            Err(ParseUserIdError::TooLong { max: 64 })
        );
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let id: UserId = serde_json::from_str("\"user_abc\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user_abc\"");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}

//! Validated opaque identifiers.
//!
//! # Responsibility
//! - Turn raw, caller-supplied strings into identifiers domain code can trust.
//! - Report malformed input as a value, never as a panic.
//!
//! # Invariants
//! - An `Identifier` instance always holds a canonical, lowercase,
//!   hyphenated 8-4-4-4-12 hexadecimal token.
//! - There is no unchecked constructor reachable from outside this module.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid regex")
});

/// Validation failure for identifier construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Input was the empty string.
    Empty,
    /// Input is not a hyphenated uuid token.
    Malformed(String),
}

impl Display for IdentifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Given value is not a valid uuid: empty value"),
            Self::Malformed(value) => write!(f, "Given value is not a valid uuid: {value}"),
        }
    }
}

impl Error for IdentifierError {}

/// Opaque, validated identifier for users, vaults, items, revisions and invites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

/// Identifier of a user account.
pub type UserUuid = Identifier;
/// Identifier of a shared vault.
pub type SharedVaultUuid = Identifier;
/// Identifier of a synced item.
pub type ItemUuid = Identifier;
/// Identifier of one revision snapshot.
pub type RevisionUuid = Identifier;
/// Identifier of one shared vault invite.
pub type InviteUuid = Identifier;

impl Identifier {
    /// Validates `raw` and wraps it.
    ///
    /// Input is not trimmed; surrounding whitespace makes it malformed.
    pub fn create(raw: &str) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if !UUID_RE.is_match(raw) {
            return Err(IdentifierError::Malformed(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Validates a whole membership set, failing on the first malformed value.
    pub fn create_many<S: AsRef<str>>(raw_values: &[S]) -> Result<Vec<Self>, IdentifierError> {
        raw_values
            .iter()
            .map(|value| Self::create(value.as_ref()))
            .collect()
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::create(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::create(value.as_str())
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::{Identifier, IdentifierError};

    #[test]
    fn create_accepts_hyphenated_uuid_and_lowercases_it() {
        let id = Identifier::create("2C4F2D9A-8E4B-4C3D-9F41-0A1B2C3D4E5F")
            .expect("valid uuid should be accepted");
        assert_eq!(id.as_str(), "2c4f2d9a-8e4b-4c3d-9f41-0a1b2c3d4e5f");
    }

    #[test]
    fn create_rejects_empty_input() {
        assert_eq!(Identifier::create(""), Err(IdentifierError::Empty));
    }

    #[test]
    fn create_rejects_malformed_input_with_readable_message() {
        let err = Identifier::create("not-a-uuid").unwrap_err();
        assert_eq!(err.to_string(), "Given value is not a valid uuid: not-a-uuid");

        assert!(Identifier::create(" 2c4f2d9a-8e4b-4c3d-9f41-0a1b2c3d4e5f").is_err());
        assert!(Identifier::create("2c4f2d9a8e4b4c3d9f410a1b2c3d4e5f").is_err());
        assert!(Identifier::create("{2c4f2d9a-8e4b-4c3d-9f41-0a1b2c3d4e5f}").is_err());
    }

    #[test]
    fn create_many_fails_on_first_bad_value() {
        let good = Identifier::generate().to_string();
        let err = Identifier::create_many(&[good.clone(), "bad".to_string(), String::new()])
            .unwrap_err();
        assert_eq!(err, IdentifierError::Malformed("bad".to_string()));

        let ids = Identifier::create_many(&[good.clone()]).unwrap();
        assert_eq!(ids[0].as_str(), good);
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let parsed: Result<Identifier, _> = serde_json::from_str("\"oops\"");
        assert!(parsed.is_err());

        let id = Identifier::generate();
        let encoded = serde_json::to_string(&id).unwrap();
        let decoded: Identifier = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, id);
    }
}

//! License identifiers.
//!
//! Freshly issued identifiers are random (v4) UUIDs in hyphenated form.
//! Parsing is deliberately wider than that: any 1..=128 character string over
//! `[A-Za-z0-9_-]` is a valid identifier, so hand-issued IDs remain usable.
//! The charset contains none of the delimiters used by the token and
//! revocation encodings (`.`, `"`, newlines, whitespace).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of a license identifier, in bytes.
pub const MAX_LICENSE_ID_LEN: usize = 128;

/// Rejected identifier input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLicenseId {
    /// The identifier was empty.
    #[error("license id is empty")]
    Empty,

    /// The identifier exceeded [`MAX_LICENSE_ID_LEN`].
    #[error("license id is {0} bytes long (max {MAX_LICENSE_ID_LEN})")]
    TooLong(usize),

    /// The identifier contained a character outside `[A-Za-z0-9_-]`.
    #[error("license id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Unique identifier of an issued license.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseId(String);

impl LicenseId {
    /// Generates a fresh identifier from a random v4 UUID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Parses and validates an identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidLicenseId> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

fn validate(s: &str) -> Result<(), InvalidLicenseId> {
    if s.is_empty() {
        return Err(InvalidLicenseId::Empty);
    }
    if s.len() > MAX_LICENSE_ID_LEN {
        return Err(InvalidLicenseId::TooLong(s.len()));
    }
    match s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(c) => Err(InvalidLicenseId::InvalidCharacter(c)),
        None => Ok(()),
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseId {
    type Err = InvalidLicenseId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseId {
    type Error = InvalidLicenseId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate(&s)?;
        Ok(Self(s))
    }
}

impl From<LicenseId> for String {
    fn from(id: LicenseId) -> Self {
        id.0
    }
}

impl AsRef<str> for LicenseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

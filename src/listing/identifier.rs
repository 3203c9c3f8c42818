use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Opaque reference to a stored user, category or blog.
///
/// The only way to obtain one from untrusted input is through [`Identifier::parse`],
/// so holding an `Identifier` means the format check already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a raw identifier, rejecting anything that is not a well-formed UUID.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Uuid::parse_str(raw).ok().map(Self)
    }

    /// Parse an optional raw identifier, mapping absence and bad format to the same error.
    pub fn require(raw: Option<&str>, error: ValidationError) -> Result<Self, ValidationError> {
        raw.and_then(Self::parse).ok_or(error)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for Identifier {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<Identifier> for Uuid {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl PartialEq<Uuid> for Identifier {
    fn eq(&self, other: &Uuid) -> bool {
        self.0 == *other
    }
}

impl FromStr for Identifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_and_simple_forms() {
        let id = Identifier::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let simple = Identifier::parse("67e5504410b1426f9247bb680e5fe0c8").unwrap();
        assert_eq!(id, simple);
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn rejects_wrong_length_and_charset() {
        assert!(Identifier::parse("").is_none());
        assert!(Identifier::parse("   ").is_none());
        assert!(Identifier::parse("67e55044-10b1-426f-9247").is_none());
        assert!(Identifier::parse("zze55044-10b1-426f-9247-bb680e5fe0c8").is_none());
        // 24-hex document ids from other stores are not identifiers here
        assert!(Identifier::parse("507f1f77bcf86cd799439011").is_none());
    }

    #[test]
    fn require_maps_missing_and_malformed_to_given_error() {
        assert_eq!(
            Identifier::require(None, ValidationError::InvalidOwner),
            Err(ValidationError::InvalidOwner)
        );
        assert_eq!(
            Identifier::require(Some("nope"), ValidationError::InvalidCategory),
            Err(ValidationError::InvalidCategory)
        );
    }
}

//! Account names, the by-value keys used throughout consensus state.
//!
//! Schedule collections store producer *names*, never references to full
//! producer records; the registry resolves names back to records. The empty
//! name is a valid value used to fill vacant schedule slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain account name.
///
/// Names are lowercase ASCII, 3 to 32 characters, beginning with a letter,
/// containing only letters, digits, `-` and `.`. The empty name is reserved
/// for vacant schedule slots and never owned by an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountName(String);

impl AccountName {
    /// The empty name used to fill vacant schedule slots.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the account-name grammar. Vacant-slot (empty) names fail.
    pub fn is_valid(&self) -> bool {
        let bytes = self.0.as_bytes();
        if bytes.len() < 3 || bytes.len() > 32 {
            return false;
        }
        if !bytes[0].is_ascii_lowercase() {
            return false;
        }
        bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'.')
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<vacant>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for AccountName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(AccountName::new("alice").is_valid());
        assert!(AccountName::new("miner-01").is_valid());
        assert!(AccountName::new("a.b.c").is_valid());
    }

    #[test]
    fn invalid_names() {
        assert!(!AccountName::new("ab").is_valid());
        assert!(!AccountName::new("1alice").is_valid());
        assert!(!AccountName::new("Alice").is_valid());
        assert!(!AccountName::new("alice bob").is_valid());
        assert!(!AccountName::empty().is_valid());
    }

    #[test]
    fn empty_name_is_empty() {
        assert!(AccountName::empty().is_empty());
        assert!(!AccountName::new("alice").is_empty());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(AccountName::new("alice") < AccountName::new("bob"));
    }
}

//! Secret reference parsing and validation
//!
//! A configuration entry of the form `secret:<vault>/<key>` names a secret
//! to be resolved; any other entry is an already-resolved verbatim value.

use crate::error::{Error, Result};
use std::fmt;

/// Prefix marking a configuration entry as a secret reference
pub const SECRET_PREFIX: &str = "secret:";

/// Maximum length of the vault segment
pub const MAX_VAULT_LEN: usize = 24;

/// Maximum length of the key segment
pub const MAX_KEY_LEN: usize = 127;

/// A validated `secret:<vault>/<key>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretReference {
    vault: String,
    key: String,
}

impl SecretReference {
    /// Build a reference from pre-split segments, applying the same
    /// validation as [`SecretReference::parse`].
    pub fn new(vault: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let vault = vault.into();
        let key = key.into();

        if !is_valid_segment(&vault, MAX_VAULT_LEN) || !is_valid_segment(&key, MAX_KEY_LEN) {
            return Err(Error::MalformedReference);
        }

        Ok(Self { vault, key })
    }

    /// Parse a configuration entry.
    ///
    /// Returns `Ok(Some(reference))` for a well-formed reference,
    /// `Ok(None)` when the entry does not carry the `secret:` prefix (the
    /// caller must treat the entry itself as the resolved value), and
    /// `Err(Error::MalformedReference)` when the prefix is present but the
    /// remainder is not a valid `vault/key` pair.
    pub fn parse(entry: &str) -> Result<Option<Self>> {
        let Some(rest) = entry.strip_prefix(SECRET_PREFIX) else {
            return Ok(None);
        };

        // Exactly one separator: a vault segment and a key segment
        let mut segments = rest.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(vault), Some(key), None) => Self::new(vault, key).map(Some),
            _ => Err(Error::MalformedReference),
        }
    }

    /// Vault segment of the reference
    pub fn vault(&self) -> &str {
        &self.vault
    }

    /// Key segment of the reference
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", SECRET_PREFIX, self.vault, self.key)
    }
}

fn is_valid_segment(segment: &str, max_len: usize) -> bool {
    !segment.is_empty()
        && segment.len() <= max_len
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_without_prefix_is_verbatim() {
        assert!(SecretReference::parse("plain-value").unwrap().is_none());
        assert!(SecretReference::parse("").unwrap().is_none());
        assert!(SecretReference::parse("Secret:acme/key").unwrap().is_none());
    }

    #[test]
    fn parse_valid_reference_round_trips() {
        let reference = SecretReference::parse("secret:acme/db-pass")
            .unwrap()
            .unwrap();
        assert_eq!(reference.vault(), "acme");
        assert_eq!(reference.key(), "db-pass");
        assert_eq!(reference.to_string(), "secret:acme/db-pass");
    }

    #[test]
    fn parse_accepts_boundary_lengths() {
        let vault = "v".repeat(MAX_VAULT_LEN);
        let key = "k".repeat(MAX_KEY_LEN);
        let entry = format!("secret:{}/{}", vault, key);

        let reference = SecretReference::parse(&entry).unwrap().unwrap();
        assert_eq!(reference.vault(), vault);
        assert_eq!(reference.key(), key);
    }

    #[test]
    fn parse_rejects_oversized_segments() {
        let vault = "v".repeat(MAX_VAULT_LEN + 1);
        let entry = format!("secret:{}/key", vault);
        assert!(matches!(
            SecretReference::parse(&entry),
            Err(Error::MalformedReference)
        ));

        let key = "k".repeat(MAX_KEY_LEN + 1);
        let entry = format!("secret:vault/{}", key);
        assert!(matches!(
            SecretReference::parse(&entry),
            Err(Error::MalformedReference)
        ));
    }

    #[test]
    fn parse_rejects_bad_separator_counts() {
        // No separator
        assert!(matches!(
            SecretReference::parse("secret:acme"),
            Err(Error::MalformedReference)
        ));
        // Two separators
        assert!(matches!(
            SecretReference::parse("secret:acme/db/pass"),
            Err(Error::MalformedReference)
        ));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(matches!(
            SecretReference::parse("secret:/key"),
            Err(Error::MalformedReference)
        ));
        assert!(matches!(
            SecretReference::parse("secret:vault/"),
            Err(Error::MalformedReference)
        ));
        assert!(matches!(
            SecretReference::parse("secret:"),
            Err(Error::MalformedReference)
        ));
    }

    #[test]
    fn parse_rejects_charset_violations() {
        for entry in [
            "secret:ac_me/key",
            "secret:acme/k ey",
            "secret:acme/k.ey",
            "secret:ac me/key",
            "secret:acmé/key",
        ] {
            assert!(
                matches!(SecretReference::parse(entry), Err(Error::MalformedReference)),
                "expected malformed: {entry}"
            );
        }
    }

    #[test]
    fn error_message_omits_the_entry() {
        let err = SecretReference::parse("secret:p@ssw0rd!shaped/like-a-ref").unwrap_err();
        assert!(!err.to_string().contains("p@ssw0rd"));
    }
}

//! Resolved secret result type
//!
//! [`SecretString`] carries the resolved value together with the reference
//! it came from and provenance describing how it was resolved. Display,
//! Debug and serialization render the provenance, never the value.

use serde::{de, Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOrigin {
    /// The configuration entry was not a reference and is used unchanged
    Verbatim,
    /// A local developer override store
    UserOverride,
    /// A secrets directory on the local filesystem
    File,
    /// The remote vault service
    Vault,
}

impl fmt::Display for SecretOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecretOrigin::Verbatim => "Verbatim",
            SecretOrigin::UserOverride => "UserOverride",
            SecretOrigin::File => "File",
            SecretOrigin::Vault => "Vault",
        };
        f.write_str(name)
    }
}

/// The result of resolving a configuration entry.
///
/// In addition to the secret value, carries the key that was used to
/// resolve it and provenance identifying how the resolution happened.
/// The value is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    /// The original entry from the configuration. Not secret.
    #[zeroize(skip)]
    key: String,
    /// The associated secret value
    value: String,
    #[zeroize(skip)]
    origin: SecretOrigin,
    /// Store id, file timestamp or vault version, depending on origin
    #[zeroize(skip)]
    identity: String,
}

impl SecretString {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        origin: SecretOrigin,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            origin,
            identity: identity.into(),
        }
    }

    /// Wrap a configuration entry that is not a secret reference.
    pub fn verbatim(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            key: entry.clone(),
            value: entry,
            origin: SecretOrigin::Verbatim,
            identity: String::new(),
        }
    }

    /// The original configuration entry
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The resolved secret value. Keep it out of logs and serialized output.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn origin(&self) -> SecretOrigin {
        self.origin
    }

    /// Provenance detail: override-store id, file timestamp or vault version
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Safe stringification: key plus provenance, never the value
impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            SecretOrigin::Verbatim => f.write_str(&self.key),
            origin => write!(f, "{} {} {}", self.key, origin, self.identity),
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretString")
            .field("key", &self.key)
            .field("value", &format_args!("[REDACTED {} bytes]", self.value.len()))
            .field("origin", &self.origin)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Serializes as the [`Display`](fmt::Display) string, so that a
/// `SecretString` embedded in a larger structure never writes its value.
impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Deserialization is unsupported: a serialized `SecretString` does not
/// contain its value, so reading one back is always a logic error.
impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(_deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Err(de::Error::custom("cannot deserialize a secret"))
    }
}

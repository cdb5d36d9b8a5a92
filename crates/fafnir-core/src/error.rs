//! Error types for fafnir-core

use thiserror::Error;

/// Result type alias using fafnir-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Fafnir
#[derive(Error, Debug)]
pub enum Error {
    /// Entry carries the `secret:` prefix but fails segment validation.
    ///
    /// A malformed entry may actually be a secret that was mis-shaped as a
    /// reference, so the offending string is never included in the message.
    #[error("entry starts with 'secret:' but is not in proper 'vault/key' format")]
    MalformedReference,

    /// No strategy produced a value for the reference
    #[error("no value found for secret {key} in vault {vault}")]
    NotResolved { vault: String, key: String },

    /// The vault was reached but the request failed
    #[error("failed to retrieve secret {name} from {url}")]
    VaultFetch {
        name: String,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The vault answered, but the secret has no content
    #[error("secret {name} from {url} has no associated value")]
    EmptyValue { name: String, url: String },

    /// Retrieval was cancelled while waiting on the vault
    #[error("retrieval of secret {key} from vault {vault} was cancelled")]
    Cancelled { vault: String, key: String },

    /// The vault client could not be constructed or authenticated
    #[error("vault client error: {message}")]
    VaultClient { message: String },

    /// Principal credentials for the vault client could not be loaded
    #[error("could not open '{path}' to read {what}")]
    Credentials {
        path: String,
        what: &'static str,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Write attempted through a resolving configuration wrapper
    #[error("configuration behind secret resolution is read-only")]
    ReadOnlyConfiguration,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not-resolved error for a vault/key pair
    pub fn not_resolved(vault: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotResolved {
            vault: vault.into(),
            key: key.into(),
        }
    }

    /// Create a vault fetch error scoped to a secret name and target URL
    pub fn vault_fetch(
        name: impl Into<String>,
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::VaultFetch {
            name: name.into(),
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Create an empty-value error scoped to a secret name and target URL
    pub fn empty_value(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::EmptyValue {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Create a cancellation error for a vault/key pair
    pub fn cancelled(vault: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Cancelled {
            vault: vault.into(),
            key: key.into(),
        }
    }

    /// Create a vault client error
    pub fn vault_client(message: impl Into<String>) -> Self {
        Self::VaultClient {
            message: message.into(),
        }
    }

    /// Create a credentials error naming the unreadable path
    pub fn credentials(
        path: impl Into<String>,
        what: &'static str,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Credentials {
            path: path.into(),
            what,
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

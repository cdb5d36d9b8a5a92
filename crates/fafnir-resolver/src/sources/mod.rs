//! Secret source trait and implementations

pub mod file;
pub mod user;
pub mod vault;

use async_trait::async_trait;
use fafnir_core::{Result, SecretReference, SecretString};
use tokio_util::sync::CancellationToken;

/// One ordered source of truth for resolving a secret reference
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Attempt to resolve a reference from this source.
    ///
    /// Returns `Ok(Some(secret))` if resolved successfully,
    /// `Ok(None)` if this source has no opinion and the next one should be
    /// tried, and `Err` if this source attempted resolution and failed.
    ///
    /// Only the vault source observes `cancel`; the local sources complete
    /// without suspending.
    async fn attempt(
        &self,
        reference: &SecretReference,
        cancel: &CancellationToken,
    ) -> Result<Option<SecretString>>;

    /// Source name for diagnostics
    fn name(&self) -> &'static str;
}

pub use file::FileSource;
pub use user::UserOverrideSource;
pub use vault::VaultSource;

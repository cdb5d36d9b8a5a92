//! Secret resolution orchestration
//!
//! [`SecretResolver`] tries its sources strictly in order and returns the
//! first one with an opinion. The order is fixed: developer overrides,
//! then secrets directories, then the remote vault, so that local
//! development can shadow a real vault entry and the network is only
//! reached when nothing local answers.

use crate::client::VaultConfig;
use crate::sources::{FileSource, SecretSource, UserOverrideSource, VaultSource};
use fafnir_core::{Error, Result, SecretReference, SecretString};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct SecretResolver {
    sources: Vec<Box<dyn SecretSource>>,
}

impl SecretResolver {
    /// Resolver with the standard source order and environment-derived
    /// vault settings.
    pub fn new() -> Self {
        Self::with_vault_config(VaultConfig::from_env())
    }

    /// Resolver with the standard source order and explicit vault settings.
    pub fn with_vault_config(config: VaultConfig) -> Self {
        let sources: Vec<Box<dyn SecretSource>> = vec![
            Box::new(UserOverrideSource::new()),
            Box::new(FileSource::new()),
            Box::new(VaultSource::new(config)),
        ];
        Self { sources }
    }

    /// Resolver over custom sources (for testing)
    pub fn with_sources(sources: Vec<Box<dyn SecretSource>>) -> Self {
        Self { sources }
    }

    /// Resolve a validated reference, with no cancellation.
    pub async fn resolve(&self, reference: &SecretReference) -> Result<SecretString> {
        self.resolve_with_cancel(reference, CancellationToken::new())
            .await
    }

    /// Resolve a validated reference.
    ///
    /// `cancel` aborts the vault step; the local steps run to completion
    /// regardless since they never suspend.
    pub async fn resolve_with_cancel(
        &self,
        reference: &SecretReference,
        cancel: CancellationToken,
    ) -> Result<SecretString> {
        for source in &self.sources {
            match source.attempt(reference, &cancel).await? {
                Some(secret) => {
                    debug!(source = source.name(), key = %reference, "resolved secret");
                    return Ok(secret);
                }
                None => {
                    debug!(source = source.name(), key = %reference, "source has no opinion");
                }
            }
        }

        Err(Error::not_resolved(reference.vault(), reference.key()))
    }

    /// Resolve a configuration entry.
    ///
    /// Entries without the `secret:` prefix come back as verbatim results
    /// wrapping the entry unchanged; prefixed entries are parsed, validated
    /// and resolved through the chain.
    pub async fn resolve_text(&self, entry: &str) -> Result<SecretString> {
        match SecretReference::parse(entry)? {
            Some(reference) => self.resolve(&reference).await,
            None => Ok(SecretString::verbatim(entry)),
        }
    }

    /// [`resolve_text`](Self::resolve_text) with a cancellation signal for
    /// the vault step.
    pub async fn resolve_text_with_cancel(
        &self,
        entry: &str,
        cancel: CancellationToken,
    ) -> Result<SecretString> {
        match SecretReference::parse(entry)? {
            Some(reference) => self.resolve_with_cancel(&reference, cancel).await,
            None => Ok(SecretString::verbatim(entry)),
        }
    }

    /// Blocking variant of [`resolve`](Self::resolve), for call sites with
    /// no cancellation needs.
    ///
    /// Must not be called from a single-threaded async context; inside a
    /// multi-threaded runtime the calling worker is parked for the
    /// duration.
    pub fn resolve_blocking(&self, reference: &SecretReference) -> Result<SecretString> {
        block_on(self.resolve(reference))
    }

    /// Blocking variant of [`resolve_text`](Self::resolve_text).
    ///
    /// Verbatim entries are answered without touching a runtime.
    pub fn resolve_text_blocking(&self, entry: &str) -> Result<SecretString> {
        match SecretReference::parse(entry)? {
            Some(reference) => self.resolve_blocking(&reference),
            None => Ok(SecretString::verbatim(entry)),
        }
    }
}

impl Default for SecretResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a resolution future to completion from synchronous code.
fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(future),
    }
}

//! Secret resolution for Fafnir
//!
//! This crate turns `secret:<vault>/<key>` configuration entries into
//! resolved values by trying, in order:
//! 1. A local developer override store
//! 2. Secrets directories on the local filesystem
//! 3. The remote vault service
//!
//! The first source with an opinion wins. Results carry provenance instead
//! of leaking the value into logs or serialized output, and a recursive
//! wrapper makes an entire configuration tree resolve transparently on
//! read.

pub mod client;
pub mod config;
pub mod resolver;
pub mod sources;

pub use client::{HttpVaultGateway, SecretBundle, VaultConfig, VaultGateway};
pub use config::ResolvedSection;
pub use resolver::SecretResolver;
pub use sources::{FileSource, SecretSource, UserOverrideSource, VaultSource};

use fafnir_core::{ConfigSection, Result, SecretString};
use std::sync::Arc;

/// Resolve a single configuration entry with a default resolver.
pub async fn resolve_text(entry: &str) -> Result<SecretString> {
    SecretResolver::new().resolve_text(entry).await
}

/// Blocking variant of [`resolve_text`] for call sites that cannot
/// participate in asynchronous waiting.
pub fn resolve_text_blocking(entry: &str) -> Result<SecretString> {
    SecretResolver::new().resolve_text_blocking(entry)
}

/// Wrap a configuration tree so that every value read through it is
/// passed through secret resolution.
pub fn resolve_config(section: Arc<dyn ConfigSection>) -> Arc<dyn ConfigSection> {
    Arc::new(ResolvedSection::new(section, Arc::new(SecretResolver::new())))
}

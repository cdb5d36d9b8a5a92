//! Developer override store secret source
//!
//! Overrides live outside the repository, under the user configuration
//! directory, scoped by an application identity:
//! `<config dir>/fafnir/usersecrets/<store id>/secrets.json`. The file is
//! a flat JSON object whose entries are named `<vault>/<key>`.
//!
//! This source never fails resolution: a missing store, an unreadable or
//! malformed file, and an absent entry all mean "no opinion", so the
//! remote vault stays the authoritative failure reporter.

use crate::sources::SecretSource;
use async_trait::async_trait;
use fafnir_core::{Result, SecretOrigin, SecretReference, SecretString};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Environment variable carrying the application's override store id
pub const USER_SECRETS_ID_VAR: &str = "FAFNIR_USER_SECRETS_ID";

pub struct UserOverrideSource {
    store_id: Option<String>,
    store_root: PathBuf,
}

impl UserOverrideSource {
    /// Discover the store id from the environment and use the standard
    /// per-user store root.
    pub fn new() -> Self {
        Self {
            store_id: std::env::var(USER_SECRETS_ID_VAR).ok(),
            store_root: Self::default_store_root(),
        }
    }

    /// Use an explicit store id and root directory.
    pub fn with_store(store_id: impl Into<String>, store_root: impl Into<PathBuf>) -> Self {
        Self {
            store_id: Some(store_id.into()),
            store_root: store_root.into(),
        }
    }

    fn default_store_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fafnir")
            .join("usersecrets")
    }

    fn lookup(&self, store_id: &str, reference: &SecretReference) -> Option<String> {
        let path = self.store_root.join(store_id).join("secrets.json");
        let content = std::fs::read_to_string(&path).ok()?;
        let entries: HashMap<String, String> = serde_json::from_str(&content).ok()?;
        entries
            .get(&format!("{}/{}", reference.vault(), reference.key()))
            .cloned()
    }
}

impl Default for UserOverrideSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretSource for UserOverrideSource {
    async fn attempt(
        &self,
        reference: &SecretReference,
        _cancel: &CancellationToken,
    ) -> Result<Option<SecretString>> {
        let Some(store_id) = &self.store_id else {
            debug!("no override store configured for this application");
            return Ok(None);
        };

        match self.lookup(store_id, reference) {
            Some(value) => {
                debug!(store = %store_id, key = %reference, "resolved from override store");
                Ok(Some(SecretString::new(
                    reference.to_string(),
                    value,
                    SecretOrigin::UserOverride,
                    store_id.clone(),
                )))
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "user-override"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn reference(vault: &str, key: &str) -> SecretReference {
        SecretReference::new(vault, key).unwrap()
    }

    fn write_store(root: &TempDir, store_id: &str, json: &str) {
        let dir = root.path().join(store_id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("secrets.json"), json).unwrap();
    }

    #[tokio::test]
    async fn resolves_entry_named_vault_slash_key() {
        let root = TempDir::new().unwrap();
        write_store(&root, "app-1234", r#"{"acme/db-pass": "override-value"}"#);

        let source = UserOverrideSource::with_store("app-1234", root.path());
        let result = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap();

        let secret = result.unwrap();
        assert_eq!(secret.value(), "override-value");
        assert_eq!(secret.key(), "secret:acme/db-pass");
        assert_eq!(secret.origin(), SecretOrigin::UserOverride);
        assert_eq!(secret.identity(), "app-1234");
    }

    #[tokio::test]
    async fn absent_entry_is_no_opinion() {
        let root = TempDir::new().unwrap();
        write_store(&root, "app-1234", r#"{"acme/other": "x"}"#);

        let source = UserOverrideSource::with_store("app-1234", root.path());
        let result = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn missing_store_file_is_no_opinion() {
        let root = TempDir::new().unwrap();

        let source = UserOverrideSource::with_store("app-1234", root.path());
        let result = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn malformed_store_is_no_opinion() {
        let root = TempDir::new().unwrap();
        write_store(&root, "app-1234", "not json at all {");

        let source = UserOverrideSource::with_store("app-1234", root.path());
        let result = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn unconfigured_application_is_no_opinion() {
        std::env::remove_var(USER_SECRETS_ID_VAR);

        let source = UserOverrideSource::new();
        let result = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn store_id_discovered_from_environment() {
        std::env::set_var(USER_SECRETS_ID_VAR, "env-app");

        let source = UserOverrideSource::new();
        assert_eq!(source.store_id.as_deref(), Some("env-app"));

        std::env::remove_var(USER_SECRETS_ID_VAR);
    }
}

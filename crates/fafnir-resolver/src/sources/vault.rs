//! Remote vault secret source
//!
//! Last in the chain and the only source that suspends. The gateway
//! handle is constructed lazily on first use and reused for the lifetime
//! of the source; construction failures surface as resolution errors
//! rather than "no opinion", since the vault is the authoritative source
//! once the local ones have passed.

use crate::client::{HttpVaultGateway, SecretBundle, VaultConfig, VaultGateway};
use crate::sources::SecretSource;
use async_trait::async_trait;
use fafnir_core::{Error, Result, SecretOrigin, SecretReference, SecretString};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct VaultSource {
    config: VaultConfig,
    gateway: OnceCell<Arc<dyn VaultGateway>>,
}

impl VaultSource {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            gateway: OnceCell::new(),
        }
    }

    /// Use a pre-built gateway instead of connecting on first access.
    pub fn with_gateway(config: VaultConfig, gateway: Arc<dyn VaultGateway>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(gateway);
        Self {
            config,
            gateway: cell,
        }
    }

    /// Gateway handle, connected at most once
    async fn gateway(&self) -> Result<Arc<dyn VaultGateway>> {
        self.gateway
            .get_or_try_init(|| async {
                let gateway = HttpVaultGateway::connect(&self.config)?;
                Ok(Arc::new(gateway) as Arc<dyn VaultGateway>)
            })
            .await
            .map(Arc::clone)
    }
}

#[async_trait]
impl SecretSource for VaultSource {
    async fn attempt(
        &self,
        reference: &SecretReference,
        cancel: &CancellationToken,
    ) -> Result<Option<SecretString>> {
        let url = self.config.vault_url(reference.vault());
        let gateway = self.gateway().await?;

        let bundle = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(Error::cancelled(reference.vault(), reference.key()));
            }
            result = gateway.fetch_secret(&url, reference.key()) => result?,
        };

        let SecretBundle { id, value } = bundle;
        let Some(value) = value else {
            return Err(Error::empty_value(reference.key(), url.as_str()));
        };

        // The version is the trailing segment of the resource identifier
        let identity = id.rsplit('/').next().unwrap_or_default().to_string();
        debug!(vault = reference.vault(), key = %reference, version = %identity, "resolved from vault");

        Ok(Some(SecretString::new(
            reference.to_string(),
            value,
            SecretOrigin::Vault,
            identity,
        )))
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reference(vault: &str, key: &str) -> SecretReference {
        SecretReference::new(vault, key).unwrap()
    }

    struct StaticGateway {
        id: &'static str,
        value: Option<&'static str>,
    }

    #[async_trait]
    impl VaultGateway for StaticGateway {
        async fn fetch_secret(&self, _vault_url: &str, _name: &str) -> Result<SecretBundle> {
            Ok(SecretBundle {
                id: self.id.to_string(),
                value: self.value.map(str::to_string),
            })
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl VaultGateway for FailingGateway {
        async fn fetch_secret(&self, vault_url: &str, name: &str) -> Result<SecretBundle> {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            Err(Error::vault_fetch(name, vault_url, io))
        }
    }

    #[tokio::test]
    async fn resolves_with_version_identity() {
        let source = VaultSource::with_gateway(
            VaultConfig::default(),
            Arc::new(StaticGateway {
                id: "https://acme.vault.azure.net/secrets/db-pass/v3",
                value: Some("p@ss"),
            }),
        );

        let secret = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(secret.key(), "secret:acme/db-pass");
        assert_eq!(secret.value(), "p@ss");
        assert_eq!(secret.origin(), SecretOrigin::Vault);
        assert_eq!(secret.identity(), "v3");
        assert_eq!(secret.to_string(), "secret:acme/db-pass Vault v3");
    }

    #[tokio::test]
    async fn missing_value_is_an_error_not_no_opinion() {
        let source = VaultSource::with_gateway(
            VaultConfig::default(),
            Arc::new(StaticGateway {
                id: "https://acme.vault.azure.net/secrets/db-pass/v3",
                value: None,
            }),
        );

        let err = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::EmptyValue { name, url } => {
                assert_eq!(name, "db-pass");
                assert_eq!(url, "https://acme.vault.azure.net/");
            }
            other => panic!("expected EmptyValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let source =
            VaultSource::with_gateway(VaultConfig::default(), Arc::new(FailingGateway));

        let err = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("db-pass"), "got: {msg}");
        assert!(msg.contains("https://acme.vault.azure.net/"), "got: {msg}");
        assert!(!msg.contains("p@ss"));
    }

    #[tokio::test]
    async fn lazy_connection_failure_surfaces_as_error() {
        // Empty principal directory: the gateway cannot be constructed,
        // and that failure belongs to the vault step.
        let principal = TempDir::new().unwrap();
        let config = VaultConfig {
            principal_dirs: vec![principal.path().to_path_buf()],
            ..VaultConfig::default()
        };

        let source = VaultSource::new(config);
        let err = source
            .attempt(&reference("acme", "db-pass"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Credentials { .. }));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_vault_call() {
        struct PendingGateway;

        #[async_trait]
        impl VaultGateway for PendingGateway {
            async fn fetch_secret(&self, _vault_url: &str, _name: &str) -> Result<SecretBundle> {
                std::future::pending().await
            }
        }

        let source =
            VaultSource::with_gateway(VaultConfig::default(), Arc::new(PendingGateway));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = source
            .attempt(&reference("acme", "db-pass"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }
}

//! Remote vault client
//!
//! [`VaultGateway`] is the opaque fetch service the resolution chain
//! talks to; [`HttpVaultGateway`] is the production implementation. It
//! authenticates as a service principal whose credentials are stored on
//! the local machine, caches the bearer token until it nears expiry, and
//! fetches secrets over HTTPS. The validity of the principal information
//! is only checked upon the first secret access.

use async_trait::async_trait;
use fafnir_core::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::debug;

/// Settings for reaching the vault service
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// DNS suffix appended to the vault name: `https://{vault}.{suffix}/`
    pub dns_suffix: String,
    /// REST API version sent with every secret request
    pub api_version: String,
    /// Authority issuing bearer tokens for the vault
    pub authority: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Candidate directories holding the principal credential files
    pub principal_dirs: Vec<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            dns_suffix: "vault.azure.net".to_string(),
            api_version: "7.4".to_string(),
            authority: "https://login.microsoftonline.com".to_string(),
            timeout: Duration::from_secs(30),
            principal_dirs: vec![
                PathBuf::from("/etc/fafnir/principal"),
                PathBuf::from(r"C:\FafnirData\config\principal"),
            ],
        }
    }
}

impl VaultConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(suffix) = std::env::var("FAFNIR_VAULT_DNS_SUFFIX") {
            config.dns_suffix = suffix;
        }
        if let Some(secs) = std::env::var("FAFNIR_VAULT_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Base URL of the vault named `vault`
    pub fn vault_url(&self, vault: &str) -> String {
        format!("https://{}.{}/", vault, self.dns_suffix)
    }
}

/// One secret as answered by the vault service
#[derive(Deserialize)]
pub struct SecretBundle {
    /// Resource identifier; its trailing path segment is the version
    pub id: String,
    /// Secret content, absent when the vault holds an empty entry
    #[serde(default)]
    pub value: Option<String>,
}

/// Opaque asynchronous key-value fetch service backing the vault source
#[async_trait]
pub trait VaultGateway: Send + Sync {
    /// Fetch secret `name` from the vault at `vault_url`.
    async fn fetch_secret(&self, vault_url: &str, name: &str) -> Result<SecretBundle>;
}

/// Service principal credentials loaded from the local machine
#[derive(Debug)]
struct PrincipalCredentials {
    client_id: String,
    tenant_id: String,
    client_secret: String,
}

impl PrincipalCredentials {
    /// Load from the first existing candidate directory, or the working
    /// directory when none of them exist.
    ///
    /// The directory must contain `client_id.txt`, `tenant_id.txt` and
    /// `client_secret.txt`.
    fn load(candidates: &[PathBuf]) -> Result<Self> {
        let dir = candidates
            .iter()
            .find(|dir| dir.is_dir())
            .cloned()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            client_id: read_trimmed(&dir.join("client_id.txt"), "client-id")?,
            tenant_id: read_trimmed(&dir.join("tenant_id.txt"), "tenant-id")?,
            client_secret: read_trimmed(&dir.join("client_secret.txt"), "client secret")?,
        })
    }
}

fn read_trimmed(path: &Path, what: &'static str) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|e| Error::credentials(path.display().to_string(), what, Some(e)))
}

/// Cached bearer token with its expiry window
struct BearerToken {
    token: String,
    acquired: SystemTime,
    expires_in: u64,
}

impl BearerToken {
    /// Refresh when less than a minute of validity remains
    fn needs_refresh(&self) -> bool {
        let elapsed = self.acquired.elapsed().unwrap_or_default().as_secs();
        self.expires_in.saturating_sub(elapsed) < 60
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// HTTPS vault gateway authenticating via the client-credentials grant
pub struct HttpVaultGateway {
    http: reqwest::Client,
    credentials: PrincipalCredentials,
    authority: String,
    scope: String,
    api_version: String,
    token: RwLock<Option<BearerToken>>,
}

impl HttpVaultGateway {
    /// Create a gateway using the principal information stored on the
    /// local machine.
    pub fn connect(config: &VaultConfig) -> Result<Self> {
        let credentials = PrincipalCredentials::load(&config.principal_dirs)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::vault_client(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            credentials,
            authority: config.authority.clone(),
            scope: format!("https://{}/.default", config.dns_suffix),
            api_version: config.api_version.clone(),
            token: RwLock::new(None),
        })
    }

    /// Current bearer token, refreshed from the authority when needed
    async fn bearer(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.needs_refresh() {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.token.clone();
        *self.token.write().await = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<BearerToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, self.credentials.tenant_id
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let acquired = SystemTime::now();
        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::vault_client(format!("token request to {url} failed: {e}")))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::vault_client(format!("malformed token response from {url}: {e}")))?;

        debug!(authority = %url, "acquired vault bearer token");
        Ok(BearerToken {
            token: token.access_token,
            acquired,
            expires_in: token.expires_in,
        })
    }
}

#[async_trait]
impl VaultGateway for HttpVaultGateway {
    async fn fetch_secret(&self, vault_url: &str, name: &str) -> Result<SecretBundle> {
        let token = self
            .bearer()
            .await
            .map_err(|e| Error::vault_fetch(name, vault_url, e))?;

        let request_url = format!(
            "{}secrets/{}?api-version={}",
            vault_url, name, self.api_version
        );
        let response = self
            .http
            .get(&request_url)
            .bearer_auth(&token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::vault_fetch(name, vault_url, e))?;

        response
            .json()
            .await
            .map_err(|e| Error::vault_fetch(name, vault_url, e))
    }
}

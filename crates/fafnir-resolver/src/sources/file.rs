//! Filesystem secret source
//!
//! Looks, in order, at a `secrets/` directory under the current working
//! directory, then the machine-global Windows and Unix locations. Only the
//! first directory that exists is consulted: the secret is the trimmed
//! content of `<dir>/<vault>/<key>`, and a missing or unreadable file
//! there does not fall through to the remaining directories.
//!
//! Like the override store, this source never fails resolution; any local
//! problem is "no opinion" so the remote vault stays the authoritative
//! failure reporter.

use crate::sources::SecretSource;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use fafnir_core::{Result, SecretOrigin, SecretReference, SecretString};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct FileSource {
    dirs: Vec<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self {
            dirs: Self::default_dirs(),
        }
    }

    /// Use an explicit ordered directory list.
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn default_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(3);
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd.join("secrets"));
        }
        dirs.push(PathBuf::from(r"C:\FafnirData\config\secrets"));
        dirs.push(PathBuf::from("/etc/fafnir/secrets"));
        dirs
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretSource for FileSource {
    async fn attempt(
        &self,
        reference: &SecretReference,
        _cancel: &CancellationToken,
    ) -> Result<Option<SecretString>> {
        let Some(dir) = self.dirs.iter().find(|dir| dir.is_dir()) else {
            return Ok(None);
        };

        let path = dir.join(reference.vault()).join(reference.key());
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "secret file not readable");
                return Ok(None);
            }
        };
        let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return Ok(None),
        };

        let identity =
            DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Micros, true);
        debug!(path = %path.display(), key = %reference, "resolved from secrets directory");

        Ok(Some(SecretString::new(
            reference.to_string(),
            content.trim(),
            SecretOrigin::File,
            identity,
        )))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

//! Resolving configuration wrapper
//!
//! [`ResolvedSection`] wraps a node of an external configuration tree so
//! that every value read through it is passed through secret resolution.
//! The wrapper holds a reference to the external node rather than copying
//! it, wraps children lazily on every traversal, and passes change
//! notification through untouched, so live reload of the underlying tree
//! stays visible.
//!
//! The wrapped view is read-only even when the underlying tree is
//! writable: a write that bypassed resolution would later be read back as
//! if it were already resolved.

use crate::resolver::SecretResolver;
use fafnir_core::{ConfigSection, Error, Result};
use std::sync::Arc;
use tokio::sync::watch;

pub struct ResolvedSection {
    inner: Arc<dyn ConfigSection>,
    resolver: Arc<SecretResolver>,
}

impl ResolvedSection {
    pub fn new(inner: Arc<dyn ConfigSection>, resolver: Arc<SecretResolver>) -> Self {
        Self { inner, resolver }
    }

    fn wrap(&self, child: Arc<dyn ConfigSection>) -> Arc<dyn ConfigSection> {
        Arc::new(ResolvedSection {
            inner: child,
            resolver: Arc::clone(&self.resolver),
        })
    }

    /// A resolution failure for a referenced secret must fail the read;
    /// a blank setting slipping through unnoticed is worse than an error.
    fn resolve_entry(&self, raw: &str) -> Result<String> {
        Ok(self.resolver.resolve_text_blocking(raw)?.value().to_string())
    }
}

impl ConfigSection for ResolvedSection {
    fn key(&self) -> &str {
        self.inner.key()
    }

    fn path(&self) -> String {
        self.inner.path()
    }

    fn value(&self) -> Result<Option<String>> {
        match self.inner.value()? {
            Some(raw) => self.resolve_entry(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.inner.get(key)? {
            Some(raw) => self.resolve_entry(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::ReadOnlyConfiguration)
    }

    fn section(&self, key: &str) -> Arc<dyn ConfigSection> {
        self.wrap(self.inner.section(key))
    }

    fn children(&self) -> Vec<Arc<dyn ConfigSection>> {
        self.inner
            .children()
            .into_iter()
            .map(|child| self.wrap(child))
            .collect()
    }

    fn change_notifier(&self) -> Option<watch::Receiver<u64>> {
        self.inner.change_notifier()
    }
}

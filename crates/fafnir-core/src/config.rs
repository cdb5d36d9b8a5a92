//! Hierarchical configuration tree abstraction
//!
//! Fafnir does not load configuration itself; it wraps a tree built
//! elsewhere. [`ConfigSection`] is the read surface that wrapper operates
//! on: a node with an optional direct value, named child entries, child
//! sections, and optional change notification.

use crate::error::Result;
use std::sync::Arc;
use tokio::sync::watch;

/// One node of a hierarchical configuration tree.
///
/// A root is a section with an empty key and path. Implementations that
/// support live reload can hand out a [`watch`] receiver bumped on every
/// reload; static trees return `None`.
pub trait ConfigSection: Send + Sync {
    /// Key of this section relative to its parent
    fn key(&self) -> &str;

    /// Full path of this section from the root
    fn path(&self) -> String;

    /// Direct value of this section, when it is a leaf
    fn value(&self) -> Result<Option<String>>;

    /// Value of the immediate child entry `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value of the immediate child entry `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Child section named `key`.
    ///
    /// Mirrors the underlying tree's semantics for absent keys (typically
    /// an empty section rather than an error).
    fn section(&self, key: &str) -> Arc<dyn ConfigSection>;

    /// All immediate child sections
    fn children(&self) -> Vec<Arc<dyn ConfigSection>>;

    /// Receiver bumped when the underlying provider reloads, if supported
    fn change_notifier(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

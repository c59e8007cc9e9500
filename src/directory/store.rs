//! Directory store trait

use super::types::{Attributes, DirectoryEntry, KindFilter, SearchScope};
use crate::error::DirectoryResult;
use crate::path::EntryPath;
// async_trait required for dyn-compatibility with Arc<dyn DirectoryStore>
use async_trait::async_trait;
use std::sync::Arc;

/// Hierarchical key/attribute store backing the directory
///
/// Every call is an independent round trip. Implementations must make each
/// single-value mutation atomic; multi-entry operations built on top of
/// this trait are not transactional.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Search below `base`, returning matching entries in pre-order
    ///
    /// Fails with `NoSuchEntry` when the base does not exist.
    async fn search(
        &self,
        base: &EntryPath,
        scope: SearchScope,
        filter: KindFilter,
    ) -> DirectoryResult<Vec<DirectoryEntry>>;

    /// Read an entry's attributes; `None` if it does not exist
    async fn read_entry(&self, path: &EntryPath) -> DirectoryResult<Option<Attributes>>;

    /// Create an entry; its parent must exist
    async fn add_entry(&self, path: &EntryPath, attributes: Attributes) -> DirectoryResult<()>;

    /// Add one value to a multi-valued attribute
    async fn add_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()>;

    /// Remove one value from a multi-valued attribute
    async fn remove_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()>;

    async fn entry_exists(&self, path: &EntryPath) -> DirectoryResult<bool> {
        Ok(self.read_entry(path).await?.is_some())
    }

    /// Name of the implementation (for logging)
    fn store_type(&self) -> &'static str;
}

/// Shared handle to a directory store
pub type SharedStore = Arc<dyn DirectoryStore>;

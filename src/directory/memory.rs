//! In-memory directory store
//!
//! Keeps the tree in a `BTreeMap` ordered by [`EntryPath`], so range scans
//! come back in pre-order. A single `RwLock` guards the map; each trait call
//! takes it once, which makes every single-value mutation atomic.

use super::store::DirectoryStore;
use super::types::{Attributes, DirectoryEntry, KindFilter, SearchScope};
use crate::error::{DirectoryError, DirectoryResult};
use crate::path::{Branch, EntryPath, PathGrammar};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Directory store held entirely in memory
pub struct InMemoryDirectory {
    grammar: Arc<PathGrammar>,
    entries: RwLock<BTreeMap<EntryPath, Attributes>>,
}

impl InMemoryDirectory {
    /// Store holding the branch roots and each branch's super administrator group
    pub fn new(grammar: Arc<PathGrammar>) -> Self {
        let mut entries = Self::roots(&grammar);
        for branch in Branch::all() {
            // The configured name was validated when the grammar was built
            if let Ok(path) = grammar.super_admin_group(*branch) {
                let name = grammar.super_admin_name(*branch).to_string();
                entries.insert(path, Attributes::named_group(grammar.schema(), &name));
            }
        }
        Self {
            grammar,
            entries: RwLock::new(entries),
        }
    }

    /// Store holding only the branch roots
    pub fn bare(grammar: Arc<PathGrammar>) -> Self {
        let entries = Self::roots(&grammar);
        Self {
            grammar,
            entries: RwLock::new(entries),
        }
    }

    fn roots(grammar: &PathGrammar) -> BTreeMap<EntryPath, Attributes> {
        Branch::all()
            .iter()
            .map(|branch| {
                (
                    EntryPath::branch_root(*branch),
                    Attributes::organizational_unit(grammar.schema(), branch.as_str()),
                )
            })
            .collect()
    }

    /// Number of entries, branch roots included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn dn(&self, path: &EntryPath) -> String {
        self.grammar.render(path)
    }

    fn no_such_entry(&self, path: &EntryPath) -> DirectoryError {
        DirectoryError::NoSuchEntry { path: self.dn(path) }
    }

    fn is_named_group(&self, attributes: &Attributes) -> bool {
        KindFilter::NamedGroup.matches(attributes, self.grammar.schema())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    #[instrument(skip(self), fields(base = %base))]
    async fn search(
        &self,
        base: &EntryPath,
        scope: SearchScope,
        filter: KindFilter,
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        let entries = self.entries.read().await;
        if !entries.contains_key(base) {
            return Err(self.no_such_entry(base));
        }

        let schema = self.grammar.schema();
        let found: Vec<DirectoryEntry> = entries
            .range((Bound::Included(base), Bound::Unbounded))
            .take_while(|(path, _)| path.is_within(base))
            .filter(|(path, _)| match scope {
                SearchScope::Base => *path == base,
                SearchScope::OneLevel => path.depth() == base.depth() + 1,
                SearchScope::Subtree => true,
            })
            .filter(|(_, attributes)| filter.matches(attributes, schema))
            .map(|(path, attributes)| DirectoryEntry {
                path: path.clone(),
                attributes: attributes.clone(),
            })
            .collect();

        debug!(count = found.len(), ?scope, ?filter, "Search complete");
        Ok(found)
    }

    async fn read_entry(&self, path: &EntryPath) -> DirectoryResult<Option<Attributes>> {
        Ok(self.entries.read().await.get(path).cloned())
    }

    #[instrument(skip(self, attributes), fields(path = %path))]
    async fn add_entry(&self, path: &EntryPath, attributes: Attributes) -> DirectoryResult<()> {
        if path.is_principal() {
            return Err(DirectoryError::ObjectClassViolation {
                path: self.dn(path),
                reason: "principals are referenced by member values, not stored as entries"
                    .to_string(),
            });
        }

        let member_attribute = &self.grammar.schema().member_attribute;
        if self.is_named_group(&attributes) && attributes.values(member_attribute).is_empty() {
            return Err(DirectoryError::ObjectClassViolation {
                path: self.dn(path),
                reason: format!("a named group requires at least one {} value", member_attribute),
            });
        }

        let mut entries = self.entries.write().await;
        if entries.contains_key(path) {
            return Err(DirectoryError::EntryAlreadyExists { path: self.dn(path) });
        }
        if let Some(parent) = path.parent()
            && !entries.contains_key(&parent)
        {
            return Err(self.no_such_entry(&parent));
        }

        entries.insert(path.clone(), attributes);
        debug!("Entry added");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn add_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        let mut entries = self.entries.write().await;
        let attributes = entries
            .get_mut(path)
            .ok_or_else(|| self.no_such_entry(path))?;

        if !attributes.insert_value(attribute, value) {
            return Err(DirectoryError::ValueAlreadyPresent {
                path: self.dn(path),
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn remove_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        let mut entries = self.entries.write().await;
        let attributes = entries
            .get_mut(path)
            .ok_or_else(|| self.no_such_entry(path))?;

        if !attributes.contains_value(attribute, value) {
            return Err(DirectoryError::NoSuchValue {
                path: self.dn(path),
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
        }

        let member_attribute = &self.grammar.schema().member_attribute;
        if attribute.eq_ignore_ascii_case(member_attribute)
            && attributes.values(attribute).len() == 1
            && KindFilter::NamedGroup.matches(attributes, self.grammar.schema())
        {
            return Err(DirectoryError::ObjectClassViolation {
                path: self.dn(path),
                reason: format!("cannot remove the last {} value", member_attribute),
            });
        }

        attributes.remove_value(attribute, value);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

//! Name resolution
//!
//! Resolves organization and group names to paths. Organizations are looked
//! up at their top-level address first, then anywhere in the branch; the
//! subtree fallback returns the first match in pre-order. A name used by
//! more than one nested organization is therefore ambiguous.

use crate::directory::{KindFilter, SearchScope, SharedStore};
use crate::error::ServiceResult;
use crate::path::{Branch, EntryPath};
use tracing::{debug, trace};

/// Resolves names against the directory
#[derive(Clone)]
pub struct Lookup {
    store: SharedStore,
}

impl Lookup {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Path of the organization named `name` in `branch`
    pub async fn find_organization(
        &self,
        name: &str,
        branch: Branch,
    ) -> ServiceResult<Option<EntryPath>> {
        let root = EntryPath::branch_root(branch);
        let direct = root.organization(name)?;
        if self.store.entry_exists(&direct).await? {
            trace!(org = %direct, "Resolved organization at top level");
            return Ok(Some(direct));
        }

        let found = self
            .store
            .search(&root, SearchScope::Subtree, KindFilter::OrganizationalUnit)
            .await?
            .into_iter()
            .map(|entry| entry.path)
            .find(|path| path.is_organization() && path.name().is_ok_and(|n| n == name));

        debug!(name, %branch, found = found.is_some(), "Subtree organization lookup");
        Ok(found)
    }

    /// Path of group `name` directly inside organization `org_name`
    ///
    /// Groups are only looked up at their direct address.
    pub async fn find_group(
        &self,
        name: &str,
        org_name: &str,
        branch: Branch,
    ) -> ServiceResult<Option<EntryPath>> {
        let Some(org) = self.find_organization(org_name, branch).await? else {
            return Ok(None);
        };

        let group = org.group(name)?;
        if self.store.entry_exists(&group).await? {
            Ok(Some(group))
        } else {
            Ok(None)
        }
    }
}

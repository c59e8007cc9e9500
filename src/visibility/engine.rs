//! Visibility engine

use crate::access_control::{Capability, PermissionResolver};
use crate::directory::{DirectoryEntry, KindFilter, SearchScope, SharedStore};
use crate::error::{DirectoryError, ServiceError, ServiceResult};
use crate::lifecycle::Lookup;
use crate::path::{Branch, EntryPath, PathGrammar};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lists organizations and groups visible to a principal
pub struct VisibilityEngine {
    store: SharedStore,
    grammar: Arc<PathGrammar>,
    resolver: Arc<PermissionResolver>,
    lookup: Lookup,
}

impl VisibilityEngine {
    pub fn new(
        store: SharedStore,
        grammar: Arc<PathGrammar>,
        resolver: Arc<PermissionResolver>,
    ) -> Self {
        let lookup = Lookup::new(store.clone());
        Self {
            store,
            grammar,
            resolver,
            lookup,
        }
    }

    /// Organizations visible to `principal` in `branch`
    ///
    /// With a name filter the named organization comes first, followed by
    /// its sub-organizations. Without one, super administrators see every
    /// organization at the requested scope below the branch root and
    /// everyone else sees the organizations they administer directly,
    /// each followed by its sub-organizations. `nested` selects the full
    /// subtree instead of direct children.
    pub async fn list_organizations(
        &self,
        principal: &str,
        branch: Branch,
        name_filter: Option<&str>,
        nested: bool,
    ) -> ServiceResult<Vec<EntryPath>> {
        let super_admin = self.resolver.is_super_admin(principal, branch).await?;
        debug!(principal, %branch, super_admin, ?name_filter, nested, "Listing organizations");

        let mut listing = Listing::default();

        match (name_filter, super_admin) {
            (Some(name), true) => {
                let org = self.resolve(name, branch).await?;
                let children = self.sub_organizations(&org, nested).await?;
                listing.push(org);
                listing.extend(children);
            }
            (Some(name), false) => {
                let org = self.resolve(name, branch).await?;
                if self.can_view(principal, &org).await? {
                    listing.push(org.clone());
                }
                listing.extend(self.visible_children(principal, &org, nested).await?);
            }
            (None, true) => {
                let root = EntryPath::branch_root(branch);
                let scope = if nested {
                    SearchScope::Subtree
                } else {
                    SearchScope::OneLevel
                };
                listing.extend(self.organizations_below(&root, scope).await?);
            }
            (None, false) => {
                for anchor in self.organizations_administered(principal, branch).await? {
                    let children = self.visible_children(principal, &anchor, nested).await?;
                    listing.push(anchor);
                    listing.extend(children);
                }
            }
        }

        Ok(listing.into_inner())
    }

    /// Groups visible to `principal` in `branch`
    ///
    /// Administrator groups are never listed.
    pub async fn list_groups(&self, principal: &str, branch: Branch) -> ServiceResult<Vec<EntryPath>> {
        let groups = self.named_groups(branch).await?;

        if self.resolver.is_super_admin(principal, branch).await? {
            debug!(principal, %branch, "Listing all groups for super administrator");
            return Ok(groups
                .into_iter()
                .map(|entry| entry.path)
                .filter(|path| self.grammar.is_listable_group(path))
                .collect());
        }

        let administered_orgs = self.administered_from(
            &groups,
            principal,
            EntryPath::is_organization,
            self.grammar.domain_admin_name(),
        );
        let administered_groups = self.administered_from(
            &groups,
            principal,
            EntryPath::is_ordinary_group,
            self.grammar.group_admin_name(),
        );

        let mut listing = Listing::default();
        for org in &administered_orgs {
            listing.extend(
                groups
                    .iter()
                    .map(|entry| &entry.path)
                    .filter(|path| {
                        path.is_descendant_of(org) && self.grammar.is_listable_group(path)
                    })
                    .cloned(),
            );
        }
        listing.extend(
            administered_groups
                .into_iter()
                .filter(|path| self.grammar.is_listable_group(path)),
        );

        debug!(principal, %branch, count = listing.len(), "Listed groups");
        Ok(listing.into_inner())
    }

    /// Organizations whose domain administrator group lists `principal`
    ///
    /// A single branch-wide scan; inheritance is not applied.
    pub async fn organizations_administered(
        &self,
        principal: &str,
        branch: Branch,
    ) -> ServiceResult<Vec<EntryPath>> {
        let groups = self.named_groups(branch).await?;
        Ok(self.administered_from(
            &groups,
            principal,
            EntryPath::is_organization,
            self.grammar.domain_admin_name(),
        ))
    }

    /// Organizations below `org`, directly or (with `nested`) at any depth
    ///
    /// An organization whose groups container is missing has none.
    pub async fn sub_organizations(
        &self,
        org: &EntryPath,
        nested: bool,
    ) -> ServiceResult<Vec<EntryPath>> {
        let container = org.groups_container()?;
        let scope = if nested {
            SearchScope::Subtree
        } else {
            SearchScope::OneLevel
        };

        match self.organizations_below(&container, scope).await {
            Ok(orgs) => Ok(orgs),
            Err(ServiceError::NotFound { .. }) => {
                warn!(org = %self.grammar.render(org), "Organization has no groups container");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn organizations_below(
        &self,
        base: &EntryPath,
        scope: SearchScope,
    ) -> ServiceResult<Vec<EntryPath>> {
        Ok(self
            .store
            .search(base, scope, KindFilter::OrganizationalUnit)
            .await?
            .into_iter()
            .map(|entry| entry.path)
            .filter(EntryPath::is_organization)
            .collect())
    }

    async fn visible_children(
        &self,
        principal: &str,
        org: &EntryPath,
        nested: bool,
    ) -> ServiceResult<Vec<EntryPath>> {
        let children = self.sub_organizations(org, nested).await?;
        let decisions =
            try_join_all(children.iter().map(|child| self.can_view(principal, child))).await?;

        Ok(children
            .into_iter()
            .zip(decisions)
            .filter_map(|(child, visible)| visible.then_some(child))
            .collect())
    }

    async fn can_view(&self, principal: &str, org: &EntryPath) -> ServiceResult<bool> {
        Ok(self
            .resolver
            .check(principal, &Capability::ViewOrganization(org.clone()))
            .await?
            .is_allowed())
    }

    async fn resolve(&self, name: &str, branch: Branch) -> ServiceResult<EntryPath> {
        self.lookup
            .find_organization(name, branch)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("organization '{}'", name)))
    }

    async fn named_groups(&self, branch: Branch) -> ServiceResult<Vec<DirectoryEntry>> {
        let root = EntryPath::branch_root(branch);
        match self
            .store
            .search(&root, SearchScope::Subtree, KindFilter::NamedGroup)
            .await
        {
            Ok(entries) => Ok(entries),
            Err(DirectoryError::NoSuchEntry { path }) => {
                warn!(root = %path, "Branch root missing");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Owners of the administrator groups named `admin_name` listing `principal`
    fn administered_from(
        &self,
        groups: &[DirectoryEntry],
        principal: &str,
        owner_kind: impl Fn(&EntryPath) -> bool,
        admin_name: &str,
    ) -> Vec<EntryPath> {
        groups
            .iter()
            .filter(|entry| {
                entry.path.is_admin_group()
                    && entry.path.name().is_ok_and(|name| name == admin_name)
                    && self.resolver.lists_member(&entry.attributes, principal)
            })
            .filter_map(|entry| entry.path.parent())
            .filter(|owner| owner_kind(owner))
            .collect()
    }
}

/// Deduplicating accumulator that keeps discovery order
#[derive(Default)]
struct Listing {
    seen: HashSet<EntryPath>,
    paths: Vec<EntryPath>,
}

impl Listing {
    fn push(&mut self, path: EntryPath) {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    fn extend(&mut self, paths: impl IntoIterator<Item = EntryPath>) {
        for path in paths {
            self.push(path);
        }
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn into_inner(self) -> Vec<EntryPath> {
        self.paths
    }
}

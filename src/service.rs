//! Directory service façade
//!
//! The operations exposed to callers. Each one validates its arguments,
//! resolves names to paths, checks the caller's capability and then lists
//! or mutates. Errors are always typed [`ServiceError`]s.

use crate::access_control::{Capability, PermissionResolver};
use crate::directory::SharedStore;
use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle::{CreationStep, LifecycleManager, Lookup};
use crate::path::{Branch, EntryPath, PathGrammar};
use crate::visibility::VisibilityEngine;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// An organization as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub dn: String,
    pub name: String,
    pub branch: Branch,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_orgs: Vec<OrganizationSummary>,
}

impl OrganizationSummary {
    fn new(grammar: &PathGrammar, org: &EntryPath) -> ServiceResult<Self> {
        Ok(Self {
            dn: grammar.render(org),
            name: org.name()?.to_string(),
            branch: org.branch(),
            sub_orgs: Vec::new(),
        })
    }
}

/// A group as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub dn: String,
    pub name: String,
    pub org_dn: String,
    pub org_name: String,
    pub branch: Branch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

impl GroupSummary {
    fn new(grammar: &PathGrammar, group: &EntryPath) -> ServiceResult<Self> {
        let org = group.organization_of()?;
        Ok(Self {
            dn: grammar.render(group),
            name: group.name()?.to_string(),
            org_dn: grammar.render(&org),
            org_name: org.name()?.to_string(),
            branch: group.branch(),
            members: None,
        })
    }
}

/// Trimmed value of a required argument
fn required<'a>(value: &'a str, name: &str) -> ServiceResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::missing_argument(name));
    }
    Ok(value)
}

/// Request façade over the permission, listing and lifecycle components
pub struct DirectoryService {
    grammar: Arc<PathGrammar>,
    resolver: Arc<PermissionResolver>,
    visibility: VisibilityEngine,
    lifecycle: LifecycleManager,
    lookup: Lookup,
}

impl DirectoryService {
    pub fn new(store: SharedStore, grammar: Arc<PathGrammar>) -> Self {
        let resolver = Arc::new(PermissionResolver::new(store.clone(), grammar.clone()));
        Self {
            visibility: VisibilityEngine::new(store.clone(), grammar.clone(), resolver.clone()),
            lifecycle: LifecycleManager::new(store.clone(), grammar.clone()),
            lookup: Lookup::new(store),
            resolver,
            grammar,
        }
    }

    pub fn grammar(&self) -> &PathGrammar {
        &self.grammar
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn visibility(&self) -> &VisibilityEngine {
        &self.visibility
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    async fn organization(&self, branch: Branch, name: &str) -> ServiceResult<EntryPath> {
        let name = required(name, "orgName")?;
        self.lookup
            .find_organization(name, branch)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("organization '{}'", name)))
    }

    async fn group(&self, branch: Branch, org_name: &str, group_name: &str) -> ServiceResult<EntryPath> {
        let org_name = required(org_name, "orgName")?;
        let group_name = required(group_name, "groupName")?;
        self.lookup
            .find_group(group_name, org_name, branch)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("group '{}' in organization '{}'", group_name, org_name))
            })
    }

    /// Organizations visible to `principal`
    ///
    /// With `nested`, each organization also carries its direct
    /// sub-organizations.
    #[instrument(skip(self))]
    pub async fn list_organizations(
        &self,
        principal: &str,
        branch: Branch,
        name: Option<&str>,
        nested: bool,
    ) -> ServiceResult<Vec<OrganizationSummary>> {
        let principal = required(principal, "uid")?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let orgs = self
            .visibility
            .list_organizations(principal, branch, name, nested)
            .await?;

        let mut summaries = Vec::with_capacity(orgs.len());
        for org in &orgs {
            let mut summary = OrganizationSummary::new(&self.grammar, org)?;
            if nested {
                for sub in self.visibility.sub_organizations(org, false).await? {
                    summary
                        .sub_orgs
                        .push(OrganizationSummary::new(&self.grammar, &sub)?);
                }
            }
            summaries.push(summary);
        }
        debug!(count = summaries.len(), "Organizations listed");
        Ok(summaries)
    }

    /// Organizations `principal` administers directly
    pub async fn organizations_administered(
        &self,
        principal: &str,
        branch: Branch,
    ) -> ServiceResult<Vec<OrganizationSummary>> {
        let principal = required(principal, "uid")?;
        self.visibility
            .organizations_administered(principal, branch)
            .await?
            .iter()
            .map(|org| OrganizationSummary::new(&self.grammar, org))
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn create_organization(
        &self,
        principal: &str,
        branch: Branch,
        name: &str,
    ) -> ServiceResult<OrganizationSummary> {
        let principal = required(principal, "uid")?;
        let name = required(name, "orgName")?;
        self.resolver
            .require(principal, &Capability::CreateOrganization(branch))
            .await?;

        let org = self.lifecycle.create_organization(name, branch).await?;
        OrganizationSummary::new(&self.grammar, &org)
    }

    #[instrument(skip(self))]
    pub async fn create_sub_organization(
        &self,
        principal: &str,
        branch: Branch,
        parent_name: &str,
        name: &str,
    ) -> ServiceResult<OrganizationSummary> {
        let principal = required(principal, "uid")?;
        let name = required(name, "subOrgName")?;
        let parent = self.organization(branch, parent_name).await?;
        self.resolver
            .require(principal, &Capability::CreateSubOrganization(parent.clone()))
            .await?;

        let org = self.lifecycle.create_sub_organization(name, &parent).await?;
        OrganizationSummary::new(&self.grammar, &org)
    }

    #[instrument(skip(self))]
    pub async fn add_org_admin(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "adminUid")?;
        let org = self.organization(branch, org_name).await?;
        self.resolver
            .require(principal, &Capability::ManageOrganizationAdmins(org.clone()))
            .await?;
        self.lifecycle.add_org_admin(&org, uid).await
    }

    #[instrument(skip(self))]
    pub async fn remove_org_admin(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "adminUid")?;
        let org = self.organization(branch, org_name).await?;
        self.resolver
            .require(principal, &Capability::ManageOrganizationAdmins(org.clone()))
            .await?;
        self.lifecycle.remove_org_admin(&org, uid).await
    }

    /// Groups visible to `principal`
    #[instrument(skip(self))]
    pub async fn list_groups(
        &self,
        principal: &str,
        branch: Branch,
    ) -> ServiceResult<Vec<GroupSummary>> {
        let principal = required(principal, "uid")?;
        self.visibility
            .list_groups(principal, branch)
            .await?
            .iter()
            .map(|group| GroupSummary::new(&self.grammar, group))
            .collect()
    }

    /// Resolve a group by name inside an organization
    pub async fn find_group(
        &self,
        branch: Branch,
        org_name: &str,
        group_name: &str,
    ) -> ServiceResult<GroupSummary> {
        let group = self.group(branch, org_name, group_name).await?;
        GroupSummary::new(&self.grammar, &group)
    }

    #[instrument(skip(self))]
    pub async fn create_group(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
    ) -> ServiceResult<GroupSummary> {
        let principal = required(principal, "uid")?;
        let group_name = required(group_name, "groupName")?;
        let org = self.organization(branch, org_name).await?;
        self.resolver
            .require(principal, &Capability::CreateGroup(org.clone()))
            .await?;

        let group = self.lifecycle.create_group(group_name, &org).await?;
        GroupSummary::new(&self.grammar, &group)
    }

    #[instrument(skip(self))]
    pub async fn add_group_admin(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "adminUid")?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::ManageGroupAdmins(group.clone()))
            .await?;
        self.lifecycle.add_group_admin(&group, uid).await
    }

    #[instrument(skip(self))]
    pub async fn remove_group_admin(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "adminUid")?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::ManageGroupAdmins(group.clone()))
            .await?;
        self.lifecycle.remove_group_admin(&group, uid).await
    }

    #[instrument(skip(self))]
    pub async fn add_group_member(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "memberUid")?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::ManageGroupMembers(group.clone()))
            .await?;
        self.lifecycle.add_group_member(&group, uid).await
    }

    #[instrument(skip(self))]
    pub async fn remove_group_member(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
        uid: &str,
    ) -> ServiceResult<()> {
        let principal = required(principal, "uid")?;
        let uid = required(uid, "memberUid")?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::ManageGroupMembers(group.clone()))
            .await?;
        self.lifecycle.remove_group_member(&group, uid).await
    }

    /// A group together with its member uids
    ///
    /// Readable by anyone who may manage the group's administrators.
    #[instrument(skip(self))]
    pub async fn group_members(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
    ) -> ServiceResult<GroupSummary> {
        let principal = required(principal, "uid")?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::ManageGroupAdmins(group.clone()))
            .await?;

        let mut summary = GroupSummary::new(&self.grammar, &group)?;
        summary.members = Some(self.lifecycle.list_members(&group).await?);
        Ok(summary)
    }

    pub async fn organization_exists(&self, branch: Branch, name: &str) -> ServiceResult<bool> {
        let name = required(name, "orgName")?;
        Ok(self.lookup.find_organization(name, branch).await?.is_some())
    }

    pub async fn group_exists(
        &self,
        branch: Branch,
        org_name: &str,
        group_name: &str,
    ) -> ServiceResult<bool> {
        let org_name = required(org_name, "orgName")?;
        let group_name = required(group_name, "groupName")?;
        Ok(self
            .lookup
            .find_group(group_name, org_name, branch)
            .await?
            .is_some())
    }

    /// Create whatever co-created entries of an organization are missing
    #[instrument(skip(self))]
    pub async fn reconcile_organization(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
    ) -> ServiceResult<Vec<CreationStep>> {
        let principal = required(principal, "uid")?;
        let org = self.organization(branch, org_name).await?;
        self.resolver
            .require(principal, &Capability::ManageOrganizationAdmins(org.clone()))
            .await?;
        self.lifecycle.reconcile_organization(&org).await
    }

    /// Create a group's administrator subgroup if it is missing
    #[instrument(skip(self))]
    pub async fn reconcile_group(
        &self,
        principal: &str,
        branch: Branch,
        org_name: &str,
        group_name: &str,
    ) -> ServiceResult<Vec<CreationStep>> {
        let principal = required(principal, "uid")?;
        let org = self.organization(branch, org_name).await?;
        let group = self.group(branch, org_name, group_name).await?;
        self.resolver
            .require(principal, &Capability::CreateGroup(org))
            .await?;
        self.lifecycle.reconcile_group(&group).await
    }
}

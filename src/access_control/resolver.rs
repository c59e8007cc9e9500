//! Permission resolver
//!
//! Evaluates capabilities against group membership read from the directory.
//! Each capability is checked in this order:
//! 1. Branch super administrator (not honored for member management)
//! 2. Domain administrator of the organization or any enclosing organization
//! 3. Group administrator (group capabilities only)
//!
//! Every membership read is its own store round trip; nothing is cached.

use crate::access_control::types::{AccessDecision, Capability};
use crate::directory::{Attributes, SharedStore};
use crate::error::{PermissionDeniedError, ServiceError, ServiceResult};
use crate::path::{Branch, EntryPath, PathGrammar};
use std::sync::Arc;
use tracing::{debug, trace};

/// Permission resolver
pub struct PermissionResolver {
    store: SharedStore,
    grammar: Arc<PathGrammar>,
}

impl PermissionResolver {
    pub fn new(store: SharedStore, grammar: Arc<PathGrammar>) -> Self {
        Self { store, grammar }
    }

    /// Whether `principal` is referenced by a member value of `group`
    ///
    /// A group that does not exist has no members.
    pub async fn is_member(&self, principal: &str, group: &EntryPath) -> ServiceResult<bool> {
        let Some(attributes) = self.store.read_entry(group).await? else {
            trace!(group = %group, "Group does not exist, treating as no members");
            return Ok(false);
        };

        Ok(self.lists_member(&attributes, principal))
    }

    /// Whether the member values in `attributes` reference `principal`
    pub fn lists_member(&self, attributes: &Attributes, principal: &str) -> bool {
        attributes
            .values(&self.grammar.schema().member_attribute)
            .iter()
            .any(|value| self.grammar.member_uid(value) == Some(principal))
    }

    pub async fn is_super_admin(&self, principal: &str, branch: Branch) -> ServiceResult<bool> {
        let group = self.grammar.super_admin_group(branch)?;
        self.is_member(principal, &group).await
    }

    /// Member of the organization's own domain administrator group
    pub async fn is_org_admin_direct(
        &self,
        principal: &str,
        org: &EntryPath,
    ) -> ServiceResult<bool> {
        let group = self.grammar.domain_admin_group(org)?;
        self.is_member(principal, &group).await
    }

    /// Domain administrator of the organization or of any enclosing organization
    pub async fn is_org_admin_inherited(
        &self,
        principal: &str,
        org: &EntryPath,
    ) -> ServiceResult<bool> {
        if self.is_org_admin_direct(principal, org).await? {
            trace!(org = %org, "Direct domain administrator");
            return Ok(true);
        }

        for ancestor in org.organization_ancestors() {
            if self.is_org_admin_direct(principal, &ancestor).await? {
                trace!(org = %org, ancestor = %ancestor, "Inherited domain administrator");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Member of the group's own group administrator subgroup
    pub async fn is_group_admin_direct(
        &self,
        principal: &str,
        group: &EntryPath,
    ) -> ServiceResult<bool> {
        let admin_group = self.grammar.group_admin_group(group)?;
        self.is_member(principal, &admin_group).await
    }

    /// Check whether `principal` holds `capability`
    pub async fn check(
        &self,
        principal: &str,
        capability: &Capability,
    ) -> ServiceResult<AccessDecision> {
        debug!(
            principal = principal,
            capability = %capability,
            "Checking permission"
        );

        capability.validate()?;

        // 1. Super administrator, except for member management
        if !matches!(capability, Capability::ManageGroupMembers(_))
            && self.is_super_admin(principal, capability.branch()).await?
        {
            trace!("Matched super administrator");
            return Ok(AccessDecision::Allowed);
        }

        match capability {
            Capability::CreateOrganization(_) => Ok(AccessDecision::Denied(
                "only super administrators are permitted".to_string(),
            )),

            // 2. Domain administrator, inherited from any enclosing organization
            Capability::CreateSubOrganization(org)
            | Capability::ManageOrganizationAdmins(org)
            | Capability::ViewOrganization(org)
            | Capability::CreateGroup(org) => {
                if self.is_org_admin_inherited(principal, org).await? {
                    trace!("Matched domain administrator");
                    Ok(AccessDecision::Allowed)
                } else {
                    Ok(AccessDecision::Denied(format!(
                        "not an administrator of '{}' or any enclosing organization",
                        self.display_name(org)
                    )))
                }
            }

            // 3. Group capabilities
            Capability::ManageGroupAdmins(group) => {
                let org = group.organization_of()?;
                if self.is_org_admin_inherited(principal, &org).await? {
                    trace!("Matched domain administrator of owning organization");
                    return Ok(AccessDecision::Allowed);
                }
                if self.is_group_admin_direct(principal, group).await? {
                    trace!("Matched group administrator");
                    return Ok(AccessDecision::Allowed);
                }
                Ok(AccessDecision::Denied(format!(
                    "not an administrator of group '{}' or its organization",
                    self.display_name(group)
                )))
            }

            Capability::ManageGroupMembers(group) => {
                if self.is_group_admin_direct(principal, group).await? {
                    trace!("Matched group administrator");
                    Ok(AccessDecision::Allowed)
                } else {
                    Ok(AccessDecision::Denied(format!(
                        "not a group administrator of '{}'",
                        self.display_name(group)
                    )))
                }
            }
        }
    }

    /// Check a capability, returning an error if denied
    pub async fn require(&self, principal: &str, capability: &Capability) -> ServiceResult<()> {
        match self.check(principal, capability).await? {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => {
                debug!(principal = principal, capability = %capability, reason = %reason, "Permission denied");
                Err(ServiceError::PermissionDenied(PermissionDeniedError::new(
                    principal,
                    capability.action(),
                    reason,
                )))
            }
        }
    }

    fn display_name<'a>(&self, path: &'a EntryPath) -> &'a str {
        path.name().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoryConfig;
    use crate::directory::{DirectoryStore, InMemoryDirectory};

    struct Fixture {
        grammar: Arc<PathGrammar>,
        store: Arc<InMemoryDirectory>,
        resolver: PermissionResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let grammar = Arc::new(PathGrammar::new(&DirectoryConfig::default()).unwrap());
            let store = Arc::new(InMemoryDirectory::new(grammar.clone()));
            let resolver = PermissionResolver::new(store.clone(), grammar.clone());
            Self {
                grammar,
                store,
                resolver,
            }
        }

        async fn org(&self, path: &EntryPath) {
            let schema = self.grammar.schema();
            self.store
                .add_entry(path, Attributes::organizational_unit(schema, path.name().unwrap()))
                .await
                .unwrap();
            self.store
                .add_entry(
                    &path.groups_container().unwrap(),
                    Attributes::organizational_unit(schema, "groups"),
                )
                .await
                .unwrap();
            self.store
                .add_entry(
                    &self.grammar.domain_admin_group(path).unwrap(),
                    Attributes::named_group(schema, "DomainAdministrator"),
                )
                .await
                .unwrap();
        }

        async fn add_member(&self, group: &EntryPath, uid: &str) {
            let value = self.grammar.member_reference(group, uid).unwrap();
            self.store
                .add_attribute_value(group, "member", &value)
                .await
                .unwrap();
        }
    }

    fn acme() -> EntryPath {
        EntryPath::branch_root(Branch::Internal)
            .organization("Acme")
            .unwrap()
    }

    #[tokio::test]
    async fn test_super_admin_is_branch_scoped() {
        let fx = Fixture::new();
        let group = fx.grammar.super_admin_group(Branch::Internal).unwrap();
        fx.add_member(&group, "root").await;

        assert!(fx.resolver.is_super_admin("root", Branch::Internal).await.unwrap());
        assert!(!fx.resolver.is_super_admin("root", Branch::External).await.unwrap());

        let cap = Capability::CreateOrganization(Branch::Internal);
        assert!(fx.resolver.check("root", &cap).await.unwrap().is_allowed());
        assert!(fx.resolver.check("alice", &cap).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn test_missing_admin_group_is_not_membership() {
        let fx = Fixture::new();
        assert!(!fx.resolver.is_org_admin_direct("alice", &acme()).await.unwrap());
    }

    #[tokio::test]
    async fn test_require_returns_permission_denied() {
        let fx = Fixture::new();
        fx.org(&acme()).await;
        let err = fx
            .resolver
            .require("mallory", &Capability::CreateGroup(acme()))
            .await
            .unwrap_err();
        match err {
            ServiceError::PermissionDenied(denied) => {
                assert_eq!(denied.principal, "mallory");
                assert_eq!(denied.action, "create group");
                assert!(denied.reason.contains("Acme"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_target_kind_is_invalid_path() {
        let fx = Fixture::new();
        let err = fx
            .resolver
            .check("alice", &Capability::ViewOrganization(acme().groups_container().unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPath(_)));
    }
}

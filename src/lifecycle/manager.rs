//! Lifecycle manager

use super::CreationStep;
use crate::directory::{Attributes, SharedStore};
use crate::error::{PathError, ServiceError, ServiceResult};
use crate::path::{Branch, EntryPath, PathGrammar};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Creates organizations and groups and edits their member sets
pub struct LifecycleManager {
    store: SharedStore,
    grammar: Arc<PathGrammar>,
}

impl LifecycleManager {
    pub fn new(store: SharedStore, grammar: Arc<PathGrammar>) -> Self {
        Self { store, grammar }
    }

    /// Create a top-level organization
    #[instrument(skip(self))]
    pub async fn create_organization(&self, name: &str, branch: Branch) -> ServiceResult<EntryPath> {
        self.grammar.validate_name(name)?;
        let org = EntryPath::branch_root(branch).organization(name)?;
        self.create_organization_structure(&org).await?;
        Ok(org)
    }

    /// Create an organization inside `parent`'s groups container
    #[instrument(skip(self), fields(parent = %parent))]
    pub async fn create_sub_organization(
        &self,
        name: &str,
        parent: &EntryPath,
    ) -> ServiceResult<EntryPath> {
        self.grammar.validate_name(name)?;
        if !parent.is_organization() {
            return Err(ServiceError::InvalidArgument(format!(
                "'{}' is not an organization",
                parent
            )));
        }
        let org = parent.organization(name)?;
        self.create_organization_structure(&org).await?;
        Ok(org)
    }

    /// Entry, then groups container, then domain administrator group
    async fn create_organization_structure(&self, org: &EntryPath) -> ServiceResult<()> {
        let schema = self.grammar.schema();
        let name = org.name()?;

        self.store
            .add_entry(org, Attributes::organizational_unit(schema, name))
            .await?;

        self.create_groups_container(org)
            .await
            .map_err(|e| self.incomplete(org, CreationStep::GroupsContainer, e))?;

        self.create_domain_admin_group(org)
            .await
            .map_err(|e| self.incomplete(org, CreationStep::AdministratorGroup, e))?;

        info!(org = %self.grammar.render(org), "Organization created");
        Ok(())
    }

    async fn create_groups_container(&self, org: &EntryPath) -> ServiceResult<()> {
        let container = org.groups_container()?;
        let attributes = Attributes::organizational_unit(
            self.grammar.schema(),
            self.grammar.groups_container_name(),
        );
        Ok(self.store.add_entry(&container, attributes).await?)
    }

    async fn create_domain_admin_group(&self, org: &EntryPath) -> ServiceResult<()> {
        let admin_group = self.grammar.domain_admin_group(org)?;
        let attributes =
            Attributes::named_group(self.grammar.schema(), self.grammar.domain_admin_name());
        Ok(self.store.add_entry(&admin_group, attributes).await?)
    }

    async fn create_group_admin_group(&self, group: &EntryPath) -> ServiceResult<()> {
        let admin_group = self.grammar.group_admin_group(group)?;
        let attributes =
            Attributes::named_group(self.grammar.schema(), self.grammar.group_admin_name());
        Ok(self.store.add_entry(&admin_group, attributes).await?)
    }

    /// Create a group in `org`, then its group administrator subgroup
    ///
    /// The group starts with only the empty placeholder member, since a
    /// named group cannot be stored without one.
    #[instrument(skip(self), fields(org = %org))]
    pub async fn create_group(&self, name: &str, org: &EntryPath) -> ServiceResult<EntryPath> {
        self.grammar.validate_name(name)?;
        if !org.is_organization() {
            return Err(ServiceError::InvalidArgument(format!(
                "'{}' is not an organization",
                org
            )));
        }
        let group = org.group(name)?;

        self.store
            .add_entry(&group, Attributes::named_group(self.grammar.schema(), name))
            .await?;

        self.create_group_admin_group(&group)
            .await
            .map_err(|e| self.incomplete(&group, CreationStep::AdministratorGroup, e))?;

        info!(group = %self.grammar.render(&group), "Group created");
        Ok(group)
    }

    fn incomplete(&self, path: &EntryPath, step: CreationStep, source: ServiceError) -> ServiceError {
        let dn = self.grammar.render(path);
        warn!(path = %dn, step = %step, error = %source, "Creation stopped, structure is partial");
        ServiceError::Incomplete {
            path: dn,
            step,
            source: Box::new(source),
        }
    }

    /// Create whichever of an organization's groups container and domain
    /// administrator group are missing, returning the steps performed
    #[instrument(skip(self), fields(org = %org))]
    pub async fn reconcile_organization(&self, org: &EntryPath) -> ServiceResult<Vec<CreationStep>> {
        if !self.store.entry_exists(org).await? {
            return Err(ServiceError::not_found(self.grammar.render(org)));
        }

        let mut created = Vec::new();
        if !self.store.entry_exists(&org.groups_container()?).await? {
            self.create_groups_container(org).await?;
            created.push(CreationStep::GroupsContainer);
        }
        if !self
            .store
            .entry_exists(&self.grammar.domain_admin_group(org)?)
            .await?
        {
            self.create_domain_admin_group(org).await?;
            created.push(CreationStep::AdministratorGroup);
        }

        if !created.is_empty() {
            info!(org = %self.grammar.render(org), ?created, "Organization reconciled");
        }
        Ok(created)
    }

    /// Create a group's administrator subgroup if it is missing
    #[instrument(skip(self), fields(group = %group))]
    pub async fn reconcile_group(&self, group: &EntryPath) -> ServiceResult<Vec<CreationStep>> {
        if !self.store.entry_exists(group).await? {
            return Err(ServiceError::not_found(self.grammar.render(group)));
        }

        let mut created = Vec::new();
        if !self
            .store
            .entry_exists(&self.grammar.group_admin_group(group)?)
            .await?
        {
            self.create_group_admin_group(group).await?;
            created.push(CreationStep::AdministratorGroup);
        }

        if !created.is_empty() {
            info!(group = %self.grammar.render(group), "Group reconciled");
        }
        Ok(created)
    }

    pub async fn add_org_admin(&self, org: &EntryPath, uid: &str) -> ServiceResult<()> {
        let admin_group = self.grammar.domain_admin_group(org)?;
        self.add_member_value(&admin_group, uid).await
    }

    pub async fn remove_org_admin(&self, org: &EntryPath, uid: &str) -> ServiceResult<()> {
        let admin_group = self.grammar.domain_admin_group(org)?;
        self.remove_member_value(&admin_group, uid).await
    }

    pub async fn add_group_admin(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        let admin_group = self.grammar.group_admin_group(group)?;
        self.add_member_value(&admin_group, uid).await
    }

    pub async fn remove_group_admin(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        let admin_group = self.grammar.group_admin_group(group)?;
        self.remove_member_value(&admin_group, uid).await
    }

    pub async fn add_group_member(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        self.require_ordinary_group(group)?;
        self.add_member_value(group, uid).await
    }

    pub async fn remove_group_member(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        self.require_ordinary_group(group)?;
        self.remove_member_value(group, uid).await
    }

    /// Uids referenced by a group's member values, placeholder skipped
    pub async fn list_members(&self, group: &EntryPath) -> ServiceResult<Vec<String>> {
        let attributes = self
            .store
            .read_entry(group)
            .await?
            .ok_or_else(|| ServiceError::not_found(self.grammar.render(group)))?;

        Ok(attributes
            .values(&self.grammar.schema().member_attribute)
            .iter()
            .filter_map(|value| self.grammar.member_uid(value))
            .map(str::to_string)
            .collect())
    }

    fn require_ordinary_group(&self, group: &EntryPath) -> ServiceResult<()> {
        if group.is_ordinary_group() {
            Ok(())
        } else {
            Err(PathError::NotUnderGroupsContainer(group.to_string()).into())
        }
    }

    #[instrument(skip(self), fields(group = %group))]
    async fn add_member_value(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        self.grammar.validate_principal(uid)?;
        let value = self.grammar.member_reference(group, uid)?;
        self.store
            .add_attribute_value(group, &self.grammar.schema().member_attribute, &value)
            .await?;
        info!(group = %self.grammar.render(group), uid, "Member added");
        Ok(())
    }

    #[instrument(skip(self), fields(group = %group))]
    async fn remove_member_value(&self, group: &EntryPath, uid: &str) -> ServiceResult<()> {
        self.grammar.validate_principal(uid)?;
        let value = self.grammar.member_reference(group, uid)?;
        self.store
            .remove_attribute_value(group, &self.grammar.schema().member_attribute, &value)
            .await?;
        info!(group = %self.grammar.render(group), uid, "Member removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoryConfig;
    use crate::directory::{DirectoryStore, InMemoryDirectory};

    fn manager() -> (LifecycleManager, Arc<InMemoryDirectory>, Arc<PathGrammar>) {
        let grammar = Arc::new(PathGrammar::new(&DirectoryConfig::default()).unwrap());
        let store = Arc::new(InMemoryDirectory::new(grammar.clone()));
        (
            LifecycleManager::new(store.clone(), grammar.clone()),
            store,
            grammar,
        )
    }

    #[tokio::test]
    async fn test_create_organization_structure() {
        let (manager, store, grammar) = manager();
        let org = manager
            .create_organization("Acme", Branch::Internal)
            .await
            .unwrap();

        assert!(store.entry_exists(&org).await.unwrap());
        assert!(store.entry_exists(&org.groups_container().unwrap()).await.unwrap());
        assert!(store
            .entry_exists(&grammar.domain_admin_group(&org).unwrap())
            .await
            .unwrap());

        let err = manager
            .create_organization("Acme", Branch::Internal)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
        assert!(!err.is_partial());
    }

    #[tokio::test]
    async fn test_reserved_names_rejected() {
        let (manager, _, _) = manager();
        let err = manager
            .create_organization("GroupAdministrator", Branch::Internal)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_list_members_skips_placeholder() {
        let (manager, _, _) = manager();
        let org = manager
            .create_organization("Acme", Branch::Internal)
            .await
            .unwrap();
        let group = manager.create_group("eng", &org).await.unwrap();

        assert!(manager.list_members(&group).await.unwrap().is_empty());
        manager.add_group_member(&group, "alice").await.unwrap();
        assert_eq!(manager.list_members(&group).await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_reconcile_complete_structure_is_noop() {
        let (manager, _, _) = manager();
        let org = manager
            .create_organization("Acme", Branch::Internal)
            .await
            .unwrap();
        assert!(manager.reconcile_organization(&org).await.unwrap().is_empty());

        let missing = EntryPath::branch_root(Branch::Internal)
            .organization("Ghost")
            .unwrap();
        assert!(matches!(
            manager.reconcile_organization(&missing).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_member_management_on_admin_group_rejected() {
        let (manager, _, grammar) = manager();
        let org = manager
            .create_organization("Acme", Branch::Internal)
            .await
            .unwrap();
        let admin = grammar.domain_admin_group(&org).unwrap();
        assert!(matches!(
            manager.add_group_member(&admin, "alice").await,
            Err(ServiceError::InvalidPath(_))
        ));
    }
}

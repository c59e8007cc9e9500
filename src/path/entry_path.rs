//! Structured entry paths
//!
//! Components are kept root-first. Every constructor validates the grammar,
//! so an `EntryPath` value is always well-formed.

use super::component::{Branch, Component, ComponentKind};
use crate::error::{PathError, PathResult};
use std::fmt;

/// Grammatical position of the last component of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Slot {
    BranchRoot,
    Organization,
    GroupsContainer,
    /// Group directly under a groups container
    Group,
    /// Reserved administrator group under a branch root, organization or group
    AdminGroup,
    Principal,
}

impl Slot {
    const fn kind(self) -> ComponentKind {
        match self {
            Slot::BranchRoot => ComponentKind::Branch,
            Slot::Organization => ComponentKind::Organization,
            Slot::GroupsContainer => ComponentKind::GroupsContainer,
            Slot::Group | Slot::AdminGroup => ComponentKind::Group,
            Slot::Principal => ComponentKind::Principal,
        }
    }

    fn advance(self, next: &Component) -> PathResult<Slot> {
        if let Some(name) = next.name()
            && name.trim().is_empty()
        {
            return Err(PathError::InvalidName {
                name: name.to_string(),
                reason: "names must not be empty".to_string(),
            });
        }

        match (self, next) {
            (Slot::BranchRoot | Slot::GroupsContainer, Component::Organization(_)) => {
                Ok(Slot::Organization)
            }
            (Slot::Organization, Component::GroupsContainer) => Ok(Slot::GroupsContainer),
            (Slot::GroupsContainer, Component::Group(_)) => Ok(Slot::Group),
            (Slot::BranchRoot | Slot::Organization | Slot::Group, Component::Group(_)) => {
                Ok(Slot::AdminGroup)
            }
            (Slot::Group | Slot::AdminGroup, Component::Principal(_)) => Ok(Slot::Principal),
            (slot, component) => Err(PathError::UnexpectedComponent {
                kind: component.kind(),
                after: slot.kind(),
            }),
        }
    }
}

fn walk(components: &[Component]) -> PathResult<(Branch, Slot)> {
    let (first, rest) = components.split_first().ok_or(PathError::Empty)?;
    let Component::Branch(branch) = first else {
        return Err(PathError::MissingBranchRoot);
    };
    let slot = rest
        .iter()
        .try_fold(Slot::BranchRoot, |slot, component| slot.advance(component))?;
    Ok((*branch, slot))
}

/// Hierarchical identifier locating a node in the directory tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPath {
    components: Vec<Component>,
    branch: Branch,
    slot: Slot,
}

impl EntryPath {
    /// The root of a branch
    pub fn branch_root(branch: Branch) -> Self {
        Self {
            components: vec![Component::Branch(branch)],
            branch,
            slot: Slot::BranchRoot,
        }
    }

    /// Build a path from root-first components, validating the grammar
    pub fn from_components(components: Vec<Component>) -> PathResult<Self> {
        let (branch, slot) = walk(&components)?;
        Ok(Self {
            components,
            branch,
            slot,
        })
    }

    /// Root-first components, starting with the branch
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    /// Number of components, the branch root counting as one
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn kind(&self) -> ComponentKind {
        self.slot.kind()
    }

    pub fn leaf(&self) -> &Component {
        // A path always holds at least its branch component
        &self.components[self.components.len() - 1]
    }

    pub fn is_branch_root(&self) -> bool {
        self.slot == Slot::BranchRoot
    }

    pub fn is_organization(&self) -> bool {
        self.slot == Slot::Organization
    }

    pub fn is_groups_container(&self) -> bool {
        self.slot == Slot::GroupsContainer
    }

    /// A group directly under a groups container
    pub fn is_ordinary_group(&self) -> bool {
        self.slot == Slot::Group
    }

    /// A group in an administrator slot (under a branch root, organization or group)
    pub fn is_admin_group(&self) -> bool {
        self.slot == Slot::AdminGroup
    }

    pub fn is_principal(&self) -> bool {
        self.slot == Slot::Principal
    }

    /// Name of the leaf component
    pub fn name(&self) -> PathResult<&str> {
        self.leaf().name().ok_or(PathError::UnexpectedLeaf {
            expected: "named",
            found: self.kind(),
        })
    }

    /// Whether `self` lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &EntryPath) -> bool {
        self.components.len() > ancestor.components.len()
            && self.components.starts_with(&ancestor.components)
    }

    /// Whether `self` is `base` or lies below it
    pub fn is_within(&self, base: &EntryPath) -> bool {
        self == base || self.is_descendant_of(base)
    }

    /// The path with its leaf removed; `None` for a branch root
    pub fn parent(&self) -> Option<EntryPath> {
        self.prefix(self.components.len().checked_sub(1)?)
    }

    fn prefix(&self, len: usize) -> Option<EntryPath> {
        if len == 0 || len > self.components.len() {
            return None;
        }
        // Every prefix of a well-formed path is itself well-formed
        Self::from_components(self.components[..len].to_vec()).ok()
    }

    fn push(&self, component: Component) -> PathResult<EntryPath> {
        let slot = self.slot.advance(&component)?;
        let mut components = self.components.clone();
        components.push(component);
        Ok(Self {
            components,
            branch: self.branch,
            slot,
        })
    }

    /// Address of an organization named `name` under this branch root or organization
    ///
    /// Under an organization the new organization lives in its groups container.
    pub fn organization(&self, name: &str) -> PathResult<EntryPath> {
        match self.slot {
            Slot::BranchRoot | Slot::GroupsContainer => {
                self.push(Component::Organization(name.to_string()))
            }
            Slot::Organization => self
                .groups_container()?
                .push(Component::Organization(name.to_string())),
            _ => Err(PathError::UnexpectedLeaf {
                expected: "branch root or organization",
                found: self.kind(),
            }),
        }
    }

    /// Groups container of this organization
    pub fn groups_container(&self) -> PathResult<EntryPath> {
        match self.slot {
            Slot::Organization => self.push(Component::GroupsContainer),
            _ => Err(PathError::UnexpectedLeaf {
                expected: "organization",
                found: self.kind(),
            }),
        }
    }

    /// Address of group `name` inside this organization's groups container
    pub fn group(&self, name: &str) -> PathResult<EntryPath> {
        match self.slot {
            Slot::Organization => self
                .groups_container()?
                .push(Component::Group(name.to_string())),
            Slot::GroupsContainer => self.push(Component::Group(name.to_string())),
            _ => Err(PathError::UnexpectedLeaf {
                expected: "organization",
                found: self.kind(),
            }),
        }
    }

    /// Address of the reserved administrator group `reserved_name` attached to this node
    pub fn admin_group(&self, reserved_name: &str) -> PathResult<EntryPath> {
        match self.slot {
            Slot::BranchRoot | Slot::Organization | Slot::Group => {
                self.push(Component::Group(reserved_name.to_string()))
            }
            _ => Err(PathError::UnexpectedLeaf {
                expected: "branch root, organization or group",
                found: self.kind(),
            }),
        }
    }

    /// Reference to principal `uid` under this group
    pub fn principal(&self, uid: &str) -> PathResult<EntryPath> {
        self.push(Component::Principal(uid.to_string()))
    }

    /// Enclosing organization, skipping exactly one groups container
    ///
    /// Returns `None` once the enclosing scope is the branch root.
    pub fn parent_organization(&self) -> PathResult<Option<EntryPath>> {
        if self.slot != Slot::Organization {
            return Err(PathError::UnexpectedLeaf {
                expected: "organization",
                found: self.kind(),
            });
        }

        let len = self.components.len();
        match self.components.get(len - 2) {
            Some(Component::GroupsContainer) => Ok(self.prefix(len - 2)),
            _ => Ok(None),
        }
    }

    /// Organization owning this group
    pub fn organization_of(&self) -> PathResult<EntryPath> {
        if self.slot != Slot::Group {
            return Err(PathError::NotUnderGroupsContainer(self.to_string()));
        }
        self.prefix(self.components.len() - 2)
            .ok_or_else(|| PathError::NotUnderGroupsContainer(self.to_string()))
    }

    /// Every enclosing organization, nearest first, excluding `self`
    pub fn organization_ancestors(&self) -> OrganizationAncestors {
        OrganizationAncestors {
            next: self.parent_organization().ok().flatten(),
        }
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// Iterator over the organization ancestors of a path
///
/// Stops as soon as a parent computation fails to make progress, so a walk
/// always terminates.
#[derive(Debug, Clone)]
pub struct OrganizationAncestors {
    next: Option<EntryPath>,
}

impl Iterator for OrganizationAncestors {
    type Item = EntryPath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current
            .parent_organization()
            .ok()
            .flatten()
            .filter(|parent| parent != &current && parent.depth() < current.depth());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> EntryPath {
        EntryPath::branch_root(Branch::Internal)
            .organization("Acme")
            .unwrap()
    }

    #[test]
    fn test_top_level_organization() {
        let org = acme();
        assert!(org.is_organization());
        assert_eq!(org.depth(), 2);
        assert_eq!(org.name().unwrap(), "Acme");
        assert_eq!(org.parent_organization().unwrap(), None);
    }

    #[test]
    fn test_sub_organization_is_wrapped_by_container() {
        let sub = acme().organization("Labs").unwrap();
        assert_eq!(
            sub.components(),
            &[
                Component::Branch(Branch::Internal),
                Component::Organization("Acme".into()),
                Component::GroupsContainer,
                Component::Organization("Labs".into()),
            ]
        );
        assert_eq!(sub.parent_organization().unwrap(), Some(acme()));
    }

    #[test]
    fn test_organization_directly_under_organization_is_rejected() {
        let err = EntryPath::from_components(vec![
            Component::Branch(Branch::Internal),
            Component::Organization("Acme".into()),
            Component::Organization("Labs".into()),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            PathError::UnexpectedComponent {
                kind: ComponentKind::Organization,
                after: ComponentKind::Organization,
            }
        );
    }

    #[test]
    fn test_group_and_owner() {
        let group = acme().group("eng").unwrap();
        assert!(group.is_ordinary_group());
        assert_eq!(group.organization_of().unwrap(), acme());

        let admin = group.admin_group("GroupAdministrator").unwrap();
        assert!(admin.is_admin_group());
        assert!(admin.organization_of().is_err());
    }

    #[test]
    fn test_admin_group_cannot_nest() {
        let admin = acme().admin_group("DomainAdministrator").unwrap();
        assert!(admin.admin_group("Nested").is_err());
        assert!(admin.organization("x").is_err());
    }

    #[test]
    fn test_principal_is_leaf() {
        let member = acme().group("eng").unwrap().principal("alice").unwrap();
        assert!(member.is_principal());
        assert_eq!(member.name().unwrap(), "alice");
        assert!(member.principal("bob").is_err());
    }

    #[test]
    fn test_unnamed_leaf() {
        let container = acme().groups_container().unwrap();
        assert!(matches!(
            container.name(),
            Err(PathError::UnexpectedLeaf { .. })
        ));
        assert!(EntryPath::branch_root(Branch::External).name().is_err());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(matches!(
            EntryPath::branch_root(Branch::Internal).organization("  "),
            Err(PathError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_ancestors_walk_to_branch() {
        let deep = acme()
            .organization("a")
            .unwrap()
            .organization("b")
            .unwrap()
            .organization("c")
            .unwrap();
        let names: Vec<String> = deep
            .organization_ancestors()
            .map(|p| p.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a", "Acme"]);
    }

    #[test]
    fn test_parent_and_descendants() {
        let group = acme().group("eng").unwrap();
        assert!(group.is_descendant_of(&acme()));
        assert!(!acme().is_descendant_of(&acme()));
        assert!(acme().is_within(&acme()));
        assert_eq!(
            group.parent().unwrap(),
            acme().groups_container().unwrap()
        );
        assert_eq!(EntryPath::branch_root(Branch::Internal).parent(), None);
    }

    #[test]
    fn test_preorder_ordering() {
        let org = acme();
        let container = org.groups_container().unwrap();
        let sub = org.organization("Labs").unwrap();
        let admin = org.admin_group("DomainAdministrator").unwrap();
        assert!(org < container);
        assert!(container < sub);
        assert!(sub < admin);
    }

    #[test]
    fn test_display() {
        let group = acme().group("eng").unwrap();
        assert_eq!(group.to_string(), "cn=eng,ou=*,ou=Acme,branch=internal");
    }
}

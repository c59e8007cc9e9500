//! Path components
//!
//! The typed building blocks of an [`EntryPath`](super::EntryPath).

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level partition of the directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Internal,
    External,
}

impl Branch {
    /// Get the branch name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Branch::Internal => "internal",
            Branch::External => "external",
        }
    }

    /// Try to parse a branch name, ignoring ASCII case
    pub fn try_parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|branch| branch.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Get all branches
    pub const fn all() -> &'static [Branch] {
        &[Branch::Internal, Branch::External]
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Branch {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| PathError::InvalidBranch(s.to_string()))
    }
}

/// Kind of a path component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Branch,
    Organization,
    GroupsContainer,
    Group,
    Principal,
}

impl ComponentKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Branch => "branch",
            ComponentKind::Organization => "organization",
            ComponentKind::GroupsContainer => "groups container",
            ComponentKind::Group => "group",
            ComponentKind::Principal => "principal",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single typed path component
///
/// Variant order matters: it defines the sibling order of subtree walks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Branch(Branch),
    Organization(String),
    GroupsContainer,
    Group(String),
    Principal(String),
}

impl Component {
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Component::Branch(_) => ComponentKind::Branch,
            Component::Organization(_) => ComponentKind::Organization,
            Component::GroupsContainer => ComponentKind::GroupsContainer,
            Component::Group(_) => ComponentKind::Group,
            Component::Principal(_) => ComponentKind::Principal,
        }
    }

    /// The component's own name, for named kinds
    pub fn name(&self) -> Option<&str> {
        match self {
            Component::Organization(name) | Component::Group(name) | Component::Principal(name) => {
                Some(name)
            }
            Component::Branch(_) | Component::GroupsContainer => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Branch(branch) => write!(f, "branch={}", branch),
            Component::Organization(name) => write!(f, "ou={}", name),
            Component::GroupsContainer => write!(f, "ou=*"),
            Component::Group(name) => write!(f, "cn={}", name),
            Component::Principal(uid) => write!(f, "uid={}", uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_roundtrip() {
        for branch in Branch::all() {
            assert_eq!(Branch::try_parse(branch.as_str()), Some(*branch));
        }
    }

    #[test]
    fn test_branch_parse_ignores_case() {
        assert_eq!("INTERNAL".parse::<Branch>().unwrap(), Branch::Internal);
        assert_eq!("External".parse::<Branch>().unwrap(), Branch::External);
        assert!(matches!(
            "partners".parse::<Branch>(),
            Err(PathError::InvalidBranch(_))
        ));
    }

    #[test]
    fn test_component_names() {
        assert_eq!(Component::Organization("Acme".into()).name(), Some("Acme"));
        assert_eq!(Component::GroupsContainer.name(), None);
        assert_eq!(Component::Branch(Branch::Internal).name(), None);
        assert_eq!(Component::Group("eng".into()).kind(), ComponentKind::Group);
    }
}

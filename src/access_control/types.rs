//! Access control types
//!
//! Capabilities a principal can be granted, and the outcome of checking one.

use crate::error::{PathError, PathResult};
use crate::path::{Branch, EntryPath};
use std::fmt;

/// An action on a node of the tree that requires authorization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create a top-level organization in a branch
    CreateOrganization(Branch),
    /// Create an organization nested under the given one
    CreateSubOrganization(EntryPath),
    /// Add or remove domain administrators of an organization
    ManageOrganizationAdmins(EntryPath),
    ViewOrganization(EntryPath),
    /// Create a group in an organization
    CreateGroup(EntryPath),
    /// Add or remove group administrators, or list a group's members
    ManageGroupAdmins(EntryPath),
    /// Add or remove ordinary group members
    ManageGroupMembers(EntryPath),
}

impl Capability {
    /// Short description used in denial messages
    pub const fn action(&self) -> &'static str {
        match self {
            Capability::CreateOrganization(_) => "create organization",
            Capability::CreateSubOrganization(_) => "create sub-organization",
            Capability::ManageOrganizationAdmins(_) => "manage organization admins",
            Capability::ViewOrganization(_) => "view organization",
            Capability::CreateGroup(_) => "create group",
            Capability::ManageGroupAdmins(_) => "manage group admins",
            Capability::ManageGroupMembers(_) => "manage group members",
        }
    }

    pub fn branch(&self) -> Branch {
        match self {
            Capability::CreateOrganization(branch) => *branch,
            Capability::CreateSubOrganization(path)
            | Capability::ManageOrganizationAdmins(path)
            | Capability::ViewOrganization(path)
            | Capability::CreateGroup(path)
            | Capability::ManageGroupAdmins(path)
            | Capability::ManageGroupMembers(path) => path.branch(),
        }
    }

    /// The node the capability applies to; `None` for branch-wide capabilities
    pub fn target(&self) -> Option<&EntryPath> {
        match self {
            Capability::CreateOrganization(_) => None,
            Capability::CreateSubOrganization(path)
            | Capability::ManageOrganizationAdmins(path)
            | Capability::ViewOrganization(path)
            | Capability::CreateGroup(path)
            | Capability::ManageGroupAdmins(path)
            | Capability::ManageGroupMembers(path) => Some(path),
        }
    }

    /// Check that the target has the kind the capability expects
    pub fn validate(&self) -> PathResult<()> {
        match self {
            Capability::CreateOrganization(_) => Ok(()),
            Capability::CreateSubOrganization(path)
            | Capability::ManageOrganizationAdmins(path)
            | Capability::ViewOrganization(path)
            | Capability::CreateGroup(path) => {
                if path.is_organization() {
                    Ok(())
                } else {
                    Err(PathError::UnexpectedLeaf {
                        expected: "organization",
                        found: path.kind(),
                    })
                }
            }
            Capability::ManageGroupAdmins(path) | Capability::ManageGroupMembers(path) => {
                if path.is_ordinary_group() {
                    Ok(())
                } else {
                    Err(PathError::NotUnderGroupsContainer(path.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(path) => write!(f, "{} on {}", self.action(), path),
            None => write!(f, "{} in {}", self.action(), self.branch()),
        }
    }
}

/// Result of access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed,
    /// Access is denied with a reason
    Denied(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied(_))
    }
}

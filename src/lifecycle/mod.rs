//! Lifecycle management
//!
//! Creates the multi-entry structures behind organizations and groups and
//! mutates administrator and member sets. Creation is not transactional: a
//! step that fails leaves earlier steps in place and is reported as
//! [`ServiceError::Incomplete`](crate::error::ServiceError::Incomplete).
//! The reconcile operations create whatever is still missing.

pub mod lookup;
pub mod manager;

pub use lookup::Lookup;
pub use manager::LifecycleManager;

use std::fmt;

/// Step of a multi-entry creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationStep {
    /// The organization or group entry itself
    Entry,
    GroupsContainer,
    /// Domain administrator group of an organization, or group administrator subgroup
    AdministratorGroup,
}

impl CreationStep {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CreationStep::Entry => "entry",
            CreationStep::GroupsContainer => "groups container",
            CreationStep::AdministratorGroup => "administrator group",
        }
    }
}

impl fmt::Display for CreationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

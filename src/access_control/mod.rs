//! Access control module
//!
//! Derives what a principal may do from group membership in the tree.
//!
//! ## Authorization Model
//!
//! | Capability | Granted to |
//! |---|---|
//! | create organization | super administrators |
//! | create sub-organization, manage admins, view, create group | super administrators, domain administrators of the organization or any ancestor |
//! | manage group admins | the above for the owning organization, plus direct group administrators |
//! | manage group members | direct group administrators only |
//!
//! Super administrators are scoped to a branch. Domain administration is
//! inherited downwards; group administration is not.

pub mod resolver;
pub mod types;

pub use resolver::PermissionResolver;
pub use types::{AccessDecision, Capability};

//! Visibility and listing
//!
//! Computes which organizations and groups a principal may see. Visibility
//! of an organization is re-checked for every listed child rather than
//! assumed from the anchor it was found under.

pub mod engine;

pub use engine::VisibilityEngine;

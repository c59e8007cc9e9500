//! Path grammar
//!
//! Structured addressing for entries in the directory tree. An [`EntryPath`]
//! is an ordered sequence of typed components rooted at a branch:
//!
//! ```text
//! branch → organization → groups container → organization → ...
//!                       ↘ administrator group      ↘ group → administrator group
//! ```
//!
//! Paths are validated on construction; ill-formed sequences are rejected
//! with a [`PathError`](crate::error::PathError) instead of being guessed at.
//! [`PathGrammar`] carries the configured naming (branch root DNs, reserved
//! administrator names, schema attributes) and converts between paths and
//! distinguished-name strings.

pub mod component;
pub mod entry_path;
pub mod grammar;

pub use component::{Branch, Component, ComponentKind};
pub use entry_path::{EntryPath, OrganizationAncestors};
pub use grammar::{PathGrammar, Rdn};

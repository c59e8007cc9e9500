//! orgdir
//!
//! Organization and group administration over a hierarchical directory,
//! with permissions derived from administrator group membership.
//!
//! ## Tree Layout
//!
//! ```text
//! branch root (internal | external)
//! ├── cn=SuperAdministrators
//! └── ou=<org>
//!     ├── cn=DomainAdministrator
//!     └── ou=groups
//!         ├── ou=<sub-org>          (same shape, recursively)
//!         └── cn=<group>
//!             └── cn=GroupAdministrator
//! ```
//!
//! ## Permission Model
//!
//! - Super administrators of a branch may do anything in it except manage
//!   ordinary group members.
//! - Domain administrators of an organization administer it and every
//!   organization nested below it.
//! - Group administrators manage a group's administrators and members.
//!
//! ## Example Configuration
//!
//! ```toml
//! [directory]
//! base_dn = "o=sreemat"
//! seed_file = "~/.config/orgdir/seed.json"
//!
//! [directory.branches.external]
//! super_admin_group = "PartnerAdministrators"
//!
//! [server]
//! port = 8389
//! ```

pub mod access_control;
pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod path;
pub mod service;
pub mod visibility;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result, ServiceError, ServiceResult};
pub use path::{Branch, EntryPath, PathGrammar};
pub use service::DirectoryService;

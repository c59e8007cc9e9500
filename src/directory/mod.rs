//! Directory store abstraction
//!
//! The permission, listing and lifecycle components talk to the tree only
//! through [`DirectoryStore`]. [`InMemoryDirectory`] is the bundled
//! implementation, optionally populated from a JSON [`SeedFile`].

pub mod memory;
pub mod seed;
pub mod store;
pub mod types;

pub use memory::InMemoryDirectory;
pub use seed::{SeedEntry, SeedFile};
pub use store::{DirectoryStore, SharedStore};
pub use types::{Attributes, DirectoryEntry, KindFilter, SearchScope};

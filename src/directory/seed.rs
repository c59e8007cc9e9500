//! Seed files for the in-memory directory
//!
//! A seed is a JSON document listing entries by DN, optionally with their
//! members, plus the super administrators of each branch:
//!
//! ```json
//! {
//!   "super_admins": { "internal": ["root"] },
//!   "entries": [
//!     { "dn": "ou=Acme,ou=groups,ou=internal,o=sreemat" },
//!     { "dn": "cn=DomainAdministrator,ou=Acme,ou=groups,ou=internal,o=sreemat",
//!       "members": ["alice"] }
//!   ]
//! }
//! ```
//!
//! Entries without explicit attributes get the attributes of their kind.
//! Entries are applied parents first regardless of their order in the file.

use super::store::DirectoryStore;
use super::types::Attributes;
use crate::error::{ConfigError, DirectoryError};
use crate::path::{Branch, ComponentKind, EntryPath, PathGrammar};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// A single seeded entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub dn: String,

    /// Explicit attributes; derived from the entry kind when absent
    #[serde(default)]
    pub attributes: Option<BTreeMap<String, Vec<String>>>,

    /// Principal uids to add as members (groups only)
    #[serde(default)]
    pub members: Vec<String>,
}

/// Parsed seed document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub super_admins: HashMap<Branch, Vec<String>>,

    #[serde(default)]
    pub entries: Vec<SeedEntry>,
}

impl SeedFile {
    /// Read a seed file from disk
    pub fn load(path: &str) -> crate::Result<Self> {
        let expanded = shellexpand::tilde(path);
        let content = std::fs::read_to_string(Path::new(expanded.as_ref()))
            .map_err(|e| seed_error(path, e.to_string()))?;
        Self::from_json(path, &content)
    }

    /// Parse a seed document; `origin` names it in errors
    pub fn from_json(origin: &str, json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| seed_error(origin, e.to_string()).into())
    }

    /// Write the seed into a store, returning the number of entries added
    ///
    /// Entries that already exist are skipped.
    pub async fn apply(
        &self,
        store: &dyn DirectoryStore,
        grammar: &PathGrammar,
    ) -> crate::Result<usize> {
        let mut parsed = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let path = grammar.parse(&entry.dn)?;
            parsed.push((path, entry));
        }
        parsed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut added = 0;
        for (path, entry) in parsed {
            let attributes = match &entry.attributes {
                Some(map) => Attributes::from(map.clone()),
                None => default_attributes(grammar, &path)?,
            };

            match store.add_entry(&path, attributes).await {
                Ok(()) => added += 1,
                Err(DirectoryError::EntryAlreadyExists { path: dn }) => {
                    warn!(dn = %dn, "Seed entry already present, skipping");
                }
                Err(e) => return Err(e.into()),
            }

            for uid in &entry.members {
                add_member(store, grammar, &path, uid).await?;
            }
        }

        for (branch, uids) in &self.super_admins {
            let group = grammar.super_admin_group(*branch)?;
            for uid in uids {
                add_member(store, grammar, &group, uid).await?;
            }
        }

        info!(added, "Directory seeded");
        Ok(added)
    }
}

fn seed_error(path: &str, reason: String) -> ConfigError {
    ConfigError::Seed {
        path: path.to_string(),
        reason,
    }
}

fn default_attributes(grammar: &PathGrammar, path: &EntryPath) -> crate::Result<Attributes> {
    let schema = grammar.schema();
    match path.kind() {
        ComponentKind::Organization => Ok(Attributes::organizational_unit(schema, path.name()?)),
        ComponentKind::GroupsContainer => Ok(Attributes::organizational_unit(
            schema,
            grammar.groups_container_name(),
        )),
        ComponentKind::Group => Ok(Attributes::named_group(schema, path.name()?)),
        ComponentKind::Branch | ComponentKind::Principal => Err(seed_error(
            "<seed>",
            format!("'{}' cannot be seeded as an entry", grammar.render(path)),
        )
        .into()),
    }
}

async fn add_member(
    store: &dyn DirectoryStore,
    grammar: &PathGrammar,
    group: &EntryPath,
    uid: &str,
) -> crate::Result<()> {
    grammar.validate_principal(uid)?;
    let value = grammar.member_reference(group, uid)?;
    match store
        .add_attribute_value(group, &grammar.schema().member_attribute, &value)
        .await
    {
        Ok(()) | Err(DirectoryError::ValueAlreadyPresent { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

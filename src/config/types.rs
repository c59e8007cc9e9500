//! Configuration types for orgdir
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::path::Branch;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory layout and schema
    pub directory: DirectoryConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Directory layout configuration
///
/// Everything the grammar, permission engine and lifecycle manager need to
/// know about the tree: branch roots, reserved names and schema identifiers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base DN of the tree (e.g., `o=sreemat`)
    pub base_dn: String,

    /// Per-branch settings
    pub branches: BranchesConfig,

    /// Name of the container entry holding an organization's groups
    pub groups_container: String,

    /// Reserved name of an organization's administrator group
    pub domain_admin_name: String,

    /// Reserved name of a group's administrator subgroup
    pub group_admin_name: String,

    /// Regex that organization and group names must match
    pub name_pattern: String,

    /// Schema identifiers
    pub schema: SchemaConfig,

    /// JSON file used to seed the in-memory directory
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_dn: "o=sreemat".to_string(),
            branches: BranchesConfig::default(),
            groups_container: "groups".to_string(),
            domain_admin_name: "DomainAdministrator".to_string(),
            group_admin_name: "GroupAdministrator".to_string(),
            name_pattern: r"^[A-Za-z0-9][A-Za-z0-9 _.\-]*$".to_string(),
            schema: SchemaConfig::default(),
            seed_file: None,
        }
    }
}

impl DirectoryConfig {
    /// Settings of a branch
    pub fn branch(&self, branch: Branch) -> &BranchConfig {
        match branch {
            Branch::Internal => &self.branches.internal,
            Branch::External => &self.branches.external,
        }
    }

    /// Root DN of a branch, derived from the base DN unless configured
    pub fn branch_root_dn(&self, branch: Branch) -> String {
        match &self.branch(branch).root {
            Some(root) => root.clone(),
            None => format!(
                "{ou}={},{ou}={},{}",
                self.groups_container,
                branch,
                self.base_dn,
                ou = self.schema.ou_attribute
            ),
        }
    }
}

/// Settings of both branches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BranchesConfig {
    pub internal: BranchConfig,
    pub external: BranchConfig,
}

/// Settings of a single branch
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Explicit root DN (default: `ou=<groups>,ou=<branch>,<base_dn>`)
    #[serde(default)]
    pub root: Option<String>,

    /// Name of the branch's super administrator group
    pub super_admin_group: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            root: None,
            super_admin_group: "SuperAdministrators".to_string(),
        }
    }
}

/// Schema identifiers used by the store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub object_class_attribute: String,
    pub organizational_unit_class: String,
    pub named_group_class: String,
    pub ou_attribute: String,
    pub cn_attribute: String,
    pub member_attribute: String,
    pub principal_attribute: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            object_class_attribute: "objectClass".to_string(),
            organizational_unit_class: "organizationalUnit".to_string(),
            named_group_class: "groupOfNames".to_string(),
            ou_attribute: "ou".to_string(),
            cn_attribute: "cn".to_string(),
            member_attribute: "member".to_string(),
            principal_attribute: "uid".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Name of the request header carrying the principal uid
    pub principal_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8389,
            principal_header: "uid".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

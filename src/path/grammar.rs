//! Configured path grammar
//!
//! Converts between [`EntryPath`] values and distinguished-name strings, and
//! knows the reserved names of the configured directory layout.

use super::component::{Branch, Component};
use super::entry_path::EntryPath;
use crate::config::{DirectoryConfig, SchemaConfig};
use crate::error::{ConfigError, PathError, PathResult};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Characters with special meaning inside a distinguished name
const DN_SPECIAL_CHARS: &[char] = &[',', '=', '+', '<', '>', '#', ';', '"', '\\'];

/// Longest accepted organization, group or principal name
const MAX_NAME_LEN: usize = 64;

/// A single `attribute=value` pair of a distinguished name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    pub attribute: String,
    pub value: String,
}

impl Rdn {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Parse `attribute=value`; `None` if either side is empty
    pub fn parse(s: &str) -> Option<Self> {
        let (attribute, value) = s.split_once('=')?;
        let (attribute, value) = (attribute.trim(), value.trim());
        if attribute.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self::new(attribute, value))
    }

    fn matches(&self, other: &Rdn) -> bool {
        self.attribute.eq_ignore_ascii_case(&other.attribute)
            && self.value.eq_ignore_ascii_case(&other.value)
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.value)
    }
}

/// Split a DN into its RDNs, leaf first
fn split_dn(dn: &str) -> PathResult<Vec<Rdn>> {
    if dn.contains(['\\', '+']) {
        return Err(PathError::MalformedDn {
            dn: dn.to_string(),
            reason: "escaped and multi-valued RDNs are not supported".to_string(),
        });
    }

    dn.split(',')
        .map(|part| {
            Rdn::parse(part).ok_or_else(|| PathError::MalformedDn {
                dn: dn.to_string(),
                reason: format!("'{}' is not an attribute=value pair", part.trim()),
            })
        })
        .collect()
}

/// Path grammar bound to a directory layout
#[derive(Debug)]
pub struct PathGrammar {
    /// Branch roots as leaf-first RDNs, longest first
    roots: Vec<(Branch, Vec<Rdn>)>,
    root_dns: HashMap<Branch, String>,
    super_admin_names: HashMap<Branch, String>,
    container_name: String,
    domain_admin_name: String,
    group_admin_name: String,
    schema: SchemaConfig,
    name_pattern: Regex,
}

impl PathGrammar {
    /// Create a grammar from the directory configuration
    pub fn new(config: &DirectoryConfig) -> Result<Self, ConfigError> {
        let name_pattern =
            Regex::new(&config.name_pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: config.name_pattern.clone(),
                reason: e.to_string(),
            })?;

        let mut roots = Vec::new();
        let mut root_dns = HashMap::new();
        let mut super_admin_names = HashMap::new();
        for branch in Branch::all() {
            let dn = config.branch_root_dn(*branch);
            let rdns = split_dn(&dn).map_err(|e| ConfigError::Invalid {
                message: format!("branch root for '{}': {}", branch, e),
            })?;
            roots.push((*branch, rdns));
            root_dns.insert(*branch, dn);
            super_admin_names.insert(*branch, config.branch(*branch).super_admin_group.clone());
        }
        roots.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        Ok(Self {
            roots,
            root_dns,
            super_admin_names,
            container_name: config.groups_container.clone(),
            domain_admin_name: config.domain_admin_name.clone(),
            group_admin_name: config.group_admin_name.clone(),
            schema: config.schema.clone(),
            name_pattern,
        })
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    pub fn groups_container_name(&self) -> &str {
        &self.container_name
    }

    pub fn domain_admin_name(&self) -> &str {
        &self.domain_admin_name
    }

    pub fn group_admin_name(&self) -> &str {
        &self.group_admin_name
    }

    pub fn super_admin_name(&self, branch: Branch) -> &str {
        self.super_admin_names
            .get(&branch)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn branch_root_dn(&self, branch: Branch) -> &str {
        self.root_dns
            .get(&branch)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Domain administrator group of an organization
    pub fn domain_admin_group(&self, org: &EntryPath) -> PathResult<EntryPath> {
        if !org.is_organization() {
            return Err(PathError::UnexpectedLeaf {
                expected: "organization",
                found: org.kind(),
            });
        }
        org.admin_group(&self.domain_admin_name)
    }

    /// Group administrator subgroup of a group
    pub fn group_admin_group(&self, group: &EntryPath) -> PathResult<EntryPath> {
        if !group.is_ordinary_group() {
            return Err(PathError::NotUnderGroupsContainer(group.to_string()));
        }
        group.admin_group(&self.group_admin_name)
    }

    /// Super administrator group of a branch
    pub fn super_admin_group(&self, branch: Branch) -> PathResult<EntryPath> {
        EntryPath::branch_root(branch).admin_group(self.super_admin_name(branch))
    }

    /// Whether `name` is one of the reserved administrator group names
    pub fn is_reserved_name(&self, name: &str) -> bool {
        name == self.domain_admin_name
            || name == self.group_admin_name
            || self.super_admin_names.values().any(|n| n == name)
    }

    /// Whether a group may appear in listings: an ordinary group with a non-reserved name
    pub fn is_listable_group(&self, path: &EntryPath) -> bool {
        path.is_ordinary_group() && path.name().is_ok_and(|name| !self.is_reserved_name(name))
    }

    /// Check an organization or group name chosen by a caller
    pub fn validate_name(&self, name: &str) -> PathResult<()> {
        let invalid = |reason: &str| PathError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("names must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(invalid("name is too long"));
        }
        if name.contains(DN_SPECIAL_CHARS) {
            return Err(invalid("name contains a reserved character"));
        }
        if self.is_reserved_name(name) {
            return Err(invalid("name is reserved for administrator groups"));
        }
        if name.eq_ignore_ascii_case(&self.container_name) {
            return Err(invalid("name is reserved for groups containers"));
        }
        if !self.name_pattern.is_match(name) {
            return Err(invalid("name does not match the configured pattern"));
        }
        Ok(())
    }

    /// Check a principal uid
    ///
    /// Member references are read back trimmed, so a uid with surrounding
    /// whitespace would alias the bare uid and is rejected.
    pub fn validate_principal(&self, uid: &str) -> PathResult<()> {
        let invalid = |reason: &str| PathError::InvalidName {
            name: uid.to_string(),
            reason: reason.to_string(),
        };

        if uid.trim().is_empty() || uid.contains(DN_SPECIAL_CHARS) {
            return Err(invalid("not a valid principal uid"));
        }
        if uid != uid.trim() {
            return Err(invalid("principal uid has surrounding whitespace"));
        }
        Ok(())
    }

    fn component_rdn(&self, component: &Component) -> Option<Rdn> {
        match component {
            Component::Branch(_) => None,
            Component::Organization(name) => Some(Rdn::new(&self.schema.ou_attribute, name)),
            Component::GroupsContainer => {
                Some(Rdn::new(&self.schema.ou_attribute, &self.container_name))
            }
            Component::Group(name) => Some(Rdn::new(&self.schema.cn_attribute, name)),
            Component::Principal(uid) => {
                Some(Rdn::new(&self.schema.principal_attribute, uid))
            }
        }
    }

    /// Render a path as a distinguished name
    pub fn render(&self, path: &EntryPath) -> String {
        let mut parts: Vec<String> = path
            .components()
            .iter()
            .rev()
            .filter_map(|c| self.component_rdn(c))
            .map(|rdn| rdn.to_string())
            .collect();
        parts.push(self.branch_root_dn(path.branch()).to_string());
        parts.join(",")
    }

    /// Parse a distinguished name into a validated path
    pub fn parse(&self, dn: &str) -> PathResult<EntryPath> {
        let rdns = split_dn(dn)?;

        let (branch, relative) = self
            .roots
            .iter()
            .find_map(|(branch, root)| {
                let split = rdns.len().checked_sub(root.len())?;
                let (relative, suffix) = rdns.split_at(split);
                suffix
                    .iter()
                    .zip(root)
                    .all(|(a, b)| a.matches(b))
                    .then_some((*branch, relative))
            })
            .ok_or_else(|| PathError::OutsideBranches(dn.to_string()))?;

        let mut components = Vec::with_capacity(relative.len() + 1);
        components.push(Component::Branch(branch));
        for rdn in relative.iter().rev() {
            components.push(self.rdn_component(dn, rdn)?);
        }

        EntryPath::from_components(components)
    }

    fn rdn_component(&self, dn: &str, rdn: &Rdn) -> PathResult<Component> {
        let attribute = rdn.attribute.as_str();
        if attribute.eq_ignore_ascii_case(&self.schema.ou_attribute) {
            if rdn.value.eq_ignore_ascii_case(&self.container_name) {
                Ok(Component::GroupsContainer)
            } else {
                Ok(Component::Organization(rdn.value.clone()))
            }
        } else if attribute.eq_ignore_ascii_case(&self.schema.cn_attribute) {
            Ok(Component::Group(rdn.value.clone()))
        } else if attribute.eq_ignore_ascii_case(&self.schema.principal_attribute) {
            Ok(Component::Principal(rdn.value.clone()))
        } else {
            Err(PathError::MalformedDn {
                dn: dn.to_string(),
                reason: format!("unsupported attribute '{}'", rdn.attribute),
            })
        }
    }

    /// Member attribute value referencing `uid` from `group`
    pub fn member_reference(&self, group: &EntryPath, uid: &str) -> PathResult<String> {
        Ok(self.render(&group.principal(uid)?))
    }

    /// Principal uid referenced by a member attribute value
    ///
    /// Only the leading RDN is inspected, so references rendered under any
    /// base are recognised. Placeholder and foreign values yield `None`.
    pub fn member_uid<'a>(&self, value: &'a str) -> Option<&'a str> {
        let leading = value.split(',').next()?;
        let (attribute, uid) = leading.split_once('=')?;
        let uid = uid.trim();
        (attribute
            .trim()
            .eq_ignore_ascii_case(&self.schema.principal_attribute)
            && !uid.is_empty())
        .then_some(uid)
    }
}

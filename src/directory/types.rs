//! Directory entry types

use crate::config::SchemaConfig;
use crate::path::EntryPath;
use serde::Serialize;
use std::collections::BTreeMap;

/// How far below the base a search reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// The base entry only
    Base,
    /// Direct children of the base, excluding the base
    OneLevel,
    /// The base and everything below it
    Subtree,
}

/// Entry kinds a search can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFilter {
    /// Entries of the configured organizational unit class
    OrganizationalUnit,
    /// Entries of the configured named group class
    NamedGroup,
    Any,
}

impl KindFilter {
    /// Whether an entry's attributes satisfy the filter
    pub fn matches(&self, attributes: &Attributes, schema: &SchemaConfig) -> bool {
        let class = match self {
            KindFilter::OrganizationalUnit => &schema.organizational_unit_class,
            KindFilter::NamedGroup => &schema.named_group_class,
            KindFilter::Any => return true,
        };
        attributes
            .values(&schema.object_class_attribute)
            .iter()
            .any(|value| value.eq_ignore_ascii_case(class))
    }
}

/// Multi-valued attributes of an entry
///
/// Attribute names are case-insensitive and stored lowercased. Values keep
/// insertion order but never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Vec<String>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, attribute: &str, value: impl Into<String>) -> Self {
        self.insert_value(attribute, value);
        self
    }

    /// Attributes of an organizational unit named `name`
    pub fn organizational_unit(schema: &SchemaConfig, name: &str) -> Self {
        Self::new()
            .with(&schema.object_class_attribute, "top")
            .with(
                &schema.object_class_attribute,
                &schema.organizational_unit_class,
            )
            .with(&schema.ou_attribute, name)
    }

    /// Attributes of a named group `name` holding only the empty placeholder member
    pub fn named_group(schema: &SchemaConfig, name: &str) -> Self {
        Self::new()
            .with(&schema.object_class_attribute, "top")
            .with(&schema.object_class_attribute, &schema.named_group_class)
            .with(&schema.cn_attribute, name)
            .with(&schema.member_attribute, "")
    }

    pub fn values(&self, attribute: &str) -> &[String] {
        self.0
            .get(&attribute.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute).first().map(String::as_str)
    }

    pub fn contains_value(&self, attribute: &str, value: &str) -> bool {
        self.values(attribute).iter().any(|v| v == value)
    }

    /// Add a value; `false` if it was already present
    pub fn insert_value(&mut self, attribute: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let values = self.0.entry(attribute.to_ascii_lowercase()).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Remove a value; `false` if it was not present
    pub fn remove_value(&mut self, attribute: &str, value: &str) -> bool {
        let key = attribute.to_ascii_lowercase();
        let Some(values) = self.0.get_mut(&key) else {
            return false;
        };
        let Some(index) = values.iter().position(|v| v == value) else {
            return false;
        };
        values.remove(index);
        if values.is_empty() {
            self.0.remove(&key);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Vec<String>>> for Attributes {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut attributes = Attributes::new();
        for (attribute, values) in map {
            for value in values {
                attributes.insert_value(&attribute, value);
            }
        }
        attributes
    }
}

/// An entry returned by a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: EntryPath,
    pub attributes: Attributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_case_insensitive() {
        let attrs = Attributes::new().with("objectClass", "groupOfNames");
        assert_eq!(attrs.values("OBJECTCLASS"), &["groupOfNames".to_string()]);
        assert_eq!(attrs.first("objectclass"), Some("groupOfNames"));
        assert!(attrs.values("member").is_empty());
    }

    #[test]
    fn test_values_do_not_repeat() {
        let mut attrs = Attributes::new();
        assert!(attrs.insert_value("member", "uid=alice"));
        assert!(!attrs.insert_value("member", "uid=alice"));
        assert_eq!(attrs.values("member").len(), 1);

        assert!(attrs.remove_value("member", "uid=alice"));
        assert!(!attrs.remove_value("member", "uid=alice"));
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_kind_filter() {
        let schema = SchemaConfig::default();
        let ou = Attributes::organizational_unit(&schema, "Acme");
        let group = Attributes::named_group(&schema, "eng");

        assert!(KindFilter::OrganizationalUnit.matches(&ou, &schema));
        assert!(!KindFilter::NamedGroup.matches(&ou, &schema));
        assert!(KindFilter::NamedGroup.matches(&group, &schema));
        assert!(KindFilter::Any.matches(&group, &schema));
        assert!(group.contains_value("member", ""));
    }
}

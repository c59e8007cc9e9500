//! Configuration and seed loading tests

use orgdir::config::{LogFormat, load_config, load_config_from_str};
use orgdir::directory::{DirectoryStore, InMemoryDirectory, SeedFile};
use orgdir::error::{AppError, ConfigError};
use orgdir::path::{Branch, PathGrammar};
use std::sync::Arc;

const FULL_CONFIG: &str = r#"
[directory]
base_dn = "dc=example,dc=org"
groups_container = "teams"
domain_admin_name = "OrgAdmins"
group_admin_name = "TeamAdmins"
name_pattern = "^[a-z][a-z0-9-]*$"

[directory.branches.external]
root = "ou=partners,dc=example,dc=org"
super_admin_group = "PartnerAdmins"

[directory.schema]
named_group_class = "groupOfUniqueNames"
member_attribute = "uniqueMember"

[server]
host = "0.0.0.0"
port = 9000
principal_header = "X-Remote-User"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.directory.base_dn, "o=sreemat");
    assert_eq!(config.directory.domain_admin_name, "DomainAdministrator");
    assert_eq!(config.directory.group_admin_name, "GroupAdministrator");
    assert_eq!(
        config.directory.branch(Branch::External).super_admin_group,
        "SuperAdministrators"
    );
    assert_eq!(config.server.principal_header, "uid");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.directory.groups_container, "teams");
    assert_eq!(
        config.directory.branch_root_dn(Branch::Internal),
        "ou=teams,ou=internal,dc=example,dc=org"
    );
    assert_eq!(
        config.directory.branch_root_dn(Branch::External),
        "ou=partners,dc=example,dc=org"
    );
    assert_eq!(config.directory.schema.member_attribute, "uniqueMember");
    // unspecified schema fields keep their defaults
    assert_eq!(config.directory.schema.cn_attribute, "cn");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.principal_header, "X-Remote-User");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_name_pattern_applies_to_grammar() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();
    let grammar = PathGrammar::new(&config.directory).unwrap();

    assert!(grammar.validate_name("platform-team").is_ok());
    assert!(grammar.validate_name("Platform").is_err());
    assert!(grammar.is_reserved_name("PartnerAdmins"));
}

#[test]
fn test_super_admin_group_collision() {
    let toml = r#"
[directory]
domain_admin_name = "Admins"

[directory.branches.internal]
super_admin_group = "Admins"
"#;

    let err = load_config_from_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn test_invalid_port() {
    let toml = r#"
[server]
port = 0
"#;

    assert!(matches!(
        load_config_from_str(toml),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_empty_principal_header() {
    let toml = r#"
[server]
principal_header = " "
"#;

    assert!(matches!(
        load_config_from_str(toml),
        Err(ConfigError::Missing { .. })
    ));
}

#[test]
fn test_unknown_log_format() {
    let toml = r#"
[logging]
format = "xml"
"#;

    assert!(matches!(
        load_config_from_str(toml),
        Err(ConfigError::Load(_))
    ));
}

#[test]
#[serial_test::serial]
fn test_load_from_file() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("orgdir.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.directory.base_dn, "dc=example,dc=org");
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
#[serial_test::serial]
fn test_env_overrides_file() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("orgdir.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    unsafe {
        env::set_var("ORGDIR__SERVER__PORT", "9100");
        env::set_var("ORGDIR__DIRECTORY__BASE_DN", "dc=override,dc=org");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    // Cleanup before asserting so a failure does not leak into other tests
    unsafe {
        env::remove_var("ORGDIR__SERVER__PORT");
        env::remove_var("ORGDIR__DIRECTORY__BASE_DN");
    }

    let config = config.unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.directory.base_dn, "dc=override,dc=org");
    // file values not overridden stay in place
    assert_eq!(config.directory.groups_container, "teams");
}

// =============================================================================
// Seed files
// =============================================================================

const SEED: &str = r#"
{
  "super_admins": { "internal": ["root"] },
  "entries": [
    { "dn": "cn=DomainAdministrator,ou=Acme,ou=groups,ou=internal,o=sreemat",
      "members": ["alice"] },
    { "dn": "ou=groups,ou=Acme,ou=groups,ou=internal,o=sreemat" },
    { "dn": "ou=Acme,ou=groups,ou=internal,o=sreemat" },
    { "dn": "cn=eng,ou=groups,ou=Acme,ou=groups,ou=internal,o=sreemat",
      "members": ["bob", "carol"] }
  ]
}
"#;

#[tokio::test]
#[serial_test::serial]
async fn test_seed_file_from_disk() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    fs::write(&seed_path, SEED).unwrap();

    let seed = SeedFile::load(seed_path.to_str().unwrap()).unwrap();
    assert_eq!(seed.entries.len(), 4);

    let config = load_config_from_str("").unwrap();
    let grammar = Arc::new(PathGrammar::new(&config.directory).unwrap());
    let store = InMemoryDirectory::new(grammar.clone());

    assert_eq!(seed.apply(&store, &grammar).await.unwrap(), 4);
    // applying again adds nothing
    assert_eq!(seed.apply(&store, &grammar).await.unwrap(), 0);

    let eng = grammar
        .parse("cn=eng,ou=groups,ou=Acme,ou=groups,ou=internal,o=sreemat")
        .unwrap();
    let attributes = store.read_entry(&eng).await.unwrap().unwrap();
    let members = attributes.values("member");
    assert!(members.contains(&grammar.member_reference(&eng, "carol").unwrap()));
}

#[test]
fn test_seed_missing_file() {
    let err = SeedFile::load("/nonexistent/seed.json").unwrap_err();
    assert!(
        matches!(err, AppError::Config(ConfigError::Seed { ref path, .. }) if path == "/nonexistent/seed.json"),
        "unexpected error: {err}"
    );
}

//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (ORGDIR__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use crate::path::Branch;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "orgdir.toml",
    ".orgdir.toml",
    "~/.config/orgdir/config.toml",
    "/etc/orgdir/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde defaults on AppConfig

    // 2. Configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Environment variables with ORGDIR__ prefix
    // e.g., ORGDIR__DIRECTORY__BASE_DN, ORGDIR__SERVER__PORT
    // Double underscore (__) maps to nested keys (directory.base_dn)
    builder = builder.add_source(
        Environment::with_prefix("ORGDIR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let directory = &config.directory;

    if directory.base_dn.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "directory.base_dn".to_string(),
        });
    }

    for (field, value) in [
        ("directory.groups_container", &directory.groups_container),
        ("directory.domain_admin_name", &directory.domain_admin_name),
        ("directory.group_admin_name", &directory.group_admin_name),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: field.to_string(),
            });
        }
    }

    if directory.domain_admin_name == directory.group_admin_name {
        return Err(ConfigError::Invalid {
            message: "directory.domain_admin_name and directory.group_admin_name must differ"
                .to_string(),
        });
    }

    for branch in Branch::all() {
        let super_admin = &directory.branch(*branch).super_admin_group;
        if super_admin.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: format!("directory.branches.{}.super_admin_group", branch),
            });
        }
        if super_admin == &directory.domain_admin_name || super_admin == &directory.group_admin_name
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "directory.branches.{}.super_admin_group collides with another reserved name",
                    branch
                ),
            });
        }
    }

    if directory.branch_root_dn(Branch::Internal) == directory.branch_root_dn(Branch::External) {
        return Err(ConfigError::Invalid {
            message: "internal and external branches must have distinct roots".to_string(),
        });
    }

    if let Err(e) = regex::Regex::new(&directory.name_pattern) {
        return Err(ConfigError::InvalidPattern {
            pattern: directory.name_pattern.clone(),
            reason: format!("in directory.name_pattern: {}", e),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.server.principal_header.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "server.principal_header".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[directory]
base_dn = "dc=example,dc=org"

[server]
port = 9000
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.directory.base_dn, "dc=example,dc=org");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.directory.branch_root_dn(Branch::Internal),
            "ou=groups,ou=internal,dc=example,dc=org"
        );
    }

    #[test]
    fn test_reserved_names_must_differ() {
        let toml = r#"
[directory]
domain_admin_name = "Admins"
group_admin_name = "Admins"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_name_pattern() {
        let mut config = AppConfig::default();
        config.directory.name_pattern = "[invalid".to_string();

        let result = validate_config(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_empty_base_dn_error() {
        let toml = r#"
[directory]
base_dn = ""
"#;

        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_same_branch_roots_rejected() {
        let toml = r#"
[directory.branches.internal]
root = "ou=all,o=x"

[directory.branches.external]
root = "ou=all,o=x"
"#;

        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = load_config(Some("/nonexistent/orgdir.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}

//! Loads the TOML configuration file and resolves it into a ready-to-use
//! `Config`: environment overrides, defaults, host-group expansion, and
//! validation all happen here.

use super::Config;
use crate::defaults;
use common::error::InventoryError;
use log::{debug, error};
use std::env;
use std::fs::read_to_string;

/// Read and resolve a configuration file from disk.
pub fn load(path: &str) -> Result<Config, InventoryError> {
    let data = match read_to_string(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[config] Failed to read config file {path}: {err:?}");
            return Err(InventoryError::config(
                "config_file",
                &format!("failed to read {path}: {err}"),
            ));
        }
    };

    parse(&data)
}

/// Parse and resolve configuration from TOML text.
pub fn parse(data: &str) -> Result<Config, InventoryError> {
    let mut config: Config = match toml::from_str(data) {
        Ok(result) => result,
        Err(err) => {
            error!("[config] Failed to parse TOML config: {err:?}");
            return Err(InventoryError::config(
                "config_file",
                &format!("failed to parse config: {err}"),
            ));
        }
    };

    apply_env_overrides(&mut config);
    config.apply_defaults();
    config.expand_host_groups()?;
    config.validate()?;

    debug!(
        "[config] Configuration loaded: {} hosts, concurrency {}, netbox enabled {}",
        config.hosts.len(),
        config.concurrency,
        config.netbox.is_enabled()
    );

    Ok(config)
}

/// Environment variables win over file values for credentials, the NetBox
/// endpoint, and logging.
fn apply_env_overrides(config: &mut Config) {
    if let Some(url) = non_empty_env(defaults::ENV_NETBOX_URL) {
        config.netbox.url = url;
    }
    if let Some(token) = non_empty_env(defaults::ENV_NETBOX_TOKEN) {
        config.netbox.token = token;
    }
    if let Some(user) = non_empty_env(defaults::ENV_DEFAULT_USERNAME) {
        config.defaults.username = user;
    }
    if let Some(pass) = non_empty_env(defaults::ENV_DEFAULT_PASSWORD) {
        config.defaults.password = pass;
    }
    if let Some(level) = non_empty_env(defaults::ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = non_empty_env(defaults::ENV_LOG_FORMAT) {
        config.logging.format = format;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::defaults;

    const VALID_CONFIG: &str = r#"
concurrency = 8

[defaults]
username = "root"
password = "calvin"
timeout_seconds = 30

[netbox]
url = "https://netbox.example.com"
token = "abc123"

[[hosts]]
host = "10.0.0.10"
display_name = "compute-10"

[[hosts]]
host = "10.0.0.11"
timeout_seconds = 5

[[host_groups]]
name = "rack4"
ip_ranges = ["10.0.4.1-10.0.4.2"]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse(VALID_CONFIG).unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.defaults.username, "root");
        assert_eq!(config.netbox.url, "https://netbox.example.com");
        assert!(config.netbox.is_enabled());
        // two explicit hosts plus the expanded rack4 group
        assert_eq!(config.hosts.len(), 4);
        assert_eq!(config.hosts[0].display_name(), "compute-10");
        assert_eq!(config.hosts[2].host, "10.0.4.1");
        // defaults got applied
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.netbox.timeout_seconds,
            defaults::NETBOX_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn test_parse_asset_system_alias() {
        let config = parse(
            r#"
[defaults]
username = "root"
password = "calvin"

[asset_system]
url = "https://assets.example.com"
token = "tok"

[[hosts]]
host = "10.0.0.1"
"#,
        )
        .unwrap();
        assert_eq!(config.netbox.url, "https://assets.example.com");
    }

    #[test]
    fn test_parse_malformed_toml() {
        let err = parse("concurrency = [not toml").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn test_parse_rejects_invalid_config() {
        // parses as TOML but has no hosts or credentials
        assert!(parse("concurrency = 2").is_err());
    }

    #[test]
    fn test_parse_caps_concurrency() {
        let config = parse(
            r#"
concurrency = 500

[defaults]
username = "root"
password = "calvin"

[[hosts]]
host = "10.0.0.1"
"#,
        )
        .unwrap();
        assert_eq!(config.concurrency, defaults::MAX_CONCURRENCY);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var(defaults::ENV_NETBOX_TOKEN, "from-env");
        let config = parse(VALID_CONFIG).unwrap();
        std::env::remove_var(defaults::ENV_NETBOX_TOKEN);
        assert_eq!(config.netbox.token, "from-env");
    }
}

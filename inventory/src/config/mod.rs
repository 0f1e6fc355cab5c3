//! Typed configuration for a scan run. Values are parsed leniently and
//! normalised afterwards; accessors fall back to the shared defaults.

pub mod iprange;
pub mod loader;

use crate::defaults;
use common::error::InventoryError;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// Root configuration consumed by the scan engine and the NetBox client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "asset_system")]
    pub netbox: NetboxConfig,
    pub defaults: DefaultsConfig,
    pub hosts: Vec<HostSpec>,
    pub host_groups: Vec<HostGroup>,
    pub concurrency: usize,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

/// One BMC to scan. Credentials and TLS behaviour fall back to
/// `DefaultsConfig` when unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostSpec {
    pub host: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure_tls: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

impl HostSpec {
    pub fn username<'a>(&'a self, default: &'a str) -> &'a str {
        match &self.username {
            Some(user) if !user.is_empty() => user,
            _ => default,
        }
    }

    pub fn password<'a>(&'a self, default: &'a str) -> &'a str {
        match &self.password {
            Some(pass) if !pass.is_empty() => pass,
            _ => default,
        }
    }

    pub fn timeout(&self, default: Duration) -> Duration {
        match self.timeout_seconds {
            Some(seconds) if seconds > 0 => Duration::from_secs(seconds),
            _ => default,
        }
    }

    pub fn insecure_tls(&self, default: bool) -> bool {
        self.insecure_tls.unwrap_or(default)
    }

    pub fn display_name(&self) -> &str {
        match &self.display_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.host,
        }
    }
}

/// A named set of hosts described by IP ranges instead of individual
/// entries; expanded into `HostSpec`s before scanning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostGroup {
    pub name: String,
    pub ip_ranges: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure_tls: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

/// Fallback credentials and connection settings for hosts that do not
/// override them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub insecure_tls: Option<bool>,
}

impl DefaultsConfig {
    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds == 0 {
            return defaults::default_timeout();
        }
        Duration::from_secs(self.timeout_seconds)
    }

    // Self-signed certificates are the norm on BMCs, so skipping
    // verification is the default here (unlike the NetBox side).
    pub fn insecure_tls(&self) -> bool {
        self.insecure_tls.unwrap_or(defaults::DEFAULT_INSECURE_TLS)
    }
}

/// NetBox (asset system) connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetboxConfig {
    pub url: String,
    pub token: String,
    pub insecure_tls: bool,
    /// PEM bundle for a private CA, verbatim
    pub ca_cert_pem: String,
    pub timeout_seconds: u64,
}

impl NetboxConfig {
    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty() && !self.token.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds == 0 {
            return defaults::netbox_timeout();
        }
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// debug, info, warn, error
    pub level: String,
    /// console or json
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_idle_conns: usize,
    pub idle_conn_timeout_seconds: u64,
}

impl HttpConfig {
    pub fn max_idle_conns(&self) -> usize {
        if self.max_idle_conns == 0 {
            return defaults::HTTP_MAX_IDLE_CONNS;
        }
        self.max_idle_conns
    }

    pub fn idle_conn_timeout(&self) -> Duration {
        if self.idle_conn_timeout_seconds == 0 {
            return defaults::http_idle_conn_timeout();
        }
        Duration::from_secs(self.idle_conn_timeout_seconds)
    }
}

impl Config {
    /// Build a configuration for scanning a single host from CLI flags.
    pub fn single_host(host: &str, username: &str, password: &str) -> Self {
        Config {
            hosts: vec![HostSpec {
                host: host.to_string(),
                username: Some(username.to_string()),
                password: Some(password.to_string()),
                ..Default::default()
            }],
            defaults: DefaultsConfig {
                timeout_seconds: defaults::DEFAULT_TIMEOUT_SECONDS,
                ..Default::default()
            },
            concurrency: 1,
            logging: LoggingConfig {
                level: defaults::DEFAULT_LOG_LEVEL.to_string(),
                format: defaults::DEFAULT_LOG_FORMAT.to_string(),
            },
            ..Default::default()
        }
    }

    /// Effective worker count: configured value, defaulted and capped.
    pub fn concurrency(&self) -> usize {
        if self.concurrency == 0 {
            return defaults::DEFAULT_CONCURRENCY;
        }
        self.concurrency.min(defaults::MAX_CONCURRENCY)
    }

    /// Fill unset fields with defaults.
    pub fn apply_defaults(&mut self) {
        if self.concurrency == 0 {
            self.concurrency = defaults::DEFAULT_CONCURRENCY;
        }
        if self.concurrency > defaults::MAX_CONCURRENCY {
            self.concurrency = defaults::MAX_CONCURRENCY;
        }
        if self.defaults.timeout_seconds == 0 {
            self.defaults.timeout_seconds = defaults::DEFAULT_TIMEOUT_SECONDS;
        }
        if self.logging.level.is_empty() {
            self.logging.level = defaults::DEFAULT_LOG_LEVEL.to_string();
        }
        if self.logging.format.is_empty() {
            self.logging.format = defaults::DEFAULT_LOG_FORMAT.to_string();
        }
        if self.netbox.timeout_seconds == 0 {
            self.netbox.timeout_seconds = defaults::NETBOX_TIMEOUT_SECONDS;
        }
    }

    /// Expand every host group into individual `HostSpec` entries carrying
    /// the group's credentials. Addresses already present keep their first
    /// definition; duplicates across groups are dropped.
    pub fn expand_host_groups(&mut self) -> Result<(), InventoryError> {
        if self.host_groups.is_empty() {
            return Ok(());
        }

        let mut seen: HashSet<String> = self.hosts.iter().map(|h| h.host.clone()).collect();

        let groups = std::mem::take(&mut self.host_groups);
        for (index, group) in groups.iter().enumerate() {
            let addresses = iprange::expand_ip_ranges(&group.ip_ranges).map_err(|err| {
                InventoryError::config(
                    &format!("host_groups[{index}].ip_ranges"),
                    &err.to_string(),
                )
            })?;

            for address in addresses {
                if !seen.insert(address.clone()) {
                    continue;
                }
                self.hosts.push(HostSpec {
                    host: address,
                    display_name: None,
                    username: group.username.clone(),
                    password: group.password.clone(),
                    insecure_tls: group.insecure_tls,
                    timeout_seconds: group.timeout_seconds,
                });
            }
        }

        Ok(())
    }

    /// Validate the configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), InventoryError> {
        let mut errors = Vec::new();

        if self.hosts.is_empty() && self.host_groups.is_empty() {
            errors.push(InventoryError::config("hosts", "no hosts configured"));
        }

        for (index, host) in self.hosts.iter().enumerate() {
            if host.host.is_empty() {
                errors.push(InventoryError::config(
                    &format!("hosts[{index}].host"),
                    "host is required",
                ));
                continue;
            }
            if host.username(&self.defaults.username).is_empty() {
                errors.push(InventoryError::config(
                    &format!("hosts[{index}].username"),
                    &format!("no username configured for {}", host.host),
                ));
            }
            if host.password(&self.defaults.password).is_empty() {
                errors.push(InventoryError::config(
                    &format!("hosts[{index}].password"),
                    &format!("no password configured for {}", host.host),
                ));
            }
        }

        if !self.netbox.url.is_empty() || !self.netbox.token.is_empty() {
            if self.netbox.url.is_empty() {
                errors.push(InventoryError::config(
                    "netbox.url",
                    "url is required when token is set",
                ));
            }
            if self.netbox.token.is_empty() {
                errors.push(InventoryError::config(
                    "netbox.token",
                    "token is required when url is set",
                ));
            }
        }

        if !self.logging.level.is_empty() {
            match self.logging.level.to_lowercase().as_str() {
                "debug" | "info" | "warn" | "error" => {}
                other => errors.push(InventoryError::config(
                    "logging.level",
                    &format!("invalid level {other:?} (must be debug, info, warn, or error)"),
                )),
            }
        }
        if !self.logging.format.is_empty() {
            match self.logging.format.to_lowercase().as_str() {
                "console" | "json" => {}
                other => errors.push(InventoryError::config(
                    "logging.format",
                    &format!("invalid format {other:?} (must be console or json)"),
                )),
            }
        }

        match InventoryError::aggregate(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DefaultsConfig, HostGroup, HostSpec, LoggingConfig, NetboxConfig};
    use crate::defaults;
    use common::error::InventoryError;
    use std::time::Duration;

    fn base_config() -> Config {
        Config {
            hosts: vec![HostSpec {
                host: String::from("10.0.0.1"),
                ..Default::default()
            }],
            defaults: DefaultsConfig {
                username: String::from("root"),
                password: String::from("calvin"),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_host_credential_fallback() {
        let host = HostSpec {
            host: String::from("10.0.0.1"),
            username: Some(String::from("admin")),
            ..Default::default()
        };
        assert_eq!(host.username("root"), "admin");
        assert_eq!(host.password("calvin"), "calvin");
    }

    #[test]
    fn test_host_timeout_override() {
        let host = HostSpec {
            host: String::from("10.0.0.1"),
            timeout_seconds: Some(5),
            ..Default::default()
        };
        assert_eq!(host.timeout(Duration::from_secs(60)), Duration::from_secs(5));

        let plain = HostSpec::default();
        assert_eq!(
            plain.timeout(Duration::from_secs(60)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_insecure_tls_tri_state() {
        let mut host = HostSpec::default();
        assert!(host.insecure_tls(true));
        assert!(!host.insecure_tls(false));

        host.insecure_tls = Some(false);
        assert!(!host.insecure_tls(true));
    }

    #[test]
    fn test_defaults_insecure_tls_for_bmcs() {
        let defaults = DefaultsConfig::default();
        assert!(defaults.insecure_tls());
    }

    #[test]
    fn test_concurrency_default_and_cap() {
        let mut config = base_config();
        assert_eq!(config.concurrency(), defaults::DEFAULT_CONCURRENCY);

        config.concurrency = 200;
        assert_eq!(config.concurrency(), defaults::MAX_CONCURRENCY);

        config.concurrency = 12;
        assert_eq!(config.concurrency(), 12);
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = base_config();
        config.apply_defaults();
        assert_eq!(config.concurrency, defaults::DEFAULT_CONCURRENCY);
        assert_eq!(
            config.defaults.timeout_seconds,
            defaults::DEFAULT_TIMEOUT_SECONDS
        );
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "console");
        assert_eq!(
            config.netbox.timeout_seconds,
            defaults::NETBOX_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn test_validate_ok() {
        let config = base_config();
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_no_hosts() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.is(&InventoryError::config("hosts", "no hosts configured")));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = Config {
            hosts: vec![HostSpec {
                host: String::from("10.0.0.1"),
                ..Default::default()
            }],
            netbox: NetboxConfig {
                url: String::from("https://netbox.example.com"),
                ..Default::default()
            },
            logging: LoggingConfig {
                level: String::from("loud"),
                format: String::from("console"),
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        match &err {
            InventoryError::Aggregate(members) => {
                // missing username, missing password, missing token, bad level
                assert_eq!(members.len(), 4);
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
        assert!(err.is(&InventoryError::config(
            "netbox.token",
            "token is required when url is set"
        )));
    }

    #[test]
    fn test_expand_host_groups() {
        let mut config = base_config();
        config.host_groups = vec![HostGroup {
            name: String::from("rack3"),
            ip_ranges: vec![String::from("10.0.3.1-10.0.3.3")],
            username: Some(String::from("svc-scan")),
            ..Default::default()
        }];

        config.expand_host_groups().unwrap();
        assert_eq!(config.hosts.len(), 4);
        assert_eq!(config.hosts[1].host, "10.0.3.1");
        assert_eq!(config.hosts[3].host, "10.0.3.3");
        assert_eq!(config.hosts[1].username.as_deref(), Some("svc-scan"));
        assert!(config.host_groups.is_empty());
    }

    #[test]
    fn test_expand_host_groups_dedup_first_wins() {
        let mut config = base_config();
        config.hosts[0].host = String::from("10.0.3.2");
        config.host_groups = vec![
            HostGroup {
                name: String::from("a"),
                ip_ranges: vec![String::from("10.0.3.1-10.0.3.3")],
                username: Some(String::from("first")),
                ..Default::default()
            },
            HostGroup {
                name: String::from("b"),
                ip_ranges: vec![String::from("10.0.3.3")],
                username: Some(String::from("second")),
                ..Default::default()
            },
        ];

        config.expand_host_groups().unwrap();
        // 10.0.3.2 keeps its explicit entry, 10.0.3.3 stays with group "a"
        assert_eq!(config.hosts.len(), 3);
        let dot3 = config
            .hosts
            .iter()
            .find(|h| h.host == "10.0.3.3")
            .unwrap();
        assert_eq!(dot3.username.as_deref(), Some("first"));
    }

    #[test]
    fn test_expand_host_groups_bad_range() {
        let mut config = base_config();
        config.host_groups = vec![HostGroup {
            name: String::from("bad"),
            ip_ranges: vec![String::from("not-an-ip")],
            ..Default::default()
        }];

        let err = config.expand_host_groups().unwrap_err();
        assert!(matches!(err, InventoryError::Config { ref field, .. }
            if field == "host_groups[0].ip_ranges"));
    }

    #[test]
    fn test_single_host_config() {
        let config = Config::single_host("10.0.0.50", "root", "calvin");
        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.concurrency, 1);
        config.validate().unwrap();
    }
}

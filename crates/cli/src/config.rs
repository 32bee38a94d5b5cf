//! Configuration loading from funding.toml.

use policy::Policy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Row-level access rules for the funding state table.
    #[serde(default = "Policy::public")]
    pub access: Policy,
}

/// Database location and connection settings.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long to wait on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("funding.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.access.validate()?;
        Ok(config)
    }

    /// Create a default configuration.
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig::default(),
            access: Policy::public(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::{AccessControl, Predicate};

    #[test]
    fn test_empty_config_is_public() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("funding.db"));
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.access, Policy::public());
        assert_eq!(config.access, Config::default_config().access);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "/var/lib/funding/state.db"
busy_timeout_ms = 250

[access]
access_control = "rules"

[[access.rules]]
name = "members"
using = { roles = ["authenticated"] }
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/var/lib/funding/state.db"));
        assert_eq!(config.database.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.access.access_control, AccessControl::Rules);
        assert_eq!(
            config.access.rules[0].using,
            Predicate::Roles(vec!["authenticated".to_string()])
        );
    }

    #[test]
    fn test_access_none_flag() {
        let config = Config::parse("[access]\naccess_control = \"none\"\n").unwrap();
        assert_eq!(config.access, Policy::default());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let toml = r#"
[access]
access_control = "rules"

[[access.rules]]
name = ""
"#;
        assert!(matches!(Config::parse(toml), Err(ConfigError::Policy(_))));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = Config::parse(include_str!("../../../funding.toml")).unwrap();
        assert_eq!(config.access, Policy::public());
    }
}

//! Configuration loading from authz.toml.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [[rules]]
//! role = "USER"
//! effect = "allow"
//! action = "execute"
//! resource = "Tool"
//! conditions = { name = "read_file" }
//!
//! [channel]
//! unmapped = "deny"
//!
//! [channel.tools.read_file]
//! action = "execute"
//! resource = "Tool"
//!
//! [routes."users.read"]
//! require = [{ action = "read", resource = "User", scope = { param = "id" } }]
//! ```

use std::path::Path;

use guard::RouteTable;
use mcp::PermissionMap;
use policy::RuleTable;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Rule table: the standard table plus configured `[[rules]]`.
    pub rules: RuleTable,

    /// Route policies: the standard routes plus configured `[routes.*]`.
    pub routes: RouteTable,

    /// Command-channel permission tables.
    pub channel: PermissionMap,
}

/// Sections parsed directly; `rules` and `routes` are parsed by their owners.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    logging: LoggingConfig,

    #[serde(default)]
    channel: PermissionMap,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self {
            logging: raw.logging,
            rules: RuleTable::parse(toml)?,
            routes: RouteTable::parse(toml)?,
            channel: raw.channel,
        })
    }

    /// Create a default configuration.
    pub fn default_config() -> Self {
        Self {
            logging: LoggingConfig::default(),
            rules: RuleTable::standard(),
            routes: RouteTable::standard(),
            channel: PermissionMap::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid rules: {0}")]
    Rules(#[from] policy::Error),

    #[error("invalid routes: {0}")]
    Routes(#[from] guard::Error),
}

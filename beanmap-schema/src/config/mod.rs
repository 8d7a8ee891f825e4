//! Configuration file parsing for `beanmap.toml`.
//!
//! ```toml
//! [scan]
//! packages = ["shop::models"]
//! recursive = true
//!
//! [codec]
//! strict = false
//!
//! [[connections]]
//! name = "main"
//! uri = "${MONGO_URI}"
//! database = "shop"
//! default = true
//! max_pool_size = 20
//! connect_timeout = "10s"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "beanmap.toml";

/// Main configuration structure for `beanmap.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeanmapConfig {
    /// Codec discovery settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Codec behaviour.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Database connections.
    #[serde(default)]
    pub connections: Vec<ConnectionDescriptor>,
}

impl BeanmapConfig {
    /// Load configuration from a file path.
    ///
    /// A directory is accepted too, in which case `beanmap.toml` inside it is
    /// read.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "Loaded beanmap configuration");
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Check connection descriptors for consistency.
    ///
    /// Names must be unique and non-empty, every connection needs a URI and a
    /// database, and at most one connection may be the default.
    pub fn validate(&self) -> SchemaResult<()> {
        validate_connections(&self.connections)
    }

    /// Get the connection marked as default, if any.
    pub fn default_connection(&self) -> Option<&ConnectionDescriptor> {
        self.connections.iter().find(|c| c.is_default)
    }

    /// Get a connection by its logical name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionDescriptor> {
        self.connections.iter().find(|c| c.name == name)
    }
}

/// Check a list of connection descriptors for consistency.
pub fn validate_connections(connections: &[ConnectionDescriptor]) -> SchemaResult<()> {
    let mut names = HashSet::new();
    let mut defaults = Vec::new();

    for connection in connections {
        if connection.name.trim().is_empty() {
            return Err(SchemaError::config("connection name must not be empty"));
        }
        if !names.insert(connection.name.as_str()) {
            return Err(SchemaError::config(format!(
                "duplicate connection name `{}`",
                connection.name
            )));
        }
        if connection.uri.trim().is_empty() {
            return Err(SchemaError::config(format!(
                "connection `{}` has no uri",
                connection.name
            )));
        }
        if connection.database.trim().is_empty() {
            return Err(SchemaError::config(format!(
                "connection `{}` has no database",
                connection.name
            )));
        }
        if let (Some(min), Some(max)) = (connection.min_pool_size, connection.max_pool_size) {
            if min > max {
                return Err(SchemaError::config(format!(
                    "connection `{}` has min_pool_size {} above max_pool_size {}",
                    connection.name, min, max
                )));
            }
        }
        for (key, value) in connection.durations() {
            if let Some(value) = value {
                parse_duration(value).map_err(|_| {
                    SchemaError::config(format!(
                        "connection `{}` has an invalid {} `{}`",
                        connection.name, key, value
                    ))
                })?;
            }
        }
        if connection.is_default {
            defaults.push(connection.name.as_str());
        }
    }

    if defaults.len() > 1 {
        return Err(SchemaError::config(format!(
            "more than one default connection: {}",
            defaults.join(", ")
        )));
    }

    Ok(())
}

/// Codec discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Module path roots to discover codecs under (`shop::models`).
    #[serde(default)]
    pub packages: Vec<String>,

    /// Include codecs declared in sub-modules of a root.
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            recursive: true,
        }
    }
}

/// Codec behaviour settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Fail a whole encode/decode when any field fails instead of dropping
    /// the field and reporting a warning.
    #[serde(default)]
    pub strict: bool,
}

/// One database connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDescriptor {
    /// Logical name used to look the database up.
    pub name: String,

    /// Connection URI (supports `${ENV_VAR}` interpolation).
    pub uri: String,

    /// Target database name.
    pub database: String,

    /// Whether this is the default database.
    #[serde(default, rename = "default")]
    pub is_default: bool,

    /// Application name reported to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Minimum connection pool size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pool_size: Option<u32>,

    /// Maximum connection pool size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,

    /// Idle time before a pooled connection is closed (`"5m"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_idle_time: Option<String>,

    /// Connection timeout (`"10s"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,

    /// Server selection timeout (`"30s"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_selection_timeout: Option<String>,

    /// Retry writes once on transient errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_writes: Option<bool>,

    /// Retry reads once on transient errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_reads: Option<bool>,

    /// Connect to the given host only, skipping replica set discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_connection: Option<bool>,
}

impl ConnectionDescriptor {
    /// Create a connection descriptor.
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        database: impl Into<String>,
        is_default: bool,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            database: database.into(),
            is_default,
            app_name: None,
            min_pool_size: None,
            max_pool_size: None,
            max_idle_time: None,
            connect_timeout: None,
            server_selection_timeout: None,
            retry_writes: None,
            retry_reads: None,
            direct_connection: None,
        }
    }

    fn durations(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("max_idle_time", self.max_idle_time.as_deref()),
            ("connect_timeout", self.connect_timeout.as_deref()),
            ("server_selection_timeout", self.server_selection_timeout.as_deref()),
        ]
    }
}

/// Parse a duration written as a whole number and a unit: `ms`, `s`, `m`
/// or `h` (`"500ms"`, `"30s"`, `"10m"`).
pub fn parse_duration(text: &str) -> SchemaResult<Duration> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (amount, unit) = text.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|_| SchemaError::config(format!("invalid duration `{}`", text)))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(amount.saturating_mul(3600))),
        _ => Err(SchemaError::config(format!(
            "invalid duration `{}`, expected a unit of ms, s, m or h",
            text
        ))),
    }
}

fn default_true() -> bool {
    true
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return result;
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}

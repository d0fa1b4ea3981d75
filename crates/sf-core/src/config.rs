//! Connection profiles and CLI settings from config.toml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable pointing at the directory holding config.toml
pub const SNOWFLAKE_HOME_ENV: &str = "SNOWFLAKE_HOME";

/// Name used when neither a flag nor `default_connection_name` picks one
pub const DEFAULT_CONNECTION_NAME: &str = "default";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Connection used when `--connection` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_connection_name: Option<String>,

    /// Named connection profiles
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,

    /// CLI behaviour settings
    #[serde(default)]
    pub cli: CliSection,
}

/// The `[cli]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliSection {
    #[serde(default)]
    pub logs: LogsConfig,
}

/// The `[cli.logs]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Log level filter (error, warn, info, debug, trace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// A single named connection profile
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator: Option<String>,
    /// Pre-provisioned access token forwarded to the SQL API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Token type header value (e.g. `OAUTH`, `PROGRAMMATIC_ACCESS_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Settings this tool does not interpret, preserved on rewrite
    #[serde(flatten)]
    pub other: BTreeMap<String, toml::Value>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("token", &self.token.as_ref().map(|_| "****"))
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    /// Key/value pairs of every non-empty setting, with secrets masked.
    pub fn redacted_entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                out.push((key, v.clone()));
            }
        };
        push("account", &self.account);
        push("user", &self.user);
        push("host", &self.host);
        push("database", &self.database);
        push("schema", &self.schema);
        push("warehouse", &self.warehouse);
        push("role", &self.role);
        push("authenticator", &self.authenticator);
        push("token_type", &self.token_type);
        if let Some(port) = self.port {
            out.push(("port", port.to_string()));
        }
        if self.token.is_some() {
            out.push(("token", "****".to_string()));
        }
        out
    }

    /// Apply `SNOWFLAKE_CONNECTIONS_<NAME>_<KEY>` environment overrides.
    pub fn apply_env_overrides(&mut self, connection_name: &str) {
        let prefix = format!(
            "SNOWFLAKE_CONNECTIONS_{}_",
            connection_name.to_uppercase()
        );
        let lookup = |key: &str| std::env::var(format!("{prefix}{key}")).ok();
        let fields: [(&str, &mut Option<String>); 10] = [
            ("ACCOUNT", &mut self.account),
            ("USER", &mut self.user),
            ("HOST", &mut self.host),
            ("DATABASE", &mut self.database),
            ("SCHEMA", &mut self.schema),
            ("WAREHOUSE", &mut self.warehouse),
            ("ROLE", &mut self.role),
            ("AUTHENTICATOR", &mut self.authenticator),
            ("TOKEN", &mut self.token),
            ("TOKEN_TYPE", &mut self.token_type),
        ];
        for (key, slot) in fields {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }
    }
}

impl CliConfig {
    /// Default location: `$SNOWFLAKE_HOME/config.toml`, else `~/.snowflake/config.toml`
    pub fn default_path() -> PathBuf {
        if let Ok(home) = std::env::var(SNOWFLAKE_HOME_ENV) {
            return PathBuf::from(home).join(CONFIG_FILE_NAME);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".snowflake")
            .join(CONFIG_FILE_NAME)
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration, treating a missing file as an empty configuration
    pub fn load_or_default(path: &Path) -> CoreResult<Self> {
        match Self::load(path) {
            Err(CoreError::ConfigNotFound { .. }) => {
                log::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the configuration back, creating parent directories.
    ///
    /// On unix a file holding any token is made owner-only (0600).
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        let io_err = |e: std::io::Error| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        };
        std::fs::write(path, content).map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.connections.values().any(|c| c.token.is_some()) {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                    .map_err(io_err)?;
            }
        }
        Ok(())
    }

    /// Resolve which connection name to use
    pub fn resolve_connection_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_connection_name.as_deref())
            .unwrap_or(DEFAULT_CONNECTION_NAME)
    }

    /// Get a connection by name (or the default), with environment overrides applied
    pub fn connection(&self, requested: Option<&str>) -> CoreResult<(String, ConnectionConfig)> {
        let name = self.resolve_connection_name(requested).to_string();
        let mut conn = self
            .connections
            .get(&name)
            .cloned()
            .ok_or_else(|| CoreError::ConnectionNotFound { name: name.clone() })?;
        conn.apply_env_overrides(&name);
        Ok((name, conn))
    }

    /// Add a new connection profile; refuses to overwrite an existing one
    pub fn add_connection(
        &mut self,
        name: &str,
        connection: ConnectionConfig,
        path: &Path,
    ) -> CoreResult<()> {
        if self.connections.contains_key(name) {
            return Err(CoreError::ConnectionExists {
                name: name.to_string(),
                path: path.display().to_string(),
            });
        }
        self.connections.insert(name.to_string(), connection);
        Ok(())
    }

    /// Mark an existing connection as the default
    pub fn set_default_connection(&mut self, name: &str) -> CoreResult<()> {
        if !self.connections.contains_key(name) {
            return Err(CoreError::ConnectionNotFound {
                name: name.to_string(),
            });
        }
        self.default_connection_name = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

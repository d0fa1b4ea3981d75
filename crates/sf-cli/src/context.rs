//! Runtime context for CLI commands

use anyhow::{Context, Result};
use sf_core::{CliConfig, ConnectionConfig, Project};
use sf_db::SqlApiSession;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded configuration plus the global flags every command consults
pub struct CliContext {
    /// Location of config.toml
    pub config_path: PathBuf,

    /// Parsed config.toml (empty when the file does not exist)
    pub config: CliConfig,

    /// Project directory from `--project`
    pub project_dir: PathBuf,

    /// Connection requested with `--connection`
    pub connection_name: Option<String>,
}

impl CliContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let config_path = args
            .config_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(CliConfig::default_path);
        let config = CliConfig::load_or_default(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        Ok(Self {
            config_path,
            config,
            project_dir: PathBuf::from(&args.project),
            connection_name: args.connection.clone(),
        })
    }

    /// Log level configured under `[cli.logs]`
    pub fn configured_log_level(&self) -> Option<&str> {
        self.config.cli.logs.level.as_deref()
    }

    /// Load snowflake.yml from the project directory
    pub fn load_project(&self) -> Result<Project> {
        Project::load(Path::new(&self.project_dir)).context("Failed to load project definition")
    }

    /// The selected connection profile, with environment overrides applied
    pub fn connection(&self) -> Result<ConnectionConfig> {
        let (_, connection) = self.named_connection(None)?;
        Ok(connection)
    }

    /// Resolve `requested`, then `--connection`, then the default profile
    pub fn named_connection(&self, requested: Option<&str>) -> Result<(String, ConnectionConfig)> {
        let requested = requested.or(self.connection_name.as_deref());
        let (name, connection) = self.config.connection(requested)?;
        log::debug!("Using connection {}", name);
        Ok((name, connection))
    }

    /// Open a session for the selected connection
    pub fn session(&self) -> Result<(ConnectionConfig, SqlApiSession)> {
        let connection = self.connection()?;
        let session =
            SqlApiSession::from_connection(&connection).context("Failed to open a session")?;
        Ok((connection, session))
    }
}

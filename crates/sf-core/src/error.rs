//! Error types for sf-core

use thiserror::Error;

/// Core error type for snow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Named connection is not configured
    #[error("[E004] Connection {name} is not configured")]
    ConnectionNotFound { name: String },

    /// E005: Connection already exists
    #[error("[E005] Connection {name} already exists in {path}")]
    ConnectionExists { name: String, path: String },

    /// E006: Project definition file not found
    #[error("[E006] Cannot find project definition (snowflake.yml) in {path}. Please provide a path to the project or run this command in a valid project directory.")]
    ProjectNotFound { path: String },

    /// E007: Project definition is missing a required section
    #[error("[E007] Project definition in {path} has no '{section}' section")]
    MissingSection { path: String, section: String },

    /// E008: Identifier is missing a schema qualifier
    #[error("[E008] Identifier missing a schema qualifier: \"{identifier}\"")]
    MissingSchema { identifier: String },

    /// E009: SQL could not be tokenized
    #[error("[E009] Failed to split SQL into statements: {message}")]
    SqlTokenize { message: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E015: YAML parse error
    #[error("[E015] Project definition parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E017: TOML serialization error
    #[error("[E017] Failed to write config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

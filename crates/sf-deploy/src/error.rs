//! Error types for sf-deploy

use sf_core::CoreError;
use sf_db::DbError;
use std::path::PathBuf;
use thiserror::Error;

/// Deployment errors
#[derive(Error, Debug)]
pub enum DeployError {
    /// Remote object owned by a different role (NA001)
    #[error("[NA001] Cannot operate on {item}: owned by {actual} (expected {expected})")]
    UnexpectedOwner {
        item: String,
        expected: String,
        actual: String,
    },

    /// Application exists but was not created from stage files by this tool (NA002)
    #[error("[NA002] A application object \"{name}\" not created in development mode using files on a named stage already exists in the account.")]
    ApplicationAlreadyExists { name: String },

    /// Application package exists but was not created by this tool (NA003)
    #[error("[NA003] An Application Package {name} already exists in account that may have been created without Snowflake CLI.")]
    ApplicationPackageAlreadyExists { name: String },

    /// Application package is missing (NA004)
    #[error("[NA004] Application Package {name} does not exist in the Snowflake account.")]
    ApplicationPackageDoesNotExist { name: String },

    /// Package script not found (NA005)
    #[error("[NA005] Package script \"{relpath}\" does not exist")]
    MissingPackageScript { relpath: String },

    /// Package script failed to render (NA006)
    #[error("[NA006] Package script \"{relpath}\" is not a valid jinja2 template: {message}")]
    InvalidPackageScript { relpath: String, message: String },

    /// Package still has versions (NA007)
    #[error("[NA007] Application package could not be dropped as it has versions associated with it.\nVersions must be dropped first using \"snow app version drop\".")]
    CouldNotDropApplicationPackageWithVersions,

    /// Describe output lacked a distribution row (NA008)
    #[error("[NA008] Could not find the 'distribution' attribute for application package {name} in the output of SQL query:\n'describe application package {name}'")]
    MissingDistribution { name: String },

    /// Invalid invocation, e.g. a version that does not exist (NA009)
    #[error("[NA009] {0}")]
    Usage(String),

    /// A policy declined a destructive step (NA010)
    #[error("[NA010] Operation aborted")]
    Aborted { exit_code: i32 },

    /// Deploy root is not inside the project (NA011)
    #[error("[NA011] Deploy root {deploy_root} is not a descendant of the project directory {project_root}")]
    DeployRootNotInProject {
        deploy_root: PathBuf,
        project_root: PathBuf,
    },

    /// Deploy root exists and is not a directory (NA012)
    #[error("[NA012] Deploy root {0} exists, but is not a directory!")]
    DeployRootNotDirectory(PathBuf),

    /// Artifact source matched nothing (NA013)
    #[error("[NA013] No match was found for the specified source in the project directory: {src}")]
    SourceNotFound { src: String },

    /// Several sources mapped onto a single-file destination (NA014)
    #[error("[NA014] Multiple file or directories were mapped to one output destination: {dest}")]
    TooManyFiles { dest: String },

    /// Artifact destination escapes the deploy root (NA015)
    #[error("[NA015] The specified destination path is outside of the deploy root, or would entirely replace it: {dest}")]
    NotInDeployRoot { dest: String },

    /// Artifact source is not a valid glob (NA016)
    #[error("[NA016] Invalid artifact pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Local file missing for a deployment (NA017)
    #[error("[NA017] Required file {0} does not exist")]
    FileNotFound(PathBuf),

    /// Filesystem error (NA018)
    #[error("[NA018] IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Database error propagation (NA019)
    #[error("[NA019] {0}")]
    Db(#[from] DbError),

    /// Core error propagation (NA020)
    #[error("[NA020] {0}")]
    Core(#[from] CoreError),

    /// Deployment needs uploads the session cannot perform (NA021)
    #[error("[NA021] The {backend} session cannot upload files to a stage, which {operation} requires. Use a connector-backed session for this command.")]
    UploadUnsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

/// Result type alias for DeployError
pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }
}

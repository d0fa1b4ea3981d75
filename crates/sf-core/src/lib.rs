//! sf-core - Core library for snow
//!
//! This crate provides connection profile configuration, project definition
//! parsing (`snowflake.yml` plus its local override), identifier handling and
//! the small SQL/text utilities shared by every other crate.

pub mod checksum;
pub mod config;
pub mod error;
pub mod identifier;
pub mod project;
pub(crate) mod serde_helpers;
pub mod sql_utils;

pub use checksum::{compute_checksum, file_md5};
pub use config::{CliConfig, ConnectionConfig};
pub use error::{CoreError, CoreResult};
pub use project::{
    ApplicationDefinition, ArtifactSpec, NativeAppDefinition, PackageDefinition, Project,
    ProjectDefinition, StreamlitDefinition,
};

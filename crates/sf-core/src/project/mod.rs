//! Project definition (`snowflake.yml`) types

mod loading;

pub use loading::{merge_yaml, DEFINITION_FILE, LOCAL_OVERRIDE_FILE};

use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A loaded project: its root directory and merged definition
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory containing snowflake.yml
    pub root: PathBuf,

    /// Definition after applying snowflake.local.yml
    pub definition: ProjectDefinition,
}

/// Top-level structure of snowflake.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDefinition {
    /// Schema version of the definition file
    #[serde(default = "default_definition_version")]
    pub definition_version: u32,

    /// Native application project, if any
    #[serde(default)]
    pub native_app: Option<NativeAppDefinition>,

    /// Streamlit dashboard, if any
    #[serde(default)]
    pub streamlit: Option<StreamlitDefinition>,
}

/// The `native_app` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeAppDefinition {
    /// Project name, used to derive default package/application names
    pub name: String,

    /// Stage inside the package that holds the artifacts (`schema.stage`)
    #[serde(default = "default_source_stage")]
    pub source_stage: String,

    /// Local directory the artifacts are bundled into, relative to the project root
    #[serde(default = "default_deploy_root")]
    pub deploy_root: String,

    /// Artifact mappings copied into the deploy root
    pub artifacts: Vec<ArtifactSpec>,

    /// Application package settings
    #[serde(default)]
    pub package: Option<PackageDefinition>,

    /// Application settings
    #[serde(default)]
    pub application: Option<ApplicationDefinition>,
}

/// An artifact entry: either a bare path or an explicit mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactSpec {
    /// Copy `path` to the same relative location in the deploy root
    Path(String),
    /// Copy `src` (path or glob) to `dest`
    Mapping {
        src: String,
        #[serde(default)]
        dest: Option<String>,
    },
}

impl ArtifactSpec {
    /// Source path or glob
    pub fn src(&self) -> &str {
        match self {
            ArtifactSpec::Path(p) => p,
            ArtifactSpec::Mapping { src, .. } => src,
        }
    }

    /// Destination inside the deploy root (defaults to the source)
    pub fn dest(&self) -> &str {
        match self {
            ArtifactSpec::Path(p) => p,
            ArtifactSpec::Mapping { src, dest } => dest.as_deref().unwrap_or(src),
        }
    }
}

/// The `native_app.package` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    /// `internal` or `external`
    #[serde(default = "default_distribution")]
    pub distribution: String,
    /// Jinja SQL scripts applied to the package after creation
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// The `native_app.application` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    /// Whether the application runs in debug mode
    #[serde(default = "default_true")]
    pub debug: bool,
}

impl Default for ApplicationDefinition {
    fn default() -> Self {
        Self {
            name: None,
            role: None,
            warehouse: None,
            debug: true,
        }
    }
}

/// The `streamlit` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamlitDefinition {
    pub name: String,
    #[serde(default = "default_streamlit_stage")]
    pub stage: String,
    #[serde(default)]
    pub query_warehouse: Option<String>,
    #[serde(default = "default_main_file")]
    pub main_file: String,
    #[serde(default)]
    pub env_file: Option<String>,
    #[serde(default)]
    pub pages_dir: Option<String>,
    #[serde(default)]
    pub additional_source_files: Vec<String>,
}

fn default_definition_version() -> u32 {
    1
}

fn default_source_stage() -> String {
    "app_src.stage".to_string()
}

fn default_deploy_root() -> String {
    "output/deploy/".to_string()
}

fn default_distribution() -> String {
    "internal".to_string()
}

fn default_streamlit_stage() -> String {
    "streamlit".to_string()
}

fn default_main_file() -> String {
    "streamlit_app.py".to_string()
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;

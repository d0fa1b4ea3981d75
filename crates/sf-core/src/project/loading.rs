//! Project discovery and definition loading

use crate::error::{CoreError, CoreResult};
use std::path::Path;

use super::{Project, ProjectDefinition};

/// Name of the project definition file
pub const DEFINITION_FILE: &str = "snowflake.yml";

/// Name of the optional per-developer override file
pub const LOCAL_OVERRIDE_FILE: &str = "snowflake.local.yml";

/// Recursively merge `overlay` into `base`.
///
/// Mappings merge key by key; any other value in `overlay` replaces the
/// value in `base`.
pub fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn read_yaml(path: &Path) -> CoreResult<serde_yaml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

impl Project {
    /// Load a project from a directory
    pub fn load(path: &Path) -> CoreResult<Self> {
        let root = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let definition_path = root.join(DEFINITION_FILE);
        if !definition_path.exists() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let mut merged = read_yaml(&definition_path)?;
        let local_path = root.join(LOCAL_OVERRIDE_FILE);
        if local_path.exists() {
            log::debug!("Applying overrides from {}", local_path.display());
            merge_yaml(&mut merged, read_yaml(&local_path)?);
        }

        let definition: ProjectDefinition = serde_yaml::from_value(merged)?;
        Ok(Self { root, definition })
    }

    /// Path of the definition file this project was loaded from
    pub fn definition_path(&self) -> std::path::PathBuf {
        self.root.join(DEFINITION_FILE)
    }

    /// The native_app section, or an error naming the missing section
    pub fn native_app(&self) -> CoreResult<&super::NativeAppDefinition> {
        self.definition
            .native_app
            .as_ref()
            .ok_or_else(|| CoreError::MissingSection {
                path: self.definition_path().display().to_string(),
                section: "native_app".to_string(),
            })
    }

    /// The streamlit section, or an error naming the missing section
    pub fn streamlit(&self) -> CoreResult<&super::StreamlitDefinition> {
        self.definition
            .streamlit
            .as_ref()
            .ok_or_else(|| CoreError::MissingSection {
                path: self.definition_path().display().to_string(),
                section: "streamlit".to_string(),
            })
    }
}

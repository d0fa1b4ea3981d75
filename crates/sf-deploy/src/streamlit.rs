//! Streamlit dashboard deployment

use crate::error::{DeployError, DeployResult};
use crate::stage::{require_put_support, standard_stage_prefix, PUT_PARALLELISM};
use sf_core::identifier::split_qualified;
use sf_core::{ConnectionConfig, Project, StreamlitDefinition};
use sf_db::Session;
use std::path::{Path, PathBuf};

const DEFAULT_ENV_FILE: &str = "environment.yml";
const DEFAULT_PAGES_DIR: &str = "pages";
const CHECKOUT_EXISTS: &str = "Checkout already exists";

/// Deploys the project's `streamlit` section
pub struct StreamlitDeployer<'a> {
    session: &'a dyn Session,
    project_root: &'a Path,
    definition: &'a StreamlitDefinition,
    database: Option<String>,
    schema: Option<String>,
}

impl<'a> StreamlitDeployer<'a> {
    pub fn new(
        session: &'a dyn Session,
        project: &'a Project,
        connection: &ConnectionConfig,
    ) -> DeployResult<Self> {
        Ok(Self {
            session,
            project_root: &project.root,
            definition: project.streamlit()?,
            database: connection.database.clone(),
            schema: connection.schema.clone(),
        })
    }

    /// Prefix unqualified names with the connection's database and schema
    pub fn to_fully_qualified_name(&self, name: &str) -> String {
        match (&self.database, &self.schema) {
            (Some(db), Some(schema)) if split_qualified(name).len() == 1 => {
                format!("{}.{}.{}", db, schema, name)
            }
            _ => name.to_string(),
        }
    }

    /// Upload the files and create the streamlit; returns its qualified name.
    ///
    /// `embedded_stage` stores the files in the object's own stage instead of
    /// a named one.
    pub fn deploy(&self, replace: bool, embedded_stage: bool) -> DeployResult<String> {
        let def = self.definition;
        let main_file = self.project_root.join(&def.main_file);
        if !main_file.is_file() {
            return Err(DeployError::FileNotFound(main_file));
        }
        require_put_support(self.session, "streamlit deploy")?;

        let fqn = self.to_fully_qualified_name(&def.name);
        let short_name = split_qualified(&def.name)
            .last()
            .copied()
            .unwrap_or(def.name.as_str())
            .to_string();

        if embedded_stage {
            let create = if replace {
                format!("CREATE OR REPLACE STREAMLIT {}", fqn)
            } else {
                format!("CREATE STREAMLIT IF NOT EXISTS {}", fqn)
            };
            self.create_streamlit(create, None)?;

            match self
                .session
                .execute(&format!("ALTER streamlit {} CHECKOUT", fqn))
            {
                Ok(_) => {}
                Err(e) if e.to_string().contains(CHECKOUT_EXISTS) => {
                    log::info!("Checkout already exists, continuing");
                }
                Err(e) => return Err(e.into()),
            }

            let root_location = format!(
                "snow://streamlit/{}/default_checkout",
                self.to_fully_qualified_name(&short_name)
            );
            self.put_streamlit_files(&root_location)?;
        } else {
            let stage = self.to_fully_qualified_name(&def.stage);
            log::info!("Creating stage {} if not exists", stage);
            self.session
                .execute(&format!("create stage if not exists {}", stage))?;

            let root_location = standard_stage_prefix(&format!("{}/{}", stage, short_name));
            self.put_streamlit_files(&root_location)?;

            let create = if replace {
                format!("CREATE OR REPLACE STREAMLIT {}", fqn)
            } else {
                format!("CREATE STREAMLIT {}", fqn)
            };
            self.create_streamlit(create, Some(&root_location))?;
        }

        log::info!("Streamlit {} deployed", fqn);
        Ok(fqn)
    }

    fn create_streamlit(&self, create: String, root_location: Option<&str>) -> DeployResult<()> {
        let def = self.definition;
        let mut query = vec![create];
        if let Some(root) = root_location {
            query.push(format!("ROOT_LOCATION = '{}'", root));
        }
        let main_name = Path::new(&def.main_file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| def.main_file.clone());
        query.push(format!("MAIN_FILE = '{}'", main_name));
        if let Some(warehouse) = &def.query_warehouse {
            query.push(format!("QUERY_WAREHOUSE = {}", warehouse));
        }
        self.session.execute(&query.join("\n"))?;
        Ok(())
    }

    fn put(&self, path: &Path, destination: &str) -> DeployResult<()> {
        log::debug!("Uploading {} to {}", path.display(), destination);
        self.session
            .put(path, destination, PUT_PARALLELISM, true)?;
        Ok(())
    }

    fn put_streamlit_files(&self, root_location: &str) -> DeployResult<()> {
        let def = self.definition;
        self.put(&self.project_root.join(&def.main_file), root_location)?;

        let env_file = self
            .project_root
            .join(def.env_file.as_deref().unwrap_or(DEFAULT_ENV_FILE));
        if env_file.is_file() {
            self.put(&env_file, root_location)?;
        }

        let pages_dir = self
            .project_root
            .join(def.pages_dir.as_deref().unwrap_or(DEFAULT_PAGES_DIR));
        if pages_dir.is_dir() {
            let pages_location = format!("{}/pages", root_location);
            for page in page_files(&pages_dir)? {
                self.put(&page, &pages_location)?;
            }
        }

        for file in &def.additional_source_files {
            let destination = match file.rsplit_once('/') {
                Some((parent, _)) => format!("{}/{}", root_location, parent),
                None => root_location.to_string(),
            };
            self.put(&self.project_root.join(file), &destination)?;
        }
        Ok(())
    }
}

/// Python files directly inside `pages_dir`, in name order
fn page_files(pages_dir: &Path) -> DeployResult<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.py",
        glob::Pattern::escape(&pages_dir.to_string_lossy())
    );
    let mut pages = glob::glob(&pattern)
        .map_err(|e| DeployError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?
        .filter_map(Result::ok)
        .collect::<Vec<_>>();
    pages.sort();
    Ok(pages)
}

#[cfg(test)]
#[path = "streamlit_test.rs"]
mod tests;

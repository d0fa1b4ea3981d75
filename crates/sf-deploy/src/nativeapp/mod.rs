//! Native application deployment
//!
//! [`NativeAppManager`] resolves names, roles and warehouses from the project
//! definition and the connection profile once per invocation, and holds the
//! lookups every processor shares. The processors themselves live in the
//! submodules.

pub mod package;
pub mod run;
pub mod teardown;

#[cfg(test)]
pub(crate) mod test_fixtures;

use crate::diff::DiffResult;
use crate::error::{DeployError, DeployResult};
use crate::stage::{stage_diff, sync_local_diff_with_stage};
use sf_core::identifier::{
    append_to_identifier, clean_identifier, extract_schema, to_identifier, unquote_identifier,
};
use sf_core::{ArtifactSpec, ConnectionConfig, CoreError, NativeAppDefinition, Project};
use sf_db::{show_specific_object, DbError, RoleGuard, Row, Session};
use std::path::PathBuf;

/// Comment marking objects this tool created
pub const SPECIAL_COMMENT: &str = "GENERATED_BY_SNOWFLAKECLI";

/// Marker written by earlier releases of the tool
pub const SPECIAL_COMMENT_OLD: &str = "GENERATED_BY_SNOWCLI";

/// Version column value of an application created from stage files
pub const LOOSE_FILES_MAGIC_VERSION: &str = "UNVERSIONED";

pub const INTERNAL_DISTRIBUTION: &str = "internal";
pub const EXTERNAL_DISTRIBUTION: &str = "external";

/// Errors raised when an upgrade needs the application to be recreated
pub const UPGRADE_RESTRICTION_CODES: [i64; 4] = [93044, 93055, 93045, 93046];

pub const NAME_COL: &str = "name";
pub const COMMENT_COL: &str = "comment";
pub const OWNER_COL: &str = "owner";
pub const VERSION_COL: &str = "version";

const DEFAULT_ROLE: &str = "accountadmin";
const DEFAULT_USERNAME: &str = "unknown_user";

/// Whether `comment` is one of the markers this tool writes
pub fn has_special_comment(row: &Row) -> bool {
    matches!(
        row.get(COMMENT_COL),
        Some(SPECIAL_COMMENT) | Some(SPECIAL_COMMENT_OLD)
    )
}

/// Whether a SQL error means an upgrade needs the application to be recreated
pub fn is_upgrade_restriction(err: &DbError) -> bool {
    err.errno()
        .is_some_and(|errno| UPGRADE_RESTRICTION_CODES.contains(&errno))
}

/// Fail unless the row's owner is `role`.
///
/// Owners are reported as stored names, so unquoted roles compare
/// case-insensitively.
pub fn ensure_correct_owner(row: &Row, role: &str, obj_name: &str) -> DeployResult<()> {
    let actual = row.get(OWNER_COL).unwrap_or_default();
    let expected = unquote_identifier(role);
    if actual == expected || actual.to_uppercase() == expected {
        return Ok(());
    }
    Err(DeployError::UnexpectedOwner {
        item: obj_name.to_string(),
        expected: role.to_string(),
        actual: actual.to_uppercase(),
    })
}

/// Current OS user, reduced to identifier characters
pub fn default_username() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let cleaned = clean_identifier(&user);
    if cleaned.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        cleaned
    }
}

/// Names, roles and warehouses of one native application project
pub struct NativeAppManager<'a> {
    session: &'a dyn Session,
    project: &'a Project,
    definition: &'a NativeAppDefinition,
    pub package_name: String,
    pub package_role: String,
    pub package_distribution: String,
    pub package_warehouse: Option<String>,
    pub app_name: String,
    pub app_role: String,
    pub application_warehouse: Option<String>,
    pub debug_mode: bool,
    pub stage_fqn: String,
    pub stage_schema: String,
}

impl<'a> NativeAppManager<'a> {
    /// Resolve a manager for the project's `native_app` section
    pub fn new(
        session: &'a dyn Session,
        project: &'a Project,
        connection: &ConnectionConfig,
    ) -> DeployResult<Self> {
        Self::with_username(session, project, connection, &default_username())
    }

    /// Resolve with an explicit user name for the default object names
    pub fn with_username(
        session: &'a dyn Session,
        project: &'a Project,
        connection: &ConnectionConfig,
        username: &str,
    ) -> DeployResult<Self> {
        let definition = project.native_app()?;
        let project_identifier = to_identifier(&definition.name);
        let package = definition.package.as_ref();
        let application = definition.application.as_ref();
        let default_role = || {
            connection
                .role
                .clone()
                .unwrap_or_else(|| DEFAULT_ROLE.to_string())
        };

        let package_name = to_identifier(
            &package
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| {
                    append_to_identifier(&project_identifier, &format!("_pkg_{}", username))
                }),
        );
        let app_name = to_identifier(
            &application
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| {
                    append_to_identifier(&project_identifier, &format!("_{}", username))
                }),
        );

        let stage_fqn = format!("{}.{}", package_name, definition.source_stage);
        let stage_schema = extract_schema(&stage_fqn).ok_or_else(|| CoreError::MissingSchema {
            identifier: stage_fqn.clone(),
        })?;

        Ok(Self {
            session,
            project,
            definition,
            package_role: package
                .and_then(|p| p.role.clone())
                .unwrap_or_else(default_role),
            package_distribution: package
                .map(|p| p.distribution.to_lowercase())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| INTERNAL_DISTRIBUTION.to_string()),
            package_warehouse: package
                .and_then(|p| p.warehouse.clone())
                .or_else(|| connection.warehouse.clone()),
            app_role: application
                .and_then(|a| a.role.clone())
                .unwrap_or_else(default_role),
            application_warehouse: application
                .and_then(|a| a.warehouse.clone())
                .or_else(|| connection.warehouse.clone()),
            debug_mode: application.map_or(true, |a| a.debug),
            package_name,
            app_name,
            stage_fqn,
            stage_schema,
        })
    }

    /// Session all statements go through
    pub fn session(&self) -> &'a dyn Session {
        self.session
    }

    /// Directory containing snowflake.yml
    pub fn project_root(&self) -> &'a std::path::Path {
        &self.project.root
    }

    /// Local directory the artifacts are bundled into
    pub fn deploy_root(&self) -> PathBuf {
        self.project.root.join(&self.definition.deploy_root)
    }

    /// Artifact mappings from the definition
    pub fn artifacts(&self) -> &'a [ArtifactSpec] {
        &self.definition.artifacts
    }

    /// Package scripts, relative to the project root
    pub fn package_scripts(&self) -> &'a [String] {
        self.definition
            .package
            .as_ref()
            .map(|p| p.scripts.as_slice())
            .unwrap_or_default()
    }

    /// Populate the deploy root from the artifact mappings
    pub fn build_bundle(&self) -> DeployResult<()> {
        crate::artifacts::build_bundle(self.project_root(), &self.deploy_root(), self.artifacts())
    }

    /// Existing application with this name, looked up under the application role
    pub fn get_existing_app_info(&self) -> DeployResult<Option<Row>> {
        let _role = RoleGuard::switch(self.session, &self.app_role)?;
        Ok(show_specific_object(
            self.session,
            "applications",
            &self.app_name,
            NAME_COL,
            None,
        )?)
    }

    /// Existing application package with this name, looked up under the package role
    pub fn get_existing_app_pkg_info(&self) -> DeployResult<Option<Row>> {
        let _role = RoleGuard::switch(self.session, &self.package_role)?;
        Ok(show_specific_object(
            self.session,
            "application packages",
            &self.package_name,
            NAME_COL,
            None,
        )?)
    }

    /// The package's `distribution` property, lower-cased
    pub fn get_app_pkg_distribution(&self) -> DeployResult<String> {
        let _role = RoleGuard::switch(self.session, &self.package_role)?;
        let described = self
            .session
            .execute(&format!("describe application package {}", self.package_name))
            .map_err(|e| e.with_remediation_hint(None, None))?;
        described
            .rows
            .iter()
            .find(|row| row.at(0).is_some_and(|p| p.eq_ignore_ascii_case("distribution")))
            .and_then(|row| row.at(1))
            .map(str::to_lowercase)
            .ok_or_else(|| DeployError::MissingDistribution {
                name: self.package_name.clone(),
            })
    }

    /// Compare the remote distribution with the configured one, warning on mismatch
    pub fn verify_project_distribution(&self, actual_distribution: &str) -> bool {
        if actual_distribution == self.package_distribution {
            return true;
        }
        log::warn!(
            "Application package {} in your Snowflake account has distribution property {},\n\
             which does not match the value specified in project definition file: {}.",
            self.package_name,
            actual_distribution,
            self.package_distribution
        );
        false
    }

    /// Make sure the stage exists, then bring it in line with the deploy root
    pub fn sync_deploy_root_with_stage(&self, role: &str) -> DeployResult<DiffResult> {
        log::info!("Checking if stage exists, or creating a new one if none exists.");
        {
            let _role = RoleGuard::switch(self.session, role)?;
            self.session.execute(&format!(
                "create schema if not exists {}.{}",
                self.package_name, self.stage_schema
            ))?;
            self.session.execute(&format!(
                "create stage if not exists {}\n    encryption = (TYPE = 'SNOWFLAKE_SSE')\n    DIRECTORY = (ENABLE = TRUE)",
                self.stage_fqn
            ))?;
        }

        let deploy_root = self.deploy_root();
        log::info!(
            "Performing a diff between the Snowflake stage and your local deploy_root ('{}') directory.",
            deploy_root.display()
        );
        let diff = stage_diff(self.session, &deploy_root, &self.stage_fqn)?;
        log::info!("{}", diff);

        if diff.has_changes() {
            log::info!(
                "Uploading diff-ed files from your local {} directory to the Snowflake stage.",
                deploy_root.display()
            );
            sync_local_diff_with_stage(self.session, &deploy_root, &diff, &self.stage_fqn)?;
        }
        Ok(diff)
    }

    /// Drop an object under `role`
    pub fn drop_generic_object(&self, object_type: &str, object_name: &str, role: &str) -> DeployResult<()> {
        let _role = RoleGuard::switch(self.session, role)?;
        log::info!("Dropping {} {} now.", object_type, object_name);
        self.session
            .execute(&format!("drop {} {}", object_type, object_name))
            .map_err(|e| e.with_remediation_hint(None, None))?;
        log::info!("Dropped {} {} successfully.", object_type, object_name);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

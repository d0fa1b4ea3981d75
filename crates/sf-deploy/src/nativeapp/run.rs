//! Create or upgrade the application from stage files, a version, or the release directive

use super::package::ApplicationPackageProcessor;
use super::{
    ensure_correct_owner, has_special_comment, is_upgrade_restriction, NativeAppManager,
    LOOSE_FILES_MAGIC_VERSION, SPECIAL_COMMENT, VERSION_COL,
};
use crate::diff::DiffResult;
use crate::error::{DeployError, DeployResult};
use crate::policy::Policy;
use crate::stage::{quote_stage_name, require_put_support};
use sf_core::identifier::{identifier_to_show_like_pattern, identifiers_match, unquote_identifier};
use sf_db::{DbError, DbResult, RoleGuard, Row, WarehouseGuard};

const RECREATE_PROMPT: &str =
    "Do you want the CLI to drop the existing application and recreate it?";

/// Where the application's code comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployMode {
    /// Files synced to the package stage (development mode)
    Stage { stage_fqn: String },
    /// An existing version of the package, optionally pinned to a patch
    Version {
        version: String,
        patch: Option<u32>,
    },
    /// Whatever the package's release directive points at
    ReleaseDirective,
}

impl DeployMode {
    /// Resolve the mode from `--version`, `--patch` and `--from-release-directive`.
    ///
    /// Without either flag the application is created from `stage_fqn`.
    pub fn from_args(
        stage_fqn: &str,
        version: Option<String>,
        patch: Option<u32>,
        from_release_directive: bool,
    ) -> DeployResult<Self> {
        match (version, patch, from_release_directive) {
            (Some(_), _, true) => Err(DeployError::Usage(
                "--version and --from-release-directive are mutually exclusive.".to_string(),
            )),
            (None, Some(_), _) => Err(DeployError::Usage(
                "--patch requires --version.".to_string(),
            )),
            (None, None, true) => Ok(DeployMode::ReleaseDirective),
            (Some(version), patch, false) => Ok(DeployMode::Version { version, patch }),
            (None, None, false) => Ok(DeployMode::Stage {
                stage_fqn: stage_fqn.to_string(),
            }),
        }
    }

    fn patch_clause(patch: Option<u32>) -> String {
        patch.map(|p| format!(" patch {}", p)).unwrap_or_default()
    }
}

/// Reconciles the application object with the package
pub struct RunProcessor<'a> {
    manager: &'a NativeAppManager<'a>,
}

impl<'a> RunProcessor<'a> {
    pub fn new(manager: &'a NativeAppManager<'a>) -> Self {
        Self { manager }
    }

    /// Bring the package and application up to date for `mode`.
    ///
    /// Destructive recovery from upgrade restrictions is gated by `policy`.
    pub fn process(
        &self,
        policy: &dyn Policy,
        mode: &DeployMode,
        is_interactive: bool,
    ) -> DeployResult<()> {
        let m = self.manager;
        let diff = match mode {
            DeployMode::Stage { .. } => {
                require_put_support(m.session(), "app run")?;
                let package = ApplicationPackageProcessor::new(m);
                package.create_app_package()?;
                let _role = RoleGuard::switch(m.session(), &m.package_role)?;
                package.apply_package_scripts()?;
                Some(m.sync_deploy_root_with_stage(&m.package_role)?)
            }
            DeployMode::Version { version, .. } => {
                self.require_version(version)?;
                None
            }
            DeployMode::ReleaseDirective => None,
        };

        self.create_or_upgrade_app(policy, mode, diff.as_ref(), is_interactive)
    }

    /// The package's row for `version`, looked up under the package role
    pub fn get_existing_version_info(&self, version: &str) -> DeployResult<Option<Row>> {
        let m = self.manager;
        let _role = RoleGuard::switch(m.session(), &m.package_role)?;
        let result = m.session().execute(&format!(
            "show versions like {} in application package {}",
            identifier_to_show_like_pattern(version),
            m.package_name
        ));
        match result {
            // `like` matches case-insensitively; keep only the exact version
            Ok(rows) => {
                let wanted = unquote_identifier(version);
                Ok(rows
                    .rows
                    .into_iter()
                    .find(|row| row.get(VERSION_COL) == Some(wanted.as_str())))
            }
            Err(e) if e.is_does_not_exist() => Err(DeployError::ApplicationPackageDoesNotExist {
                name: m.package_name.clone(),
            }),
            Err(e) => Err(e.with_remediation_hint(Some(&m.package_role), None).into()),
        }
    }

    fn require_version(&self, version: &str) -> DeployResult<()> {
        let package_name = &self.manager.package_name;
        match self.get_existing_version_info(version) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(DeployError::Usage(format!(
                "Application package {} does not contain any version {}. Use 'snow app version create' to create a version on the application package first.",
                package_name, version
            ))),
            Err(DeployError::ApplicationPackageDoesNotExist { .. }) => {
                Err(DeployError::Usage(format!(
                    "Application package {} does not exist. Use 'snow app version create' to create an application package and/or version first.",
                    package_name
                )))
            }
            Err(e) => Err(e),
        }
    }

    fn create_or_upgrade_app(
        &self,
        policy: &dyn Policy,
        mode: &DeployMode,
        diff: Option<&DiffResult>,
        is_interactive: bool,
    ) -> DeployResult<()> {
        let m = self.manager;
        let session = m.session();
        let warehouse = m.application_warehouse.as_deref();

        let _role = RoleGuard::switch(session, &m.app_role)?;
        let _warehouse = WarehouseGuard::switch(session, warehouse)
            .map_err(|e| e.with_remediation_hint(Some(&m.app_role), warehouse))?;

        if let Some(row) = m.get_existing_app_info()? {
            ensure_correct_owner(&row, &m.app_role, &m.app_name)?;

            let from_stage = matches!(mode, DeployMode::Stage { .. });
            if !has_special_comment(&row)
                || (from_stage && row.get(VERSION_COL) != Some(LOOSE_FILES_MAGIC_VERSION))
            {
                return Err(DeployError::ApplicationAlreadyExists {
                    name: m.app_name.clone(),
                });
            }

            match self.upgrade_app(mode, diff) {
                Ok(()) => return Ok(()),
                Err(e) if is_upgrade_restriction(&e) => {
                    log::warn!("{}", e.sql_message().unwrap_or_default());
                    if !policy.should_proceed(RECREATE_PROMPT) {
                        if is_interactive {
                            log::info!("Not upgrading the application.");
                        } else {
                            log::info!(
                                "Cannot upgrade the application non-interactively without --force."
                            );
                        }
                        return Err(DeployError::Aborted {
                            exit_code: policy.denial_exit_code(is_interactive),
                        });
                    }
                    log::info!("Dropping application object {}.", m.app_name);
                    session
                        .execute(&format!("drop application {}", m.app_name))
                        .map_err(|e| e.with_remediation_hint(None, None))?;
                }
                Err(e) => return Err(e.with_remediation_hint(None, None).into()),
            }
        }

        self.create_app(mode)
    }

    fn upgrade_app(&self, mode: &DeployMode, diff: Option<&DiffResult>) -> DbResult<()> {
        let m = self.manager;
        let session = m.session();
        log::info!("Upgrading existing application object {}.", m.app_name);
        match mode {
            DeployMode::Stage { stage_fqn } => {
                if diff.is_some_and(DiffResult::has_changes) {
                    session.execute(&format!(
                        "alter application {} upgrade using {}",
                        m.app_name,
                        quote_stage_name(stage_fqn)
                    ))?;
                }
                self.set_debug_mode()
            }
            DeployMode::Version { version, patch } => {
                session.execute(&format!(
                    "alter application {} upgrade using version {}{}",
                    m.app_name,
                    version,
                    DeployMode::patch_clause(*patch)
                ))?;
                self.set_debug_mode()
            }
            DeployMode::ReleaseDirective => {
                session.execute(&format!("alter application {} upgrade", m.app_name))?;
                Ok(())
            }
        }
    }

    fn set_debug_mode(&self) -> DbResult<()> {
        let m = self.manager;
        m.session().execute(&format!(
            "alter application {} set debug_mode = {}",
            m.app_name, m.debug_mode
        ))?;
        Ok(())
    }

    /// Grants the application role needs on the package for `mode`
    fn grant_batch(&self, mode: &DeployMode) -> String {
        let m = self.manager;
        let privileges = match mode {
            DeployMode::ReleaseDirective => "install",
            _ => "install, develop",
        };
        let mut batch = format!(
            "grant {} on application package {} to role {};\n",
            privileges, m.package_name, m.app_role
        );
        if let DeployMode::Stage { stage_fqn } = mode {
            batch.push_str(&format!(
                "grant usage on schema {}.{} to role {};\n",
                m.package_name, m.stage_schema, m.app_role
            ));
            batch.push_str(&format!(
                "grant read on stage {} to role {};\n",
                stage_fqn, m.app_role
            ));
        }
        batch
    }

    fn create_app(&self, mode: &DeployMode) -> DeployResult<()> {
        let m = self.manager;
        let session = m.session();

        if !identifiers_match(&m.app_role, &m.package_role) {
            let _role = RoleGuard::switch(session, &m.package_role)?;
            session
                .execute_many(&self.grant_batch(mode))
                .map_err(|e| e.with_remediation_hint(None, None))?;
        }

        log::info!("Creating new application object {} in account.", m.app_name);
        let hint = |e: DbError| e.with_remediation_hint(None, None);
        let base = format!(
            "create application {}\n    from application package {}",
            m.app_name, m.package_name
        );
        match mode {
            DeployMode::Stage { stage_fqn } => {
                session
                    .execute(&format!(
                        "{}\n    using {}\n    debug_mode = {}\n    comment = {}",
                        base,
                        quote_stage_name(stage_fqn),
                        m.debug_mode,
                        SPECIAL_COMMENT
                    ))
                    .map_err(hint)?;
            }
            DeployMode::Version { version, patch } => {
                session
                    .execute(&format!(
                        "{}\n    using version {}{}\n    comment = {}",
                        base,
                        version,
                        DeployMode::patch_clause(*patch),
                        SPECIAL_COMMENT
                    ))
                    .map_err(hint)?;
                self.set_debug_mode().map_err(hint)?;
            }
            DeployMode::ReleaseDirective => {
                session
                    .execute(&format!("{}\n    comment = {}", base, SPECIAL_COMMENT))
                    .map_err(hint)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;

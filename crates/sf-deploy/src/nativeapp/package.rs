//! Application package creation, validation and package scripts

use super::{
    ensure_correct_owner, has_special_comment, NativeAppManager, INTERNAL_DISTRIBUTION,
    SPECIAL_COMMENT,
};
use crate::error::{DeployError, DeployResult};
use sf_core::sql_utils::split_statements;
use sf_db::RoleGuard;
use sf_jinja::{JinjaError, PackageScriptRenderer};

/// Creates or validates the application package and applies its scripts
pub struct ApplicationPackageProcessor<'a> {
    manager: &'a NativeAppManager<'a>,
}

impl<'a> ApplicationPackageProcessor<'a> {
    pub fn new(manager: &'a NativeAppManager<'a>) -> Self {
        Self { manager }
    }

    /// Create the package unless one exists; an existing package must be ours.
    pub fn create_app_package(&self) -> DeployResult<()> {
        let m = self.manager;
        if let Some(row) = m.get_existing_app_pkg_info()? {
            ensure_correct_owner(&row, &m.package_role, &m.package_name)?;

            let actual_distribution = m.get_app_pkg_distribution()?;
            if !m.verify_project_distribution(&actual_distribution) {
                log::warn!(
                    "Continuing to execute `snow app run` on application package {} with distribution '{}'.",
                    m.package_name,
                    actual_distribution
                );
            }

            // Only internal packages carry our marker.
            if actual_distribution == INTERNAL_DISTRIBUTION && !has_special_comment(&row) {
                return Err(DeployError::ApplicationPackageAlreadyExists {
                    name: m.package_name.clone(),
                });
            }
            return Ok(());
        }

        let session = m.session();
        let _role = RoleGuard::switch(session, &m.package_role)?;
        log::info!("Creating new application package {} in account.", m.package_name);
        session
            .execute(&format!(
                "create application package {}\n    comment = {}\n    distribution = {}",
                m.package_name, SPECIAL_COMMENT, m.package_distribution
            ))
            .map_err(|e| e.with_remediation_hint(Some(&m.package_role), None))?;
        Ok(())
    }

    /// Render every package script, then run them in order.
    ///
    /// Nothing is executed unless all scripts render.
    pub fn apply_package_scripts(&self) -> DeployResult<()> {
        let m = self.manager;
        let scripts = m.package_scripts();
        if scripts.is_empty() {
            return Ok(());
        }

        let renderer = PackageScriptRenderer::new(m.project_root());
        let rendered = scripts
            .iter()
            .map(|relpath| {
                renderer
                    .render(relpath, &m.package_name)
                    .map_err(|e| script_error(relpath, e))
            })
            .collect::<DeployResult<Vec<_>>>()?;

        let session = m.session();
        let hint = |e: sf_db::DbError| {
            e.with_remediation_hint(Some(&m.package_role), m.package_warehouse.as_deref())
        };
        if let Some(warehouse) = &m.package_warehouse {
            session
                .execute(&format!("use warehouse {}", warehouse))
                .map_err(hint)?;
        }
        for (relpath, sql) in scripts.iter().zip(rendered) {
            log::info!("Applying package script: {}", relpath);
            for statement in split_statements(&sql, true)? {
                session.execute(&statement).map_err(hint)?;
            }
        }
        Ok(())
    }
}

fn script_error(relpath: &str, err: JinjaError) -> DeployError {
    match err {
        JinjaError::TemplateNotFound { .. } => DeployError::MissingPackageScript {
            relpath: relpath.to_string(),
        },
        other => DeployError::InvalidPackageScript {
            relpath: relpath.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "package_test.rs"]
mod tests;

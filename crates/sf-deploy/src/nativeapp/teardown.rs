//! Drop the application and its package

use super::{
    ensure_correct_owner, has_special_comment, NativeAppManager, EXTERNAL_DISTRIBUTION,
};
use crate::error::{DeployError, DeployResult};
use crate::policy::Policy;
use sf_db::RoleGuard;

/// Removes the objects a project created, asking before touching foreign ones
pub struct TeardownProcessor<'a> {
    manager: &'a NativeAppManager<'a>,
}

impl<'a> TeardownProcessor<'a> {
    pub fn new(manager: &'a NativeAppManager<'a>) -> Self {
        Self { manager }
    }

    /// Drop the application, then the package
    pub fn process(&self, policy: &dyn Policy) -> DeployResult<()> {
        self.drop_application(policy)?;
        self.drop_package(policy)
    }

    pub fn drop_application(&self, policy: &dyn Policy) -> DeployResult<()> {
        let m = self.manager;
        let Some(row) = m.get_existing_app_info()? else {
            log::warn!(
                "Role {} does not own any application object with the name {}, or the application object does not exist.",
                m.app_role,
                m.app_name
            );
            return Ok(());
        };
        ensure_correct_owner(&row, &m.app_role, &m.app_name)?;

        if !has_special_comment(&row) {
            let prompt = format!(
                "Application object {} was not created by Snowflake CLI. Do you want to drop it anyway?",
                m.app_name
            );
            if !policy.should_proceed(&prompt) {
                log::info!("Did not drop application object {}.", m.app_name);
                return Ok(());
            }
        }

        m.drop_generic_object("application", &m.app_name, &m.app_role)
    }

    pub fn drop_package(&self, policy: &dyn Policy) -> DeployResult<()> {
        let m = self.manager;
        let Some(row) = m.get_existing_app_pkg_info()? else {
            log::warn!(
                "Role {} does not own any application package with the name {}, or the application package does not exist.",
                m.package_role,
                m.package_name
            );
            return Ok(());
        };
        ensure_correct_owner(&row, &m.package_role, &m.package_name)?;

        {
            let _role = RoleGuard::switch(m.session(), &m.package_role)?;
            let versions = m
                .session()
                .execute(&format!("show versions in application package {}", m.package_name))
                .map_err(|e| e.with_remediation_hint(None, None))?;
            if !versions.is_empty() {
                return Err(DeployError::CouldNotDropApplicationPackageWithVersions);
            }
        }

        let distribution = m.get_app_pkg_distribution()?;
        if !m.verify_project_distribution(&distribution) {
            log::warn!(
                "Continuing to execute `snow app teardown` on application package {} with distribution '{}'.",
                m.package_name,
                distribution
            );
        }

        let prompt = if distribution == EXTERNAL_DISTRIBUTION {
            log::warn!(
                "Application package {} in your Snowflake account has distribution property '{}' and could be associated with one or more of your listings on Snowflake Marketplace.",
                m.package_name,
                EXTERNAL_DISTRIBUTION
            );
            Some(format!(
                "Are you sure you want to drop application package {}?",
                m.package_name
            ))
        } else if !has_special_comment(&row) {
            Some(format!(
                "Application package {} was not created by Snowflake CLI. Do you want to drop it anyway?",
                m.package_name
            ))
        } else {
            None
        };

        if let Some(prompt) = prompt {
            if !policy.should_proceed(&prompt) {
                log::info!("Did not drop application package {}.", m.package_name);
                return Ok(());
            }
        }

        m.drop_generic_object("application package", &m.package_name, &m.package_role)
    }
}

#[cfg(test)]
#[path = "teardown_test.rs"]
mod tests;

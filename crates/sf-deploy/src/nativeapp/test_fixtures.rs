//! Project and session fixtures shared by the processor tests

use sf_core::project::DEFINITION_FILE;
use sf_core::{ConnectionConfig, Project};
use sf_db::test_utils::ScriptedSession;
use sf_db::QueryResult;
use std::path::Path;

pub(crate) const MOCK_SNOWFLAKE_YML: &str = r#"
definition_version: 1
native_app:
  name: myapp
  source_stage: app_src.stage
  artifacts:
    - setup.sql
    - app/README.md
    - src: app/streamlit/*.py
      dest: ui/
  package:
    name: app_pkg
    role: package_role
  application:
    name: myapp
    role: app_role
    warehouse: app_warehouse
    debug: true
"#;

pub(crate) fn project_from(yaml: &str, root: &Path) -> Project {
    std::fs::write(root.join(DEFINITION_FILE), yaml).unwrap();
    Project::load(root).unwrap()
}

pub(crate) fn mock_project(root: &Path) -> Project {
    project_from(MOCK_SNOWFLAKE_YML, root)
}

pub(crate) fn connection() -> ConnectionConfig {
    ConnectionConfig {
        account: Some("acct".to_string()),
        role: Some("old_role".to_string()),
        ..Default::default()
    }
}

pub(crate) fn app_row(comment: &str, version: &str, owner: &str) -> QueryResult {
    QueryResult::from_strings(
        &["name", "comment", "version", "owner"],
        &[&["MYAPP", comment, version, owner]],
    )
}

pub(crate) fn pkg_row(comment: &str, owner: &str) -> QueryResult {
    QueryResult::from_strings(
        &["name", "comment", "owner", "distribution"],
        &[&["APP_PKG", comment, owner, "INTERNAL"]],
    )
}

pub(crate) fn distribution_is(distribution: &str) -> QueryResult {
    QueryResult::from_strings(
        &["property", "value"],
        &[&["name", "APP_PKG"], &["distribution", distribution]],
    )
}

pub(crate) fn no_rows() -> QueryResult {
    QueryResult::new(["name", "comment", "version", "owner"], vec![])
}

/// Statement builders for the role and warehouse guard round-trips
pub(crate) trait ScriptExt: Sized {
    /// Guard entry that switches from `current` to `role`
    fn switch_role(self, current: &str, role: &str) -> Self;
    /// Guard entry when `role` is already active
    fn keep_role(self, role: &str) -> Self;
    /// Guard exit restoring `role`
    fn restore_role(self, role: &str) -> Self;
    /// Guard entry that switches from `current` to `warehouse`
    fn switch_warehouse(self, current: &str, warehouse: &str) -> Self;
    /// Guard exit restoring `warehouse`
    fn restore_warehouse(self, warehouse: &str) -> Self;
}

impl ScriptExt for ScriptedSession {
    fn switch_role(self, current: &str, role: &str) -> Self {
        self.expect(
            "select current_role()",
            QueryResult::from_strings(&["CURRENT_ROLE()"], &[&[current]]),
        )
        .expect_ok(&format!("use role {}", role))
    }

    fn keep_role(self, role: &str) -> Self {
        self.expect(
            "select current_role()",
            QueryResult::from_strings(&["CURRENT_ROLE()"], &[&[role]]),
        )
    }

    fn restore_role(self, role: &str) -> Self {
        self.expect_ok(&format!("use role {}", role))
    }

    fn switch_warehouse(self, current: &str, warehouse: &str) -> Self {
        self.expect(
            "select current_warehouse()",
            QueryResult::from_strings(&["CURRENT_WAREHOUSE()"], &[&[current]]),
        )
        .expect_ok(&format!("use warehouse {}", warehouse))
    }

    fn restore_warehouse(self, warehouse: &str) -> Self {
        self.expect_ok(&format!("use warehouse {}", warehouse))
    }
}

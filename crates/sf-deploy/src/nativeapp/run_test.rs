use super::*;
use crate::nativeapp::test_fixtures::*;
use crate::nativeapp::SPECIAL_COMMENT_OLD;
use crate::policy::{AllowAlwaysPolicy, AskAlwaysPolicy, DenyAlwaysPolicy};
use sf_db::test_utils::ScriptedSession;
use sf_db::QueryResult;
use std::fs;
use std::path::Path;

const SHOW_APP: &str = "show applications like 'MYAPP'";
const STAGE_GRANTS: &str = "grant install, develop on application package app_pkg to role app_role;\n\
     grant usage on schema app_pkg.app_src to role app_role;\n\
     grant read on stage app_pkg.app_src.stage to role app_role;\n";
const CREATE_FROM_STAGE: &str = "create application myapp from application package app_pkg \
     using @app_pkg.app_src.stage debug_mode = true comment = GENERATED_BY_SNOWFLAKECLI";

/// Package lookup, scripts and stage sync for an existing package
fn stage_prelude(session: ScriptedSession, deploy_root: &Path, changed: &[&str]) -> ScriptedSession {
    let mut session = session
        .switch_role("old_role", "package_role")
        .expect(
            r"show application packages like 'APP\\_PKG'",
            pkg_row(SPECIAL_COMMENT, "package_role"),
        )
        .restore_role("old_role")
        .switch_role("old_role", "package_role")
        .expect("describe application package app_pkg", distribution_is("internal"))
        .restore_role("old_role")
        .switch_role("old_role", "package_role")
        .keep_role("package_role")
        .expect_ok("create schema if not exists app_pkg.app_src")
        .expect_ok(
            "create stage if not exists app_pkg.app_src.stage encryption = (TYPE = 'SNOWFLAKE_SSE') DIRECTORY = (ENABLE = TRUE)",
        )
        .expect("ls @app_pkg.app_src.stage", QueryResult::empty());
    for file in changed {
        session = session.expect_put(
            &deploy_root.join(file),
            "@app_pkg.app_src.stage",
            4,
            true,
        );
    }
    session.restore_role("old_role")
}

/// Role and warehouse guards around the application step
fn enter_app(session: ScriptedSession) -> ScriptedSession {
    session
        .switch_role("old_role", "app_role")
        .switch_warehouse("old_wh", "app_warehouse")
        .keep_role("app_role")
}

fn exit_app(session: ScriptedSession) -> ScriptedSession {
    session.restore_warehouse("old_wh").restore_role("old_role")
}

fn stage_mode() -> DeployMode {
    DeployMode::Stage {
        stage_fqn: "app_pkg.app_src.stage".to_string(),
    }
}

fn write_deploy_file(root: &Path, name: &str) -> std::path::PathBuf {
    let deploy_root = root.join("output/deploy");
    fs::create_dir_all(&deploy_root).unwrap();
    fs::write(deploy_root.join(name), "create application role app_public;").unwrap();
    deploy_root
}

#[test]
fn test_mode_from_args() {
    assert_eq!(
        DeployMode::from_args("app_pkg.app_src.stage", None, None, false).unwrap(),
        stage_mode()
    );
    assert_eq!(
        DeployMode::from_args("app_pkg.app_src.stage", None, None, true).unwrap(),
        DeployMode::ReleaseDirective
    );
    assert_eq!(
        DeployMode::from_args("s.st", Some("v1".to_string()), Some(2), false).unwrap(),
        DeployMode::Version {
            version: "v1".to_string(),
            patch: Some(2)
        }
    );
    assert!(matches!(
        DeployMode::from_args("s.st", Some("v1".to_string()), None, true),
        Err(DeployError::Usage(_))
    ));
    assert!(matches!(
        DeployMode::from_args("s.st", None, Some(1), false),
        Err(DeployError::Usage(_))
    ));
}

#[test]
fn test_stage_mode_without_changes_only_sets_debug_mode() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let deploy_root = dir.path().join("output/deploy");

    let session = stage_prelude(ScriptedSession::new(), &deploy_root, &[]);
    let session = enter_app(session)
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, LOOSE_FILES_MAGIC_VERSION, "app_role"))
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &stage_mode(), false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_stage_mode_without_upload_support_fails_before_ddl() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = ScriptedSession::new().without_put();

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &stage_mode(), false)
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::UploadUnsupported { operation: "app run", .. }
    ));
    assert!(session.calls().is_empty());
    session.assert_done();
}

#[test]
fn test_version_mode_runs_without_upload_support() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let version_row = QueryResult::from_strings(&["version", "patch"], &[&["V1", "0"]]);
    let session = enter_app(version_lookup(version_row).without_put())
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"))
        .expect_ok("alter application myapp upgrade using version v1")
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &v1(), false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_stage_mode_upgrades_changed_application() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let deploy_root = write_deploy_file(dir.path(), "setup.sql");

    let session = stage_prelude(ScriptedSession::new(), &deploy_root, &["setup.sql"]);
    let session = enter_app(session)
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT_OLD, LOOSE_FILES_MAGIC_VERSION, "APP_ROLE"))
        .expect_ok("alter application myapp upgrade using @app_pkg.app_src.stage")
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &stage_mode(), false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_stage_mode_creates_application_with_grants() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let deploy_root = dir.path().join("output/deploy");

    let session = stage_prelude(ScriptedSession::new(), &deploy_root, &[]);
    let session = enter_app(session)
        .expect(SHOW_APP, no_rows())
        .switch_role("app_role", "package_role")
        .expect_many(STAGE_GRANTS)
        .restore_role("app_role")
        .expect_ok(CREATE_FROM_STAGE);
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &stage_mode(), false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_same_role_skips_grants() {
    let dir = tempfile::tempdir().unwrap();
    let project = project_from(
        "native_app:\n  name: myapp\n  artifacts: []\n  package:\n    name: app_pkg\n    role: app_role\n  application:\n    name: myapp\n    role: APP_ROLE\n",
        dir.path(),
    );
    let session = ScriptedSession::new()
        .switch_role("old_role", "APP_ROLE")
        .keep_role("APP_ROLE")
        .expect(SHOW_APP, no_rows())
        .expect_ok(
            "create application myapp from application package app_pkg comment = GENERATED_BY_SNOWFLAKECLI",
        )
        .restore_role("old_role");

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_wrong_owner_takes_precedence_over_comment() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());

    let session = enter_app(ScriptedSession::new())
        .expect(SHOW_APP, app_row("hand made", "v1", "accountadmin"));
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::UnexpectedOwner { ref actual, .. } if actual == "ACCOUNTADMIN"
    ));
    session.assert_done();
}

#[test]
fn test_foreign_application_is_not_touched() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());

    let session = enter_app(ScriptedSession::new())
        .expect(SHOW_APP, app_row("hand made", "v1", "app_role"));
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap_err();
    assert!(matches!(err, DeployError::ApplicationAlreadyExists { .. }));
    session.assert_done();
}

#[test]
fn test_stage_mode_rejects_versioned_application() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let deploy_root = dir.path().join("output/deploy");

    let session = stage_prelude(ScriptedSession::new(), &deploy_root, &[]);
    let session = enter_app(session).expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"));
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &stage_mode(), false)
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::ApplicationAlreadyExists { ref name } if name == "myapp"
    ));
    session.assert_done();
}

fn restricted_upgrade() -> ScriptedSession {
    enter_app(ScriptedSession::new())
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"))
        .expect_err(
            "alter application myapp upgrade",
            DbError::sql(93044, "Cannot upgrade application: restricted."),
        )
}

#[test]
fn test_upgrade_restriction_denied_aborts_without_drop() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = exit_app(restricted_upgrade());

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap_err();
    assert!(matches!(err, DeployError::Aborted { exit_code: 1 }));
    assert!(!session.calls().iter().any(|sql| sql.starts_with("drop")));
    session.assert_done();
}

#[test]
fn test_upgrade_restriction_declined_interactively_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = exit_app(restricted_upgrade());

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let policy = AskAlwaysPolicy::with_prompter(|_| false);
    let err = RunProcessor::new(&manager)
        .process(&policy, &DeployMode::ReleaseDirective, true)
        .unwrap_err();
    assert!(matches!(err, DeployError::Aborted { exit_code: 0 }));
    session.assert_done();
}

#[test]
fn test_upgrade_restriction_confirmed_recreates_application() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let deploy_root = write_deploy_file(dir.path(), "setup.sql");

    let session = stage_prelude(ScriptedSession::new(), &deploy_root, &["setup.sql"]);
    let session = enter_app(session)
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, LOOSE_FILES_MAGIC_VERSION, "app_role"))
        .expect_err(
            "alter application myapp upgrade using @app_pkg.app_src.stage",
            DbError::sql(93055, "Upgrade not allowed."),
        )
        .expect_ok("drop application myapp")
        .switch_role("app_role", "package_role")
        .expect_many(STAGE_GRANTS)
        .restore_role("app_role")
        .expect_ok(CREATE_FROM_STAGE);
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let policy = AskAlwaysPolicy::with_prompter(|prompt| prompt.contains("recreate"));
    RunProcessor::new(&manager)
        .process(&policy, &stage_mode(), true)
        .unwrap();

    let drops = session
        .calls()
        .iter()
        .filter(|sql| sql.starts_with("drop"))
        .count();
    assert_eq!(drops, 1);
    session.assert_done();
}

#[test]
fn test_other_upgrade_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = enter_app(ScriptedSession::new())
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"))
        .expect_err(
            "alter application myapp upgrade",
            DbError::sql(2043, sf_db::ERROR_MESSAGE_2043),
        );
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap_err();
    match err {
        DeployError::Db(db) => assert_eq!(db.errno(), Some(2043)),
        other => panic!("unexpected error: {other}"),
    }
    session.assert_done();
}

#[test]
fn test_warehouse_error_restores_role() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = ScriptedSession::new()
        .switch_role("old_role", "app_role")
        .expect(
            "select current_warehouse()",
            QueryResult::from_strings(&["CURRENT_WAREHOUSE()"], &[&["old_wh"]]),
        )
        .expect_err(
            "use warehouse app_warehouse",
            DbError::sql(2043, sf_db::ERROR_MESSAGE_2043),
        )
        .restore_role("old_role");

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("'app_role' may not have access to warehouse 'app_warehouse'"));
    session.assert_done();
}

const SHOW_V1: &str = "show versions like 'V1' in application package app_pkg";

fn version_lookup(result: QueryResult) -> ScriptedSession {
    ScriptedSession::new()
        .switch_role("old_role", "package_role")
        .expect(SHOW_V1, result)
        .restore_role("old_role")
}

fn v1() -> DeployMode {
    DeployMode::Version {
        version: "v1".to_string(),
        patch: None,
    }
}

#[test]
fn test_version_mode_missing_package() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = ScriptedSession::new()
        .switch_role("old_role", "package_role")
        .expect_err(
            SHOW_V1,
            DbError::sql(
                2003,
                "Application package 'APP_PKG' does not exist or not authorized.",
            ),
        )
        .restore_role("old_role");

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &v1(), false)
        .unwrap_err();
    assert!(matches!(err, DeployError::Usage(ref msg) if msg.contains("does not exist")));
    session.assert_done();
}

#[test]
fn test_version_mode_missing_version() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = version_lookup(QueryResult::empty());

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &v1(), false)
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::Usage(ref msg) if msg.contains("does not contain any version v1")
    ));
    session.assert_done();
}

#[test]
fn test_version_mode_quoted_version_ignores_case_insensitive_matches() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let session = ScriptedSession::new()
        .switch_role("old_role", "package_role")
        .expect(
            "show versions like 'v1' in application package app_pkg",
            QueryResult::from_strings(&["version", "patch"], &[&["V1", "0"]]),
        )
        .restore_role("old_role");

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let mode = DeployMode::Version {
        version: "\"v1\"".to_string(),
        patch: None,
    };
    let err = RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &mode, false)
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::Usage(ref msg) if msg.contains("does not contain any version \"v1\"")
    ));
    assert!(!session.calls().iter().any(|sql| sql.contains("create application")));
    session.assert_done();
}

#[test]
fn test_version_mode_picks_exact_version_row() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let version_rows =
        QueryResult::from_strings(&["version", "patch"], &[&["v1", "0"], &["V1", "4"]]);

    let manager_session = version_lookup(version_rows);
    let manager = NativeAppManager::new(&manager_session, &project, &connection()).unwrap();
    let row = RunProcessor::new(&manager)
        .get_existing_version_info("v1")
        .unwrap()
        .unwrap();
    assert_eq!(row.get("patch"), Some("4"));
    manager_session.assert_done();
}

#[test]
fn test_version_mode_upgrade_restriction_recreates_from_version() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let version_row = QueryResult::from_strings(&["version", "patch"], &[&["V1", "3"]]);

    let session = enter_app(version_lookup(version_row))
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"))
        .expect_err(
            "alter application myapp upgrade using version v1 patch 3",
            DbError::sql(93045, "Cannot upgrade to a lower patch."),
        )
        .expect_ok("drop application myapp")
        .switch_role("app_role", "package_role")
        .expect_many("grant install, develop on application package app_pkg to role app_role;\n")
        .restore_role("app_role")
        .expect_ok(
            "create application myapp from application package app_pkg using version v1 patch 3 comment = GENERATED_BY_SNOWFLAKECLI",
        )
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let mode = DeployMode::Version {
        version: "v1".to_string(),
        patch: Some(3),
    };
    RunProcessor::new(&manager)
        .process(&AllowAlwaysPolicy, &mode, false)
        .unwrap();

    let drops = session
        .calls()
        .iter()
        .filter(|sql| sql.starts_with("drop"))
        .count();
    assert_eq!(drops, 1);
    session.assert_done();
}

#[test]
fn test_version_mode_upgrades_with_patch() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let version_row = QueryResult::from_strings(&["version", "patch"], &[&["V1", "2"]]);

    let session = enter_app(version_lookup(version_row))
        .expect(SHOW_APP, app_row(SPECIAL_COMMENT, "V1", "app_role"))
        .expect_ok("alter application myapp upgrade using version v1 patch 2")
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    let mode = DeployMode::Version {
        version: "v1".to_string(),
        patch: Some(2),
    };
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &mode, false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_version_mode_creates_application() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());
    let version_row = QueryResult::from_strings(&["version", "patch"], &[&["V1", "0"]]);

    let session = enter_app(version_lookup(version_row))
        .expect(SHOW_APP, no_rows())
        .switch_role("app_role", "package_role")
        .expect_many("grant install, develop on application package app_pkg to role app_role;\n")
        .restore_role("app_role")
        .expect_ok(
            "create application myapp from application package app_pkg using version v1 comment = GENERATED_BY_SNOWFLAKECLI",
        )
        .expect_ok("alter application myapp set debug_mode = true");
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &v1(), false)
        .unwrap();
    session.assert_done();
}

#[test]
fn test_release_directive_creates_application() {
    let dir = tempfile::tempdir().unwrap();
    let project = mock_project(dir.path());

    let session = enter_app(ScriptedSession::new())
        .expect(SHOW_APP, no_rows())
        .switch_role("app_role", "package_role")
        .expect_many("grant install on application package app_pkg to role app_role;\n")
        .restore_role("app_role")
        .expect_ok(
            "create application myapp from application package app_pkg comment = GENERATED_BY_SNOWFLAKECLI",
        );
    let session = exit_app(session);

    let manager = NativeAppManager::new(&session, &project, &connection()).unwrap();
    RunProcessor::new(&manager)
        .process(&DenyAlwaysPolicy, &DeployMode::ReleaseDirective, false)
        .unwrap();
    session.assert_done();
}

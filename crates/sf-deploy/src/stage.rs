//! Stage naming, listing and synchronisation

use crate::diff::{compute_diff, local_fingerprints, DiffResult, FingerprintMap};
use crate::error::{DeployError, DeployResult};
use sf_core::sql_utils::escape_sql_string;
use sf_db::Session;
use std::path::Path;

/// Upload threads requested for every `put`
pub const PUT_PARALLELISM: usize = 4;

/// Fail before any DDL when `session` cannot upload the files `operation` needs
pub fn require_put_support(session: &dyn Session, operation: &'static str) -> DeployResult<()> {
    if session.supports_put() {
        return Ok(());
    }
    Err(DeployError::UploadUnsupported {
        backend: session.backend_name(),
        operation,
    })
}

/// Prefix a stage name with `@` unless it is already a stage or embedded-stage path
pub fn standard_stage_prefix(name: &str) -> String {
    if name.starts_with('@') || name.starts_with("snow://") {
        name.to_string()
    } else {
        format!("@{}", name)
    }
}

/// Stage reference usable in SQL, quoted as a string literal when needed
pub fn quote_stage_name(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('\'') && name.ends_with('\'') {
        return name.to_string();
    }
    let standard = standard_stage_prefix(name);
    let plain = standard
        .strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(is_plain_stage_char));
    if standard.starts_with('@') && !plain {
        return format!("'{}'", escape_sql_string(&standard));
    }
    standard
}

fn is_plain_stage_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | '$')
}

/// Remote fingerprints from `ls @<stage>`.
///
/// Listed names start with the stage name itself, which is stripped.
pub fn remote_fingerprints(session: &dyn Session, stage_fqn: &str) -> DeployResult<FingerprintMap> {
    let listing = session.execute(&format!("ls {}", quote_stage_name(stage_fqn)))?;
    let map = listing
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.get("name")?;
            let relative = name.split_once('/').map_or(name, |(_, rest)| rest);
            Some((relative.to_string(), row.get("md5")?.to_string()))
        })
        .collect();
    Ok(map)
}

/// Compare `deploy_root` with the contents of `stage_fqn`
pub fn stage_diff(session: &dyn Session, deploy_root: &Path, stage_fqn: &str) -> DeployResult<DiffResult> {
    let local = local_fingerprints(deploy_root)?;
    let remote = remote_fingerprints(session, stage_fqn)?;
    Ok(compute_diff(&local, &remote))
}

/// Stage directory a relative file is uploaded into
fn upload_target(stage_fqn: &str, relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((dir, _)) => quote_stage_name(&format!("{}/{}", stage_fqn, dir)),
        None => quote_stage_name(stage_fqn),
    }
}

/// Identical files whose path starts with a removed one.
///
/// `remove @stage/a.sql` also deletes `a.sql.bak`, so these must be uploaded again.
fn removed_by_prefix(diff: &DiffResult) -> Vec<&str> {
    diff.identical
        .iter()
        .map(String::as_str)
        .filter(|kept| {
            diff.removed
                .iter()
                .any(|removed| kept.starts_with(removed.as_str()) && *kept != removed.as_str())
        })
        .collect()
}

/// Apply `diff` to the stage: remove deleted files, upload changed and new ones
pub fn sync_local_diff_with_stage(
    session: &dyn Session,
    deploy_root: &Path,
    diff: &DiffResult,
    stage_fqn: &str,
) -> DeployResult<()> {
    for relative in &diff.removed {
        log::debug!("Removing {} from stage", relative);
        session.execute(&format!(
            "remove {}",
            quote_stage_name(&format!("{}/{}", stage_fqn, relative))
        ))?;
    }
    let restored = removed_by_prefix(diff);
    for relative in diff.to_upload().chain(restored) {
        log::debug!("Uploading {} to stage", relative);
        session.put(
            &deploy_root.join(relative),
            &upload_target(stage_fqn, relative),
            PUT_PARALLELISM,
            true,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;

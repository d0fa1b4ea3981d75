//! File-level differences between a local tree and a stage

use crate::error::{DeployError, DeployResult};
use sf_core::file_md5;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Relative path (forward slashes) to md5 hex digest
pub type FingerprintMap = BTreeMap<String, String>;

/// Classification of every path seen locally or on the stage.
///
/// A path is in exactly one of the four sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Only present locally
    pub added: BTreeSet<String>,
    /// Only present on the stage
    pub removed: BTreeSet<String>,
    /// Present on both sides with different content
    pub different: BTreeSet<String>,
    /// Present on both sides with identical content
    pub identical: BTreeSet<String>,
}

impl DiffResult {
    /// Whether anything needs to be uploaded or removed
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.different.is_empty())
    }

    /// Files to upload: changed files first, then new ones
    pub fn to_upload(&self) -> impl Iterator<Item = &str> {
        self.different
            .iter()
            .chain(self.added.iter())
            .map(String::as_str)
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return write!(f, "Your stage is up-to-date with your local deploy root.");
        }
        write!(f, "Local changes to be deployed:")?;
        for (label, paths) in [
            ("added:   ", &self.added),
            ("modified:", &self.different),
            ("deleted: ", &self.removed),
        ] {
            for path in paths {
                write!(f, "\n  {} {}", label, path)?;
            }
        }
        Ok(())
    }
}

/// Classify paths from a local and a remote fingerprint map
pub fn compute_diff(local: &FingerprintMap, remote: &FingerprintMap) -> DiffResult {
    let mut result = DiffResult::default();
    for (path, digest) in local {
        match remote.get(path) {
            None => result.added.insert(path.clone()),
            Some(remote_digest) if remote_digest == digest => result.identical.insert(path.clone()),
            Some(_) => result.different.insert(path.clone()),
        };
    }
    for path in remote.keys().filter(|p| !local.contains_key(*p)) {
        result.removed.insert(path.clone());
    }
    result
}

/// Fingerprint every file below `root`, following symlinks
pub fn local_fingerprints(root: &Path) -> DeployResult<FingerprintMap> {
    let mut map = FingerprintMap::new();
    if root.exists() {
        walk(root, root, &mut map)?;
    }
    Ok(map)
}

fn walk(root: &Path, dir: &Path, map: &mut FingerprintMap) -> DeployResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| DeployError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| DeployError::io(dir, e))?.path();
        let metadata = fs::metadata(&path).map_err(|e| DeployError::io(&path, e))?;
        if metadata.is_dir() {
            walk(root, &path, map)?;
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        map.insert(relative, file_md5(&path)?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;

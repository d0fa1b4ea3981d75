//! Artifact bundling into the deploy root
//!
//! Every mapping copies a file, directory or glob from the project into the
//! deploy root. The deploy root is cleared first so files dropped from the
//! definition do not linger on the stage.

use crate::error::{DeployError, DeployResult};
use sf_core::ArtifactSpec;
use std::fs;
use std::path::{Component, Path, PathBuf};

fn is_glob(src: &str) -> bool {
    src.contains('*')
}

/// Destinations ending in `/` name a directory to copy into
fn specifies_directory(dest: &str) -> bool {
    dest.ends_with('/')
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn absolute(path: &Path) -> DeployResult<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| DeployError::io(path, e))?;
    Ok(normalize(&cwd.join(path)))
}

/// Files and directories in the project that `src` refers to
fn source_paths(project_root: &Path, src: &str) -> DeployResult<Vec<PathBuf>> {
    if !is_glob(src) {
        let path = project_root.join(src);
        if !path.exists() {
            return Err(DeployError::SourceNotFound {
                src: path.display().to_string(),
            });
        }
        return Ok(vec![path]);
    }

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&project_root.to_string_lossy()),
        src
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| DeployError::InvalidPattern {
            pattern: src.to_string(),
            message: e.to_string(),
        })?
        .filter_map(Result::ok)
        .collect::<Vec<_>>();
    if paths.is_empty() {
        return Err(DeployError::SourceNotFound {
            src: src.to_string(),
        });
    }
    Ok(paths)
}

fn delete(path: &Path) -> DeployResult<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return Ok(());
    };
    result.map_err(|e| DeployError::io(path, e))
}

/// Copy a file or directory tree, replacing whatever is at `dest`
fn copy_into_place(src: &Path, dest: &Path) -> DeployResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| DeployError::io(parent, e))?;
    }
    delete(dest)?;
    copy_recursive(src, dest)
}

fn copy_recursive(src: &Path, dest: &Path) -> DeployResult<()> {
    if !src.is_dir() {
        fs::copy(src, dest).map_err(|e| DeployError::io(src, e))?;
        return Ok(());
    }
    fs::create_dir_all(dest).map_err(|e| DeployError::io(dest, e))?;
    let entries = fs::read_dir(src).map_err(|e| DeployError::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::io(src, e))?;
        copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
    }
    Ok(())
}

/// Populate `deploy_root` from the artifact mappings
pub fn build_bundle(
    project_root: &Path,
    deploy_root: &Path,
    artifacts: &[ArtifactSpec],
) -> DeployResult<()> {
    let project_root = absolute(project_root)?;
    let deploy_root = absolute(deploy_root)?;

    if deploy_root.exists() && !deploy_root.is_dir() {
        return Err(DeployError::DeployRootNotDirectory(deploy_root));
    }
    if deploy_root == project_root || !deploy_root.starts_with(&project_root) {
        return Err(DeployError::DeployRootNotInProject {
            deploy_root,
            project_root,
        });
    }

    delete(&deploy_root)?;
    fs::create_dir_all(&deploy_root).map_err(|e| DeployError::io(&deploy_root, e))?;

    for artifact in artifacts {
        let dest = artifact.dest();
        let dest_path = normalize(&deploy_root.join(dest));
        let sources = source_paths(&project_root, artifact.src())?;

        if specifies_directory(dest) {
            if !dest_path.starts_with(&deploy_root) {
                return Err(DeployError::NotInDeployRoot {
                    dest: dest.to_string(),
                });
            }
            for source in &sources {
                let Some(name) = source.file_name() else {
                    continue;
                };
                copy_into_place(source, &dest_path.join(name))?;
            }
        } else {
            if dest_path == deploy_root || !dest_path.starts_with(&deploy_root) {
                return Err(DeployError::NotInDeployRoot {
                    dest: dest.to_string(),
                });
            }
            let [source] = sources.as_slice() else {
                return Err(DeployError::TooManyFiles {
                    dest: dest.to_string(),
                });
            };
            copy_into_place(source, &dest_path)?;
        }
        log::debug!("Bundled {} -> {}", artifact.src(), dest);
    }

    log::info!("Bundled artifacts into {}", deploy_root.display());
    Ok(())
}

#[cfg(test)]
#[path = "artifacts_test.rs"]
mod tests;

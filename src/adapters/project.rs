use crate::core::{LockfileKind, ProjectFiles, ProjectReader};
use crate::utils::error::{AuditError, Result};
use std::path::{Path, PathBuf};

const MANIFEST: &str = "package.json";

/// Reads `package.json` and its lockfile from a project directory.
#[derive(Debug, Clone)]
pub struct LocalProject {
    prefix: PathBuf,
}

impl LocalProject {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// `Ok(None)` when the file does not exist.
    async fn maybe_read_json(&self, name: &str) -> Result<Option<serde_json::Value>> {
        let path = self.prefix.join(name);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AuditError::ReadError {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| AuditError::JsonParse {
                file: path.display().to_string(),
                source,
            })
    }
}

impl ProjectReader for LocalProject {
    async fn read_project(&self) -> Result<ProjectFiles> {
        let (shrinkwrap, package_lock, manifest) = tokio::try_join!(
            self.maybe_read_json(LockfileKind::Shrinkwrap.file_name()),
            self.maybe_read_json(LockfileKind::PackageLock.file_name()),
            self.maybe_read_json(MANIFEST),
        )?;

        let manifest = manifest.ok_or_else(|| AuditError::NoManifest {
            path: self.prefix.display().to_string(),
        })?;

        let (lockfile, lockfile_kind) = match (shrinkwrap, package_lock) {
            (Some(shrinkwrap), Some(_)) => {
                tracing::warn!(
                    "Both npm-shrinkwrap.json and package-lock.json exist, using npm-shrinkwrap.json."
                );
                (shrinkwrap, LockfileKind::Shrinkwrap)
            }
            (Some(shrinkwrap), None) => (shrinkwrap, LockfileKind::Shrinkwrap),
            (None, Some(package_lock)) => (package_lock, LockfileKind::PackageLock),
            (None, None) => {
                return Err(AuditError::NoLockfile {
                    path: self.prefix.display().to_string(),
                })
            }
        };

        Ok(ProjectFiles {
            manifest,
            lockfile,
            lockfile_kind,
        })
    }
}

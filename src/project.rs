// SPDX-License-Identifier: MIT
//! Project directory allocation and file materialization.
//!
//! Every generation request gets its own directory under the configured
//! projects root: `{prefix}{UTC yyyymmdd_HHMM}-{uuid8}`. The timestamp keeps
//! names readable; the UUID suffix makes allocation collision-free across
//! concurrent requests. A freshly allocated [`ProjectDir`] cleans itself up
//! on drop until [`ProjectDir::keep`] is called, so failed or canceled runs
//! never leave partial output behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::parse::GeneratedFile;

/// A local write failed. Surfaces permissions, disk, and collision problems.
#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate file path in generated output: {0:?}")]
    PathCollision(String),
}

/// A uniquely allocated project directory, removed on drop unless kept.
pub struct ProjectDir {
    path: PathBuf,
    keep: bool,
}

impl ProjectDir {
    /// Allocate a fresh directory under `projects_root`.
    ///
    /// `create_dir` (not `create_dir_all`) guarantees the name was unused;
    /// on the astronomically unlikely UUID collision we just pick another.
    pub async fn allocate(projects_root: &Path, prefix: &str) -> Result<Self, FilesystemError> {
        tokio::fs::create_dir_all(projects_root)
            .await
            .map_err(|e| FilesystemError::CreateDir {
                path: projects_root.to_path_buf(),
                source: e,
            })?;

        let mut last_path = projects_root.to_path_buf();
        for _ in 0..4 {
            let name = format!(
                "{prefix}{}-{}",
                Utc::now().format("%Y%m%d_%H%M"),
                &Uuid::new_v4().to_string()[..8]
            );
            let path = projects_root.join(name);
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "allocated project directory");
                    return Ok(Self { path, keep: false });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    last_path = path;
                    continue;
                }
                Err(e) => return Err(FilesystemError::CreateDir { path, source: e }),
            }
        }
        Err(FilesystemError::CreateDir {
            path: last_path,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "exhausted unique directory name attempts",
            ),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the directory as final output; it survives the guard.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for ProjectDir {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        // Synchronous removal: Drop can run while an async handler is being
        // canceled, where no await point is available.
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial project directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), err = %e, "failed to clean up partial project directory");
            }
        }
    }
}

/// Write all file entries under the project directory, creating parent
/// directories as needed. Returns the relative paths written, in input order.
pub async fn materialize(
    dir: &ProjectDir,
    files: &[GeneratedFile],
) -> Result<Vec<String>, FilesystemError> {
    let mut seen = HashSet::new();
    for file in files {
        if !seen.insert(file.path.as_str()) {
            return Err(FilesystemError::PathCollision(file.path.clone()));
        }
    }

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let dest = dir.path().join(&file.path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FilesystemError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&dest, &file.content)
            .await
            .map_err(|e| FilesystemError::WriteFile {
                path: dest.clone(),
                source: e,
            })?;
        written.push(file.path.clone());
    }
    Ok(written)
}

//! Isolated per-repository workspace
//!
//! The workspace is released when it goes out of scope: the directory and
//! everything in it are removed on drop, whichever way the lifecycle exits.

use std::path::Path;
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Temporary directory holding one repository checkout
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

/// Directory name prefix derived from the repository's short name
fn prefix_for(repo: &str) -> String {
    let name = repo.rsplit('/').next().unwrap_or(repo);
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        "bulk-".to_string()
    } else {
        format!("bulk-{}-", clean)
    }
}

impl Workspace {
    /// Create an empty workspace for `repo`
    pub fn create(repo: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&prefix_for(repo))
            .tempdir()
            .map_err(Error::Workspace)?;
        log::debug!("workspace for {} at {}", repo, dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        log::debug!("removing workspace {}", self.dir.path().display());
    }
}

//! Search and replace operator: regex substitutions over globbed files

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::context::OperatorContext;
use crate::error::{Error, Result};
use crate::types::ApplyResult;

use super::Operator;

/// Plan key for search and replace steps
pub const KIND: &str = "editor";

/// Repository metadata directory, never edited
const GIT_DIR: &str = ".git";

/// One substitution rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Regular expression to search for
    pub search: String,
    /// Replacement text; `$1` and `${name}` refer to capture groups
    pub replace: String,
}

impl Replacement {
    pub fn new(search: &str, replace: &str) -> Self {
        Self {
            search: search.to_string(),
            replace: replace.to_string(),
        }
    }
}

/// Applies ordered regex replacements to files matched by relative globs
#[derive(Debug, Clone)]
pub struct SearchReplaceOperator {
    pub targets: Vec<String>,
    pub replacements: Vec<Replacement>,
}

impl SearchReplaceOperator {
    pub fn new(targets: Vec<String>, replacements: Vec<Replacement>) -> Self {
        Self {
            targets,
            replacements,
        }
    }

    fn compile(&self) -> Result<Vec<(Regex, &[u8])>> {
        self.replacements
            .iter()
            .map(|r| {
                Regex::new(&r.search)
                    .map(|re| (re, r.replace.as_bytes()))
                    .map_err(|e| Error::InvalidPlan(format!("invalid regex {:?}: {}", r.search, e)))
            })
            .collect()
    }

    /// Expand every target glob under `dir`, in target order, without duplicates
    ///
    /// Only regular files inside the workspace are kept: symlinks, anything
    /// resolving outside `dir` and the `.git` directory are skipped.
    fn matched_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&dir.to_string_lossy());
        let canonical_dir = dir.canonicalize().map_err(|source| Error::FileAccess {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for target in &self.targets {
            let pattern = format!("{}/{}", root, target.trim_start_matches("./"));
            let paths = glob::glob(&pattern)
                .map_err(|e| Error::InvalidPlan(format!("invalid glob {:?}: {}", target, e)))?;

            for entry in paths {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    Error::FileAccess {
                        path,
                        source: e.into_error(),
                    }
                })?;
                if is_editable(&path, dir, &canonical_dir) && seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }
}

/// Whether a glob match is a regular file the operator may rewrite
fn is_editable(path: &Path, dir: &Path, canonical_dir: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(dir) else {
        return false;
    };
    if relative.components().any(|c| c.as_os_str() == GIT_DIR) {
        return false;
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_file() => {}
        _ => {
            log::debug!("skipping {}", path.display());
            return false;
        }
    }

    // A symlinked parent directory can still lead outside the workspace
    match path.canonicalize() {
        Ok(real) if real.starts_with(canonical_dir) => true,
        _ => {
            log::warn!("skipping {}: resolves outside the workspace", path.display());
            false
        }
    }
}

/// Rewrite an existing file in place, keeping its permissions
fn rewrite(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let permissions = fs::metadata(path)?.permissions();
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(contents)?;
    file.flush()?;
    fs::set_permissions(path, permissions)
}

impl Operator for SearchReplaceOperator {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!(
            "Apply {} replacement(s) to {}",
            self.replacements.len(),
            self.targets.join(", ")
        )
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.targets.is_empty() {
            return Err("editor.target must list at least one glob".to_string());
        }
        if self.replacements.is_empty() {
            return Err("editor.replacements must list at least one rule".to_string());
        }

        for target in &self.targets {
            if target.trim().is_empty() {
                return Err("editor.target entries must not be empty".to_string());
            }
            let path = Path::new(target);
            if path.is_absolute() {
                return Err(format!(
                    "editor.target {:?} must be relative to the repository root",
                    target
                ));
            }
            if path.components().any(|c| c == Component::ParentDir) {
                return Err(format!(
                    "editor.target {:?} must not leave the repository root",
                    target
                ));
            }
            glob::Pattern::new(target)
                .map_err(|e| format!("editor.target {:?} is not a valid glob: {}", target, e))?;
        }

        for replacement in &self.replacements {
            Regex::new(&replacement.search).map_err(|e| {
                format!(
                    "editor.replacements search {:?} is not a valid regex: {}",
                    replacement.search, e
                )
            })?;
        }

        Ok(())
    }

    fn apply(&self, ctx: &OperatorContext<'_>) -> Result<ApplyResult> {
        let rules = self.compile()?;
        let files = self.matched_files(ctx.dir)?;

        if files.is_empty() {
            log::warn!("no files matched {}", self.targets.join(", "));
            return Ok(ApplyResult::NoChange);
        }

        let mut modified = HashSet::new();
        for (regex, replace) in &rules {
            for path in &files {
                let original = fs::read(path).map_err(|source| Error::FileAccess {
                    path: path.clone(),
                    source,
                })?;

                let replaced = regex.replace_all(&original, *replace);
                if *replaced == *original {
                    continue;
                }

                rewrite(path, &replaced).map_err(|source| Error::FileAccess {
                    path: path.clone(),
                    source,
                })?;
                log::debug!("rewrote {}", path.display());
                modified.insert(path);
            }
        }

        if modified.is_empty() {
            Ok(ApplyResult::NoChange)
        } else {
            Ok(ApplyResult::Modified {
                files: modified.len(),
            })
        }
    }
}

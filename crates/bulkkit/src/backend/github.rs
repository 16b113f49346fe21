//! GitHub backend using the `gh` command line client.

use std::path::Path;

use crate::backend::{CodeHost, PullRequest};
use crate::error::{Error, Result};
use crate::plan::RepositoriesMatch;
use crate::runner;

/// Backend that executes real `gh` commands.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl GhCli {
    pub fn new() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }

    /// Use a different gh executable.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for `gh search code` built from the plan's filters
pub fn search_args(query: &RepositoriesMatch, limit: usize) -> Vec<String> {
    let mut args = vec!["search".to_string(), "code".to_string()];

    let search = query.search.trim();
    if !search.is_empty() {
        args.push(search.to_string());
    }

    let mut flag = |name: &str, value: &str| {
        let value = value.trim();
        if !value.is_empty() {
            args.push(format!("--{}", name));
            args.push(value.to_string());
        }
    };
    flag("extension", &query.extension);
    flag("filename", &query.filename);
    flag("language", &query.language);
    for owner in &query.owners {
        flag("owner", owner);
    }
    for repo in &query.repos {
        flag("repo", repo);
    }
    flag("size", &query.size);

    args.extend([
        "--limit".to_string(),
        limit.to_string(),
        "--json".to_string(),
        "repository".to_string(),
        "--jq".to_string(),
        ".[].repository.nameWithOwner".to_string(),
    ]);
    args
}

/// Parse the `--jq length` count printed by `gh pr list`
fn parse_count(stdout: &str) -> Result<usize> {
    let trimmed = stdout.trim();
    trimmed.parse().map_err(|_| Error::RemoteQuery {
        message: format!("unexpected pull request count {:?}", trimmed),
    })
}

impl CodeHost for GhCli {
    fn open_pull_requests(&self, dir: &Path, head: &str) -> Result<usize> {
        let args = [
            "pr", "list", "--head", head, "--state", "open", "--json", "number", "--jq", "length",
        ];
        let output = runner::output(&self.program, &args, Some(dir))?;
        if !output.success {
            return Err(Error::RemoteQuery {
                message: format!(
                    "gh pr list failed ({}): {}",
                    output.status_label(),
                    output.stderr_str().trim()
                ),
            });
        }
        parse_count(&output.stdout_str())
    }

    fn create_pull_request(&self, dir: &Path, request: &PullRequest<'_>) -> Result<()> {
        let url = runner::run_capture(
            &self.program,
            &[
                "pr",
                "create",
                "--head",
                request.head,
                "--title",
                request.title,
                "--body",
                request.body,
                "--assignee",
                request.assignee,
            ],
            Some(dir),
        )?;
        log::info!("opened {}", url.trim());
        Ok(())
    }

    fn enable_auto_merge(&self, dir: &Path, head: &str) -> Result<()> {
        runner::run_capture(
            &self.program,
            &["pr", "merge", "--auto", "--squash", "--delete-branch", head],
            Some(dir),
        )?;
        Ok(())
    }

    fn search_repositories(&self, query: &RepositoriesMatch, limit: usize) -> Result<Vec<String>> {
        let args = search_args(query, limit);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = runner::output(&self.program, &args, None)?;
        if !output.success {
            return Err(Error::RemoteQuery {
                message: format!(
                    "gh search code failed ({}): {}",
                    output.status_label(),
                    output.stderr_str().trim()
                ),
            });
        }

        Ok(output
            .stdout_str()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

//! Real git backend using `git` commands.

use std::path::Path;

use crate::backend::{CommitMessage, Git, REMOTE};
use crate::error::{Error, Result};
use crate::runner;

/// Exit status of `git ls-remote --exit-code` when no ref matched
const LS_REMOTE_NOT_FOUND: i32 = 2;

/// Backend that executes real `git` commands.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a different git executable.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        runner::run_capture(&self.program, args, Some(dir))
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Git for GitCli {
    fn init(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["init", "--quiet", "."])?;
        Ok(())
    }

    fn add_remote(&self, dir: &Path, url: &str) -> Result<()> {
        self.run(dir, &["remote", "add", REMOTE, url])?;
        Ok(())
    }

    fn remote_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        let args = ["ls-remote", "--exit-code", "--heads", REMOTE, branch];
        let output = runner::output(&self.program, &args, Some(dir))?;

        match output.code {
            Some(0) => Ok(true),
            Some(LS_REMOTE_NOT_FOUND) => Ok(false),
            _ => Err(Error::RemoteQuery {
                message: format!(
                    "git ls-remote for {} failed ({}): {}",
                    branch,
                    output.status_label(),
                    output.stderr_str().trim()
                ),
            }),
        }
    }

    fn fetch_head(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["fetch", "--quiet", "--depth", "1", REMOTE, "HEAD"])?;
        Ok(())
    }

    fn create_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        self.run(dir, &["switch", "--quiet", "--create", branch, "FETCH_HEAD"])?;
        Ok(())
    }

    fn stage_all(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["add", "--all", "."])?;
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &CommitMessage<'_>) -> Result<()> {
        let mut args = vec!["commit", "--quiet", "--message", message.title];
        if !message.body.trim().is_empty() {
            args.extend(["--message", message.body]);
        }
        args.extend(["--trailer", message.trailer]);
        self.run(dir, &args)?;
        Ok(())
    }

    fn show_head(&self, dir: &Path) -> Result<String> {
        self.run(
            dir,
            &[
                "--no-pager",
                "show",
                "--stat",
                "--patch",
                "--pretty=fuller",
                "HEAD",
            ],
        )
    }

    fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        self.run(dir, &["push", "--quiet", "--set-upstream", REMOTE, branch])?;
        Ok(())
    }
}

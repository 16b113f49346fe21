//! Backend abstraction for version control and code hosting.
//!
//! The [`Git`] and [`CodeHost`] traits define everything the lifecycle needs
//! from the outside world, allowing for different implementations (the real
//! `git` and `gh` executables, or in-memory fakes for testing).

pub mod git;
pub mod github;

use std::path::Path;

use crate::error::Result;
use crate::plan::RepositoriesMatch;

pub use git::GitCli;
pub use github::GhCli;

/// Name of the remote every workspace pushes to
pub const REMOTE: &str = "origin";

/// Version control operations on a local workspace.
///
/// Every call takes the workspace directory explicitly.
pub trait Git: Send + Sync {
    /// Initialise an empty repository in `dir`.
    fn init(&self, dir: &Path) -> Result<()>;

    /// Register `url` as the `origin` remote.
    fn add_remote(&self, dir: &Path, url: &str) -> Result<()>;

    /// Whether `branch` exists on `origin`.
    ///
    /// `Ok(false)` only when the remote explicitly reports the branch as
    /// missing; any other failure is an error.
    fn remote_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool>;

    /// Shallow-fetch the remote default branch head into `FETCH_HEAD`.
    fn fetch_head(&self, dir: &Path) -> Result<()>;

    /// Create `branch` at `FETCH_HEAD` and switch to it.
    fn create_branch(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Stage every change in the working tree.
    fn stage_all(&self, dir: &Path) -> Result<()>;

    /// Commit the staged changes.
    fn commit(&self, dir: &Path, message: &CommitMessage<'_>) -> Result<()>;

    /// Render the `HEAD` commit as stat plus patch.
    fn show_head(&self, dir: &Path) -> Result<String>;

    /// Push `branch` to `origin` with upstream tracking.
    fn push(&self, dir: &Path, branch: &str) -> Result<()>;
}

/// Pull request and search operations on the hosting platform.
pub trait CodeHost: Send + Sync {
    /// Number of open pull requests whose head is `head`.
    fn open_pull_requests(&self, dir: &Path, head: &str) -> Result<usize>;

    /// Open a pull request.
    fn create_pull_request(&self, dir: &Path, request: &PullRequest<'_>) -> Result<()>;

    /// Enable squash auto-merge, deleting the branch once merged.
    fn enable_auto_merge(&self, dir: &Path, head: &str) -> Result<()>;

    /// Repositories (`owner/name`) containing code that matches `query`,
    /// in the order the host returns them. May contain duplicates.
    fn search_repositories(&self, query: &RepositoriesMatch, limit: usize) -> Result<Vec<String>>;
}

/// Commit message parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitMessage<'a> {
    pub title: &'a str,
    pub body: &'a str,
    /// `Key:value` trailer appended to the message
    pub trailer: &'a str,
}

/// Pull request to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequest<'a> {
    pub head: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub assignee: &'a str,
}

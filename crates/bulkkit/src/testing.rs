//! In-memory remote used by lifecycle and engine tests
//!
//! `FakeRemote` implements both backends. It keeps branch and pull request
//! state per repository, writes a seeded checkout on fetch, snapshots the
//! seeded files on commit and records every call. Targets built with the
//! `{repo}` remote template make the remote URL equal the repository name.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{CodeHost, CommitMessage, Git, PullRequest};
use crate::error::{Error, Result};
use crate::plan::RepositoriesMatch;

/// Seeded file present in every fetched checkout
pub const README: &str = "README.md";
const README_CONTENTS: &str = "uses eslint@8\n";

#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub repo: String,
    pub title: String,
    pub body: String,
    pub trailer: String,
    /// Seeded files as they were at commit time
    pub files: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    remotes: HashMap<PathBuf, String>,
    branches: HashSet<(String, String)>,
    prs: HashMap<(String, String), usize>,
    commits: Vec<CommitRecord>,
    calls: Vec<String>,
    failures: HashSet<String>,
    seed: BTreeMap<String, String>,
    search: Vec<String>,
    workspaces: Vec<PathBuf>,
}

impl State {
    fn repo(&self, dir: &Path) -> String {
        self.remotes.get(dir).cloned().unwrap_or_default()
    }

    /// Log a call and fail it if `op` was marked as failing
    fn record(&mut self, op: &str, call: String) -> Result<()> {
        self.calls.push(call);
        if self.failures.contains(op) {
            return Err(Error::CommandFailed {
                command: op.to_string(),
                status: "exit code 1".to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Self {
        let mut state = State::default();
        state
            .seed
            .insert(README.to_string(), README_CONTENTS.to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_branch(&self, repo: &str, branch: &str) {
        self.lock()
            .branches
            .insert((repo.to_string(), branch.to_string()));
    }

    pub fn add_open_pr(&self, repo: &str, branch: &str) {
        *self
            .lock()
            .prs
            .entry((repo.to_string(), branch.to_string()))
            .or_default() += 1;
    }

    pub fn has_branch(&self, repo: &str, branch: &str) -> bool {
        self.lock()
            .branches
            .contains(&(repo.to_string(), branch.to_string()))
    }

    pub fn open_prs(&self, repo: &str, branch: &str) -> usize {
        self.lock()
            .prs
            .get(&(repo.to_string(), branch.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Make every later call of `op` fail
    pub fn fail(&self, op: &str) {
        self.lock().failures.insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn set_search_results(&self, repos: &[&str]) {
        self.lock().search = repos.iter().map(|r| r.to_string()).collect();
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn commits(&self) -> Vec<CommitRecord> {
        self.lock().commits.clone()
    }

    pub fn last_commit(&self) -> Option<CommitRecord> {
        self.lock().commits.last().cloned()
    }

    /// Every workspace directory that was initialised
    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.lock().workspaces.clone()
    }
}

impl Git for FakeRemote {
    fn init(&self, dir: &Path) -> Result<()> {
        let mut state = self.lock();
        state.workspaces.push(dir.to_path_buf());
        state.record("init", "init".to_string())
    }

    fn add_remote(&self, dir: &Path, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.remotes.insert(dir.to_path_buf(), url.to_string());
        state.record("remote", format!("remote add {}", url))
    }

    fn remote_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.calls.push(format!("ls-remote {} {}", repo, branch));
        if state.failures.contains("ls-remote") {
            return Err(Error::RemoteQuery {
                message: "could not read from remote repository".to_string(),
            });
        }
        Ok(state.branches.contains(&(repo, branch.to_string())))
    }

    fn fetch_head(&self, dir: &Path) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("fetch", format!("fetch {}", repo))?;
        for (name, contents) in &state.seed {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
        }
        Ok(())
    }

    fn create_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("switch", format!("switch {} {}", repo, branch))
    }

    fn stage_all(&self, _dir: &Path) -> Result<()> {
        self.lock().record("add", "add".to_string())
    }

    fn commit(&self, dir: &Path, message: &CommitMessage<'_>) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("commit", format!("commit {}", repo))?;

        let files = state
            .seed
            .keys()
            .filter_map(|name| {
                fs::read_to_string(dir.join(name))
                    .ok()
                    .map(|contents| (name.clone(), contents))
            })
            .collect();
        state.commits.push(CommitRecord {
            repo,
            title: message.title.to_string(),
            body: message.body.to_string(),
            trailer: message.trailer.to_string(),
            files,
        });
        Ok(())
    }

    fn show_head(&self, dir: &Path) -> Result<String> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("show", format!("show {}", repo))?;
        let title = state
            .commits
            .last()
            .map(|c| c.title.clone())
            .unwrap_or_default();
        Ok(format!("commit 0000000\n\n    {}\n", title))
    }

    fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("push", format!("push {} {}", repo, branch))?;
        state.branches.insert((repo, branch.to_string()));
        Ok(())
    }
}

impl CodeHost for FakeRemote {
    fn open_pull_requests(&self, dir: &Path, head: &str) -> Result<usize> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("pr list", format!("pr list {} {}", repo, head))?;
        Ok(state
            .prs
            .get(&(repo, head.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn create_pull_request(&self, dir: &Path, request: &PullRequest<'_>) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record(
            "pr create",
            format!(
                "pr create {} {} assignee={}",
                repo, request.head, request.assignee
            ),
        )?;
        *state
            .prs
            .entry((repo, request.head.to_string()))
            .or_default() += 1;
        Ok(())
    }

    fn enable_auto_merge(&self, dir: &Path, head: &str) -> Result<()> {
        let mut state = self.lock();
        let repo = state.repo(dir);
        state.record("auto-merge", format!("auto-merge {} {}", repo, head))
    }

    fn search_repositories(&self, _query: &RepositoriesMatch, limit: usize) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.record("search", format!("search limit={}", limit))?;
        Ok(state.search.iter().take(limit).cloned().collect())
    }
}

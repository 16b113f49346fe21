//! Per-repository lifecycle state machine
//!
//! Each target repository is driven through a fixed sequence of phases:
//!
//! ```text
//! Init -> IdempotencyCheck -> Fetch -> Branch -> ApplyOperators -> Commit
//!      -> PreviewAndConfirm -> Push -> PullRequestReconcile -> CreatePullRequest
//! ```
//!
//! Two remote facts make reruns safe. If the branch already exists on the
//! remote, everything up to and including Push is skipped and the machine
//! jumps straight to PullRequestReconcile. If an open pull request already
//! exists for the branch, the repository is done.

use std::fmt;
use std::path::Path;

use crate::backend::{CodeHost, CommitMessage, Git, PullRequest};
use crate::context::{ConfirmCallback, OperatorContext, Reporter};
use crate::error::{Error, Result};
use crate::plan::ChangeSet;
use crate::targets::RepositoryTarget;
use crate::types::Outcome;
use crate::workspace::Workspace;

/// Lifecycle phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    IdempotencyCheck,
    Fetch,
    Branch,
    ApplyOperators,
    Commit,
    PreviewAndConfirm,
    Push,
    PullRequestReconcile,
    CreatePullRequest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "workspace setup",
            Self::IdempotencyCheck => "idempotency check",
            Self::Fetch => "fetch",
            Self::Branch => "branch",
            Self::ApplyOperators => "apply",
            Self::Commit => "commit",
            Self::PreviewAndConfirm => "preview",
            Self::Push => "push",
            Self::PullRequestReconcile => "pull request reconcile",
            Self::CreatePullRequest => "pull request creation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Next(Phase),
    Done(Outcome),
}

/// Mutable state of one lifecycle run
struct Run<'w> {
    dir: &'w Path,
    branch: String,
    /// The branch was found on the remote, so this run only reconciles
    resumed: bool,
}

/// Drives one repository from an empty workspace to an open pull request
pub struct RepositoryLifecycle<'a> {
    target: &'a RepositoryTarget,
    change: &'a ChangeSet,
    git: &'a dyn Git,
    host: &'a dyn CodeHost,
    auto_confirm: bool,
    assignee: &'a str,
}

impl<'a> RepositoryLifecycle<'a> {
    pub fn new(
        target: &'a RepositoryTarget,
        change: &'a ChangeSet,
        git: &'a dyn Git,
        host: &'a dyn CodeHost,
    ) -> Self {
        Self {
            target,
            change,
            git,
            host,
            auto_confirm: false,
            assignee: "@me",
        }
    }

    /// Skip the confirmation prompt
    pub fn auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    /// Pull request assignee
    pub fn assignee(mut self, assignee: &'a str) -> Self {
        self.assignee = assignee;
        self
    }

    /// Run every phase to completion
    ///
    /// The workspace is removed before this returns, on success and on
    /// failure alike. Errors carry the phase they happened in.
    pub fn run(
        &self,
        confirm: &mut dyn ConfirmCallback,
        reporter: &mut dyn Reporter,
    ) -> Result<Outcome> {
        let workspace =
            Workspace::create(&self.target.name).map_err(|e| e.in_phase(Phase::Init))?;
        let mut run = Run {
            dir: workspace.path(),
            branch: self.change.branch_name(),
            resumed: false,
        };

        let mut phase = Phase::Init;
        loop {
            log::debug!("{}: {}", self.target, phase);
            reporter.on_phase(self.target, phase);

            match self
                .step(phase, &mut run, confirm, reporter)
                .map_err(|e| e.in_phase(phase))?
            {
                Transition::Next(next) => phase = next,
                Transition::Done(outcome) => {
                    log::info!("{}: {}", self.target, outcome);
                    return Ok(outcome);
                }
            }
        }
    }

    fn step(
        &self,
        phase: Phase,
        run: &mut Run<'_>,
        confirm: &mut dyn ConfirmCallback,
        reporter: &mut dyn Reporter,
    ) -> Result<Transition> {
        let dir = run.dir;
        let next = match phase {
            Phase::Init => {
                self.git.init(dir)?;
                self.git.add_remote(dir, &self.target.remote_url)?;
                Transition::Next(Phase::IdempotencyCheck)
            }
            Phase::IdempotencyCheck => {
                if self.git.remote_branch_exists(dir, &run.branch)? {
                    log::info!(
                        "{}: branch {} already on remote, skipping to pull request",
                        self.target,
                        run.branch
                    );
                    run.resumed = true;
                    Transition::Next(Phase::PullRequestReconcile)
                } else {
                    Transition::Next(Phase::Fetch)
                }
            }
            Phase::Fetch => {
                self.git.fetch_head(dir)?;
                Transition::Next(Phase::Branch)
            }
            Phase::Branch => {
                self.git.create_branch(dir, &run.branch)?;
                Transition::Next(Phase::ApplyOperators)
            }
            Phase::ApplyOperators => {
                self.apply_operators(dir, reporter)?;
                Transition::Next(Phase::Commit)
            }
            Phase::Commit => {
                self.git.stage_all(dir)?;
                self.git.commit(
                    dir,
                    &CommitMessage {
                        title: &self.change.title,
                        body: &self.change.body,
                        trailer: &self.change.trailer(),
                    },
                )?;
                Transition::Next(Phase::PreviewAndConfirm)
            }
            Phase::PreviewAndConfirm => {
                let preview = self.git.show_head(dir)?;
                reporter.on_preview(self.target, &preview);

                if !self.auto_confirm {
                    let prompt = format!(
                        "Push {} to {} and open a pull request?",
                        run.branch, self.target
                    );
                    if !confirm.confirm(&prompt)? {
                        return Err(Error::UserDeclined);
                    }
                }
                Transition::Next(Phase::Push)
            }
            Phase::Push => {
                self.git.push(dir, &run.branch)?;
                Transition::Next(Phase::PullRequestReconcile)
            }
            Phase::PullRequestReconcile => {
                let open = self.host.open_pull_requests(dir, &run.branch)?;
                if open > 0 {
                    log::info!(
                        "{}: {} open pull request(s) for {}",
                        self.target,
                        open,
                        run.branch
                    );
                    Transition::Done(Outcome::AlreadyApplied)
                } else {
                    Transition::Next(Phase::CreatePullRequest)
                }
            }
            Phase::CreatePullRequest => {
                self.host.create_pull_request(
                    dir,
                    &PullRequest {
                        head: &run.branch,
                        title: &self.change.title,
                        body: &self.change.body,
                        assignee: self.assignee,
                    },
                )?;
                self.host.enable_auto_merge(dir, &run.branch)?;
                Transition::Done(if run.resumed {
                    Outcome::Resumed
                } else {
                    Outcome::Created
                })
            }
        };
        Ok(next)
    }

    fn apply_operators(&self, dir: &Path, reporter: &mut dyn Reporter) -> Result<()> {
        let ctx = OperatorContext::new(dir);
        for (index, operator) in self.change.operators.iter().enumerate() {
            log::debug!("{}: step {}: {}", self.target, index, operator.description());
            let result = operator.apply(&ctx).map_err(|source| Error::Step {
                index,
                kind: operator.kind(),
                source: Box::new(source),
            })?;
            reporter.on_step_complete(self.target, index, &result);
        }
        Ok(())
    }
}

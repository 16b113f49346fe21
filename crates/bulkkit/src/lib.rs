//! # Bulkkit
//!
//! Apply one declarative change to many repositories, one pull request each.
//!
//! A [`Plan`] names target repositories, an ordered list of steps and a
//! commit. The [`Engine`] compiles it once (template injection, then one
//! validated [`Operator`] per step) and drives every target through a
//! [`RepositoryLifecycle`]. Reruns are safe: the branch `bulk/<id>` and the
//! open pull request for it are the only state, and both are checked before
//! anything is mutated.
//!
//! ## Core Concepts
//!
//! - **Operator**: one unit of repository mutation (script or search/replace)
//! - **ChangeSet**: the compiled plan, shared by every repository
//! - **RepositoryLifecycle**: the per-repository state machine
//! - **Git / CodeHost**: the version-control and hosting collaborators
//!
//! ## Example
//!
//! ```ignore
//! use bulkkit::{AutoConfirm, Engine, EngineOptions, GhCli, GitCli, Plan, Silent};
//!
//! let plan = Plan::from_path("plan.yml".as_ref())?;
//! let (git, gh) = (GitCli::new(), GhCli::new());
//! let engine = Engine::new(plan, &git, &gh, EngineOptions::default())?;
//! let summary = engine.execute(&mut AutoConfirm, &mut Silent)?;
//! println!("{} pull request(s) opened", summary.total_changes());
//! ```

pub mod backend;
pub mod context;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod operator;
pub mod plan;
pub mod runner;
pub mod targets;
pub mod template;
pub mod types;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{CodeHost, CommitMessage, GhCli, Git, GitCli, PullRequest};
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, LineConfirm, OperatorContext, Reporter, Silent,
    is_affirmative,
};
pub use engine::{DEFAULT_ASSIGNEE, DEFAULT_SEARCH_LIMIT, Engine, EngineOptions};
pub use error::{Error, ErrorCategory, Result};
pub use lifecycle::{Phase, RepositoryLifecycle};
pub use operator::{BoxedOperator, Operator, OperatorSettings};
pub use plan::{ChangeSet, Plan, PlanFormat, RepositoriesMatch};
pub use targets::{DEFAULT_REMOTE_URL, REPO_PLACEHOLDER, RepositoryTarget};
pub use template::TemplateRenderer;
pub use types::{ApplyResult, Outcome, RunSummary};

//! Error types for plan compilation and repository processing.
//!
//! Errors are categorized so the caller can tell a broken plan (nothing was
//! touched) from a failure inside one repository's lifecycle. Context
//! wrappers (`Repository`, `Phase`, `Step`) record where a failure happened
//! without changing what kind of failure it is; [`Error::root`] walks past
//! them.

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::Phase;

/// Result type for bulkkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors, following the run/repository split of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The plan or target set is unusable; no repository was touched
    Run,
    /// A single repository's lifecycle failed
    Repository,
    /// The user declined the previewed change
    Declined,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Run => "Plan could not be executed",
            Self::Repository => "Repository processing failed",
            Self::Declined => "Change declined",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Run => "Fix the plan file and run it again",
            Self::Repository => {
                "Fix the cause and rerun the plan; finished repositories are skipped"
            }
            Self::Declined => "Rerun the plan when you are ready to push the change",
        }
    }
}

/// Errors that can occur while compiling or executing a plan.
#[derive(Debug, Error)]
pub enum Error {
    /// Plan document could not be decoded
    #[error("failed to decode plan: {message}")]
    Decode {
        /// Decoder error message
        message: String,
    },

    /// Plan is structurally invalid
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// A template failed to parse or render
    #[error("failed to render {field}: {source}")]
    Template {
        /// Plan field being rendered, e.g. `commit.title`
        field: String,
        #[source]
        source: minijinja::Error,
    },

    /// A step populates more than one operator kind
    #[error("step {index} declares more than one operator: {kinds}")]
    MultipleOperators {
        /// Zero-based step index
        index: usize,
        /// Comma separated operator kinds found on the step
        kinds: String,
    },

    /// A step populates no known operator kind
    #[error("step {index} declares no known operator (expected one of: {known})")]
    UnknownOperator {
        /// Zero-based step index
        index: usize,
        /// Comma separated registered operator kinds
        known: String,
    },

    /// Operator-specific validation failed
    #[error("step {index} ({kind}) is invalid: {reason}")]
    Validation {
        /// Zero-based step index
        index: usize,
        /// Operator kind
        kind: &'static str,
        /// What is wrong
        reason: String,
    },

    /// Target resolution produced no repositories
    #[error("no target repositories: set on.repositories or on.repositoriesMatch")]
    NoTargets,

    /// The isolated workspace could not be created
    #[error("failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// An external command could not be started
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited unsuccessfully
    #[error("command failed ({status}): {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error, if any
        stderr: String,
    },

    /// A remote query failed for a reason other than "not found"
    #[error("remote query failed: {message}")]
    RemoteQuery {
        /// What went wrong
        message: String,
    },

    /// A script step exited unsuccessfully
    #[error("script exited with {}", exit_code_label(.code))]
    ScriptExecution {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// A matched file could not be read or written
    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        /// Offending file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user declined the previewed change
    #[error("change declined by user")]
    UserDeclined,

    /// Failure of one step of the plan
    #[error("step {index} ({kind}): {source}")]
    Step {
        /// Zero-based step index
        index: usize,
        /// Operator kind
        kind: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Failure inside one lifecycle phase
    #[error("{phase}: {source}")]
    Phase {
        /// Phase in which the failure happened
        phase: Phase,
        #[source]
        source: Box<Error>,
    },

    /// Failure while processing one repository
    #[error("repository {repo}: {source}")]
    Repository {
        /// Repository identity, e.g. `owner/name`
        repo: String,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Wrap this error with the phase it happened in.
    pub fn in_phase(self, phase: Phase) -> Self {
        Self::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// Wrap this error with the repository it happened in.
    pub fn in_repository(self, repo: impl Into<String>) -> Self {
        Self::Repository {
            repo: repo.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error, past any context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Step { source, .. }
            | Self::Phase { source, .. }
            | Self::Repository { source, .. } => source.root(),
            other => other,
        }
    }

    /// The lifecycle phase recorded on this error, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            Self::Step { source, .. } | Self::Repository { source, .. } => source.phase(),
            _ => None,
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::Decode { .. }
            | Self::InvalidPlan(_)
            | Self::Template { .. }
            | Self::MultipleOperators { .. }
            | Self::UnknownOperator { .. }
            | Self::Validation { .. }
            | Self::NoTargets => ErrorCategory::Run,
            Self::UserDeclined => ErrorCategory::Declined,
            // Search failures surface before any lifecycle starts
            _ if self.phase().is_none() && !matches!(self, Self::Repository { .. }) => {
                ErrorCategory::Run
            }
            _ => ErrorCategory::Repository,
        }
    }

    /// Whether the user declined the change.
    pub fn is_declined(&self) -> bool {
        matches!(self.root(), Self::UserDeclined)
    }
}

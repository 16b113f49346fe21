//! Core types shared by operators, the lifecycle and the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Output;

/// Result of applying one operator to a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Nothing in the workspace changed
    NoChange,
    /// Files were rewritten in place
    Modified { files: usize },
    /// A script ran to completion; its effect is unknown until commit
    Executed,
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => write!(f, "no change"),
            Self::Modified { files: 1 } => write!(f, "1 file modified"),
            Self::Modified { files } => write!(f, "{} files modified", files),
            Self::Executed => write!(f, "executed"),
        }
    }
}

/// How a repository's lifecycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Branch pushed and pull request opened in this run
    Created,
    /// Branch already existed; pull request opened in this run
    Resumed,
    /// An open pull request already existed; nothing was done
    AlreadyApplied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "pull request created"),
            Self::Resumed => write!(f, "pull request created for existing branch"),
            Self::AlreadyApplied => write!(f, "already applied"),
        }
    }
}

/// Summary of a run over all target repositories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub created: usize,
    pub resumed: usize,
    pub already_applied: usize,
}

impl RunSummary {
    /// Total number of repositories processed
    pub fn total(&self) -> usize {
        self.created + self.resumed + self.already_applied
    }

    /// Number of pull requests opened by this run
    pub fn total_changes(&self) -> usize {
        self.created + self.resumed
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Resumed => self.resumed += 1,
            Outcome::AlreadyApplied => self.already_applied += 1,
        }
    }
}

/// Captured output of an external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Human-readable exit status, e.g. "exit code 2"
    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

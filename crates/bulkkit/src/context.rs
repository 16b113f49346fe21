//! Operator context and provider traits
//!
//! These traits keep the lifecycle and the engine free of any terminal:
//! confirmation and progress output are injected by the caller.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::error::Result;
use crate::lifecycle::Phase;
use crate::targets::RepositoryTarget;
use crate::types::{ApplyResult, Outcome};

/// Context passed to operator apply calls
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    /// Root of the repository checkout the operator works on
    pub dir: &'a Path,
}

impl<'a> OperatorContext<'a> {
    pub fn new(dir: &'a Path) -> Self {
        Self { dir }
    }
}

/// Confirmation callback for user interaction
///
/// Implement this trait to handle user confirmations.
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Whether a line of user input is an affirmative answer.
///
/// Only `y` and `yes` (any case, surrounding whitespace ignored) count;
/// everything else, including an empty line, is a "no".
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Line-based confirmation over any reader/writer pair
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LineConfirm<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read the answer from stdin
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConfirmCallback for LineConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.output, "{} [y/N]: ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        // End of input reads as an empty answer
        self.input.read_line(&mut line)?;
        Ok(is_affirmative(&line))
    }
}

/// Progress callback for plan execution
///
/// Implement this trait to receive progress updates during a run.
pub trait Reporter {
    /// Called before a repository's lifecycle starts
    fn on_repository_start(&mut self, target: &RepositoryTarget, position: usize, total: usize);

    /// Called when the lifecycle enters a phase
    fn on_phase(&mut self, target: &RepositoryTarget, phase: Phase);

    /// Called after each operator applied successfully
    fn on_step_complete(&mut self, target: &RepositoryTarget, index: usize, result: &ApplyResult);

    /// Called with the rendered preview of the commit, before confirmation
    fn on_preview(&mut self, target: &RepositoryTarget, preview: &str);

    /// Called when a repository's lifecycle finished successfully
    fn on_repository_complete(&mut self, target: &RepositoryTarget, outcome: Outcome);
}

/// No-op reporter
pub struct Silent;

impl Reporter for Silent {
    fn on_repository_start(&mut self, _target: &RepositoryTarget, _position: usize, _total: usize) {}
    fn on_phase(&mut self, _target: &RepositoryTarget, _phase: Phase) {}
    fn on_step_complete(&mut self, _target: &RepositoryTarget, _index: usize, _result: &ApplyResult) {}
    fn on_preview(&mut self, _target: &RepositoryTarget, _preview: &str) {}
    fn on_repository_complete(&mut self, _target: &RepositoryTarget, _outcome: Outcome) {}
}

//! Console progress output for plan runs

use bulkkit::{ApplyResult, Outcome, Phase, Reporter, RepositoryTarget};
use colored::Colorize;

use crate::ui;

/// Prints repository progress, step results and commit previews
pub struct ConsoleReporter {
    verbose: u8,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

/// One-line description of a finished repository
pub fn outcome_line(target: &RepositoryTarget, outcome: Outcome) -> String {
    match outcome {
        Outcome::Created => format!("{}: pull request opened", target),
        Outcome::Resumed => format!("{}: pull request opened for existing branch", target),
        Outcome::AlreadyApplied => format!("{}: already has an open pull request", target),
    }
}

/// Result line for a finished step; `index` is zero-based
pub fn step_line(index: usize, result: &ApplyResult) -> String {
    format!("step {}: {}", index + 1, result)
}

impl Reporter for ConsoleReporter {
    fn on_repository_start(&mut self, target: &RepositoryTarget, position: usize, total: usize) {
        if !self.quiet {
            println!();
            ui::step(position, total, &target.name.bold().to_string());
        }
    }

    fn on_phase(&mut self, _target: &RepositoryTarget, phase: Phase) {
        if self.verbose > 0 && !self.quiet {
            ui::dim(&format!("→ {}", phase));
        }
    }

    fn on_step_complete(&mut self, _target: &RepositoryTarget, index: usize, result: &ApplyResult) {
        if !self.quiet {
            ui::dim(&step_line(index, result));
        }
    }

    fn on_preview(&mut self, _target: &RepositoryTarget, preview: &str) {
        // Shown even when quiet: it is what the prompt asks about
        println!();
        println!("{}", ui::indent(preview.trim_end(), "    "));
        println!();
    }

    fn on_repository_complete(&mut self, target: &RepositoryTarget, outcome: Outcome) {
        if self.quiet {
            return;
        }
        match outcome {
            Outcome::AlreadyApplied => ui::info(&outcome_line(target, outcome)),
            Outcome::Created | Outcome::Resumed => ui::success(&outcome_line(target, outcome)),
        }
    }
}

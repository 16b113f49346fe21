//! Top-level coordinator
//!
//! The engine compiles a plan once, resolves its targets, and runs one
//! [`RepositoryLifecycle`] per repository, sequentially. The first failure
//! stops the batch; repositories already processed keep their pull requests.

use crate::backend::{CodeHost, Git};
use crate::context::{ConfirmCallback, Reporter};
use crate::error::Result;
use crate::lifecycle::RepositoryLifecycle;
use crate::operator::OperatorSettings;
use crate::plan::{ChangeSet, On, Plan};
use crate::targets::{self, DEFAULT_REMOTE_URL, RepositoryTarget};
use crate::template::TemplateRenderer;
use crate::types::RunSummary;

/// Default pull request assignee
pub const DEFAULT_ASSIGNEE: &str = "@me";

/// Default maximum number of code search results
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Options controlling plan execution
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Push without asking for confirmation
    pub auto_confirm: bool,
    /// Remote URL template with a `{repo}` placeholder
    pub remote_url_template: String,
    /// Pull request assignee
    pub assignee: String,
    /// Interpreter for script steps
    pub shell: String,
    /// Maximum number of code search results
    pub search_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            auto_confirm: false,
            remote_url_template: DEFAULT_REMOTE_URL.to_string(),
            assignee: DEFAULT_ASSIGNEE.to_string(),
            shell: OperatorSettings::default().shell,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// A compiled plan bound to its collaborators
pub struct Engine<'a> {
    change: ChangeSet,
    on: On,
    git: &'a dyn Git,
    host: &'a dyn CodeHost,
    options: EngineOptions,
}

impl<'a> Engine<'a> {
    /// Validate, render and compile `plan`
    ///
    /// Nothing outside the process is touched; every plan error surfaces
    /// here, before the first repository is processed.
    pub fn new(
        mut plan: Plan,
        git: &'a dyn Git,
        host: &'a dyn CodeHost,
        options: EngineOptions,
    ) -> Result<Self> {
        plan.validate()?;
        plan.inject(&TemplateRenderer::new())?;

        let settings = OperatorSettings {
            shell: options.shell.clone(),
        };
        let change = plan.compile(&settings)?;
        log::debug!(
            "compiled plan {} into {} step(s)",
            change.id,
            change.operators.len()
        );

        Ok(Self {
            change,
            on: plan.on,
            git,
            host,
            options,
        })
    }

    /// The compiled change applied to every repository
    pub fn change(&self) -> &ChangeSet {
        &self.change
    }

    /// Resolve the target repositories
    pub fn resolve_targets(&self) -> Result<Vec<RepositoryTarget>> {
        targets::resolve(
            &self.on,
            self.host,
            &self.options.remote_url_template,
            self.options.search_limit,
        )
    }

    /// Apply the change to every target, stopping at the first failure
    pub fn execute(
        &self,
        confirm: &mut dyn ConfirmCallback,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        let targets = self.resolve_targets()?;
        log::info!(
            "applying {} to {} repositories",
            self.change.branch_name(),
            targets.len()
        );

        let mut summary = RunSummary::default();
        for (position, target) in targets.iter().enumerate() {
            reporter.on_repository_start(target, position + 1, targets.len());

            let outcome = RepositoryLifecycle::new(target, &self.change, self.git, self.host)
                .auto_confirm(self.options.auto_confirm)
                .assignee(&self.options.assignee)
                .run(confirm, reporter)
                .map_err(|e| e.in_repository(target.name.as_str()))?;

            reporter.on_repository_complete(target, outcome);
            summary.add_outcome(outcome);
        }

        Ok(summary)
    }
}

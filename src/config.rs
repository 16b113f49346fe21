use anyhow::{Context, Result, bail};
use bulkkit::operator::script::DEFAULT_SHELL;
use bulkkit::{
    DEFAULT_ASSIGNEE, DEFAULT_REMOTE_URL, DEFAULT_SEARCH_LIMIT, EngineOptions, REPO_PLACEHOLDER,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// User Config Schema
// ============================================================================

/// User configuration, read from ~/.config/bulk/config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulkConfig {
    /// Remote URL template; `{repo}` is replaced by `owner/name`
    pub remote_url: String,

    /// Interpreter for script steps
    pub shell: String,

    /// Pull request assignee
    pub assignee: String,

    /// Maximum number of code search results
    pub search_limit: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            assignee: DEFAULT_ASSIGNEE.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl BulkConfig {
    /// Default config location
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("bulk").join("config.toml"))
    }

    /// Load the config from `path`, or from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            log::debug!("no config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file: {}", config_path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
        log::debug!("loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate TOML config text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format in bulk config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.remote_url.contains(REPO_PLACEHOLDER) {
            bail!(
                "remote_url '{}' must contain the {} placeholder",
                self.remote_url,
                REPO_PLACEHOLDER
            );
        }
        if self.shell.trim().is_empty() {
            bail!("shell must not be empty");
        }
        if self.assignee.trim().is_empty() {
            bail!("assignee must not be empty");
        }
        if self.search_limit == 0 {
            bail!("search_limit must be positive");
        }
        Ok(())
    }

    /// Engine options for a run
    pub fn engine_options(&self, auto_confirm: bool) -> EngineOptions {
        EngineOptions {
            auto_confirm,
            remote_url_template: self.remote_url.clone(),
            assignee: self.assignee.clone(),
            shell: self.shell.clone(),
            search_limit: self.search_limit,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

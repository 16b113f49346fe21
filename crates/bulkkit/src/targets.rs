//! Target repository resolution

use std::collections::HashSet;
use std::fmt;

use crate::backend::CodeHost;
use crate::error::{Error, Result};
use crate::plan::On;

/// Placeholder replaced by `owner/name` in remote URL templates
pub const REPO_PLACEHOLDER: &str = "{repo}";

/// Default remote URL template (GitHub over SSH)
pub const DEFAULT_REMOTE_URL: &str = "git@github.com:{repo}.git";

/// One repository a plan is applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Repository identity, `owner/name`
    pub name: String,
    /// URL registered as `origin`
    pub remote_url: String,
}

impl RepositoryTarget {
    pub fn new(name: &str, remote_template: &str) -> Self {
        Self {
            name: name.to_string(),
            remote_url: remote_template.replace(REPO_PLACEHOLDER, name),
        }
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Order-preserving union; blank names are skipped and the first
/// occurrence of a name wins
pub fn union<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            (!name.is_empty() && seen.insert(name.to_string())).then(|| name.to_string())
        })
        .collect()
}

/// Resolve the plan's selector into concrete targets
///
/// Explicit repositories come first, in declared order, followed by search
/// results in the order the host returned them. The search only runs when
/// at least one filter is set.
pub fn resolve(
    on: &On,
    host: &dyn CodeHost,
    remote_template: &str,
    search_limit: usize,
) -> Result<Vec<RepositoryTarget>> {
    let found = if on.repositories_match.is_empty() {
        Vec::new()
    } else {
        let found = host.search_repositories(&on.repositories_match, search_limit)?;
        log::info!("code search matched {} result(s)", found.len());
        found
    };

    let names = union(on.repositories.iter().chain(found.iter()));
    if names.is_empty() {
        return Err(Error::NoTargets);
    }

    Ok(names
        .iter()
        .map(|name| RepositoryTarget::new(name, remote_template))
        .collect())
}

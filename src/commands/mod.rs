// Plan commands
pub mod apply;
pub mod validate;

// Metadata
pub mod version;

use anyhow::{Context as _, Result};
use bulkkit::Plan;
use std::path::Path;

/// Decode a plan file and apply the optional `--key` override
pub fn load_plan(path: &Path, key: Option<&str>) -> Result<Plan> {
    let mut plan = Plan::from_path(path)
        .with_context(|| format!("Could not load plan: {}", path.display()))?;

    if let Some(key) = key {
        plan.override_id(key);
    }
    Ok(plan)
}

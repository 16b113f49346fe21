use anyhow::Result;
use bulkkit::plan::On;
use bulkkit::{ChangeSet, Engine, GhCli, GitCli, REPO_PLACEHOLDER, RepositoriesMatch};

use crate::Context;
use crate::cli::ValidateArgs;
use crate::commands::load_plan;
use crate::config::BulkConfig;
use crate::ui;

pub fn run(ctx: &Context, args: ValidateArgs) -> Result<()> {
    let config = BulkConfig::load(ctx.config.as_deref())?;
    let plan = load_plan(&args.plan, args.key.as_deref())?;
    let on = plan.on.clone();

    // Backends are never called: compiling only renders and validates
    let git = GitCli::new();
    let gh = GhCli::new();
    let engine = Engine::new(plan, &git, &gh, config.engine_options(false))?;

    if ctx.quiet {
        return Ok(());
    }

    print_change(engine.change());
    print_selector(&on, &config.remote_url);

    println!();
    ui::success(&format!("{} is valid", args.plan.display()));
    Ok(())
}

fn print_change(change: &ChangeSet) {
    ui::header("Plan");
    ui::kv("id", &change.id);
    ui::kv("branch", &change.branch_name());
    ui::kv("title", &change.title);
    if !change.body.trim().is_empty() {
        ui::kv("body", "");
        ui::dim(&ui::indent(change.body.trim_end(), "  "));
    }

    ui::header(&ui::count(change.operators.len(), "Step", "Steps"));
    for (index, operator) in change.operators.iter().enumerate() {
        ui::step(index + 1, change.operators.len(), &operator.description());
    }
}

fn print_selector(on: &On, remote_url: &str) {
    ui::header("Targets");
    for repo in on.repositories.iter().filter(|r| !r.trim().is_empty()) {
        ui::kv(repo.trim(), &remote_url.replace(REPO_PLACEHOLDER, repo.trim()));
    }
    if !on.repositories_match.is_empty() {
        ui::info(&format!(
            "plus code search: {}",
            describe_search(&on.repositories_match)
        ));
    }
    if on.repositories.iter().all(|r| r.trim().is_empty()) && on.repositories_match.is_empty() {
        ui::warn("no repositories selected; apply will fail");
    }
}

/// Human-readable summary of the search filters that are set
pub fn describe_search(query: &RepositoriesMatch) -> String {
    let mut parts = Vec::new();
    if !query.search.trim().is_empty() {
        parts.push(format!("\"{}\"", query.search.trim()));
    }
    for (name, value) in [
        ("extension", &query.extension),
        ("filename", &query.filename),
        ("language", &query.language),
        ("size", &query.size),
    ] {
        if !value.trim().is_empty() {
            parts.push(format!("{}:{}", name, value.trim()));
        }
    }
    for owner in query.owners.iter().filter(|o| !o.trim().is_empty()) {
        parts.push(format!("owner:{}", owner.trim()));
    }
    for repo in query.repos.iter().filter(|r| !r.trim().is_empty()) {
        parts.push(format!("repo:{}", repo.trim()));
    }
    parts.join(" ")
}

use anyhow::Result;
use bulkkit::{Engine, GhCli, GitCli, LineConfirm, RunSummary};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::load_plan;
use crate::config::BulkConfig;
use crate::reporter::ConsoleReporter;
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let config = BulkConfig::load(ctx.config.as_deref())?;
    let plan = load_plan(&args.plan, args.key.as_deref())?;

    let git = GitCli::new();
    let gh = GhCli::new();
    let engine = Engine::new(plan, &git, &gh, config.engine_options(args.force))?;

    if !ctx.quiet {
        ui::header(&format!("Applying {}", engine.change().branch_name()));
        ui::kv("title", &engine.change().title);
        ui::kv("steps", &engine.change().operators.len().to_string());
    }

    let mut confirm = LineConfirm::stdin();
    let mut reporter = ConsoleReporter::new(ctx.verbose, ctx.quiet);
    let summary = engine.execute(&mut confirm, &mut reporter)?;

    if !ctx.quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    ui::success(&format!(
        "Done: {} processed",
        ui::count(summary.total(), "repository", "repositories")
    ));
    if summary.created > 0 {
        ui::kv("created", &summary.created.to_string());
    }
    if summary.resumed > 0 {
        ui::kv("resumed", &summary.resumed.to_string());
    }
    if summary.already_applied > 0 {
        ui::kv("already applied", &summary.already_applied.to_string());
    }
}

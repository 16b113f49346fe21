use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bulk")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Apply bulk changes across repositories", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/bulk/config.toml)
    #[arg(long, global = true, env = "BULK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a plan to its repositories, opening one pull request each
    Apply(ApplyArgs),

    /// Check and compile a plan without contacting any remote
    Validate(ValidateArgs),

    /// Print version and build information
    Version(VersionArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Plan file (.yml, .yaml or .json)
    pub plan: PathBuf,

    /// Skip the confirmation prompt before each push
    #[arg(short, long)]
    pub force: bool,

    /// Override the plan id (and so the branch name)
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Plan file (.yml, .yaml or .json)
    pub plan: PathBuf,

    /// Override the plan id (and so the branch name)
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

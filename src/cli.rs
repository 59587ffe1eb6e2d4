//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// archfix - module dependency graph validator
///
/// Validate a set of module specifications and repair them in checkpointed rounds.
#[derive(Parser, Debug)]
#[command(
    name = "archfix",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Module dependency graph validator with a checkpointed repair loop",
    long_about = "archfix keeps a dependency graph over module specification records, \
                  reports structural defects (cycles, undefined dependencies, layering \
                  violations, responsibility overlap) and repairs them in batches that are \
                  rolled back when they make things worse.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  archfix init\n    \
                  archfix validate\n    \
                  archfix graph --cycles\n    \
                  archfix repair --max-rounds 5\n    \
                  archfix checkpoint list"
)]
pub struct Cli {
    /// Project directory (defaults to searching upward from the current directory)
    #[arg(long, short = 'p', global = true, env = "ARCHFIX_PROJECT")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project layout and a default archfix.yaml
    Init,

    /// Validate all modules and write validator_report.json
    Validate(ValidateArgs),

    /// Repair modules in checkpointed rounds
    Repair(RepairArgs),

    /// Show the dependency graph
    Graph(GraphArgs),

    /// Show the last validator report
    Report(ReportArgs),

    /// Manage checkpoints
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Validate the project:\n    archfix validate\n\n\
                  Print the report as JSON:\n    archfix validate --json")]
pub struct ValidateArgs {
    /// Print the structured report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the repair command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Repair with the configured proposer:\n    archfix repair\n\n\
                  Run every round even without improvement:\n    archfix repair --force-all-rounds\n\n\
                  Allow larger regressions per batch:\n    archfix repair --tolerance 4")]
pub struct RepairArgs {
    /// Maximum number of rounds
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rounds: Option<u32>,

    /// Keep running rounds even when they stop improving
    #[arg(long)]
    pub force_all_rounds: bool,

    /// Modules per batch
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Largest tolerated increase in issues per batch
    #[arg(long, value_name = "N")]
    pub tolerance: Option<i64>,
}

/// Arguments for the graph command
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Only list dependency cycles
    #[arg(long)]
    pub cycles: bool,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Print the raw JSON report
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// Snapshot the current module records and derived files
    Create {
        /// Label stored with the checkpoint
        #[arg(default_value = "manual")]
        tag: String,
    },

    /// List checkpoints, oldest first
    List,

    /// Restore a checkpoint
    Rollback {
        /// Checkpoint id as shown by `archfix checkpoint list` (defaults to the most recent)
        id: Option<String>,
    },

    /// Delete all but the most recent checkpoints
    Cleanup {
        /// Number of checkpoints to keep
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    archfix completions --shell bash > ~/.bash_completion.d/archfix\n\n\
                  Generate zsh completions:\n    archfix completions --shell zsh > ~/.zfunc/_archfix\n\n\
                  Generate fish completions:\n    archfix completions --shell fish > ~/.config/fish/completions/archfix.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}

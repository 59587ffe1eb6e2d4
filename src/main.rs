//! archfix - module dependency graph validator
//!
//! Validates module specification records and repairs structural defects in
//! checkpointed rounds.

use clap::Parser;

use archfix::cli::{Cli, Commands};
use archfix::{commands, logging};

/// Exit status when the command ran but the project still has issues
const EXIT_ISSUES: i32 = 2;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(cli.project).map(|()| true),
        Commands::Validate(args) => commands::validate::run(cli.project, args),
        Commands::Repair(args) => commands::repair::run(cli.project, args),
        Commands::Graph(args) => commands::graph::run(cli.project, args).map(|()| true),
        Commands::Report(args) => commands::report::run(cli.project, args).map(|()| true),
        Commands::Checkpoint(command) => {
            commands::checkpoint::run(cli.project, command).map(|()| true)
        }
        Commands::Version => commands::version::run().map(|()| true),
        Commands::Completions(args) => commands::completions::run(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_ISSUES),
        Err(e) => {
            eprintln!("Error: {}", e);
            if cli.verbose {
                eprintln!("{:?}", miette::Report::new(e));
            }
            std::process::exit(1);
        }
    }
}

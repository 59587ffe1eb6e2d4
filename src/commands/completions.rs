//! Shell completions command

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::{Cli, CompletionsArgs};
use crate::error::Result;

const SUPPORTED: &str = "bash, elvish, fish, powershell, zsh";

/// Shell for a case-insensitive name; `pwsh` is accepted for PowerShell
pub fn parse_shell(name: &str) -> Option<Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "elvish" => Some(Shell::Elvish),
        "fish" => Some(Shell::Fish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        "zsh" => Some(Shell::Zsh),
        _ => None,
    }
}

/// Generate shell completions
pub fn run(args: CompletionsArgs) -> Result<()> {
    let Some(shell) = parse_shell(&args.shell) else {
        eprintln!("Unknown shell: {}", args.shell);
        eprintln!("Supported shells: {SUPPORTED}");
        std::process::exit(1);
    };

    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "archfix", &mut std::io::stdout().lock());

    Ok(())
}

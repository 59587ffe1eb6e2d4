//! Version command implementation

use crate::config::CONFIG_FILE;
use crate::error::Result;
use crate::logging::LOG_ENV;

/// Run version command
pub fn run() -> Result<()> {
    println!("archfix {}", env!("CARGO_PKG_VERSION"));
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("Build info:");
    println!("  Minimum Rust version: {}", rust_version());
    println!("  Profile: {}", build_profile());
    println!();
    println!("Environment:");
    println!("  Configuration file: {CONFIG_FILE}");
    println!("  Log filter variable: {LOG_ENV}");

    Ok(())
}

fn rust_version() -> &'static str {
    env!("CARGO_PKG_RUST_VERSION")
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

//! Report command implementation
//!
//! Shows the last `validator_report.json` without revalidating.

use std::path::PathBuf;

use crate::cli::ReportArgs;
use crate::error::Result;
use crate::project::Project;
use crate::validator::ValidatorReport;

use super::{count, heading};

/// Print the stored report
pub fn run(project: Option<PathBuf>, args: ReportArgs) -> Result<()> {
    let project = Project::locate(project)?;
    let report = project.load_report()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ValidatorReport) {
    let counts = report.counts();

    println!("{}", heading("Counts:"));
    println!("  structure issues:              {}", counts.structure_issues);
    println!(
        "  overlapping responsibilities:  {}",
        counts.overlapping_responsibilities
    );
    println!("  undefined dependencies:        {}", counts.undefined_dependencies);
    println!("  missing modules:               {}", counts.missing_modules);
    println!("  redundant modules:             {}", counts.redundant_modules);
    println!("  total:                         {}", count(counts.total));

    let issues = report.issue_map();
    if issues.is_empty() {
        return;
    }

    println!();
    println!("{}", heading("By module:"));
    for (module, texts) in &issues {
        println!("  {module}");
        for text in texts {
            println!("    - {text}");
        }
    }
}

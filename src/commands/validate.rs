//! Validate command implementation
//!
//! Loads every module record, rebuilds the graph, runs the checks, and
//! rewrites the derived files plus `validator_report.json`.

use std::path::PathBuf;

use console::Style;

use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::project::Project;
use crate::store::ModuleRepository;
use crate::validator::{Validation, Validator};

use super::{count, heading, open_locked};

/// Run validate command; `Ok(true)` when no issue was found
pub fn run(project: Option<PathBuf>, args: ValidateArgs) -> Result<bool> {
    let (project, _guard) = open_locked(project)?;
    let validation = validate_project(&project)?;
    let report = validation.report();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation(&validation);
    }

    Ok(validation.is_clean())
}

/// Validate and persist the derived artifacts and the report
pub fn validate_project(project: &Project) -> Result<Validation> {
    let loaded = project.repository().load_all()?;
    let graph = DependencyGraph::from_modules(loaded.modules.values());
    let validation = Validator::new(project.config.validation.clone()).validate(&loaded, &graph);

    project.persist_derived(loaded.modules.values(), &graph)?;
    validation.report().save(&project.report_path())?;

    tracing::debug!(
        modules = loaded.modules.len(),
        failures = loaded.failures.len(),
        issues = validation.total(),
        "validated project"
    );
    Ok(validation)
}

fn print_validation(validation: &Validation) {
    let dim = Style::new().dim();

    if validation.is_clean() {
        println!("{}", Style::new().green().bold().apply_to("No issues found"));
    } else {
        println!("{}", heading("Issues:"));
        for issue in &validation.issues {
            println!(
                "  {} {}",
                dim.apply_to(format!("[{}]", issue.kind)),
                issue.description
            );
        }
    }

    let notes = validation.boundary.merge_suggestions.len()
        + validation.boundary.split_suggestions.len();
    if notes > 0 {
        println!();
        println!("{}", heading("Boundary notes:"));
        for merge in &validation.boundary.merge_suggestions {
            println!("  merge {}: {}", merge.modules.join(", "), merge.reason);
        }
        for split in &validation.boundary.split_suggestions {
            println!("  split {}: {}", split.module, split.reason);
        }
    }

    println!();
    println!("Total issues: {}", count(validation.total()));
}

//! Graph command implementation

use std::path::PathBuf;

use console::Style;

use crate::cli::GraphArgs;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::project::Project;
use crate::store::ModuleRepository;
use crate::validator::checks::format_cycle;

use super::heading;

/// Print the dependency graph, or only its cycles
pub fn run(project: Option<PathBuf>, args: GraphArgs) -> Result<()> {
    let project = Project::locate(project)?;
    let loaded = project.repository().load_all()?;
    let graph = DependencyGraph::from_modules(loaded.modules.values());

    if args.cycles {
        print_cycles(&graph);
    } else {
        print_graph(&graph);
    }
    Ok(())
}

fn print_cycles(graph: &DependencyGraph) {
    let cycles = graph.find_cycles(None);
    if cycles.is_empty() {
        println!("No cycles");
        return;
    }

    println!("{}", heading("Cycles:"));
    for cycle in &cycles {
        println!("  {}", format_cycle(cycle));
    }
}

fn print_graph(graph: &DependencyGraph) {
    let dim = Style::new().dim();

    if graph.is_empty() {
        println!("No modules");
        return;
    }

    println!("{}", heading("Modules:"));
    for name in graph.names() {
        let deps: Vec<String> = graph.dependencies(name).into_iter().collect();
        let label = if graph.is_placeholder(name) {
            format!("{name} {}", dim.apply_to("(undefined)"))
        } else {
            name.to_string()
        };
        if deps.is_empty() {
            println!("  {label}");
        } else {
            println!("  {label} -> {}", deps.join(", "));
        }
    }

    println!();
    match graph.topological_order() {
        Some(order) => println!("{} {}", heading("Order:"), order.join(", ")),
        None => println!(
            "{} {}",
            heading("Order:"),
            dim.apply_to("not available, graph has cycles (see --cycles)")
        ),
    }
}

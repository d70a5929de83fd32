//! Centrality report command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::error;

use ifcg_core::AppConfig;
use ifcg_graph::CentralityReporter;

use crate::output;

#[derive(Args)]
pub struct CentralityArgs {
    /// Projected graph name (defaults to the configured one)
    #[arg(long)]
    pub graph_name: Option<String>,

    /// Number of rows to keep
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Create the projection before ranking
    #[arg(long)]
    pub project: bool,

    /// Also write the report as CSV
    #[arg(long)]
    pub csv: bool,

    /// CSV path (defaults to the configured output directory and file)
    #[arg(long, requires = "csv")]
    pub out: Option<PathBuf>,
}

pub async fn execute(args: CentralityArgs, config: &AppConfig) -> Result<()> {
    let graph_name = args.graph_name.unwrap_or_else(|| config.centrality.graph_name.clone());
    let limit = args.limit.unwrap_or(config.centrality.limit);

    let reporter = CentralityReporter::new(super::connect_store(config).await?);
    if args.project {
        reporter.project(&graph_name).await?;
        println!("{} Projected graph {}", "✓".green(), graph_name.cyan());
    }

    let records = reporter.rank(&graph_name, limit).await?;
    output::print_centrality_table(&records);

    if args.csv {
        let path = args
            .out
            .unwrap_or_else(|| config.output.directory.join(&config.output.centrality_file));
        match ifcg_graph::write_csv(&records, &path) {
            Ok(()) => println!("  {} {}", "→".dimmed(), path.display()),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write centrality report");
                println!("{} {:#}", "Could not write report:".red(), e);
            }
        }
    }

    Ok(())
}

//! Graph export command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ifcg_core::AppConfig;
use ifcg_graph::IfcExporter;

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (defaults to the configured output directory and file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: ExportArgs, config: &AppConfig) -> Result<()> {
    let path = args
        .output
        .unwrap_or_else(|| config.output.directory.join(&config.output.export_file));

    let exporter = IfcExporter::new(super::connect_store(config).await?);
    let summary = exporter.export_to_file(&path).await?;

    println!("{} Exported to {}", "✓".green(), path.display().to_string().cyan());
    println!("  Entities:      {}", summary.written.to_string().bold());
    println!("  Relationships: {}", summary.relationships.to_string().bold());
    if summary.skipped > 0 {
        println!(
            "  Skipped:       {} {}",
            summary.skipped.to_string().yellow(),
            "(missing ClassName or nid)".dimmed()
        );
    }

    Ok(())
}

//! Model import command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use ifcg_core::AppConfig;
use ifcg_graph::{GraphWriter, ImportProgress};

#[derive(Args)]
pub struct ImportArgs {
    /// IFC file to import
    pub source: PathBuf,

    /// Delete every node and relationship first
    #[arg(long)]
    pub clear: bool,

    /// Skip the confirmation prompt for --clear
    #[arg(short, long)]
    pub yes: bool,

    /// Do not create lookup indexes
    #[arg(long)]
    pub no_schema: bool,
}

pub async fn execute(args: ImportArgs, config: &AppConfig) -> Result<()> {
    let model = ifcg_core::step::load_step(&args.source)?;
    if model.skipped > 0 {
        println!(
            "{} {} complex instances skipped",
            "!".yellow(),
            model.skipped.to_string().bold()
        );
    }

    let client = super::connect(config).await?;
    if !args.no_schema {
        ifcg_graph::initialize_schema(&client).await?;
    }
    let writer = GraphWriter::new(Arc::new(client));

    if args.clear {
        let confirmed = args.yes
            || Confirm::new()
                .with_prompt(format!("Delete everything in {} before importing?", config.neo4j.uri))
                .default(false)
                .interact()?;
        if !confirmed {
            println!("{}", "Import cancelled.".dimmed());
            return Ok(());
        }
        writer.clear().await?;
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg:<14} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let summary = writer
        .import_model_with_progress(&model, |event| match event {
            ImportProgress::NodesStarted(total) => {
                bar.set_message("nodes");
                bar.set_length(total as u64);
                bar.set_position(0);
            }
            ImportProgress::RelationshipsStarted(total) => {
                bar.set_message("relationships");
                bar.set_length(total as u64);
                bar.set_position(0);
            }
            ImportProgress::Nodes(done) | ImportProgress::Relationships(done) => {
                bar.set_position(done as u64)
            }
        })
        .await?;
    bar.finish_and_clear();

    println!("\n{}", "Import complete:".green().bold());
    println!("  Nodes created:         {}", summary.nodes_created.to_string().cyan());
    println!("  Relationships created: {}", summary.relationships_created.to_string().cyan());
    if summary.dangling_references > 0 {
        println!(
            "  Dangling references:   {}",
            summary.dangling_references.to_string().yellow()
        );
    }

    Ok(())
}

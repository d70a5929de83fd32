//! Entity extraction command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::error;

use ifcg_core::AppConfig;

#[derive(Args)]
pub struct ExtractArgs {
    /// IFC file to read
    pub source: PathBuf,

    /// Output directory (defaults to the configured one)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output file name (defaults to the configured one)
    #[arg(long)]
    pub file_name: Option<String>,
}

pub fn execute(args: ExtractArgs, config: &AppConfig) -> Result<()> {
    let extraction = ifcg_core::extract::extract_file(&args.source)?;

    println!(
        "{} {} walls, {} spatial structures",
        "✓".green(),
        extraction.walls.len().to_string().bold(),
        extraction.spatial_structures.len().to_string().bold()
    );

    let output_dir = args.output_dir.unwrap_or_else(|| config.output.directory.clone());
    let file_name = args.file_name.unwrap_or_else(|| config.output.extraction_file.clone());

    // a write failure is reported, not propagated
    match extraction.write_json(&output_dir, &file_name) {
        Ok(path) => println!("  {} {}", "→".dimmed(), path.display()),
        Err(e) => {
            error!(dir = %output_dir.display(), error = %e, "Failed to write extraction");
            println!("{} {}", "Could not write extraction:".red(), e);
        }
    }

    Ok(())
}

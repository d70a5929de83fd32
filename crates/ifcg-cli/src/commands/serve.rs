//! Query gateway command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ifcg_core::AppConfig;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (defaults to the configured one)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to (defaults to the configured one)
    #[arg(long)]
    pub host: Option<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to output/serve.log)
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config: &AppConfig) -> Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let store = super::connect_store(config).await?;

    println!();
    println!("  {} {}", "IFCG".cyan().bold(), "Query Gateway".bold());
    println!();
    println!("  {}  POST http://{}:{}/run-cypher", "Query".green(), host, port);
    println!("  {} GET  http://{}:{}/api/status", "Status".green(), host, port);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    ifcg_web::run_server(store, &host, port).await?;

    Ok(())
}

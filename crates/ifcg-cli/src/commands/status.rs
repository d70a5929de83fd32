//! Graph status command.

use anyhow::Result;
use colored::Colorize;

use ifcg_core::AppConfig;
use ifcg_graph::GraphStore;

/// Show node/relationship counts and labels.
pub async fn execute(config: &AppConfig) -> Result<()> {
    let client = super::connect(config).await?;

    println!("{}", "Graph Status".bold());
    println!("{}", "─".repeat(40));
    println!("  Server:        {}", config.neo4j.uri.dimmed());

    let counts = client.counts().await?;
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());

    let labels = client.labels().await?;
    if labels.is_empty() {
        println!("  Labels:        {}", "none".yellow());
    } else {
        println!("  Labels:        {}", labels.join(", "));
    }

    println!("{}", "─".repeat(40));

    Ok(())
}

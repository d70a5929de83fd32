//! Raw query command.

use anyhow::Result;
use colored::Colorize;

use ifcg_core::AppConfig;
use ifcg_graph::GraphStore;

pub async fn execute(cypher: &str, config: &AppConfig) -> Result<()> {
    let client = super::connect(config).await?;
    let results = client.run_query(cypher).await?;

    if results.is_empty() {
        println!("{}", "No results.".dimmed());
    } else {
        for (i, result) in results.iter().enumerate() {
            println!("{}: {}", (i + 1).to_string().dimmed(), result);
        }
    }

    Ok(())
}

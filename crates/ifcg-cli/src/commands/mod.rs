//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ifcg_core::AppConfig;
use ifcg_graph::{GraphClient, GraphConfig, GraphStore};

pub mod attach;
pub mod centrality;
pub mod export;
pub mod extract;
pub mod import;
pub mod query;
pub mod serve;
pub mod status;

/// IFC Graph - round trip between IFC models and a property graph
#[derive(Parser)]
#[command(name = "ifcg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./ifcg.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Neo4j Bolt URI
    #[arg(long, global = true, env = "NEO4J_URI")]
    pub neo4j_uri: Option<String>,

    /// Neo4j user
    #[arg(long, global = true, env = "NEO4J_USER")]
    pub neo4j_user: Option<String>,

    /// Neo4j password
    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub neo4j_password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract walls and spatial containment from an IFC file to JSON
    Extract(extract::ExtractArgs),

    /// Import every entity of an IFC file into the graph
    Import(import::ImportArgs),

    /// Attach an IoT device node to a model node
    Attach(attach::AttachArgs),

    /// Rank nodes by betweenness centrality
    Centrality(centrality::CentralityArgs),

    /// Export the graph back to an IFC-like file
    Export(export::ExportArgs),

    /// Execute a Cypher query
    Query {
        /// Cypher query string
        query: String,
    },

    /// Show graph status
    Status,

    /// Start the HTTP query gateway
    Serve(serve::ServeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = std::env::current_dir().context("Failed to resolve working directory")?;
        let mut config = AppConfig::load(self.config.as_deref(), &project_dir)?;

        if let Some(uri) = self.neo4j_uri {
            config.neo4j.uri = uri;
        }
        if let Some(user) = self.neo4j_user {
            config.neo4j.user = user;
        }
        if let Some(password) = self.neo4j_password {
            config.neo4j.password = password;
        }

        match self.command {
            Commands::Extract(args) => extract::execute(args, &config),
            Commands::Import(args) => import::execute(args, &config).await,
            Commands::Attach(args) => attach::execute(args, &config).await,
            Commands::Centrality(args) => centrality::execute(args, &config).await,
            Commands::Export(args) => export::execute(args, &config).await,
            Commands::Query { query } => query::execute(&query, &config).await,
            Commands::Status => status::execute(&config).await,
            Commands::Serve(args) => serve::execute(args, &config).await,
        }
    }
}

/// Connect to Neo4j with the resolved configuration.
pub async fn connect(config: &AppConfig) -> Result<GraphClient> {
    GraphClient::connect(&GraphConfig::from(&config.neo4j))
        .await
        .with_context(|| format!("Could not connect to Neo4j at {}", config.neo4j.uri))
}

/// Same as [`connect`], as a shared store handle.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn GraphStore>> {
    Ok(Arc::new(connect(config).await?))
}

//! Application configuration (`ifcg.toml`).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::IfcgResult;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ifcg.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub neo4j: Neo4jSettings,
    pub server: ServerSettings,
    pub output: OutputSettings,
    pub centrality: CentralitySettings,
}

/// Connection settings for the graph store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub extraction_file: String,
    pub export_file: String,
    pub centrality_file: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            extraction_file: "ifc_analysis.json".to_string(),
            export_file: "graph_export.ifc".to_string(),
            centrality_file: "centrality_results.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CentralitySettings {
    pub graph_name: String,
    pub limit: usize,
}

impl Default for CentralitySettings {
    fn default() -> Self {
        Self {
            graph_name: "ifcGraph".to_string(),
            limit: 10,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml(text: &str) -> IfcgResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from an explicit file, or from `ifcg.toml` in `dir` when it
    /// exists, or defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> IfcgResult<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
[neo4j]
password = "secret"

[centrality]
limit = 25
"#,
        )
        .unwrap();
        assert_eq!(config.neo4j.password, "secret");
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.centrality.limit, 25);
        assert_eq!(config.centrality.graph_name, "ifcGraph");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("[neo4j\nuri=").unwrap_err();
        assert!(matches!(err, crate::error::IfcgError::Config(_)));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.output.export_file, "graph_export.ifc");
    }

    #[test]
    fn test_load_from_directory_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[server]\nport = 8080\n").unwrap();
        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}

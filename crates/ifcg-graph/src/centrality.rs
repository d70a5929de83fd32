//! Betweenness centrality report.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use ifcg_core::model::CentralityRecord;

use crate::store::GraphStore;

/// Ranks nodes of a projected graph by betweenness centrality.
pub struct CentralityReporter {
    store: Arc<dyn GraphStore>,
}

impl CentralityReporter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Create the named projection over every node and relationship.
    pub async fn project(&self, graph_name: &str) -> Result<()> {
        self.store.project_graph(graph_name).await?;
        info!(graph = graph_name, "Graph projected");
        Ok(())
    }

    /// Top `limit` nodes by score, descending.
    ///
    /// The projection must already exist. Ties keep the store's stream
    /// order, which is not guaranteed to be stable between runs.
    pub async fn rank(&self, graph_name: &str, limit: usize) -> Result<Vec<CentralityRecord>> {
        let mut records = self
            .store
            .betweenness(graph_name, limit)
            .await
            .with_context(|| format!("Centrality over '{}' failed", graph_name))?;

        records.sort_by(|a, b| b.centrality.partial_cmp(&a.centrality).unwrap_or(Ordering::Equal));
        records.truncate(limit);

        debug!(graph = graph_name, rows = records.len(), "Centrality ranked");
        Ok(records)
    }
}

/// Write records as `id,class,centrality`. Creates the parent directory.
pub fn write_csv(records: &[CentralityRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Centrality report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LinkBatch, MemoryStore, NodeSelector};
    use ifcg_core::model::Properties;
    use serde_json::json;

    async fn star_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let rows: Vec<Properties> = (1..=4)
            .map(|nid| json!({"nid": nid, "ClassName": "IfcSpace"}).as_object().cloned().unwrap())
            .collect();
        store.create_nodes("IfcNode", rows).await.unwrap();

        let selector = NodeSelector::new("IfcNode", "nid");
        store
            .create_links(&LinkBatch {
                from: selector.clone(),
                rel_type: "ADJACENT".into(),
                to: selector,
                pairs: vec![
                    (json!(1), json!(2)),
                    (json!(2), json!(3)),
                    (json!(2), json!(4)),
                ],
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_rank_sorts_and_truncates() {
        let store = star_store().await;
        let reporter = CentralityReporter::new(store);
        reporter.project("g").await.unwrap();

        let ranked = reporter.rank("g", 2).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "2");
        assert_eq!(ranked[0].centrality, 2.0);
        assert!(ranked[0].centrality >= ranked[1].centrality);
    }

    #[tokio::test]
    async fn test_rank_without_projection_fails() {
        let reporter = CentralityReporter::new(star_store().await);
        let err = reporter.rank("absent", 10).await.unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("centrality.csv");
        let records = vec![
            CentralityRecord {
                id: "2".into(),
                class: Some("IfcSpace".into()),
                centrality: 2.0,
            },
            CentralityRecord {
                id: "MK-01".into(),
                class: None,
                centrality: 0.0,
            },
        ];

        write_csv(&records, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,class,centrality", "2,IfcSpace,2.0", "MK-01,,0.0"]);
    }
}

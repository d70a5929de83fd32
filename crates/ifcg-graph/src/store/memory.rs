//! In-process graph store.
//!
//! Holds nodes and relationships in ordered maps so fetch order is
//! insertion order. Betweenness runs through rustworkx-core on a petgraph
//! snapshot. Every mutating call bumps a write counter.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::{bail, Result};
use async_trait::async_trait;
use rustworkx_core::centrality::betweenness_centrality;
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use ifcg_core::model::{CentralityRecord, Properties, PROP_CLASS};

use super::{GraphCounts, GraphStore, LinkBatch, NodeSelector, StoredNode};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    from: i64,
    rel_type: String,
    to: i64,
}

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<i64, StoredNode>,
    relationships: Vec<Relationship>,
    projections: HashSet<String>,
    next_id: i64,
    writes: usize,
}

impl Inner {
    fn insert(&mut self, label: &str, properties: Properties) -> StoredNode {
        let node = StoredNode {
            id: self.next_id,
            labels: vec![label.to_string()],
            properties,
        };
        self.next_id += 1;
        self.nodes.insert(node.id, node.clone());
        node
    }

    fn matching(&self, selector: &NodeSelector, value: &Value) -> Vec<i64> {
        self.nodes
            .values()
            .filter(|n| n.has_label(&selector.label) && n.properties.get(&selector.key) == Some(value))
            .map(|n| n.id)
            .collect()
    }
}

/// In-memory [`GraphStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls served so far.
    pub async fn writes(&self) -> usize {
        self.inner.read().await.writes
    }

    /// Add a label to an existing node.
    pub async fn add_label(&self, id: i64, label: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(node) = inner.nodes.get_mut(&id) else {
            bail!("node {} does not exist", id);
        };
        if !node.has_label(label) {
            node.labels.push(label.to_string());
        }
        inner.writes += 1;
        Ok(())
    }

    /// Delete a node and its relationships.
    pub async fn delete_node(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let existed = inner.nodes.remove(&id).is_some();
        inner.relationships.retain(|r| r.from != id && r.to != id);
        inner.writes += 1;
        Ok(existed)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn labels(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let labels: BTreeSet<&String> = inner.nodes.values().flat_map(|n| n.labels.iter()).collect();
        Ok(labels.into_iter().cloned().collect())
    }

    async fn nodes_with_label(&self, label: &str) -> Result<Vec<StoredNode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .nodes
            .values()
            .filter(|n| n.has_label(label))
            .cloned()
            .collect())
    }

    async fn find_node(&self, selector: &NodeSelector, value: &Value) -> Result<Option<StoredNode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matching(selector, value)
            .first()
            .and_then(|id| inner.nodes.get(id))
            .cloned())
    }

    async fn create_node(&self, label: &str, properties: Properties) -> Result<StoredNode> {
        let mut inner = self.inner.write().await;
        inner.writes += 1;
        Ok(inner.insert(label, properties))
    }

    async fn create_nodes(&self, label: &str, rows: Vec<Properties>) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.writes += 1;
        let count = rows.len();
        for row in rows {
            inner.insert(label, row);
        }
        Ok(count)
    }

    async fn create_links(&self, batch: &LinkBatch) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.writes += 1;

        let mut created = 0;
        for (from_value, to_value) in &batch.pairs {
            let froms = inner.matching(&batch.from, from_value);
            let tos = inner.matching(&batch.to, to_value);
            for &from in &froms {
                for &to in &tos {
                    inner.relationships.push(Relationship {
                        from,
                        rel_type: batch.rel_type.clone(),
                        to,
                    });
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    async fn links(
        &self,
        from: &NodeSelector,
        rel_type: &str,
        to: &NodeSelector,
    ) -> Result<Vec<(Value, Value)>> {
        let inner = self.inner.read().await;
        let endpoint = |id: i64, selector: &NodeSelector| {
            inner
                .nodes
                .get(&id)
                .filter(|n| n.has_label(&selector.label))
                .map(|n| n.properties.get(&selector.key).cloned().unwrap_or(Value::Null))
        };

        Ok(inner
            .relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .filter_map(|r| Some((endpoint(r.from, from)?, endpoint(r.to, to)?)))
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.nodes.clear();
        inner.relationships.clear();
        inner.writes += 1;
        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts> {
        let inner = self.inner.read().await;
        Ok(GraphCounts {
            nodes: inner.nodes.len(),
            relationships: inner.relationships.len(),
        })
    }

    async fn project_graph(&self, graph_name: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.projections.insert(graph_name.to_string()) {
            bail!("A graph with name '{}' already exists", graph_name);
        }
        Ok(())
    }

    async fn betweenness(&self, graph_name: &str, _limit: usize) -> Result<Vec<CentralityRecord>> {
        let inner = self.inner.read().await;
        if !inner.projections.contains(graph_name) {
            bail!("Graph with name '{}' does not exist", graph_name);
        }

        let mut graph: DiGraph<i64, ()> = DiGraph::with_capacity(inner.nodes.len(), inner.relationships.len());
        let mut index: HashMap<i64, NodeIndex> = HashMap::with_capacity(inner.nodes.len());
        for id in inner.nodes.keys() {
            index.insert(*id, graph.add_node(*id));
        }
        for rel in &inner.relationships {
            if let (Some(&a), Some(&b)) = (index.get(&rel.from), index.get(&rel.to)) {
                graph.add_edge(a, b, ());
            }
        }

        let scores = betweenness_centrality(&graph, false, false, 200);
        debug!(nodes = graph.node_count(), "Computed betweenness");

        Ok(graph
            .node_indices()
            .filter_map(|ix| {
                let node = inner.nodes.get(&graph[ix])?;
                Some(CentralityRecord {
                    id: node.display_id(),
                    class: node.properties.get(PROP_CLASS).and_then(Value::as_str).map(str::to_string),
                    centrality: scores.get(ix.index()).copied().flatten().unwrap_or(0.0),
                })
            })
            .collect())
    }

    async fn run_query(&self, _query: &str) -> Result<Vec<Value>> {
        bail!("raw queries are not supported by the in-memory store")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryStore::new();
        store.create_node("IfcNode", props(json!({"nid": 3}))).await.unwrap();
        let selector = NodeSelector::new("IfcNode", "nid");

        assert!(store.find_node(&selector, &json!(3)).await.unwrap().is_some());
        assert!(store.find_node(&selector, &json!(4)).await.unwrap().is_none());
        assert_eq!(store.labels().await.unwrap(), vec!["IfcNode".to_string()]);
        assert_eq!(store.writes().await, 1);
    }

    #[tokio::test]
    async fn test_links_match_every_endpoint() {
        let store = MemoryStore::new();
        store.create_node("IfcNode", props(json!({"nid": 1}))).await.unwrap();
        store.create_node("IoTDevice", props(json!({"device_id": "A"}))).await.unwrap();
        store.create_node("IoTDevice", props(json!({"device_id": "A"}))).await.unwrap();

        let batch = LinkBatch {
            from: NodeSelector::new("IfcNode", "nid"),
            rel_type: "HAS_IOT_DEVICE".into(),
            to: NodeSelector::new("IoTDevice", "device_id"),
            pairs: vec![(json!(1), json!("A"))],
        };
        assert_eq!(store.create_links(&batch).await.unwrap(), 2);

        let pairs = store.links(&batch.from, "HAS_IOT_DEVICE", &batch.to).await.unwrap();
        assert_eq!(pairs, vec![(json!(1), json!("A")), (json!(1), json!("A"))]);
        assert_eq!(store.counts().await.unwrap().relationships, 2);
    }

    #[tokio::test]
    async fn test_betweenness_requires_projection() {
        let store = MemoryStore::new();
        let err = store.betweenness("missing", 10).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_betweenness_on_path() {
        let store = MemoryStore::new();
        let rows = (1..=3).map(|nid| props(json!({"nid": nid, "ClassName": "IfcWall"}))).collect();
        store.create_nodes("IfcNode", rows).await.unwrap();

        let selector = NodeSelector::new("IfcNode", "nid");
        let batch = LinkBatch {
            from: selector.clone(),
            rel_type: "NEXT".into(),
            to: selector,
            pairs: vec![(json!(1), json!(2)), (json!(2), json!(3))],
        };
        store.create_links(&batch).await.unwrap();
        store.project_graph("g").await.unwrap();

        let records = store.betweenness("g", 10).await.unwrap();
        let middle = records.iter().find(|r| r.id == "2").unwrap();
        assert_eq!(middle.centrality, 1.0);
        assert_eq!(middle.class.as_deref(), Some("IfcWall"));
        assert!(records.iter().filter(|r| r.id != "2").all(|r| r.centrality == 0.0));
    }

    #[tokio::test]
    async fn test_duplicate_projection_rejected() {
        let store = MemoryStore::new();
        store.project_graph("g").await.unwrap();
        assert!(store.project_graph("g").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_node_drops_relationships() {
        let store = MemoryStore::new();
        let a = store.create_node("IfcNode", props(json!({"nid": 1}))).await.unwrap();
        store.create_node("IfcNode", props(json!({"nid": 2}))).await.unwrap();
        let selector = NodeSelector::new("IfcNode", "nid");
        store
            .create_links(&LinkBatch {
                from: selector.clone(),
                rel_type: "R".into(),
                to: selector,
                pairs: vec![(json!(1), json!(2))],
            })
            .await
            .unwrap();

        assert!(store.delete_node(a.id).await.unwrap());
        assert_eq!(store.counts().await.unwrap(), GraphCounts { nodes: 1, relationships: 0 });
    }

    #[tokio::test]
    async fn test_raw_query_unsupported() {
        assert!(MemoryStore::new().run_query("RETURN 1").await.is_err());
    }
}

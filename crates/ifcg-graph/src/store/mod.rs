//! # Graph store contract
//!
//! Every component receives an explicit store handle instead of reaching
//! for a global connection. A call is one unit of work against the store;
//! multi-call sequences are not transactional.
//!
//! | Implementation | Module | Description |
//! |----------------|--------|-------------|
//! | `GraphClient` | `client` | Neo4j over Bolt (`neo4rs`) |
//! | `MemoryStore` | `memory` | In-process, for tests and offline runs |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use ifcg_core::model::{CentralityRecord, Properties, PROP_DEVICE_ID, PROP_NID};

pub use memory::MemoryStore;

/// A node as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    /// Store-internal id, stable for the node's lifetime.
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl StoredNode {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Identifier shown in reports: `nid`, else `device_id`, else the
    /// store id.
    pub fn display_id(&self) -> String {
        display_id(&self.properties, self.id)
    }
}

fn display_id(properties: &Properties, fallback: i64) -> String {
    match properties.get(PROP_NID) {
        Some(Value::Number(n)) => return n.to_string(),
        Some(Value::String(s)) => return s.clone(),
        _ => {}
    }
    match properties.get(PROP_DEVICE_ID) {
        Some(Value::String(s)) => s.clone(),
        _ => fallback.to_string(),
    }
}

/// Matches nodes by one label and one property key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelector {
    pub label: String,
    pub key: String,
}

impl NodeSelector {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }
}

/// Relationships to create between independently matched endpoints.
///
/// Each `(from, to)` pair links every `from` node whose selector property
/// equals the first value to every `to` node matching the second.
#[derive(Debug, Clone)]
pub struct LinkBatch {
    pub from: NodeSelector,
    pub rel_type: String,
    pub to: NodeSelector,
    pub pairs: Vec<(Value, Value)>,
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

/// The storage contract used by the writer, attacher, reporter, exporter
/// and the query gateway.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Every distinct node label.
    async fn labels(&self) -> Result<Vec<String>>;

    /// Every node carrying `label`.
    async fn nodes_with_label(&self, label: &str) -> Result<Vec<StoredNode>>;

    /// First node matching the selector with the given property value.
    async fn find_node(&self, selector: &NodeSelector, value: &Value) -> Result<Option<StoredNode>>;

    /// Create one node and return it.
    async fn create_node(&self, label: &str, properties: Properties) -> Result<StoredNode>;

    /// Create many nodes with the same label. Returns how many were created.
    async fn create_nodes(&self, label: &str, rows: Vec<Properties>) -> Result<usize>;

    /// Create relationships. Returns how many were created.
    async fn create_links(&self, batch: &LinkBatch) -> Result<usize>;

    /// Endpoint property pairs of every `from -[rel_type]-> to` relationship.
    async fn links(
        &self,
        from: &NodeSelector,
        rel_type: &str,
        to: &NodeSelector,
    ) -> Result<Vec<(Value, Value)>>;

    /// Delete every node and relationship.
    async fn clear(&self) -> Result<()>;

    async fn counts(&self) -> Result<GraphCounts>;

    /// Materialize a named projection over the whole graph.
    async fn project_graph(&self, graph_name: &str) -> Result<()>;

    /// Betweenness centrality over an existing projection. `limit` is a
    /// hint; callers still sort and truncate.
    async fn betweenness(&self, graph_name: &str, limit: usize) -> Result<Vec<CentralityRecord>>;

    /// Run an arbitrary query and return each row as JSON.
    async fn run_query(&self, query: &str) -> Result<Vec<Value>>;
}

/// Escape a label, key or relationship type for use between backticks.
pub fn escape_identifier(raw: &str) -> String {
    raw.replace('`', "``")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("IfcNode"), "IfcNode");
        assert_eq!(escape_identifier("IoT-Device"), "IoT-Device");
        assert_eq!(escape_identifier("Ifc Node"), "Ifc Node");
        assert_eq!(
            escape_identifier("Ifc`) DETACH DELETE n //"),
            "Ifc``) DETACH DELETE n //"
        );
    }

    #[test]
    fn test_display_id_preference() {
        let mut props = Properties::new();
        props.insert("device_id".into(), Value::from("MK-01"));
        assert_eq!(display_id(&props, 7), "MK-01");
        props.insert("nid".into(), Value::from(42));
        assert_eq!(display_id(&props, 7), "42");
        assert_eq!(display_id(&Properties::new(), 7), "7");
    }
}

//! Neo4j connection client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph, Query,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use ifcg_core::config::Neo4jSettings;
use ifcg_core::model::{CentralityRecord, Properties};

use crate::store::{escape_identifier, GraphCounts, GraphStore, LinkBatch, NodeSelector, StoredNode};

/// Rows per UNWIND statement for batched writes.
pub const BATCH_SIZE: usize = 500;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
            max_connections: settings.max_connections,
        }
    }
}

/// Client for Neo4j graph operations.
///
/// Cloning is cheap; clones share the connection pool. Each query borrows
/// one pooled connection and hands it back when the call returns, on
/// success or error.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds the pool, so a `RETURN 1` ping forces a
    /// real handshake and an unreachable server fails here instead of on
    /// first use.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(200)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        debug!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await.context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("Failed to read Neo4j result row")? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> Result<Option<T>> {
        let rows = self.query(query).await?;
        if let Some(row) = rows.into_iter().next() {
            let val: T = row
                .get(field)
                .map_err(|e| anyhow::anyhow!("Failed to get field '{}': {:?}", field, e))?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }
}

const NODE_RETURN: &str = "RETURN id(n) AS id, labels(n) AS labels, properties(n) AS props";

fn node_from_row(row: &neo4rs::Row) -> Result<StoredNode> {
    Ok(StoredNode {
        id: row.get("id").map_err(|e| anyhow::anyhow!("Missing node id: {:?}", e))?,
        labels: row.get("labels").unwrap_or_default(),
        properties: row.get("props").unwrap_or_default(),
    })
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn labels(&self) -> Result<Vec<String>> {
        let rows = self
            .query(Query::new("CALL db.labels() YIELD label RETURN label".to_string()))
            .await?;
        Ok(rows.iter().filter_map(|r| r.get::<String>("label").ok()).collect())
    }

    async fn nodes_with_label(&self, label: &str) -> Result<Vec<StoredNode>> {
        let query = Query::new(format!("MATCH (n:`{}`) {}", escape_identifier(label), NODE_RETURN));
        self.query(query).await?.iter().map(node_from_row).collect()
    }

    async fn find_node(&self, selector: &NodeSelector, value: &Value) -> Result<Option<StoredNode>> {
        let query = Query::new(format!(
            "MATCH (n:`{}`) WHERE n.`{}` = $value {} LIMIT 1",
            escape_identifier(&selector.label),
            escape_identifier(&selector.key),
            NODE_RETURN
        ))
        .param("value", to_bolt(value));

        match self.query(query).await?.first() {
            Some(row) => Ok(Some(node_from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn create_node(&self, label: &str, properties: Properties) -> Result<StoredNode> {
        let query = Query::new(format!(
            "CREATE (n:`{}`) SET n = $props {}",
            escape_identifier(label),
            NODE_RETURN
        ))
        .param("props", BoltType::Map(to_bolt_map(&properties)));

        let rows = self.query(query).await?;
        let row = rows.first().context("CREATE returned no row")?;
        node_from_row(row)
    }

    async fn create_nodes(&self, label: &str, rows: Vec<Properties>) -> Result<usize> {
        let statement = format!(
            "UNWIND $rows AS row CREATE (n:`{}`) SET n = row",
            escape_identifier(label)
        );

        let mut created = 0;
        for chunk in rows.chunks(BATCH_SIZE) {
            let mut list = BoltList::with_capacity(chunk.len());
            for row in chunk {
                list.push(BoltType::Map(to_bolt_map(row)));
            }
            self.execute(Query::new(statement.clone()).param("rows", BoltType::List(list)))
                .await?;
            created += chunk.len();
        }
        Ok(created)
    }

    async fn create_links(&self, batch: &LinkBatch) -> Result<usize> {
        let statement = format!(
            "UNWIND $pairs AS pair
             MATCH (a:`{}` {{`{}`: pair.from}}), (b:`{}` {{`{}`: pair.to}})
             CREATE (a)-[:`{}`]->(b)
             RETURN count(*) AS created",
            escape_identifier(&batch.from.label),
            escape_identifier(&batch.from.key),
            escape_identifier(&batch.to.label),
            escape_identifier(&batch.to.key),
            escape_identifier(&batch.rel_type),
        );

        let mut created = 0usize;
        for chunk in batch.pairs.chunks(BATCH_SIZE) {
            let mut list = BoltList::with_capacity(chunk.len());
            for (from, to) in chunk {
                let mut pair = BoltMap::with_capacity(2);
                pair.put(BoltString::new("from"), to_bolt(from));
                pair.put(BoltString::new("to"), to_bolt(to));
                list.push(BoltType::Map(pair));
            }
            let query = Query::new(statement.clone()).param("pairs", BoltType::List(list));
            let count: i64 = self.query_scalar(query, "created").await?.unwrap_or(0);
            created += count as usize;
        }
        Ok(created)
    }

    async fn links(
        &self,
        from: &NodeSelector,
        rel_type: &str,
        to: &NodeSelector,
    ) -> Result<Vec<(Value, Value)>> {
        let query = Query::new(format!(
            "MATCH (a:`{}`)-[:`{}`]->(b:`{}`) RETURN a.`{}` AS from_id, b.`{}` AS to_id",
            escape_identifier(&from.label),
            escape_identifier(rel_type),
            escape_identifier(&to.label),
            escape_identifier(&from.key),
            escape_identifier(&to.key),
        ));

        let rows = self.query(query).await?;
        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get::<Value>("from_id").unwrap_or(Value::Null),
                    row.get::<Value>("to_id").unwrap_or(Value::Null),
                )
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.execute(Query::new("MATCH (n) DETACH DELETE n".to_string())).await
    }

    async fn counts(&self) -> Result<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let node_count: i64 = self.query_scalar(node_query, "count").await?.unwrap_or(0);
        let rel_count: i64 = self.query_scalar(rel_query, "count").await?.unwrap_or(0);

        Ok(GraphCounts {
            nodes: node_count as usize,
            relationships: rel_count as usize,
        })
    }

    async fn project_graph(&self, graph_name: &str) -> Result<()> {
        let query = Query::new(
            "CALL gds.graph.project($name, '*', '*') YIELD graphName RETURN graphName".to_string(),
        )
        .param("name", graph_name);

        self.execute(query)
            .await
            .with_context(|| format!("Failed to project graph '{}'", graph_name))
    }

    async fn betweenness(&self, graph_name: &str, limit: usize) -> Result<Vec<CentralityRecord>> {
        let query = Query::new(
            "CALL gds.betweenness.stream($graph_name)
             YIELD nodeId, score
             WITH gds.util.asNode(nodeId) AS n, nodeId, score
             RETURN coalesce(toString(n.nid), n.device_id, toString(nodeId)) AS id,
                    n.ClassName AS class,
                    score AS centrality
             ORDER BY centrality DESC
             LIMIT $limit"
                .to_string(),
        )
        .param("graph_name", graph_name)
        .param("limit", limit as i64);

        let rows = self
            .query(query)
            .await
            .with_context(|| format!("Betweenness centrality failed for graph '{}'", graph_name))?;

        Ok(rows
            .iter()
            .map(|row| CentralityRecord {
                id: row.get("id").unwrap_or_default(),
                class: row.get::<String>("class").ok(),
                centrality: row.get("centrality").unwrap_or(0.0),
            })
            .collect())
    }

    async fn run_query(&self, query: &str) -> Result<Vec<Value>> {
        let rows = self.query(Query::new(query.to_string())).await?;

        Ok(rows
            .iter()
            .map(|row| {
                row.to::<Value>()
                    .unwrap_or_else(|_| serde_json::json!({ "row": format!("{:?}", row) }))
            })
            .collect())
    }
}

/// Convert a JSON value into a Bolt parameter.
pub fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => BoltType::Map(to_bolt_map(map)),
    }
}

fn to_bolt_map(map: &Properties) -> BoltMap {
    let mut bolt = BoltMap::with_capacity(map.len());
    for (key, value) in map {
        bolt.put(BoltString::new(key), to_bolt(value));
    }
    bolt
}

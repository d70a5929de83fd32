//! Neo4j schema initialization (lookup indexes).

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

/// Cypher statements for schema initialization.
///
/// Plain indexes rather than uniqueness constraints: device ids may repeat
/// and imported `nid`s are only unique per source file.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE INDEX ifc_node_nid IF NOT EXISTS FOR (n:IfcNode) ON (n.nid)",
    "CREATE INDEX ifc_node_class IF NOT EXISTS FOR (n:IfcNode) ON (n.ClassName)",
    "CREATE INDEX iot_device_id IF NOT EXISTS FOR (d:IoTDevice) ON (d.device_id)",
];

/// Initialize Neo4j schema with indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    info!("Initializing Neo4j schema...");

    for statement in SCHEMA_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}

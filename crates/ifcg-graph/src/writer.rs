//! Model import and device node creation.
//!
//! Creates nodes and relationships:
//! - (:IfcNode {nid, ClassName, ...}) per model entity
//! - (:IfcNode)-[:RELATING_STRUCTURE|OWNER_HISTORY|ATTR_<i>|...]->(:IfcNode)
//! - (:IoTDevice {device_id, device_type, ClassName, ...})

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use ifcg_core::model::{DeviceEntity, ModelEntity, Properties, DEVICE_LABEL, MODEL_LABEL, PROP_NID};
use ifcg_core::step::StepModel;

use crate::client::BATCH_SIZE;
use crate::store::{GraphStore, LinkBatch, NodeSelector, StoredNode};

/// Result of a model import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub nodes_created: usize,
    pub relationships_created: usize,
    /// References whose target entity was not in the model.
    pub dangling_references: usize,
}

/// Progress events emitted while importing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportProgress {
    /// Node batches are about to be written; carries the entity total.
    NodesStarted(usize),
    /// Nodes written so far.
    Nodes(usize),
    /// Relationship batches are about to be written; carries the total.
    RelationshipsStarted(usize),
    /// Relationships written so far.
    Relationships(usize),
}

/// Writes model entities and device entities to a graph store.
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Import every entity of a parsed model.
    pub async fn import_model(&self, model: &StepModel) -> Result<ImportSummary> {
        self.import_model_with_progress(model, |_| {}).await
    }

    /// Import every entity of a parsed model, reporting progress per batch.
    pub async fn import_model_with_progress<F>(&self, model: &StepModel, mut progress: F) -> Result<ImportSummary>
    where
        F: FnMut(ImportProgress) + Send,
    {
        info!(entities = model.len(), "Starting model import");

        let entities: Vec<ModelEntity> = model.iter().map(ModelEntity::from_step).collect();
        let mut summary = ImportSummary::default();

        progress(ImportProgress::NodesStarted(entities.len()));
        for chunk in entities.chunks(BATCH_SIZE) {
            let rows: Vec<Properties> = chunk.iter().map(|e| e.properties.clone()).collect();
            summary.nodes_created += self
                .store
                .create_nodes(MODEL_LABEL, rows)
                .await
                .context("Failed to write model nodes")?;
            progress(ImportProgress::Nodes(summary.nodes_created));
        }

        let mut by_type: BTreeMap<String, Vec<(Value, Value)>> = BTreeMap::new();
        for entity in &entities {
            for (attribute, target) in &entity.references {
                if model.get(*target).is_none() {
                    summary.dangling_references += 1;
                    continue;
                }
                by_type
                    .entry(relationship_type(attribute))
                    .or_default()
                    .push((Value::from(entity.nid), Value::from(*target as i64)));
            }
        }

        let total: usize = by_type.values().map(Vec::len).sum();
        progress(ImportProgress::RelationshipsStarted(total));

        let selector = NodeSelector::new(MODEL_LABEL, PROP_NID);
        for (rel_type, pairs) in by_type {
            for chunk in pairs.chunks(BATCH_SIZE) {
                let batch = LinkBatch {
                    from: selector.clone(),
                    rel_type: rel_type.clone(),
                    to: selector.clone(),
                    pairs: chunk.to_vec(),
                };
                summary.relationships_created += self
                    .store
                    .create_links(&batch)
                    .await
                    .with_context(|| format!("Failed to write {} relationships", rel_type))?;
                progress(ImportProgress::Relationships(summary.relationships_created));
            }
            debug!(rel_type = %rel_type, "Relationship type written");
        }

        info!(
            nodes = summary.nodes_created,
            rels = summary.relationships_created,
            dangling = summary.dangling_references,
            "Model import complete"
        );
        Ok(summary)
    }

    /// Create one device node. No uniqueness check: the same `device_id`
    /// twice yields two nodes.
    pub async fn create_device_node(&self, device: &DeviceEntity) -> Result<StoredNode> {
        let node = self
            .store
            .create_node(DEVICE_LABEL, device.to_properties())
            .await
            .with_context(|| format!("Failed to create device node '{}'", device.device_id))?;
        debug!(device_id = %device.device_id, node_id = node.id, "Device node created");
        Ok(node)
    }

    /// Delete everything in the store.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await.context("Failed to clear graph")?;
        info!("Graph cleared");
        Ok(())
    }
}

/// `RelatingStructure` -> `RELATING_STRUCTURE`, `Attr3` -> `ATTR_3`.
pub fn relationship_type(attribute: &str) -> String {
    let mut out = String::with_capacity(attribute.len() + 4);
    let mut prev: Option<char> = None;
    for c in attribute.chars() {
        if let Some(p) = prev {
            let boundary = (c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()))
                || (c.is_ascii_digit() && p.is_alphabetic());
            if boundary {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ifcg_core::step::parse_step;
    use serde_json::json;

    const MODEL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((1.,2.));
#2=IFCDIRECTION((0.,1.));
#3=IFCBUILDINGSTOREY('g1',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#4=IFCWALLSTANDARDCASE('g2',$,'Wall A',$,$,$,$,$);
#5=IFCRELCONTAINEDINSPATIALSTRUCTURE('g3',$,$,$,(#4,#99),#3);
ENDSEC;
END-ISO-10303-21;";

    #[test]
    fn test_relationship_type() {
        assert_eq!(relationship_type("RelatingStructure"), "RELATING_STRUCTURE");
        assert_eq!(relationship_type("RelatedElements"), "RELATED_ELEMENTS");
        assert_eq!(relationship_type("Attr3"), "ATTR_3");
        assert_eq!(relationship_type("Attr12"), "ATTR_12");
    }

    #[tokio::test]
    async fn test_import_model() {
        let store = Arc::new(MemoryStore::new());
        let writer = GraphWriter::new(store.clone());
        let model = parse_step(MODEL).unwrap();

        let mut events = Vec::new();
        let summary = writer
            .import_model_with_progress(&model, |e| events.push(e))
            .await
            .unwrap();

        assert_eq!(summary.nodes_created, 5);
        assert_eq!(summary.relationships_created, 2);
        assert_eq!(summary.dangling_references, 1);
        assert_eq!(events.first(), Some(&ImportProgress::NodesStarted(5)));
        assert_eq!(events.last(), Some(&ImportProgress::Relationships(2)));

        let selector = NodeSelector::new(MODEL_LABEL, PROP_NID);
        let point = store.find_node(&selector, &json!(1)).await.unwrap().unwrap();
        assert_eq!(point.get_str("ClassName"), Some("IfcCartesianPoint"));
        assert_eq!(point.get_str("Coordinates"), Some("1.0,2.0"));

        let contained = store
            .links(&selector, "RELATING_STRUCTURE", &selector)
            .await
            .unwrap();
        assert_eq!(contained, vec![(json!(5), json!(3))]);
    }

    #[tokio::test]
    async fn test_device_node_has_no_uniqueness_check() {
        let store = Arc::new(MemoryStore::new());
        let writer = GraphWriter::new(store.clone());
        let device = DeviceEntity::new("MK-01", "TemperatureSensor").with_attribute("unit", "C");

        let first = writer.create_device_node(&device).await.unwrap();
        let second = writer.create_device_node(&device).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.has_label(DEVICE_LABEL));
        assert_eq!(first.get_str("unit"), Some("C"));
        assert_eq!(store.nodes_with_label(DEVICE_LABEL).await.unwrap().len(), 2);
    }
}

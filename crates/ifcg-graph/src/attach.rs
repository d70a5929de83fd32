//! Device attachment.
//!
//! (:IfcNode {nid})-[:HAS_IOT_DEVICE]->(:IoTDevice {device_id})

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use ifcg_core::model::{DeviceEntity, DEVICE_LABEL, HAS_IOT_DEVICE, MODEL_LABEL, PROP_DEVICE_ID, PROP_NID};

use crate::store::{GraphStore, LinkBatch, NodeSelector, StoredNode};
use crate::writer::GraphWriter;

/// What happened to an attachment request.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    Attached {
        device: StoredNode,
        /// Edges created. More than one when other devices share the id;
        /// zero when the target vanished between lookup and link.
        links: usize,
    },
    /// No model node carries the requested `nid`; nothing was written.
    TargetNotFound { nid: i64 },
}

impl AttachOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }
}

/// Looks up a model node by `nid`, creates a device node and links them.
///
/// The lookup, the node creation and the link are three separate store
/// calls with no transaction around them.
pub struct DeviceAttacher {
    store: Arc<dyn GraphStore>,
    writer: GraphWriter,
}

impl DeviceAttacher {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            writer: GraphWriter::new(store.clone()),
            store,
        }
    }

    pub async fn attach(&self, target_nid: i64, device: &DeviceEntity) -> Result<AttachOutcome> {
        let target = NodeSelector::new(MODEL_LABEL, PROP_NID);
        let exists = self
            .store
            .find_node(&target, &Value::from(target_nid))
            .await
            .with_context(|| format!("Failed to look up node {}", target_nid))?
            .is_some();

        if !exists {
            warn!(nid = target_nid, "Attachment target not found");
            return Ok(AttachOutcome::TargetNotFound { nid: target_nid });
        }

        let device_node = self.writer.create_device_node(device).await?;

        let batch = LinkBatch {
            from: target,
            rel_type: HAS_IOT_DEVICE.to_string(),
            to: NodeSelector::new(DEVICE_LABEL, PROP_DEVICE_ID),
            pairs: vec![(Value::from(target_nid), Value::from(device.device_id.clone()))],
        };
        let links = self
            .store
            .create_links(&batch)
            .await
            .with_context(|| format!("Failed to link device '{}' to node {}", device.device_id, target_nid))?;

        if links == 0 {
            warn!(nid = target_nid, device_id = %device.device_id, "Device node created without a link");
        } else {
            info!(nid = target_nid, device_id = %device.device_id, links, "Device attached");
        }

        Ok(AttachOutcome::Attached {
            device: device_node,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphCounts, MemoryStore};
    use async_trait::async_trait;
    use ifcg_core::model::{CentralityRecord, Properties};
    use serde_json::json;

    /// Deletes `target_id` right before the first node is created, as a
    /// concurrent writer would between lookup and link.
    struct VanishingTarget {
        inner: Arc<MemoryStore>,
        target_id: i64,
    }

    #[async_trait]
    impl GraphStore for VanishingTarget {
        async fn labels(&self) -> Result<Vec<String>> {
            self.inner.labels().await
        }
        async fn nodes_with_label(&self, label: &str) -> Result<Vec<StoredNode>> {
            self.inner.nodes_with_label(label).await
        }
        async fn find_node(&self, selector: &NodeSelector, value: &Value) -> Result<Option<StoredNode>> {
            self.inner.find_node(selector, value).await
        }
        async fn create_node(&self, label: &str, properties: Properties) -> Result<StoredNode> {
            self.inner.delete_node(self.target_id).await?;
            self.inner.create_node(label, properties).await
        }
        async fn create_nodes(&self, label: &str, rows: Vec<Properties>) -> Result<usize> {
            self.inner.create_nodes(label, rows).await
        }
        async fn create_links(&self, batch: &LinkBatch) -> Result<usize> {
            self.inner.create_links(batch).await
        }
        async fn links(&self, from: &NodeSelector, rel_type: &str, to: &NodeSelector) -> Result<Vec<(Value, Value)>> {
            self.inner.links(from, rel_type, to).await
        }
        async fn clear(&self) -> Result<()> {
            self.inner.clear().await
        }
        async fn counts(&self) -> Result<GraphCounts> {
            self.inner.counts().await
        }
        async fn project_graph(&self, graph_name: &str) -> Result<()> {
            self.inner.project_graph(graph_name).await
        }
        async fn betweenness(&self, graph_name: &str, limit: usize) -> Result<Vec<CentralityRecord>> {
            self.inner.betweenness(graph_name, limit).await
        }
        async fn run_query(&self, query: &str) -> Result<Vec<Value>> {
            self.inner.run_query(query).await
        }
    }

    async fn store_with_node(nid: i64) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let props = json!({"nid": nid, "ClassName": "IfcWallStandardCase"});
        store
            .create_node(MODEL_LABEL, props.as_object().cloned().unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_attach_creates_node_and_edge() {
        let store = store_with_node(7).await;
        let attacher = DeviceAttacher::new(store.clone());
        let device = DeviceEntity::new("MK-01", "TemperatureSensor").with_attribute("temperature", 21.0);

        let outcome = attacher.attach(7, &device).await.unwrap();
        match outcome {
            AttachOutcome::Attached { device, links } => {
                assert_eq!(links, 1);
                assert_eq!(device.get_str("device_type"), Some("TemperatureSensor"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let pairs = store
            .links(
                &NodeSelector::new(MODEL_LABEL, PROP_NID),
                HAS_IOT_DEVICE,
                &NodeSelector::new(DEVICE_LABEL, PROP_DEVICE_ID),
            )
            .await
            .unwrap();
        assert_eq!(pairs, vec![(json!(7), json!("MK-01"))]);
    }

    #[tokio::test]
    async fn test_missing_target_writes_nothing() {
        let store = store_with_node(7).await;
        let before = store.writes().await;
        let attacher = DeviceAttacher::new(store.clone());

        let outcome = attacher
            .attach(999, &DeviceEntity::new("MK-02", "HumiditySensor"))
            .await
            .unwrap();

        assert_eq!(outcome, AttachOutcome::TargetNotFound { nid: 999 });
        assert_eq!(store.writes().await, before);
        assert_eq!(store.counts().await.unwrap().nodes, 1);
    }

    #[tokio::test]
    async fn test_duplicate_device_ids_allowed() {
        let store = store_with_node(7).await;
        let attacher = DeviceAttacher::new(store.clone());
        let device = DeviceEntity::new("MK-01", "TemperatureSensor");

        assert!(attacher.attach(7, &device).await.unwrap().is_attached());
        let second = attacher.attach(7, &device).await.unwrap();

        // the second link matches both device nodes sharing the id
        assert!(matches!(second, AttachOutcome::Attached { links: 2, .. }));
        assert_eq!(store.nodes_with_label(DEVICE_LABEL).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_target_deleted_before_link_leaves_orphan_device() {
        let inner = store_with_node(7).await;
        let target_id = inner.nodes_with_label(MODEL_LABEL).await.unwrap()[0].id;
        let store = Arc::new(VanishingTarget {
            inner: inner.clone(),
            target_id,
        });
        let attacher = DeviceAttacher::new(store);

        let outcome = attacher
            .attach(7, &DeviceEntity::new("MK-03", "CO2Sensor"))
            .await
            .unwrap();

        assert!(matches!(outcome, AttachOutcome::Attached { links: 0, .. }));
        assert_eq!(inner.nodes_with_label(DEVICE_LABEL).await.unwrap().len(), 1);
        assert!(inner.nodes_with_label(MODEL_LABEL).await.unwrap().is_empty());
        let pairs = inner
            .links(
                &NodeSelector::new(MODEL_LABEL, PROP_NID),
                HAS_IOT_DEVICE,
                &NodeSelector::new(DEVICE_LABEL, PROP_DEVICE_ID),
            )
            .await
            .unwrap();
        assert!(pairs.is_empty());
        assert_eq!(inner.counts().await.unwrap().relationships, 0);
    }
}

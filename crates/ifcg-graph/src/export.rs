//! Graph-to-file exporter.
//!
//! Reads every labelled node back from the store, keeps the ones carrying
//! both `ClassName` and `nid`, orders them by `nid` and writes one STEP-like
//! line per node followed by one line per `HAS_IOT_DEVICE` edge. Geometry
//! beyond coordinate and direction tuples is not reconstructed, and the
//! result is not meant to load in a conforming IFC reader.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use ifcg_core::model::{
    Properties, DEVICE_LABEL, HAS_IOT_DEVICE, MODEL_LABEL, PROP_CLASS, PROP_COORDINATES, PROP_DEVICE_ID,
    PROP_DEVICE_TYPE, PROP_DIRECTION_RATIOS, PROP_NID,
};

use crate::store::{GraphStore, NodeSelector, StoredNode};

const HEADER: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('IfcExport.ifc','2024-04-03T12:00:00',(''),('',''),'IfcOpenShell','IfcOpenShell','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
";

const FOOTER: &str = "ENDSEC;\nEND-ISO-10303-21;\n";

/// A node that qualified for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub nid: i64,
    pub class_name: String,
    pub device_id: Option<String>,
    pub device_type: Option<String>,
    pub properties: Properties,
}

impl ExportRecord {
    /// `None` when `ClassName` or `nid` is missing or unusable.
    pub fn from_node(node: &StoredNode) -> Option<Self> {
        let class_name = node.get_str(PROP_CLASS).filter(|c| !c.is_empty())?;
        let nid = node.get(PROP_NID).and_then(parse_nid)?;
        let text = |key: &str| node.get_str(key).filter(|s| !s.is_empty()).map(str::to_string);

        Some(Self {
            nid,
            class_name: class_name.to_string(),
            device_id: text(PROP_DEVICE_ID),
            device_type: text(PROP_DEVICE_TYPE),
            properties: node.properties.clone(),
        })
    }

    fn line(&self) -> String {
        let nid = self.nid;
        match self.class_name.as_str() {
            "IfcCartesianPoint" => {
                let c = components(self.properties.get(PROP_COORDINATES), 2);
                format!("# {}=IFCARTESIANPOINT({});", nid, c.join(","))
            }
            "IfcDirection" => {
                let d = components(self.properties.get(PROP_DIRECTION_RATIOS), 3);
                format!("# {}=IFCDIRECTION({});", nid, d.join(","))
            }
            "IfcExtrudedAreaSolid" => format!("# {}=IFCEXTRUDEDAREASOLID();", nid),
            "IfcPolyline" => format!("# {}=IFCPOLYLINE();", nid),
            DEVICE_LABEL => match (&self.device_id, &self.device_type) {
                (Some(id), Some(kind)) => {
                    format!("# {}=IOTDEVICE('{}','{}');", nid, escape(id), escape(kind))
                }
                _ => generic(nid, &self.class_name),
            },
            other => generic(nid, other),
        }
    }
}

fn generic(nid: i64, class_name: &str) -> String {
    format!("# {}=IFCELEMENT($,$,'{}');", nid, escape(class_name))
}

/// Integers, and strings holding an integer.
fn parse_nid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Exactly `width` components from a comma-separated string (or a list),
/// padding missing or empty ones with `0.0` and dropping extras.
fn components(value: Option<&Value>, width: usize) -> Vec<String> {
    let mut parts: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    };
    parts.resize(width, String::new());
    for part in &mut parts {
        if part.is_empty() {
            *part = "0.0".to_string();
        }
    }
    parts
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

/// Counts reported after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Entity lines written.
    pub written: usize,
    /// Nodes dropped for a missing `ClassName` or `nid`.
    pub skipped: usize,
    /// Relationship lines written.
    pub relationships: usize,
}

/// `(model nid, device id)` of a `HAS_IOT_DEVICE` edge, as rendered text.
pub type DeviceLink = (String, String);

/// Write the whole file: header, sorted entity lines, relationship lines,
/// footer. `records` must already be in output order.
pub fn render<W: Write>(records: &[ExportRecord], links: &[DeviceLink], out: &mut W) -> io::Result<()> {
    out.write_all(HEADER.as_bytes())?;
    for record in records {
        writeln!(out, "{}", record.line())?;
    }
    for (ifc_id, iot_id) in links {
        writeln!(
            out,
            "# REL_{ifc}_{iot}=IFCRELASSOCIATES($,# {ifc},# {iot});",
            ifc = ifc_id,
            iot = iot_id
        )?;
    }
    out.write_all(FOOTER.as_bytes())
}

/// Reads the graph back and writes it out as a STEP-like file.
pub struct IfcExporter {
    store: Arc<dyn GraphStore>,
}

impl IfcExporter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Every exportable node, sorted by `nid`, plus the number skipped.
    ///
    /// Nodes are visited label by label; one carrying several labels is
    /// kept once. The sort is stable, so equal `nid`s keep fetch order.
    pub async fn collect(&self) -> Result<(Vec<ExportRecord>, usize)> {
        let labels = self.store.labels().await.context("Failed to list labels")?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut skipped = 0;

        for label in &labels {
            let nodes = self
                .store
                .nodes_with_label(label)
                .await
                .with_context(|| format!("Failed to fetch nodes for label {}", label))?;
            debug!(label = %label, nodes = nodes.len(), "Fetched label");

            for node in nodes {
                if !seen.insert(node.id) {
                    continue;
                }
                match ExportRecord::from_node(&node) {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
            }
        }

        records.sort_by_key(|r| r.nid);
        Ok((records, skipped))
    }

    /// Endpoint ids of every model-to-device edge.
    pub async fn device_links(&self) -> Result<Vec<DeviceLink>> {
        let pairs = self
            .store
            .links(
                &NodeSelector::new(MODEL_LABEL, PROP_NID),
                HAS_IOT_DEVICE,
                &NodeSelector::new(DEVICE_LABEL, PROP_DEVICE_ID),
            )
            .await
            .context("Failed to fetch device relationships")?;

        Ok(pairs
            .iter()
            .filter(|(from, to)| !from.is_null() && !to.is_null())
            .map(|(from, to)| (value_text(from), value_text(to)))
            .collect())
    }

    /// Export to any writer.
    pub async fn export<W: Write>(&self, out: &mut W) -> Result<ExportSummary> {
        let (records, skipped) = self.collect().await?;
        let links = self.device_links().await?;

        render(&records, &links, out).context("Failed to write export")?;

        let summary = ExportSummary {
            written: records.len(),
            skipped,
            relationships: links.len(),
        };
        info!(
            written = summary.written,
            skipped = summary.skipped,
            relationships = summary.relationships,
            "Graph exported"
        );
        Ok(summary)
    }

    /// Export to a file, creating its directory. A failed write may leave a
    /// partial file behind.
    pub async fn export_to_file(&self, path: &Path) -> Result<ExportSummary> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let summary = self.export(&mut out).await?;
        out.flush().with_context(|| format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), "Export file written");
        Ok(summary)
    }
}

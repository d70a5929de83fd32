//! # IFCG Graph
//!
//! Property graph side of the IFC round trip.
//!
//! Imports parsed models into Neo4j, attaches IoT device nodes, ranks
//! nodes by betweenness centrality and exports the graph back to a
//! STEP-like file. Every component takes an explicit store handle.

pub mod attach;
pub mod centrality;
pub mod client;
pub mod export;
pub mod schema;
pub mod store;
pub mod writer;

pub use attach::{AttachOutcome, DeviceAttacher};
pub use centrality::{write_csv, CentralityReporter};
pub use client::{GraphClient, GraphConfig};
pub use export::{ExportSummary, IfcExporter};
pub use schema::initialize_schema;
pub use store::{GraphCounts, GraphStore, MemoryStore, StoredNode};
pub use writer::{GraphWriter, ImportProgress, ImportSummary};

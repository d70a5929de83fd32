//! IFCG Core Library
//!
//! IFC/STEP decoding, entity extraction and the records shared with the
//! graph layer.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod schema;
pub mod step;

pub use config::AppConfig;
pub use error::{IfcgError, IfcgResult};
pub use model::{CentralityRecord, DeviceEntity, EntityKind, ModelEntity, Properties};
pub use schema::IfcClass;

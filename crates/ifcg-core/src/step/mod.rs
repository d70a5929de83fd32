//! STEP (ISO-10303-21) input.

pub mod model;
pub mod parser;

use std::path::Path;

use tracing::info;

use crate::error::{IfcgError, IfcgResult};

pub use model::{AttributeValue, StepEntity, StepModel};
pub use parser::{parse_statement, parse_step};

/// Read and decode an IFC file from disk.
///
/// A path that does not exist is reported as [`IfcgError::SourceNotFound`]
/// before anything is read.
pub fn load_step(path: &Path) -> IfcgResult<StepModel> {
    if !path.exists() {
        return Err(IfcgError::SourceNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let model = parse_step(&content)?;
    info!(path = %path.display(), entities = model.len(), "Loaded IFC file");
    Ok(model)
}

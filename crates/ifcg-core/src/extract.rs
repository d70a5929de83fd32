//! Wall and spatial-containment extraction from an IFC model.
//!
//! A single pass over the entities in file order. Materials are resolved
//! through an inverse index built from `IfcRelAssociatesMaterial`, so each
//! wall costs one hash lookup.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IfcgResult;
use crate::schema::IfcClass;
use crate::step::{self, AttributeValue, StepModel};

/// One wall, with absent attributes as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallRecord {
    pub id: u32,
    pub name: Option<String>,
    pub overall_width: Option<f64>,
    pub overall_height: Option<f64>,
    pub material: Option<String>,
}

/// One `IfcRelContainedInSpatialStructure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRecord {
    pub id: u32,
    pub relating_structure: Option<String>,
    pub related_elements: Vec<Option<String>>,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub walls: Vec<WallRecord>,
    pub spatial_structures: Vec<SpatialRecord>,
}

/// Load `path` and extract walls and containment relations.
pub fn extract_file(path: &Path) -> IfcgResult<Extraction> {
    let model = step::load_step(path)?;
    Ok(extract(&model))
}

/// Extract from an already decoded model.
pub fn extract(model: &StepModel) -> Extraction {
    let materials = material_index(model);
    let mut extraction = Extraction::default();

    for entity in model.iter() {
        if entity.class.is_wall() {
            extraction.walls.push(WallRecord {
                id: entity.id,
                name: entity.name().map(str::to_string),
                overall_width: entity.attribute("OverallWidth").and_then(AttributeValue::as_f64),
                overall_height: entity.attribute("OverallHeight").and_then(AttributeValue::as_f64),
                material: materials.get(&entity.id).cloned(),
            });
        } else if entity.class == IfcClass::RelContainedInSpatialStructure {
            let relating_structure = entity
                .attribute("RelatingStructure")
                .and_then(|v| model.resolve(v))
                .and_then(|s| s.name())
                .map(str::to_string);

            let related_elements = entity
                .attribute("RelatedElements")
                .and_then(AttributeValue::as_list)
                .unwrap_or_default()
                .iter()
                .map(|v| model.resolve(v).and_then(|e| e.name()).map(str::to_string))
                .collect();

            extraction.spatial_structures.push(SpatialRecord {
                id: entity.id,
                relating_structure,
                related_elements,
            });
        }
    }

    info!(
        walls = extraction.walls.len(),
        spatial_structures = extraction.spatial_structures.len(),
        "Extraction complete"
    );
    extraction
}

/// Element id -> name of the first `IfcMaterial` associated with it.
fn material_index(model: &StepModel) -> FxHashMap<u32, String> {
    let mut index = FxHashMap::default();

    for rel in model
        .iter()
        .filter(|e| e.class == IfcClass::RelAssociatesMaterial)
    {
        let material = rel
            .attribute("RelatingMaterial")
            .and_then(|v| model.resolve(v))
            .filter(|m| m.class == IfcClass::Material)
            .and_then(|m| m.name());

        let Some(material) = material else {
            continue;
        };

        let related = rel
            .attribute("RelatedObjects")
            .and_then(AttributeValue::as_list)
            .unwrap_or_default();
        for object in related.iter().filter_map(AttributeValue::as_ref_id) {
            index.entry(object).or_insert_with(|| material.to_string());
        }
    }

    debug!(associations = index.len(), "Material index built");
    index
}

impl Extraction {
    /// Write `{"walls": [...], "spatial_structures": [...]}` into
    /// `output_dir/file_name`, creating the directory if needed.
    pub fn write_json(&self, output_dir: &Path, file_name: &str) -> IfcgResult<PathBuf> {
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
            info!(dir = %output_dir.display(), "Created output directory");
        }

        let path = output_dir.join(file_name);
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        info!(path = %path.display(), "Extraction written");
        Ok(path)
    }
}

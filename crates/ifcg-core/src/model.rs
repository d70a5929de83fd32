//! Domain records shared by the extractor, the graph writer and the exporter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::{AttributeValue, StepEntity};

/// Node properties as stored in the graph.
pub type Properties = serde_json::Map<String, Value>;

/// Label carried by every node imported from a model file.
pub const MODEL_LABEL: &str = "IfcNode";
/// Label (and `ClassName`) of synthetic IoT device nodes.
pub const DEVICE_LABEL: &str = "IoTDevice";
/// Relationship from a model node to an attached device.
pub const HAS_IOT_DEVICE: &str = "HAS_IOT_DEVICE";

pub const PROP_NID: &str = "nid";
pub const PROP_CLASS: &str = "ClassName";
pub const PROP_DEVICE_ID: &str = "device_id";
pub const PROP_DEVICE_TYPE: &str = "device_type";
pub const PROP_COORDINATES: &str = "Coordinates";
pub const PROP_DIRECTION_RATIOS: &str = "DirectionRatios";

/// Class-tag vocabulary understood by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Point,
    Direction,
    ExtrudedSolid,
    Polyline,
    Wall,
    SpatialContainment,
    Other,
}

/// A model entity projected for the graph: id, class and flattened scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntity {
    pub nid: i64,
    pub class_name: String,
    pub kind: EntityKind,
    pub properties: Properties,
    /// `(attribute name, target id)` for every reference the entity holds.
    pub references: Vec<(String, u32)>,
}

impl ModelEntity {
    pub fn from_step(entity: &StepEntity) -> Self {
        let kind = entity.class.kind();
        let class_name = entity.class.name();
        let mut properties = Properties::new();
        let mut references = Vec::new();

        properties.insert(PROP_NID.into(), Value::from(entity.id as i64));
        properties.insert(PROP_CLASS.into(), Value::from(class_name.clone()));

        for (index, attribute) in entity.attributes.iter().enumerate() {
            let name = entity.class.attribute_name(index);

            for target in attribute.refs() {
                references.push((name.clone(), target));
            }

            let flattened = match (kind, name.as_str()) {
                (EntityKind::Point, PROP_COORDINATES)
                | (EntityKind::Direction, PROP_DIRECTION_RATIOS) => join_reals(attribute),
                _ => scalar_value(attribute),
            };
            if let Some(value) = flattened {
                properties.insert(name, value);
            }
        }

        Self {
            nid: entity.id as i64,
            class_name,
            kind,
            properties,
            references,
        }
    }
}

/// `(0.,1.5)` -> `"0.0,1.5"`
fn join_reals(value: &AttributeValue) -> Option<Value> {
    let items = value.as_list()?;
    let parts: Option<Vec<String>> = items
        .iter()
        .map(|v| v.as_f64().map(format_real))
        .collect();
    parts.map(|p| Value::from(p.join(",")))
}

/// Render a real the way coordinate strings are stored (`1.0`, `0.25`).
pub fn format_real(v: f64) -> String {
    format!("{:?}", v)
}

/// Scalars and homogeneous scalar lists become properties; references
/// and nulls do not.
fn scalar_value(value: &AttributeValue) -> Option<Value> {
    match value {
        AttributeValue::String(s) => Some(Value::from(s.clone())),
        AttributeValue::Integer(i) => Some(Value::from(*i)),
        AttributeValue::Real(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        AttributeValue::Enum(e) => Some(match e.as_str() {
            "T" | "TRUE" => Value::Bool(true),
            "F" | "FALSE" => Value::Bool(false),
            other => Value::from(other),
        }),
        AttributeValue::Typed(_, args) if args.len() == 1 => scalar_value(&args[0]),
        AttributeValue::List(items) if !items.is_empty() => {
            let values: Option<Vec<Value>> = items.iter().map(scalar_value).collect();
            let values = values?;
            let homogeneous = values.iter().all(Value::is_number)
                || values.iter().all(Value::is_string)
                || values.iter().all(Value::is_boolean);
            homogeneous.then_some(Value::Array(values))
        }
        _ => None,
    }
}

/// A synthetic IoT sensor to attach to a model node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntity {
    pub device_id: String,
    pub device_type: String,
    #[serde(default)]
    pub attributes: Properties,
}

impl DeviceEntity {
    pub fn new(device_id: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_type: device_type.into(),
            attributes: Properties::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Node properties: identity, type, `ClassName` and the attribute bag.
    pub fn to_properties(&self) -> Properties {
        let mut props = self.attributes.clone();
        props.insert(PROP_DEVICE_ID.into(), Value::from(self.device_id.clone()));
        props.insert(PROP_DEVICE_TYPE.into(), Value::from(self.device_type.clone()));
        props.insert(PROP_CLASS.into(), Value::from(DEVICE_LABEL));
        props
    }
}

/// One row of a centrality report. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityRecord {
    pub id: String,
    #[serde(rename = "class")]
    pub class: Option<String>,
    pub centrality: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IfcClass;

    #[test]
    fn test_point_coordinates_flattened() {
        let entity = StepEntity {
            id: 5,
            class: IfcClass::CartesianPoint,
            attributes: vec![AttributeValue::List(vec![
                AttributeValue::Real(1.0),
                AttributeValue::Real(2.0),
            ])],
        };
        let model = ModelEntity::from_step(&entity);
        assert_eq!(model.kind, EntityKind::Point);
        assert_eq!(model.properties["nid"], Value::from(5));
        assert_eq!(model.properties["ClassName"], Value::from("IfcCartesianPoint"));
        assert_eq!(model.properties["Coordinates"], Value::from("1.0,2.0"));
        assert!(model.references.is_empty());
    }

    #[test]
    fn test_references_named_by_attribute() {
        let entity = StepEntity {
            id: 40,
            class: IfcClass::RelContainedInSpatialStructure,
            attributes: vec![
                AttributeValue::String("guid".into()),
                AttributeValue::Ref(1),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::List(vec![AttributeValue::Ref(20), AttributeValue::Ref(21)]),
                AttributeValue::Ref(30),
            ],
        };
        let model = ModelEntity::from_step(&entity);
        assert_eq!(
            model.references,
            vec![
                ("OwnerHistory".to_string(), 1),
                ("RelatedElements".to_string(), 20),
                ("RelatedElements".to_string(), 21),
                ("RelatingStructure".to_string(), 30),
            ]
        );
        assert_eq!(model.properties["GlobalId"], Value::from("guid"));
        assert!(!model.properties.contains_key("Name"));
    }

    #[test]
    fn test_enum_booleans_and_unknown_positions() {
        let entity = StepEntity {
            id: 9,
            class: IfcClass::Other("IFCPROPERTYSINGLEVALUE".into()),
            attributes: vec![
                AttributeValue::String("IsExternal".into()),
                AttributeValue::Typed("IFCBOOLEAN".into(), vec![AttributeValue::Enum("T".into())]),
                AttributeValue::Enum("ELEMENT".into()),
            ],
        };
        let model = ModelEntity::from_step(&entity);
        assert_eq!(model.properties["Attr0"], Value::from("IsExternal"));
        assert_eq!(model.properties["Attr1"], Value::Bool(true));
        assert_eq!(model.properties["Attr2"], Value::from("ELEMENT"));
    }

    #[test]
    fn test_device_properties() {
        let device = DeviceEntity::new("MK-01", "TemperatureSensor")
            .with_attribute("temperature", 22.5)
            .with_attribute("unit", "C");
        let props = device.to_properties();
        assert_eq!(props["device_id"], Value::from("MK-01"));
        assert_eq!(props["ClassName"], Value::from("IoTDevice"));
        assert_eq!(props["temperature"], Value::from(22.5));
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_centrality_record_column_names() {
        let record = CentralityRecord {
            id: "12".into(),
            class: Some("IfcWall".into()),
            centrality: 3.5,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["class"], Value::from("IfcWall"));
    }
}

//! Decoded STEP entities.

use rustc_hash::FxHashMap;

use crate::schema::IfcClass;

/// One attribute value of a STEP entity instance.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `#123`
    Ref(u32),
    /// `'text'`, already unescaped
    String(String),
    Integer(i64),
    Real(f64),
    /// `.ELEMENT.` (without dots)
    Enum(String),
    List(Vec<AttributeValue>),
    /// `IFCLABEL('x')`, `IFCBOOLEAN(.T.)`
    Typed(String, Vec<AttributeValue>),
    /// `$`
    Null,
    /// `*`
    Derived,
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Typed(_, args) if args.len() == 1 => args[0].as_str(),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<u32> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Typed(_, args) if args.len() == 1 => args[0].as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Derived)
    }

    /// Every entity reference reachable inside this value, in order.
    pub fn refs(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<u32>) {
        match self {
            Self::Ref(id) => out.push(*id),
            Self::List(items) | Self::Typed(_, items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            _ => {}
        }
    }
}

/// A single `#id=TYPE(...)` instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u32,
    pub class: IfcClass,
    pub attributes: Vec<AttributeValue>,
}

impl StepEntity {
    /// Attribute by schema name, `None` if the class does not declare it
    /// or the file omits the position.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.class
            .attribute_index(name)
            .and_then(|i| self.attributes.get(i))
    }

    /// The `Name` attribute as a string, if set.
    pub fn name(&self) -> Option<&str> {
        self.attribute("Name").and_then(AttributeValue::as_str)
    }
}

/// All entities of a STEP file, in file order with id lookup.
#[derive(Debug, Default)]
pub struct StepModel {
    pub schema: Option<String>,
    /// Complex (multi-type) instances that were not decoded.
    pub skipped: usize,
    entities: Vec<StepEntity>,
    index: FxHashMap<u32, usize>,
}

impl StepModel {
    pub fn new(schema: Option<String>) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Append an entity. A repeated id replaces the earlier lookup target.
    pub fn push(&mut self, entity: StepEntity) {
        self.index.insert(entity.id, self.entities.len());
        self.entities.push(entity);
    }

    pub fn get(&self, id: u32) -> Option<&StepEntity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    /// Follow a reference attribute to its target entity.
    pub fn resolve(&self, value: &AttributeValue) -> Option<&StepEntity> {
        value.as_ref_id().and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_refs() {
        let value = AttributeValue::List(vec![
            AttributeValue::Ref(3),
            AttributeValue::List(vec![AttributeValue::Ref(7), AttributeValue::Null]),
            AttributeValue::Real(1.0),
        ]);
        assert_eq!(value.refs(), vec![3, 7]);
    }

    #[test]
    fn test_typed_value_accessors() {
        let label = AttributeValue::Typed("IFCLABEL".into(), vec![AttributeValue::String("x".into())]);
        assert_eq!(label.as_str(), Some("x"));
        let measure = AttributeValue::Typed("IFCLENGTHMEASURE".into(), vec![AttributeValue::Real(0.2)]);
        assert_eq!(measure.as_f64(), Some(0.2));
    }

    #[test]
    fn test_model_lookup() {
        let mut model = StepModel::new(Some("IFC2X3".into()));
        model.push(StepEntity {
            id: 12,
            class: IfcClass::Material,
            attributes: vec![AttributeValue::String("Brick".into())],
        });
        assert_eq!(model.len(), 1);
        assert_eq!(model.get(12).and_then(StepEntity::name), Some("Brick"));
        assert!(model.resolve(&AttributeValue::Ref(99)).is_none());
    }
}

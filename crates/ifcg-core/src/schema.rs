//! IFC class table.
//!
//! Only the handful of classes the pipeline reasons about are named here,
//! together with their positional attribute names (IFC2X3 order). Every
//! other STEP type survives as [`IfcClass::Other`].

use std::fmt;

use crate::model::EntityKind;

const ELEMENT: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
];

const OPENING_FILLER: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
    "OverallHeight",
    "OverallWidth",
];

const SLAB: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
    "PredefinedType",
];

const ROOF: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
    "ShapeType",
];

const PROJECT: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "LongName",
    "Phase",
    "RepresentationContexts",
    "UnitsInContext",
];

const SITE: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
    "RefLatitude",
    "RefLongitude",
    "RefElevation",
    "LandTitleNumber",
    "SiteAddress",
];

const BUILDING: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
    "ElevationOfRefHeight",
    "ElevationOfTerrain",
    "BuildingAddress",
];

const STOREY: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
    "Elevation",
];

const SPACE: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
    "InteriorOrExteriorSpace",
    "ElevationWithFlooring",
];

const REL_CONTAINED: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedElements",
    "RelatingStructure",
];

const REL_MATERIAL: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedObjects",
    "RelatingMaterial",
];

/// A STEP entity type, resolved against the known class table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IfcClass {
    CartesianPoint,
    Direction,
    ExtrudedAreaSolid,
    Polyline,
    Wall,
    WallStandardCase,
    RelContainedInSpatialStructure,
    RelAssociatesMaterial,
    Material,
    Project,
    Site,
    Building,
    BuildingStorey,
    Space,
    Slab,
    Door,
    Window,
    Roof,
    /// Any type outside the table, keeping the upper-case STEP name.
    Other(String),
}

impl IfcClass {
    /// Resolve an upper- or mixed-case STEP type name.
    pub fn from_step_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "IFCCARTESIANPOINT" => Self::CartesianPoint,
            "IFCDIRECTION" => Self::Direction,
            "IFCEXTRUDEDAREASOLID" => Self::ExtrudedAreaSolid,
            "IFCPOLYLINE" => Self::Polyline,
            "IFCWALL" => Self::Wall,
            "IFCWALLSTANDARDCASE" => Self::WallStandardCase,
            "IFCRELCONTAINEDINSPATIALSTRUCTURE" => Self::RelContainedInSpatialStructure,
            "IFCRELASSOCIATESMATERIAL" => Self::RelAssociatesMaterial,
            "IFCMATERIAL" => Self::Material,
            "IFCPROJECT" => Self::Project,
            "IFCSITE" => Self::Site,
            "IFCBUILDING" => Self::Building,
            "IFCBUILDINGSTOREY" => Self::BuildingStorey,
            "IFCSPACE" => Self::Space,
            "IFCSLAB" => Self::Slab,
            "IFCDOOR" => Self::Door,
            "IFCWINDOW" => Self::Window,
            "IFCROOF" => Self::Roof,
            other => Self::Other(other.to_string()),
        }
    }

    /// CamelCase class name as stored in the graph (`ClassName`).
    pub fn name(&self) -> String {
        let known = match self {
            Self::CartesianPoint => "IfcCartesianPoint",
            Self::Direction => "IfcDirection",
            Self::ExtrudedAreaSolid => "IfcExtrudedAreaSolid",
            Self::Polyline => "IfcPolyline",
            Self::Wall => "IfcWall",
            Self::WallStandardCase => "IfcWallStandardCase",
            Self::RelContainedInSpatialStructure => "IfcRelContainedInSpatialStructure",
            Self::RelAssociatesMaterial => "IfcRelAssociatesMaterial",
            Self::Material => "IfcMaterial",
            Self::Project => "IfcProject",
            Self::Site => "IfcSite",
            Self::Building => "IfcBuilding",
            Self::BuildingStorey => "IfcBuildingStorey",
            Self::Space => "IfcSpace",
            Self::Slab => "IfcSlab",
            Self::Door => "IfcDoor",
            Self::Window => "IfcWindow",
            Self::Roof => "IfcRoof",
            Self::Other(raw) => return camel_case_fallback(raw),
        };
        known.to_string()
    }

    /// Positional attribute names, empty for classes outside the table.
    pub fn attribute_names(&self) -> &'static [&'static str] {
        match self {
            Self::CartesianPoint => &["Coordinates"],
            Self::Direction => &["DirectionRatios"],
            Self::ExtrudedAreaSolid => &["SweptArea", "Position", "ExtrudedDirection", "Depth"],
            Self::Polyline => &["Points"],
            Self::Wall | Self::WallStandardCase => ELEMENT,
            Self::Door | Self::Window => OPENING_FILLER,
            Self::Slab => SLAB,
            Self::Roof => ROOF,
            Self::RelContainedInSpatialStructure => REL_CONTAINED,
            Self::RelAssociatesMaterial => REL_MATERIAL,
            Self::Material => &["Name"],
            Self::Project => PROJECT,
            Self::Site => SITE,
            Self::Building => BUILDING,
            Self::BuildingStorey => STOREY,
            Self::Space => SPACE,
            Self::Other(_) => &[],
        }
    }

    /// Position of a named attribute, if the class declares it.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attribute_names().iter().position(|n| *n == name)
    }

    /// Name for the attribute at `index`; undeclared positions are `Attr<i>`.
    pub fn attribute_name(&self, index: usize) -> String {
        self.attribute_names()
            .get(index)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Attr{}", index))
    }

    /// Map onto the class-tag vocabulary used by the exporter.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::CartesianPoint => EntityKind::Point,
            Self::Direction => EntityKind::Direction,
            Self::ExtrudedAreaSolid => EntityKind::ExtrudedSolid,
            Self::Polyline => EntityKind::Polyline,
            Self::Wall | Self::WallStandardCase => EntityKind::Wall,
            Self::RelContainedInSpatialStructure => EntityKind::SpatialContainment,
            _ => EntityKind::Other,
        }
    }

    pub fn is_wall(&self) -> bool {
        matches!(self, Self::Wall | Self::WallStandardCase)
    }
}

impl fmt::Display for IfcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// `IFCFOOBAR` -> `IfcFoobar`. Word boundaries are lost in STEP, so this is
/// only a readable approximation.
fn camel_case_fallback(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    match lower.strip_prefix("ifc") {
        Some(rest) => {
            let mut chars = rest.chars();
            match chars.next() {
                Some(first) => format!("Ifc{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => "Ifc".to_string(),
            }
        }
        None => {
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip() {
        let class = IfcClass::from_step_name("IFCCARTESIANPOINT");
        assert_eq!(class, IfcClass::CartesianPoint);
        assert_eq!(class.name(), "IfcCartesianPoint");
        assert_eq!(IfcClass::from_step_name("IfcWallStandardCase"), IfcClass::WallStandardCase);
    }

    #[test]
    fn test_unknown_class_fallback() {
        let class = IfcClass::from_step_name("IFCOWNERHISTORY");
        assert_eq!(class, IfcClass::Other("IFCOWNERHISTORY".into()));
        assert_eq!(class.name(), "IfcOwnerhistory");
        assert_eq!(class.kind(), EntityKind::Other);
        assert_eq!(class.attribute_name(2), "Attr2");
    }

    #[test]
    fn test_attribute_lookup() {
        let rel = IfcClass::RelContainedInSpatialStructure;
        assert_eq!(rel.attribute_index("RelatingStructure"), Some(5));
        assert_eq!(rel.attribute_index("OverallWidth"), None);
        assert_eq!(IfcClass::Door.attribute_index("OverallWidth"), Some(9));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(IfcClass::Direction.kind(), EntityKind::Direction);
        assert_eq!(IfcClass::WallStandardCase.kind(), EntityKind::Wall);
        assert_eq!(IfcClass::Polyline.kind(), EntityKind::Polyline);
        assert_eq!(IfcClass::Site.kind(), EntityKind::Other);
    }
}

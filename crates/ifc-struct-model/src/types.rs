// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for the entity graph
//!
//! This module defines the fundamental value types shared by the codec and
//! the structural mapping layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the STEP instance name (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Generates `IfcType` together with its name table so that
/// `IfcType::parse(t.name()) == t` holds for every known variant.
macro_rules! ifc_types {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// Covers the entity types the structural exchange reads or writes.
        /// Anything else is captured as `Unknown` with its upper-case name.
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum IfcType {
            $($variant,)*
            /// Unknown type - stores the upper-case type name
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type name string into an IfcType (case-insensitive)
            pub fn parse(s: &str) -> Self {
                let upper = s.to_ascii_uppercase();
                match upper.as_str() {
                    $($name => IfcType::$variant,)*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Get the STEP type name (upper case)
            pub fn name(&self) -> &str {
                match self {
                    $(IfcType::$variant => $name,)*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // ========================================================================
    // Spatial Structure
    // ========================================================================
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // ========================================================================
    // Building Elements
    // ========================================================================
    IfcBeam => "IFCBEAM",
    IfcColumn => "IFCCOLUMN",
    IfcSlab => "IFCSLAB",
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcMember => "IFCMEMBER",
    IfcPlate => "IFCPLATE",
    IfcFooting => "IFCFOOTING",

    // ========================================================================
    // Structural Analysis
    // ========================================================================
    IfcStructuralPointConnection => "IFCSTRUCTURALPOINTCONNECTION",
    IfcStructuralCurveMember => "IFCSTRUCTURALCURVEMEMBER",
    IfcStructuralSurfaceMember => "IFCSTRUCTURALSURFACEMEMBER",
    IfcRelConnectsStructuralMember => "IFCRELCONNECTSSTRUCTURALMEMBER",
    IfcBoundaryNodeCondition => "IFCBOUNDARYNODECONDITION",
    IfcStructuralLoadSingleForce => "IFCSTRUCTURALLOADSINGLEFORCE",
    IfcStructuralLoadLinearForce => "IFCSTRUCTURALLOADLINEARFORCE",
    IfcStructuralLoadPlanarForce => "IFCSTRUCTURALLOADPLANARFORCE",
    IfcStructuralLoadSingleDisplacement => "IFCSTRUCTURALLOADSINGLEDISPLACEMENT",
    IfcStructuralLoadTemperature => "IFCSTRUCTURALLOADTEMPERATURE",
    IfcStructuralLoadCase => "IFCSTRUCTURALLOADCASE",
    IfcStructuralLoadGroup => "IFCSTRUCTURALLOADGROUP",

    // ========================================================================
    // Points, Directions and Placement
    // ========================================================================
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcDirection => "IFCDIRECTION",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcLocalPlacement => "IFCLOCALPLACEMENT",

    // ========================================================================
    // Representation Contexts
    // ========================================================================
    IfcGeometricRepresentationContext => "IFCGEOMETRICREPRESENTATIONCONTEXT",
    IfcGeometricRepresentationSubContext => "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",

    // ========================================================================
    // Profiles (2D cross-sections)
    // ========================================================================
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcRectangleHollowProfileDef => "IFCRECTANGLEHOLLOWPROFILEDEF",
    IfcIShapeProfileDef => "IFCISHAPEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcCircleHollowProfileDef => "IFCCIRCLEHOLLOWPROFILEDEF",
    IfcLShapeProfileDef => "IFCLSHAPEPROFILEDEF",
    IfcTShapeProfileDef => "IFCTSHAPEPROFILEDEF",
    IfcUShapeProfileDef => "IFCUSHAPEPROFILEDEF",
    IfcCShapeProfileDef => "IFCCSHAPEPROFILEDEF",
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",

    // ========================================================================
    // Relationships
    // ========================================================================
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL",

    // ========================================================================
    // Properties
    // ========================================================================
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE",
    IfcPropertyBoundedValue => "IFCPROPERTYBOUNDEDVALUE",
    IfcPropertyListValue => "IFCPROPERTYLISTVALUE",
    IfcComplexProperty => "IFCCOMPLEXPROPERTY",
    IfcMaterialProperties => "IFCMATERIALPROPERTIES",

    // ========================================================================
    // Materials
    // ========================================================================
    IfcMaterial => "IFCMATERIAL",
    IfcMaterialLayer => "IFCMATERIALLAYER",
    IfcMaterialLayerSet => "IFCMATERIALLAYERSET",
    IfcMaterialLayerSetUsage => "IFCMATERIALLAYERSETUSAGE",
    IfcMaterialList => "IFCMATERIALLIST",
    IfcMaterialConstituent => "IFCMATERIALCONSTITUENT",
    IfcMaterialConstituentSet => "IFCMATERIALCONSTITUENTSET",
    IfcMaterialProfile => "IFCMATERIALPROFILE",
    IfcMaterialProfileSet => "IFCMATERIALPROFILESET",
    IfcMaterialProfileSetUsage => "IFCMATERIALPROFILESETUSAGE",

    // ========================================================================
    // Units
    // ========================================================================
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",

    // ========================================================================
    // Authoring metadata
    // ========================================================================
    IfcApplication => "IFCAPPLICATION",
    IfcOrganization => "IFCORGANIZATION",
    IfcPostalAddress => "IFCPOSTALADDRESS",
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Check if this type is a profile definition (known or not)
    pub fn is_profile(&self) -> bool {
        match self {
            IfcType::IfcRectangleProfileDef
            | IfcType::IfcRectangleHollowProfileDef
            | IfcType::IfcIShapeProfileDef
            | IfcType::IfcCircleProfileDef
            | IfcType::IfcCircleHollowProfileDef
            | IfcType::IfcLShapeProfileDef
            | IfcType::IfcTShapeProfileDef
            | IfcType::IfcUShapeProfileDef
            | IfcType::IfcCShapeProfileDef
            | IfcType::IfcArbitraryClosedProfileDef => true,
            IfcType::Unknown(name) => name.ends_with("PROFILEDEF"),
            _ => false,
        }
    }

    /// Check if this type belongs to the structural load family
    /// (load values, not load groups or cases)
    pub fn is_structural_load(&self) -> bool {
        match self {
            IfcType::IfcStructuralLoadSingleForce
            | IfcType::IfcStructuralLoadLinearForce
            | IfcType::IfcStructuralLoadPlanarForce
            | IfcType::IfcStructuralLoadSingleDisplacement
            | IfcType::IfcStructuralLoadTemperature => true,
            IfcType::Unknown(name) => name.starts_with("IFCSTRUCTURALLOAD"),
            _ => false,
        }
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Attribute value
///
/// Represents any value that can appear in an entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// String value
    pub fn string(s: impl Into<String>) -> Self {
        AttributeValue::String(s.into())
    }

    /// String value, or null when absent
    pub fn opt_string(s: Option<&str>) -> Self {
        s.map(AttributeValue::string).unwrap_or(AttributeValue::Null)
    }

    /// Enumeration value
    pub fn enumeration(s: impl Into<String>) -> Self {
        AttributeValue::Enum(s.into())
    }

    /// Reference, or null when absent
    pub fn opt_ref(id: Option<EntityId>) -> Self {
        id.map(AttributeValue::EntityRef)
            .unwrap_or(AttributeValue::Null)
    }

    /// List of references
    pub fn refs(ids: impl IntoIterator<Item = EntityId>) -> Self {
        AttributeValue::List(ids.into_iter().map(AttributeValue::EntityRef).collect())
    }

    /// List of reals
    pub fn reals(values: impl IntoIterator<Item = f64>) -> Self {
        AttributeValue::List(values.into_iter().map(AttributeValue::Float).collect())
    }

    /// Typed single-argument value like IFCREAL(1.0)
    pub fn typed(type_name: impl Into<String>, value: AttributeValue) -> Self {
        AttributeValue::TypedValue(type_name.into(), vec![value])
    }

    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    /// Try to get as boolean
    ///
    /// Accepts native booleans, `.T.`/`.F.` enumerations and typed
    /// wrappers such as `IFCBOOLEAN(.T.)`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_bool(),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Append every entity reference held by this value, nested ones included
    pub fn collect_refs(&self, out: &mut Vec<EntityId>) {
        match self {
            AttributeValue::EntityRef(id) => out.push(*id),
            AttributeValue::List(items) | AttributeValue::TypedValue(_, items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            _ => {}
        }
    }
}

/// Graph entity
///
/// An entity with its instance id, type, and ordered attribute values.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl Entity {
    /// Create a new entity
    pub fn new(id: EntityId, ifc_type: IfcType, attributes: Vec<AttributeValue>) -> Self {
        Self {
            id,
            ifc_type,
            attributes,
        }
    }

    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get boolean at index
    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(|v| v.as_bool())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }

    /// All entity references held by this entity, in attribute order
    pub fn references(&self) -> Vec<EntityId> {
        let mut refs = Vec::new();
        for attr in &self.attributes {
            attr.collect_refs(&mut refs);
        }
        refs
    }
}

/// File-level metadata carried in the exchange header
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4")
    pub schema_version: String,
    /// Originating system (authoring application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// File description (view definition)
    pub file_description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_round_trip() {
        for name in [
            "IFCPROJECT",
            "IFCBUILDINGSTOREY",
            "IFCSTRUCTURALPOINTCONNECTION",
            "IFCISHAPEPROFILEDEF",
            "IFCMATERIALPROFILESETUSAGE",
            "IFCSIUNIT",
        ] {
            let ty = IfcType::parse(name);
            assert!(!matches!(ty, IfcType::Unknown(_)), "{name} should be known");
            assert_eq!(ty.name(), name);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(IfcType::parse("IfcBeam"), IfcType::IfcBeam);
        assert_eq!(
            IfcType::parse("IfcFancyThing"),
            IfcType::Unknown("IFCFANCYTHING".to_string())
        );
    }

    #[test]
    fn test_profile_and_load_families() {
        assert!(IfcType::IfcCircleProfileDef.is_profile());
        assert!(IfcType::parse("IFCZSHAPEPROFILEDEF").is_profile());
        assert!(!IfcType::IfcBeam.is_profile());

        assert!(IfcType::IfcStructuralLoadTemperature.is_structural_load());
        assert!(IfcType::parse("IFCSTRUCTURALLOADSINGLEFORCEWARPING").is_structural_load());
        assert!(!IfcType::IfcStructuralLoadCase.is_structural_load());
        assert!(!IfcType::IfcStructuralLoadGroup.is_structural_load());
    }

    #[test]
    fn test_bool_accessors() {
        assert_eq!(AttributeValue::Enum("T".into()).as_bool(), Some(true));
        assert_eq!(
            AttributeValue::typed("IFCBOOLEAN", AttributeValue::Enum("F".into())).as_bool(),
            Some(false)
        );
        assert_eq!(AttributeValue::Float(1.0).as_bool(), None);
    }

    #[test]
    fn test_entity_references_include_nested() {
        let entity = Entity::new(
            EntityId(10),
            IfcType::IfcRelAggregates,
            vec![
                AttributeValue::string("guid"),
                AttributeValue::Null,
                AttributeValue::EntityRef(EntityId(1)),
                AttributeValue::refs([EntityId(2), EntityId(3)]),
            ],
        );
        assert_eq!(
            entity.references(),
            vec![EntityId(1), EntityId(2), EntityId(3)]
        );
        assert_eq!(entity.get_refs(3), Some(vec![EntityId(2), EntityId(3)]));
    }
}

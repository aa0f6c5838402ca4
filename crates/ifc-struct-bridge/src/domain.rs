// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural domain model
//!
//! These are the caller-owned records exchanged with the analysis side.
//! Ids are caller-defined strings, unique within one [`StructuralModel`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete structural model bundle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralModel {
    pub project_info: ProjectInfo,
    pub spatial_nodes: Vec<SpatialNode>,
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
    pub materials: Vec<Material>,
    pub sections: Vec<Section>,
    pub loads: Vec<Load>,
    pub load_cases: Vec<LoadCase>,
}

/// Project level information
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub site_name: Option<String>,
    pub building_name: Option<String>,
    pub building_description: Option<String>,
    pub building_address: Option<PostalAddress>,
    /// Authoring application found on import
    pub application: Option<ApplicationInfo>,
    /// Metres per file length unit, found on import
    pub length_unit_scale: Option<f64>,
}

/// Postal address of the building
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    /// First address line
    pub street: Option<String>,
    pub town: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl PostalAddress {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.town.is_none()
            && self.region.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// Authoring application name and version
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: String,
}

/// Restraint state of one degree of freedom
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dof {
    Fixed,
    #[default]
    Free,
}

impl Dof {
    pub fn is_fixed(self) -> bool {
        self == Dof::Fixed
    }

    pub fn from_fixed(fixed: bool) -> Self {
        if fixed {
            Dof::Fixed
        } else {
            Dof::Free
        }
    }
}

/// Per-DOF restraints of a node, all free by default
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConditions {
    pub translation_x: Dof,
    pub translation_y: Dof,
    pub translation_z: Dof,
    pub rotation_x: Dof,
    pub rotation_y: Dof,
    pub rotation_z: Dof,
}

impl BoundaryConditions {
    /// All six DOFs fixed
    pub fn fixed() -> Self {
        Self::from_array([Dof::Fixed; 6])
    }

    /// Translations fixed, rotations free
    pub fn pinned() -> Self {
        Self::from_array([Dof::Fixed, Dof::Fixed, Dof::Fixed, Dof::Free, Dof::Free, Dof::Free])
    }

    /// DOFs in translation x/y/z, rotation x/y/z order
    pub fn as_array(&self) -> [Dof; 6] {
        [
            self.translation_x,
            self.translation_y,
            self.translation_z,
            self.rotation_x,
            self.rotation_y,
            self.rotation_z,
        ]
    }

    pub fn from_array(dofs: [Dof; 6]) -> Self {
        let [translation_x, translation_y, translation_z, rotation_x, rotation_y, rotation_z] = dofs;
        Self {
            translation_x,
            translation_y,
            translation_z,
            rotation_x,
            rotation_y,
            rotation_z,
        }
    }

    /// True when at least one DOF is restrained
    pub fn any_fixed(&self) -> bool {
        self.as_array().iter().any(|dof| dof.is_fixed())
    }
}

/// Analysis node
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub coordinates: [f64; 3],
    #[serde(default)]
    pub boundary_conditions: BoundaryConditions,
}

/// Element category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    #[default]
    Beam,
    Column,
    Slab,
    Wall,
    GenericMember,
}

/// Element property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Structural element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: ElementKind,
    /// IFC PredefinedType token, e.g. `RIGID_JOINED_MEMBER`
    pub predefined_type: Option<String>,
    /// Start and end node ids; required for export
    pub nodes: Option<[String; 2]>,
    /// Section id
    pub section: Option<String>,
    /// Material name
    pub material: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub placement: Option<GlobalPlacement>,
}

/// Material definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub properties: BTreeMap<String, f64>,
}

/// Cross-section shape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionProfile {
    Rectangle {
        width: f64,
        height: f64,
    },
    IShape {
        overall_width: f64,
        overall_depth: f64,
        web_thickness: f64,
        flange_thickness: f64,
    },
    /// Shape this exchange does not model
    Unknown { kind: String },
}

/// Named cross-section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub profile: SectionProfile,
}

/// Load value variants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadValue {
    /// Concentrated force and moment
    PointForceMoment { force: [f64; 3], moment: [f64; 3] },
    /// Force and moment per unit length
    LinearForceMoment { force: [f64; 3], moment: [f64; 3] },
    /// Load type this exchange does not model
    Unknown { type_name: String },
}

/// Load definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub value: LoadValue,
}

/// Named loading scenario
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCase {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub action_type: Option<String>,
    pub action_source: Option<String>,
}

/// Spatial hierarchy level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialKind {
    Site,
    Building,
    Storey,
    Space,
}

/// Entry of the spatial hierarchy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: SpatialKind,
    /// Storeys only
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Resolved world transform
///
/// `rotation` is row-major; its columns are the local x, y and z axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalPlacement {
    pub location: [f64; 3],
    pub rotation: [[f64; 3]; 3],
}

impl GlobalPlacement {
    pub fn identity() -> Self {
        Self::at([0.0; 3])
    }

    /// Translation-only placement
    pub fn at(location: [f64; 3]) -> Self {
        Self {
            location,
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Local x axis in world coordinates
    pub fn x_axis(&self) -> [f64; 3] {
        [self.rotation[0][0], self.rotation[1][0], self.rotation[2][0]]
    }

    /// Local z axis in world coordinates
    pub fn z_axis(&self) -> [f64; 3] {
        [self.rotation[0][2], self.rotation[1][2], self.rotation[2][2]]
    }
}

impl Default for GlobalPlacement {
    fn default() -> Self {
        Self::identity()
    }
}

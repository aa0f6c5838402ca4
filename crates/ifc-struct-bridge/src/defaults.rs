// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Default values used when the source data leaves something out

use crate::domain::ElementKind;

pub const PROJECT_NAME: &str = "Structural Project";
pub const SITE_NAME: &str = "Project Site";
pub const BUILDING_NAME: &str = "Main Building";
pub const STOREY_NAME: &str = "Level";
pub const SPACE_NAME: &str = "Space";
pub const NODE_NAME: &str = "Node";
pub const MATERIAL_NAME: &str = "Material";
pub const SECTION_NAME: &str = "Section";
pub const LOAD_NAME: &str = "Load";
pub const LOAD_CASE_NAME: &str = "Load Case";
pub const BOUNDARY_CONDITION_NAME: &str = "BoundaryCondition";

/// Property set holding material property-bag values
pub const MATERIAL_PSET_NAME: &str = "MaterialProperties";
/// Property set holding element property-bag values
pub const ELEMENT_PSET_NAME: &str = "Pset_StructuralElement";
/// Property that marks a wall as load bearing
pub const LOAD_BEARING_PROPERTY: &str = "LoadBearing";

/// Rectangle written for unsupported profiles (width, height)
pub const FALLBACK_RECTANGLE: (f64, f64) = (300.0, 600.0);
/// I-shape dimensions used when a profile entity omits one
/// (overall width, overall depth, web thickness, flange thickness)
pub const ISHAPE_DIMENSIONS: (f64, f64, f64, f64) = (200.0, 400.0, 10.0, 15.0);

/// PredefinedType of analytical members and of physical elements
pub const MEMBER_PREDEFINED_TYPE: &str = "RIGID_JOINED_MEMBER";
pub const ELEMENT_PREDEFINED_TYPE: &str = "NOTDEFINED";

pub const ACTION_TYPE: &str = "PERMANENT_G";
pub const ACTION_SOURCE: &str = "DEAD_LOAD_G";

pub const APPLICATION_NAME: &str = "IFC-Struct";
pub const APPLICATION_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APPLICATION_IDENTIFIER: &str = "ifc-struct-bridge";
pub const APPLICATION_DEVELOPER: &str = "IFC-Struct Contributors";
/// Version stamped on exports aimed at a specific target tool
pub const TARGET_TOOL_VERSION: &str = "2024";

/// Placement chains deeper than this are treated as malformed
pub const MAX_PLACEMENT_DEPTH: usize = 64;
/// Precision of the geometric representation context
pub const GEOMETRIC_PRECISION: f64 = 1.0e-5;

/// Name given to an exported element without one
pub fn element_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Beam => "Beam",
        ElementKind::Column => "Column",
        ElementKind::Slab => "Slab",
        ElementKind::Wall => "Wall",
        ElementKind::GenericMember => "Member",
    }
}

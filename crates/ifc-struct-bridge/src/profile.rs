// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section profile mapping

use crate::defaults::{FALLBACK_RECTANGLE, ISHAPE_DIMENSIONS};
use crate::domain::SectionProfile;
use ifc_struct_model::{AttributeValue, Entity, IfcType};
use log::debug;

/// Profile entity type and attributes for a section
///
/// Unknown shapes are written as the fallback rectangle, so this never fails.
pub fn profile_entity(profile: &SectionProfile, name: &str) -> (IfcType, Vec<AttributeValue>) {
    // ProfileType, ProfileName, Position
    let mut attrs = vec![
        AttributeValue::enumeration("AREA"),
        AttributeValue::string(name),
        AttributeValue::Null,
    ];

    match profile {
        SectionProfile::Rectangle { width, height } => {
            attrs.extend([AttributeValue::Float(*width), AttributeValue::Float(*height)]);
            (IfcType::IfcRectangleProfileDef, attrs)
        }
        SectionProfile::IShape {
            overall_width,
            overall_depth,
            web_thickness,
            flange_thickness,
        } => {
            attrs.extend([
                AttributeValue::Float(*overall_width),
                AttributeValue::Float(*overall_depth),
                AttributeValue::Float(*web_thickness),
                AttributeValue::Float(*flange_thickness),
                // FilletRadius, FlangeEdgeRadius, FlangeSlope
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
            ]);
            (IfcType::IfcIShapeProfileDef, attrs)
        }
        SectionProfile::Unknown { kind } => {
            debug!("Section '{name}' has unsupported shape '{kind}', writing fallback rectangle");
            let (width, height) = FALLBACK_RECTANGLE;
            attrs.extend([AttributeValue::Float(width), AttributeValue::Float(height)]);
            (IfcType::IfcRectangleProfileDef, attrs)
        }
    }
}

/// Section shape of a profile entity
///
/// Returns `None` for profile types without a domain counterpart.
pub fn section_profile(entity: &Entity) -> Option<SectionProfile> {
    match entity.ifc_type {
        // IfcRectangleProfileDef: XDim (3), YDim (4)
        IfcType::IfcRectangleProfileDef => Some(SectionProfile::Rectangle {
            width: entity.get_float(3).unwrap_or(FALLBACK_RECTANGLE.0),
            height: entity.get_float(4).unwrap_or(FALLBACK_RECTANGLE.1),
        }),
        // IfcIShapeProfileDef: OverallWidth (3), OverallDepth (4),
        // WebThickness (5), FlangeThickness (6)
        IfcType::IfcIShapeProfileDef => {
            let (w, d, tw, tf) = ISHAPE_DIMENSIONS;
            Some(SectionProfile::IShape {
                overall_width: entity.get_float(3).unwrap_or(w),
                overall_depth: entity.get_float(4).unwrap_or(d),
                web_thickness: entity.get_float(5).unwrap_or(tw),
                flange_thickness: entity.get_float(6).unwrap_or(tf),
            })
        }
        ref other => {
            debug!("Skipping unsupported profile {} ({other})", entity.id);
            None
        }
    }
}

/// Profile name (index 1)
pub fn profile_name(entity: &Entity) -> Option<&str> {
    entity.get_string(1)
}

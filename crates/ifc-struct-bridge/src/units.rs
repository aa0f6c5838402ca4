// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length units
//!
//! Reads the project length unit on import and describes the unit written
//! on export.

use ifc_struct_model::{AttributeValue, Entity, EntityResolver, IfcType};
use serde::{Deserialize, Serialize};

/// Length unit written into exported files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Metre,
    Centimetre,
    #[default]
    Millimetre,
}

impl LengthUnit {
    /// SI prefix enumeration value, `None` for plain metres
    pub fn si_prefix(self) -> Option<&'static str> {
        match self {
            LengthUnit::Metre => None,
            LengthUnit::Centimetre => Some("CENTI"),
            LengthUnit::Millimetre => Some("MILLI"),
        }
    }

    /// Metres per unit
    pub fn scale(self) -> f64 {
        self.si_prefix().map(prefix_scale).unwrap_or(1.0)
    }
}

/// Scale of an SI prefix enumeration value
pub fn prefix_scale(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// Extract the length unit scale of the first project
///
/// Follows IfcProject.UnitsInContext to the length unit. Returns `None` if
/// no length unit is declared.
pub fn length_unit_scale<R: EntityResolver + ?Sized>(resolver: &R) -> Option<f64> {
    let project = resolver
        .entities_by_type(&IfcType::IfcProject)
        .into_iter()
        .next()?;

    // IfcProject.UnitsInContext at index 8
    let assignment = resolver.get(project.get_ref(8)?)?;
    if assignment.ifc_type != IfcType::IfcUnitAssignment {
        return None;
    }

    // IfcUnitAssignment.Units at index 0
    assignment
        .get(0)
        .map(|units| resolver.resolve_ref_list(units))
        .unwrap_or_default()
        .into_iter()
        .find_map(|unit| length_scale_of(unit, resolver, 0))
}

/// Scale of a unit entity if it is a length unit
fn length_scale_of<R: EntityResolver + ?Sized>(unit: &Entity, resolver: &R, depth: usize) -> Option<f64> {
    if depth > 8 || unit.get_enum(1)? != "LENGTHUNIT" {
        return None;
    }
    match unit.ifc_type {
        // IfcSIUnit(*, UnitType, Prefix, Name)
        IfcType::IfcSIUnit => {
            if unit.get_enum(3)? != "METRE" {
                return None;
            }
            Some(unit.get_enum(2).map(prefix_scale).unwrap_or(1.0))
        }
        // IfcConversionBasedUnit(Dimensions, UnitType, Name, ConversionFactor)
        IfcType::IfcConversionBasedUnit => {
            let factor = resolver.get(unit.get_ref(3)?)?;
            if factor.ifc_type != IfcType::IfcMeasureWithUnit {
                return None;
            }
            // IfcMeasureWithUnit(ValueComponent, UnitComponent)
            let value = factor.get(0).and_then(AttributeValue::as_float)?;
            let base = factor
                .get_ref(1)
                .and_then(|id| resolver.get(id))
                .and_then(|base| length_scale_of(base, resolver, depth + 1))
                .unwrap_or(1.0);
            Some(value * base)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_struct_model::{EntityGraph, EntityId};

    fn project_with_units(graph: &mut EntityGraph, units: Vec<EntityId>) {
        let assignment = graph
            .add(IfcType::IfcUnitAssignment, vec![AttributeValue::refs(units)])
            .unwrap();
        let mut attrs = vec![AttributeValue::Null; 8];
        attrs.push(AttributeValue::EntityRef(assignment));
        graph.add(IfcType::IfcProject, attrs).unwrap();
    }

    fn si_unit(graph: &mut EntityGraph, unit_type: &str, prefix: Option<&str>, name: &str) -> EntityId {
        graph
            .add(
                IfcType::IfcSIUnit,
                vec![
                    AttributeValue::Derived,
                    AttributeValue::enumeration(unit_type),
                    prefix.map(AttributeValue::enumeration).unwrap_or_default(),
                    AttributeValue::enumeration(name),
                ],
            )
            .unwrap()
    }

    #[test]
    fn test_millimetre_project() {
        let mut graph = EntityGraph::new();
        let angle = si_unit(&mut graph, "PLANEANGLEUNIT", None, "RADIAN");
        let length = si_unit(&mut graph, "LENGTHUNIT", Some("MILLI"), "METRE");
        project_with_units(&mut graph, vec![angle, length]);
        assert_eq!(length_unit_scale(&graph), Some(1e-3));
    }

    #[test]
    fn test_conversion_based_foot() {
        let mut graph = EntityGraph::new();
        let metre = si_unit(&mut graph, "LENGTHUNIT", None, "METRE");
        let measure = graph
            .add(
                IfcType::IfcMeasureWithUnit,
                vec![
                    AttributeValue::typed("IFCLENGTHMEASURE", AttributeValue::Float(0.3048)),
                    AttributeValue::EntityRef(metre),
                ],
            )
            .unwrap();
        let foot = graph
            .add(
                IfcType::IfcConversionBasedUnit,
                vec![
                    AttributeValue::Null,
                    AttributeValue::enumeration("LENGTHUNIT"),
                    AttributeValue::string("FOOT"),
                    AttributeValue::EntityRef(measure),
                ],
            )
            .unwrap();
        project_with_units(&mut graph, vec![foot]);
        assert_eq!(length_unit_scale(&graph), Some(0.3048));
    }

    #[test]
    fn test_no_units() {
        assert_eq!(length_unit_scale(&EntityGraph::new()), None);
        assert_eq!(LengthUnit::Millimetre.scale(), 1e-3);
        assert_eq!(LengthUnit::Metre.scale(), 1.0);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load value mapping

use crate::defaults;
use crate::domain::{Load, LoadValue};
use ifc_struct_model::{AttributeValue, Entity, IfcType};
use std::collections::BTreeMap;

const POINT_KEYS: [&str; 6] = ["force_x", "force_y", "force_z", "moment_x", "moment_y", "moment_z"];
const LINEAR_KEYS: [&str; 6] = [
    "linear_force_x",
    "linear_force_y",
    "linear_force_z",
    "linear_moment_x",
    "linear_moment_y",
    "linear_moment_z",
];

impl LoadValue {
    /// Named components of this value; empty for unknown load types
    pub fn components(&self) -> BTreeMap<&'static str, f64> {
        let (keys, force, moment) = match self {
            LoadValue::PointForceMoment { force, moment } => (&POINT_KEYS, force, moment),
            LoadValue::LinearForceMoment { force, moment } => (&LINEAR_KEYS, force, moment),
            LoadValue::Unknown { .. } => return BTreeMap::new(),
        };
        keys.iter()
            .copied()
            .zip(force.iter().chain(moment.iter()).copied())
            .collect()
    }
}

/// Read the six components at indices 1..=6, 0.0 when absent
fn six_components(entity: &Entity) -> ([f64; 3], [f64; 3]) {
    let c = |i: usize| entity.get_float(i).unwrap_or(0.0);
    ([c(1), c(2), c(3)], [c(4), c(5), c(6)])
}

/// Load value of a structural load entity
///
/// Single forces and linear forces map to their domain variants; every
/// other load type becomes `Unknown` carrying its type name.
pub fn load_value(entity: &Entity) -> LoadValue {
    match entity.ifc_type {
        IfcType::IfcStructuralLoadSingleForce => {
            let (force, moment) = six_components(entity);
            LoadValue::PointForceMoment { force, moment }
        }
        IfcType::IfcStructuralLoadLinearForce => {
            let (force, moment) = six_components(entity);
            LoadValue::LinearForceMoment { force, moment }
        }
        ref other => LoadValue::Unknown {
            type_name: other.name().to_string(),
        },
    }
}

/// Entity type and attributes for a load, if it can be exported
///
/// Only point forces are written.
pub fn load_entity(load: &Load) -> Option<(IfcType, Vec<AttributeValue>)> {
    let LoadValue::PointForceMoment { force, moment } = &load.value else {
        return None;
    };
    let mut attrs = vec![AttributeValue::string(
        load.name.as_deref().unwrap_or(defaults::LOAD_NAME),
    )];
    attrs.extend(force.iter().chain(moment.iter()).map(|v| AttributeValue::Float(*v)));
    Some((IfcType::IfcStructuralLoadSingleForce, attrs))
}

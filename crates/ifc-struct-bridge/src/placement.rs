// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement resolution
//!
//! Composes `IfcLocalPlacement` chains into world transforms. Every
//! transform produced here has a finite translation and an orthonormal
//! rotation, whatever the input looks like.

use crate::defaults::MAX_PLACEMENT_DEPTH;
use crate::domain::GlobalPlacement;
use ifc_struct_model::{AttributeValue, EntityId, EntityResolver, IfcType};
use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use rustc_hash::FxHashSet;

const EPSILON: f64 = 1e-12;

/// One link of a placement chain
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Transform from this placement's frame to its parent's frame
    pub local: Matrix4<f64>,
    /// `PlacementRelTo`
    pub parent: Option<EntityId>,
}

impl Placement {
    /// Read an `IfcLocalPlacement`
    ///
    /// Returns `None` if the entity is missing or of another type.
    pub fn read<R: EntityResolver + ?Sized>(resolver: &R, id: EntityId) -> Option<Self> {
        let placement = resolver.get(id)?;
        if placement.ifc_type != IfcType::IfcLocalPlacement {
            debug!("{id} is {} not IFCLOCALPLACEMENT", placement.ifc_type);
            return None;
        }

        // RelativePlacement at index 1
        let local = placement
            .get_ref(1)
            .map(|axis| resolve_axis_placement(resolver, axis))
            .unwrap_or_else(Matrix4::identity);

        Some(Self {
            local,
            // PlacementRelTo at index 0
            parent: placement.get_ref(0),
        })
    }
}

/// Resolve a placement id to its world transform
///
/// Walks `PlacementRelTo` from leaf to root, left-multiplying each local
/// transform. Missing placements count as identity. Cycles and chains
/// deeper than [`MAX_PLACEMENT_DEPTH`] are cut with a warning.
pub fn resolve_global_placement<R: EntityResolver + ?Sized>(
    resolver: &R,
    placement_id: Option<EntityId>,
) -> GlobalPlacement {
    let mut transform = Matrix4::identity();
    let mut visited = FxHashSet::default();
    let mut current = placement_id;

    while let Some(id) = current {
        if !visited.insert(id) {
            warn!("Placement cycle at {id}, chain cut");
            break;
        }
        if visited.len() > MAX_PLACEMENT_DEPTH {
            warn!("Placement chain from {placement_id:?} exceeds {MAX_PLACEMENT_DEPTH} levels, chain cut");
            break;
        }
        let Some(link) = Placement::read(resolver, id) else {
            break;
        };
        transform = link.local * transform;
        current = link.parent;
    }

    // Finite links can still overflow once summed along the chain
    for row in 0..3 {
        if !transform[(row, 3)].is_finite() {
            warn!("Placement {placement_id:?} overflows on axis {row}, using 0.0");
            transform[(row, 3)] = 0.0;
        }
    }
    if transform.fixed_view::<3, 3>(0, 0).iter().any(|v| !v.is_finite()) {
        warn!("Placement {placement_id:?} has a non-finite rotation, using identity");
        transform.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
    }

    to_global_placement(&transform)
}

/// Resolve an `IfcAxis2Placement3D` to a rigid transform
///
/// Location defaults to the origin, Axis to +Z and RefDirection to +X.
/// A degenerate axis or a RefDirection parallel to it falls back to a
/// perpendicular default.
pub fn resolve_axis_placement<R: EntityResolver + ?Sized>(resolver: &R, id: EntityId) -> Matrix4<f64> {
    let Some(placement) = resolver.get(id) else {
        return Matrix4::identity();
    };
    if placement.ifc_type != IfcType::IfcAxis2Placement3D {
        debug!("{id} is {} not IFCAXIS2PLACEMENT3D", placement.ifc_type);
        return Matrix4::identity();
    }

    // Location (index 0)
    let location = placement
        .get_ref(0)
        .and_then(|p| read_triple(resolver, p, IfcType::IfcCartesianPoint))
        .unwrap_or_else(Vector3::zeros);

    // Axis (index 1) - Z direction, optional
    let axis = placement
        .get_ref(1)
        .and_then(|d| read_triple(resolver, d, IfcType::IfcDirection));

    // RefDirection (index 2) - X direction, optional
    let ref_dir = placement
        .get_ref(2)
        .and_then(|d| read_triple(resolver, d, IfcType::IfcDirection));

    let (x, y, z) = orthonormal_basis(axis, ref_dir);

    Matrix4::new(
        x.x, y.x, z.x, location.x, //
        x.y, y.y, z.y, location.y, //
        x.z, y.z, z.z, location.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Build a right-handed orthonormal basis from optional Axis and RefDirection
pub fn orthonormal_basis(
    axis: Option<Vector3<f64>>,
    ref_dir: Option<Vector3<f64>>,
) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let z = axis.and_then(unit).unwrap_or_else(Vector3::z);

    // Candidates in order of preference; the first not parallel to z wins
    let candidates = [ref_dir.and_then(unit).unwrap_or_else(Vector3::x), Vector3::x(), Vector3::y()];
    let y = candidates
        .iter()
        .find_map(|x| z.cross(x).try_normalize(1e-9))
        .unwrap_or_else(Vector3::y);
    let x = y.cross(&z).normalize();

    (x, y, z)
}

/// Unit vector along `v`, or `None` when `v` has no usable direction
///
/// Scales by the largest component first so that huge finite ratios do
/// not overflow the norm.
fn unit(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let scale = v.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }
    (v / scale)
        .try_normalize(EPSILON)
        .filter(|u| u.iter().all(|c| c.is_finite()))
}

/// Read a 3-component list from a point or direction, sanitizing non-finite values
fn read_triple<R: EntityResolver + ?Sized>(
    resolver: &R,
    id: EntityId,
    expected: IfcType,
) -> Option<Vector3<f64>> {
    let entity = resolver.get(id)?;
    if entity.ifc_type != expected {
        return None;
    }

    // Coordinates / DirectionRatios at index 0
    let values = entity.get_list(0)?;
    let component = |i: usize| -> f64 {
        let v = values.get(i).and_then(AttributeValue::as_float).unwrap_or(0.0);
        if v.is_finite() {
            v
        } else {
            warn!("Non-finite component in {id}, using 0.0");
            0.0
        }
    };

    Some(Vector3::new(component(0), component(1), component(2)))
}

/// Split a 4x4 rigid transform into location and row-major rotation
pub fn to_global_placement(m: &Matrix4<f64>) -> GlobalPlacement {
    let mut rotation = [[0.0; 3]; 3];
    for (i, row) in rotation.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = m[(i, j)];
        }
    }
    GlobalPlacement {
        location: [m[(0, 3)], m[(1, 3)], m[(2, 3)]],
        rotation,
    }
}

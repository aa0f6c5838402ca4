// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolution trait for looking up and resolving entities

use crate::{AttributeValue, Entity, EntityId, IfcType};

/// Entity lookup and reference resolution
///
/// Implementations should provide O(1) lookup by entity ID.
///
/// # Example
///
/// ```ignore
/// use ifc_struct_model::{EntityResolver, EntityId};
///
/// fn placement_of(resolver: &dyn EntityResolver, beam_id: EntityId) {
///     if let Some(beam) = resolver.get(beam_id) {
///         if let Some(placement) = beam.get(5).and_then(|a| resolver.resolve_ref(a)) {
///             println!("Placement: {}", placement.ifc_type);
///         }
///     }
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// Get entity by ID
    fn get(&self, id: EntityId) -> Option<&Entity>;

    /// Resolve an entity reference from an attribute value
    ///
    /// Returns `None` when the value is not a reference or the target is missing.
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<&Entity> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve a list of entity references
    ///
    /// Non-reference items and missing targets are skipped.
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<&Entity> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Get all entities of a specific type, in insertion order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<&Entity>;

    /// Get all entity IDs in the model
    fn all_ids(&self) -> Vec<EntityId>;
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    /// Resolve the reference list held at `index` of `entity`
    fn resolve_attr_list(&self, entity: &Entity, index: usize) -> Vec<&Entity> {
        entity
            .get(index)
            .map(|attr| self.resolve_ref_list(attr))
            .unwrap_or_default()
    }
}

// Blanket implementation for all EntityResolver types
impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}

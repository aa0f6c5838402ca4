// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory entity graph
//!
//! Entities are kept in insertion order. For decoded files this is file
//! order, so "first entity of a type" means the first one in the file.

use crate::{AttributeValue, Entity, EntityId, EntityResolver, Error, IfcType, ModelMetadata, Result};
use rustc_hash::FxHashMap;

/// Ordered entity store with id and type indexes
///
/// Two construction modes exist:
/// - [`EntityGraph::add`] assigns sequential ids and only accepts references
///   to entities that are already present, so a graph built this way can
///   never contain a dangling reference.
/// - [`EntityGraph::insert`] keeps caller-supplied ids and accepts forward
///   references, as needed when decoding a file.
#[derive(Debug, Default, Clone)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    index: FxHashMap<EntityId, usize>,
    by_type: FxHashMap<IfcType, Vec<usize>>,
    next_id: u32,
    /// Header metadata
    pub metadata: ModelMetadata,
}

impl EntityGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph carrying the given header metadata
    pub fn with_metadata(metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Append a new entity with the next free id
    ///
    /// Fails with [`Error::DanglingReference`] if any attribute refers to an
    /// entity that is not yet part of the graph. Nothing is added in that case.
    pub fn add(&mut self, ifc_type: IfcType, attributes: Vec<AttributeValue>) -> Result<EntityId> {
        let id = EntityId(self.next_id.max(1));
        let entity = Entity::new(id, ifc_type, attributes);

        if let Some(target) = entity
            .references()
            .into_iter()
            .find(|target| !self.index.contains_key(target))
        {
            return Err(Error::DanglingReference { entity: id, target });
        }

        self.push(entity);
        Ok(id)
    }

    /// Insert an entity with its own id
    ///
    /// Forward references are allowed. Fails with [`Error::DuplicateEntity`]
    /// if the id is already taken.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.index.contains_key(&entity.id) {
            return Err(Error::DuplicateEntity(entity.id));
        }
        self.push(entity);
        Ok(())
    }

    fn push(&mut self, entity: Entity) {
        let pos = self.entities.len();
        self.next_id = self.next_id.max(entity.id.0.saturating_add(1));
        self.index.insert(entity.id, pos);
        self.by_type
            .entry(entity.ifc_type.clone())
            .or_default()
            .push(pos);
        self.entities.push(entity);
    }

    /// Iterate entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the graph holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// First entity of a type in insertion order
    pub fn first_of_type(&self, ifc_type: &IfcType) -> Option<&Entity> {
        self.by_type
            .get(ifc_type)
            .and_then(|positions| positions.first())
            .map(|&pos| &self.entities[pos])
    }

    /// All `(entity, target)` pairs whose target is not in the graph
    pub fn dangling_references(&self) -> Vec<(EntityId, EntityId)> {
        self.entities
            .iter()
            .flat_map(|entity| {
                entity
                    .references()
                    .into_iter()
                    .filter(|target| !self.index.contains_key(target))
                    .map(move |target| (entity.id, target))
            })
            .collect()
    }
}

impl EntityResolver for EntityGraph {
    fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&pos| &self.entities[pos])
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<&Entity> {
        self.by_type
            .get(ifc_type)
            .map(|positions| positions.iter().map(|&pos| &self.entities[pos]).collect())
            .unwrap_or_default()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }
}

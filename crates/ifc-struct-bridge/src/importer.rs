// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity graph to structural model extraction
//!
//! [`Importer`] indexes the relationship entities of a graph once and then
//! answers each extraction independently. Missing optional structure never
//! aborts an extraction; the affected field falls back to its default.

use crate::defaults;
use crate::domain::{
    ApplicationInfo, BoundaryConditions, Dof, Element, ElementKind, Load, LoadCase, Material, Node,
    PostalAddress, ProjectInfo, PropertyValue, Section, SpatialKind, SpatialNode, StructuralModel,
};
use crate::loads::load_value;
use crate::placement::resolve_global_placement;
use crate::profile::{profile_name, section_profile};
use crate::units::length_unit_scale;
use ifc_struct_model::{AttributeValue, Entity, EntityId, EntityResolver, EntityResolverExt, IfcType};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Material definitions nest at most a few levels deep
const MAX_MATERIAL_DEPTH: usize = 8;

/// Id of an entity in the domain model: its GlobalId, or `#n` when it has none
fn domain_id(entity: &Entity) -> String {
    match entity.get(0) {
        Some(AttributeValue::String(guid)) if !guid.is_empty() => guid.clone(),
        _ => entity.id.to_string(),
    }
}

/// Instance-name id for entities that are not rooted
fn instance_id(entity: &Entity) -> String {
    entity.id.to_string()
}

/// Read an `IfcPostalAddress`; `None` for other types or when every field is unset
fn postal_address(entity: &Entity) -> Option<PostalAddress> {
    if entity.ifc_type != IfcType::IfcPostalAddress {
        debug!("{} is {} not IFCPOSTALADDRESS", entity.id, entity.ifc_type);
        return None;
    }
    let text = |index: usize| entity.get_string(index).map(str::to_string);
    // AddressLines (4), Town (6), Region (7), PostalCode (8), Country (9)
    let address = PostalAddress {
        street: entity
            .get_list(4)
            .and_then(|lines| lines.first())
            .and_then(AttributeValue::as_string)
            .map(str::to_string),
        town: text(6),
        region: text(7),
        postal_code: text(8),
        country: text(9),
    };
    (!address.is_empty()).then_some(address)
}

/// Convert a property nominal value
fn property_value(value: &AttributeValue) -> Option<PropertyValue> {
    match value {
        AttributeValue::TypedValue(_, args) => args.first().and_then(property_value),
        AttributeValue::Bool(b) => Some(PropertyValue::Bool(*b)),
        AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
        AttributeValue::Float(f) => Some(PropertyValue::Real(*f)),
        AttributeValue::String(s) => Some(PropertyValue::Text(s.clone())),
        AttributeValue::Enum(e) => Some(
            value
                .as_bool()
                .map(PropertyValue::Bool)
                .unwrap_or_else(|| PropertyValue::Text(e.clone())),
        ),
        _ => None,
    }
}

/// Structural model extraction over one entity graph
///
/// An importer borrows its resolver and must not be shared between
/// in-flight operations.
pub struct Importer<'a, R: EntityResolver + ?Sized> {
    resolver: &'a R,
    /// RelatingObject -> RelatedObjects
    aggregates: FxHashMap<EntityId, Vec<EntityId>>,
    /// Object -> first associated material definition
    material_of: FxHashMap<EntityId, EntityId>,
    /// Object -> property definitions, in relationship order
    property_sets: FxHashMap<EntityId, Vec<EntityId>>,
    /// Member -> connections, in relationship order
    connections: FxHashMap<EntityId, Vec<EntityId>>,
    /// Material -> IfcMaterialProperties
    material_properties: FxHashMap<EntityId, Vec<EntityId>>,
}

impl<'a, R: EntityResolver + ?Sized> Importer<'a, R> {
    /// Index the relationships of a graph
    pub fn new(resolver: &'a R) -> Self {
        let mut importer = Self {
            resolver,
            aggregates: FxHashMap::default(),
            material_of: FxHashMap::default(),
            property_sets: FxHashMap::default(),
            connections: FxHashMap::default(),
            material_properties: FxHashMap::default(),
        };
        importer.build_indices();
        importer
    }

    fn build_indices(&mut self) {
        let resolver = self.resolver;

        // IfcRelAggregates: RelatingObject (4), RelatedObjects (5)
        for rel in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            if let (Some(parent), Some(children)) = (rel.get_ref(4), rel.get_refs(5)) {
                self.aggregates.entry(parent).or_default().extend(children);
            }
        }

        // IfcRelAssociatesMaterial: RelatedObjects (4), RelatingMaterial (5)
        for rel in resolver.entities_by_type(&IfcType::IfcRelAssociatesMaterial) {
            let Some(material) = rel.get_ref(5) else { continue };
            for object in rel.get_refs(4).unwrap_or_default() {
                self.material_of.entry(object).or_insert(material);
            }
        }

        // IfcRelDefinesByProperties: RelatedObjects (4), RelatingPropertyDefinition (5)
        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            let Some(definition) = rel.get_ref(5) else { continue };
            for object in rel.get_refs(4).unwrap_or_default() {
                self.property_sets.entry(object).or_default().push(definition);
            }
        }

        // IfcRelConnectsStructuralMember: RelatingStructuralMember (4),
        // RelatedStructuralConnection (5)
        for rel in resolver.entities_by_type(&IfcType::IfcRelConnectsStructuralMember) {
            if let (Some(member), Some(connection)) = (rel.get_ref(4), rel.get_ref(5)) {
                self.connections.entry(member).or_default().push(connection);
            }
        }

        // IfcMaterialProperties: Material (3)
        for props in resolver.entities_by_type(&IfcType::IfcMaterialProperties) {
            if let Some(material) = props.get_ref(3) {
                self.material_properties.entry(material).or_default().push(props.id);
            }
        }

        debug!(
            "Indexed {} aggregates, {} material associations, {} property owners, {} members",
            self.aggregates.len(),
            self.material_of.len(),
            self.property_sets.len(),
            self.connections.len()
        );
    }

    /// Project level information
    ///
    /// Reads the first project; a warning is logged when there are several.
    pub fn project_info(&self) -> ProjectInfo {
        let projects = self.resolver.entities_by_type(&IfcType::IfcProject);
        if projects.len() > 1 {
            warn!("Found {} projects, using the first", projects.len());
        }
        let project = projects.first();
        let site = self.first_of(&IfcType::IfcSite);
        let building = self.first_of(&IfcType::IfcBuilding);

        // IfcApplication: Version (1), ApplicationFullName (2)
        let application = self.first_of(&IfcType::IfcApplication).map(|app| ApplicationInfo {
            name: app.get_string(2).unwrap_or_default().to_string(),
            version: app.get_string(1).unwrap_or_default().to_string(),
        });

        ProjectInfo {
            name: project.and_then(|p| p.get_string(2)).map(str::to_string),
            description: project.and_then(|p| p.get_string(3)).map(str::to_string),
            site_name: site.and_then(|s| s.get_string(2)).map(str::to_string),
            building_name: building.and_then(|b| b.get_string(2)).map(str::to_string),
            building_description: building.and_then(|b| b.get_string(3)).map(str::to_string),
            // BuildingAddress at index 11
            building_address: building
                .and_then(|b| b.get_ref(11))
                .and_then(|id| self.resolver.get(id))
                .and_then(postal_address),
            application,
            length_unit_scale: length_unit_scale(self.resolver),
        }
    }

    /// Spatial hierarchy in depth-first order from the first project
    ///
    /// Storeys and spaces the walk does not reach are appended without a
    /// parent.
    pub fn spatial_structure(&self) -> Vec<SpatialNode> {
        let mut nodes = Vec::new();
        let mut visited = FxHashSet::default();

        if let Some(project) = self.first_of(&IfcType::IfcProject) {
            visited.insert(project.id);
            self.walk_spatial(project.id, None, &mut visited, &mut nodes);
        }

        for ifc_type in [IfcType::IfcBuildingStorey, IfcType::IfcSpace] {
            for entity in self.resolver.entities_by_type(&ifc_type) {
                if visited.insert(entity.id) {
                    debug!("{} is not aggregated under the project", entity.id);
                    if let Some(node) = spatial_node(entity, None) {
                        nodes.push(node);
                    }
                }
            }
        }

        nodes
    }

    fn walk_spatial(
        &self,
        parent: EntityId,
        parent_id: Option<&str>,
        visited: &mut FxHashSet<EntityId>,
        nodes: &mut Vec<SpatialNode>,
    ) {
        let Some(children) = self.aggregates.get(&parent) else {
            return;
        };
        for &child in children {
            if !visited.insert(child) {
                continue;
            }
            let Some(entity) = self.resolver.get(child) else {
                continue;
            };
            let Some(node) = spatial_node(entity, parent_id.map(str::to_string)) else {
                continue;
            };
            let id = node.id.clone();
            nodes.push(node);
            self.walk_spatial(child, Some(&id), visited, nodes);
        }
    }

    /// Structural elements
    ///
    /// Beams, columns, slabs and structural walls first, then analytical
    /// curve and surface members as generic members.
    pub fn elements(&self) -> Vec<Element> {
        let mut elements = Vec::new();

        let physical = [
            (IfcType::IfcBeam, ElementKind::Beam),
            (IfcType::IfcColumn, ElementKind::Column),
            (IfcType::IfcSlab, ElementKind::Slab),
        ];
        for (ifc_type, kind) in physical {
            for entity in self.resolver.entities_by_type(&ifc_type) {
                elements.push(self.element(entity, kind));
            }
        }

        for ifc_type in [IfcType::IfcWall, IfcType::IfcWallStandardCase] {
            for entity in self.resolver.entities_by_type(&ifc_type) {
                if self.is_structural_wall(entity.id) {
                    elements.push(self.element(entity, ElementKind::Wall));
                } else {
                    debug!("Skipping non-structural wall {}", entity.id);
                }
            }
        }

        for ifc_type in [IfcType::IfcStructuralCurveMember, IfcType::IfcStructuralSurfaceMember] {
            for entity in self.resolver.entities_by_type(&ifc_type) {
                elements.push(self.element(entity, ElementKind::GenericMember));
            }
        }

        elements
    }

    fn element(&self, entity: &Entity, kind: ElementKind) -> Element {
        // ObjectPlacement at index 5
        let placement = entity
            .get_ref(5)
            .map(|id| resolve_global_placement(self.resolver, Some(id)));

        let nodes = self.node_pair(entity.id);
        let (material, section) = self.material_and_section(entity.id);

        // PredefinedType: index 7 on analytical members, 8 on physical elements
        let predefined_type = match kind {
            ElementKind::GenericMember => entity.get_enum(7),
            _ => entity
                .get_enum(8)
                .filter(|token| *token != defaults::ELEMENT_PREDEFINED_TYPE),
        }
        .map(str::to_string);

        Element {
            id: domain_id(entity),
            name: entity.get_string(2).map(str::to_string),
            description: entity.get_string(3).map(str::to_string),
            kind,
            predefined_type,
            nodes,
            section,
            material,
            properties: self.element_properties(entity.id),
            placement,
        }
    }

    /// Start and end connection ids, when at least two are connected
    fn node_pair(&self, member: EntityId) -> Option<[String; 2]> {
        let connections = self.connections.get(&member)?;
        let mut ids = connections
            .iter()
            .filter_map(|&id| self.resolver.get(id))
            .map(domain_id);
        let start = ids.next()?;
        let end = ids.next()?;
        Some([start, end])
    }

    /// Material name and section id from the first material association
    fn material_and_section(&self, object: EntityId) -> (Option<String>, Option<String>) {
        let Some(definition) = self
            .material_of
            .get(&object)
            .and_then(|&id| self.resolver.get(id))
        else {
            return (None, None);
        };

        let material = self
            .first_material(definition, 0)
            .and_then(|m| m.get_string(0))
            .map(str::to_string);

        let section = self
            .first_profile(definition)
            .filter(|profile| section_profile(profile).is_some())
            .map(instance_id);

        (material, section)
    }

    /// Reduce any material definition to its first `IfcMaterial`
    fn first_material(&self, definition: &'a Entity, depth: usize) -> Option<&'a Entity> {
        if depth > MAX_MATERIAL_DEPTH {
            return None;
        }
        let next = |index: usize| -> Option<&'a Entity> {
            let id = match definition.get(index)? {
                AttributeValue::List(items) => items.first()?.as_entity_ref()?,
                value => value.as_entity_ref()?,
            };
            self.first_material(self.resolver.get(id)?, depth + 1)
        };

        match definition.ifc_type {
            IfcType::IfcMaterial => Some(definition),
            // ForLayerSet / ForProfileSet (0)
            IfcType::IfcMaterialLayerSetUsage | IfcType::IfcMaterialProfileSetUsage => next(0),
            // MaterialLayers (0) / Materials (0)
            IfcType::IfcMaterialLayerSet | IfcType::IfcMaterialList => next(0),
            // IfcMaterialLayer.Material (0)
            IfcType::IfcMaterialLayer => next(0),
            // MaterialProfiles (2) / MaterialConstituents (2)
            IfcType::IfcMaterialProfileSet | IfcType::IfcMaterialConstituentSet => next(2),
            // IfcMaterialProfile.Material (2) / IfcMaterialConstituent.Material (2)
            IfcType::IfcMaterialProfile | IfcType::IfcMaterialConstituent => next(2),
            _ => None,
        }
    }

    /// Profile of the first material profile in a profile set association
    fn first_profile(&self, definition: &'a Entity) -> Option<&'a Entity> {
        let set = match definition.ifc_type {
            IfcType::IfcMaterialProfileSetUsage => self.resolver.get(definition.get_ref(0)?)?,
            IfcType::IfcMaterialProfileSet => definition,
            _ => return None,
        };
        let first = set.get_list(2)?.first()?.as_entity_ref()?;
        let material_profile = self.resolver.get(first)?;
        // IfcMaterialProfile.Profile (3)
        self.resolver.get(material_profile.get_ref(3)?)
    }

    /// Property sets attached to an object
    fn property_sets_of(&self, object: EntityId) -> impl Iterator<Item = &'a Entity> + '_ {
        self.property_sets
            .get(&object)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.resolver.get(id))
            .filter(|pset| pset.ifc_type == IfcType::IfcPropertySet)
    }

    /// Single-value properties of a property set
    fn single_values(&self, pset: &'a Entity) -> impl Iterator<Item = (&'a str, PropertyValue)> + '_ {
        // HasProperties at index 4
        self.resolver
            .resolve_attr_list(pset, 4)
            .into_iter()
            .filter(|prop| prop.ifc_type == IfcType::IfcPropertySingleValue)
            .filter_map(|prop| {
                // Name (0), NominalValue (2)
                let name = prop.get_string(0)?;
                let value = property_value(prop.get(2)?)?;
                Some((name, value))
            })
    }

    /// Single-value properties of an element; later sets overwrite earlier ones
    fn element_properties(&self, object: EntityId) -> BTreeMap<String, PropertyValue> {
        let mut properties = BTreeMap::new();
        for pset in self.property_sets_of(object) {
            for (name, value) in self.single_values(pset) {
                properties.insert(name.to_string(), value);
            }
        }
        properties
    }

    fn is_structural_wall(&self, wall: EntityId) -> bool {
        self.property_sets_of(wall).any(|pset| {
            let named = pset
                .get_string(2)
                .is_some_and(|name| name.to_lowercase().contains("structural"));
            named
                || self.single_values(pset).any(|(name, value)| {
                    name == defaults::LOAD_BEARING_PROPERTY && value == PropertyValue::Bool(true)
                })
        })
    }

    /// Analysis nodes from structural point connections
    pub fn nodes(&self) -> Vec<Node> {
        self.resolver
            .entities_by_type(&IfcType::IfcStructuralPointConnection)
            .into_iter()
            .map(|entity| {
                // ObjectPlacement (5), AppliedCondition (7)
                let placement = resolve_global_placement(self.resolver, entity.get_ref(5));
                let boundary_conditions = entity
                    .get_ref(7)
                    .and_then(|id| self.resolver.get(id))
                    .map(boundary_conditions)
                    .unwrap_or_default();

                Node {
                    id: domain_id(entity),
                    name: entity.get_string(2).map(str::to_string),
                    coordinates: placement.location,
                    boundary_conditions,
                }
            })
            .collect()
    }

    /// Materials with their numeric properties
    pub fn materials(&self) -> Vec<Material> {
        self.resolver
            .entities_by_type(&IfcType::IfcMaterial)
            .into_iter()
            .map(|entity| {
                let mut properties = BTreeMap::new();
                let attached = self.material_properties.get(&entity.id).into_iter().flatten();
                for props in attached.filter_map(|&id| self.resolver.get(id)) {
                    // IfcMaterialProperties.Properties (2)
                    for prop in self.resolver.resolve_attr_list(props, 2) {
                        if prop.ifc_type != IfcType::IfcPropertySingleValue {
                            continue;
                        }
                        if let (Some(name), Some(value)) = (prop.get_string(0), prop.get_float(2)) {
                            properties.insert(name.to_string(), value);
                        }
                    }
                }

                Material {
                    id: instance_id(entity),
                    name: entity
                        .get_string(0)
                        .unwrap_or(defaults::MATERIAL_NAME)
                        .to_string(),
                    description: entity.get_string(1).map(str::to_string),
                    properties,
                }
            })
            .collect()
    }

    /// Sections from recognized profile definitions
    pub fn sections(&self) -> Vec<Section> {
        self.resolver
            .all_ids()
            .into_iter()
            .filter_map(|id| self.resolver.get(id))
            .filter(|entity| entity.ifc_type.is_profile())
            .filter_map(|entity| {
                let profile = section_profile(entity)?;
                Some(Section {
                    id: instance_id(entity),
                    name: profile_name(entity)
                        .unwrap_or(defaults::SECTION_NAME)
                        .to_string(),
                    profile,
                })
            })
            .collect()
    }

    /// Loads of every structural load type
    pub fn loads(&self) -> Vec<Load> {
        self.resolver
            .all_ids()
            .into_iter()
            .filter_map(|id| self.resolver.get(id))
            .filter(|entity| entity.ifc_type.is_structural_load())
            .map(|entity| Load {
                id: instance_id(entity),
                // Name (0)
                name: entity.get_string(0).map(str::to_string),
                value: load_value(entity),
            })
            .collect()
    }

    /// Load cases
    pub fn load_cases(&self) -> Vec<LoadCase> {
        self.resolver
            .entities_by_type(&IfcType::IfcStructuralLoadCase)
            .into_iter()
            .map(|entity| LoadCase {
                id: domain_id(entity),
                name: entity
                    .get_string(2)
                    .unwrap_or(defaults::LOAD_CASE_NAME)
                    .to_string(),
                description: entity.get_string(3).map(str::to_string),
                // ActionType (6), ActionSource (7)
                action_type: entity.get_enum(6).map(str::to_string),
                action_source: entity.get_enum(7).map(str::to_string),
            })
            .collect()
    }

    /// Everything at once
    pub fn import(&self) -> StructuralModel {
        let model = StructuralModel {
            project_info: self.project_info(),
            spatial_nodes: self.spatial_structure(),
            nodes: self.nodes(),
            elements: self.elements(),
            materials: self.materials(),
            sections: self.sections(),
            loads: self.loads(),
            load_cases: self.load_cases(),
        };
        debug!(
            "Imported {} nodes, {} elements, {} materials, {} sections, {} loads",
            model.nodes.len(),
            model.elements.len(),
            model.materials.len(),
            model.sections.len(),
            model.loads.len()
        );
        model
    }

    fn first_of(&self, ifc_type: &IfcType) -> Option<&'a Entity> {
        self.resolver.entities_by_type(ifc_type).into_iter().next()
    }
}

/// Spatial record of a site, building, storey or space
fn spatial_node(entity: &Entity, parent: Option<String>) -> Option<SpatialNode> {
    let (kind, default_name) = match entity.ifc_type {
        IfcType::IfcSite => (SpatialKind::Site, defaults::SITE_NAME),
        IfcType::IfcBuilding => (SpatialKind::Building, defaults::BUILDING_NAME),
        IfcType::IfcBuildingStorey => (SpatialKind::Storey, defaults::STOREY_NAME),
        IfcType::IfcSpace => (SpatialKind::Space, defaults::SPACE_NAME),
        _ => return None,
    };

    Some(SpatialNode {
        id: domain_id(entity),
        name: entity.get_string(2).unwrap_or(default_name).to_string(),
        description: entity.get_string(3).map(str::to_string),
        kind,
        // IfcBuildingStorey.Elevation (9)
        elevation: match kind {
            SpatialKind::Storey => entity.get_float(9),
            _ => None,
        },
        parent,
    })
}

/// DOF restraints of an `IfcBoundaryNodeCondition`
///
/// A stiffness select counts as fixed when it is boolean true or a non-zero
/// stiffness value.
fn boundary_conditions(condition: &Entity) -> BoundaryConditions {
    if condition.ifc_type != IfcType::IfcBoundaryNodeCondition {
        return BoundaryConditions::default();
    }
    let dof = |index: usize| {
        let fixed = condition.get(index).is_some_and(|value| {
            value.as_bool() == Some(true) || value.as_float().is_some_and(|v| v != 0.0)
        });
        Dof::from_fixed(fixed)
    };
    BoundaryConditions::from_array([dof(1), dof(2), dof(3), dof(4), dof(5), dof(6)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_struct_model::EntityGraph;
    use ifc_struct_step::StepCodec;

    fn decode(data: &str) -> EntityGraph {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('ViewDefinition [StructuralAnalysisView]'),'2;1');\n\
             FILE_NAME('test.ifc','',(''),(''),'','','');\nFILE_SCHEMA(('IFC4'));\nENDSEC;\n\
             DATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        );
        StepCodec::new().decode_str(&content).unwrap()
    }

    #[test]
    fn test_first_project_is_used() {
        let graph = decode(
            "#1=IFCPROJECT('p1',$,'First','One',$,$,$,$,$);\n\
             #2=IFCPROJECT('p2',$,'Second',$,$,$,$,$,$);\n\
             #3=IFCAPPLICATION($,'7.1','Frame Designer','fd');",
        );
        let info = Importer::new(&graph).project_info();
        assert_eq!(info.name.as_deref(), Some("First"));
        assert_eq!(info.description.as_deref(), Some("One"));
        assert_eq!(
            info.application,
            Some(ApplicationInfo {
                name: "Frame Designer".into(),
                version: "7.1".into()
            })
        );
        assert_eq!(info.length_unit_scale, None);
    }

    #[test]
    fn test_empty_graph_gives_empty_model() {
        let graph = EntityGraph::new();
        let model = Importer::new(&graph).import();
        assert_eq!(model, StructuralModel::default());
    }

    #[test]
    fn test_spatial_walk_and_orphans() {
        let graph = decode(
            "#1=IFCPROJECT('p',$,'P',$,$,$,$,$,$);\n\
             #2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);\n\
             #3=IFCBUILDING('b',$,'Hall',$,$,$,$,$,.ELEMENT.,$,$,$);\n\
             #4=IFCBUILDINGSTOREY('l1',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);\n\
             #5=IFCBUILDINGSTOREY('l2',$,$,$,$,$,$,$,.ELEMENT.,3.5);\n\
             #6=IFCBUILDINGSTOREY('l9',$,'Loose',$,$,$,$,$,.ELEMENT.,9.);\n\
             #7=IFCRELAGGREGATES('r1',$,$,$,#1,(#2));\n\
             #8=IFCRELAGGREGATES('r2',$,$,$,#2,(#3));\n\
             #9=IFCRELAGGREGATES('r3',$,$,$,#3,(#4,#5));",
        );
        let nodes = Importer::new(&graph).spatial_structure();
        let summary: Vec<_> = nodes
            .iter()
            .map(|n| (n.id.as_str(), n.kind, n.parent.as_deref(), n.elevation))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("s", SpatialKind::Site, None, None),
                ("b", SpatialKind::Building, Some("s"), None),
                ("l1", SpatialKind::Storey, Some("b"), Some(0.0)),
                ("l2", SpatialKind::Storey, Some("b"), Some(3.5)),
                ("l9", SpatialKind::Storey, None, Some(9.0)),
            ]
        );
        assert_eq!(nodes[3].name, defaults::STOREY_NAME);
    }

    #[test]
    fn test_layered_material_reduces_to_first() {
        let graph = decode(
            "#1=IFCMATERIAL('Concrete',$,$);\n\
             #2=IFCMATERIAL('Insulation',$,$);\n\
             #3=IFCMATERIALLAYER(#1,0.2,$,$,$,$,$);\n\
             #4=IFCMATERIALLAYER(#2,0.1,$,$,$,$,$);\n\
             #5=IFCMATERIALLAYERSET((#3,#4),'Wall',$);\n\
             #6=IFCMATERIALLAYERSETUSAGE(#5,.AXIS2.,.POSITIVE.,0.,$);\n\
             #7=IFCSLAB('sl',$,'Slab',$,$,$,$,$,.FLOOR.);\n\
             #8=IFCBEAM('bm',$,'Beam',$,$,$,$,$,.BEAM.);\n\
             #9=IFCMATERIALCONSTITUENT('Core',$,#2,$,$);\n\
             #10=IFCMATERIALCONSTITUENTSET('Mix',$,(#9));\n\
             #11=IFCRELASSOCIATESMATERIAL('r1',$,$,$,(#7),#6);\n\
             #12=IFCRELASSOCIATESMATERIAL('r2',$,$,$,(#8),#10);\n\
             #13=IFCRELASSOCIATESMATERIAL('r3',$,$,$,(#7,#8),#1);",
        );
        let elements = Importer::new(&graph).elements();
        assert_eq!(elements.len(), 2);
        let beam = &elements[0];
        let slab = &elements[1];
        assert_eq!(beam.kind, ElementKind::Beam);
        assert_eq!(beam.material.as_deref(), Some("Insulation"));
        assert_eq!(slab.kind, ElementKind::Slab);
        assert_eq!(slab.material.as_deref(), Some("Concrete"));
        assert_eq!(slab.section, None);
        assert_eq!(beam.placement, None);
        assert_eq!(beam.nodes, None);
    }

    #[test]
    fn test_profile_set_gives_section() {
        let graph = decode(
            "#1=IFCMATERIAL('S355',$,$);\n\
             #2=IFCISHAPEPROFILEDEF(.AREA.,'IPE300',$,150.,300.,7.1,10.7,$,$,$);\n\
             #3=IFCCIRCLEPROFILEDEF(.AREA.,'D100',$,50.);\n\
             #4=IFCMATERIALPROFILE('IPE300',$,#1,#2,$,$);\n\
             #5=IFCMATERIALPROFILESET('IPE300',$,(#4),$);\n\
             #6=IFCMATERIALPROFILESETUSAGE(#5,$,$);\n\
             #7=IFCCOLUMN('c1',$,'C1',$,$,$,$,$,.COLUMN.);\n\
             #8=IFCRELASSOCIATESMATERIAL('r',$,$,$,(#7),#6);",
        );
        let importer = Importer::new(&graph);
        let sections = importer.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "#2");
        assert_eq!(sections[0].name, "IPE300");

        let column = &importer.elements()[0];
        assert_eq!(column.section.as_deref(), Some("#2"));
        assert_eq!(column.material.as_deref(), Some("S355"));
    }

    #[test]
    fn test_only_single_values_and_structural_walls() {
        let graph = decode(
            "#1=IFCWALL('w1',$,'Shear wall',$,$,$,$,$,.SOLIDWALL.);\n\
             #2=IFCWALL('w2',$,'Partition',$,$,$,$,$,.PARTITIONING.);\n\
             #3=IFCWALLSTANDARDCASE('w3',$,'Core',$,$,$,$,$,$);\n\
             #4=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCBOOLEAN(.T.),$);\n\
             #5=IFCPROPERTYSINGLEVALUE('Thickness',$,IFCPOSITIVELENGTHMEASURE(250.),$);\n\
             #6=IFCPROPERTYENUMERATEDVALUE('Status',$,(IFCLABEL('NEW')),$);\n\
             #7=IFCPROPERTYSINGLEVALUE('Layers',$,IFCINTEGER(2),$);\n\
             #8=IFCPROPERTYSINGLEVALUE('Reference',$,IFCIDENTIFIER('W-01'),$);\n\
             #9=IFCPROPERTYSET('ps1',$,'Pset_WallCommon',$,(#4,#5,#6));\n\
             #10=IFCPROPERTYSET('ps2',$,'Pset_StructuralDesign',$,(#7,#8));\n\
             #11=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCBOOLEAN(.F.),$);\n\
             #12=IFCPROPERTYSET('ps3',$,'Pset_WallCommon',$,(#11));\n\
             #13=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#1),#9);\n\
             #14=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#3),#10);\n\
             #15=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#2),#12);",
        );
        let elements = Importer::new(&graph).elements();
        let ids: Vec<_> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w3"]);

        let wall = &elements[0];
        assert_eq!(wall.kind, ElementKind::Wall);
        assert_eq!(wall.properties.len(), 2);
        assert_eq!(wall.properties["LoadBearing"], PropertyValue::Bool(true));
        assert_eq!(wall.properties["Thickness"], PropertyValue::Real(250.0));

        let core = &elements[1];
        assert_eq!(core.properties["Layers"], PropertyValue::Integer(2));
        assert_eq!(core.properties["Reference"], PropertyValue::Text("W-01".into()));
    }

    #[test]
    fn test_nodes_with_boundary_conditions() {
        let graph = decode(
            "#1=IFCCARTESIANPOINT((1.,2.,3.));\n\
             #2=IFCAXIS2PLACEMENT3D(#1,$,$);\n\
             #3=IFCLOCALPLACEMENT($,#2);\n\
             #4=IFCBOUNDARYNODECONDITION('Support',IFCBOOLEAN(.T.),IFCBOOLEAN(.T.),\
             IFCLINEARSTIFFNESSMEASURE(1.E9),IFCBOOLEAN(.F.),IFCROTATIONALSTIFFNESSMEASURE(0.),$);\n\
             #5=IFCSTRUCTURALPOINTCONNECTION('n1',$,'N1',$,$,#3,$,#4,$);\n\
             #6=IFCSTRUCTURALPOINTCONNECTION('n2',$,$,$,$,$,$,$,$);",
        );
        let nodes = Importer::new(&graph).nodes();
        assert_eq!(nodes.len(), 2);

        assert_eq!(nodes[0].id, "n1");
        assert_eq!(nodes[0].coordinates, [1.0, 2.0, 3.0]);
        assert_eq!(nodes[0].boundary_conditions, BoundaryConditions::pinned());

        assert_eq!(nodes[1].coordinates, [0.0; 3]);
        assert!(!nodes[1].boundary_conditions.any_fixed());
    }

    #[test]
    fn test_member_connections_give_node_pair() {
        let graph = decode(
            "#1=IFCSTRUCTURALPOINTCONNECTION('a',$,$,$,$,$,$,$,$);\n\
             #2=IFCSTRUCTURALPOINTCONNECTION($,$,$,$,$,$,$,$,$);\n\
             #3=IFCSTRUCTURALCURVEMEMBER('m',$,'M',$,$,$,$,.RIGID_JOINED_MEMBER.,$);\n\
             #4=IFCRELCONNECTSSTRUCTURALMEMBER('r1',$,$,$,#3,#1,$,$,$,$);\n\
             #5=IFCRELCONNECTSSTRUCTURALMEMBER('r2',$,$,$,#3,#2,$,$,$,$);",
        );
        let elements = Importer::new(&graph).elements();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind, ElementKind::GenericMember);
        assert_eq!(elements[0].nodes, Some(["a".to_string(), "#2".to_string()]));
    }

    #[test]
    fn test_predefined_types() {
        let graph = decode(
            "#1=IFCSTRUCTURALCURVEMEMBER('m',$,'M',$,$,$,$,.PIN_JOINED_MEMBER.,$);\n\
             #2=IFCBEAM('b1',$,'B1',$,$,$,$,$,.JOIST.);\n\
             #3=IFCBEAM('b2',$,'B2',$,$,$,$,$,.NOTDEFINED.);\n\
             #4=IFCCOLUMN('c',$,'C',$,$,$,$,$);",
        );
        let elements = Importer::new(&graph).elements();
        let predefined: Vec<_> = elements
            .iter()
            .map(|e| (e.id.as_str(), e.predefined_type.as_deref()))
            .collect();
        assert_eq!(
            predefined,
            vec![
                ("b1", Some("JOIST")),
                ("b2", None),
                ("c", None),
                ("m", Some("PIN_JOINED_MEMBER")),
            ]
        );
    }

    #[test]
    fn test_building_address() {
        let graph = decode(
            "#1=IFCPOSTALADDRESS($,$,$,$,('Hauptstrasse 1','Hof'),$,'Basel','BS','4051','CH');\n\
             #2=IFCBUILDING('b',$,'Hall',$,$,$,$,$,.ELEMENT.,$,$,#1);",
        );
        let info = Importer::new(&graph).project_info();
        assert_eq!(
            info.building_address,
            Some(PostalAddress {
                street: Some("Hauptstrasse 1".into()),
                town: Some("Basel".into()),
                region: Some("BS".into()),
                postal_code: Some("4051".into()),
                country: Some("CH".into()),
            })
        );

        // An empty address or a reference to another entity gives no address
        for address in [
            "IFCPOSTALADDRESS($,$,$,$,$,$,$,$,$,$)",
            "IFCORGANIZATION($,'Org',$,$,$)",
        ] {
            let graph = decode(&format!(
                "#1={address};\n#2=IFCBUILDING('b',$,'Hall',$,$,$,$,$,.ELEMENT.,$,$,#1);"
            ));
            assert_eq!(Importer::new(&graph).project_info().building_address, None);
        }
    }

    #[test]
    fn test_materials_loads_and_cases() {
        let graph = decode(
            "#1=IFCMATERIAL('C30/37','Concrete',$);\n\
             #2=IFCPROPERTYSINGLEVALUE('YoungModulus',$,IFCREAL(3.3E10),$);\n\
             #3=IFCPROPERTYSINGLEVALUE('Grade',$,IFCLABEL('C30'),$);\n\
             #4=IFCMATERIALPROPERTIES('MaterialProperties',$,(#2,#3),#1);\n\
             #5=IFCSTRUCTURALLOADSINGLEFORCE('P',0.,0.,-10.,$,$,$);\n\
             #6=IFCSTRUCTURALLOADTEMPERATURE('T',20.,$,$);\n\
             #7=IFCSTRUCTURALLOADCASE('lc',$,'Dead',$,$,.LOAD_CASE.,.PERMANENT_G.,.DEAD_LOAD_G.,$,$,$);",
        );
        let importer = Importer::new(&graph);

        let materials = importer.materials();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].id, "#1");
        assert_eq!(materials[0].description.as_deref(), Some("Concrete"));
        assert_eq!(materials[0].properties.len(), 1);
        assert_eq!(materials[0].properties["YoungModulus"], 3.3e10);

        let loads = importer.loads();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].value.components()["force_z"], -10.0);
        assert!(loads[1].value.components().is_empty());

        let cases = importer.load_cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "Dead");
        assert_eq!(cases[0].action_type.as_deref(), Some("PERMANENT_G"));
        assert_eq!(cases[0].action_source.as_deref(), Some("DEAD_LOAD_G"));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural model to entity graph construction
//!
//! [`export_model`] builds a fresh graph in dependency order: root
//! entities, spatial structure, materials, profiles, nodes, elements, loads
//! and load cases. All transient state lives in an `ExportSession` owned by
//! the call, so exporting the same model twice gives identical graphs.

use crate::config::ExportConfig;
use crate::defaults;
use crate::domain::{
    Element, ElementKind, GlobalPlacement, Node, PostalAddress, PropertyValue, SpatialKind,
    SpatialNode, StructuralModel,
};
use crate::error::{ExchangeError, Result};
use crate::loads::load_entity;
use crate::profile::profile_entity;
use ifc_struct_model::{AttributeValue, EntityGraph, EntityId, IfcType, ModelMetadata};
use ifc_struct_step::{DEFAULT_FILE_DESCRIPTION, DEFAULT_SCHEMA};
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

pub use crate::guid::{global_id, global_id_in};

/// Summary of one export
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Entities in the produced graph
    pub entity_count: usize,
    /// Loads not written because their kind has no export mapping
    pub skipped_loads: usize,
    /// Ids that appeared more than once, and sites or buildings beyond the
    /// first; only the first was written
    pub duplicate_ids: Vec<String>,
    /// Material names referenced by elements but not defined in the model
    pub minted_materials: Vec<String>,
}

/// Export a structural model into a new entity graph
///
/// Fails on the first element that references an unknown node or section,
/// or that has no node pair. No graph is returned in that case.
pub fn export_model(
    model: &StructuralModel,
    config: &ExportConfig,
) -> Result<(EntityGraph, ExportReport)> {
    let config = config.resolved();
    let mut session = ExportSession::new(model, &config)?;
    session.write_spatial_structure(model)?;
    session.write_materials(model)?;
    session.write_sections(model)?;
    session.write_nodes(model)?;
    session.write_elements(model)?;
    session.write_loads(model)?;
    session.write_load_cases(model)?;
    Ok(session.finish())
}

/// Spatial entity and its placement
#[derive(Clone, Copy)]
struct Located {
    entity: EntityId,
    placement: EntityId,
}

/// Per-call export state
struct ExportSession {
    graph: EntityGraph,
    report: ExportReport,
    /// GlobalId of the project; scopes every other GlobalId
    project_guid: String,
    origin: EntityId,
    z_dir: EntityId,
    building: Located,
    storeys: FxHashMap<String, Located>,
    materials: FxHashMap<String, EntityId>,
    material_names: FxHashMap<String, EntityId>,
    /// Section id -> (profile, section name)
    profiles: FxHashMap<String, (EntityId, String)>,
    /// Node id -> (connection, coordinates)
    nodes: FxHashMap<String, (EntityId, [f64; 3])>,
    /// (section id, material name) -> IfcMaterialProfileSetUsage
    profile_usages: FxHashMap<(String, Option<String>), EntityId>,
}

impl ExportSession {
    /// Start a graph with its root entities
    ///
    /// Project, site and building exist before the session does, so every
    /// later entity can refer to them.
    fn new(model: &StructuralModel, config: &ExportConfig) -> Result<Self> {
        let info = &model.project_info;
        let application = &config.application;

        let metadata = ModelMetadata {
            schema_version: DEFAULT_SCHEMA.to_string(),
            originating_system: Some(format!("{} {}", application.name, application.version)),
            preprocessor_version: Some(format!(
                "{} {}",
                defaults::APPLICATION_IDENTIFIER,
                defaults::APPLICATION_VERSION
            )),
            file_name: config.file_name.clone(),
            file_description: Some(DEFAULT_FILE_DESCRIPTION.to_string()),
            author: config.author.clone(),
            organization: config.organization.clone(),
            timestamp: config.timestamp.clone(),
        };
        let mut graph = EntityGraph::with_metadata(metadata);
        let mut report = ExportReport::default();

        // Shared geometry
        let origin = graph.add(IfcType::IfcCartesianPoint, vec![AttributeValue::reals([0.0; 3])])?;
        let z_dir = graph.add(IfcType::IfcDirection, vec![AttributeValue::reals([0.0, 0.0, 1.0])])?;
        let x_dir = graph.add(IfcType::IfcDirection, vec![AttributeValue::reals([1.0, 0.0, 0.0])])?;
        let wcs = graph.add(
            IfcType::IfcAxis2Placement3D,
            vec![
                AttributeValue::EntityRef(origin),
                AttributeValue::EntityRef(z_dir),
                AttributeValue::EntityRef(x_dir),
            ],
        )?;

        write_application(&mut graph, config)?;
        let units = write_units(&mut graph, config)?;
        let context = write_contexts(&mut graph, wcs)?;

        let project_name = info.name.as_deref().unwrap_or(defaults::PROJECT_NAME);
        let project_guid = global_id("project", project_name);
        let project = graph.add(
            IfcType::IfcProject,
            vec![
                AttributeValue::string(&project_guid),
                AttributeValue::Null,
                AttributeValue::string(project_name),
                AttributeValue::opt_string(info.description.as_deref()),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::refs([context]),
                AttributeValue::EntityRef(units),
            ],
        )?;

        // Site and building; the first spatial node of each kind overrides ProjectInfo
        let site_node = single_spatial(model, SpatialKind::Site, &mut report);
        let site_guid = match site_node {
            Some(node) => global_id_in(&project_guid, "spatial", &node.id),
            None => global_id_in(&project_guid, "site", project_name),
        };
        let site_name = site_node
            .map(|node| node.name.as_str())
            .or(info.site_name.as_deref())
            .unwrap_or(defaults::SITE_NAME);
        let site_placement = local_placement(&mut graph, origin, None, [0.0; 3])?;
        let site = graph.add(
            IfcType::IfcSite,
            vec![
                AttributeValue::string(site_guid),
                AttributeValue::Null,
                AttributeValue::string(site_name),
                AttributeValue::opt_string(site_node.and_then(|n| n.description.as_deref())),
                AttributeValue::Null,
                AttributeValue::EntityRef(site_placement),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::enumeration("ELEMENT"),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
            ],
        )?;

        let building_node = single_spatial(model, SpatialKind::Building, &mut report);
        let building_guid = match building_node {
            Some(node) => global_id_in(&project_guid, "spatial", &node.id),
            None => global_id_in(&project_guid, "building", project_name),
        };
        let building_name = building_node
            .map(|node| node.name.as_str())
            .or(info.building_name.as_deref())
            .unwrap_or(defaults::BUILDING_NAME);
        let building_description = building_node
            .and_then(|node| node.description.as_deref())
            .or(info.building_description.as_deref());
        let address = match info.building_address.as_ref().filter(|a| !a.is_empty()) {
            Some(address) => Some(write_postal_address(&mut graph, address)?),
            None => None,
        };
        let building_placement = local_placement(&mut graph, origin, Some(site_placement), [0.0; 3])?;
        let building = graph.add(
            IfcType::IfcBuilding,
            vec![
                AttributeValue::string(building_guid),
                AttributeValue::Null,
                AttributeValue::string(building_name),
                AttributeValue::opt_string(building_description),
                AttributeValue::Null,
                AttributeValue::EntityRef(building_placement),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::enumeration("ELEMENT"),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::opt_ref(address),
            ],
        )?;

        let mut session = Self {
            graph,
            report,
            project_guid,
            origin,
            z_dir,
            building: Located {
                entity: building,
                placement: building_placement,
            },
            storeys: FxHashMap::default(),
            materials: FxHashMap::default(),
            material_names: FxHashMap::default(),
            profiles: FxHashMap::default(),
            nodes: FxHashMap::default(),
            profile_usages: FxHashMap::default(),
        };
        session.aggregate(project, vec![site])?;
        session.aggregate(site, vec![building])?;

        Ok(session)
    }

    fn finish(mut self) -> (EntityGraph, ExportReport) {
        self.report.entity_count = self.graph.len();
        info!(
            "Exported {} entities ({} loads skipped, {} materials minted)",
            self.report.entity_count,
            self.report.skipped_loads,
            self.report.minted_materials.len()
        );
        (self.graph, self.report)
    }

    fn add(&mut self, ifc_type: IfcType, attributes: Vec<AttributeValue>) -> Result<EntityId> {
        Ok(self.graph.add(ifc_type, attributes)?)
    }

    /// GlobalId of a domain object inside this project
    fn guid(&self, scope: &str, id: &str) -> AttributeValue {
        AttributeValue::string(global_id_in(&self.project_guid, scope, id))
    }

    /// GlobalId for a rooted entity with no domain id, keyed by its instance name
    fn derived_guid(&self) -> AttributeValue {
        let next = self.graph.len() + 1;
        self.guid("rel", &next.to_string())
    }

    fn duplicate(&mut self, kind: &str, id: &str) {
        warn!("Duplicate {kind} id '{id}', keeping the first");
        self.report.duplicate_ids.push(id.to_string());
    }

    fn local_placement(&mut self, parent: Option<EntityId>, location: [f64; 3]) -> Result<EntityId> {
        local_placement(&mut self.graph, self.origin, parent, location)
    }

    /// Absolute placement carrying a full rotation
    fn oriented_placement(&mut self, placement: &GlobalPlacement) -> Result<EntityId> {
        let point = self.add(
            IfcType::IfcCartesianPoint,
            vec![AttributeValue::reals(placement.location)],
        )?;
        let axis = self.add(IfcType::IfcDirection, vec![AttributeValue::reals(placement.z_axis())])?;
        let ref_dir = self.add(IfcType::IfcDirection, vec![AttributeValue::reals(placement.x_axis())])?;
        let axis_placement = self.add(
            IfcType::IfcAxis2Placement3D,
            vec![
                AttributeValue::EntityRef(point),
                AttributeValue::EntityRef(axis),
                AttributeValue::EntityRef(ref_dir),
            ],
        )?;
        self.add(
            IfcType::IfcLocalPlacement,
            vec![AttributeValue::Null, AttributeValue::EntityRef(axis_placement)],
        )
    }

    fn aggregate(&mut self, parent: EntityId, children: Vec<EntityId>) -> Result<EntityId> {
        let guid = self.derived_guid();
        self.add(
            IfcType::IfcRelAggregates,
            vec![
                guid,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::EntityRef(parent),
                AttributeValue::refs(children),
            ],
        )
    }

    /// Storeys under the building, spaces under their storeys
    fn write_spatial_structure(&mut self, model: &StructuralModel) -> Result<()> {
        let mut storey_ids = Vec::new();
        for node in spatial_of(model, SpatialKind::Storey) {
            if self.storeys.contains_key(&node.id) {
                self.duplicate("storey", &node.id);
                continue;
            }
            let elevation = node.elevation;
            let placement = self.local_placement(
                Some(self.building.placement),
                [0.0, 0.0, elevation.unwrap_or(0.0)],
            )?;
            let storey = self.add(
                IfcType::IfcBuildingStorey,
                vec![
                    self.guid("spatial", &node.id),
                    AttributeValue::Null,
                    AttributeValue::string(&node.name),
                    AttributeValue::opt_string(node.description.as_deref()),
                    AttributeValue::Null,
                    AttributeValue::EntityRef(placement),
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::enumeration("ELEMENT"),
                    elevation.map(AttributeValue::Float).unwrap_or_default(),
                ],
            )?;
            self.storeys.insert(
                node.id.clone(),
                Located {
                    entity: storey,
                    placement,
                },
            );
            storey_ids.push(storey);
        }
        if !storey_ids.is_empty() {
            self.aggregate(self.building.entity, storey_ids)?;
        }

        // Spaces grouped by parent in first-seen order
        let mut groups: Vec<(EntityId, Vec<EntityId>)> = Vec::new();
        let mut group_index: FxHashMap<EntityId, usize> = FxHashMap::default();
        let mut seen = FxHashSet::default();
        for node in spatial_of(model, SpatialKind::Space) {
            if !seen.insert(node.id.as_str()) {
                self.duplicate("space", &node.id);
                continue;
            }
            let parent = node
                .parent
                .as_ref()
                .and_then(|id| self.storeys.get(id))
                .copied()
                .unwrap_or_else(|| {
                    debug!("Space '{}' has no known storey, using the building", node.id);
                    self.building
                });
            let placement = self.local_placement(Some(parent.placement), [0.0; 3])?;
            let space = self.add(
                IfcType::IfcSpace,
                vec![
                    self.guid("spatial", &node.id),
                    AttributeValue::Null,
                    AttributeValue::string(&node.name),
                    AttributeValue::opt_string(node.description.as_deref()),
                    AttributeValue::Null,
                    AttributeValue::EntityRef(placement),
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::enumeration("ELEMENT"),
                    AttributeValue::Null,
                    AttributeValue::Null,
                ],
            )?;
            let slot = *group_index.entry(parent.entity).or_insert_with(|| {
                groups.push((parent.entity, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(space);
        }
        for (parent, spaces) in groups {
            self.aggregate(parent, spaces)?;
        }

        Ok(())
    }

    fn write_materials(&mut self, model: &StructuralModel) -> Result<()> {
        for material in &model.materials {
            if self.materials.contains_key(&material.id) {
                self.duplicate("material", &material.id);
                continue;
            }
            let entity = self.add(
                IfcType::IfcMaterial,
                vec![
                    AttributeValue::string(&material.name),
                    AttributeValue::opt_string(material.description.as_deref()),
                    AttributeValue::Null,
                ],
            )?;

            if !material.properties.is_empty() {
                let mut props = Vec::with_capacity(material.properties.len());
                for (name, value) in &material.properties {
                    props.push(self.single_value(
                        name,
                        AttributeValue::typed("IFCREAL", AttributeValue::Float(*value)),
                    )?);
                }
                // IfcMaterialProperties(Name, Description, Properties, Material)
                self.add(
                    IfcType::IfcMaterialProperties,
                    vec![
                        AttributeValue::string(defaults::MATERIAL_PSET_NAME),
                        AttributeValue::Null,
                        AttributeValue::refs(props),
                        AttributeValue::EntityRef(entity),
                    ],
                )?;
            }

            self.materials.insert(material.id.clone(), entity);
            self.material_names.entry(material.name.clone()).or_insert(entity);
        }
        Ok(())
    }

    fn write_sections(&mut self, model: &StructuralModel) -> Result<()> {
        for section in &model.sections {
            if self.profiles.contains_key(&section.id) {
                self.duplicate("section", &section.id);
                continue;
            }
            let (ifc_type, attrs) = profile_entity(&section.profile, &section.name);
            let profile = self.add(ifc_type, attrs)?;
            self.profiles
                .insert(section.id.clone(), (profile, section.name.clone()));
        }
        Ok(())
    }

    fn write_nodes(&mut self, model: &StructuralModel) -> Result<()> {
        for node in &model.nodes {
            if self.nodes.contains_key(&node.id) {
                self.duplicate("node", &node.id);
                continue;
            }
            let connection = self.write_node(node)?;
            self.nodes
                .insert(node.id.clone(), (connection, node.coordinates));
        }
        Ok(())
    }

    fn write_node(&mut self, node: &Node) -> Result<EntityId> {
        let placement = self.local_placement(None, node.coordinates)?;

        let bc = &node.boundary_conditions;
        let condition = if bc.any_fixed() {
            let mut attrs = vec![AttributeValue::string(defaults::BOUNDARY_CONDITION_NAME)];
            attrs.extend(
                bc.as_array()
                    .iter()
                    .map(|dof| AttributeValue::typed("IFCBOOLEAN", AttributeValue::Bool(dof.is_fixed()))),
            );
            Some(self.add(IfcType::IfcBoundaryNodeCondition, attrs)?)
        } else {
            None
        };

        self.add(
            IfcType::IfcStructuralPointConnection,
            vec![
                self.guid("node", &node.id),
                AttributeValue::Null,
                AttributeValue::string(node.name.as_deref().unwrap_or(defaults::NODE_NAME)),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::EntityRef(placement),
                AttributeValue::Null,
                AttributeValue::opt_ref(condition),
                AttributeValue::Null,
            ],
        )
    }

    fn write_elements(&mut self, model: &StructuralModel) -> Result<()> {
        let mut contained = Vec::new();
        let mut written = FxHashSet::default();

        for element in &model.elements {
            if !written.insert(element.id.as_str()) {
                self.duplicate("element", &element.id);
                continue;
            }
            let entity = self.write_element(element)?;
            if element.kind != ElementKind::GenericMember {
                contained.push(entity);
            }
        }

        if !contained.is_empty() {
            let guid = self.derived_guid();
            // IfcRelContainedInSpatialStructure(.., RelatedElements, RelatingStructure)
            self.add(
                IfcType::IfcRelContainedInSpatialStructure,
                vec![
                    guid,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::refs(contained),
                    AttributeValue::EntityRef(self.building.entity),
                ],
            )?;
        }
        Ok(())
    }

    /// Write one element with its placement, node connections, material and properties
    ///
    /// Beams, columns, slabs and walls are written as physical elements and
    /// connected to their nodes directly. IFC4 types `RelatingStructuralMember`
    /// as `IfcStructuralMember`, so strict schema validation flags these
    /// relationships; readers that follow the relationship by attribute
    /// position, this importer included, resolve them as intended.
    fn write_element(&mut self, element: &Element) -> Result<EntityId> {
        let [start_id, end_id] = element.nodes.as_ref().ok_or_else(|| ExchangeError::MissingNodes {
            element: element.id.clone(),
        })?;
        let (start, start_location) = *self
            .nodes
            .get(start_id)
            .ok_or_else(|| ExchangeError::unknown_node(&element.id, start_id))?;
        let (end, _) = *self
            .nodes
            .get(end_id)
            .ok_or_else(|| ExchangeError::unknown_node(&element.id, end_id))?;
        let profile = match &element.section {
            Some(section) => Some(
                self.profiles
                    .get(section)
                    .cloned()
                    .ok_or_else(|| ExchangeError::unknown_section(&element.id, section))?,
            ),
            None => None,
        };

        let placement = match &element.placement {
            Some(placement) => self.oriented_placement(placement)?,
            None => self.local_placement(None, start_location)?,
        };

        let mut attrs = vec![
            self.guid("element", &element.id),
            AttributeValue::Null,
            AttributeValue::string(
                element
                    .name
                    .as_deref()
                    .unwrap_or(defaults::element_name(element.kind)),
            ),
            AttributeValue::opt_string(element.description.as_deref()),
            AttributeValue::Null,
            AttributeValue::EntityRef(placement),
            AttributeValue::Null,
        ];
        let predefined_type = element.predefined_type.as_deref();
        let ifc_type = match element.kind {
            ElementKind::GenericMember => {
                // PredefinedType (7), Axis (8)
                attrs.push(AttributeValue::enumeration(enum_token(
                    predefined_type,
                    defaults::MEMBER_PREDEFINED_TYPE,
                )));
                attrs.push(AttributeValue::EntityRef(self.z_dir));
                IfcType::IfcStructuralCurveMember
            }
            kind => {
                // Tag (7), PredefinedType (8)
                attrs.push(AttributeValue::Null);
                attrs.push(AttributeValue::enumeration(enum_token(
                    predefined_type,
                    defaults::ELEMENT_PREDEFINED_TYPE,
                )));
                match kind {
                    ElementKind::Column => IfcType::IfcColumn,
                    ElementKind::Slab => IfcType::IfcSlab,
                    ElementKind::Wall => IfcType::IfcWall,
                    _ => IfcType::IfcBeam,
                }
            }
        };
        let entity = self.add(ifc_type, attrs)?;

        for connection in [start, end] {
            let guid = self.derived_guid();
            self.add(
                IfcType::IfcRelConnectsStructuralMember,
                vec![
                    guid,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::EntityRef(entity),
                    AttributeValue::EntityRef(connection),
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                ],
            )?;
        }

        let section_id = element.section.as_deref();
        let material_definition = match (profile, section_id) {
            (Some((profile, section_name)), Some(section_id)) => Some(self.profile_usage(
                section_id,
                &section_name,
                profile,
                element.material.as_deref(),
            )?),
            _ => match element.material.as_deref() {
                Some(name) => Some(self.material_by_name(name)?),
                None => None,
            },
        };
        if let Some(definition) = material_definition {
            let guid = self.derived_guid();
            self.add(
                IfcType::IfcRelAssociatesMaterial,
                vec![
                    guid,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::refs([entity]),
                    AttributeValue::EntityRef(definition),
                ],
            )?;
        }

        self.write_element_properties(element, entity)?;
        Ok(entity)
    }

    /// Material of a given name, minting a bare one when the model lacks it
    fn material_by_name(&mut self, name: &str) -> Result<EntityId> {
        if let Some(&material) = self.material_names.get(name) {
            return Ok(material);
        }
        warn!("Material '{name}' is not defined, writing a bare material");
        let material = self.add(
            IfcType::IfcMaterial,
            vec![AttributeValue::string(name), AttributeValue::Null, AttributeValue::Null],
        )?;
        self.material_names.insert(name.to_string(), material);
        self.report.minted_materials.push(name.to_string());
        Ok(material)
    }

    /// Shared `IfcMaterialProfileSetUsage` for a section and material pair
    fn profile_usage(
        &mut self,
        section_id: &str,
        section_name: &str,
        profile: EntityId,
        material: Option<&str>,
    ) -> Result<EntityId> {
        let key = (section_id.to_string(), material.map(str::to_string));
        if let Some(&usage) = self.profile_usages.get(&key) {
            return Ok(usage);
        }

        let material = match material {
            Some(name) => Some(self.material_by_name(name)?),
            None => None,
        };
        // IfcMaterialProfile(Name, Description, Material, Profile, Priority, Category)
        let material_profile = self.add(
            IfcType::IfcMaterialProfile,
            vec![
                AttributeValue::string(section_name),
                AttributeValue::Null,
                AttributeValue::opt_ref(material),
                AttributeValue::EntityRef(profile),
                AttributeValue::Null,
                AttributeValue::Null,
            ],
        )?;
        // IfcMaterialProfileSet(Name, Description, MaterialProfiles, CompositeProfile)
        let profile_set = self.add(
            IfcType::IfcMaterialProfileSet,
            vec![
                AttributeValue::string(section_name),
                AttributeValue::Null,
                AttributeValue::refs([material_profile]),
                AttributeValue::Null,
            ],
        )?;
        // IfcMaterialProfileSetUsage(ForProfileSet, CardinalPoint, ReferenceExtent)
        let usage = self.add(
            IfcType::IfcMaterialProfileSetUsage,
            vec![
                AttributeValue::EntityRef(profile_set),
                AttributeValue::Null,
                AttributeValue::Null,
            ],
        )?;
        self.profile_usages.insert(key, usage);
        Ok(usage)
    }

    fn write_element_properties(&mut self, element: &Element, entity: EntityId) -> Result<()> {
        let mut properties = element.properties.clone();
        if element.kind == ElementKind::Wall {
            properties
                .entry(defaults::LOAD_BEARING_PROPERTY.to_string())
                .or_insert(PropertyValue::Bool(true));
        }
        if properties.is_empty() {
            return Ok(());
        }

        let mut props = Vec::with_capacity(properties.len());
        for (name, value) in &properties {
            let nominal = match value {
                PropertyValue::Real(v) => AttributeValue::typed("IFCREAL", AttributeValue::Float(*v)),
                PropertyValue::Integer(i) => {
                    AttributeValue::typed("IFCINTEGER", AttributeValue::Integer(*i))
                }
                PropertyValue::Bool(b) => AttributeValue::typed("IFCBOOLEAN", AttributeValue::Bool(*b)),
                PropertyValue::Text(s) => AttributeValue::typed("IFCLABEL", AttributeValue::string(s)),
            };
            props.push(self.single_value(name, nominal)?);
        }

        let guid = self.derived_guid();
        let pset = self.add(
            IfcType::IfcPropertySet,
            vec![
                guid,
                AttributeValue::Null,
                AttributeValue::string(defaults::ELEMENT_PSET_NAME),
                AttributeValue::Null,
                AttributeValue::refs(props),
            ],
        )?;
        let guid = self.derived_guid();
        self.add(
            IfcType::IfcRelDefinesByProperties,
            vec![
                guid,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::refs([entity]),
                AttributeValue::EntityRef(pset),
            ],
        )?;
        Ok(())
    }

    /// IfcPropertySingleValue(Name, Description, NominalValue, Unit)
    fn single_value(&mut self, name: &str, nominal: AttributeValue) -> Result<EntityId> {
        self.add(
            IfcType::IfcPropertySingleValue,
            vec![
                AttributeValue::string(name),
                AttributeValue::Null,
                nominal,
                AttributeValue::Null,
            ],
        )
    }

    fn write_loads(&mut self, model: &StructuralModel) -> Result<()> {
        for load in &model.loads {
            match load_entity(load) {
                Some((ifc_type, attrs)) => {
                    self.add(ifc_type, attrs)?;
                }
                None => {
                    debug!("Load '{}' has no export mapping, skipping", load.id);
                    self.report.skipped_loads += 1;
                }
            }
        }
        Ok(())
    }

    fn write_load_cases(&mut self, model: &StructuralModel) -> Result<()> {
        for case in &model.load_cases {
            let action_type = enum_token(case.action_type.as_deref(), defaults::ACTION_TYPE);
            let action_source = enum_token(case.action_source.as_deref(), defaults::ACTION_SOURCE);
            let name = if case.name.is_empty() {
                defaults::LOAD_CASE_NAME
            } else {
                case.name.as_str()
            };
            self.add(
                IfcType::IfcStructuralLoadCase,
                vec![
                    self.guid("load_case", &case.id),
                    AttributeValue::Null,
                    AttributeValue::string(name),
                    AttributeValue::opt_string(case.description.as_deref()),
                    AttributeValue::Null,
                    AttributeValue::enumeration("LOAD_CASE"),
                    AttributeValue::enumeration(action_type),
                    AttributeValue::enumeration(action_source),
                    AttributeValue::Null,
                    AttributeValue::Null,
                    AttributeValue::Null,
                ],
            )?;
        }
        Ok(())
    }
}

// Root entities, written before the session exists

fn write_application(graph: &mut EntityGraph, config: &ExportConfig) -> Result<()> {
    // IfcOrganization(Identification, Name, Description, Roles, Addresses)
    let organization = graph.add(
        IfcType::IfcOrganization,
        vec![
            AttributeValue::Null,
            AttributeValue::string(&config.application_developer),
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::Null,
        ],
    )?;
    graph.add(
        IfcType::IfcApplication,
        vec![
            AttributeValue::EntityRef(organization),
            AttributeValue::string(&config.application.version),
            AttributeValue::string(&config.application.name),
            AttributeValue::string(defaults::APPLICATION_IDENTIFIER),
        ],
    )?;
    Ok(())
}

fn write_units(graph: &mut EntityGraph, config: &ExportConfig) -> Result<EntityId> {
    let prefix = config.length_unit.si_prefix();
    let units = [
        ("LENGTHUNIT", prefix, "METRE"),
        ("AREAUNIT", prefix, "SQUARE_METRE"),
        ("VOLUMEUNIT", prefix, "CUBIC_METRE"),
        ("PLANEANGLEUNIT", None, "RADIAN"),
        ("FORCEUNIT", None, "NEWTON"),
    ];

    let mut ids = Vec::with_capacity(units.len());
    for (unit_type, prefix, name) in units {
        // IfcSIUnit(Dimensions, UnitType, Prefix, Name)
        ids.push(graph.add(
            IfcType::IfcSIUnit,
            vec![
                AttributeValue::Derived,
                AttributeValue::enumeration(unit_type),
                prefix.map(AttributeValue::enumeration).unwrap_or_default(),
                AttributeValue::enumeration(name),
            ],
        )?);
    }
    Ok(graph.add(IfcType::IfcUnitAssignment, vec![AttributeValue::refs(ids)])?)
}

fn write_contexts(graph: &mut EntityGraph, wcs: EntityId) -> Result<EntityId> {
    let context = graph.add(
        IfcType::IfcGeometricRepresentationContext,
        vec![
            AttributeValue::Null,
            AttributeValue::string("Model"),
            AttributeValue::Integer(3),
            AttributeValue::Float(defaults::GEOMETRIC_PRECISION),
            AttributeValue::EntityRef(wcs),
            AttributeValue::Null,
        ],
    )?;

    for (identifier, view) in [("Body", "MODEL_VIEW"), ("Axis", "GRAPH_VIEW")] {
        graph.add(
            IfcType::IfcGeometricRepresentationSubContext,
            vec![
                AttributeValue::string(identifier),
                AttributeValue::string("Model"),
                AttributeValue::Derived,
                AttributeValue::Derived,
                AttributeValue::Derived,
                AttributeValue::Derived,
                AttributeValue::EntityRef(context),
                AttributeValue::Null,
                AttributeValue::enumeration(view),
                AttributeValue::Null,
            ],
        )?;
    }

    Ok(context)
}

/// Translation-only local placement; the origin point is shared
fn local_placement(
    graph: &mut EntityGraph,
    origin: EntityId,
    parent: Option<EntityId>,
    location: [f64; 3],
) -> Result<EntityId> {
    let point = if location == [0.0; 3] {
        origin
    } else {
        graph.add(IfcType::IfcCartesianPoint, vec![AttributeValue::reals(location)])?
    };
    let axis = graph.add(
        IfcType::IfcAxis2Placement3D,
        vec![AttributeValue::EntityRef(point), AttributeValue::Null, AttributeValue::Null],
    )?;
    Ok(graph.add(
        IfcType::IfcLocalPlacement,
        vec![AttributeValue::opt_ref(parent), AttributeValue::EntityRef(axis)],
    )?)
}

/// IfcPostalAddress(Purpose, Description, UserDefinedPurpose, InternalLocation,
/// AddressLines, PostalBox, Town, Region, PostalCode, Country)
fn write_postal_address(graph: &mut EntityGraph, address: &PostalAddress) -> Result<EntityId> {
    let lines = match &address.street {
        Some(street) => AttributeValue::List(vec![AttributeValue::string(street)]),
        None => AttributeValue::Null,
    };
    Ok(graph.add(
        IfcType::IfcPostalAddress,
        vec![
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::Null,
            lines,
            AttributeValue::Null,
            AttributeValue::opt_string(address.town.as_deref()),
            AttributeValue::opt_string(address.region.as_deref()),
            AttributeValue::opt_string(address.postal_code.as_deref()),
            AttributeValue::opt_string(address.country.as_deref()),
        ],
    )?)
}

fn spatial_of(model: &StructuralModel, kind: SpatialKind) -> impl Iterator<Item = &SpatialNode> {
    model.spatial_nodes.iter().filter(move |node| node.kind == kind)
}

/// First spatial node of a kind; any further ones are reported as duplicates
fn single_spatial<'m>(
    model: &'m StructuralModel,
    kind: SpatialKind,
    report: &mut ExportReport,
) -> Option<&'m SpatialNode> {
    let mut nodes = spatial_of(model, kind);
    let first = nodes.next();
    for extra in nodes {
        warn!("Only one {kind:?} is written, ignoring '{}'", extra.id);
        report.duplicate_ids.push(extra.id.clone());
    }
    first
}

/// Enumeration token from free text, e.g. an action type or a PredefinedType
///
/// Uppercases and replaces anything outside `[A-Z0-9_]`; empty input takes
/// the default.
fn enum_token(value: Option<&str>, default: &str) -> String {
    let token: String = value
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if token.is_empty() {
        default.to_string()
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetTool;
    use crate::domain::{
        BoundaryConditions, Dof, Load, LoadCase, LoadValue, Material, Section, SectionProfile,
    };
    use ifc_struct_model::EntityResolver;

    fn node(id: &str, coordinates: [f64; 3]) -> Node {
        Node {
            id: id.into(),
            coordinates,
            ..Node::default()
        }
    }

    fn beam(id: &str, start: &str, end: &str) -> Element {
        Element {
            id: id.into(),
            nodes: Some([start.into(), end.into()]),
            ..Element::default()
        }
    }

    fn storey(id: &str, elevation: f64) -> SpatialNode {
        SpatialNode {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            kind: SpatialKind::Storey,
            elevation: Some(elevation),
            parent: None,
        }
    }

    fn portal() -> StructuralModel {
        StructuralModel {
            nodes: vec![
                Node {
                    boundary_conditions: BoundaryConditions::fixed(),
                    ..node("n1", [0.0, 0.0, 0.0])
                },
                node("n2", [0.0, 0.0, 3.0]),
                node("n3", [6.0, 0.0, 3.0]),
            ],
            elements: vec![
                Element {
                    kind: ElementKind::Column,
                    section: Some("s1".into()),
                    material: Some("S355".into()),
                    ..beam("c1", "n1", "n2")
                },
                Element {
                    section: Some("s1".into()),
                    material: Some("S355".into()),
                    ..beam("b1", "n2", "n3")
                },
            ],
            materials: vec![Material {
                id: "m1".into(),
                name: "S355".into(),
                description: None,
                properties: [("YoungModulus".to_string(), 2.1e11)].into_iter().collect(),
            }],
            sections: vec![Section {
                id: "s1".into(),
                name: "IPE300".into(),
                profile: SectionProfile::IShape {
                    overall_width: 150.0,
                    overall_depth: 300.0,
                    web_thickness: 7.1,
                    flange_thickness: 10.7,
                },
            }],
            ..StructuralModel::default()
        }
    }

    fn count(graph: &EntityGraph, ifc_type: IfcType) -> usize {
        graph.entities_by_type(&ifc_type).len()
    }

    #[test]
    fn test_portal_frame_export() {
        let (graph, report) = export_model(&portal(), &ExportConfig::new()).unwrap();
        assert_eq!(report.entity_count, graph.len());
        assert!(graph.dangling_references().is_empty());

        assert_eq!(count(&graph, IfcType::IfcProject), 1);
        assert_eq!(count(&graph, IfcType::IfcStructuralPointConnection), 3);
        assert_eq!(count(&graph, IfcType::IfcRelConnectsStructuralMember), 4);
        assert_eq!(count(&graph, IfcType::IfcColumn), 1);
        assert_eq!(count(&graph, IfcType::IfcBeam), 1);
        // Both elements share one profile set usage
        assert_eq!(count(&graph, IfcType::IfcMaterialProfileSetUsage), 1);
        assert_eq!(count(&graph, IfcType::IfcMaterial), 1);
        assert_eq!(count(&graph, IfcType::IfcMaterialProperties), 1);
        assert_eq!(count(&graph, IfcType::IfcRelContainedInSpatialStructure), 1);
        assert!(report.minted_materials.is_empty());
    }

    #[test]
    fn test_unknown_node_fails_export() {
        let mut model = portal();
        model.elements.push(beam("b2", "n3", "n9"));
        let err = export_model(&model, &ExportConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::UnknownNode { ref element, ref node } if element == "b2" && node == "n9"
        ));
    }

    #[test]
    fn test_unknown_section_and_missing_nodes_fail() {
        let mut model = portal();
        model.elements[1].section = Some("s9".into());
        let err = export_model(&model, &ExportConfig::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownSection { .. }));

        let mut model = portal();
        model.elements[0].nodes = None;
        let err = export_model(&model, &ExportConfig::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::MissingNodes { ref element } if element == "c1"));
    }

    #[test]
    fn test_boundary_condition_only_when_restrained() {
        let (graph, _) = export_model(&portal(), &ExportConfig::new()).unwrap();
        let conditions = graph.entities_by_type(&IfcType::IfcBoundaryNodeCondition);
        assert_eq!(conditions.len(), 1);
        for index in 1..=6 {
            assert_eq!(conditions[0].get_bool(index), Some(true));
        }

        let mut model = portal();
        model.nodes[0].boundary_conditions = BoundaryConditions {
            translation_z: Dof::Fixed,
            ..BoundaryConditions::default()
        };
        let (graph, _) = export_model(&model, &ExportConfig::new()).unwrap();
        let condition = graph.entities_by_type(&IfcType::IfcBoundaryNodeCondition)[0];
        let flags: Vec<_> = (1..=6).map(|i| condition.get_bool(i)).collect();
        assert_eq!(
            flags,
            vec![Some(false), Some(false), Some(true), Some(false), Some(false), Some(false)]
        );
    }

    #[test]
    fn test_duplicate_storeys_written_once() {
        let model = StructuralModel {
            spatial_nodes: vec![storey("l1", 0.0), storey("l2", 3.5), storey("l1", 7.0)],
            ..StructuralModel::default()
        };
        let (graph, report) = export_model(&model, &ExportConfig::new()).unwrap();
        let storeys = graph.entities_by_type(&IfcType::IfcBuildingStorey);
        assert_eq!(storeys.len(), 2);
        assert_eq!(storeys[1].get_float(9), Some(3.5));
        assert_eq!(report.duplicate_ids, vec!["l1".to_string()]);
    }

    #[test]
    fn test_linear_loads_are_skipped() {
        let mut model = portal();
        model.loads = vec![
            Load {
                id: "p".into(),
                name: Some("Point".into()),
                value: LoadValue::PointForceMoment {
                    force: [0.0, 0.0, -5.0],
                    moment: [0.0; 3],
                },
            },
            Load {
                id: "q".into(),
                name: None,
                value: LoadValue::LinearForceMoment {
                    force: [0.0, 0.0, -2.0],
                    moment: [0.0; 3],
                },
            },
        ];
        model.load_cases = vec![LoadCase {
            id: "lc1".into(),
            name: "Live".into(),
            action_type: Some("variable q".into()),
            ..LoadCase::default()
        }];
        let (graph, report) = export_model(&model, &ExportConfig::new()).unwrap();
        assert_eq!(report.skipped_loads, 1);
        assert_eq!(count(&graph, IfcType::IfcStructuralLoadSingleForce), 1);
        assert_eq!(count(&graph, IfcType::IfcStructuralLoadLinearForce), 0);

        let case = graph.entities_by_type(&IfcType::IfcStructuralLoadCase)[0];
        assert_eq!(case.get_enum(6), Some("VARIABLE_Q"));
        assert_eq!(case.get_enum(7), Some(defaults::ACTION_SOURCE));
    }

    #[test]
    fn test_target_tool_override() {
        let config = ExportConfig::new()
            .with_application("Frame", "3.0")
            .with_target(TargetTool::Revit);
        let (graph, _) = export_model(&portal(), &config).unwrap();
        let application = graph.first_of_type(&IfcType::IfcApplication).unwrap();
        assert_eq!(application.get_string(2), Some("Frame for Revit"));
        assert_eq!(application.get_string(1), Some("2024"));
        assert_eq!(
            graph.metadata.originating_system.as_deref(),
            Some("Frame for Revit 2024")
        );
    }

    #[test]
    fn test_unknown_material_is_minted_once() {
        let mut model = portal();
        for element in &mut model.elements {
            element.section = None;
            element.material = Some("Timber".into());
        }
        let (graph, report) = export_model(&model, &ExportConfig::new()).unwrap();
        assert_eq!(report.minted_materials, vec!["Timber".to_string()]);
        assert_eq!(count(&graph, IfcType::IfcMaterial), 2);
        assert_eq!(count(&graph, IfcType::IfcRelAssociatesMaterial), 2);
    }

    #[test]
    fn test_walls_are_load_bearing() {
        let model = StructuralModel {
            nodes: vec![node("a", [0.0; 3]), node("b", [4.0, 0.0, 0.0])],
            elements: vec![Element {
                kind: ElementKind::Wall,
                ..beam("w1", "a", "b")
            }],
            ..StructuralModel::default()
        };
        let (graph, _) = export_model(&model, &ExportConfig::new()).unwrap();
        let pset = graph.first_of_type(&IfcType::IfcPropertySet).unwrap();
        assert_eq!(pset.get_string(2), Some(defaults::ELEMENT_PSET_NAME));
        let value = graph.first_of_type(&IfcType::IfcPropertySingleValue).unwrap();
        assert_eq!(value.get_string(0), Some(defaults::LOAD_BEARING_PROPERTY));
        assert_eq!(value.get_bool(2), Some(true));
    }

    #[test]
    fn test_export_is_deterministic() {
        let (first, _) = export_model(&portal(), &ExportConfig::new()).unwrap();
        let (second, _) = export_model(&portal(), &ExportConfig::new()).unwrap();
        assert_eq!(first.len(), second.len());
        assert!(first.iter().zip(second.iter()).all(|(a, b)| a == b));

        let node = first
            .entities_by_type(&IfcType::IfcStructuralPointConnection)[0]
            .get_string(0)
            .map(str::to_string);
        let project = global_id("project", defaults::PROJECT_NAME);
        assert_eq!(node, Some(global_id_in(&project, "node", "n1")));
    }

    fn global_ids(graph: &EntityGraph) -> FxHashSet<String> {
        graph
            .iter()
            .filter_map(|entity| match entity.get(0) {
                Some(AttributeValue::String(guid)) if guid.len() == 22 => Some(guid.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_projects_do_not_share_global_ids() {
        let mut other = portal();
        other.project_info.name = Some("Other".into());
        let (first, _) = export_model(&portal(), &ExportConfig::new()).unwrap();
        let (second, _) = export_model(&other, &ExportConfig::new()).unwrap();

        let first = global_ids(&first);
        let second = global_ids(&second);
        assert!(first.len() > 10);
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn test_extra_sites_and_buildings_are_reported() {
        let spatial = |id: &str, kind| SpatialNode {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            kind,
            elevation: None,
            parent: None,
        };
        let model = StructuralModel {
            spatial_nodes: vec![
                spatial("s1", SpatialKind::Site),
                spatial("b1", SpatialKind::Building),
                spatial("s2", SpatialKind::Site),
                spatial("b2", SpatialKind::Building),
                storey("l1", 0.0),
            ],
            ..StructuralModel::default()
        };
        let (graph, report) = export_model(&model, &ExportConfig::new()).unwrap();
        assert_eq!(report.duplicate_ids, vec!["s2".to_string(), "b2".to_string()]);
        assert_eq!(count(&graph, IfcType::IfcSite), 1);
        assert_eq!(count(&graph, IfcType::IfcBuilding), 1);

        // The storey hangs off the real building, never a placeholder id
        let building = graph.first_of_type(&IfcType::IfcBuilding).unwrap();
        assert_eq!(building.get_string(2), Some("B1"));
        let storey = graph.first_of_type(&IfcType::IfcBuildingStorey).unwrap();
        let parent = graph
            .entities_by_type(&IfcType::IfcRelAggregates)
            .into_iter()
            .find(|rel| rel.get_refs(5).unwrap_or_default().contains(&storey.id))
            .and_then(|rel| rel.get_ref(4));
        assert_eq!(parent, Some(building.id));
        assert!(graph.get(EntityId(0)).is_none());
        assert!(graph.dangling_references().is_empty());
    }

    #[test]
    fn test_address_and_predefined_types_are_written() {
        let mut model = portal();
        model.project_info.building_address = Some(PostalAddress {
            street: Some("Quai 3".into()),
            town: Some("Geneva".into()),
            country: Some("CH".into()),
            ..PostalAddress::default()
        });
        model.elements[1].predefined_type = Some("joist".into());
        model.elements.push(Element {
            kind: ElementKind::GenericMember,
            predefined_type: Some("PIN_JOINED_MEMBER".into()),
            ..beam("m1", "n1", "n3")
        });
        model.elements.push(Element {
            kind: ElementKind::GenericMember,
            ..beam("m2", "n2", "n3")
        });
        let (graph, _) = export_model(&model, &ExportConfig::new()).unwrap();

        let building = graph.first_of_type(&IfcType::IfcBuilding).unwrap();
        let address = graph.get(building.get_ref(11).unwrap()).unwrap();
        assert_eq!(address.ifc_type, IfcType::IfcPostalAddress);
        assert_eq!(address.get_string(6), Some("Geneva"));
        assert_eq!(address.get_string(9), Some("CH"));

        let column = graph.first_of_type(&IfcType::IfcColumn).unwrap();
        assert_eq!(column.get_enum(8), Some(defaults::ELEMENT_PREDEFINED_TYPE));
        let beam = graph.first_of_type(&IfcType::IfcBeam).unwrap();
        assert_eq!(beam.get_enum(8), Some("JOIST"));
        let members: Vec<_> = graph
            .entities_by_type(&IfcType::IfcStructuralCurveMember)
            .iter()
            .map(|m| m.get_enum(7))
            .collect();
        assert_eq!(
            members,
            vec![Some("PIN_JOINED_MEMBER"), Some(defaults::MEMBER_PREDEFINED_TYPE)]
        );

        // No address entity when none is given
        let (graph, _) = export_model(&portal(), &ExportConfig::new()).unwrap();
        assert_eq!(count(&graph, IfcType::IfcPostalAddress), 0);
    }

    #[test]
    fn test_enum_token() {
        assert_eq!(enum_token(None, "PERMANENT_G"), "PERMANENT_G");
        assert_eq!(enum_token(Some("  "), "PERMANENT_G"), "PERMANENT_G");
        assert_eq!(enum_token(Some("wind_w"), "X"), "WIND_W");
    }
}

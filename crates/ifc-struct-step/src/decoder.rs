// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity decoder
//!
//! Decodes the whole DATA section of a STEP file into an [`EntityGraph`].

use crate::header::parse_header;
use crate::scanner::{data_section_start, EntityScanner};
use crate::tokenizer::parse_entity_at;
use ifc_struct_model::{EntityGraph, EntityId, Error, Result};
use log::{debug, warn};

/// Entity decoder over STEP text
pub struct EntityDecoder<'a> {
    /// Raw STEP content
    content: &'a str,
}

impl<'a> EntityDecoder<'a> {
    /// Create a new decoder for the given content
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// Decode the header and every instance into a fresh graph
    ///
    /// Entities keep their file ids and file order. A malformed instance or a
    /// repeated id fails the whole decode. Unresolved references are kept and
    /// logged, leaving it to consumers to treat them as absent.
    pub fn decode_all(&self) -> Result<EntityGraph> {
        if !self.content.trim_start().starts_with("ISO-10303-21") {
            return Err(Error::format("missing ISO-10303-21 preamble"));
        }
        if data_section_start(self.content).is_none() {
            return Err(Error::format("missing DATA section"));
        }

        let mut graph = EntityGraph::with_metadata(parse_header(self.content)?);

        for (id, _, start, end) in EntityScanner::new(self.content) {
            let entity_id = EntityId(id);
            let entity = parse_entity_at(self.content, start, end)
                .map_err(|e| Error::entity_parse(entity_id, e))?;
            graph.insert(entity)?;
        }

        let dangling = graph.dangling_references();
        if !dangling.is_empty() {
            warn!(
                "{} unresolved references, first: {} -> {}",
                dangling.len(),
                dangling[0].0,
                dangling[0].1
            );
        }
        debug!("Decoded {} entities ({})", graph.len(), graph.metadata.schema_version);

        Ok(graph)
    }
}

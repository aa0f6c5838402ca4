// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Struct STEP - ISO-10303-21 codec for the structural entity graph
//!
//! This crate reads and writes STEP physical files. It implements the
//! [`FormatCodec`] trait from `ifc-struct-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Deterministic output**: entities are written in graph order and
//!   reals always carry a decimal point
//!
//! # Example
//!
//! ```ignore
//! use ifc_struct_model::{EntityResolver, FormatCodec, IfcType};
//! use ifc_struct_step::StepCodec;
//!
//! let codec = StepCodec::new();
//! let graph = codec.decode(bytes)?;
//! println!("Found {} beams", graph.entities_by_type(&IfcType::IfcBeam).len());
//! let written = codec.encode(&graph)?;
//! ```

mod decoder;
mod header;
mod scanner;
mod tokenizer;
mod writer;

pub use decoder::EntityDecoder;
pub use header::parse_header;
pub use scanner::EntityScanner;
pub use tokenizer::{parse_entity, unescape_string, Token};
pub use writer::{format_real, quote, write_entity, DEFAULT_FILE_DESCRIPTION};

use ifc_struct_model::{EntityGraph, Error, FormatCodec, Result};

/// Schema identifier written when neither the codec nor the graph sets one
pub const DEFAULT_SCHEMA: &str = "IFC4";

/// STEP codec implementing `FormatCodec`
#[derive(Clone, Debug, Default)]
pub struct StepCodec {
    /// Schema identifier forced on every written file
    pub schema: Option<String>,
}

impl StepCodec {
    /// Create a codec that writes the graph's own schema (IFC4 if unset)
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the FILE_SCHEMA identifier for written files
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Decode STEP text into a graph
    pub fn decode_str(&self, content: &str) -> Result<EntityGraph> {
        EntityDecoder::new(content).decode_all()
    }

    /// Encode a graph into STEP text
    pub fn encode_string(&self, graph: &EntityGraph) -> Result<String> {
        let schema = self
            .schema
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(Some(graph.metadata.schema_version.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_SCHEMA);
        writer::write_graph(graph, schema)
    }
}

impl FormatCodec for StepCodec {
    fn decode(&self, content: &[u8]) -> Result<EntityGraph> {
        let text = std::str::from_utf8(content)
            .map_err(|e| Error::format(format!("content is not valid UTF-8: {e}")))?;
        self.decode_str(text)
    }

    fn encode(&self, graph: &EntityGraph) -> Result<Vec<u8>> {
        self.encode_string(graph).map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_struct_model::{AttributeValue, EntityResolver, IfcType, ModelMetadata};

    fn sample_graph() -> EntityGraph {
        let mut graph = EntityGraph::with_metadata(ModelMetadata {
            file_name: Some("frame.ifc".to_string()),
            author: Some("Ann".to_string()),
            ..ModelMetadata::default()
        });
        let origin = graph
            .add(IfcType::IfcCartesianPoint, vec![AttributeValue::reals([0.0, 0.0, 3.5])])
            .unwrap();
        let placement = graph
            .add(
                IfcType::IfcAxis2Placement3D,
                vec![AttributeValue::EntityRef(origin), AttributeValue::Null, AttributeValue::Null],
            )
            .unwrap();
        graph
            .add(
                IfcType::IfcLocalPlacement,
                vec![AttributeValue::Null, AttributeValue::EntityRef(placement)],
            )
            .unwrap();
        graph
            .add(
                IfcType::IfcMaterial,
                vec![
                    AttributeValue::string("S355 'JR' \\ Stahl \u{00FC}"),
                    AttributeValue::Null,
                    AttributeValue::enumeration("STEEL"),
                ],
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_round_trip_preserves_graph() {
        let codec = StepCodec::new();
        let graph = sample_graph();
        let bytes = codec.encode(&graph).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded.len(), graph.len());
        for entity in graph.iter() {
            assert_eq!(decoded.get(entity.id), Some(entity));
        }
        assert_eq!(decoded.metadata.schema_version, DEFAULT_SCHEMA);
        assert_eq!(decoded.metadata.file_name.as_deref(), Some("frame.ifc"));
        assert_eq!(decoded.metadata.author.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_schema_override() {
        let text = StepCodec::new()
            .with_schema("IFC4X3")
            .encode_string(&sample_graph())
            .unwrap();
        assert!(text.contains("FILE_SCHEMA(('IFC4X3'));"));
        assert!(text.starts_with("ISO-10303-21;\nHEADER;\n"));
        assert!(text.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let err = StepCodec::new().decode(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}

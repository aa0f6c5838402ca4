// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Struct Bridge - Structural analysis models to and from IFC
//!
//! Maps a caller-owned [`StructuralModel`] (nodes, elements, materials,
//! sections, loads and load cases) onto an IFC entity graph and back.
//!
//! # Architecture
//!
//! - [`export_model`] - Model to graph, one `ExportSession` per call
//! - [`Importer`] - Graph to model, independent extractions over one index
//! - [`placement`] - Local placement chains composed into world transforms
//! - [`StructuralExchange`] - Byte and file level entry points over a
//!   [`FormatCodec`], STEP by default
//!
//! # Example
//!
//! ```
//! use ifc_struct_bridge::{ExportConfig, StructuralExchange, StructuralModel};
//!
//! let exchange = StructuralExchange::new().with_config(ExportConfig::new().with_author("Ann"));
//! let (bytes, report) = exchange.export_bytes(&StructuralModel::default()).unwrap();
//! assert_eq!(report.skipped_loads, 0);
//!
//! let model = exchange.import_bytes(&bytes).unwrap();
//! assert_eq!(model.project_info.name.as_deref(), Some("Structural Project"));
//! ```

pub mod config;
pub mod defaults;
pub mod domain;
pub mod error;
pub mod exporter;
pub mod guid;
pub mod importer;
pub mod loads;
pub mod placement;
pub mod profile;
pub mod units;

pub use config::{ExportConfig, TargetTool};
pub use domain::*;
pub use error::{ExchangeError, Result};
pub use exporter::{export_model, global_id, global_id_in, ExportReport};
pub use importer::Importer;
pub use units::LengthUnit;

use ifc_struct_model::{EntityGraph, FormatCodec};
use ifc_struct_step::StepCodec;
use log::info;
use std::path::Path;

/// Structural model exchange over a format codec
///
/// Holds only the codec and an immutable export configuration, so one
/// instance can serve concurrent calls. Each call builds its own session;
/// sessions are never shared between in-flight operations.
#[derive(Clone, Debug, Default)]
pub struct StructuralExchange<C: FormatCodec = StepCodec> {
    codec: C,
    config: ExportConfig,
}

impl StructuralExchange<StepCodec> {
    /// Exchange over STEP with the default configuration
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: FormatCodec> StructuralExchange<C> {
    /// Exchange over a custom codec
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            config: ExportConfig::default(),
        }
    }

    /// Replace the export configuration
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Current export configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Decode bytes and extract the structural model
    pub fn import_bytes(&self, content: &[u8]) -> Result<StructuralModel> {
        let graph = self.codec.decode(content)?;
        Ok(self.import_graph(&graph))
    }

    /// Extract the structural model of an already decoded graph
    pub fn import_graph(&self, graph: &EntityGraph) -> StructuralModel {
        Importer::new(graph).import()
    }

    /// Read and import a file
    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<StructuralModel> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        info!("Importing {} ({} bytes)", path.display(), content.len());
        self.import_bytes(&content)
    }

    /// Export a model to encoded bytes
    pub fn export_bytes(&self, model: &StructuralModel) -> Result<(Vec<u8>, ExportReport)> {
        let (graph, report) = export_model(model, &self.config)?;
        let bytes = self.codec.encode(&graph)?;
        Ok((bytes, report))
    }

    /// Export a model with the metadata overrides of a target tool
    pub fn export_for(
        &self,
        model: &StructuralModel,
        target: TargetTool,
    ) -> Result<(Vec<u8>, ExportReport)> {
        let config = self.config.clone().with_target(target);
        let (graph, report) = export_model(model, &config)?;
        let bytes = self.codec.encode(&graph)?;
        Ok((bytes, report))
    }

    /// Export a model and write it to a file
    ///
    /// Nothing is written when the export fails.
    pub fn export_file(&self, model: &StructuralModel, path: impl AsRef<Path>) -> Result<ExportReport> {
        let (bytes, report) = self.export_bytes(model)?;
        std::fs::write(path.as_ref(), bytes)?;
        info!(
            "Wrote {} entities to {}",
            report.entity_count,
            path.as_ref().display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_for_target_tool() {
        let exchange = StructuralExchange::new();
        let (bytes, _) = exchange
            .export_for(&StructuralModel::default(), TargetTool::Tekla)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("IFC-Struct for Tekla"));
        assert!(text.contains("FILE_SCHEMA(('IFC4'));"));
    }

    #[test]
    fn test_codec_errors_pass_through() {
        let err = StructuralExchange::new()
            .import_bytes(b"not a step file")
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Graph(ifc_struct_model::Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StructuralExchange::new()
            .import_file("/nonexistent/frame.ifc")
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Io(_)));
    }
}

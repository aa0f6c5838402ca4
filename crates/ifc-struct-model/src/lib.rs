// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Struct Model - Entity graph and codec traits for structural IFC exchange
//!
//! This crate holds the format-neutral half of the exchange: a typed entity
//! graph mirroring the IFC object model, the trait used to look entities up,
//! and the trait a byte-level codec implements.
//!
//! # Architecture
//!
//! - [`EntityGraph`] - Ordered entity store with id and type indexes
//! - [`EntityResolver`] - Entity lookup and reference resolution
//! - [`FormatCodec`] - Bytes to graph and back
//!
//! # Example
//!
//! ```
//! use ifc_struct_model::{AttributeValue, EntityGraph, EntityResolver, IfcType};
//!
//! let mut graph = EntityGraph::new();
//! let origin = graph
//!     .add(IfcType::IfcCartesianPoint, vec![AttributeValue::reals([0.0, 0.0, 0.0])])
//!     .unwrap();
//! assert_eq!(graph.get(origin).map(|e| &e.ifc_type), Some(&IfcType::IfcCartesianPoint));
//! ```

pub mod error;
pub mod graph;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use graph::*;
pub use resolver::*;
pub use traits::*;
pub use types::*;

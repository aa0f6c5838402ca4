// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec abstraction
//!
//! The structural mapping layer only ever sees [`EntityGraph`] values. A
//! `FormatCodec` is the boundary that turns them into bytes and back.

use crate::{EntityGraph, Result};

/// Byte-level encoder/decoder for an exchange file format
///
/// # Example
///
/// ```ignore
/// use ifc_struct_model::FormatCodec;
///
/// fn reencode(codec: &dyn FormatCodec, bytes: &[u8]) -> ifc_struct_model::Result<Vec<u8>> {
///     let graph = codec.decode(bytes)?;
///     codec.encode(&graph)
/// }
/// ```
pub trait FormatCodec: Send + Sync {
    /// Decode file content into a fresh entity graph
    fn decode(&self, content: &[u8]) -> Result<EntityGraph>;

    /// Encode an entity graph into file content
    fn encode(&self, graph: &EntityGraph) -> Result<Vec<u8>>;
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for entity graph construction and codec operations

use crate::EntityId;
use thiserror::Error;

/// Result type alias for graph and codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the entity graph and by format codecs
#[derive(Error, Debug)]
pub enum Error {
    /// Input is not a well-formed exchange file
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Failed to parse header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to parse entity
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// An attribute refers to an entity that is not (yet) part of the graph
    #[error("Entity {entity} references missing entity {target}")]
    DanglingReference { entity: EntityId, target: EntityId },

    /// Two entities share the same instance id
    #[error("Duplicate entity id {0}")]
    DuplicateEntity(EntityId),

    /// Graph content that cannot be written to the target format
    #[error("Cannot encode entity {entity}: {message}")]
    Encode { entity: EntityId, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new header error
    pub fn header(msg: impl Into<String>) -> Self {
        Error::InvalidHeader(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        Error::EntityParse(id, msg.into())
    }

    /// Create a new encode error
    pub fn encode(entity: EntityId, msg: impl Into<String>) -> Self {
        Error::Encode {
            entity,
            message: msg.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

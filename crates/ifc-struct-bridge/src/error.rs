// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for structural exchange

use thiserror::Error;

/// Structural exchange result type
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Errors raised while exporting or importing structural models
///
/// Missing optional data never ends up here; it is replaced by the values
/// in [`crate::defaults`].
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// An element refers to a node id that is not in the model
    #[error("Element '{element}' references unknown node '{node}'")]
    UnknownNode { element: String, node: String },

    /// An element refers to a section id that is not in the model
    #[error("Element '{element}' references unknown section '{section}'")]
    UnknownSection { element: String, section: String },

    /// An element has no node pair and cannot be exported
    #[error("Element '{element}' has no start/end nodes")]
    MissingNodes { element: String },

    /// Entity graph or codec error, passed through unchanged
    #[error(transparent)]
    Graph(#[from] ifc_struct_model::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExchangeError {
    /// Create an unknown node error
    pub fn unknown_node(element: impl Into<String>, node: impl Into<String>) -> Self {
        ExchangeError::UnknownNode {
            element: element.into(),
            node: node.into(),
        }
    }

    /// Create an unknown section error
    pub fn unknown_section(element: impl Into<String>, section: impl Into<String>) -> Self {
        ExchangeError::UnknownSection {
            element: element.into(),
            section: section.into(),
        }
    }
}

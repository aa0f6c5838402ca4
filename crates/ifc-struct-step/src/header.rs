// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HEADER section parsing
//!
//! Each header statement is decoded with the same grammar as entity
//! attributes, so escapes and nested lists behave identically.

use crate::scanner::{header_section, split_statements};
use crate::tokenizer::parse_header_statement;
use ifc_struct_model::{AttributeValue, Error, ModelMetadata, Result};
use log::{debug, warn};

/// Parse the HEADER section into model metadata
///
/// Fails when the section is missing or one of its statements is malformed.
/// A missing FILE_SCHEMA only logs a warning and leaves the schema empty.
pub fn parse_header(content: &str) -> Result<ModelMetadata> {
    let section = header_section(content).ok_or_else(|| Error::header("missing HEADER section"))?;
    let mut metadata = ModelMetadata::default();
    let mut saw_schema = false;

    for statement in split_statements(section) {
        let (keyword, args) = parse_header_statement(statement).map_err(Error::header)?;
        match keyword.as_str() {
            "FILE_DESCRIPTION" => {
                metadata.file_description = args.first().and_then(first_string);
            }
            "FILE_NAME" => {
                // FILE_NAME(name, time_stamp, author, organization,
                //           preprocessor_version, originating_system, authorization)
                metadata.file_name = args.first().and_then(non_empty_string);
                metadata.timestamp = args.get(1).and_then(non_empty_string);
                metadata.author = args.get(2).and_then(first_string);
                metadata.organization = args.get(3).and_then(first_string);
                metadata.preprocessor_version = args.get(4).and_then(non_empty_string);
                metadata.originating_system = args.get(5).and_then(non_empty_string);
            }
            "FILE_SCHEMA" => {
                saw_schema = true;
                metadata.schema_version = args.first().and_then(first_string).unwrap_or_default();
            }
            other => debug!("Ignoring header statement {other}"),
        }
    }

    if !saw_schema {
        warn!("HEADER has no FILE_SCHEMA statement");
    }

    Ok(metadata)
}

fn non_empty_string(value: &AttributeValue) -> Option<String> {
    value
        .as_string()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First non-empty string of a list, or the value itself when it is a string
fn first_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::List(items) => items.iter().find_map(non_empty_string),
        other => non_empty_string(other),
    }
}

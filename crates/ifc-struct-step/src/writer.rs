// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP physical file writer
//!
//! Serializes an entity graph into ISO-10303-21 text, one instance per
//! line, in graph insertion order.

use ifc_struct_model::{AttributeValue, Entity, EntityGraph, EntityId, Error, Result};
use std::fmt::Write;

/// View definition written when the graph carries none
pub const DEFAULT_FILE_DESCRIPTION: &str = "ViewDefinition [StructuralAnalysisView]";

/// Serialize a graph to STEP text using the given schema identifier
pub fn write_graph(graph: &EntityGraph, schema: &str) -> Result<String> {
    let mut out = String::with_capacity(64 * graph.len() + 512);
    write_header(&mut out, graph, schema);

    out.push_str("DATA;\n");
    for entity in graph.iter() {
        write_entity(&mut out, entity)?;
        out.push('\n');
    }
    out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");

    Ok(out)
}

fn write_header(out: &mut String, graph: &EntityGraph, schema: &str) {
    let meta = &graph.metadata;
    let quoted = |value: Option<&String>| quote(value.map(String::as_str).unwrap_or(""));

    out.push_str("ISO-10303-21;\nHEADER;\n");
    let description = meta
        .file_description
        .as_deref()
        .unwrap_or(DEFAULT_FILE_DESCRIPTION);
    let _ = writeln!(out, "FILE_DESCRIPTION(({}),'2;1');", quote(description));
    let _ = writeln!(
        out,
        "FILE_NAME({},{},({}),({}),{},{},'');",
        quoted(meta.file_name.as_ref()),
        quoted(meta.timestamp.as_ref()),
        quoted(meta.author.as_ref()),
        quoted(meta.organization.as_ref()),
        quoted(meta.preprocessor_version.as_ref()),
        quoted(meta.originating_system.as_ref()),
    );
    let _ = writeln!(out, "FILE_SCHEMA(({}));", quote(schema));
    out.push_str("ENDSEC;\n");
}

/// Write one instance line (without the trailing newline)
pub fn write_entity(out: &mut String, entity: &Entity) -> Result<()> {
    let _ = write!(out, "{}={}(", entity.id, entity.ifc_type.name());
    write_values(out, entity.id, &entity.attributes)?;
    out.push_str(");");
    Ok(())
}

fn write_values(out: &mut String, owner: EntityId, values: &[AttributeValue]) -> Result<()> {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(out, owner, value)?;
    }
    Ok(())
}

fn write_value(out: &mut String, owner: EntityId, value: &AttributeValue) -> Result<()> {
    match value {
        AttributeValue::Null => out.push('$'),
        AttributeValue::Derived => out.push('*'),
        AttributeValue::EntityRef(id) => {
            let _ = write!(out, "{id}");
        }
        AttributeValue::Bool(b) => out.push_str(if *b { ".T." } else { ".F." }),
        AttributeValue::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        AttributeValue::Float(f) => {
            let real = format_real(*f)
                .ok_or_else(|| Error::encode(owner, format!("non-finite real {f}")))?;
            out.push_str(&real);
        }
        AttributeValue::String(s) => out.push_str(&quote(s)),
        AttributeValue::Enum(e) => {
            let _ = write!(out, ".{e}.");
        }
        AttributeValue::List(items) => {
            out.push('(');
            write_values(out, owner, items)?;
            out.push(')');
        }
        AttributeValue::TypedValue(name, args) => {
            out.push_str(name);
            out.push('(');
            write_values(out, owner, args)?;
            out.push(')');
        }
    }
    Ok(())
}

/// Format a real so that it always carries a decimal point
///
/// Returns `None` for NaN and infinities, which STEP cannot represent.
pub fn format_real(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // Debug gives the shortest round-trip form, switching to exponent
    // notation for very large or small magnitudes
    let repr = format!("{value:?}");
    let (mantissa, exponent) = match repr.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (repr.as_str(), None),
    };

    let mut real = mantissa.to_string();
    if !real.contains('.') {
        real.push_str(".0");
    }
    if let Some(exp) = exponent {
        real.push('E');
        real.push_str(exp);
    }
    Some(real)
}

/// Quote and escape a string value
///
/// `'` is doubled, `\` is doubled, and characters outside printable
/// ASCII are written as `\X2\hhhh\X0\` runs of UTF-16 code units.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');

    let mut wide: Vec<u16> = Vec::new();
    let flush = |out: &mut String, wide: &mut Vec<u16>| {
        if wide.is_empty() {
            return;
        }
        out.push_str("\\X2\\");
        for unit in wide.drain(..) {
            let _ = write!(out, "{unit:04X}");
        }
        out.push_str("\\X0\\");
    };

    for c in s.chars() {
        if c.is_ascii() && !c.is_ascii_control() {
            flush(&mut out, &mut wide);
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            wide.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush(&mut out, &mut wide);

    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_struct_model::IfcType;

    #[test]
    fn test_format_real_always_has_point() {
        assert_eq!(format_real(1.0).unwrap(), "1.0");
        assert_eq!(format_real(-2.0).unwrap(), "-2.0");
        assert_eq!(format_real(0.25).unwrap(), "0.25");
        assert_eq!(format_real(1e-7).unwrap(), "1.0E-7");
        assert_eq!(format_real(2.5e20).unwrap(), "2.5E20");
        assert_eq!(format_real(f64::NAN), None);
        assert_eq!(format_real(f64::INFINITY), None);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote(r"C:\temp"), r"'C:\\temp'");
        assert_eq!(quote("Träger"), r"'Tr\X2\00E4\X0\ger'");
        assert_eq!(quote("ÄÖ"), r"'\X2\00C400D6\X0\'");
    }

    #[test]
    fn test_write_entity_line() {
        let entity = Entity::new(
            EntityId(7),
            IfcType::IfcPropertySingleValue,
            vec![
                AttributeValue::string("LoadBearing"),
                AttributeValue::Null,
                AttributeValue::typed("IFCBOOLEAN", AttributeValue::Bool(true)),
                AttributeValue::Null,
            ],
        );
        let mut out = String::new();
        write_entity(&mut out, &entity).unwrap();
        assert_eq!(out, "#7=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCBOOLEAN(.T.),$);");
    }

    #[test]
    fn test_non_finite_real_fails_with_owner() {
        let mut graph = EntityGraph::new();
        let id = graph
            .add(IfcType::IfcCartesianPoint, vec![AttributeValue::reals([0.0, f64::NAN, 0.0])])
            .unwrap();
        match write_graph(&graph, "IFC4") {
            Err(Error::Encode { entity, .. }) => assert_eq!(entity, id),
            other => panic!("expected encode error, got {other:?}"),
        }
    }
}

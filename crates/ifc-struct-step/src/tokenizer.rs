// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP file tokenizer using nom combinators
//!
//! Parses STEP entity definitions and header statements into tokens.

use ifc_struct_model::{AttributeValue, Entity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};

/// Raw token from STEP file (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value ('text'), still in its escaped file form
    String(&'a str),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to owned AttributeValue, decoding string escapes
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(unescape_string(s)),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                name.to_ascii_uppercase(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

// ============================================================================
// String Escapes
// ============================================================================

/// Decode the escape sequences of a STEP string body
///
/// Handles `''`, `\\`, `\X2\hhhh..\X0\` (UTF-16), `\X4\hhhhhhhh..\X0\`
/// (UTF-32), `\X\hh` (ISO 8859-1) and `\S\c` (upper half of ISO 8859-1).
/// Malformed escapes are kept verbatim.
pub fn unescape_string(raw: &str) -> String {
    if !raw.contains('\'') && !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if c == '\'' && rest.starts_with("''") {
            out.push('\'');
            rest = &rest[2..];
        } else if c == '\\' {
            if let Some((decoded, consumed)) = decode_escape(rest) {
                out.push_str(&decoded);
                rest = &rest[consumed..];
            } else {
                out.push('\\');
                rest = &rest[1..];
            }
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    out
}

/// Decode one escape sequence at the start of `s` (which begins with `\`)
fn decode_escape(s: &str) -> Option<(String, usize)> {
    if s.starts_with("\\\\") {
        return Some(("\\".to_string(), 2));
    }
    if let Some(body) = s.strip_prefix("\\X2\\") {
        let end = body.find("\\X0\\")?;
        let units = hex_chunks(&body[..end], 4)?
            .into_iter()
            .map(|v| v as u16)
            .collect::<Vec<_>>();
        let decoded = String::from_utf16(&units).ok()?;
        return Some((decoded, 4 + end + 4));
    }
    if let Some(body) = s.strip_prefix("\\X4\\") {
        let end = body.find("\\X0\\")?;
        let decoded = hex_chunks(&body[..end], 8)?
            .into_iter()
            .map(char::from_u32)
            .collect::<Option<String>>()?;
        return Some((decoded, 4 + end + 4));
    }
    if let Some(body) = s.strip_prefix("\\X\\") {
        let hex = body.get(..2)?;
        let code = u32::from_str_radix(hex, 16).ok()?;
        return Some((char::from_u32(code)?.to_string(), 5));
    }
    if let Some(body) = s.strip_prefix("\\S\\") {
        let c = body.chars().next().filter(|c| c.is_ascii())?;
        let code = c as u32 + 0x80;
        return Some((char::from_u32(code)?.to_string(), 4));
    }
    None
}

fn hex_chunks(hex: &str, width: usize) -> Option<Vec<u32>> {
    if hex.is_empty() || hex.len() % width != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(width)
        .map(|i| u32::from_str_radix(&hex[i..i + width], 16).ok())
        .collect()
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Parse whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Hard failure for a value that matched the grammar but does not fit its type
///
/// `Failure` stops `alt` from trying the remaining alternatives.
fn out_of_range(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::TooLarge))
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token> {
    let (rest, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(rest)?;
    let id = digits.parse::<u32>().map_err(|_| out_of_range(input))?;
    Ok((rest, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('\'')(input)?;

    // Find the closing quote, skipping doubled quotes
    let bytes = input.as_bytes();
    let mut end = 0;
    loop {
        if end >= bytes.len() {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Char,
            )));
        }
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }

    Ok((&input[end + 1..], Token::String(&input[..end])))
}

/// Parse a number (integer or float)
fn number(input: &str) -> IResult<&str, Token> {
    let start = input;
    let (input, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    // Use lexical-core for fast parsing
    if num_str.contains(['.', 'e', 'E']) {
        let f: f64 = lexical_core::parse(num_str.as_bytes()).map_err(|_| out_of_range(start))?;
        Ok((input, Token::Float(f)))
    } else {
        let digits = num_str.strip_prefix('+').unwrap_or(num_str);
        let i: i64 = lexical_core::parse(digits.as_bytes()).map_err(|_| out_of_range(start))?;
        Ok((input, Token::Integer(i)))
    }
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Token::Enum(name)))
}

/// Parse null ($)
fn null_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

/// Parse derived (*)
fn derived_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parse a parenthesised, comma separated token list
fn parenthesized(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

/// Parse a list of tokens
fn list(input: &str) -> IResult<&str, Token> {
    let (input, items) = parenthesized(input)?;
    Ok((input, Token::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = parenthesized(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity definition
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<Entity, String> {
    // Skip leading whitespace
    let input = input.trim_start();

    // Parse entity ID
    let (input, _) = char::<&str, nom::error::Error<&str>>('#')
        .parse(input)
        .map_err(|_| "Expected # at start of entity")?;

    let (input, id_str) = take_while1::<_, &str, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_digit()
    })
    .parse(input)
    .map_err(|_| "Expected entity ID")?;

    let id: u32 = id_str
        .parse()
        .map_err(|_| format!("Entity ID #{id_str} out of range"))?;

    // Skip =
    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| "Expected = after entity ID")?;

    // Type name and attributes share the typed-value grammar
    let (input, parsed) = typed_value(input).map_err(|e| format!("Failed to parse attributes: {e:?}"))?;
    let (type_name, tokens) = match parsed {
        Token::TypedValue(name, args) => (name, args),
        _ => return Err("Expected type name".to_string()),
    };

    let rest = input.trim_start();
    if !rest.is_empty() && !rest.starts_with(';') {
        return Err(format!("Unexpected content after attributes: {rest:.20}"));
    }

    Ok(Entity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(|t| t.to_attribute_value()).collect(),
    })
}

/// Parse entity from content at given byte range
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<Entity, String> {
    let slice = content
        .get(start..end)
        .ok_or_else(|| format!("Invalid byte range {start}..{end}"))?;
    parse_entity(slice)
}

/// Parse a header statement such as `FILE_SCHEMA(('IFC4'))`
///
/// Returns the upper-case keyword and its decoded arguments.
pub fn parse_header_statement(input: &str) -> Result<(String, Vec<AttributeValue>), String> {
    let input = input.trim();
    let input = input.strip_suffix(';').unwrap_or(input).trim_end();
    match typed_value(input) {
        Ok((rest, Token::TypedValue(name, args))) if rest.trim().is_empty() => Ok((
            name.to_ascii_uppercase(),
            args.iter().map(|t| t.to_attribute_value()).collect(),
        )),
        Ok((rest, _)) => Err(format!("Unexpected content in header statement: {rest:.20}")),
        Err(e) => Err(format!("Failed to parse header statement: {e:?}")),
    }
}

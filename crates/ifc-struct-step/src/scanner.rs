// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Locates the sections of a STEP file and the byte ranges of entity
//! instances in the DATA section without full parsing.

use memchr::{memchr, memmem};

/// Byte range of the HEADER section body, if present
fn header_range(content: &str) -> Option<(usize, usize)> {
    let start = memmem::find(content.as_bytes(), b"HEADER;")? + "HEADER;".len();
    let len = find_statement_keyword(&content[start..], "ENDSEC;")?;
    Some((start, start + len))
}

/// Body of the HEADER section, if present
pub fn header_section(content: &str) -> Option<&str> {
    header_range(content).map(|(start, end)| &content[start..end])
}

/// Offset just past the `DATA;` keyword, if present
pub fn data_section_start(content: &str) -> Option<usize> {
    let header_end = header_range(content).map(|(_, end)| end).unwrap_or(0);
    find_statement_keyword(&content[header_end..], "DATA;").map(|p| header_end + p + "DATA;".len())
}

/// Find `keyword` outside of quoted strings
fn find_statement_keyword(content: &str, keyword: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut in_string = false;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' => in_string = !in_string,
            _ if !in_string && bytes[pos..].starts_with(keyword.as_bytes()) => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Split a section body into `;`-terminated statements, honouring quotes
pub fn split_statements(section: &str) -> Vec<&str> {
    let bytes = section.as_bytes();
    let mut statements = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (pos, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_string = !in_string,
            b';' if !in_string => {
                let stmt = section[start..pos].trim();
                if !stmt.is_empty() {
                    statements.push(stmt);
                }
                start = pos + 1;
            }
            _ => {}
        }
    }
    statements
}

/// Fast entity scanner for STEP files
///
/// Uses memchr for SIMD-accelerated scanning to quickly find entity
/// boundaries without full parsing.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner positioned at the start of the DATA section
    pub fn new(content: &'a str) -> Self {
        let pos = data_section_start(content).unwrap_or(0);
        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Instance definitions start a statement; references sit inside one
            if !self.at_statement_start() {
                self.pos += 1;
                continue;
            }

            let start = self.pos;

            self.pos += 1; // Skip #
            let id_start = self.pos;

            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }

            if self.pos == id_start {
                continue;
            }

            // An id too large for u32 is still an instance; reported as #0 so
            // that parsing the statement rejects it instead of dropping it
            let id = self.content[id_start..self.pos].parse::<u32>().unwrap_or(0);

            self.skip_blanks();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1; // Skip =
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }

            if self.pos == type_start {
                continue;
            }

            let type_name = &self.content[type_start..self.pos];
            let end = self.find_entity_end()?;

            return Some((id, type_name, start, end));
        }

        None
    }

    /// True when only blanks separate the cursor from a line or statement start
    fn at_statement_start(&self) -> bool {
        let before = &self.content.as_bytes()[..self.pos];
        match before
            .iter()
            .rev()
            .find(|b| !matches!(b, b' ' | b'\t'))
        {
            None => true,
            Some(b) => matches!(b, b'\n' | b'\r' | b';'),
        }
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\r' | b'\n') {
            self.pos += 1;
        }
    }

    /// Find the end of an entity (semicolon), handling quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    // Check for escaped quote ''
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = (u32, &'a str, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [StructuralAnalysisView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project; with ''semicolon''',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
  #3 = IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCBEAM('guid',$,'Beam 1',$,$,#5,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let entities: Vec<_> = EntityScanner::new(TEST_IFC)
            .map(|(id, type_name, _, _)| (id, type_name.to_string()))
            .collect();

        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[2], (3, "IFCSIUNIT".to_string()));
        assert_eq!(entities[3], (4, "IFCBEAM".to_string()));
    }

    #[test]
    fn test_entity_end_skips_quoted_semicolon() {
        let (id, _, start, end) = EntityScanner::new(TEST_IFC).next().unwrap();
        assert_eq!(id, 1);
        assert!(TEST_IFC[start..end].ends_with("#2);"));
    }

    #[test]
    fn test_oversized_id_is_not_skipped() {
        let content = TEST_IFC.replace("#4=IFCBEAM", "#4294967297=IFCBEAM");
        let ids: Vec<u32> = EntityScanner::new(&content).map(|(id, ..)| id).collect();
        assert_eq!(ids, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_sections() {
        let header = header_section(TEST_IFC).unwrap();
        let statements = split_statements(header);
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("FILE_DESCRIPTION"));
        assert!(statements[0].ends_with("'2;1')"));
        assert!(data_section_start(TEST_IFC).is_some());
        assert!(data_section_start("#1=IFCPROJECT();").is_none());
    }
}

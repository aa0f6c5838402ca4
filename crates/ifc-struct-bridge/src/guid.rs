// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC GlobalId generation
//!
//! A GlobalId is a 128-bit UUID written as 22 characters of the IFC base64
//! alphabet: one character for the top 2 bits, then 21 characters of 6 bits.

use uuid::Uuid;

const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Namespace for name-based GlobalIds
const NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_3a5e_9d2b_4c47_8e0a_51b7_2f94_d803);

/// Deterministic GlobalId for a project
///
/// The same `(scope, id)` always gives the same GlobalId, so exporting a
/// model twice yields identical files.
pub fn global_id(scope: &str, id: &str) -> String {
    name_based(&format!("{scope}:{id}"))
}

/// Deterministic GlobalId for an object inside a project
///
/// `project` is the project's own GlobalId. Objects with equal ids in two
/// different projects get different GlobalIds, so merged files do not
/// collide.
pub fn global_id_in(project: &str, scope: &str, id: &str) -> String {
    name_based(&format!("{project}/{scope}:{id}"))
}

fn name_based(name: &str) -> String {
    compress(Uuid::new_v5(&NAMESPACE, name.as_bytes()).as_u128())
}

/// Compress a 128-bit value into the 22-character IFC form
pub fn compress(value: u128) -> String {
    let mut out = String::with_capacity(22);
    out.push(ALPHABET[(value >> 126) as usize] as char);
    for i in (0..21).rev() {
        let digit = (value >> (i * 6)) & 0x3f;
        out.push(ALPHABET[digit as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_known_values() {
        assert_eq!(compress(0), "0000000000000000000000");
        assert_eq!(compress(u128::MAX), "3$$$$$$$$$$$$$$$$$$$$$");
    }

    #[test]
    fn test_compress_uses_ifc_alphabet() {
        for value in [1u128, 0xdead_beef, 1 << 127] {
            let id = compress(value);
            assert_eq!(id.len(), 22);
            assert!(matches!(id.as_bytes()[0], b'0'..=b'3'));
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
        }
        assert_eq!(compress(1), "0000000000000000000001");
        assert_eq!(compress(64), "0000000000000000000010");
    }

    #[test]
    fn test_global_id_is_deterministic() {
        let a = global_id("node", "n1");
        assert_eq!(a.len(), 22);
        assert_eq!(a, global_id("node", "n1"));
        assert_ne!(a, global_id("node", "n2"));
        assert_ne!(a, global_id("element", "n1"));
    }

    #[test]
    fn test_ids_are_scoped_by_project() {
        let frame = global_id("project", "Frame");
        let hall = global_id("project", "Hall");
        let node = global_id_in(&frame, "node", "n1");
        assert_eq!(node.len(), 22);
        assert_eq!(node, global_id_in(&frame, "node", "n1"));
        assert_ne!(node, global_id_in(&hall, "node", "n1"));
        assert_ne!(global_id_in(&frame, "rel", "17"), global_id_in(&hall, "rel", "17"));
    }
}

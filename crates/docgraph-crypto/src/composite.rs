//! 64-bit composite keys over two or three identifiers.
//!
//! A key is the first eight bytes (big-endian) of the index-domain digest of
//! the parts' readable forms joined by `.`. Edge names may not contain `.` or
//! start with a digit, so the joined string is unambiguous for every
//! combination of node ids and edge names.
//!
//! Only equality matters to callers: two different part lists may collide,
//! and stores must confirm the full record on lookup.

use std::fmt;

use docgraph_types::Checksum256;

use crate::hasher::ContentHasher;

/// Separator between the readable forms of key parts.
pub const KEY_SEPARATOR: char = '.';

/// One component of a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart<'a> {
    /// A node id, rendered in decimal.
    Id(u64),
    /// A content hash, rendered in lowercase hex.
    Hash(&'a Checksum256),
    /// An edge name, rendered verbatim.
    Name(&'a str),
}

impl fmt::Display for KeyPart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Hash(sum) => write!(f, "{}", sum.to_hex()),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Derive a composite key from `parts`.
pub fn composite_key(parts: &[KeyPart<'_>]) -> u64 {
    let readable = parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string());
    let digest = ContentHasher::INDEX.hash(readable.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_be_bytes(head)
}

/// Key of the edge `(from, to, name)`; doubles as the edge's primary key.
pub fn edge_key(from: u64, to: u64, name: &str) -> u64 {
    composite_key(&[KeyPart::Id(from), KeyPart::Id(to), KeyPart::Name(name)])
}

/// Key for "edges leaving `from` named `name`".
pub fn from_name_key(from: u64, name: &str) -> u64 {
    composite_key(&[KeyPart::Id(from), KeyPart::Name(name)])
}

/// Key for "edges from `from` to `to`".
pub fn from_to_key(from: u64, to: u64) -> u64 {
    composite_key(&[KeyPart::Id(from), KeyPart::Id(to)])
}

/// Key for "edges arriving at `to` named `name`".
pub fn to_name_key(to: u64, name: &str) -> u64 {
    composite_key(&[KeyPart::Id(to), KeyPart::Name(name)])
}

//! Hashing primitives for docgraph.
//!
//! Provides the canonical textual form of content groups, domain-separated
//! BLAKE3 fingerprints over that form, and the 64-bit composite keys used to
//! index edges.
//!
//! The digest is BLAKE3 throughout; nothing here is custom cryptography.

pub mod canonical;
pub mod composite;
pub mod hasher;

pub use canonical::{canonical_group, canonical_groups};
pub use composite::{
    composite_key, edge_key, from_name_key, from_to_key, to_name_key, KeyPart, KEY_SEPARATOR,
};
pub use hasher::{fingerprint, ContentHasher};

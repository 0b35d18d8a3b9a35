use docgraph_types::{Checksum256, ContentGroup};

use crate::canonical::canonical_groups;

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to every input, so a document fingerprint and
/// an index key derived from identical bytes never coincide.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document content fingerprints.
    pub const DOCUMENT: Self = Self {
        domain: "docgraph-document-v1",
    };
    /// Hasher for composite index keys.
    pub const INDEX: Self = Self {
        domain: "docgraph-index-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Checksum256 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Checksum256::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn verify(&self, data: &[u8], expected: &Checksum256) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Content fingerprint of a set of groups.
///
/// Two documents with structurally equal groups (same order, labels, and
/// values) always share a fingerprint.
pub fn fingerprint(groups: &[ContentGroup]) -> Checksum256 {
    ContentHasher::DOCUMENT.hash(canonical_groups(groups).as_bytes())
}

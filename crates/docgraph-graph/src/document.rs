use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docgraph_crypto::fingerprint;
use docgraph_store::{IndexKey, IndexSpec, Record, StoreError, Table};
use docgraph_types::{
    rollup_content, rollup_group, AccountName, Checksum256, Content, ContentGroup, ContentGroups,
    ContentWrapper, FlexValue, Timestamp,
};

use crate::auth::Authorizer;
use crate::clock::Clock;
use crate::error::{GraphError, GraphResult};
use crate::merge::merge_groups;

/// An attestation attached to a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub certifier: AccountName,
    pub notes: String,
    pub certified_at: Timestamp,
}

/// A graph node: a set of content groups identified by their fingerprint.
///
/// `hash` always equals [`fingerprint`] of `content_groups` for a document
/// obtained from [`Documents`] or [`Document::merge`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub hash: Checksum256,
    pub creator: AccountName,
    pub content_groups: ContentGroups,
    pub certificates: Vec<Certificate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Read access to the content groups.
    pub fn content(&self) -> ContentWrapper<&ContentGroups> {
        ContentWrapper::new(&self.content_groups)
    }

    /// Apply `delta` to a copy of `original`.
    ///
    /// The result keeps the original's id, creator, and certificates, with its
    /// hash recomputed. Nothing is persisted; pass the merged groups to
    /// [`Documents::update`] to store them.
    pub fn merge(original: &Document, delta: &[ContentGroup]) -> GraphResult<Document> {
        let content_groups = merge_groups(&original.content_groups, delta)?;
        Ok(Document {
            hash: fingerprint(&content_groups),
            content_groups,
            ..original.clone()
        })
    }

    pub fn is_certified(&self) -> bool {
        !self.certificates.is_empty()
    }

    /// `true` when `hash` matches the current content.
    pub fn verify_hash(&self) -> bool {
        fingerprint(&self.content_groups) == self.hash
    }
}

impl Record for Document {
    const TABLE: &'static str = "documents";
    const INDEXES: &'static [IndexSpec] =
        &[IndexSpec::unique("hash"), IndexSpec::non_unique("creator")];

    fn primary_key(&self) -> u64 {
        self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, IndexKey)> {
        vec![
            ("hash", IndexKey::Hash(self.hash)),
            ("creator", IndexKey::Account(self.creator.clone())),
        ]
    }
}

/// Document lifecycle over a document table.
///
/// Every write checks authority first and leaves the table untouched on
/// failure.
pub struct Documents {
    table: Arc<dyn Table<Document>>,
    clock: Arc<dyn Clock>,
    auth: Arc<dyn Authorizer>,
}

impl Documents {
    pub fn new(
        table: Arc<dyn Table<Document>>,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
    ) -> Self {
        Self { table, clock, auth }
    }

    // -- Creation ------------------------------------------------------------

    /// Persist a new document. Fails if a document with the same content
    /// already exists in `scope`.
    pub fn create(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        groups: ContentGroups,
    ) -> GraphResult<Document> {
        self.auth.require_auth(creator)?;
        let hash = fingerprint(&groups);
        if let Some(existing) = self.find_by_hash(scope, &hash)? {
            return Err(GraphError::DocumentExists {
                hash,
                existing: existing.id,
            });
        }

        let now = self.clock.now();
        let build = |id: u64| Document {
            id,
            hash,
            creator: creator.clone(),
            content_groups: groups.clone(),
            certificates: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let document = self
            .table
            .insert_with(scope, &build)
            .map_err(|e| self.hash_conflict(scope, &hash, e))?;

        debug!(
            scope = %scope,
            id = document.id,
            hash = %hash.short_hex(),
            creator = %creator,
            "document created"
        );
        Ok(document)
    }

    /// Return the document holding exactly `groups`, creating it if needed.
    ///
    /// An existing document is returned unchanged and without an authority
    /// check.
    pub fn get_or_new(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        groups: ContentGroups,
    ) -> GraphResult<Document> {
        let hash = fingerprint(&groups);
        if let Some(existing) = self.find_by_hash(scope, &hash)? {
            return Ok(existing);
        }
        match self.create(scope, creator, groups) {
            // Lost a race with a concurrent creator of the same content.
            Err(GraphError::DocumentExists { .. }) => self.fetch_by_hash(scope, &hash),
            other => other,
        }
    }

    /// Create from a single group.
    pub fn create_from_group(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        group: ContentGroup,
    ) -> GraphResult<Document> {
        self.create(scope, creator, rollup_group(group))
    }

    /// Create from a single labeled value.
    pub fn create_from_value(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        label: &str,
        value: FlexValue,
    ) -> GraphResult<Document> {
        self.create(scope, creator, rollup_content(Content::new(label, value)))
    }

    pub fn get_or_new_from_group(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        group: ContentGroup,
    ) -> GraphResult<Document> {
        self.get_or_new(scope, creator, rollup_group(group))
    }

    pub fn get_or_new_from_content(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        content: Content,
    ) -> GraphResult<Document> {
        self.get_or_new(scope, creator, rollup_content(content))
    }

    // -- Lookup --------------------------------------------------------------

    pub fn fetch(&self, scope: &AccountName, id: u64) -> GraphResult<Document> {
        self.table
            .get(scope, id)?
            .ok_or_else(|| GraphError::DocumentNotFound {
                scope: scope.clone(),
                id,
            })
    }

    pub fn find_by_hash(
        &self,
        scope: &AccountName,
        hash: &Checksum256,
    ) -> GraphResult<Option<Document>> {
        Ok(self.table.find_one(scope, "hash", &IndexKey::Hash(*hash))?)
    }

    pub fn fetch_by_hash(&self, scope: &AccountName, hash: &Checksum256) -> GraphResult<Document> {
        self.find_by_hash(scope, hash)?
            .ok_or_else(|| GraphError::DocumentHashNotFound {
                scope: scope.clone(),
                hash: *hash,
            })
    }

    pub fn exists(&self, scope: &AccountName, id: u64) -> GraphResult<bool> {
        Ok(self.table.contains(scope, id)?)
    }

    pub fn exists_by_hash(&self, scope: &AccountName, hash: &Checksum256) -> GraphResult<bool> {
        Ok(self.find_by_hash(scope, hash)?.is_some())
    }

    /// Every document `creator` created in `scope`, in id order.
    pub fn find_by_creator(
        &self,
        scope: &AccountName,
        creator: &AccountName,
    ) -> GraphResult<Vec<Document>> {
        Ok(self
            .table
            .find(scope, "creator", &IndexKey::Account(creator.clone()))?)
    }

    pub fn count(&self, scope: &AccountName) -> GraphResult<usize> {
        Ok(self.table.len(scope)?)
    }

    // -- Mutation ------------------------------------------------------------

    /// Replace a document's content wholesale.
    ///
    /// The new hash may equal the document's own current hash (a no-op
    /// rewrite), but not that of any other document.
    pub fn update(
        &self,
        scope: &AccountName,
        id: u64,
        updater: &AccountName,
        groups: ContentGroups,
    ) -> GraphResult<Document> {
        self.auth.require_auth(updater)?;
        let mut document = self
            .table
            .get(scope, id)?
            .ok_or_else(|| GraphError::UpdateTargetMissing {
                scope: scope.clone(),
                id,
            })?;

        let hash = fingerprint(&groups);
        if let Some(other) = self.find_by_hash(scope, &hash)? {
            if other.id != id {
                return Err(GraphError::DocumentExists {
                    hash,
                    existing: other.id,
                });
            }
        }

        let previous = document.hash;
        document.hash = hash;
        document.content_groups = groups;
        document.updated_at = self.clock.now();
        self.table
            .update(scope, &document)
            .map_err(|e| self.hash_conflict(scope, &hash, e))?;

        debug!(
            scope = %scope,
            id,
            from = %previous.short_hex(),
            to = %hash.short_hex(),
            updater = %updater,
            "document updated"
        );
        Ok(document)
    }

    /// Merge `delta` into the stored document and persist the result.
    pub fn merge_update(
        &self,
        scope: &AccountName,
        id: u64,
        updater: &AccountName,
        delta: &[ContentGroup],
    ) -> GraphResult<Document> {
        let original = self
            .table
            .get(scope, id)?
            .ok_or_else(|| GraphError::UpdateTargetMissing {
                scope: scope.clone(),
                id,
            })?;
        let merged = Document::merge(&original, delta)?;
        self.update(scope, id, updater, merged.content_groups)
    }

    /// Append a certificate. Certificates do not affect the hash.
    pub fn certify(
        &self,
        scope: &AccountName,
        id: u64,
        certifier: &AccountName,
        notes: impl Into<String>,
    ) -> GraphResult<Document> {
        self.auth.require_auth(certifier)?;
        let mut document = self.fetch(scope, id)?;
        let now = self.clock.now();
        document.certificates.push(Certificate {
            certifier: certifier.clone(),
            notes: notes.into(),
            certified_at: now,
        });
        document.updated_at = now;
        self.table.update(scope, &document)?;
        info!(scope = %scope, id, certifier = %certifier, "document certified");
        Ok(document)
    }

    /// Delete a document. Edges are not touched; see
    /// [`DocumentGraph::erase_document`](crate::DocumentGraph::erase_document).
    pub fn erase(&self, scope: &AccountName, id: u64) -> GraphResult<Document> {
        let document = self.table.delete(scope, id).map_err(|e| match e {
            StoreError::NotFound { .. } => GraphError::DocumentNotFound {
                scope: scope.clone(),
                id,
            },
            other => GraphError::Store(other),
        })?;
        debug!(scope = %scope, id, hash = %document.hash.short_hex(), "document erased");
        Ok(document)
    }

    /// Translate a unique-index violation on the hash into `DocumentExists`.
    fn hash_conflict(
        &self,
        scope: &AccountName,
        hash: &Checksum256,
        err: StoreError,
    ) -> GraphError {
        match err {
            StoreError::UniqueViolation { index: "hash", existing, .. } => {
                debug!(
                    scope = %scope,
                    hash = %hash.short_hex(),
                    existing,
                    "hash taken concurrently"
                );
                GraphError::DocumentExists {
                    hash: *hash,
                    existing,
                }
            }
            other => GraphError::Store(other),
        }
    }
}

impl std::fmt::Debug for Documents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Documents").finish_non_exhaustive()
    }
}

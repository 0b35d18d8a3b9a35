//! Error types for document and edge operations.

use docgraph_store::StoreError;
use docgraph_types::{AccountName, Checksum256, ContentError};

/// Coarse classification of a [`GraphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A point lookup found nothing.
    NotFound,
    /// A create collided with an existing document or edge.
    AlreadyExists,
    /// A typed accessor hit a value of another kind.
    TypeMismatch,
    /// An edge name failed validation.
    InvalidLabel,
    /// An update target is missing, or a strict query matched nothing.
    PreconditionFailed,
    /// The caller does not hold credentials for the acting account.
    Unauthorized,
    /// The underlying table failed.
    Storage,
}

/// Errors that can occur during document and edge operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("document {id} not found in scope {scope}")]
    DocumentNotFound { scope: AccountName, id: u64 },

    #[error("no document with hash {hash} in scope {scope}")]
    DocumentHashNotFound {
        scope: AccountName,
        hash: Checksum256,
    },

    /// Content hash already held by another document.
    #[error("document exists already: {hash} (id {existing})")]
    DocumentExists { hash: Checksum256, existing: u64 },

    /// An update was aimed at a document that does not exist.
    #[error("update target {id} does not exist in scope {scope}")]
    UpdateTargetMissing { scope: AccountName, id: u64 },

    #[error("edge {from} -[{name}]-> {to} not found")]
    EdgeNotFound { from: u64, to: u64, name: String },

    #[error("edge {from} -[{name}]-> {to} already exists")]
    EdgeExists { from: u64, to: u64, name: String },

    /// Two different triples derived the same edge id.
    #[error("edge id {id} is already held by {held_by}")]
    EdgeKeyCollision { id: u64, held_by: String },

    #[error("invalid edge name {name:?}: {reason}")]
    InvalidEdgeName { name: String, reason: String },

    /// A strict query or removal matched no edges.
    #[error("no edges {query}")]
    NoEdges { query: String },

    /// A single-edge lookup matched more than one edge.
    #[error("expected exactly one edge {query}, found {count}")]
    AmbiguousEdge { query: String, count: usize },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("missing authority of {account}")]
    Unauthorized { account: AccountName },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DocumentNotFound { .. }
            | Self::DocumentHashNotFound { .. }
            | Self::EdgeNotFound { .. } => ErrorKind::NotFound,
            Self::DocumentExists { .. }
            | Self::EdgeExists { .. }
            | Self::EdgeKeyCollision { .. } => ErrorKind::AlreadyExists,
            Self::InvalidEdgeName { .. } => ErrorKind::InvalidLabel,
            Self::UpdateTargetMissing { .. }
            | Self::NoEdges { .. }
            | Self::AmbiguousEdge { .. } => ErrorKind::PreconditionFailed,
            Self::Content(e) if e.is_type_mismatch() => ErrorKind::TypeMismatch,
            Self::Content(_) => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Store(_) | Self::Config(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;

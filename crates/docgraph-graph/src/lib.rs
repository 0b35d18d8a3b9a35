//! Documents, edges, and graph maintenance for docgraph.
//!
//! A [`Document`] is a set of content groups stored under a storage-assigned
//! id and deduplicated by its content fingerprint. An [`Edge`] is a directed,
//! named link between two document ids, indexed for lookup from either end.
//! [`DocumentGraph`] ties the two together for operations that must keep
//! them consistent: cascading edge removal, document erasure, and node
//! replacement.
//!
//! # Key Types
//!
//! - [`Documents`]: document lifecycle over a [`docgraph_store::Table`]
//! - [`Edges`]: edge lifecycle and composite-index queries
//! - [`DocumentGraph`]: operations spanning both
//! - [`merge_groups`]: label-keyed delta merge
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use docgraph_graph::{AllowAll, DocumentGraph, GraphConfig, SystemClock};
//! use docgraph_types::{labeled_group, AccountName, Content};
//!
//! let graph = DocumentGraph::in_memory(
//!     Arc::new(SystemClock::new()),
//!     Arc::new(AllowAll),
//!     GraphConfig::default(),
//! );
//! let scope = AccountName::new("dao").unwrap();
//! let alice = AccountName::new("alice").unwrap();
//!
//! let role = graph
//!     .documents()
//!     .create(&scope, &alice, vec![labeled_group("details", [Content::new("title", "Steward")])])
//!     .unwrap();
//! let member = graph
//!     .documents()
//!     .get_or_new(&scope, &alice, vec![labeled_group("details", [Content::new("name", "alice")])])
//!     .unwrap();
//!
//! graph.create_edge(&scope, &alice, member.id, role.id, "holds").unwrap();
//! assert!(graph.has_edges(&scope, role.id).unwrap());
//!
//! graph.erase_document(&scope, member.id, true).unwrap();
//! assert!(!graph.has_edges(&scope, role.id).unwrap());
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod merge;
pub mod names;

pub use auth::{AllowAll, Allowlist, Authorizer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GraphConfig;
pub use document::{Certificate, Document, Documents};
pub use edge::{Edge, Edges};
pub use error::{ErrorKind, GraphError, GraphResult};
pub use graph::DocumentGraph;
pub use merge::merge_groups;
pub use names::validate_edge_name;

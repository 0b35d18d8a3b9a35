use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};

use tracing::{debug, info, warn};

use docgraph_store::{InMemoryTable, StoreError, Table};
use docgraph_types::AccountName;

use crate::auth::Authorizer;
use crate::clock::Clock;
use crate::config::GraphConfig;
use crate::document::{Document, Documents};
use crate::edge::{Edge, Edges};
use crate::error::{GraphError, GraphResult};

/// One writer at a time per scope.
///
/// Held for the duration of every multi-record graph operation, so a cascade
/// or rewiring never interleaves with another mutation of the same scope.
#[derive(Default)]
struct ScopeLocks {
    held: Mutex<HashSet<AccountName>>,
    released: Condvar,
}

impl ScopeLocks {
    fn acquire(&self, scope: &AccountName) -> GraphResult<ScopeGuard<'_>> {
        let mut held = self.held.lock().map_err(|_| StoreError::LockPoisoned)?;
        while held.contains(scope) {
            held = self.released.wait(held).map_err(|_| StoreError::LockPoisoned)?;
        }
        held.insert(scope.clone());
        Ok(ScopeGuard {
            locks: self,
            scope: scope.clone(),
        })
    }
}

struct ScopeGuard<'a> {
    locks: &'a ScopeLocks,
    scope: AccountName,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.scope);
        self.locks.released.notify_all();
    }
}

/// Documents and the edges between them, maintained together.
///
/// Single-record operations can go straight to [`documents`](Self::documents)
/// and [`edges`](Self::edges). Operations here touch several records and run
/// under a per-scope lock; each validates everything it can before its first
/// write.
pub struct DocumentGraph {
    documents: Documents,
    edges: Edges,
    config: GraphConfig,
    locks: ScopeLocks,
}

impl DocumentGraph {
    pub fn new(
        document_table: Arc<dyn Table<Document>>,
        edge_table: Arc<dyn Table<Edge>>,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
        config: GraphConfig,
    ) -> Self {
        Self {
            documents: Documents::new(document_table, clock.clone(), auth.clone()),
            edges: Edges::new(edge_table, clock, auth),
            config,
            locks: ScopeLocks::default(),
        }
    }

    /// A graph over fresh in-memory tables.
    pub fn in_memory(
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
        config: GraphConfig,
    ) -> Self {
        Self::new(
            Arc::new(InMemoryTable::<Document>::new()),
            Arc::new(InMemoryTable::<Edge>::new()),
            clock,
            auth,
            config,
        )
    }

    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    pub fn edges(&self) -> &Edges {
        &self.edges
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn require_document(&self, scope: &AccountName, id: u64) -> GraphResult<()> {
        if self.documents.exists(scope, id)? {
            Ok(())
        } else {
            Err(GraphError::DocumentNotFound {
                scope: scope.clone(),
                id,
            })
        }
    }

    // -- Edge creation -------------------------------------------------------

    /// Create `from -[name]-> to`, checking both endpoints exist when
    /// `verify_edge_endpoints` is set.
    pub fn create_edge(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        from: u64,
        to: u64,
        name: &str,
    ) -> GraphResult<Edge> {
        let _guard = self.locks.acquire(scope)?;
        if self.config.verify_edge_endpoints {
            self.require_document(scope, from)?;
            self.require_document(scope, to)?;
        }
        self.edges.create(scope, creator, from, to, name)
    }

    /// Like [`create_edge`](Self::create_edge), but returns an existing edge
    /// unchanged.
    pub fn get_or_new_edge(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        from: u64,
        to: u64,
        name: &str,
    ) -> GraphResult<Edge> {
        let _guard = self.locks.acquire(scope)?;
        if let Some(existing) = self.edges.find(scope, from, to, name)? {
            return Ok(existing);
        }
        if self.config.verify_edge_endpoints {
            self.require_document(scope, from)?;
            self.require_document(scope, to)?;
        }
        self.edges.create(scope, creator, from, to, name)
    }

    // -- Maintenance ---------------------------------------------------------

    /// `true` when any edge starts or ends at `node`.
    pub fn has_edges(&self, scope: &AccountName, node: u64) -> GraphResult<bool> {
        self.edges.any_touching(scope, node)
    }

    /// Delete every edge with `node` at either end, returning how many.
    ///
    /// Finding none is an error only under `strict_edge_cleanup`.
    pub fn remove_edges(&self, scope: &AccountName, node: u64) -> GraphResult<usize> {
        let _guard = self.locks.acquire(scope)?;
        self.remove_edges_locked(scope, node)
    }

    fn remove_edges_locked(&self, scope: &AccountName, node: u64) -> GraphResult<usize> {
        let edges = self.edges.touching(scope, node)?;
        if edges.is_empty() {
            if self.config.strict_edge_cleanup {
                return Err(GraphError::NoEdges {
                    query: format!("touching {node}"),
                });
            }
            warn!(scope = %scope, node, "no edges to remove");
            return Ok(0);
        }
        let removed = self.edges.delete_all(scope, &edges)?;
        info!(scope = %scope, node, removed, "removed edges");
        Ok(removed)
    }

    /// Delete a document, and first every edge touching it when
    /// `include_edges` is set.
    pub fn erase_document(
        &self,
        scope: &AccountName,
        id: u64,
        include_edges: bool,
    ) -> GraphResult<Document> {
        let _guard = self.locks.acquire(scope)?;
        self.require_document(scope, id)?;
        if include_edges {
            let edges = self.edges.touching(scope, id)?;
            let removed = self.edges.delete_all(scope, &edges)?;
            debug!(scope = %scope, id, removed, "cascaded edge removal");
        }
        let document = self.documents.erase(scope, id)?;
        info!(scope = %scope, id, include_edges, "document erased");
        Ok(document)
    }

    /// Point every edge touching `old` at `new` instead, keeping direction,
    /// name, creator, and creation time. Returns how many edges moved.
    ///
    /// Fails without changing anything if a rewired edge would duplicate an
    /// existing one, or (when `verify_edge_endpoints` is set) if `new` is not
    /// a document.
    pub fn replace_node(&self, scope: &AccountName, old: u64, new: u64) -> GraphResult<usize> {
        let _guard = self.locks.acquire(scope)?;
        if old == new {
            return Ok(0);
        }
        if self.config.verify_edge_endpoints {
            self.require_document(scope, new)?;
        }

        let swap = |node: u64| if node == old { new } else { node };
        let current = self.edges.touching(scope, old)?;
        let mut rewired = Vec::with_capacity(current.len());
        let mut seen = HashSet::new();
        for edge in &current {
            let moved = Edge::new(
                swap(edge.from_node),
                swap(edge.to_node),
                &edge.edge_name,
                edge.creator.clone(),
                edge.created_at,
            )?;
            // Rewired triples never mention `old`, so a match here is a
            // genuine duplicate rather than one of the edges about to leave.
            let duplicate = !seen.insert(moved.id)
                || self
                    .edges
                    .find(scope, moved.from_node, moved.to_node, &moved.edge_name)?
                    .is_some();
            if duplicate {
                return Err(GraphError::EdgeExists {
                    from: moved.from_node,
                    to: moved.to_node,
                    name: moved.edge_name,
                });
            }
            if let Some(held) = self.edges.get_by_id(scope, moved.id)? {
                if !current.iter().any(|e| e.id == held.id) {
                    return Err(GraphError::EdgeKeyCollision {
                        id: moved.id,
                        held_by: held.describe(),
                    });
                }
            }
            rewired.push(moved);
        }

        self.edges.delete_all(scope, &current)?;
        for edge in rewired {
            self.edges.insert(scope, edge)?;
        }
        info!(scope = %scope, old, new, moved = current.len(), "node replaced");
        Ok(current.len())
    }
}

impl std::fmt::Debug for DocumentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentGraph")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAll;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;
    use docgraph_types::{labeled_group, Content, Timestamp};

    fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    fn scope() -> AccountName {
        name("dao")
    }

    fn alice() -> AccountName {
        name("alice")
    }

    fn graph_with(config: GraphConfig) -> DocumentGraph {
        DocumentGraph::in_memory(
            Arc::new(ManualClock::new(Timestamp::from_secs(100))),
            Arc::new(AllowAll),
            config,
        )
    }

    fn graph() -> DocumentGraph {
        graph_with(GraphConfig::default())
    }

    fn doc(graph: &DocumentGraph, title: &str) -> u64 {
        graph
            .documents()
            .create(
                &scope(),
                &alice(),
                vec![labeled_group("details", [Content::new("title", title)])],
            )
            .unwrap()
            .id
    }

    // -----------------------------------------------------------------------
    // Edge creation
    // -----------------------------------------------------------------------

    #[test]
    fn create_edge_verifies_endpoints() {
        let g = graph();
        let a = doc(&g, "a");
        let err = g.create_edge(&scope(), &alice(), a, 999, "child").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!g.has_edges(&scope(), a).unwrap());

        let b = doc(&g, "b");
        assert!(g.create_edge(&scope(), &alice(), a, b, "child").is_ok());
    }

    #[test]
    fn endpoint_check_can_be_disabled() {
        let g = graph_with(GraphConfig {
            verify_edge_endpoints: false,
            ..GraphConfig::default()
        });
        assert!(g.create_edge(&scope(), &alice(), 1, 2, "child").is_ok());
    }

    #[test]
    fn get_or_new_edge_is_idempotent() {
        let g = graph();
        let (a, b) = (doc(&g, "a"), doc(&g, "b"));
        let first = g.get_or_new_edge(&scope(), &alice(), a, b, "child").unwrap();
        let second = g.get_or_new_edge(&scope(), &name("bob"), a, b, "child").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            g.create_edge(&scope(), &alice(), a, b, "child").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    // -----------------------------------------------------------------------
    // remove_edges / has_edges
    // -----------------------------------------------------------------------

    #[test]
    fn remove_edges_clears_both_directions() {
        let g = graph();
        let (a, b, c) = (doc(&g, "a"), doc(&g, "b"), doc(&g, "c"));
        g.create_edge(&scope(), &alice(), a, b, "child").unwrap();
        g.create_edge(&scope(), &alice(), c, a, "child").unwrap();
        g.create_edge(&scope(), &alice(), b, c, "child").unwrap();

        assert_eq!(g.remove_edges(&scope(), a).unwrap(), 2);
        assert!(g.edges().edges_from(&scope(), a, "child").unwrap().is_empty());
        assert!(g.edges().edges_to(&scope(), b, "child").unwrap().is_empty());
        assert!(!g.has_edges(&scope(), a).unwrap());
        assert!(g.has_edges(&scope(), b).unwrap());
    }

    #[test]
    fn has_edges_sees_either_direction() {
        let g = graph();
        let (src, dst, lone) = (doc(&g, "src"), doc(&g, "dst"), doc(&g, "lone"));
        g.create_edge(&scope(), &alice(), src, dst, "child").unwrap();
        assert!(g.has_edges(&scope(), src).unwrap());
        assert!(g.has_edges(&scope(), dst).unwrap());
        assert!(!g.has_edges(&scope(), lone).unwrap());
        assert!(!g.has_edges(&name("other"), src).unwrap());
    }

    #[test]
    fn remove_edges_without_edges() {
        let g = graph();
        let a = doc(&g, "a");
        assert_eq!(g.remove_edges(&scope(), a).unwrap(), 0);

        let strict = graph_with(GraphConfig {
            strict_edge_cleanup: true,
            ..GraphConfig::default()
        });
        let a = doc(&strict, "a");
        assert_eq!(
            strict.remove_edges(&scope(), a).unwrap_err().kind(),
            ErrorKind::PreconditionFailed
        );
    }

    // -----------------------------------------------------------------------
    // erase_document
    // -----------------------------------------------------------------------

    #[test]
    fn erase_with_edges_cascades() {
        let g = graph();
        let hub = doc(&g, "hub");
        for (i, title) in ["x", "y", "z"].iter().enumerate() {
            let other = doc(&g, title);
            if i % 2 == 0 {
                g.create_edge(&scope(), &alice(), hub, other, "link").unwrap();
            } else {
                g.create_edge(&scope(), &alice(), other, hub, "link").unwrap();
            }
        }
        g.create_edge(&scope(), &alice(), hub, hub, "self").unwrap();

        let erased = g.erase_document(&scope(), hub, true).unwrap();
        assert_eq!(erased.id, hub);
        assert!(!g.has_edges(&scope(), hub).unwrap());
        assert!(g.edges().touching(&scope(), hub).unwrap().is_empty());
        assert_eq!(g.documents().fetch(&scope(), hub).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn erase_without_edges_leaves_them() {
        let g = graph();
        let (a, b) = (doc(&g, "a"), doc(&g, "b"));
        g.create_edge(&scope(), &alice(), a, b, "child").unwrap();
        g.erase_document(&scope(), a, false).unwrap();
        assert!(g.has_edges(&scope(), a).unwrap());
    }

    #[test]
    fn erase_missing_document_fails_untouched() {
        let g = graph_with(GraphConfig {
            verify_edge_endpoints: false,
            ..GraphConfig::default()
        });
        g.create_edge(&scope(), &alice(), 5, 6, "child").unwrap();
        let err = g.erase_document(&scope(), 5, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(g.has_edges(&scope(), 5).unwrap());
    }

    // -----------------------------------------------------------------------
    // replace_node
    // -----------------------------------------------------------------------

    #[test]
    fn replace_node_rewires_preserving_direction_and_name() {
        let g = graph();
        let (old, new, p, c) = (doc(&g, "old"), doc(&g, "new"), doc(&g, "p"), doc(&g, "c"));
        let incoming = g.create_edge(&scope(), &name("bob"), p, old, "parentof").unwrap();
        g.create_edge(&scope(), &alice(), old, c, "childof").unwrap();
        g.create_edge(&scope(), &alice(), old, old, "loop").unwrap();

        assert_eq!(g.replace_node(&scope(), old, new).unwrap(), 3);
        assert!(!g.has_edges(&scope(), old).unwrap());

        let moved = g.edges().get(&scope(), p, new, "parentof").unwrap();
        assert_eq!(moved.creator, name("bob"));
        assert_eq!(moved.created_at, incoming.created_at);
        assert!(g.edges().exists(&scope(), new, c, "childof").unwrap());
        assert!(g.edges().exists(&scope(), new, new, "loop").unwrap());
        assert_eq!(g.edges().edges_to(&scope(), new, "parentof").unwrap().len(), 1);
    }

    #[test]
    fn replace_node_conflict_changes_nothing() {
        let g = graph();
        let (old, new, x) = (doc(&g, "old"), doc(&g, "new"), doc(&g, "x"));
        g.create_edge(&scope(), &alice(), old, x, "owns").unwrap();
        g.create_edge(&scope(), &alice(), old, x, "likes").unwrap();
        g.create_edge(&scope(), &alice(), new, x, "owns").unwrap();

        let err = g.replace_node(&scope(), old, new).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(g.edges().touching(&scope(), old).unwrap().len(), 2);
        assert!(!g.edges().exists(&scope(), new, x, "likes").unwrap());
    }

    #[test]
    fn replace_node_collapsing_edges_rejected() {
        let g = graph();
        let (old, new) = (doc(&g, "old"), doc(&g, "new"));
        g.create_edge(&scope(), &alice(), old, new, "peer").unwrap();
        g.create_edge(&scope(), &alice(), new, old, "peer").unwrap();
        // Both would become new -[peer]-> new.
        assert!(g.replace_node(&scope(), old, new).is_err());
        assert_eq!(g.edges().touching(&scope(), old).unwrap().len(), 2);
    }

    #[test]
    fn replace_node_requires_new_document() {
        let g = graph();
        let (old, x) = (doc(&g, "old"), doc(&g, "x"));
        g.create_edge(&scope(), &alice(), old, x, "owns").unwrap();
        assert_eq!(
            g.replace_node(&scope(), old, 4242).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(g.has_edges(&scope(), old).unwrap());
        assert_eq!(g.replace_node(&scope(), old, old).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_get_or_new_yields_one_document() {
        let g = Arc::new(graph());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || {
                    g.documents()
                        .get_or_new(
                            &scope(),
                            &alice(),
                            vec![labeled_group("details", [Content::new("title", "same")])],
                        )
                        .unwrap()
                        .id
                })
            })
            .collect();
        let ids: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(g.documents().count(&scope()).unwrap(), 1);
    }

    #[test]
    fn concurrent_edge_creation_admits_one() {
        let g = Arc::new(graph());
        let (a, b) = (doc(&g, "a"), doc(&g, "b"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || g.create_edge(&scope(), &alice(), a, b, "child").is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
    }
}

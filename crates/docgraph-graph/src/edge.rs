use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docgraph_crypto::{edge_key, from_name_key, from_to_key, to_name_key};
use docgraph_store::{IndexKey, IndexSpec, Record, StoreError, Table};
use docgraph_types::{AccountName, Timestamp};

use crate::auth::Authorizer;
use crate::clock::Clock;
use crate::error::{GraphError, GraphResult};
use crate::names::validate_edge_name;

/// A directed, named link between two documents.
///
/// `id` and the three `*_index` fields are derived from the endpoints and
/// name, and are recomputed whenever an edge is built through [`Edge::new`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: u64,
    pub from_node: u64,
    pub to_node: u64,
    pub edge_name: String,
    pub creator: AccountName,
    pub created_at: Timestamp,
    pub from_node_edge_name_index: u64,
    pub from_node_to_node_index: u64,
    pub to_node_edge_name_index: u64,
}

impl Edge {
    /// Build an edge, validating the name and deriving every key.
    pub fn new(
        from_node: u64,
        to_node: u64,
        edge_name: &str,
        creator: AccountName,
        created_at: Timestamp,
    ) -> GraphResult<Self> {
        validate_edge_name(edge_name)?;
        Ok(Self {
            id: edge_key(from_node, to_node, edge_name),
            from_node,
            to_node,
            edge_name: edge_name.to_string(),
            creator,
            created_at,
            from_node_edge_name_index: from_name_key(from_node, edge_name),
            from_node_to_node_index: from_to_key(from_node, to_node),
            to_node_edge_name_index: to_name_key(to_node, edge_name),
        })
    }

    /// `true` when this edge is exactly `from -[name]-> to`.
    pub fn is(&self, from: u64, to: u64, name: &str) -> bool {
        self.from_node == from && self.to_node == to && self.edge_name == name
    }

    /// `true` when `node` is either endpoint.
    pub fn touches(&self, node: u64) -> bool {
        self.from_node == node || self.to_node == node
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} -[{}]-> {}", self.from_node, self.edge_name, self.to_node)
    }
}

impl Record for Edge {
    const TABLE: &'static str = "edges";
    const INDEXES: &'static [IndexSpec] = &[
        IndexSpec::non_unique("from_node"),
        IndexSpec::non_unique("to_node"),
        IndexSpec::non_unique("from_name"),
        IndexSpec::non_unique("from_to"),
        IndexSpec::non_unique("to_name"),
        IndexSpec::non_unique("creator"),
    ];

    fn primary_key(&self) -> u64 {
        self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, IndexKey)> {
        vec![
            ("from_node", IndexKey::Int(self.from_node)),
            ("to_node", IndexKey::Int(self.to_node)),
            ("from_name", IndexKey::Int(self.from_node_edge_name_index)),
            ("from_to", IndexKey::Int(self.from_node_to_node_index)),
            ("to_name", IndexKey::Int(self.to_node_edge_name_index)),
            ("creator", IndexKey::Account(self.creator.clone())),
        ]
    }
}

/// Edge lifecycle and queries over an edge table.
///
/// Endpoint existence is not checked here; that belongs to
/// [`DocumentGraph`](crate::DocumentGraph), which can see documents.
pub struct Edges {
    table: Arc<dyn Table<Edge>>,
    clock: Arc<dyn Clock>,
    auth: Arc<dyn Authorizer>,
}

impl Edges {
    pub fn new(
        table: Arc<dyn Table<Edge>>,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
    ) -> Self {
        Self { table, clock, auth }
    }

    // -- Creation ------------------------------------------------------------

    /// Persist `from -[name]-> to`. Fails if that exact edge exists.
    pub fn create(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        from: u64,
        to: u64,
        name: &str,
    ) -> GraphResult<Edge> {
        validate_edge_name(name)?;
        self.auth.require_auth(creator)?;
        let edge = Edge::new(from, to, name, creator.clone(), self.clock.now())?;
        self.insert(scope, edge)
    }

    /// Return `from -[name]-> to`, creating it if absent.
    pub fn get_or_new(
        &self,
        scope: &AccountName,
        creator: &AccountName,
        from: u64,
        to: u64,
        name: &str,
    ) -> GraphResult<Edge> {
        validate_edge_name(name)?;
        if let Some(existing) = self.find(scope, from, to, name)? {
            return Ok(existing);
        }
        match self.create(scope, creator, from, to, name) {
            Err(GraphError::EdgeExists { .. }) => self.get(scope, from, to, name),
            other => other,
        }
    }

    /// Store a fully built edge, rejecting duplicates and id collisions.
    pub(crate) fn insert(&self, scope: &AccountName, edge: Edge) -> GraphResult<Edge> {
        if let Some(held) = self.table.get(scope, edge.id)? {
            return Err(Self::conflict(&held, &edge));
        }
        match self.table.insert(scope, &edge) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => {
                let held = self.table.get(scope, edge.id)?;
                return Err(match held {
                    Some(held) => Self::conflict(&held, &edge),
                    None => GraphError::EdgeExists {
                        from: edge.from_node,
                        to: edge.to_node,
                        name: edge.edge_name,
                    },
                });
            }
            Err(other) => return Err(other.into()),
        }
        debug!(scope = %scope, id = edge.id, edge = %edge.describe(), "edge created");
        Ok(edge)
    }

    fn conflict(held: &Edge, wanted: &Edge) -> GraphError {
        if held.is(wanted.from_node, wanted.to_node, &wanted.edge_name) {
            GraphError::EdgeExists {
                from: wanted.from_node,
                to: wanted.to_node,
                name: wanted.edge_name.clone(),
            }
        } else {
            GraphError::EdgeKeyCollision {
                id: wanted.id,
                held_by: held.describe(),
            }
        }
    }

    // -- Point lookup --------------------------------------------------------

    pub fn find(
        &self,
        scope: &AccountName,
        from: u64,
        to: u64,
        name: &str,
    ) -> GraphResult<Option<Edge>> {
        let edge = self.table.get(scope, edge_key(from, to, name))?;
        Ok(edge.filter(|e| e.is(from, to, name)))
    }

    pub fn get(&self, scope: &AccountName, from: u64, to: u64, name: &str) -> GraphResult<Edge> {
        self.find(scope, from, to, name)?
            .ok_or_else(|| GraphError::EdgeNotFound {
                from,
                to,
                name: name.to_string(),
            })
    }

    pub fn exists(&self, scope: &AccountName, from: u64, to: u64, name: &str) -> GraphResult<bool> {
        Ok(self.find(scope, from, to, name)?.is_some())
    }

    /// Whatever row sits under `id`, whichever triple it holds.
    pub(crate) fn get_by_id(&self, scope: &AccountName, id: u64) -> GraphResult<Option<Edge>> {
        Ok(self.table.get(scope, id)?)
    }

    // -- Range queries -------------------------------------------------------

    /// Edges leaving `from` named `name`.
    pub fn edges_from(&self, scope: &AccountName, from: u64, name: &str) -> GraphResult<Vec<Edge>> {
        let key = IndexKey::Int(from_name_key(from, name));
        let mut edges = self.table.find(scope, "from_name", &key)?;
        edges.retain(|e| e.from_node == from && e.edge_name == name);
        Ok(edges)
    }

    /// Edges arriving at `to` named `name`.
    pub fn edges_to(&self, scope: &AccountName, to: u64, name: &str) -> GraphResult<Vec<Edge>> {
        let key = IndexKey::Int(to_name_key(to, name));
        let mut edges = self.table.find(scope, "to_name", &key)?;
        edges.retain(|e| e.to_node == to && e.edge_name == name);
        Ok(edges)
    }

    /// Edges from `from` to `to`, any name.
    pub fn edges_between(&self, scope: &AccountName, from: u64, to: u64) -> GraphResult<Vec<Edge>> {
        let key = IndexKey::Int(from_to_key(from, to));
        let mut edges = self.table.find(scope, "from_to", &key)?;
        edges.retain(|e| e.from_node == from && e.to_node == to);
        Ok(edges)
    }

    pub fn edges_from_or_fail(
        &self,
        scope: &AccountName,
        from: u64,
        name: &str,
    ) -> GraphResult<Vec<Edge>> {
        non_empty(self.edges_from(scope, from, name)?, || format!("from {from} named {name}"))
    }

    pub fn edges_to_or_fail(
        &self,
        scope: &AccountName,
        to: u64,
        name: &str,
    ) -> GraphResult<Vec<Edge>> {
        non_empty(self.edges_to(scope, to, name)?, || format!("to {to} named {name}"))
    }

    pub fn edges_between_or_fail(
        &self,
        scope: &AccountName,
        from: u64,
        to: u64,
    ) -> GraphResult<Vec<Edge>> {
        non_empty(self.edges_between(scope, from, to)?, || format!("between {from} and {to}"))
    }

    /// The single edge leaving `from` named `name`.
    pub fn edge_from(&self, scope: &AccountName, from: u64, name: &str) -> GraphResult<Edge> {
        exactly_one(self.edges_from(scope, from, name)?, || format!("from {from} named {name}"))
    }

    /// The single edge arriving at `to` named `name`.
    pub fn edge_to(&self, scope: &AccountName, to: u64, name: &str) -> GraphResult<Edge> {
        exactly_one(self.edges_to(scope, to, name)?, || format!("to {to} named {name}"))
    }

    /// Every edge leaving `node`, any name.
    pub fn all_from(&self, scope: &AccountName, node: u64) -> GraphResult<Vec<Edge>> {
        Ok(self.table.find(scope, "from_node", &IndexKey::Int(node))?)
    }

    /// Every edge arriving at `node`, any name.
    pub fn all_to(&self, scope: &AccountName, node: u64) -> GraphResult<Vec<Edge>> {
        Ok(self.table.find(scope, "to_node", &IndexKey::Int(node))?)
    }

    /// Every edge with `node` at either end, each once, in id order.
    pub fn touching(&self, scope: &AccountName, node: u64) -> GraphResult<Vec<Edge>> {
        let mut by_id: BTreeMap<u64, Edge> = BTreeMap::new();
        for edge in self.all_from(scope, node)?.into_iter().chain(self.all_to(scope, node)?) {
            by_id.entry(edge.id).or_insert(edge);
        }
        Ok(by_id.into_values().collect())
    }

    /// `true` when any edge starts or ends at `node`. Reads at most two rows.
    pub fn any_touching(&self, scope: &AccountName, node: u64) -> GraphResult<bool> {
        let key = IndexKey::Int(node);
        if self.table.find_one(scope, "from_node", &key)?.is_some() {
            return Ok(true);
        }
        Ok(self.table.find_one(scope, "to_node", &key)?.is_some())
    }

    pub fn count_from(&self, scope: &AccountName, node: u64) -> GraphResult<usize> {
        Ok(self.all_from(scope, node)?.len())
    }

    pub fn count_to(&self, scope: &AccountName, node: u64) -> GraphResult<usize> {
        Ok(self.all_to(scope, node)?.len())
    }

    /// Edges `creator` created in `scope`.
    pub fn find_by_creator(
        &self,
        scope: &AccountName,
        creator: &AccountName,
    ) -> GraphResult<Vec<Edge>> {
        Ok(self
            .table
            .find(scope, "creator", &IndexKey::Account(creator.clone()))?)
    }

    // -- Removal -------------------------------------------------------------

    /// Delete `from -[name]-> to`. Fails if it does not exist.
    pub fn remove(&self, scope: &AccountName, from: u64, to: u64, name: &str) -> GraphResult<Edge> {
        let edge = self.get(scope, from, to, name)?;
        self.delete(scope, &edge)?;
        Ok(edge)
    }

    /// Delete every edge leaving `from` named `name`, returning how many.
    ///
    /// With `strict`, matching nothing is an error.
    pub fn remove_edges_from(
        &self,
        scope: &AccountName,
        from: u64,
        name: &str,
        strict: bool,
    ) -> GraphResult<usize> {
        let edges = self.edges_from(scope, from, name)?;
        if strict && edges.is_empty() {
            return Err(GraphError::NoEdges {
                query: format!("from {from} named {name}"),
            });
        }
        self.delete_all(scope, &edges)
    }

    /// Delete every edge from `from` to `to`, returning how many.
    pub fn remove_edges_between(
        &self,
        scope: &AccountName,
        from: u64,
        to: u64,
        strict: bool,
    ) -> GraphResult<usize> {
        let edges = self.edges_between(scope, from, to)?;
        if strict && edges.is_empty() {
            return Err(GraphError::NoEdges {
                query: format!("between {from} and {to}"),
            });
        }
        self.delete_all(scope, &edges)
    }

    pub(crate) fn delete_all(&self, scope: &AccountName, edges: &[Edge]) -> GraphResult<usize> {
        for edge in edges {
            self.delete(scope, edge)?;
        }
        Ok(edges.len())
    }

    fn delete(&self, scope: &AccountName, edge: &Edge) -> GraphResult<()> {
        self.table.delete(scope, edge.id).map_err(|e| match e {
            StoreError::NotFound { .. } => GraphError::EdgeNotFound {
                from: edge.from_node,
                to: edge.to_node,
                name: edge.edge_name.clone(),
            },
            other => GraphError::Store(other),
        })?;
        debug!(scope = %scope, id = edge.id, edge = %edge.describe(), "edge removed");
        Ok(())
    }
}

impl std::fmt::Debug for Edges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edges").finish_non_exhaustive()
    }
}

fn non_empty(edges: Vec<Edge>, query: impl FnOnce() -> String) -> GraphResult<Vec<Edge>> {
    if edges.is_empty() {
        Err(GraphError::NoEdges { query: query() })
    } else {
        Ok(edges)
    }
}

fn exactly_one(mut edges: Vec<Edge>, query: impl FnOnce() -> String) -> GraphResult<Edge> {
    match edges.len() {
        0 => Err(GraphError::NoEdges { query: query() }),
        1 => Ok(edges.remove(0)),
        count => Err(GraphError::AmbiguousEdge {
            query: query(),
            count,
        }),
    }
}

//! Append-only arena of nodes and edges.
//!
//! Nodes and edges are addressed by `u32` handles. Both vectors only grow,
//! so a handle stays valid for the whole compilation. Readers clone the
//! node's `Arc` out of the read lock and never hold the arena lock while
//! touching a node's own locks.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tern_types::MultiKey;

use crate::{InferError, Node};

/// Handle of a node in the graph arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle of an edge in the graph arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EdgeId(u32);

impl EdgeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        EdgeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Data flows from `from` into `to`.
///
/// `path` addresses the place inside `to` that receives `from`'s value;
/// `None` means the whole value.
#[derive(Clone, Debug)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub path: Option<MultiKey>,
}

#[derive(Default)]
pub(crate) struct Graph {
    nodes: RwLock<Vec<Arc<Node>>>,
    edges: RwLock<Vec<Edge>>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a node built from its future id.
    pub(crate) fn push_node(
        &self,
        make: impl FnOnce(NodeId) -> Node,
    ) -> Result<NodeId, InferError> {
        let mut nodes = self.nodes.write();
        let id = NodeId(to_handle(nodes.len(), "node")?);
        nodes.push(Arc::new(make(id)));
        Ok(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<Arc<Node>, InferError> {
        self.nodes
            .read()
            .get(id.index())
            .cloned()
            .ok_or(InferError::UnknownNode(id))
    }

    pub(crate) fn edge(&self, id: EdgeId) -> Result<Edge, InferError> {
        self.edges
            .read()
            .get(id.index())
            .cloned()
            .ok_or(InferError::UnknownEdge(id))
    }

    /// Append an edge and register it on both endpoints.
    pub(crate) fn link(
        &self,
        from: NodeId,
        to: NodeId,
        path: Option<MultiKey>,
    ) -> Result<EdgeId, InferError> {
        let source = self.node(from)?;
        let target = self.node(to)?;
        let id = {
            let mut edges = self.edges.write();
            let id = EdgeId(to_handle(edges.len(), "edge")?);
            edges.push(Edge { from, to, path });
            id
        };
        source.push_edge_out(id);
        target.push_edge_in(id);
        Ok(id)
    }

    /// Like `link` with no path, but reuses an existing whole-value edge
    /// from `from` to `to`.
    pub(crate) fn link_once(&self, from: NodeId, to: NodeId) -> Result<EdgeId, InferError> {
        let target = self.node(to)?;
        for id in target.edges_in() {
            let edge = self.edge(id)?;
            if edge.from == from && edge.path.is_none() {
                return Ok(id);
            }
        }
        self.link(from, to, None)
    }

    /// Incoming edges of `node`, in registration order.
    pub(crate) fn sources(&self, node: &Node) -> Result<Vec<(EdgeId, Edge)>, InferError> {
        let ids = node.edges_in();
        let edges = self.edges.read();
        ids.into_iter()
            .map(|id| {
                edges
                    .get(id.index())
                    .cloned()
                    .map(|edge| (id, edge))
                    .ok_or(InferError::UnknownEdge(id))
            })
            .collect()
    }

    /// Targets of `node`'s outgoing edges.
    pub(crate) fn dependents(&self, node: &Node) -> Result<Vec<NodeId>, InferError> {
        let ids = node.edges_out();
        let edges = self.edges.read();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let edge = edges.get(id.index()).ok_or(InferError::UnknownEdge(id))?;
            out.push(edge.to);
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.read().len()
    }
}

/// Handle for the next slot of an arena holding `len` entries.
fn to_handle(len: usize, arena: &'static str) -> Result<u32, InferError> {
    u32::try_from(len).map_err(|_| InferError::GraphFull { arena })
}

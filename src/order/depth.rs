//! Dependency depth resolution
//!
//! Every shard of a batch gets a depth:
//! - 0 if it is completed or not part of the batch at all
//! - otherwise 1 + the depth of its deepest parent
//!
//! The batch is loaded into a petgraph node table (one node per distinct
//! shard ID, edges parent -> child) and walked depth-first with an explicit
//! stack, so a long ancestor chain costs heap, not call stack. Each node
//! moves `Unvisited -> InProgress -> Resolved` exactly once; meeting an
//! `InProgress` node again means the batch contains a cycle.

use petgraph::graph::{DiGraph, Neighbors, NodeIndex};
use petgraph::Direction;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{trace, warn};

use super::OrderError;
use crate::domain::Prioritizable;

/// Traversal state of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum NodeState {
    #[default]
    Unvisited,
    InProgress,
    Resolved(usize),
}

impl NodeState {
    /// Marks the node as being resolved
    fn enter(&mut self, shard_id: &str) -> Result<(), OrderError> {
        match *self {
            NodeState::Unvisited => {
                *self = NodeState::InProgress;
                Ok(())
            }
            NodeState::InProgress => Err(OrderError::CircularDependency(shard_id.to_string())),
            NodeState::Resolved(_) => Err(OrderError::InconsistentState(format!(
                "depth for shard {} is already resolved",
                shard_id
            ))),
        }
    }

    /// Records the depth of a node that is being resolved
    fn settle(&mut self, shard_id: &str, depth: usize) -> Result<(), OrderError> {
        match *self {
            NodeState::InProgress => {
                *self = NodeState::Resolved(depth);
                Ok(())
            }
            NodeState::Resolved(_) => Err(OrderError::InconsistentState(format!(
                "depth for shard {} was populated twice",
                shard_id
            ))),
            NodeState::Unvisited => Err(OrderError::InconsistentState(format!(
                "depth for shard {} populated before it was visited",
                shard_id
            ))),
        }
    }

    fn depth(&self) -> Option<usize> {
        match *self {
            NodeState::Resolved(depth) => Some(depth),
            _ => None,
        }
    }
}

/// A node whose parents are still being walked
struct Frame<'g> {
    node: NodeIndex,
    parents: Neighbors<'g, ()>,
    deepest_parent: usize,
}

/// Depths of a batch, indexed by position in the batch
///
/// Positions holding a repeated shard ID have no depth of their own; the
/// first occurrence of the ID carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depths {
    by_position: Vec<Option<usize>>,
}

impl Depths {
    /// Depth of the item at `position`, `None` for repeated IDs
    pub fn get(&self, position: usize) -> Option<usize> {
        self.by_position.get(position).copied().flatten()
    }

    /// Number of positions (the batch length)
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// Depths in batch order
    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.by_position.iter().copied()
    }

    /// Deepest resolved depth, 0 for an empty batch
    pub fn max_depth(&self) -> usize {
        self.by_position.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Resolves dependency depths for one batch
pub struct DepthResolver<'a, T> {
    batch: &'a [T],

    /// Node weights are batch positions
    graph: DiGraph<usize, ()>,

    /// Map from shard ID to node index
    node_map: HashMap<&'a str, NodeIndex>,
}

impl<'a, T: Prioritizable> DepthResolver<'a, T> {
    /// Builds the node table for a batch
    pub fn new(batch: &'a [T]) -> Self {
        let mut graph = DiGraph::with_capacity(batch.len(), batch.len());
        let mut node_map = HashMap::with_capacity(batch.len());

        // First pass: one node per distinct shard ID
        for (position, item) in batch.iter().enumerate() {
            match node_map.entry(item.shard_id()) {
                Entry::Vacant(entry) => {
                    entry.insert(graph.add_node(position));
                }
                Entry::Occupied(_) => {
                    warn!(
                        shard_id = item.shard_id(),
                        position, "Duplicate shard in batch, keeping first occurrence"
                    );
                }
            }
        }

        // Second pass: parent -> child edges, parents outside the batch are skipped
        for child in graph.node_indices() {
            let item = &batch[graph[child]];
            for parent_id in item.parent_shard_ids() {
                if let Some(&parent) = node_map.get(parent_id) {
                    graph.add_edge(parent, child, ());
                }
            }
        }

        Self {
            batch,
            graph,
            node_map,
        }
    }

    /// Number of distinct shards in the batch
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Resolves the depth of every shard in the batch
    ///
    /// Fails on the first cycle found; no partial result is returned.
    pub fn resolve(&self) -> Result<Depths, OrderError> {
        let mut states = vec![NodeState::Unvisited; self.graph.node_count()];
        let mut stack = Vec::new();

        for root in self.graph.node_indices() {
            if states[root.index()] == NodeState::Unvisited {
                self.walk(root, &mut states, &mut stack)?;
            }
        }

        let mut by_position = vec![None; self.batch.len()];
        for node in self.graph.node_indices() {
            by_position[self.graph[node]] = states[node.index()].depth();
        }

        Ok(Depths { by_position })
    }

    fn shard_id(&self, node: NodeIndex) -> &'a str {
        let batch: &'a [T] = self.batch;
        batch[self.graph[node]].shard_id()
    }

    /// Resolves `root` and every unresolved ancestor of it
    fn walk<'g>(
        &'g self,
        root: NodeIndex,
        states: &mut [NodeState],
        stack: &mut Vec<Frame<'g>>,
    ) -> Result<(), OrderError> {
        if let Some(frame) = self.open(root, states)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            match frame.parents.next() {
                Some(parent) => {
                    let state = states[parent.index()];
                    match state {
                        NodeState::Resolved(depth) => {
                            frame.deepest_parent = frame.deepest_parent.max(depth);
                        }
                        NodeState::InProgress => {
                            return Err(OrderError::CircularDependency(
                                self.shard_id(parent).to_string(),
                            ));
                        }
                        NodeState::Unvisited => {
                            // Completed parents resolve to 0 without a frame
                            if let Some(next) = self.open(parent, states)? {
                                stack.push(next);
                            }
                        }
                    }
                }
                None => {
                    let node = frame.node;
                    let depth = frame.deepest_parent + 1;
                    stack.pop();

                    states[node.index()].settle(self.shard_id(node), depth)?;
                    trace!(shard_id = self.shard_id(node), depth, "Resolved shard depth");

                    if let Some(child) = stack.last_mut() {
                        child.deepest_parent = child.deepest_parent.max(depth);
                    }
                }
            }
        }

        Ok(())
    }

    /// Enters a node; completed shards are settled at depth 0 immediately
    fn open(
        &self,
        node: NodeIndex,
        states: &mut [NodeState],
    ) -> Result<Option<Frame<'_>>, OrderError> {
        let item = &self.batch[self.graph[node]];
        let state = &mut states[node.index()];

        state.enter(item.shard_id())?;

        if item.is_completed() {
            state.settle(item.shard_id(), 0)?;
            return Ok(None);
        }

        Ok(Some(Frame {
            node,
            parents: self.graph.neighbors_directed(node, Direction::Incoming),
            deepest_parent: 0,
        }))
    }
}

/// Resolves depths for a batch, keyed by shard ID
pub fn resolve_depths<T: Prioritizable>(batch: &[T]) -> Result<HashMap<String, usize>, OrderError> {
    let depths = DepthResolver::new(batch).resolve()?;

    Ok(batch
        .iter()
        .zip(depths.iter())
        .filter_map(|(item, depth)| depth.map(|d| (item.shard_id().to_string(), d)))
        .collect())
}

//! Arena-backed capacitated flow network.
//!
//! Nodes are plain indices; every edge is stored together with its residual
//! twin so that edge `e` and `e ^ 1` form a forward/backward pair. Capacities
//! can be changed in place, which lets searches toggle edges without
//! rebuilding the graph.

use super::{algorithms, FlowMethod};
use crate::EPS;

/// Index of an edge in a [`FlowNetwork`].
pub type EdgeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub(crate) to: usize,
    pub(crate) capacity: f64,
    pub(crate) flow: f64,
}

/// A directed network with real capacities.
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    pub(crate) adjacency: Vec<Vec<EdgeId>>,
    pub(crate) edges: Vec<Edge>,
}

impl FlowNetwork {
    /// Creates a network with `node_count` isolated nodes.
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            edges: Vec::new(),
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Adds a directed edge and its zero-capacity residual twin.
    ///
    /// Returns the ID of the forward edge.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge {
            to,
            capacity,
            flow: 0.0,
        });
        self.edges.push(Edge {
            to: from,
            capacity: 0.0,
            flow: 0.0,
        });
        self.adjacency[from].push(id);
        self.adjacency[to].push(id ^ 1);
        id
    }

    /// Capacity of an edge.
    #[inline]
    pub fn capacity(&self, edge: EdgeId) -> f64 {
        self.edges[edge].capacity
    }

    /// Changes the capacity of an edge. Existing flow is kept until the next
    /// [`max_flow`](Self::max_flow) call.
    #[inline]
    pub fn set_capacity(&mut self, edge: EdgeId, capacity: f64) {
        self.edges[edge].capacity = capacity;
    }

    /// Flow currently routed through an edge.
    #[inline]
    pub fn flow(&self, edge: EdgeId) -> f64 {
        self.edges[edge].flow
    }

    /// Clears all routed flow.
    pub fn reset_flow(&mut self) {
        for edge in &mut self.edges {
            edge.flow = 0.0;
        }
    }

    /// Computes a maximum flow from `source` to `sink` with the given method.
    ///
    /// Any previous flow is discarded. Per-edge flows are readable through
    /// [`flow`](Self::flow) afterwards.
    pub fn max_flow(&mut self, source: usize, sink: usize, method: FlowMethod) -> f64 {
        self.reset_flow();
        if source == sink {
            return 0.0;
        }
        match method {
            FlowMethod::EdmondsKarp => algorithms::edmonds_karp(self, source, sink),
            FlowMethod::FordFulkerson => algorithms::ford_fulkerson(self, source, sink),
            FlowMethod::Dinic => algorithms::dinic(self, source, sink),
            FlowMethod::PreflowPush => algorithms::preflow_push(self, source, sink),
            FlowMethod::ShortestAugmentingPath => {
                algorithms::shortest_augmenting_path(self, source, sink)
            }
        }
    }

    #[inline]
    pub(crate) fn residual(&self, edge: EdgeId) -> f64 {
        let e = &self.edges[edge];
        e.capacity - e.flow
    }

    #[inline]
    pub(crate) fn has_residual(&self, edge: EdgeId) -> bool {
        self.residual(edge) > EPS
    }

    #[inline]
    pub(crate) fn push(&mut self, edge: EdgeId, amount: f64) {
        self.edges[edge].flow += amount;
        self.edges[edge ^ 1].flow -= amount;
    }

    /// Net flow leaving `node`.
    #[cfg(test)]
    pub(crate) fn outflow(&self, node: usize) -> f64 {
        // Twins of incoming edges carry the negated incoming flow.
        self.adjacency[node]
            .iter()
            .map(|&e| self.edges[e].flow)
            .sum()
    }
}

//! Residual graph arena
//!
//! Adjacency-list storage of residual arcs shared by the maximum flow and the
//! minimum-cost flow engines. Every arc is stored as a record in the
//! adjacency list of its tail; its partner arc is referenced by the slot it
//! occupies in the adjacency list of the head, never by pointer.
//!
//! # Invariants
//! For every arc `e` with partner `r`:
//! - `e.capacity + r.capacity == e.original_capacity + r.original_capacity`
//! - `e.flow == -r.flow`
//! - `e.cost == -r.cost`

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmError, NodeId, Weight};

/// Residual arc record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualEdge {
    /// Head of the arc
    pub to: NodeId,
    /// Remaining capacity
    pub capacity: Weight,
    /// Capacity the arc was created with
    pub original_capacity: Weight,
    /// Net flow pushed along the arc, negative on the partner of a used arc
    pub flow: Weight,
    /// Cost per unit of flow, zero for pure max-flow networks
    pub cost: Weight,
    /// Slot of the partner arc in the adjacency list of `to`
    pub reverse: usize,
    /// True for the zero-capacity partner created by a directed insertion,
    /// false for every arc that is part of the input
    pub is_reverse: bool,
}

/// Stable reference to an arc inserted through one of the `add_*` methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeHandle {
    pub from: NodeId,
    pub slot: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResidualGraph {
    adjacency: Vec<Vec<ResidualEdge>>,
}

impl ResidualGraph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); vertex_count],
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of stored arcs, partners included
    pub fn arc_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    #[inline]
    pub fn check_node(&self, node: NodeId) -> Result<(), AlgorithmError> {
        AlgorithmError::check_node(node, self.vertex_count())
    }

    /// Inserts `from -> to` with `capacity` and its partner `to -> from`.
    /// `partner_capacity` is `None` for a directed insertion, whose partner
    /// is a zero-capacity reverse arc, and `Some(c)` when the partner is an
    /// input arc in its own right. Nothing is mutated unless both endpoints
    /// are valid and both capacities are non-negative.
    pub fn add_arc_pair(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: Weight,
        partner_capacity: Option<Weight>,
        cost: Weight,
    ) -> Result<EdgeHandle, AlgorithmError> {
        self.check_node(from)?;
        let reverse_capacity = partner_capacity.unwrap_or(0);
        self.check_node(to)?;
        if capacity < 0 || reverse_capacity < 0 {
            return Err(AlgorithmError::invalid_parameter(
                "capacity",
                format!("capacities must be non-negative, got {capacity} / {reverse_capacity}"),
            ));
        }

        let forward_slot = self.adjacency[from].len();
        // A self loop puts both arcs into the same list.
        let reverse_slot = self.adjacency[to].len() + usize::from(from == to);

        self.adjacency[from].push(ResidualEdge {
            to,
            capacity,
            original_capacity: capacity,
            flow: 0,
            cost,
            reverse: reverse_slot,
            is_reverse: false,
        });
        self.adjacency[to].push(ResidualEdge {
            to: from,
            capacity: reverse_capacity,
            original_capacity: reverse_capacity,
            flow: 0,
            cost: -cost,
            reverse: forward_slot,
            is_reverse: partner_capacity.is_none(),
        });

        Ok(EdgeHandle { from, slot: forward_slot })
    }

    #[inline]
    pub fn edges(&self, node: NodeId) -> &[ResidualEdge] {
        &self.adjacency[node]
    }

    pub fn edge(&self, handle: EdgeHandle) -> Option<&ResidualEdge> {
        self.adjacency.get(handle.from)?.get(handle.slot)
    }

    /// All arcs as `(tail, arc)` pairs
    pub fn arcs(&self) -> impl Iterator<Item = (NodeId, &ResidualEdge)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, edges)| edges.iter().map(move |edge| (from, edge)))
    }

    /// Pushes `amount` units along `adjacency[from][slot]` and mirrors the
    /// change on its partner.
    pub fn push(&mut self, from: NodeId, slot: usize, amount: Weight) {
        let (to, reverse) = {
            let edge = &mut self.adjacency[from][slot];
            debug_assert!(amount <= edge.capacity, "push exceeds residual capacity");
            edge.capacity -= amount;
            edge.flow += amount;
            (edge.to, edge.reverse)
        };
        let partner = &mut self.adjacency[to][reverse];
        partner.capacity += amount;
        partner.flow -= amount;
    }

    /// Restores every arc to its original capacity with zero flow.
    pub fn reset(&mut self) {
        for edge in self.adjacency.iter_mut().flatten() {
            edge.capacity = edge.original_capacity;
            edge.flow = 0;
        }
    }

    pub fn max_original_capacity(&self) -> Weight {
        self.arcs()
            .map(|(_, edge)| edge.original_capacity)
            .max()
            .unwrap_or(0)
    }

    /// Net flow leaving `node`
    pub fn net_outflow(&self, node: NodeId) -> Weight {
        self.adjacency[node].iter().map(|edge| edge.flow).sum()
    }

    /// Net flow leaving every vertex, indexed by vertex
    pub fn net_outflows(&self) -> Vec<Weight> {
        (0..self.vertex_count()).map(|node| self.net_outflow(node)).collect()
    }

    /// Marks the vertices reachable from `source` over arcs whose residual
    /// capacity is at least `threshold`.
    pub fn reachable_from(&self, source: NodeId, threshold: Weight) -> Vec<bool> {
        let mut seen = vec![false; self.vertex_count()];
        let mut queue = VecDeque::new();
        seen[source] = true;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for edge in &self.adjacency[u] {
                if edge.capacity >= threshold && !seen[edge.to] {
                    seen[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }
        seen
    }
}

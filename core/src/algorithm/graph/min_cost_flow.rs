//! Minimum-Cost Maximum Flow
//!
//! Successive shortest augmenting paths with vertex potentials. Every
//! augmentation follows a cheapest residual path, found by Dijkstra on the
//! reduced costs `cost + pot[u] - pot[v]`. After each search the potentials
//! absorb the shortest distances, which keeps every reduced cost of the new
//! residual graph non-negative (iterated Johnson reweighting), so Dijkstra
//! stays valid even though reverse arcs carry negative costs.
//!
//! Potentials start at zero when no residual arc has a negative cost;
//! otherwise a Bellman–Ford pass seeds them. This also covers a network
//! that has already been solved once: its reverse arcs carry negative
//! costs, and a second call continues from its residual state.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::parse_bool_parameter;
use crate::algorithm::{Algorithm, AlgorithmComplexity, AlgorithmError, NodeId, Weight};
use crate::config::{EngineConfig, INFINITY};
use crate::data_structures::priority_queue::IndexedPriorityQueue;
use crate::data_structures::residual_graph::{EdgeHandle, ResidualEdge, ResidualGraph};
use crate::validation::correctness;

/// Achieved flow and its total cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinCostFlowResult {
    pub flow: Weight,
    pub cost: Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFlowMetrics {
    /// Number of augmenting paths pushed
    pub augmentations: usize,
    /// Number of Dijkstra searches, including the final unsuccessful one
    pub dijkstra_runs: usize,
    /// Whether potentials had to be seeded by Bellman–Ford
    pub bellman_ford_used: bool,
}

/// Flow network with per-unit arc costs
#[derive(Debug, Clone)]
pub struct CostFlowNetwork {
    graph: ResidualGraph,
    config: EngineConfig,
    metrics: CostFlowMetrics,
    /// Default cap used by `solve`
    flow_limit: Weight,
}

/// Result of one shortest-path search
struct ShortestPaths {
    dist: Vec<Weight>,
    /// Arc `(tail, slot)` through which each vertex was last relaxed
    via: Vec<Option<(NodeId, usize)>>,
}

impl CostFlowNetwork {
    pub fn new(vertex_count: usize) -> Self {
        Self::with_config(vertex_count, EngineConfig::default())
    }

    pub fn with_config(vertex_count: usize, config: EngineConfig) -> Self {
        Self {
            graph: ResidualGraph::new(vertex_count),
            config,
            metrics: CostFlowMetrics::default(),
            flow_limit: Weight::MAX,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn residual_graph(&self) -> &ResidualGraph {
        &self.graph
    }

    pub fn metrics(&self) -> &CostFlowMetrics {
        &self.metrics
    }

    /// Adds `from -> to` with the given capacity and unit cost; the reverse
    /// partner has capacity zero and cost `-cost`
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: Weight,
        cost: Weight,
    ) -> Result<EdgeHandle, AlgorithmError> {
        self.graph.add_arc_pair(from, to, capacity, None, cost)
    }

    pub fn edge(&self, handle: EdgeHandle) -> Option<&ResidualEdge> {
        self.graph.edge(handle)
    }

    pub fn edge_flow(&self, handle: EdgeHandle) -> Option<Weight> {
        self.graph.edge(handle).map(|edge| edge.flow)
    }

    pub fn reset(&mut self) {
        self.graph.reset();
        self.metrics = CostFlowMetrics::default();
    }

    /// Solve with the configured `flow_limit`
    pub fn solve(
        &mut self,
        source: NodeId,
        sink: NodeId,
    ) -> Result<MinCostFlowResult, AlgorithmError> {
        self.min_cost_max_flow(source, sink, self.flow_limit)
    }

    /// Minimum-cost maximum flow without a cap
    pub fn min_cost_flow(
        &mut self,
        source: NodeId,
        sink: NodeId,
    ) -> Result<MinCostFlowResult, AlgorithmError> {
        self.min_cost_max_flow(source, sink, Weight::MAX)
    }

    /// Routes up to `max_flow` units from `source` to `sink` at minimum
    /// cost. The last augmentation is truncated so the flow never exceeds
    /// the cap.
    pub fn min_cost_max_flow(
        &mut self,
        source: NodeId,
        sink: NodeId,
        max_flow: Weight,
    ) -> Result<MinCostFlowResult, AlgorithmError> {
        self.graph.check_node(source)?;
        self.graph.check_node(sink)?;
        if source == sink {
            return Err(AlgorithmError::InvalidGraph(format!(
                "source and sink are both vertex {source}"
            )));
        }
        if max_flow < 0 {
            return Err(AlgorithmError::invalid_parameter(
                "max_flow",
                format!("flow cap must be non-negative, got {max_flow}"),
            ));
        }

        self.metrics = CostFlowMetrics::default();
        let mut potentials = self.initial_potentials(source)?;
        let baseline = self
            .config
            .verify_certificates
            .then(|| self.graph.net_outflows());
        let mut result = MinCostFlowResult::default();

        while result.flow < max_flow {
            let paths = self.dijkstra(source, &potentials);
            self.metrics.dijkstra_runs += 1;
            if paths.dist[sink] >= INFINITY {
                break;
            }

            for (potential, &dist) in potentials.iter_mut().zip(&paths.dist) {
                if dist < INFINITY {
                    *potential += dist;
                }
            }

            let mut arcs = Vec::new();
            let mut node = sink;
            while let Some((tail, slot)) = paths.via[node] {
                arcs.push((tail, slot));
                node = tail;
            }

            let bottleneck = arcs
                .iter()
                .map(|&(tail, slot)| self.graph.edges(tail)[slot].capacity)
                .min()
                .unwrap_or(0)
                .min(max_flow - result.flow);
            let path_cost: Weight = arcs
                .iter()
                .map(|&(tail, slot)| self.graph.edges(tail)[slot].cost)
                .sum();
            for &(tail, slot) in &arcs {
                self.graph.push(tail, slot, bottleneck);
            }

            self.metrics.augmentations += 1;
            result.flow += bottleneck;
            result.cost += bottleneck * path_cost;
            trace!(
                "augmented {} units along {} arcs at unit cost {}",
                bottleneck,
                arcs.len(),
                path_cost
            );
        }

        debug!(
            "min cost flow {} -> {}: flow {}, cost {}, {} augmentations",
            source, sink, result.flow, result.cost, self.metrics.augmentations
        );

        if let Some(baseline) = baseline {
            correctness::verify_flow_conservation(&self.graph, source, sink, &baseline)?;
            correctness::verify_reduced_costs(&self.graph, source, &potentials)?;
        }
        Ok(result)
    }

    /// Zero potentials, or Bellman–Ford distances when some residual arc
    /// has a negative cost. Fails on a negative cycle reachable from
    /// `source` without touching the network.
    fn initial_potentials(&mut self, source: NodeId) -> Result<Vec<Weight>, AlgorithmError> {
        let n = self.vertex_count();
        let needs_seeding = self
            .graph
            .arcs()
            .any(|(_, edge)| edge.capacity > 0 && edge.cost < 0);
        if !needs_seeding {
            return Ok(vec![0; n]);
        }

        self.metrics.bellman_ford_used = true;
        let mut dist = vec![INFINITY; n];
        dist[source] = 0;

        for round in 0..n {
            let mut relaxed = false;
            for (from, edge) in self.graph.arcs() {
                if edge.capacity <= 0 || dist[from] >= INFINITY {
                    continue;
                }
                let candidate = dist[from] + edge.cost;
                if candidate < dist[edge.to] {
                    dist[edge.to] = candidate;
                    relaxed = true;
                }
            }
            if !relaxed {
                debug!("bellman-ford potentials settled after {} rounds", round + 1);
                return Ok(dist
                    .into_iter()
                    .map(|d| if d >= INFINITY { 0 } else { d })
                    .collect());
            }
        }

        Err(AlgorithmError::InvalidGraph(format!(
            "negative-cost cycle reachable from vertex {source}"
        )))
    }

    /// Dijkstra on reduced costs from `source`
    fn dijkstra(&self, source: NodeId, potentials: &[Weight]) -> ShortestPaths {
        let n = self.vertex_count();
        let mut dist = vec![INFINITY; n];
        let mut via = vec![None; n];
        let mut done = vec![false; n];
        let mut queue = IndexedPriorityQueue::new(n);

        dist[source] = 0;
        queue.push_or_decrease(source, 0);

        while let Some((u, d)) = queue.pop() {
            done[u] = true;
            for (slot, edge) in self.graph.edges(u).iter().enumerate() {
                if edge.capacity <= 0 || done[edge.to] {
                    continue;
                }
                let reduced = edge.cost + potentials[u] - potentials[edge.to];
                debug_assert!(reduced >= 0, "negative reduced cost {reduced} on {u} -> {}", edge.to);
                let candidate = d + reduced;
                if candidate < dist[edge.to] {
                    dist[edge.to] = candidate;
                    via[edge.to] = Some((u, slot));
                    queue.push_or_decrease(edge.to, candidate);
                }
            }
        }

        ShortestPaths { dist, via }
    }
}

impl Algorithm for CostFlowNetwork {
    fn name(&self) -> &'static str {
        "Successive Shortest Paths"
    }

    fn category(&self) -> &'static str {
        "min_cost_flow"
    }

    fn description(&self) -> &'static str {
        "Minimum-cost maximum flow by Dijkstra augmentations on potential-reduced costs."
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity::new("O(F (E log V))", "O(V + E)")
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "flow_limit" => {
                let limit = if value == "unbounded" {
                    Weight::MAX
                } else {
                    value
                        .parse::<Weight>()
                        .ok()
                        .filter(|limit| *limit >= 0)
                        .ok_or_else(|| {
                            AlgorithmError::invalid_parameter(
                                name,
                                "flow_limit must be a non-negative integer or \"unbounded\"",
                            )
                        })?
                };
                self.flow_limit = limit;
                Ok(())
            }
            "verify_certificates" => {
                self.config.verify_certificates = parse_bool_parameter(name, value)?;
                Ok(())
            }
            _ => Err(AlgorithmError::invalid_parameter(name, "unknown parameter")),
        }
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "flow_limit" if self.flow_limit == Weight::MAX => Some("unbounded".to_string()),
            "flow_limit" => Some(self.flow_limit.to_string()),
            "verify_certificates" => Some(self.config.verify_certificates.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        ["flow_limit", "verify_certificates"]
            .iter()
            .filter_map(|name| Some((name.to_string(), self.get_parameter(name)?)))
            .collect()
    }
}


/// Property-based testing against exhaustive enumeration of integral flows
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    const VERTICES: usize = 4;
    const SINK: usize = VERTICES - 1;

    fn normalise(edges: &[(u8, u8, u8, u8)]) -> Vec<(usize, usize, Weight, Weight)> {
        edges
            .iter()
            .map(|&(u, v, c, w)| {
                (
                    u as usize % VERTICES,
                    v as usize % VERTICES,
                    (c % 3) as Weight,
                    (w % 10) as Weight,
                )
            })
            .collect()
    }

    /// Minimum cost for every achievable flow value, indexed by value.
    fn brute_force(edges: &[(usize, usize, Weight, Weight)]) -> HashMap<Weight, Weight> {
        let mut best = HashMap::new();
        let mut flows = vec![0; edges.len()];
        loop {
            let mut excess = vec![0; VERTICES];
            let mut cost = 0;
            for (&(u, v, _, w), &f) in edges.iter().zip(&flows) {
                excess[u] -= f;
                excess[v] += f;
                cost += f * w;
            }
            if (1..SINK).all(|v| excess[v] == 0) {
                let value = -excess[0];
                let entry = best.entry(value).or_insert(cost);
                *entry = (*entry).min(cost);
            }

            // odometer over all capacity-respecting assignments
            let mut i = 0;
            while i < edges.len() && flows[i] == edges[i].2 {
                flows[i] = 0;
                i += 1;
            }
            if i == edges.len() {
                break;
            }
            flows[i] += 1;
        }
        best
    }

    quickcheck! {
        fn prop_min_cost_for_every_cap(edges: Vec<(u8, u8, u8, u8)>, cap: u8) -> TestResult {
            if edges.len() > 5 {
                return TestResult::discard();
            }
            let edges = normalise(&edges);
            let best = brute_force(&edges);
            let max_value = best.keys().copied().max().unwrap_or(0);
            let cap = (cap % 7) as Weight;

            let mut network = CostFlowNetwork::with_config(VERTICES, EngineConfig {
                verify_certificates: true,
                ..EngineConfig::default()
            });
            for &(u, v, c, w) in &edges {
                network.add_edge(u, v, c, w).unwrap();
            }
            let result = network.min_cost_max_flow(0, SINK, cap).unwrap();

            let expected_flow = cap.min(max_value);
            TestResult::from_bool(
                result.flow == expected_flow && Some(&result.cost) == best.get(&expected_flow)
            )
        }
    }
}

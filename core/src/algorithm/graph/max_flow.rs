//! Maximum Flow / Minimum Cut Implementation
//!
//! This module implements Dinic's blocking-flow algorithm over an in-place
//! residual graph, together with a capacity-scaling variant, minimum cut
//! extraction and decomposition of a flow into simple paths.
//!
//! Each phase layers the residual graph by breadth-first distance from the
//! source and then saturates the layered graph with repeated depth-first
//! augmentations. A per-vertex cursor remembers the first arc not yet known
//! to be useless in the current phase, so every arc is abandoned at most
//! once per phase; this is what bounds the number of phases by `O(V)`.
//!
//! Residual capacities are mutated in place. Solving twice on the same
//! network continues from the current residual state: the second call
//! returns only the additional flow it could route.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::parse_bool_parameter;
use crate::algorithm::{Algorithm, AlgorithmComplexity, AlgorithmError, NodeId, Weight};
use crate::config::{EngineConfig, MaxFlowStrategy};
use crate::data_structures::residual_graph::{EdgeHandle, ResidualEdge, ResidualGraph};
use crate::validation::correctness;

/// Level of a vertex that is not in play in the current phase
const UNLEVELED: i64 = -1;

/// Flow path representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPath {
    /// Path vertices, source first
    pub path: Vec<NodeId>,
    /// Flow amount along path
    pub flow: Weight,
}

/// Original arc crossing a minimum cut
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub capacity: Weight,
}

/// Flow algorithm performance metrics of the last solve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Number of level graphs built
    pub phases: usize,
    /// Number of augmenting paths pushed
    pub augmenting_paths: usize,
    /// Number of scaling thresholds visited
    pub scaling_rounds: usize,
    /// Flow routed by the last solve
    pub flow: Weight,
}

/// Flow network representation with residual graph
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    graph: ResidualGraph,
    config: EngineConfig,
    metrics: FlowMetrics,
}

/// Scratch state of one Dinic phase
struct Phase {
    level: Vec<i64>,
    cursor: Vec<usize>,
}

impl FlowNetwork {
    /// Create new flow network with specified vertex count
    pub fn new(vertex_count: usize) -> Self {
        Self::with_config(vertex_count, EngineConfig::default())
    }

    pub fn with_config(vertex_count: usize, config: EngineConfig) -> Self {
        Self {
            graph: ResidualGraph::new(vertex_count),
            config,
            metrics: FlowMetrics::default(),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Residual graph backing the network
    pub fn residual_graph(&self) -> &ResidualGraph {
        &self.graph
    }

    pub fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add directed arc with a zero-capacity reverse partner
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: Weight,
    ) -> Result<EdgeHandle, AlgorithmError> {
        self.graph.add_arc_pair(from, to, capacity, None, 0)
    }

    /// Add undirected edge as two full-capacity arcs, each the partner of
    /// the other
    pub fn add_undirected_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity: Weight,
    ) -> Result<EdgeHandle, AlgorithmError> {
        self.graph.add_arc_pair(from, to, capacity, Some(capacity), 0)
    }

    pub fn edge(&self, handle: EdgeHandle) -> Option<&ResidualEdge> {
        self.graph.edge(handle)
    }

    /// Flow currently carried by an arc added earlier
    pub fn edge_flow(&self, handle: EdgeHandle) -> Option<Weight> {
        self.graph.edge(handle).map(|edge| edge.flow)
    }

    /// All arcs as `(tail, arc)` pairs, reverse partners included
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, &ResidualEdge)> + '_ {
        self.graph.arcs()
    }

    /// Restores every arc to its original capacity with zero flow
    pub fn reset(&mut self) {
        self.graph.reset();
        self.metrics = FlowMetrics::default();
    }

    /// Solve with the configured strategy
    pub fn solve(&mut self, source: NodeId, sink: NodeId) -> Result<Weight, AlgorithmError> {
        match self.config.max_flow_strategy {
            MaxFlowStrategy::Dinic => self.max_flow(source, sink),
            MaxFlowStrategy::CapacityScaling => self.max_flow_scaling(source, sink),
        }
    }

    /// Maximum flow from `source` to `sink` with Dinic's algorithm
    pub fn max_flow(&mut self, source: NodeId, sink: NodeId) -> Result<Weight, AlgorithmError> {
        self.check_terminals(source, sink)?;
        self.metrics = FlowMetrics::default();
        let baseline = self.baseline();

        let flow = self.dinic(source, sink, 1);
        self.metrics.flow = flow;
        debug!(
            "dinic {} -> {}: flow {} in {} phases, {} augmenting paths",
            source, sink, flow, self.metrics.phases, self.metrics.augmenting_paths
        );

        self.verify(source, sink, baseline.as_deref())?;
        Ok(flow)
    }

    /// Maximum flow with capacity scaling: Dinic restricted to arcs whose
    /// residual capacity reaches a power-of-two threshold, halved every
    /// round down to one
    pub fn max_flow_scaling(
        &mut self,
        source: NodeId,
        sink: NodeId,
    ) -> Result<Weight, AlgorithmError> {
        self.check_terminals(source, sink)?;
        self.metrics = FlowMetrics::default();
        let baseline = self.baseline();

        let max_capacity = self.graph.max_original_capacity();
        let mut threshold: Weight = 1;
        while threshold <= max_capacity / 2 {
            threshold *= 2;
        }

        let mut flow = 0;
        while threshold >= 1 {
            let round_flow = self.dinic(source, sink, threshold);
            self.metrics.scaling_rounds += 1;
            debug!("scaling round threshold {}: flow {}", threshold, round_flow);
            flow += round_flow;
            threshold /= 2;
        }
        self.metrics.flow = flow;
        debug!(
            "capacity scaling {} -> {}: flow {} in {} rounds, {} phases",
            source, sink, flow, self.metrics.scaling_rounds, self.metrics.phases
        );

        self.verify(source, sink, baseline.as_deref())?;
        Ok(flow)
    }

    /// Vertices reachable from `source` over positive residual arcs. After
    /// a maximum flow this is the source side of a minimum cut.
    pub fn min_cut(&self, source: NodeId) -> Result<BTreeSet<NodeId>, AlgorithmError> {
        self.graph.check_node(source)?;
        let reachable = self.graph.reachable_from(source, 1);
        Ok(reachable
            .iter()
            .enumerate()
            .filter_map(|(node, &seen)| seen.then_some(node))
            .collect())
    }

    /// Original arcs leaving the source side of the cut; after a maximum
    /// flow their capacities sum to the flow value
    pub fn min_cut_edges(&self, source: NodeId) -> Result<Vec<CutEdge>, AlgorithmError> {
        self.graph.check_node(source)?;
        let reachable = self.graph.reachable_from(source, 1);
        Ok(self
            .graph
            .arcs()
            .filter(|(from, edge)| {
                reachable[*from] && !reachable[edge.to] && !edge.is_reverse
            })
            .map(|(from, edge)| CutEdge {
                from,
                to: edge.to,
                capacity: edge.original_capacity,
            })
            .collect())
    }

    /// Greedily peels simple paths carrying positive flow from `source` to
    /// `sink`. The flows of the returned paths sum to the net flow leaving
    /// `source`; flow circulating on cycles is not reported. The network is
    /// left untouched.
    pub fn flow_decomposition(
        &self,
        source: NodeId,
        sink: NodeId,
    ) -> Result<Vec<FlowPath>, AlgorithmError> {
        self.check_terminals(source, sink)?;

        let n = self.vertex_count();
        let mut remaining: Vec<Vec<Weight>> = (0..n)
            .map(|u| self.graph.edges(u).iter().map(|e| e.flow.max(0)).collect())
            .collect();
        let mut paths = Vec::new();

        loop {
            // Iterative DFS over positive-flow arcs; `via[v]` is the arc
            // (tail, slot) that discovered `v`.
            let mut via: Vec<Option<(NodeId, usize)>> = vec![None; n];
            let mut seen = vec![false; n];
            let mut stack = vec![source];
            seen[source] = true;

            while let Some(u) = stack.pop() {
                if u == sink {
                    break;
                }
                for (slot, edge) in self.graph.edges(u).iter().enumerate() {
                    if remaining[u][slot] > 0 && !seen[edge.to] {
                        seen[edge.to] = true;
                        via[edge.to] = Some((u, slot));
                        stack.push(edge.to);
                    }
                }
            }
            if !seen[sink] {
                break;
            }

            let mut arcs = Vec::new();
            let mut node = sink;
            while let Some((tail, slot)) = via[node] {
                arcs.push((tail, slot));
                node = tail;
            }
            arcs.reverse();

            let flow = arcs
                .iter()
                .map(|&(tail, slot)| remaining[tail][slot])
                .min()
                .unwrap_or(0);
            let mut path = Vec::with_capacity(arcs.len() + 1);
            path.push(source);
            for &(tail, slot) in &arcs {
                remaining[tail][slot] -= flow;
                path.push(self.graph.edges(tail)[slot].to);
            }
            trace!("decomposed path {:?} carrying {}", path, flow);
            paths.push(FlowPath { path, flow });
        }

        Ok(paths)
    }

    fn check_terminals(&self, source: NodeId, sink: NodeId) -> Result<(), AlgorithmError> {
        self.graph.check_node(source)?;
        self.graph.check_node(sink)?;
        if source == sink {
            return Err(AlgorithmError::InvalidGraph(format!(
                "source and sink are both vertex {source}"
            )));
        }
        Ok(())
    }

    /// Net outflows before a solve, taken only when certificates are checked
    fn baseline(&self) -> Option<Vec<Weight>> {
        self.config
            .verify_certificates
            .then(|| self.graph.net_outflows())
    }

    fn verify(
        &self,
        source: NodeId,
        sink: NodeId,
        baseline: Option<&[Weight]>,
    ) -> Result<(), AlgorithmError> {
        if let Some(baseline) = baseline {
            correctness::verify_flow_conservation(&self.graph, source, sink, baseline)?;
            correctness::verify_cut_duality(&self.graph, source, sink)?;
        }
        Ok(())
    }

    /// Runs Dinic phases over arcs with residual capacity `>= threshold`
    /// until the sink is no longer reachable through them.
    fn dinic(&mut self, source: NodeId, sink: NodeId, threshold: Weight) -> Weight {
        let mut flow = 0;
        loop {
            let Some(mut phase) = self.build_level_graph(source, sink, threshold) else {
                break;
            };
            self.metrics.phases += 1;

            let mut phase_flow = 0;
            loop {
                let pushed = self.augment(&mut phase, source, sink, threshold);
                if pushed == 0 {
                    break;
                }
                phase_flow += pushed;
            }
            trace!(
                "phase {}: level of sink {}, blocking flow {}",
                self.metrics.phases,
                phase.level[sink],
                phase_flow
            );
            flow += phase_flow;
        }
        flow
    }

    /// Breadth-first layering from `source`. Returns `None` when `sink`
    /// cannot be reached.
    fn build_level_graph(&self, source: NodeId, sink: NodeId, threshold: Weight) -> Option<Phase> {
        let n = self.vertex_count();
        let mut level = vec![UNLEVELED; n];
        let mut queue = VecDeque::new();
        level[source] = 0;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            // Nothing at or beyond the sink's layer can lead to it.
            if level[sink] != UNLEVELED && level[u] >= level[sink] {
                break;
            }
            for edge in self.graph.edges(u) {
                if edge.capacity >= threshold && level[edge.to] == UNLEVELED {
                    level[edge.to] = level[u] + 1;
                    queue.push_back(edge.to);
                }
            }
        }

        (level[sink] != UNLEVELED).then(|| Phase {
            level,
            cursor: vec![0; n],
        })
    }

    /// Finds one augmenting path in the level graph and pushes its
    /// bottleneck. Returns 0 once the phase's flow is blocking.
    fn augment(&mut self, phase: &mut Phase, source: NodeId, sink: NodeId, threshold: Weight) -> Weight {
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut u = source;

        loop {
            if u == sink {
                let bottleneck = path
                    .iter()
                    .map(|&(tail, slot)| self.graph.edges(tail)[slot].capacity)
                    .min()
                    .unwrap_or(0);
                for &(tail, slot) in &path {
                    self.graph.push(tail, slot, bottleneck);
                }
                self.metrics.augmenting_paths += 1;
                return bottleneck;
            }

            let edges = self.graph.edges(u);
            let mut next = None;
            while phase.cursor[u] < edges.len() {
                let edge = &edges[phase.cursor[u]];
                if edge.capacity >= threshold
                    && phase.level[edge.to] != UNLEVELED
                    && phase.level[u] < phase.level[edge.to]
                {
                    next = Some(edge.to);
                    break;
                }
                phase.cursor[u] += 1;
            }

            match next {
                Some(to) => {
                    path.push((u, phase.cursor[u]));
                    u = to;
                }
                None => {
                    // Dead end: drop the vertex from the phase and retreat.
                    phase.level[u] = UNLEVELED;
                    match path.pop() {
                        Some((tail, slot)) => {
                            debug_assert_eq!(phase.cursor[tail], slot);
                            phase.cursor[tail] += 1;
                            u = tail;
                        }
                        None => return 0,
                    }
                }
            }
        }
    }
}

impl Algorithm for FlowNetwork {
    fn name(&self) -> &'static str {
        match self.config.max_flow_strategy {
            MaxFlowStrategy::Dinic => "Dinic",
            MaxFlowStrategy::CapacityScaling => "Capacity Scaling Dinic",
        }
    }

    fn category(&self) -> &'static str {
        "max_flow"
    }

    fn description(&self) -> &'static str {
        "Maximum flow by level-graph blocking flows, with minimum cut extraction and path decomposition."
    }

    fn complexity(&self) -> AlgorithmComplexity {
        match self.config.max_flow_strategy {
            MaxFlowStrategy::Dinic => AlgorithmComplexity::new("O(V^2 E)", "O(V + E)"),
            MaxFlowStrategy::CapacityScaling => {
                AlgorithmComplexity::new("O(V E log U)", "O(V + E)")
            }
        }
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "strategy" => {
                self.config.max_flow_strategy = MaxFlowStrategy::parse(value)?;
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
            "strategy" => Some(self.config.max_flow_strategy.as_str().to_string()),
            "verify_certificates" => Some(self.config.verify_certificates.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        ["strategy", "verify_certificates"]
            .iter()
            .filter_map(|name| Some((name.to_string(), self.get_parameter(name)?)))
            .collect()
    }
}

//! Optimality certificate verification
//!
//! Every solver in the engine produces, besides its answer, enough state to
//! certify that answer: a residual graph certifies a maximum flow through
//! the cut it induces, vertex potentials certify a minimum-cost flow, dual
//! variables certify an assignment. The checks in this module re-derive
//! those certificates independently of the solvers. They are run after
//! every solve when `EngineConfig::verify_certificates` is set, and by the
//! test suites.

use crate::algorithm::graph::assignment::Assignment;
use crate::algorithm::{NodeId, Weight};
use crate::data_structures::residual_graph::ResidualGraph;

/// Certificate violations. Any of these indicates a solver bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("negative residual capacity on arc {from} -> {to}")]
    CapacityViolation { from: NodeId, to: NodeId },

    #[error("partner arcs of {from} -> {to} are inconsistent")]
    BrokenPairInvariant { from: NodeId, to: NodeId },

    #[error("flow not conserved at vertex {node}: net outflow {excess}")]
    ConservationViolation { node: NodeId, excess: Weight },

    #[error("an augmenting path from {origin} to {sink} remains")]
    AugmentingPathRemains { origin: NodeId, sink: NodeId },

    #[error("cut capacity {cut} differs from flow value {flow}")]
    CutMismatch { cut: Weight, flow: Weight },

    #[error("negative reduced cost {reduced} on residual arc {from} -> {to}")]
    NegativeReducedCost { from: NodeId, to: NodeId, reduced: Weight },

    #[error("assignment is not a permutation: {0}")]
    NotAPermutation(String),

    #[error("dual constraint violated at ({row}, {column}) by {excess}")]
    DualInfeasible { row: usize, column: usize, excess: Weight },

    #[error("complementary slackness violated at ({row}, {column})")]
    SlacknessViolation { row: usize, column: usize },

    #[error("reported cost {reported} differs from actual cost {actual}")]
    CostMismatch { reported: Weight, actual: Weight },

    #[error("matching is not symmetric at vertex {0}")]
    AsymmetricMatching(NodeId),

    #[error("matched pair ({0}, {1}) is not an edge")]
    NonEdgeMatched(NodeId, NodeId),

    #[error("edge ({0}, {1}) joins two unmatched vertices")]
    NotMaximal(NodeId, NodeId),
}

/// Checks residual capacities, partner consistency and conservation at
/// every vertex other than `source` and `sink`. `baseline` holds the net
/// outflows taken before the solve being checked, so flow routed by earlier
/// calls between other terminals is not reported.
pub fn verify_flow_conservation(
    graph: &ResidualGraph,
    source: NodeId,
    sink: NodeId,
    baseline: &[Weight],
) -> Result<(), VerificationError> {
    for (from, edge) in graph.arcs() {
        if edge.capacity < 0 {
            return Err(VerificationError::CapacityViolation { from, to: edge.to });
        }
        let partner = &graph.edges(edge.to)[edge.reverse];
        let consistent = partner.to == from
            && edge.flow == -partner.flow
            && edge.capacity + partner.capacity
                == edge.original_capacity + partner.original_capacity;
        if !consistent {
            return Err(VerificationError::BrokenPairInvariant { from, to: edge.to });
        }
    }

    for node in 0..graph.vertex_count() {
        if node == source || node == sink {
            continue;
        }
        let excess = graph.net_outflow(node) - baseline[node];
        if excess != 0 {
            return Err(VerificationError::ConservationViolation { node, excess });
        }
    }
    Ok(())
}

/// Checks that no residual `source -> sink` path remains and that the cut
/// induced by the residual reachability is saturated: its capacity equals
/// the net flow leaving the source side. Returns the cut capacity.
pub fn verify_cut_duality(
    graph: &ResidualGraph,
    source: NodeId,
    sink: NodeId,
) -> Result<Weight, VerificationError> {
    let reachable = graph.reachable_from(source, 1);
    if reachable[sink] {
        return Err(VerificationError::AugmentingPathRemains { origin: source, sink });
    }

    let cut: Weight = graph
        .arcs()
        .filter(|(from, edge)| reachable[*from] && !reachable[edge.to])
        .map(|(_, edge)| edge.original_capacity)
        .sum();
    let flow: Weight = (0..graph.vertex_count())
        .filter(|&node| reachable[node])
        .map(|node| graph.net_outflow(node))
        .sum();
    if cut != flow {
        return Err(VerificationError::CutMismatch { cut, flow });
    }
    Ok(cut)
}

/// Checks `cost + potential[u] - potential[v] >= 0` on every residual arc
/// whose tail is still reachable from `source`.
pub fn verify_reduced_costs(
    graph: &ResidualGraph,
    source: NodeId,
    potentials: &[Weight],
) -> Result<(), VerificationError> {
    let reachable = graph.reachable_from(source, 1);
    for (from, edge) in graph.arcs() {
        if edge.capacity <= 0 || !reachable[from] {
            continue;
        }
        let reduced = edge.cost + potentials[from] - potentials[edge.to];
        if reduced < 0 {
            return Err(VerificationError::NegativeReducedCost {
                from,
                to: edge.to,
                reduced,
            });
        }
    }
    Ok(())
}

/// Checks that the assignment is a permutation, that its reported cost is
/// its actual cost, and that the dual variables are feasible and tight on
/// matched pairs.
pub fn verify_assignment(
    cost: &[Vec<Weight>],
    assignment: &Assignment,
) -> Result<(), VerificationError> {
    let n = cost.len();
    if assignment.assignment.len() != n {
        return Err(VerificationError::NotAPermutation(format!(
            "{} rows assigned for a {n}x{n} matrix",
            assignment.assignment.len()
        )));
    }

    let mut used = vec![false; n];
    for (row, &column) in assignment.assignment.iter().enumerate() {
        if column >= n || used[column] {
            return Err(VerificationError::NotAPermutation(format!(
                "row {row} assigned to column {column}"
            )));
        }
        used[column] = true;
    }

    let actual: Weight = assignment
        .assignment
        .iter()
        .enumerate()
        .map(|(row, &column)| cost[row][column])
        .sum();
    if actual != assignment.cost {
        return Err(VerificationError::CostMismatch {
            reported: assignment.cost,
            actual,
        });
    }

    let u = &assignment.row_potentials;
    let v = &assignment.column_potentials;
    for row in 0..n {
        for column in 0..n {
            let slack = cost[row][column] - u[row] - v[column];
            if slack < 0 {
                return Err(VerificationError::DualInfeasible {
                    row,
                    column,
                    excess: -slack,
                });
            }
            if assignment.assignment[row] == column && slack != 0 {
                return Err(VerificationError::SlacknessViolation { row, column });
            }
        }
    }
    Ok(())
}

/// Checks symmetry of `mate`, that matched pairs are edges of the
/// (undirected) adjacency, and that the matching is at least maximal.
pub fn verify_matching(
    adjacency: &[Vec<NodeId>],
    mate: &[Option<NodeId>],
) -> Result<(), VerificationError> {
    let is_edge = |a: NodeId, b: NodeId| adjacency[a].contains(&b) || adjacency[b].contains(&a);

    for (v, partner) in mate.iter().enumerate() {
        if let Some(w) = *partner {
            if w == v || w >= mate.len() || mate[w] != Some(v) {
                return Err(VerificationError::AsymmetricMatching(v));
            }
            if !is_edge(v, w) {
                return Err(VerificationError::NonEdgeMatched(v, w));
            }
        }
    }

    for (v, neighbours) in adjacency.iter().enumerate() {
        for &w in neighbours {
            if w != v && mate[v].is_none() && mate[w].is_none() {
                return Err(VerificationError::NotMaximal(v, w));
            }
        }
    }
    Ok(())
}

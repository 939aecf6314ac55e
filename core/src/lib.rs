//! FLOWMATCH core
//!
//! Combinatorial optimization engine for flow and matching problems:
//!
//! - maximum flow and minimum cut ([`FlowNetwork`], Dinic with an optional
//!   capacity-scaling schedule, flow path decomposition)
//! - minimum-cost maximum flow ([`CostFlowNetwork`], successive shortest
//!   paths with vertex potentials)
//! - minimum-cost perfect bipartite matching ([`hungarian`])
//! - maximum-cardinality matching in general graphs ([`edmonds_blossom`])
//!
//! Vertices are dense indices `0..n`, capacities and costs are exact `i64`.
//! Every operation validates its input before mutating anything and fails
//! with [`AlgorithmError`] on out-of-range vertices.
//!
//! ```
//! use flowmatch_core::FlowNetwork;
//!
//! let mut network = FlowNetwork::new(4);
//! network.add_edge(0, 1, 40).unwrap();
//! network.add_edge(0, 2, 20).unwrap();
//! network.add_edge(1, 2, 10).unwrap();
//! network.add_edge(1, 3, 30).unwrap();
//! network.add_edge(2, 3, 20).unwrap();
//! assert_eq!(network.max_flow(0, 3).unwrap(), 50);
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod validation;

pub use crate::algorithm::{
    edmonds_blossom, hungarian, hungarian_maximize, Algorithm, AlgorithmComplexity,
    AlgorithmError, Assignment, BlossomMatcher, CostFlowNetwork, CutEdge, FlowMetrics,
    FlowNetwork, FlowPath, HungarianSolver, Matching, MinCostFlowResult, NodeId, Weight,
};
pub use crate::config::{EngineConfig, MaxFlowStrategy};
pub use crate::validation::VerificationError;

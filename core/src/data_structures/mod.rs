//! Data structures backing the solvers
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod residual_graph;
pub(crate) mod priority_queue;

pub use self::residual_graph::{EdgeHandle, ResidualEdge, ResidualGraph};

//! Core algorithm trait definitions for the flow and matching engine
//!
//! This module establishes the shared vocabulary of every solver in the
//! crate: dense vertex identifiers, the error type raised on invalid input,
//! complexity metadata and the string-parameter interface through which a
//! solver can be tuned at runtime.
//!
//! # Key Design Principles
//! - Every solver validates its input before mutating anything
//! - Exact integer arithmetic throughout
//! - Scratch state is allocated per call and dropped on return

use std::collections::HashMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::validation::correctness::VerificationError;

/// Dense vertex index in `0..n`. Mapping domain labels onto indices is the
/// caller's business.
pub type NodeId = usize;

/// Capacity, cost and flow values. All arithmetic is exact.
pub type Weight = i64;

/// Comprehensive error types for algorithm operations
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid node: {node} (vertex count {vertex_count})")]
    InvalidNode { node: NodeId, vertex_count: usize },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid graph state: {0}")]
    InvalidGraph(String),

    #[error("Certificate verification failed: {0}")]
    Verification(#[from] VerificationError),
}

impl AlgorithmError {
    /// Checks `node` against `vertex_count`.
    #[inline]
    pub fn check_node(node: NodeId, vertex_count: usize) -> Result<(), AlgorithmError> {
        if node < vertex_count {
            Ok(())
        } else {
            Err(AlgorithmError::InvalidNode { node, vertex_count })
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        AlgorithmError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Algorithm complexity information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmComplexity {
    pub time_complexity: String,
    pub space_complexity: String,
}

impl AlgorithmComplexity {
    pub fn new(time: &str, space: &str) -> Self {
        Self {
            time_complexity: time.to_string(),
            space_complexity: space.to_string(),
        }
    }
}

/// Main algorithm trait shared by every solver of the engine
///
/// # Invariants
/// - Parameters round-trip: a value accepted by `set_parameter` is returned
///   verbatim by `get_parameter`
/// - Rejected parameters leave the solver untouched
pub trait Algorithm: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g. max_flow, matching)
    fn category(&self) -> &'static str;

    /// Returns a short description of the method
    fn description(&self) -> &'static str;

    /// Returns the algorithm's asymptotic complexity
    fn complexity(&self) -> AlgorithmComplexity;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// All parameters with their current values
    fn get_parameters(&self) -> HashMap<String, String>;
}

/// Parses a boolean solver parameter.
pub(crate) fn parse_bool_parameter(name: &str, value: &str) -> Result<bool, AlgorithmError> {
    value.parse::<bool>().map_err(|_| {
        AlgorithmError::invalid_parameter(name, format!("expected true or false, got {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_node_bounds() {
        assert!(AlgorithmError::check_node(0, 1).is_ok());
        assert!(AlgorithmError::check_node(3, 4).is_ok());

        match AlgorithmError::check_node(4, 4) {
            Err(AlgorithmError::InvalidNode { node, vertex_count }) => {
                assert_eq!(node, 4);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = AlgorithmError::InvalidNode { node: 7, vertex_count: 3 };
        assert_eq!(err.to_string(), "Invalid node: 7 (vertex count 3)");

        let err = AlgorithmError::invalid_parameter("strategy", "unknown value");
        assert_eq!(err.to_string(), "Invalid parameter: strategy - unknown value");
    }

    #[test]
    fn test_parse_bool_parameter() {
        assert!(parse_bool_parameter("flag", "true").unwrap());
        assert!(!parse_bool_parameter("flag", "false").unwrap());
        assert!(parse_bool_parameter("flag", "yes").is_err());
    }
}

//! Engine configuration
//!
//! A single serde-backed record shared by every solver. Solvers copy the
//! configuration they are built with; string parameters set through
//! [`Algorithm::set_parameter`](crate::algorithm::Algorithm::set_parameter)
//! override the copied values afterwards.

use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmError, Weight};

/// Sentinel standing in for an unreachable distance. Costs and capacities
/// are expected to stay well below it.
pub const INFINITY: Weight = 1 << 60;

/// Maximum flow strategy selected by `FlowNetwork::solve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFlowStrategy {
    /// Dinic's level-graph blocking flow
    #[default]
    Dinic,
    /// Dinic restricted to edges above a halving power-of-two threshold
    CapacityScaling,
}

impl MaxFlowStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaxFlowStrategy::Dinic => "dinic",
            MaxFlowStrategy::CapacityScaling => "capacity_scaling",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AlgorithmError> {
        match value {
            "dinic" => Ok(MaxFlowStrategy::Dinic),
            "capacity_scaling" => Ok(MaxFlowStrategy::CapacityScaling),
            other => Err(AlgorithmError::invalid_parameter(
                "strategy",
                format!("expected dinic or capacity_scaling, got {other:?}"),
            )),
        }
    }
}

/// Configuration shared by all solvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Strategy used by `FlowNetwork::solve`
    pub max_flow_strategy: MaxFlowStrategy,
    /// Run the optimality certificate checks after every solve
    pub verify_certificates: bool,
    /// Seed the blossom search with a greedy matching
    pub greedy_matching_init: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_flow_strategy: MaxFlowStrategy::Dinic,
            verify_certificates: cfg!(debug_assertions),
            greedy_matching_init: true,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing fields take their defaults, unknown
    /// fields are rejected.
    pub fn from_json_str(json: &str) -> Result<Self, AlgorithmError> {
        serde_json::from_str(json)
            .map_err(|e| AlgorithmError::invalid_parameter("config", e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, AlgorithmError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AlgorithmError::invalid_parameter("config", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_flow_strategy, MaxFlowStrategy::Dinic);
        assert!(config.greedy_matching_init);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "max_flow_strategy": "capacity_scaling" }"#).unwrap();
        assert_eq!(config.max_flow_strategy, MaxFlowStrategy::CapacityScaling);
        assert!(config.greedy_matching_init);
    }

    #[test]
    fn test_json_round_trip_and_rejections() {
        let mut config = EngineConfig::default();
        config.verify_certificates = true;
        config.greedy_matching_init = false;
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);

        assert!(EngineConfig::from_json_str(r#"{ "infinity": 100 }"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{ "max_flow_strategy": "push_relabel" }"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "infinity": 100, "verify_certificates": true }"#)
            .unwrap_err();
        assert!(matches!(err, AlgorithmError::InvalidParameter { ref name, .. } if name == "config"));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(MaxFlowStrategy::parse("dinic").unwrap(), MaxFlowStrategy::Dinic);
        assert_eq!(
            MaxFlowStrategy::parse(MaxFlowStrategy::CapacityScaling.as_str()).unwrap(),
            MaxFlowStrategy::CapacityScaling
        );
        assert!(MaxFlowStrategy::parse("edmonds_karp").is_err());
    }
}

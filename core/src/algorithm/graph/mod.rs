//! Flow and matching algorithms on graphs
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod max_flow;
pub mod min_cost_flow;
pub mod assignment;
pub mod matching;

pub use self::max_flow::{CutEdge, FlowMetrics, FlowNetwork, FlowPath};
pub use self::min_cost_flow::{CostFlowMetrics, CostFlowNetwork, MinCostFlowResult};
pub use self::assignment::{hungarian, hungarian_maximize, Assignment, AssignmentMetrics, HungarianSolver};
pub use self::matching::{edmonds_blossom, BlossomMatcher, Matching, MatchingStatistics};

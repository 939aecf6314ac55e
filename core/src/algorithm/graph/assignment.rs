//! Minimum-Cost Perfect Matching (Hungarian / Kuhn–Munkres)
//!
//! Primal-dual method on a dense square cost matrix. Rows are inserted one
//! at a time; for each new row an alternating tree is grown over columns by
//! relaxing the slack `cost[i][j] - u[i] - v[j]`. Whenever the tree cannot
//! grow along a tight edge, the potentials of the tree move by the minimum
//! slack, which keeps `u[i] + v[j] <= cost[i][j]` everywhere and equality on
//! every matched pair. Reaching a free column flips the tree path. Each row
//! costs `O(n^2)`, the whole method `O(n^3)`.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::parse_bool_parameter;
use crate::algorithm::{Algorithm, AlgorithmComplexity, AlgorithmError, Weight};
use crate::config::{EngineConfig, INFINITY};
use crate::validation::correctness;

/// Optimal assignment with its dual certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Total cost of the assignment
    pub cost: Weight,
    /// Column assigned to every row
    pub assignment: Vec<usize>,
    /// Row duals `u`
    pub row_potentials: Vec<Weight>,
    /// Column duals `v`
    pub column_potentials: Vec<Weight>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentMetrics {
    /// Number of dual updates across all rows
    pub dual_updates: usize,
    /// Number of augmenting path flips, one per row
    pub augmentations: usize,
}

/// Minimum-cost assignment with the engine's default configuration
pub fn hungarian(cost: &[Vec<Weight>]) -> Result<Assignment, AlgorithmError> {
    HungarianSolver::new().solve(cost)
}

/// Maximum-profit assignment with the engine's default configuration
pub fn hungarian_maximize(profit: &[Vec<Weight>]) -> Result<Assignment, AlgorithmError> {
    HungarianSolver::new().solve_maximize(profit)
}

#[derive(Debug, Clone, Default)]
pub struct HungarianSolver {
    config: EngineConfig,
    metrics: AssignmentMetrics,
}

impl HungarianSolver {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: AssignmentMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &AssignmentMetrics {
        &self.metrics
    }

    /// Minimum-cost perfect matching of rows onto columns
    pub fn solve(&mut self, cost: &[Vec<Weight>]) -> Result<Assignment, AlgorithmError> {
        check_square(cost)?;
        let assignment = self.primal_dual(cost);
        if self.config.verify_certificates {
            correctness::verify_assignment(cost, &assignment)?;
        }
        Ok(assignment)
    }

    /// Maximum-profit perfect matching. The returned duals certify the
    /// maximisation: `u[i] + v[j] >= profit[i][j]`, with equality on
    /// assigned pairs.
    pub fn solve_maximize(&mut self, profit: &[Vec<Weight>]) -> Result<Assignment, AlgorithmError> {
        let negated: Vec<Vec<Weight>> = profit
            .iter()
            .map(|row| row.iter().map(|&p| -p).collect())
            .collect();
        let solved = self.solve(&negated)?;
        Ok(Assignment {
            cost: -solved.cost,
            assignment: solved.assignment,
            row_potentials: solved.row_potentials.into_iter().map(|u| -u).collect(),
            column_potentials: solved.column_potentials.into_iter().map(|v| -v).collect(),
        })
    }

    fn primal_dual(&mut self, cost: &[Vec<Weight>]) -> Assignment {
        self.metrics = AssignmentMetrics::default();
        let n = cost.len();

        // Index 0 is a virtual column holding the row being inserted;
        // real rows and columns are 1-based.
        let mut u = vec![0; n + 1];
        let mut v = vec![0; n + 1];
        let mut owner = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            owner[0] = row;
            let mut column = 0;
            let mut min_slack = vec![INFINITY; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[column] = true;
                let tree_row = owner[column];
                let mut delta = INFINITY;
                let mut next_column = 0;

                for j in 1..=n {
                    if used[j] {
                        continue;
                    }
                    let slack = cost[tree_row - 1][j - 1] - u[tree_row] - v[j];
                    if slack < min_slack[j] {
                        min_slack[j] = slack;
                        way[j] = column;
                    }
                    if min_slack[j] < delta {
                        delta = min_slack[j];
                        next_column = j;
                    }
                }

                for j in 0..=n {
                    if used[j] {
                        u[owner[j]] += delta;
                        v[j] -= delta;
                    } else {
                        min_slack[j] -= delta;
                    }
                }
                self.metrics.dual_updates += 1;

                column = next_column;
                if owner[column] == 0 {
                    break;
                }
            }

            // Flip the alternating path back to the virtual column.
            while column != 0 {
                let previous = way[column];
                owner[column] = owner[previous];
                column = previous;
            }
            self.metrics.augmentations += 1;
            trace!("row {} inserted, dual objective {}", row, -v[0]);
        }

        let mut assignment = vec![0; n];
        for j in 1..=n {
            assignment[owner[j] - 1] = j - 1;
        }
        let total: Weight = assignment
            .iter()
            .enumerate()
            .map(|(row, &column)| cost[row][column])
            .sum();
        debug!(
            "hungarian {}x{}: cost {}, {} dual updates",
            n, n, total, self.metrics.dual_updates
        );

        Assignment {
            cost: total,
            assignment,
            row_potentials: u[1..].to_vec(),
            column_potentials: v[1..].to_vec(),
        }
    }
}

fn check_square(cost: &[Vec<Weight>]) -> Result<(), AlgorithmError> {
    let n = cost.len();
    match cost.iter().position(|row| row.len() != n) {
        Some(row) => Err(AlgorithmError::InvalidGraph(format!(
            "cost matrix must be square: row {row} has {} entries, expected {n}",
            cost[row].len()
        ))),
        None => Ok(()),
    }
}

impl Algorithm for HungarianSolver {
    fn name(&self) -> &'static str {
        "Hungarian"
    }

    fn category(&self) -> &'static str {
        "assignment"
    }

    fn description(&self) -> &'static str {
        "Kuhn-Munkres primal-dual method for minimum-cost perfect bipartite matching."
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity::new("O(n^3)", "O(n)")
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "verify_certificates" => {
                self.config.verify_certificates = parse_bool_parameter(name, value)?;
                Ok(())
            }
            _ => Err(AlgorithmError::invalid_parameter(name, "unknown parameter")),
        }
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "verify_certificates" => Some(self.config.verify_certificates.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        HashMap::from([(
            "verify_certificates".to_string(),
            self.config.verify_certificates.to_string(),
        )])
    }
}


/// Property-based testing against brute-force permutation search
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    fn brute_force(cost: &[Vec<Weight>]) -> Weight {
        fn search(cost: &[Vec<Weight>], row: usize, used: &mut Vec<bool>) -> Weight {
            if row == cost.len() {
                return 0;
            }
            let mut best = Weight::MAX;
            for column in 0..cost.len() {
                if !used[column] {
                    used[column] = true;
                    best = best.min(cost[row][column] + search(cost, row + 1, used));
                    used[column] = false;
                }
            }
            best
        }
        search(cost, 0, &mut vec![false; cost.len()])
    }

    quickcheck! {
        fn prop_hungarian_is_optimal(size: u8, values: Vec<i16>) -> TestResult {
            if values.is_empty() {
                return TestResult::discard();
            }
            let n = (size % 6) as usize + 1;
            let cost: Vec<Vec<Weight>> = (0..n)
                .map(|i| (0..n).map(|j| values[(i * n + j) % values.len()] as Weight).collect())
                .collect();

            let mut solver = HungarianSolver::with_config(EngineConfig {
                verify_certificates: true,
                ..EngineConfig::default()
            });
            let result = solver.solve(&cost).unwrap();
            TestResult::from_bool(result.cost == brute_force(&cost))
        }
    }
}

//! Maximum Matching in General Graphs
//!
//! Edmonds' blossom algorithm for maximum-cardinality matching. For every
//! vertex left unmatched, an alternating breadth-first tree is grown from
//! it. When an edge closes an odd cycle between two even vertices of the
//! tree, the cycle (a blossom) is contracted by pointing the `base` of each
//! of its vertices at the cycle's lowest common ancestor; the search then
//! continues as if the blossom were one vertex. Reaching a free vertex
//! flips the alternating path back to the root.
//!
//! Contraction never rewrites the graph: `base` is a flat representative
//! array, and `parent` links inside a blossom are rewired so that the path
//! through it can still be unfolded during augmentation.
//!
//! Complexity: `O(V^3)`.

use std::collections::{HashMap, VecDeque};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::parse_bool_parameter;
use crate::algorithm::{Algorithm, AlgorithmComplexity, AlgorithmError, NodeId};
use crate::config::EngineConfig;
use crate::validation::correctness;

/// Maximum matching, `mate[v]` is the partner of `v`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    pub mate: Vec<Option<NodeId>>,
}

impl Matching {
    /// Number of matched pairs
    pub fn size(&self) -> usize {
        self.mate.iter().filter(|m| m.is_some()).count() / 2
    }

    pub fn partner(&self, node: NodeId) -> Option<NodeId> {
        self.mate.get(node).copied().flatten()
    }

    /// Matched pairs `(u, v)` with `u < v`
    pub fn pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.mate
            .iter()
            .enumerate()
            .filter_map(|(u, m)| m.filter(|&v| u < v).map(|v| (u, v)))
            .collect()
    }
}

/// Statistical analysis of the last matching search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingStatistics {
    /// Pairs matched by the greedy initialisation
    pub greedy_pairs: usize,
    /// Alternating tree searches started
    pub searches: usize,
    /// Augmenting paths flipped
    pub augmentations: usize,
    /// Blossoms contracted across all searches
    pub blossoms_contracted: usize,
}

/// Maximum matching with the engine's default configuration. `adjacency`
/// is read as undirected: listing an edge on one endpoint is enough.
pub fn edmonds_blossom(n: usize, adjacency: &[Vec<NodeId>]) -> Result<Matching, AlgorithmError> {
    BlossomMatcher::new().solve(n, adjacency)
}

#[derive(Debug, Clone, Default)]
pub struct BlossomMatcher {
    config: EngineConfig,
    statistics: MatchingStatistics,
}

impl BlossomMatcher {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            statistics: MatchingStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &MatchingStatistics {
        &self.statistics
    }

    pub fn solve(&mut self, n: usize, adjacency: &[Vec<NodeId>]) -> Result<Matching, AlgorithmError> {
        let graph = undirected(n, adjacency)?;
        self.statistics = MatchingStatistics::default();

        let mut search = BlossomSearch::new(&graph);
        if self.config.greedy_matching_init {
            self.statistics.greedy_pairs = search.greedy();
        }

        for root in 0..n {
            if search.mate[root].is_some() {
                continue;
            }
            self.statistics.searches += 1;
            if let Some(free) = search.find_augmenting_path(root) {
                search.augment(free);
                self.statistics.augmentations += 1;
                trace!("augmenting path from {} to {}", root, free);
            }
        }
        self.statistics.blossoms_contracted = search.blossoms_contracted;

        let matching = Matching { mate: search.mate };
        debug!(
            "blossom matching on {} vertices: {} pairs, {} blossoms, {} greedy pairs",
            n,
            matching.size(),
            self.statistics.blossoms_contracted,
            self.statistics.greedy_pairs
        );

        if self.config.verify_certificates {
            correctness::verify_matching(adjacency, &matching.mate)?;
        }
        Ok(matching)
    }
}

/// Validates `adjacency` and returns its symmetric closure without self loops.
fn undirected(n: usize, adjacency: &[Vec<NodeId>]) -> Result<Vec<Vec<NodeId>>, AlgorithmError> {
    if adjacency.len() != n {
        return Err(AlgorithmError::InvalidGraph(format!(
            "adjacency lists {} vertices, expected {n}",
            adjacency.len()
        )));
    }
    let mut graph = vec![Vec::new(); n];
    for (u, neighbours) in adjacency.iter().enumerate() {
        for &v in neighbours {
            AlgorithmError::check_node(v, n)?;
            if u != v {
                graph[u].push(v);
                graph[v].push(u);
            }
        }
    }
    for neighbours in &mut graph {
        neighbours.sort_unstable();
        neighbours.dedup();
    }
    Ok(graph)
}

/// Scratch state shared by the per-root searches
struct BlossomSearch<'g> {
    graph: &'g [Vec<NodeId>],
    mate: Vec<Option<NodeId>>,
    /// Alternating-tree parent of odd vertices
    parent: Vec<Option<NodeId>>,
    /// Blossom representative
    base: Vec<NodeId>,
    /// Even vertices of the current tree
    even: Vec<bool>,
    /// Bases swallowed by the blossom being contracted
    in_blossom: Vec<bool>,
    queue: VecDeque<NodeId>,
    blossoms_contracted: usize,
}

impl<'g> BlossomSearch<'g> {
    fn new(graph: &'g [Vec<NodeId>]) -> Self {
        let n = graph.len();
        Self {
            graph,
            mate: vec![None; n],
            parent: vec![None; n],
            base: (0..n).collect(),
            even: vec![false; n],
            in_blossom: vec![false; n],
            queue: VecDeque::new(),
            blossoms_contracted: 0,
        }
    }

    fn greedy(&mut self) -> usize {
        let graph = self.graph;
        let mut pairs = 0;
        for u in 0..graph.len() {
            if self.mate[u].is_some() {
                continue;
            }
            if let Some(&v) = graph[u].iter().find(|&&v| self.mate[v].is_none()) {
                self.mate[u] = Some(v);
                self.mate[v] = Some(u);
                pairs += 1;
            }
        }
        pairs
    }

    /// Grows an alternating tree from `root`; returns the free vertex that
    /// ends an augmenting path, if any.
    fn find_augmenting_path(&mut self, root: NodeId) -> Option<NodeId> {
        let graph = self.graph;
        let n = graph.len();
        self.parent.fill(None);
        self.even.fill(false);
        for (v, base) in self.base.iter_mut().enumerate() {
            *base = v;
        }
        self.queue.clear();

        self.even[root] = true;
        self.queue.push_back(root);

        while let Some(v) = self.queue.pop_front() {
            for &to in &graph[v] {
                if self.base[v] == self.base[to] || self.mate[v] == Some(to) {
                    continue;
                }

                let to_is_even =
                    to == root || self.mate[to].is_some_and(|m| self.parent[m].is_some());
                if to_is_even {
                    let lca = self.lowest_common_ancestor(v, to);
                    self.in_blossom.fill(false);
                    self.mark_path(v, lca, to);
                    self.mark_path(to, lca, v);
                    for i in 0..n {
                        if self.in_blossom[self.base[i]] {
                            self.base[i] = lca;
                            if !self.even[i] {
                                self.even[i] = true;
                                self.queue.push_back(i);
                            }
                        }
                    }
                    self.blossoms_contracted += 1;
                    trace!("contracted blossom through {} - {} at base {}", v, to, lca);
                } else if self.parent[to].is_none() {
                    self.parent[to] = Some(v);
                    match self.mate[to] {
                        None => return Some(to),
                        Some(next) => {
                            self.even[next] = true;
                            self.queue.push_back(next);
                        }
                    }
                }
            }
        }
        None
    }

    /// Base of the deepest blossom containing both `a` and `b`, found by
    /// walking both towards the root along matched and parent links.
    fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let mut on_path = vec![false; self.graph.len()];

        let mut a = a;
        loop {
            a = self.base[a];
            on_path[a] = true;
            match self.mate[a].and_then(|m| self.parent[m]) {
                Some(next) => a = next,
                None => break,
            }
        }

        let mut b = b;
        loop {
            b = self.base[b];
            if on_path[b] {
                return b;
            }
            match self.mate[b].and_then(|m| self.parent[m]) {
                Some(next) => b = next,
                None => return b,
            }
        }
    }

    /// Marks the bases on the path from `v` up to `blossom_base` and points
    /// the odd vertices on it back across the closing edge.
    fn mark_path(&mut self, mut v: NodeId, blossom_base: NodeId, mut child: NodeId) {
        while self.base[v] != blossom_base {
            let Some(m) = self.mate[v] else {
                break;
            };
            self.in_blossom[self.base[v]] = true;
            self.in_blossom[self.base[m]] = true;
            self.parent[v] = Some(child);
            child = m;
            match self.parent[m] {
                Some(next) => v = next,
                None => break,
            }
        }
    }

    /// Flips the alternating path ending at the free vertex `v`.
    fn augment(&mut self, mut v: NodeId) {
        while let Some(pv) = self.parent[v] {
            let next = self.mate[pv];
            self.mate[v] = Some(pv);
            self.mate[pv] = Some(v);
            match next {
                Some(ppv) => v = ppv,
                None => break,
            }
        }
    }
}

impl Algorithm for BlossomMatcher {
    fn name(&self) -> &'static str {
        "Edmonds Blossom"
    }

    fn category(&self) -> &'static str {
        "matching"
    }

    fn description(&self) -> &'static str {
        "Maximum-cardinality matching in general graphs by alternating search with blossom contraction."
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity::new("O(V^3)", "O(V + E)")
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "greedy_init" => {
                self.config.greedy_matching_init = parse_bool_parameter(name, value)?;
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
            "greedy_init" => Some(self.config.greedy_matching_init.to_string()),
            "verify_certificates" => Some(self.config.verify_certificates.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        ["greedy_init", "verify_certificates"]
            .iter()
            .filter_map(|name| Some((name.to_string(), self.get_parameter(name)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn matcher(greedy: bool) -> BlossomMatcher {
        BlossomMatcher::with_config(EngineConfig {
            verify_certificates: true,
            greedy_matching_init: greedy,
            ..EngineConfig::default()
        })
    }

    fn adjacency(n: usize, edges: &[(NodeId, NodeId)]) -> Vec<Vec<NodeId>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in edges {
            adjacency[u].push(v);
        }
        adjacency
    }

    #[test]
    fn test_triangle() {
        init_logging();
        let graph = adjacency(3, &[(0, 1), (1, 2), (2, 0)]);
        let mut matcher = matcher(false);
        let matching = matcher.solve(3, &graph).unwrap();
        assert_eq!(matching.size(), 1);
        assert!(matcher.statistics().blossoms_contracted >= 1);
    }

    #[test]
    fn test_five_cycle() {
        let graph = adjacency(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        for greedy in [false, true] {
            let matching = matcher(greedy).solve(5, &graph).unwrap();
            assert_eq!(matching.size(), 2);
            assert_eq!(matching.mate.iter().filter(|m| m.is_none()).count(), 1);
        }
    }

    #[test]
    fn test_blossom_with_stem_and_tail() {
        // Odd cycle 1-2-3-4-5 with stems 0-1 and 3-6, 6-7: perfect matching
        // of size 4 needs the path through the contracted cycle.
        let graph = adjacency(
            8,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 1), (3, 6), (6, 7)],
        );
        for greedy in [false, true] {
            let matching = matcher(greedy).solve(8, &graph).unwrap();
            assert_eq!(matching.size(), 4);
            assert!(matching.mate.iter().all(Option::is_some));
        }
    }

    #[test]
    fn test_petersen_graph_has_perfect_matching() {
        let mut edges = Vec::new();
        for i in 0..5 {
            edges.push((i, (i + 1) % 5));
            edges.push((i, i + 5));
            edges.push((i + 5, (i + 2) % 5 + 5));
        }
        let graph = adjacency(10, &edges);
        let matching = matcher(false).solve(10, &graph).unwrap();
        assert_eq!(matching.size(), 5);
    }

    #[test]
    fn test_matching_accessors() {
        let graph = adjacency(4, &[(0, 1), (2, 3)]);
        let matching = edmonds_blossom(4, &graph).unwrap();
        assert_eq!(matching.pairs(), vec![(0, 1), (2, 3)]);
        assert_eq!(matching.partner(3), Some(2));
        assert_eq!(matching.partner(9), None);
    }

    #[test]
    fn test_isolated_vertices_and_self_loops() {
        let graph = vec![vec![0], vec![], vec![]];
        let matching = matcher(true).solve(3, &graph).unwrap();
        assert_eq!(matching.mate, vec![None, None, None]);

        let empty = edmonds_blossom(0, &[]).unwrap();
        assert_eq!(empty.size(), 0);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            edmonds_blossom(2, &[vec![2], vec![]]),
            Err(AlgorithmError::InvalidNode { node: 2, vertex_count: 2 })
        ));
        assert!(matches!(
            edmonds_blossom(3, &[vec![1], vec![0]]),
            Err(AlgorithmError::InvalidGraph(_))
        ));
    }

    #[test]
    fn test_parameters() {
        let mut matcher = BlossomMatcher::new();
        matcher.set_parameter("greedy_init", "false").unwrap();
        assert_eq!(matcher.get_parameter("greedy_init").as_deref(), Some("false"));
        assert!(matcher.set_parameter("greedy_init", "sometimes").is_err());
        assert!(matcher.set_parameter("weighted", "true").is_err());
        assert_eq!(matcher.get_parameters().len(), 2);
        assert_eq!(matcher.category(), "matching");
    }
}

/// Property-based testing against brute-force edge subset search
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    const VERTICES: usize = 8;

    fn brute_force(edges: &[(NodeId, NodeId)], index: usize, used: &mut [bool]) -> usize {
        if index == edges.len() {
            return 0;
        }
        let skip = brute_force(edges, index + 1, used);
        let (u, v) = edges[index];
        if u == v || used[u] || used[v] {
            return skip;
        }
        used[u] = true;
        used[v] = true;
        let take = 1 + brute_force(edges, index + 1, used);
        used[u] = false;
        used[v] = false;
        skip.max(take)
    }

    quickcheck! {
        fn prop_blossom_is_maximum(raw: Vec<(u8, u8)>, greedy: bool) -> TestResult {
            if raw.len() > 14 {
                return TestResult::discard();
            }
            let edges: Vec<(NodeId, NodeId)> = raw
                .iter()
                .map(|&(u, v)| (u as usize % VERTICES, v as usize % VERTICES))
                .collect();
            let mut adjacency = vec![Vec::new(); VERTICES];
            for &(u, v) in &edges {
                adjacency[u].push(v);
            }

            let mut matcher = BlossomMatcher::with_config(EngineConfig {
                verify_certificates: true,
                greedy_matching_init: greedy,
                ..EngineConfig::default()
            });
            let matching = matcher.solve(VERTICES, &adjacency).unwrap();
            let expected = brute_force(&edges, 0, &mut [false; VERTICES]);
            TestResult::from_bool(matching.size() == expected)
        }
    }
}

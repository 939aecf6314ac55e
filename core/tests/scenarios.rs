//! End-to-end scenarios through the public API

use std::collections::BTreeSet;

use flowmatch_core::{
    edmonds_blossom, hungarian, Algorithm, AlgorithmError, CostFlowNetwork, EngineConfig,
    FlowNetwork, MaxFlowStrategy, MinCostFlowResult, Weight,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn checked_config() -> EngineConfig {
    EngineConfig {
        verify_certificates: true,
        ..EngineConfig::default()
    }
}

#[test]
fn max_flow_scenarios() {
    init_logging();
    let mut network = FlowNetwork::with_config(4, checked_config());
    for (u, v, c) in [(0, 1, 40), (0, 2, 20), (1, 2, 10), (1, 3, 30), (2, 3, 20)] {
        network.add_edge(u, v, c).unwrap();
    }
    assert_eq!(network.max_flow(0, 3).unwrap(), 50);
    let cut: Weight = network.min_cut_edges(0).unwrap().iter().map(|e| e.capacity).sum();
    assert_eq!(cut, 50);

    let (s, a, b, c, d) = (0, 1, 2, 3, 4);
    let mut network = FlowNetwork::with_config(5, checked_config());
    for (u, v, cap) in [(s, a, 10), (s, c, 10), (a, b, 4), (a, c, 2), (a, d, 8), (b, d, 10), (c, d, 9)] {
        network.add_edge(u, v, cap).unwrap();
    }
    assert_eq!(network.max_flow(s, d).unwrap(), 19);

    let cut = network.min_cut(s).unwrap();
    let crossing: Weight = network
        .min_cut_edges(s)
        .unwrap()
        .iter()
        .map(|edge| edge.capacity)
        .sum();
    assert_eq!(crossing, 19);
    assert!(cut.contains(&s) && !cut.contains(&d));

    let paths = network.flow_decomposition(s, d).unwrap();
    assert_eq!(paths.iter().map(|p| p.flow).sum::<Weight>(), 19);
}

#[test]
fn configured_scaling_strategy() {
    let config = EngineConfig::from_json_str(
        r#"{ "max_flow_strategy": "capacity_scaling", "verify_certificates": true }"#,
    )
    .unwrap();
    assert_eq!(config.max_flow_strategy, MaxFlowStrategy::CapacityScaling);

    let mut network = FlowNetwork::with_config(4, config);
    network.add_edge(0, 1, 1000).unwrap();
    network.add_edge(0, 2, 1000).unwrap();
    network.add_edge(1, 2, 1).unwrap();
    network.add_edge(1, 3, 1000).unwrap();
    network.add_edge(2, 3, 1000).unwrap();
    assert_eq!(network.solve(0, 3).unwrap(), 2000);
    assert_eq!(network.get_parameter("strategy").as_deref(), Some("capacity_scaling"));
}

#[test]
fn min_cost_flow_scenario() {
    // Transport problem: two suppliers (1, 2), two consumers (3, 4).
    let mut network = CostFlowNetwork::with_config(6, checked_config());
    network.add_edge(0, 1, 3, 0).unwrap();
    network.add_edge(0, 2, 2, 0).unwrap();
    network.add_edge(1, 3, 2, 4).unwrap();
    network.add_edge(1, 4, 2, 6).unwrap();
    network.add_edge(2, 3, 2, 5).unwrap();
    network.add_edge(2, 4, 2, 3).unwrap();
    network.add_edge(3, 5, 2, 0).unwrap();
    network.add_edge(4, 5, 3, 0).unwrap();

    let result = network.min_cost_flow(0, 5).unwrap();
    // 1->3 x2 (8), 2->4 x2 (6), 1->4 x1 (6)
    assert_eq!(result, MinCostFlowResult { flow: 5, cost: 20 });
}

#[test]
fn assignment_scenario() {
    let result = hungarian(&[vec![1, 2], vec![2, 1]]).unwrap();
    assert_eq!(result.cost, 2);
    let columns: BTreeSet<_> = result.assignment.iter().collect();
    assert_eq!(columns.len(), 2);
}

#[test]
fn blossom_scenarios() {
    let triangle = vec![vec![1], vec![2], vec![0]];
    assert_eq!(edmonds_blossom(3, &triangle).unwrap().size(), 1);

    let pentagon = vec![vec![1], vec![2], vec![3], vec![4], vec![0]];
    let matching = edmonds_blossom(5, &pentagon).unwrap();
    assert_eq!(matching.size(), 2);
    for (v, partner) in matching.mate.iter().enumerate() {
        if let Some(w) = partner {
            assert_eq!(matching.mate[*w], Some(v));
        }
    }
}

#[test]
fn invalid_vertices_fail_fast() {
    let mut network = FlowNetwork::new(2);
    assert!(matches!(
        network.add_undirected_edge(0, 2, 1),
        Err(AlgorithmError::InvalidNode { node: 2, vertex_count: 2 })
    ));
    assert_eq!(network.edges().count(), 0);

    let mut costs = CostFlowNetwork::new(2);
    assert!(costs.add_edge(3, 0, 1, 1).is_err());
    assert!(edmonds_blossom(1, &[vec![5]]).is_err());
}

//! Property tests for count/delta bookkeeping
//!
//! For any graph, seed and rate table, each iteration's counts must equal
//! the previous counts plus the reported deltas, and the node total never
//! changes.

use proptest::prelude::*;

use netcascade::compartment::{Compartment, CountDown, NodeStochastic};
use netcascade::{EngineConfig, InitialStatus, Model, Network, NodeId};

fn build(edges: &[(u64, u64)], n: u64, beta: f64, gamma: f64, seed: u64) -> Model {
    let mut network = Network::undirected();
    for i in 0..n {
        network.add_node(NodeId(i));
    }
    for &(u, v) in edges {
        network.add_edge(NodeId(u % n), NodeId(v % n));
    }

    let mut model = Model::new("sirs", network, EngineConfig::default().with_seed(seed)).unwrap();
    model.add_status("Susceptible");
    model.add_status("Infected");
    model.add_status("Removed");
    model
        .add_rule(
            "Susceptible",
            "Infected",
            NodeStochastic::new(beta)
                .unwrap()
                .triggered_by("Infected")
                .into_ref(),
        )
        .unwrap();
    model
        .add_rule("Infected", "Removed", NodeStochastic::new(gamma).unwrap().into_ref())
        .unwrap();
    model
        .add_rule(
            "Removed",
            "Susceptible",
            CountDown::new("immunity", 3).unwrap().into_ref(),
        )
        .unwrap();
    model
        .set_initial_status(InitialStatus::new().with_fraction("Infected", 0.2))
        .unwrap();
    model
}

proptest! {
    #[test]
    fn counts_reconcile_with_deltas(
        n in 2u64..40,
        edges in prop::collection::vec((0u64..40, 0u64..40), 0..120),
        beta in 0.0f64..=1.0,
        gamma in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut model = build(&edges, n, beta, gamma, seed);
        let results = model.iteration_bunch(12).unwrap();

        for pair in results.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            for (&code, &count) in &next.node_count {
                prop_assert_eq!(prev.count(code) as i64 + next.delta(code), count as i64);
            }
            prop_assert_eq!(next.status_delta.values().sum::<i64>(), 0);
        }
        for result in &results {
            prop_assert_eq!(result.node_count.values().sum::<usize>(), n as usize);
            prop_assert_eq!(result.node_count.len(), 3);
        }
    }

    #[test]
    fn delta_map_matches_status_changes(
        n in 2u64..30,
        edges in prop::collection::vec((0u64..30, 0u64..30), 0..80),
        seed in any::<u64>(),
    ) {
        let mut model = build(&edges, n, 0.4, 0.3, seed);
        let mut previous = model.status_map().unwrap();
        model.iteration().unwrap();

        for _ in 0..8 {
            let result = model.iteration().unwrap();
            let current = model.status_map().unwrap();
            let changed = result.status.unwrap();
            for (node, status) in &current {
                match changed.get(node) {
                    Some(new) => {
                        prop_assert_eq!(new, status);
                        prop_assert_ne!(previous[node], *status);
                    }
                    None => prop_assert_eq!(previous[node], *status),
                }
            }
            previous = current;
        }
    }
}

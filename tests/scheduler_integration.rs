//! Integration tests for the iteration scheduler
//!
//! These tests drive whole models through several iterations:
//! - Transitions only see the statuses from the start of their iteration
//! - Certain transitions saturate a complete graph in one step
//! - Thresholds, countdowns and edge rules fire exactly when expected
//! - Same seed gives the same run, sequential or parallel

use netcascade::compartment::{
    Compartment, CountDown, EdgeNumericalAttribute, EdgeStochastic, NodeStochastic,
    NodeThreshold, NumericCondition, Operator,
};
use netcascade::{EngineConfig, InitialStatus, Model, Network, NodeId, Parameters};

fn path(n: u64) -> Network {
    Network::from_edges(false, (0..n - 1).map(|i| (NodeId(i), NodeId(i + 1))))
}

fn complete(n: u64) -> Network {
    Network::from_edges(
        false,
        (0..n).flat_map(|u| ((u + 1)..n).map(move |v| (NodeId(u), NodeId(v)))),
    )
}

fn si(network: Network, rate: f64, config: EngineConfig) -> Model {
    let mut model = Model::new("si", network, config).unwrap();
    model.add_status("Susceptible");
    model.add_status("Infected");
    model
        .add_rule(
            "Susceptible",
            "Infected",
            NodeStochastic::new(rate)
                .unwrap()
                .triggered_by("Infected")
                .into_ref(),
        )
        .unwrap();
    model
}

#[test]
fn test_transitions_do_not_leak_within_an_iteration() {
    let mut model = si(path(10), 1.0, EngineConfig::default().with_seed(1));
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(0), "Infected"))
        .unwrap();

    let results = model.iteration_bunch(4).unwrap();

    // One hop per iteration even though every contact is certain
    for (t, result) in results.iter().enumerate() {
        assert_eq!(result.count(1), t + 1, "iteration {}", t);
    }
    assert_eq!(model.status_of(NodeId(3)).unwrap(), 1);
    assert_eq!(model.status_of(NodeId(4)).unwrap(), 0);
}

#[test]
fn test_complete_graph_saturates_in_one_step() {
    let mut model = si(complete(100), 1.0, EngineConfig::default().with_seed(11));
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(0), "Infected"))
        .unwrap();

    let baseline = model.iteration().unwrap();
    assert_eq!(baseline.count(1), 1);

    let step = model.iteration().unwrap();
    assert_eq!(step.count(1), 100);
    assert_eq!(step.count(0), 0);
    assert_eq!(step.delta(1), 99);
    assert_eq!(step.delta(0), -99);
    assert_eq!(step.changed(), 99);
}

#[test]
fn test_unconditional_rule_moves_every_node_in_one_step() {
    let mut model = Model::new("s_to_i", complete(100), EngineConfig::default().with_seed(12)).unwrap();
    model.add_status("S");
    model.add_status("I");
    model
        .add_rule("S", "I", NodeStochastic::new(1.0).unwrap().into_ref())
        .unwrap();
    model.set_initial_status(InitialStatus::new()).unwrap();

    let baseline = model.iteration().unwrap();
    assert_eq!(baseline.count(0), 100);
    assert_eq!(baseline.count(1), 0);

    let step = model.iteration().unwrap();
    assert_eq!(step.count(1), 100);
    assert_eq!(step.count(0), 0);
    assert_eq!(step.delta(1), 100);
    assert_eq!(step.delta(0), -100);
    assert_eq!(step.changed(), 100);
}

#[test]
fn test_baseline_reports_every_node() {
    let mut model = si(path(5), 0.5, EngineConfig::default().with_seed(2));
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(2), "Infected"))
        .unwrap();

    let baseline = model.iteration().unwrap();
    assert_eq!(baseline.iteration, 0);
    let status = baseline.status.unwrap();
    assert_eq!(status.len(), 5);
    assert_eq!(status[&NodeId(2)], 1);
    assert!(baseline.status_delta.values().all(|&d| d == 0));
}

#[test]
fn test_node_status_recording_can_be_disabled() {
    let config = EngineConfig::default().with_seed(2).with_node_status(false);
    let mut model = si(path(5), 1.0, config);
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(0), "Infected"))
        .unwrap();

    for result in model.iteration_bunch(3).unwrap() {
        assert!(result.status.is_none());
    }
    assert_eq!(model.status_of(NodeId(2)).unwrap(), 1);
}

#[test]
fn test_threshold_half_of_neighbours() {
    // Centre 0 with four leaves, two of them active
    let network = Network::from_edges(false, (1..=4).map(|i| (NodeId(0), NodeId(i))));
    let mut model = Model::new("threshold", network, EngineConfig::default().with_seed(3)).unwrap();
    model.add_status("Inactive");
    model.add_status("Active");
    model
        .add_rule(
            "Inactive",
            "Active",
            NodeThreshold::new("Active")
                .with_threshold(0.5)
                .unwrap()
                .into_ref(),
        )
        .unwrap();
    model
        .set_initial_status(
            InitialStatus::new().assign_all([NodeId(1), NodeId(2)], "Active"),
        )
        .unwrap();

    model.iteration_bunch(2).unwrap();
    assert_eq!(model.status_of(NodeId(0)).unwrap(), 1);
    // Leaves 3 and 4 only see the centre, which was inactive at the start
    assert_eq!(model.status_of(NodeId(3)).unwrap(), 0);

    model.iteration().unwrap();
    assert_eq!(model.status_of(NodeId(3)).unwrap(), 1);
}

#[test]
fn test_per_node_threshold_overrides_constant() {
    let network = Network::from_edges(false, (1..=4).map(|i| (NodeId(0), NodeId(i))));
    let mut model = Model::new("threshold", network, EngineConfig::default().with_seed(3)).unwrap();
    model.add_status("Inactive");
    model.add_status("Active");
    let mut params = Parameters::new();
    params.set_node("threshold", NodeId(0), 0.75);
    model.set_parameters(params);
    model
        .add_rule(
            "Inactive",
            "Active",
            NodeThreshold::new("Active")
                .with_threshold(0.5)
                .unwrap()
                .into_ref(),
        )
        .unwrap();
    model
        .set_initial_status(
            InitialStatus::new().assign_all([NodeId(1), NodeId(2)], "Active"),
        )
        .unwrap();

    model.iteration_bunch(2).unwrap();
    assert_eq!(model.status_of(NodeId(0)).unwrap(), 0);
}

#[test]
fn test_countdown_fires_on_third_evaluation() {
    let mut model = Model::new("sir", path(3), EngineConfig::default().with_seed(4)).unwrap();
    model.add_status("Infected");
    model.add_status("Removed");
    model
        .add_rule(
            "Infected",
            "Removed",
            CountDown::new("recovery", 3).unwrap().into_ref(),
        )
        .unwrap();
    model.set_initial_status(InitialStatus::new()).unwrap();

    // Infected = 0, Removed = 1; everyone starts infected
    let results = model.iteration_bunch(4).unwrap();
    assert_eq!(results[1].count(0), 3);
    assert_eq!(results[2].count(0), 3);
    assert_eq!(results[3].count(0), 0);
    assert_eq!(results[3].count(1), 3);
    assert_eq!(results[3].delta(1), 3);
}

#[test]
fn test_countdown_gates_recovery() {
    let mut model = Model::new("sir", path(2), EngineConfig::default().with_seed(4)).unwrap();
    model.add_status("Infected");
    model.add_status("Removed");
    let gated = CountDown::new("incubation", 2)
        .unwrap()
        .compose(NodeStochastic::new(1.0).unwrap().into_ref());
    model
        .add_rule("Infected", "Removed", gated.into_ref())
        .unwrap();
    model.set_initial_status(InitialStatus::new()).unwrap();

    let results = model.iteration_bunch(3).unwrap();
    assert_eq!(results[1].count(1), 0);
    assert_eq!(results[2].count(1), 2);
}

#[test]
fn test_directed_contagion_follows_edge_direction() {
    let network = Network::from_edges(true, [(NodeId(0), NodeId(1)), (NodeId(2), NodeId(1))]);
    let mut model = si(network, 1.0, EngineConfig::default().with_seed(5));
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(1), "Infected"))
        .unwrap();

    model.iteration_bunch(3).unwrap();
    // Node 1 has no outgoing edges, so the infection cannot leave it
    assert_eq!(model.status_of(NodeId(0)).unwrap(), 0);
    assert_eq!(model.status_of(NodeId(2)).unwrap(), 0);
}

#[test]
fn test_edge_rules_use_edge_data() {
    let mut network = path(3);
    network
        .set_edge_attr(NodeId(0), NodeId(1), "weight", 10)
        .unwrap();
    network
        .set_edge_attr(NodeId(1), NodeId(2), "weight", 1)
        .unwrap();
    let mut model = Model::new("edges", network, EngineConfig::default().with_seed(6)).unwrap();
    model.add_status("Susceptible");
    model.add_status("Infected");
    let heavy = EdgeNumericalAttribute::new(
        "weight",
        NumericCondition::scalar(Operator::Ge, 5.0).unwrap(),
    )
    .triggered_by("Infected");
    model
        .add_rule("Susceptible", "Infected", heavy.into_ref())
        .unwrap();
    model
        .set_initial_status(InitialStatus::new().assign_all([NodeId(0), NodeId(2)], "Infected"))
        .unwrap();

    model.iteration_bunch(2).unwrap();
    assert_eq!(model.status_of(NodeId(1)).unwrap(), 1);

    // Same layout but only the light edge leads to an infected node
    let mut network = path(3);
    network
        .set_edge_attr(NodeId(0), NodeId(1), "weight", 1)
        .unwrap();
    let mut params = Parameters::new();
    params.set_edge("p", NodeId(1), NodeId(0), 0.0);
    let mut model = Model::new("edges", network, EngineConfig::default().with_seed(6)).unwrap();
    model.add_status("Susceptible");
    model.add_status("Infected");
    model.set_parameters(params);
    let stochastic = EdgeStochastic::new()
        .with_edge_param("p")
        .triggered_by("Infected");
    model
        .add_rule("Susceptible", "Infected", stochastic.into_ref())
        .unwrap();
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(0), "Infected"))
        .unwrap();

    model.iteration_bunch(5).unwrap();
    assert_eq!(model.status_of(NodeId(1)).unwrap(), 0);
}

#[test]
fn test_undirected_edge_parameter_ignores_write_order() {
    let mut params = Parameters::new();
    params.set_edge("p", NodeId(1), NodeId(0), 1.0);
    params.set_edge("p", NodeId(0), NodeId(1), 0.0);

    let mut model = Model::new("edges", path(2), EngineConfig::default().with_seed(6)).unwrap();
    model.add_status("Susceptible");
    model.add_status("Infected");
    model.set_parameters(params);
    let stochastic = EdgeStochastic::new()
        .with_edge_param("p")
        .triggered_by("Infected");
    model
        .add_rule("Susceptible", "Infected", stochastic.into_ref())
        .unwrap();
    model
        .set_initial_status(InitialStatus::new().assign(NodeId(1), "Infected"))
        .unwrap();

    // The later write covers both orientations of the undirected edge
    model.iteration_bunch(5).unwrap();
    assert_eq!(model.status_of(NodeId(0)).unwrap(), 0);
}

#[test]
fn test_blocked_nodes_never_move() {
    let mut model = si(complete(10), 1.0, EngineConfig::default().with_seed(8));
    model.add_status_with_code("Blocked", -1).unwrap();
    model
        .set_initial_status(
            InitialStatus::new()
                .assign(NodeId(0), "Infected")
                .assign_all([NodeId(5), NodeId(6)], "Blocked"),
        )
        .unwrap();

    let results = model.iteration_bunch(3).unwrap();
    let last = results.last().unwrap();
    assert_eq!(last.count(-1), 2);
    assert_eq!(last.count(1), 8);
    assert_eq!(model.status_of(NodeId(5)).unwrap(), -1);
}

#[test]
fn test_same_seed_same_trajectory() {
    let run = |seed: u64| {
        let mut model = si(complete(60), 0.02, EngineConfig::default().with_seed(seed));
        model
            .set_initial_status(InitialStatus::new().with_fraction("Infected", 0.1))
            .unwrap();
        model.iteration_bunch(8).unwrap()
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let run = |parallel_threshold: usize| {
        let config = EngineConfig::default()
            .with_seed(1234)
            .with_parallel_threshold(parallel_threshold);
        let mut model = si(complete(80), 0.01, config);
        model
            .set_initial_status(InitialStatus::new().with_fraction("Infected", 0.05))
            .unwrap();
        model.iteration_bunch(10).unwrap()
    };
    assert_eq!(run(usize::MAX), run(1));
}

#[test]
fn test_reset_replays_the_run() {
    let mut model = si(complete(50), 0.03, EngineConfig::default().with_seed(77));
    model
        .set_initial_status(InitialStatus::new().with_fraction("Infected", 0.1))
        .unwrap();

    let first = model.iteration_bunch(6).unwrap();
    model.reset().unwrap();
    assert_eq!(model.current_iteration(), Some(0));
    let second = model.iteration_bunch(6).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unseeded_model_reports_its_seed() {
    let mut a = si(complete(40), 0.05, EngineConfig::default());
    a.set_initial_status(InitialStatus::new().with_fraction("Infected", 0.1))
        .unwrap();
    let mut b = si(complete(40), 0.05, EngineConfig::default().with_seed(a.seed()));
    b.set_initial_status(InitialStatus::new().with_fraction("Infected", 0.1))
        .unwrap();
    assert_eq!(a.iteration_bunch(5).unwrap(), b.iteration_bunch(5).unwrap());
}

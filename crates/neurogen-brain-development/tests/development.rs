// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Development and simulation through the public API

use std::sync::Arc;

use neurogen_brain_development::{
    BduError, Brain, Cluster, ClusterPlacer, DevelopmentStage, Neuroembryogenesis, Simulation,
};
use neurogen_components::{ComponentKind, GrowthContext, Modality, Position};
use neurogen_config::{ParameterStore, SimulationConfig};
use neurogen_state_manager::{MemorySink, RunControl};
use proptest::prelude::*;

fn config_from(parameters: &str) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    let store: ParameterStore = parameters.parse().unwrap();
    store.apply_to(&mut config).unwrap();
    config
}

#[test]
fn test_brain_from_parameters() {
    let config = config_from(
        "cluster_count = 3\n\
         neurons_per_cluster = 5\n\
         neuron_count = 4\n\
         seed = 99\n\
         visual_receptor_count = 6\n\
         visual_receptor_stride = 3\n\
         effector_count = 2\n\
         effector_stride = 1\n\
         effector_offset = 15\n",
    );
    let brain = Brain::from_config(&config).unwrap();

    assert_eq!(brain.clusters().len(), 3);
    assert_eq!(brain.neuron_count(), 19);
    assert_eq!(brain.receptor_pool(Modality::Visual).unwrap().len(), 6);
    assert_eq!(brain.effector_pool().len(), 2);

    // stride 3 over six receptors wires receptors 0 and 3
    let population = brain.population();
    let receptor_links: usize = population
        .iter()
        .flat_map(|n| n.incoming_synapses())
        .filter(|link| link.source.kind == ComponentKind::SensoryReceptor)
        .count();
    assert!(receptor_links >= 2);

    // offset 15 lands on the flat neurons, whose gaps are still free
    for (i, effector) in brain.effector_pool().effectors().iter().enumerate() {
        let links = effector.synaptic_gaps();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source.id, population[15 + i].id());
    }
}

#[test]
fn test_whole_population_association_is_idempotent() {
    let ctx = Arc::new(GrowthContext::new());
    let mut brain = Brain::new(Arc::clone(&ctx), 0.2).unwrap();
    let mut cluster = Cluster::at(0, Position::ORIGIN);
    cluster.initialise(&ctx, 8, 0, 0.2).unwrap();
    brain.add_cluster(cluster);
    brain.add_neuron(Position::new(0.05, 0.0, 0.0)).unwrap();

    let first = brain.perform_synaptic_association();
    let associated: usize = brain
        .population()
        .iter()
        .map(|n| n.associated_gap_count())
        .sum();

    let second = brain.perform_synaptic_association();
    let again: usize = brain
        .population()
        .iter()
        .map(|n| n.associated_gap_count())
        .sum();

    assert_eq!(associated, again);
    assert_eq!(first, second);
    assert!((first - 9.0 * 0.5).abs() < 1e-9);
}

#[test]
fn test_unplaceable_clusters_fail_development() {
    let config = config_from(
        "cluster_count = 2\n\
         cluster_half_extent = 1\n\
         min_cluster_distance = 100\n",
    );
    let mut embryo = Neuroembryogenesis::new();
    let err = embryo.develop(&config).unwrap_err();
    assert!(matches!(err, BduError::ClusterPlacement { attempts: 1000, .. }));
    assert_eq!(embryo.get_progress().stage, DevelopmentStage::Failed);
}

#[test]
fn test_stimulated_receptor_fires_during_simulation() {
    let config = config_from(
        "cluster_count = 0\n\
         neuron_count = 4\n\
         tactile_receptor_count = 2\n\
         tactile_receptor_stride = 1\n\
         persistence_enabled = false\n",
    );
    let brain = Brain::from_config(&config).unwrap();
    let handle = brain.stimulus_handle(Modality::Tactile, 0).unwrap();
    let mut sim = Simulation::new(brain, 0.1)
        .unwrap()
        .with_run_control(Arc::new(RunControl::new()));

    let input = std::thread::spawn(move || handle.stimulate(2.0));
    input.join().unwrap();

    let report = sim.tick().unwrap();
    assert_eq!(report.receptors.fired, 1);
    assert!(report.receptors.deposited >= 0.0);

    let quiet = sim.tick().unwrap();
    assert_eq!(quiet.receptors.fired, 0);
}

#[test]
fn test_simulation_persists_changes() {
    let config = config_from("cluster_count = 1\nneurons_per_cluster = 3\nseed = 5\n");
    let brain = Brain::from_config(&config).unwrap();
    let mut sim = Simulation::new(brain, 0.1)
        .unwrap()
        .with_run_control(Arc::new(RunControl::new()));
    let sink = MemorySink::new();
    let stats = sim.attach_persistence(8, sink.clone()).unwrap();

    let summary = sim.run(4).unwrap();
    sim.shutdown().unwrap();

    assert_eq!(summary.ticks, 4);
    assert_eq!(stats.failures(), 0);
    assert!(stats.batches_written() >= 1);
    assert_eq!(stats.records_written() as usize, sink.record_count());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_clusters_are_separated(seed in any::<u64>(), count in 1usize..12) {
        let mut placer = ClusterPlacer::new(1000.0, Some(seed)).unwrap();
        let clusters: Vec<Cluster> = (0..count)
            .map(|_| Cluster::create(&mut placer, 100.0).unwrap())
            .collect();
        for (i, a) in clusters.iter().enumerate() {
            for b in &clusters[i + 1..] {
                prop_assert!(a.position().distance_to(&b.position()) >= 100.0);
            }
        }
    }
}

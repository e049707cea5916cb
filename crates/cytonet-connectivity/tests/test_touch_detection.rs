// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Touch detection from placement to stored synapses

mod common;

use std::collections::HashSet;

use common::{context, morphology, touch_detector, CHUNK};
use cytonet_config::parse_config;
use cytonet_connectivity::{
    CellType, CompartmentType, ConnectivityEvent, ConnectivityPipeline, ConnectivityScheduler, JobStatus,
    LocalJobPool, MemoryConnectivitySink, MemoryMorphologyRepository, MemoryPlacementIndex, RecordingObserver,
    SynapseDistribution, TouchDetectorParams,
};

const TWO_TYPES: &str = r#"
[simulation]
chunk_size = [100.0, 100.0, 100.0]
seed = 11
verbosity = 0

[cell_types.stellate]
morphologies = ["stellate_a"]

[cell_types.purkinje]
morphologies = ["purkinje_a"]

[connectivity.stellate_to_purkinje]
strategy = "touch_detector"
presynaptic = { cell_types = ["stellate"] }
postsynaptic = { cell_types = ["purkinje"] }
compartment_intersection_radius = 1.0
synapses = 1
allow_zero_synapses = false
"#;

#[test]
fn test_single_touch_end_to_end() {
    let config = parse_config(TWO_TYPES).unwrap();

    let mut placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
    let source = placement.place("stellate", &[[0.0, 0.0, 0.0]])[0];
    let destination = placement.place("purkinje", &[[0.5, 0.0, 0.0]])[0];

    let mut morphologies = MemoryMorphologyRepository::new();
    morphologies.insert(morphology(
        "stellate_a",
        CompartmentType::Axon,
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
    ));
    morphologies.insert(morphology("purkinje_a", CompartmentType::Dendrite, &[[0.5, 0.0, 0.0]]));

    let sink = MemoryConnectivitySink::new();
    let report = ConnectivityPipeline::new(config)
        .run(&placement, &morphologies, &sink)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.jobs_queued, 1);
    assert_eq!(report.connections(), 1);

    let set = sink.get("stellate_to_purkinje").expect("connectivity set");
    assert_eq!(set.connections, vec![[source, destination]]);
    // The destination compartment sits at (1, 0, 0), on top of source compartment 1
    assert_eq!(set.compartments, vec![[1, 0]]);
    let detail = set.intersections()[0].detail.clone().expect("compartment detail");
    assert_eq!(detail.from_morphology, "stellate_a");
    assert_eq!(detail.to_morphology, "purkinje_a");
}

#[test]
fn test_synapse_count_clamped_to_touching_pairs() {
    let stellate = CellType::new("stellate").with_morphologies(["stellate_a"]);
    let purkinje = CellType::new("purkinje").with_morphologies(["purkinje_a"]);

    let mut placement = MemoryPlacementIndex::new(CHUNK);
    placement.place("stellate", &[[10.0, 10.0, 10.0]]);
    placement.place("purkinje", &[[10.0, 10.0, 10.0]]);

    let mut morphologies = MemoryMorphologyRepository::new();
    morphologies.insert(morphology(
        "stellate_a",
        CompartmentType::Axon,
        &[[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]],
    ));
    morphologies.insert(morphology("purkinje_a", CompartmentType::Dendrite, &[[0.0, 0.0, 0.0]]));

    let strategy = touch_detector(
        "clamp",
        &stellate,
        &purkinje,
        TouchDetectorParams {
            compartment_intersection_radius: 1.0,
            synapses: SynapseDistribution::Constant(5.0),
            ..Default::default()
        },
    );

    let ctx = context(&placement, &morphologies, Some(3));
    let mut pool = LocalJobPool::new();
    ConnectivityScheduler::new(CHUNK)
        .queue_all(&[strategy], &ctx, &mut pool)
        .unwrap();
    let sink = MemoryConnectivitySink::new();
    let report = pool.execute(&ctx, &sink);
    assert_eq!(report.completed, 1);

    let set = sink.get("stellate_to_purkinje").unwrap();
    assert_eq!(set.len(), 2);
    let pairs: HashSet<[usize; 2]> = set.compartments.iter().copied().collect();
    assert_eq!(pairs, [[0, 0], [1, 0]].into_iter().collect());
}

#[test]
fn test_compartment_filters() {
    let config = parse_config(
        r#"
[simulation]
seed = 5
verbosity = 0

[cell_types.granule]
morphologies = ["granule_a"]

[cell_types.golgi]
morphologies = ["golgi_a"]

[connectivity.parallel_fibers]
strategy = "touch_detector"
presynaptic = { cell_types = ["granule"], compartments = ["axon"] }
postsynaptic = { cell_types = ["golgi"], compartments = ["dendrite"] }
compartment_intersection_radius = 0.5
synapses = 10
tag = "pf_to_golgi"
"#,
    )
    .unwrap();

    let mut placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
    placement.place("granule", &[[0.0, 0.0, 0.0]]);
    placement.place("golgi", &[[0.0, 0.0, 0.0]]);

    let mut morphologies = MemoryMorphologyRepository::new();
    morphologies.insert(cytonet_connectivity::Morphology::new(
        "granule_a",
        vec![
            cytonet_connectivity::Compartment::new([0.0, 0.0, 0.0], CompartmentType::Soma),
            cytonet_connectivity::Compartment::new([0.0, 0.0, 0.0], CompartmentType::Axon),
        ],
    ));
    morphologies.insert(cytonet_connectivity::Morphology::new(
        "golgi_a",
        vec![
            cytonet_connectivity::Compartment::new([0.0, 0.0, 0.0], CompartmentType::Soma),
            cytonet_connectivity::Compartment::new([0.0, 0.0, 0.0], CompartmentType::Axon),
            cytonet_connectivity::Compartment::new([0.2, 0.0, 0.0], CompartmentType::Dendrite),
        ],
    ));

    let sink = MemoryConnectivitySink::new();
    ConnectivityPipeline::new(config)
        .run(&placement, &morphologies, &sink)
        .unwrap();

    // Only granule axon (1) against golgi dendrite (2) may touch
    let set = sink.get("pf_to_golgi").expect("tag override");
    assert_eq!(set.compartments, vec![[1, 2]]);
    assert!(set.metadata.strategies.contains("parallel_fibers"));
}

const MISSING_GOLGI: &str = r#"
[simulation]
seed = 1
verbosity = 0

[cell_types.granule]
morphologies = ["granule_a"]

[cell_types.golgi]
morphologies = ["golgi_missing"]

[connectivity.granule_to_golgi]
strategy = "touch_detector"
presynaptic = { cell_types = ["granule"] }
postsynaptic = { cell_types = ["golgi"] }
compartment_intersection_radius = 1.0
{radius}

[connectivity.golgi_to_granule]
strategy = "all_to_all"
presynaptic = { cell_types = ["golgi"] }
postsynaptic = { cell_types = ["granule"] }
after = ["granule_to_golgi"]

[connectivity.granule_to_granule]
strategy = "all_to_all"
presynaptic = { cell_types = ["granule"] }
postsynaptic = { cell_types = ["granule"] }
"#;

/// A missing morphology fails the touch job, skips its dependent and
/// leaves the unrelated strategy's writes in place
fn assert_missing_morphology_fails_one_job(radius: &str) {
    let config = parse_config(&MISSING_GOLGI.replace("{radius}", radius)).unwrap();

    let mut placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
    placement.place("granule", &[[1.0, 1.0, 1.0]]);
    placement.place("golgi", &[[2.0, 1.0, 1.0]]);

    let mut morphologies = MemoryMorphologyRepository::new();
    morphologies.insert(morphology("granule_a", CompartmentType::Axon, &[[0.0, 0.0, 0.0]]));

    let observer = RecordingObserver::new();
    let sink = MemoryConnectivitySink::new();
    let report = ConnectivityPipeline::new(config)
        .run_with_observer(&placement, &morphologies, &sink, &observer)
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.execution.failed, 1);
    assert_eq!(report.execution.skipped, 1);
    assert_eq!(report.execution.completed, 1);
    assert!(report.execution.failures[0].1.contains("golgi_missing"));

    assert!(sink.get("granule_to_golgi").is_none());
    assert!(sink.get("golgi_to_granule").is_none());
    assert_eq!(sink.get("granule_to_granule").unwrap().len(), 1);

    let events = observer.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, ConnectivityEvent::JobSkipped { strategy, .. } if strategy == "golgi_to_granule")));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ConnectivityEvent::JobStarted { strategy, .. } if strategy == "golgi_to_granule")));
}

#[test]
fn test_missing_morphology_fails_job_without_partial_writes() {
    assert_missing_morphology_fails_one_job("cell_intersection_radius = 10.0");
}

#[test]
fn test_missing_morphology_with_derived_radius_fails_job() {
    // The soma radius comes from morphology extents, which cannot be loaded
    assert_missing_morphology_fails_one_job("");
}

#[test]
fn test_cell_type_without_morphologies_fails_job() {
    let config = parse_config(
        r#"
[simulation]
verbosity = 0

[cell_types.granule]
morphologies = ["granule_a"]

[cell_types.basket]

[connectivity.granule_to_basket]
strategy = "touch_detector"
presynaptic = { cell_types = ["granule"] }
postsynaptic = { cell_types = ["basket"] }

[connectivity.granule_to_granule]
strategy = "all_to_all"
presynaptic = { cell_types = ["granule"] }
postsynaptic = { cell_types = ["granule"] }
"#,
    )
    .unwrap();

    let mut placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
    placement.place("granule", &[[1.0, 1.0, 1.0]]);
    placement.place("basket", &[[1.0, 1.0, 1.0]]);

    let mut morphologies = MemoryMorphologyRepository::new();
    morphologies.insert(morphology("granule_a", CompartmentType::Axon, &[[0.0, 0.0, 0.0]]));

    let sink = MemoryConnectivitySink::new();
    let report = ConnectivityPipeline::new(config)
        .run(&placement, &morphologies, &sink)
        .unwrap();

    assert_eq!(report.execution.failed, 1);
    assert_eq!(report.execution.completed, 1);
    assert!(report.execution.failures[0].1.contains("basket"));
    assert!(sink.get("granule_to_basket").is_none());
    assert_eq!(sink.get("granule_to_granule").unwrap().len(), 1);
}

#[test]
fn test_seeded_runs_repeat() {
    let run = || {
        let stellate = CellType::new("stellate").with_morphologies(["s1", "s2"]);
        let purkinje = CellType::new("purkinje").with_morphologies(["p1"]);
        let mut placement = MemoryPlacementIndex::new(CHUNK);
        let positions: Vec<_> = (0..20).map(|i| [i as f64 * 3.0, 5.0, 5.0]).collect();
        placement.place("stellate", &positions);
        placement.place("purkinje", &positions);

        let mut morphologies = MemoryMorphologyRepository::new();
        morphologies.insert(morphology("s1", CompartmentType::Axon, &[[0.0; 3], [2.0, 0.0, 0.0], [4.0, 0.0, 0.0]]));
        morphologies.insert(morphology("s2", CompartmentType::Axon, &[[0.0; 3], [-2.0, 0.0, 0.0]]));
        morphologies.insert(morphology("p1", CompartmentType::Dendrite, &[[0.0; 3], [1.0, 0.0, 0.0]]));

        let strategy = touch_detector(
            "s_to_p",
            &stellate,
            &purkinje,
            TouchDetectorParams {
                compartment_intersection_radius: 1.5,
                synapses: SynapseDistribution::Normal { mean: 2.0, std_dev: 1.0 },
                ..Default::default()
            },
        );
        let ctx = context(&placement, &morphologies, Some(99));
        let mut pool = LocalJobPool::new();
        ConnectivityScheduler::new(CHUNK)
            .queue_all(&[strategy], &ctx, &mut pool)
            .unwrap();
        let sink = MemoryConnectivitySink::new();
        let report = pool.execute(&ctx, &sink);
        assert_eq!(pool.status(cytonet_connectivity::JobHandle(0)), Some(&JobStatus::Completed { edges: report.connections }));
        sink.get("stellate_to_purkinje").unwrap()
    };
    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}

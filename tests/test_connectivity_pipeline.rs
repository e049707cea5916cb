// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// End-to-end tests through the umbrella crate
///
/// Network definitions are loaded from disk the way a deployment does it.
use std::collections::HashMap;
use std::fs;

use cytonet::config::load_config;
use cytonet::connectivity::{Compartment, CompartmentType, ConnectivityEvent, RecordingObserver};
use cytonet::prelude::*;
use tempfile::TempDir;

const NETWORK: &str = r#"
[simulation]
chunk_size = [50.0, 50.0, 50.0]
verbosity = 2

[cell_types.mossy_fiber]
relay = true
labels = ["afferent"]
morphologies = ["mossy_a"]

[cell_types.granule]
labels = ["excitatory"]
morphologies = ["granule_a", "granule_b"]

[cell_types.golgi]
labels = ["inhibitory"]
morphologies = ["golgi_a"]

[connectivity.mossy_to_granule]
strategy = "touch_detector"
presynaptic = { labels = ["afferent"], compartments = ["axon"] }
postsynaptic = { cell_types = ["granule"], compartments = ["dendrite"] }
compartment_intersection_radius = 3.0
synapses = { distribution = "uniform", low = 1.0, high = 3.0 }

[connectivity.granule_to_golgi]
strategy = "touch_detector"
presynaptic = { labels = ["excitatory"], compartments = ["axon"] }
postsynaptic = { cell_types = ["golgi"], compartments = ["dendrite"] }
after = ["mossy_to_granule"]
cell_intersection_plane = "xz"
compartment_intersection_radius = 4.0
synapses = { distribution = "normal", mean = 2.0, std_dev = 1.0 }

[connectivity.golgi_to_granule]
strategy = "all_to_all"
presynaptic = { cell_types = ["golgi"] }
postsynaptic = { cell_types = ["granule"] }
after = ["granule_to_golgi"]
tag = "golgi_inhibition"
"#;

fn write_network(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("cytonet.toml");
    fs::write(&path, NETWORK).unwrap();
    path
}

fn morphologies() -> MemoryMorphologyRepository {
    let axon = |name: &str, reach: f64| {
        Morphology::new(
            name,
            vec![
                Compartment::new([0.0, 0.0, 0.0], CompartmentType::Soma),
                Compartment::new([reach / 2.0, 0.0, 0.0], CompartmentType::Axon),
                Compartment::new([reach, 0.0, 0.0], CompartmentType::Axon),
                Compartment::new([0.0, 0.0, 2.0], CompartmentType::Dendrite),
            ],
        )
    };
    let mut repository = MemoryMorphologyRepository::new();
    repository.insert(axon("mossy_a", 30.0));
    repository.insert(axon("granule_a", 20.0));
    repository.insert(axon("granule_b", 30.0));
    repository.insert(Morphology::new(
        "golgi_a",
        vec![
            Compartment::new([0.0, 0.0, 0.0], CompartmentType::Soma),
            Compartment::new([-10.0, 0.0, 0.0], CompartmentType::Dendrite),
            Compartment::new([-20.0, 0.0, 0.0], CompartmentType::Dendrite),
        ],
    ));
    repository
}

fn placement(chunk_size: [f64; 3]) -> MemoryPlacementIndex {
    let mut placement = MemoryPlacementIndex::new(chunk_size);
    let row = |n: usize, step: f64, y: f64| -> Vec<[f64; 3]> {
        (0..n).map(|i| [i as f64 * step, y, 10.0]).collect()
    };
    placement.place("mossy_fiber", &row(6, 30.0, 10.0));
    placement.place("granule", &row(12, 15.0, 10.0));
    placement.place("golgi", &row(4, 45.0, 10.0));
    placement
}

#[test]
fn test_network_from_file() {
    let dir = TempDir::new().unwrap();
    let mut cli = HashMap::new();
    cli.insert("simulation.seed".to_string(), "42".to_string());
    let config = load_config(Some(&write_network(&dir)), Some(&cli)).unwrap();
    assert_eq!(config.simulation.seed, Some(42));

    let placement = placement(config.simulation.chunk_size);
    let morphologies = morphologies();
    let sink = MemoryConnectivitySink::new();
    let observer = RecordingObserver::new();

    let mut pipeline = ConnectivityPipeline::new(config);
    let report = pipeline
        .run_with_observer(&placement, &morphologies, &sink, &observer)
        .unwrap();

    assert!(report.is_success(), "failures: {:?}", report.execution.failures);
    assert_eq!(
        report.strategies,
        vec!["mossy_to_granule", "granule_to_golgi", "golgi_to_granule"]
    );
    let tags = sink.tags();
    assert!(tags.contains(&"golgi_inhibition".to_string()));
    assert!(tags.contains(&"mossy_fiber_to_granule".to_string()));

    // Mossy axon compartments sit right under granule dendrites, so every
    // stored edge carries compartment detail
    let mossy = sink.get("mossy_fiber_to_granule").unwrap();
    assert!(!mossy.is_empty());
    assert_eq!(mossy.compartments.len(), mossy.len());
    for connection in mossy.intersections() {
        let detail = connection.detail.expect("detailed connection");
        assert!(detail.from_compartment == 1 || detail.from_compartment == 2);
        assert_eq!(detail.to_compartment, 3);
        assert_eq!(detail.from_morphology, "mossy_a");
    }

    // All-to-all: 4 golgi x 12 granule, no compartment detail
    let inhibition = sink.get("golgi_inhibition").unwrap();
    assert_eq!(inhibition.len(), 48);
    assert!(!inhibition.has_compartment_data());

    assert!(observer
        .events()
        .iter()
        .any(|e| matches!(e, ConnectivityEvent::TouchStatistics { touching_pairs, .. } if *touching_pairs > 0)));

    let json: serde_json::Value = serde_json::from_str(&mossy.to_json().unwrap()).unwrap();
    assert_eq!(json["tag"], "mossy_fiber_to_granule");
}

#[test]
fn test_seeded_network_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let path = write_network(&dir);
    let mut cli = HashMap::new();
    cli.insert("simulation.seed".to_string(), "7".to_string());
    cli.insert("simulation.verbosity".to_string(), "0".to_string());

    let run = || {
        let config = load_config(Some(&path), Some(&cli)).unwrap();
        let placement = placement(config.simulation.chunk_size);
        let sink = MemoryConnectivitySink::new();
        ConnectivityPipeline::new(config)
            .run(&placement, &morphologies(), &sink)
            .unwrap();
        sink.into_sets()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_logging_initializes_once() {
    let flags =
        cytonet::observability::CrateDebugFlags::from_args(vec!["--debug-cytonet-connectivity".to_string()]);
    assert!(flags.is_enabled("cytonet-connectivity"));
    let guard = cytonet::observability::init_logging(&flags, 1, &cytonet::observability::LoggingConfig::default());
    assert!(guard.is_ok());
    tracing::info!(target: "cytonet", "logging ready");
}

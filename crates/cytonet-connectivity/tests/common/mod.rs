// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for connectivity integration tests

#![allow(dead_code)]

use std::sync::Arc;

use cytonet_connectivity::{
    CellType, Compartment, CompartmentFilter, CompartmentType, ConnectionStrategy, ConnectivityContext,
    Hemitype, MemoryMorphologyRepository, MemoryPlacementIndex, Morphology, NullObserver, Position,
    StrategyCore, TouchDetector, TouchDetectorParams,
};

pub const CHUNK: [f64; 3] = [100.0, 100.0, 100.0];

pub static NULL_OBSERVER: NullObserver = NullObserver;

/// Morphology whose compartments all have the same kind
pub fn morphology(name: &str, kind: CompartmentType, positions: &[Position]) -> Morphology {
    Morphology::new(
        name,
        positions
            .iter()
            .map(|p| Compartment::new(*p, kind))
            .collect(),
    )
}

pub fn hemitype(cell_type: &CellType) -> Hemitype {
    Hemitype::new(vec![Arc::new(cell_type.clone())], CompartmentFilter::all())
}

pub fn touch_detector(
    name: &str,
    pre: &CellType,
    post: &CellType,
    params: TouchDetectorParams,
) -> Arc<dyn ConnectionStrategy> {
    let core = StrategyCore::new(name, hemitype(pre), hemitype(post));
    Arc::new(TouchDetector::new(core, params).expect("valid touch detector"))
}

pub fn context<'a>(
    placement: &'a MemoryPlacementIndex,
    morphologies: &'a MemoryMorphologyRepository,
    seed: Option<u64>,
) -> ConnectivityContext<'a> {
    ConnectivityContext {
        placement,
        morphologies,
        observer: &NULL_OBSERVER,
        seed,
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Neurogen BDU (Brain Development Utilities)

Grows and drives populations of neurons built from `neurogen-components`:
- Cluster placement by bounded rejection sampling
- Cluster and population growth with parallel initialisation
- Population-wide synaptogenesis and propagation-rate aggregation
- Receptor and effector pools, sparsely pre-wired onto the population
- A tick loop handing changed components to persistence

## Phases

Development and simulation run in barrier-separated phases:
*create → initialise → associate → aggregate / update energy*. Work inside
a phase is data-parallel over independent neurons (rayon, behind the
`parallel` feature); nothing from the next phase starts before every thread
of the current one has joined.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod brain;
pub mod cluster;
pub mod connectivity;
pub mod neuroembryogenesis;
pub mod placement;
pub mod simulation;
pub mod types;

pub use brain::Brain;
pub use cluster::Cluster;
pub use connectivity::{
    aggregate_propagation_rate, associate_population, create_population, initialise_population,
    EffectorPool, PoolLayout, PoolTick, ReceptorPool,
};
pub use neuroembryogenesis::{DevelopmentProgress, DevelopmentStage, Neuroembryogenesis};
pub use placement::{ClusterPlacer, DEFAULT_MAX_ATTEMPTS};
pub use simulation::{RunSummary, Simulation, TickReport};
pub use types::{BduError, BduResult};

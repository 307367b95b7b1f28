// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity and synaptogenesis operations.

Neuron-to-neuron association over whole populations, and the sparse
pre-wiring of receptor and effector pools onto a population.
*/

pub mod pools;
pub mod synaptogenesis;

pub use pools::{EffectorPool, PoolLayout, PoolTick, ReceptorPool};
pub use synaptogenesis::{
    aggregate_propagation_rate, associate_population, create_population, initialise_population,
    worker_count,
};

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurogen Components
//!
//! Everything a single grown structure is made of:
//! - **Types**: positions, layered sphere placement, kinds, keys, errors
//! - **Arena**: generational storage with typed parent/child links
//! - **Growth**: the default subtree every kind grows on initialisation
//! - **Energy**: per-component stores replenished from the parent
//! - **Synapse**: proximity-based association of gaps to receivers
//! - **Models**: neurons, sensory receptors and effectors
//!
//! Population-scale orchestration lives in `neurogen-brain-development`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod arena;
pub mod change;
pub mod component;
pub mod context;
pub mod energy;
pub mod growth;
pub mod models;
pub mod synapse;
pub mod types;

pub use arena::ComponentArena;
pub use change::ChangeRecord;
pub use component::{
    Component, ComponentData, LinkTable, DEFAULT_LOWER_CLAMP, DEFAULT_PROPAGATION_RATE,
    DEFAULT_UPPER_CLAMP,
};
pub use context::GrowthContext;
pub use energy::{EnergyCell, EnergyParams, EnergyState, EnergyTick};
pub use models::{
    ComponentTree, Effector, Modality, Neuron, ReceptorTick, SensoryReceptor, StimulusHandle,
};
pub use synapse::{
    associate, associate_neurons, guidance_vector, EndpointOwner, Envelope, GapEndpoint,
    ReceivingEndpoint, SynapseLink, SynapseReceiver, SynapseTransmitter,
};
pub use types::{
    layered_fibonacci_sphere_point, marker, ComponentError, ComponentKind, ComponentResult,
    EntityKey, IdRegistry, KindMarker, Position, PositionError, Relation, SphereLayout,
};

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurogen - self-assembling neural growth simulation
//!
//! Neurons are grown as trees of components (soma, dendrites, boutons, axon
//! and synaptic gaps) laid out on layered Fibonacci spheres. Synapses form
//! wherever a free synaptic gap lies within a proximity threshold of a free
//! dendrite bouton, and every component spends and recovers energy each
//! tick.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neurogen::prelude::*;
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let mut sim = Simulation::from_config(&config)?;
//! sim.brain().perform_synaptic_association();
//! let summary = sim.run(config.simulation.max_ticks)?;
//! sim.shutdown()?;
//! println!("{} tick(s), rate {:.3}", summary.ticks, summary.total_propagation_rate);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): rayon-backed energy updates, association and
//!   aggregation
//! - **`file-logging`**: rolling log files for `run_simulation`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neurogen-config, neurogen-observability    │
//! │  (parameters, TOML, logging setup)                      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Growth core: neurogen-components                       │
//! │  (positions, component arena, association, energy)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: neurogen-state-manager                 │
//! │  (change tracking, persistence worker, run control)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: neurogen-brain-development                 │
//! │  (clusters, pools, brain, simulation loop)              │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use neurogen_brain_development as bdu;
pub use neurogen_components as components;
pub use neurogen_config as config;
pub use neurogen_observability as observability;
pub use neurogen_state_manager as state_manager;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::bdu::{
        Brain, BduError, BduResult, Cluster, ClusterPlacer, DevelopmentProgress, DevelopmentStage,
        EffectorPool, Neuroembryogenesis, PoolLayout, ReceptorPool, RunSummary, Simulation,
        TickReport,
    };
    pub use crate::components::{
        associate, associate_neurons, ChangeRecord, ComponentError, ComponentKind, ComponentTree,
        Effector, EnergyTick, GrowthContext, Modality, Neuron, Position, SensoryReceptor,
        SphereLayout, StimulusHandle,
    };
    pub use crate::config::{load_config, validate_config, ParameterStore, SimulationConfig};
    pub use crate::state_manager::{
        ChangeBatch, ChangeTracker, MemorySink, PersistenceSink, RunControl, SnapshotFileSink,
    };
}

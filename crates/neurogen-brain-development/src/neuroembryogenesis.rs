// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuroembryogenesis - Brain Development from Configuration.

Develops a [`Brain`] in strictly ordered stages:

1. **Clustering**: placing cluster centres, then growing and associating
   each cluster's neurons
2. **Neurogenesis**: growing the flat neuron population
3. **Innervation**: creating receptor and effector pools and pre-wiring them
   onto the population

No stage starts before the previous one has finished on every thread.
Population-wide association is left to
[`Brain::perform_synaptic_association`].
*/

use std::sync::Arc;
use std::time::Instant;

use neurogen_components::{EnergyParams, GrowthContext, Modality, Position};
use neurogen_config::SimulationConfig;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::brain::Brain;
use crate::cluster::Cluster;
use crate::connectivity::{EffectorPool, PoolLayout, ReceptorPool};
use crate::placement::ClusterPlacer;
use crate::types::BduResult;

/// Distance between neighbouring pool anchors along the x axis
pub const POOL_SPACING: f64 = 1.0;

/// Development stage tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DevelopmentStage {
    /// Initial state, not started
    Initialization,
    /// Placing and growing clusters
    Clustering,
    /// Growing the flat population
    Neurogenesis,
    /// Creating and pre-wiring receptor and effector pools
    Innervation,
    /// Development completed successfully
    Completed,
    /// Development failed
    Failed,
}

/// Development progress information
#[derive(Debug, Clone, Serialize)]
pub struct DevelopmentProgress {
    pub stage: DevelopmentStage,
    pub clusters_created: usize,
    pub neurons_created: usize,
    pub receptors_created: usize,
    pub effectors_created: usize,
    pub synapses_created: usize,
    pub duration_ms: u64,
}

impl Default for DevelopmentProgress {
    fn default() -> Self {
        Self {
            stage: DevelopmentStage::Initialization,
            clusters_created: 0,
            neurons_created: 0,
            receptors_created: 0,
            effectors_created: 0,
            synapses_created: 0,
            duration_ms: 0,
        }
    }
}

/// Anchor of receptor pool `k`; effectors sit on the opposite side
pub fn receptor_anchor(k: usize) -> Position {
    Position::new(-(k as f64 + 1.0) * POOL_SPACING, 0.0, 0.0)
}

pub fn effector_anchor() -> Position {
    Position::new(POOL_SPACING, 0.0, 0.0)
}

/// Neuroembryogenesis orchestrator
pub struct Neuroembryogenesis {
    progress: Arc<RwLock<DevelopmentProgress>>,
    start_time: Instant,
}

impl Neuroembryogenesis {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(RwLock::new(DevelopmentProgress::default())),
            start_time: Instant::now(),
        }
    }

    /// Get current development progress
    pub fn get_progress(&self) -> DevelopmentProgress {
        self.progress.read().clone()
    }

    /// Shared view of progress for observers on other threads
    pub fn progress_handle(&self) -> Arc<RwLock<DevelopmentProgress>> {
        Arc::clone(&self.progress)
    }

    fn enter(&self, stage: DevelopmentStage) {
        let mut progress = self.progress.write();
        progress.stage = stage;
        progress.duration_ms = self.start_time.elapsed().as_millis() as u64;
    }

    /// Develop a brain from `config`
    pub fn develop(&mut self, config: &SimulationConfig) -> BduResult<Brain> {
        self.start_time = Instant::now();
        *self.progress.write() = DevelopmentProgress::default();
        info!(target: "neurogen-bdu", "🧬 Starting neuroembryogenesis");

        match self.run_stages(config) {
            Ok(brain) => {
                self.enter(DevelopmentStage::Completed);
                let progress = self.get_progress();
                info!(
                    target: "neurogen-bdu",
                    "✅ Development complete in {}ms: {} cluster(s), {} neuron(s), {} receptor(s), {} effector(s), {} synapse(s)",
                    progress.duration_ms,
                    progress.clusters_created,
                    progress.neurons_created,
                    progress.receptors_created,
                    progress.effectors_created,
                    progress.synapses_created
                );
                Ok(brain)
            }
            Err(e) => {
                self.enter(DevelopmentStage::Failed);
                error!(target: "neurogen-bdu", "❌ Development failed: {}", e);
                Err(e)
            }
        }
    }

    fn run_stages(&self, config: &SimulationConfig) -> BduResult<Brain> {
        let energy = EnergyParams {
            max_energy_level: config.energy.max_energy_level,
            consumption_rate: config.energy.consumption_rate,
            replenish_rate: config.energy.replenish_rate,
        };
        let ctx = Arc::new(GrowthContext::with_energy(energy));
        let threshold = config.association.proximity_threshold;
        let population = &config.population;
        let mut brain = Brain::new(Arc::clone(&ctx), threshold)?;

        // Stage 1: clusters
        self.enter(DevelopmentStage::Clustering);
        if population.cluster_count > 0 {
            let mut placer = ClusterPlacer::new(population.cluster_half_extent, population.seed)?;
            for _ in 0..population.cluster_count {
                let mut cluster = Cluster::create(&mut placer, population.min_cluster_distance)?;
                let linked = cluster.initialise(
                    &ctx,
                    population.neurons_per_cluster,
                    population.points_per_layer,
                    threshold,
                )?;
                let mut progress = self.progress.write();
                progress.clusters_created += 1;
                progress.neurons_created += cluster.len();
                progress.synapses_created += linked;
                drop(progress);
                brain.add_cluster(cluster);
            }
        }

        // Stage 2: flat population
        self.enter(DevelopmentStage::Neurogenesis);
        if population.neuron_count > 0 {
            let grown = brain.grow_neurons(
                population.neuron_count,
                population.points_per_layer,
                Position::ORIGIN,
            )?;
            self.progress.write().neurons_created += grown.len();
        }
        info!(
            target: "neurogen-bdu",
            "  ✓ Population ready: {} neuron(s)",
            brain.neuron_count()
        );

        // Stage 3: receptor and effector pools
        self.enter(DevelopmentStage::Innervation);
        if brain.neuron_count() == 0 {
            warn!(target: "neurogen-bdu", "Empty population, pools will not be pre-wired");
        }
        let receptors = &config.receptors;
        for (k, modality) in Modality::ALL.iter().copied().enumerate() {
            let Some(pool_config) = receptors.pool(modality.as_str()) else {
                continue;
            };
            if pool_config.count == 0 {
                continue;
            }
            let layout = PoolLayout {
                count: pool_config.count,
                stride: pool_config.stride,
                offset: pool_config.offset,
                points_per_layer: pool_config.points_per_layer,
                anchor: receptor_anchor(k),
            };
            let pool = ReceptorPool::create(
                &ctx,
                modality,
                layout,
                pool_config.gaps_per_receptor,
                receptors.sensitivity,
                receptors.threshold,
            )?;
            let created = pool.len();
            let linked = brain.add_receptor_pool(pool)?;
            let mut progress = self.progress.write();
            progress.receptors_created += created;
            progress.synapses_created += linked;
        }

        let effectors = &config.effectors;
        if effectors.count > 0 {
            let layout = PoolLayout {
                count: effectors.count,
                stride: effectors.stride,
                offset: effectors.offset,
                points_per_layer: effectors.points_per_layer,
                anchor: effector_anchor(),
            };
            let pool = EffectorPool::create(&ctx, layout)?;
            let created = pool.len();
            let linked = brain.set_effector_pool(pool)?;
            let mut progress = self.progress.write();
            progress.effectors_created += created;
            progress.synapses_created += linked;
        }

        Ok(brain)
    }
}

impl Default for Neuroembryogenesis {
    fn default() -> Self {
        Self::new()
    }
}

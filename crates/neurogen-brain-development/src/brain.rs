// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Top-level orchestration of clusters, a flat neuron population and the
receptor and effector pools wired onto them.

The population seen by association and aggregation is every cluster's
neurons in cluster order, followed by the flat neurons.
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use neurogen_components::{
    ChangeRecord, ComponentTree, EnergyTick, GrowthContext, Modality, Neuron, Position,
    SphereLayout, StimulusHandle,
};
use neurogen_config::SimulationConfig;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::connectivity::{
    aggregate_propagation_rate, associate_population, create_population, initialise_population,
    EffectorPool, PoolTick, ReceptorPool,
};
use crate::neuroembryogenesis::Neuroembryogenesis;
use crate::types::{BduError, BduResult};

#[derive(Debug)]
pub struct Brain {
    ctx: Arc<GrowthContext>,
    proximity_threshold: f64,
    clusters: Vec<Cluster>,
    neurons: Vec<Neuron>,
    receptor_pools: Vec<ReceptorPool>,
    effector_pool: EffectorPool,
    /// f64 bits of the last aggregated total
    total_propagation_rate: AtomicU64,
}

impl Brain {
    pub fn new(ctx: Arc<GrowthContext>, proximity_threshold: f64) -> BduResult<Self> {
        if !(proximity_threshold.is_finite() && proximity_threshold > 0.0) {
            return Err(BduError::InvalidParameter {
                name: "proximity_threshold",
                value: proximity_threshold,
            });
        }
        Ok(Self {
            ctx,
            proximity_threshold,
            clusters: Vec::new(),
            neurons: Vec::new(),
            receptor_pools: Vec::new(),
            effector_pool: EffectorPool::empty(),
            total_propagation_rate: AtomicU64::new(0.0_f64.to_bits()),
        })
    }

    /// Develop a complete brain from configuration
    pub fn from_config(config: &SimulationConfig) -> BduResult<Self> {
        Neuroembryogenesis::new().develop(config)
    }

    pub fn context(&self) -> &Arc<GrowthContext> {
        &self.ctx
    }

    pub fn proximity_threshold(&self) -> f64 {
        self.proximity_threshold
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The flat population, outside any cluster
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn population(&self) -> Vec<&Neuron> {
        self.clusters
            .iter()
            .flat_map(|cluster| cluster.neurons().iter())
            .chain(self.neurons.iter())
            .collect()
    }

    pub fn neuron_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum::<usize>() + self.neurons.len()
    }

    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
    }

    /// Grow `count` initialised neurons around `anchor`. Returns their indices
    /// in the flat population.
    pub fn grow_neurons(
        &mut self,
        count: usize,
        points_per_layer: usize,
        anchor: Position,
    ) -> BduResult<std::ops::Range<usize>> {
        let layout = SphereLayout::with_points_per_layer(points_per_layer);
        let mut grown = create_population(&self.ctx, anchor, layout, count)?;
        initialise_population(&mut grown, &self.ctx)?;

        let start = self.neurons.len();
        self.neurons.extend(grown);
        debug!(target: "neurogen-bdu", "Grew {} flat neuron(s) around {}", count, anchor);
        Ok(start..self.neurons.len())
    }

    /// Add one initialised neuron. Returns its index in the flat population.
    pub fn add_neuron(&mut self, position: Position) -> BduResult<usize> {
        let mut neuron = Neuron::create(&self.ctx, position);
        neuron.initialise(&self.ctx)?;
        self.neurons.push(neuron);
        Ok(self.neurons.len() - 1)
    }

    /// Pre-wire `pool` onto the current population and keep it. A pool of the
    /// same modality is replaced. Returns synapses formed.
    pub fn add_receptor_pool(&mut self, mut pool: ReceptorPool) -> BduResult<usize> {
        let linked = pool.prewire(&self.population(), self.proximity_threshold)?;
        let modality = pool.modality();
        match self
            .receptor_pools
            .iter_mut()
            .find(|existing| existing.modality() == modality)
        {
            Some(existing) => *existing = pool,
            None => self.receptor_pools.push(pool),
        }
        Ok(linked)
    }

    /// Pre-wire `pool` onto the current population and install it.
    pub fn set_effector_pool(&mut self, mut pool: EffectorPool) -> BduResult<usize> {
        let linked = pool.prewire(&self.population(), self.proximity_threshold)?;
        self.effector_pool = pool;
        Ok(linked)
    }

    pub fn receptor_pools(&self) -> &[ReceptorPool] {
        &self.receptor_pools
    }

    pub fn receptor_pool(&self, modality: Modality) -> Option<&ReceptorPool> {
        self.receptor_pools
            .iter()
            .find(|pool| pool.modality() == modality)
    }

    pub fn effector_pool(&self) -> &EffectorPool {
        &self.effector_pool
    }

    /// Handle an input collaborator can use from any thread
    pub fn stimulus_handle(&self, modality: Modality, index: usize) -> Option<StimulusHandle> {
        self.receptor_pool(modality)?.stimulus_handle(index)
    }

    /// Associate every neuron pair in the population, then aggregate.
    /// Returns the aggregated propagation rate.
    pub fn perform_synaptic_association(&self) -> f64 {
        let population = self.population();
        info!(
            target: "neurogen-bdu",
            "Synaptic association over {} neuron(s)",
            population.len()
        );
        let linked = associate_population(&population, self.proximity_threshold);
        let total = self.aggregate(&population);
        info!(
            target: "neurogen-bdu",
            "Association complete: {} new synapse(s), total propagation rate {:.4}",
            linked,
            total
        );
        total
    }

    /// Recompute the population's summed propagation rate
    pub fn aggregate_propagation_rate(&self) -> f64 {
        self.aggregate(&self.population())
    }

    fn aggregate(&self, population: &[&Neuron]) -> f64 {
        let total = aggregate_propagation_rate(population);
        self.total_propagation_rate
            .store(total.to_bits(), Ordering::Release);
        total
    }

    /// Last aggregated total
    pub fn total_propagation_rate(&self) -> f64 {
        f64::from_bits(self.total_propagation_rate.load(Ordering::Acquire))
    }

    /// Gate stimulus and run the energy tick of every receptor
    pub fn update_receptors(&mut self, dt: f64) -> BduResult<PoolTick> {
        let mut tick = PoolTick::default();
        for pool in &mut self.receptor_pools {
            tick = tick.merge(pool.update(dt)?);
        }
        Ok(tick)
    }

    /// Energy tick for every neuron and effector
    pub fn update_energy(&self, dt: f64) -> EnergyTick {
        let population = self.population();

        #[cfg(feature = "parallel")]
        let neurons = {
            use rayon::prelude::*;
            population
                .par_iter()
                .map(|neuron| neuron.update_energy(dt))
                .reduce(EnergyTick::default, EnergyTick::merge)
        };

        #[cfg(not(feature = "parallel"))]
        let neurons = population
            .iter()
            .map(|neuron| neuron.update_energy(dt))
            .fold(EnergyTick::default(), EnergyTick::merge);

        neurons.merge(self.effector_pool.update_energy(dt))
    }

    /// Change records for every component touched since the last call
    pub fn drain_changes(&self) -> Vec<ChangeRecord> {
        let population = self.population();

        #[cfg(feature = "parallel")]
        let mut changes: Vec<ChangeRecord> = {
            use rayon::prelude::*;
            population
                .par_iter()
                .map(|neuron| {
                    let mut out = Vec::new();
                    neuron.drain_changes(&mut out);
                    out
                })
                .flatten()
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut changes: Vec<ChangeRecord> = {
            let mut out = Vec::new();
            for neuron in &population {
                neuron.drain_changes(&mut out);
            }
            out
        };

        for pool in &self.receptor_pools {
            for receptor in pool.receptors() {
                receptor.drain_changes(&mut changes);
            }
        }
        for effector in self.effector_pool.effectors() {
            effector.drain_changes(&mut changes);
        }
        changes
    }

    /// Components across every tree the brain owns
    pub fn component_count(&self) -> usize {
        let neurons: usize = self.population().iter().map(|n| n.component_count()).sum();
        let receptors: usize = self
            .receptor_pools
            .iter()
            .flat_map(|pool| pool.receptors())
            .map(ComponentTree::component_count)
            .sum();
        let effectors: usize = self
            .effector_pool
            .effectors()
            .iter()
            .map(ComponentTree::component_count)
            .sum();
        neurons + receptors + effectors
    }
}

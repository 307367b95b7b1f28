// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Receptor and effector pools and their sparse pre-wiring.

Every `stride`-th pool member is wired to the neuron at
`(i + offset) mod population.len()`. Before association the pool-side
endpoint is moved toward the neuron until it is half the proximity threshold
away, so the following association pass always finds it.
*/

use std::borrow::Borrow;

use neurogen_components::{
    associate, ComponentTree, Effector, EnergyTick, GrowthContext, Modality, Neuron, Position,
    ReceptorTick, SensoryReceptor, SphereLayout, StimulusHandle, SynapseTransmitter,
};
use tracing::{debug, warn};

use crate::types::BduResult;

/// Stride, offset and layout shared by both pool kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolLayout {
    pub count: usize,
    pub stride: usize,
    pub offset: usize,
    pub points_per_layer: usize,
    pub anchor: Position,
}

impl PoolLayout {
    fn position(&self, index: usize) -> BduResult<Position> {
        let layout = SphereLayout::with_points_per_layer(self.points_per_layer);
        Ok(self.anchor + layout.point(index, self.count)?)
    }

    /// (pool index, neuron index) pairs to pre-wire
    pub fn wiring_plan(&self, population: usize) -> Vec<(usize, usize)> {
        if population == 0 || self.stride == 0 {
            return Vec::new();
        }
        (0..self.count)
            .step_by(self.stride)
            .map(|i| (i, (i + self.offset) % population))
            .collect()
    }
}

/// Summed outcome of one receptor update across a pool
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolTick {
    pub fired: usize,
    pub drive: f64,
    pub deposited: f64,
}

impl PoolTick {
    fn add(mut self, tick: &ReceptorTick) -> Self {
        self.fired += usize::from(tick.fired);
        self.drive += tick.drive;
        self.deposited += tick.deposited;
        self
    }

    pub fn merge(mut self, other: PoolTick) -> Self {
        self.fired += other.fired;
        self.drive += other.drive;
        self.deposited += other.deposited;
        self
    }
}

#[derive(Debug)]
pub struct ReceptorPool {
    modality: Modality,
    layout: PoolLayout,
    receptors: Vec<SensoryReceptor>,
}

impl ReceptorPool {
    /// Create `layout.count` receptors, each with `gaps_per_receptor` gaps
    pub fn create(
        ctx: &GrowthContext,
        modality: Modality,
        layout: PoolLayout,
        gaps_per_receptor: usize,
        sensitivity: f64,
        threshold: f64,
    ) -> BduResult<Self> {
        let mut receptors = Vec::with_capacity(layout.count);
        for i in 0..layout.count {
            let mut receptor = SensoryReceptor::create(ctx, modality, layout.position(i)?);
            receptor.initialise(ctx)?;
            receptor.set_sensitivity(sensitivity)?;
            receptor.set_threshold(threshold)?;
            for _ in 0..gaps_per_receptor {
                receptor.add_synaptic_gap(ctx)?;
            }
            receptors.push(receptor);
        }
        debug!(
            target: "neurogen-bdu",
            "Created {} {} receptor(s) with {} gap(s) each",
            receptors.len(),
            modality,
            gaps_per_receptor
        );
        Ok(Self {
            modality,
            layout,
            receptors,
        })
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.receptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receptors.is_empty()
    }

    pub fn receptors(&self) -> &[SensoryReceptor] {
        &self.receptors
    }

    pub fn get(&self, index: usize) -> Option<&SensoryReceptor> {
        self.receptors.get(index)
    }

    pub fn stimulus_handle(&self, index: usize) -> Option<StimulusHandle> {
        self.receptors.get(index).map(SensoryReceptor::stimulus_handle)
    }

    /// Wire sampled receptors onto neuron dendrites. Returns synapses formed.
    pub fn prewire<N>(&mut self, population: &[N], proximity_threshold: f64) -> BduResult<usize>
    where
        N: Borrow<Neuron>,
    {
        let keep = proximity_threshold / 2.0;
        let mut linked = 0;
        for (i, target) in self.layout.wiring_plan(population.len()) {
            let neuron = population[target].borrow();
            let Some(bouton) = neuron.lead_bouton_position() else {
                warn!(
                    target: "neurogen-bdu",
                    "Neuron {} has no dendrite bouton, skipping {} receptor {}",
                    neuron.id(),
                    self.modality,
                    i
                );
                continue;
            };
            let receptor = &mut self.receptors[i];
            for gap in receptor.synaptic_gaps() {
                receptor.nudge_gap_toward(gap, bouton, keep)?;
            }
            linked += associate(
                &receptor.gap_endpoints(),
                &neuron.bouton_endpoints(),
                proximity_threshold,
            );
        }
        debug!(
            target: "neurogen-bdu",
            "Pre-wired {} pool: {} synapse(s)",
            self.modality,
            linked
        );
        Ok(linked)
    }

    /// Gate and drain every receptor's stimulus, then run its energy tick
    pub fn update(&mut self, dt: f64) -> BduResult<PoolTick> {
        #[cfg(feature = "parallel")]
        let ticks: Vec<ReceptorTick> = {
            use rayon::prelude::*;
            self.receptors
                .par_iter_mut()
                .map(|receptor| receptor.update(dt))
                .collect::<Result<_, _>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let ticks: Vec<ReceptorTick> = self
            .receptors
            .iter_mut()
            .map(|receptor| receptor.update(dt))
            .collect::<Result<_, _>>()?;

        Ok(ticks.iter().fold(PoolTick::default(), PoolTick::add))
    }

    pub fn calculate_propagation_rate(&self) -> f64 {
        self.receptors
            .iter()
            .map(ComponentTree::calculate_propagation_rate)
            .sum()
    }
}

#[derive(Debug)]
pub struct EffectorPool {
    layout: PoolLayout,
    effectors: Vec<Effector>,
}

impl EffectorPool {
    pub fn create(ctx: &GrowthContext, layout: PoolLayout) -> BduResult<Self> {
        let mut effectors = Vec::with_capacity(layout.count);
        for i in 0..layout.count {
            let mut effector = Effector::create(ctx, layout.position(i)?);
            effector.initialise(ctx)?;
            effectors.push(effector);
        }
        Ok(Self { layout, effectors })
    }

    pub fn empty() -> Self {
        Self {
            layout: PoolLayout {
                count: 0,
                stride: 1,
                offset: 0,
                points_per_layer: 0,
                anchor: Position::ORIGIN,
            },
            effectors: Vec::new(),
        }
    }

    pub fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.effectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effectors.is_empty()
    }

    pub fn effectors(&self) -> &[Effector] {
        &self.effectors
    }

    pub fn get(&self, index: usize) -> Option<&Effector> {
        self.effectors.get(index)
    }

    /// Wire sampled effectors onto neuron axon gaps. Returns synapses formed.
    pub fn prewire<N>(&mut self, population: &[N], proximity_threshold: f64) -> BduResult<usize>
    where
        N: Borrow<Neuron>,
    {
        let keep = proximity_threshold / 2.0;
        let mut linked = 0;
        for (i, target) in self.layout.wiring_plan(population.len()) {
            let neuron = population[target].borrow();
            let gaps = neuron.gap_endpoints();
            // aim at a gap that can still be claimed, else the lead gap
            let Some(gap) = gaps
                .iter()
                .find(|gap| !gap.is_associated())
                .or_else(|| gaps.first())
                .map(SynapseTransmitter::position)
            else {
                warn!(
                    target: "neurogen-bdu",
                    "Neuron {} has no synaptic gap, skipping effector {}",
                    neuron.id(),
                    i
                );
                continue;
            };
            let effector = &mut self.effectors[i];
            effector.nudge_toward(gap, keep)?;
            let receivers = [effector.receiving_endpoint()?];
            linked += associate(&gaps, &receivers, proximity_threshold);
        }
        debug!(target: "neurogen-bdu", "Pre-wired effector pool: {} synapse(s)", linked);
        Ok(linked)
    }

    pub fn update_energy(&self, dt: f64) -> EnergyTick {
        self.effectors
            .iter()
            .map(|effector| effector.update_energy(dt))
            .fold(EnergyTick::default(), EnergyTick::merge)
    }

    pub fn calculate_propagation_rate(&self) -> f64 {
        self.effectors
            .iter()
            .map(ComponentTree::calculate_propagation_rate)
            .sum()
    }
}

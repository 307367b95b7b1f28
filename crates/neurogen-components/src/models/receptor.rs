// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensory receptors: stimulus accumulation, gating and transmitting gaps

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::traits::ComponentTree;
use crate::arena::ComponentArena;
use crate::component::Component;
use crate::context::GrowthContext;
use crate::energy::EnergyTick;
use crate::synapse::GapEndpoint;
use crate::types::{ComponentError, ComponentKind, ComponentResult, EntityKey, Position};

pub const DEFAULT_SENSITIVITY: f64 = 1.0;
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Sense a receptor pool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Visual,
    Auditory,
    Olfactory,
    Tactile,
    Gustatory,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Modality::Visual,
        Modality::Auditory,
        Modality::Olfactory,
        Modality::Tactile,
        Modality::Gustatory,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Modality::Visual => "visual",
            Modality::Auditory => "auditory",
            Modality::Olfactory => "olfactory",
            Modality::Tactile => "tactile",
            Modality::Gustatory => "gustatory",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shareable handle to a receptor's stimulus accumulator.
///
/// Input collaborators clone this and call [`stimulate`](Self::stimulate)
/// from any thread; the receptor drains it on its next update.
#[derive(Debug, Clone, Default)]
pub struct StimulusHandle(Arc<Mutex<f64>>);

impl StimulusHandle {
    /// Add `intensity` to the pending stimulus. Non-finite input is dropped.
    pub fn stimulate(&self, intensity: f64) {
        if intensity.is_finite() {
            *self.0.lock() += intensity;
        }
    }

    pub fn pending(&self) -> f64 {
        *self.0.lock()
    }

    fn take(&self) -> f64 {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Result of one receptor update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReceptorTick {
    pub drive: f64,
    pub fired: bool,
    pub deposited: f64,
    pub energy: EnergyTick,
}

#[derive(Debug)]
pub struct SensoryReceptor {
    id: usize,
    modality: Modality,
    position: Position,
    arena: ComponentArena,
    root: EntityKey,
    stimulus: StimulusHandle,
    sensitivity: f64,
    threshold: f64,
}

impl SensoryReceptor {
    pub fn create(ctx: &GrowthContext, modality: Modality, position: Position) -> Self {
        let mut arena = ComponentArena::new();
        let root = arena.create(ctx, ComponentKind::SensoryReceptor, position);
        let id = arena.get(root).map(Component::id).unwrap_or_default();
        Self {
            id,
            modality,
            position,
            arena,
            root,
            stimulus: StimulusHandle::default(),
            sensitivity: DEFAULT_SENSITIVITY,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Receptors are leaves: this only marks the root initialised.
    pub fn initialise(&mut self, ctx: &GrowthContext) -> ComponentResult<()> {
        self.arena.initialise(ctx, self.root)
    }

    /// Grow one more transmitting gap at the next layered sibling offset
    pub fn add_synaptic_gap(&mut self, ctx: &GrowthContext) -> ComponentResult<EntityKey> {
        self.arena.add_receptor_gap(ctx, self.root)
    }

    pub fn synaptic_gaps(&self) -> Vec<EntityKey> {
        self.arena
            .children_of_kind(self.root, ComponentKind::SynapticGap)
            .unwrap_or_default()
    }

    pub fn gap(&self, key: EntityKey) -> ComponentResult<&Component> {
        self.arena.get(key)
    }

    pub fn gap_endpoints(&self) -> Vec<GapEndpoint<'_>> {
        let owner = self.owner();
        self.synaptic_gaps()
            .into_iter()
            .filter_map(|key| {
                let gap = self.arena.get(key).ok()?;
                GapEndpoint::new(owner, key, gap).ok()
            })
            .collect()
    }

    /// Move gap `key` along the line to `target` until it is `keep` away.
    /// A gap already within `keep` stays where it is.
    pub fn nudge_gap_toward(&mut self, key: EntityKey, target: Position, keep: f64) -> ComponentResult<()> {
        let gap = self.arena.get_mut(key)?;
        let distance = gap.position().distance_to(&target);
        if distance > keep {
            let moved = gap.position().step_toward(&target, distance - keep);
            gap.set_position(moved);
        }
        Ok(())
    }

    pub fn stimulate(&self, intensity: f64) {
        self.stimulus.stimulate(intensity);
    }

    pub fn stimulus_handle(&self) -> StimulusHandle {
        self.stimulus.clone()
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) -> ComponentResult<()> {
        if !(sensitivity.is_finite() && sensitivity >= 0.0) {
            return Err(ComponentError::InvalidParameter {
                name: "sensitivity",
                value: sensitivity,
            });
        }
        self.sensitivity = sensitivity;
        Ok(())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) -> ComponentResult<()> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(ComponentError::InvalidParameter {
                name: "threshold",
                value: threshold,
            });
        }
        self.threshold = threshold;
        Ok(())
    }

    /// Drain the accumulated stimulus, gate it, then run the energy tick.
    ///
    /// `drive = accumulated * sensitivity`. A drive at or above the threshold
    /// is deposited as energy and nudges the propagation rate up; anything
    /// weaker nudges it down.
    pub fn update(&mut self, dt: f64) -> ComponentResult<ReceptorTick> {
        let drive = self.stimulus.take() * self.sensitivity;
        let fired = drive >= self.threshold;

        let root = self.arena.get_mut(self.root)?;
        let deposited = if fired { root.deposit_energy(drive) } else { 0.0 };
        root.receive_stimulation(if fired { 1 } else { -1 });

        if fired {
            trace!(
                target: "neurogen-components",
                "{} receptor {} fired with drive {:.3}",
                self.modality,
                self.id,
                drive
            );
        }

        Ok(ReceptorTick {
            drive,
            fired,
            deposited,
            energy: self.arena.update_energy(dt),
        })
    }
}

impl ComponentTree for SensoryReceptor {
    fn arena(&self) -> &ComponentArena {
        &self.arena
    }

    fn root(&self) -> EntityKey {
        self.root
    }

    fn root_kind(&self) -> ComponentKind {
        ComponentKind::SensoryReceptor
    }

    fn id(&self) -> usize {
        self.id
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Behaviour shared by every self-contained component tree

use crate::arena::ComponentArena;
use crate::change::ChangeRecord;
use crate::component::Component;
use crate::energy::EnergyTick;
use crate::synapse::EndpointOwner;
use crate::types::{ComponentKind, ComponentResult, EntityKey};

/// A root component together with the arena holding its grown subtree.
///
/// Neurons, sensory receptors and effectors each own one arena, so trees can
/// be grown and updated on different threads without sharing storage.
pub trait ComponentTree {
    fn arena(&self) -> &ComponentArena;

    fn root(&self) -> EntityKey;

    fn root_kind(&self) -> ComponentKind;

    /// Per-kind ID of the root component
    fn id(&self) -> usize;

    fn owner(&self) -> EndpointOwner {
        EndpointOwner::new(self.root_kind(), self.id())
    }

    fn root_component(&self) -> ComponentResult<&Component> {
        self.arena().get(self.root())
    }

    fn component_count(&self) -> usize {
        self.arena().len()
    }

    /// Mean propagation rate over every component in the tree
    fn calculate_propagation_rate(&self) -> f64 {
        self.arena().mean_propagation_rate()
    }

    fn update_energy(&self, dt: f64) -> EnergyTick {
        self.arena().update_energy(dt)
    }

    fn drain_changes(&self, out: &mut Vec<ChangeRecord>) {
        self.arena().drain_changes(out)
    }
}

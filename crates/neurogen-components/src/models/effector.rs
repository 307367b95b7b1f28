// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Effectors: receiving endpoints whose linked gaps are read by actuators

use super::traits::ComponentTree;
use crate::arena::ComponentArena;
use crate::component::Component;
use crate::context::GrowthContext;
use crate::synapse::{ReceivingEndpoint, SynapseLink};
use crate::types::{ComponentKind, ComponentResult, EntityKey, Position};

#[derive(Debug)]
pub struct Effector {
    id: usize,
    arena: ComponentArena,
    root: EntityKey,
}

impl Effector {
    pub fn create(ctx: &GrowthContext, position: Position) -> Self {
        let mut arena = ComponentArena::new();
        let root = arena.create(ctx, ComponentKind::Effector, position);
        let id = arena.get(root).map(Component::id).unwrap_or_default();
        Self { id, arena, root }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Position {
        self.root_component()
            .map(Component::position)
            .unwrap_or_default()
    }

    pub fn initialise(&mut self, ctx: &GrowthContext) -> ComponentResult<()> {
        self.arena.initialise(ctx, self.root)
    }

    pub fn receiving_endpoint(&self) -> ComponentResult<ReceivingEndpoint<'_>> {
        ReceivingEndpoint::new(self.root_component()?)
    }

    /// Gaps linked onto this effector, in the order they were accepted
    pub fn synaptic_gaps(&self) -> Vec<SynapseLink> {
        self.root_component()
            .map(Component::synaptic_gaps)
            .unwrap_or_default()
    }

    /// Move toward `target` until `keep` away; no-op when already closer.
    pub fn nudge_toward(&mut self, target: Position, keep: f64) -> ComponentResult<()> {
        let root = self.arena.get_mut(self.root)?;
        let distance = root.position().distance_to(&target);
        if distance > keep {
            let moved = root.position().step_toward(&target, distance - keep);
            root.set_position(moved);
        }
        Ok(())
    }
}

impl ComponentTree for Effector {
    fn arena(&self) -> &ComponentArena {
        &self.arena
    }

    fn root(&self) -> EntityKey {
        self.root
    }

    fn root_kind(&self) -> ComponentKind {
        ComponentKind::Effector
    }

    fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synapse::{associate, EndpointOwner, GapEndpoint};

    #[test]
    fn test_effector_is_a_leaf_receiver() {
        let ctx = GrowthContext::new();
        let mut effector = Effector::create(&ctx, Position::uniform(2.0));
        effector.initialise(&ctx).unwrap();
        assert_eq!(effector.component_count(), 1);
        assert!(effector.synaptic_gaps().is_empty());
    }

    #[test]
    fn test_nudged_effector_accepts_gap() {
        let ctx = GrowthContext::new();
        let mut effector = Effector::create(&ctx, Position::uniform(2.0));
        effector.initialise(&ctx).unwrap();

        let mut arena = ComponentArena::new();
        let gap = arena.create(&ctx, ComponentKind::SynapticGap, Position::ORIGIN);
        let owner = EndpointOwner::new(ComponentKind::SensoryReceptor, 0);
        let gaps = [GapEndpoint::new(owner, gap, arena.get(gap).unwrap()).unwrap()];

        assert_eq!(associate(&gaps, &[effector.receiving_endpoint().unwrap()], 0.2), 0);
        effector.nudge_toward(Position::ORIGIN, 0.1).unwrap();
        assert!((effector.position().length() - 0.1).abs() < 1e-9);
        assert_eq!(associate(&gaps, &[effector.receiving_endpoint().unwrap()], 0.2), 1);
        assert_eq!(effector.synaptic_gaps()[0].source, owner);
    }
}

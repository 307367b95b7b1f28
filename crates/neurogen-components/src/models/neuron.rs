// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
A neuron and the tree it grows.

```text
Neuron ─ Soma ─┬─ AxonHillock ─ Axon ─ AxonBouton ─ SynapticGap
               └─ DendriteBranch ─ Dendrite ─ DendriteBouton
```

Gaps are collected by walking the axon side of the tree, boutons by walking
the dendrite side. Every link accepted by one of this neuron's boutons is
also recorded on the neuron itself (see [`Neuron::incoming_synapses`]).
*/

use parking_lot::Mutex;

use super::traits::ComponentTree;
use crate::arena::ComponentArena;
use crate::component::Component;
use crate::context::GrowthContext;
use crate::synapse::{EndpointOwner, GapEndpoint, ReceivingEndpoint, SynapseLink};
use crate::types::{marker, ComponentError, ComponentKind, ComponentResult, EntityKey, Position};

#[derive(Debug)]
pub struct Neuron {
    id: usize,
    position: Position,
    arena: ComponentArena,
    root: EntityKey,
    incoming: Mutex<Vec<SynapseLink>>,
}

impl Neuron {
    /// Create an uninitialised neuron; call [`initialise`](Self::initialise)
    /// to grow its tree.
    pub fn create(ctx: &GrowthContext, position: Position) -> Self {
        let mut arena = ComponentArena::new();
        let root = arena.create(ctx, ComponentKind::Neuron, position);
        let id = arena.get(root).map(Component::id).unwrap_or_default();
        Self {
            id,
            position,
            arena,
            root,
            incoming: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_initialised(&self) -> bool {
        self.root_component().map(Component::is_initialised).unwrap_or(false)
    }

    pub fn initialise(&mut self, ctx: &GrowthContext) -> ComponentResult<()> {
        self.arena.initialise(ctx, self.root)
    }

    pub fn arena_mut(&mut self) -> &mut ComponentArena {
        &mut self.arena
    }

    pub fn soma(&self) -> ComponentResult<EntityKey> {
        self.arena
            .get_child::<marker::Soma>(self.root)?
            .ok_or(ComponentError::MissingChild {
                parent: ComponentKind::Neuron,
                child: ComponentKind::Soma,
            })
    }

    /// The axon grown by the soma's hillock
    pub fn primary_axon(&self) -> ComponentResult<EntityKey> {
        let missing = |parent, child| ComponentError::MissingChild { parent, child };
        let hillock = self
            .arena
            .get_child::<marker::AxonHillock>(self.soma()?)?
            .ok_or(missing(ComponentKind::Soma, ComponentKind::AxonHillock))?;
        self.arena
            .get_child::<marker::Axon>(hillock)?
            .ok_or(missing(ComponentKind::AxonHillock, ComponentKind::Axon))
    }

    /// Every synaptic gap in the axon tree, in walk order
    pub fn synaptic_gaps(&self) -> Vec<EntityKey> {
        self.arena
            .descendants_of_kind(self.root, ComponentKind::SynapticGap)
            .unwrap_or_default()
    }

    /// Every dendrite bouton in the dendrite tree, in walk order
    pub fn dendrite_boutons(&self) -> Vec<EntityKey> {
        self.arena
            .descendants_of_kind(self.root, ComponentKind::DendriteBouton)
            .unwrap_or_default()
    }

    pub fn lead_gap_position(&self) -> Option<Position> {
        let key = *self.synaptic_gaps().first()?;
        self.arena.get(key).ok().map(Component::position)
    }

    pub fn lead_bouton_position(&self) -> Option<Position> {
        let key = *self.dendrite_boutons().first()?;
        self.arena.get(key).ok().map(Component::position)
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

    /// Boutons as receivers, reporting accepted links to this neuron as well
    pub fn bouton_endpoints(&self) -> Vec<ReceivingEndpoint<'_>> {
        self.dendrite_boutons()
            .into_iter()
            .filter_map(|key| {
                let bouton = self.arena.get(key).ok()?;
                ReceivingEndpoint::new(bouton).ok()
            })
            .map(|endpoint| endpoint.with_registry(&self.incoming))
            .collect()
    }

    /// Links accepted by any of this neuron's boutons
    pub fn incoming_synapses(&self) -> Vec<SynapseLink> {
        self.incoming.lock().clone()
    }

    pub fn associated_gap_count(&self) -> usize {
        self.synaptic_gaps()
            .into_iter()
            .filter(|key| self.arena.get(*key).map(Component::is_associated).unwrap_or(false))
            .count()
    }

    pub fn add_dendrite_branch(&mut self, ctx: &GrowthContext) -> ComponentResult<EntityKey> {
        let soma = self.soma()?;
        self.arena.add_dendrite_branch(ctx, soma)
    }

    pub fn add_axon_branch(&mut self, ctx: &GrowthContext) -> ComponentResult<EntityKey> {
        let axon = self.primary_axon()?;
        self.arena.add_axon_branch(ctx, axon)
    }

    pub fn add_axon(&mut self, ctx: &GrowthContext, branch: EntityKey) -> ComponentResult<EntityKey> {
        self.arena.add_axon(ctx, branch)
    }

    pub fn add_dendrite(&mut self, ctx: &GrowthContext, branch: EntityKey) -> ComponentResult<EntityKey> {
        self.arena.add_dendrite(ctx, branch)
    }

    /// Stimulate the neuron's root component
    pub fn receive_stimulation(&mut self, stimulus: i8) -> ComponentResult<bool> {
        Ok(self.arena.get_mut(self.root)?.receive_stimulation(stimulus))
    }
}

impl ComponentTree for Neuron {
    fn arena(&self) -> &ComponentArena {
        &self.arena
    }

    fn root(&self) -> EntityKey {
        self.root
    }

    fn root_kind(&self) -> ComponentKind {
        ComponentKind::Neuron
    }

    fn id(&self) -> usize {
        self.id
    }

    fn owner(&self) -> EndpointOwner {
        EndpointOwner::new(ComponentKind::Neuron, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DEFAULT_PROPAGATION_RATE;

    #[test]
    fn test_create_is_uninitialised() {
        let ctx = GrowthContext::new();
        let neuron = Neuron::create(&ctx, Position::ORIGIN);
        assert!(!neuron.is_initialised());
        assert_eq!(neuron.component_count(), 1);
        assert!(neuron.soma().is_err());
    }

    #[test]
    fn test_initialise_grows_one_gap_and_one_bouton() {
        let ctx = GrowthContext::new();
        let mut neuron = Neuron::create(&ctx, Position::ORIGIN);
        neuron.initialise(&ctx).unwrap();
        neuron.initialise(&ctx).unwrap();

        assert!(neuron.is_initialised());
        assert_eq!(neuron.component_count(), 9);
        assert_eq!(neuron.synaptic_gaps().len(), 1);
        assert_eq!(neuron.dendrite_boutons().len(), 1);
        assert_eq!(neuron.lead_gap_position(), Some(Position::uniform(4.0)));
        // the dendrite is the branch's first layered sibling
        let sibling = crate::types::layered_fibonacci_sphere_point(1, 1).unwrap();
        assert_eq!(
            neuron.lead_bouton_position(),
            Some(Position::uniform(-2.0) + sibling)
        );
        assert!((neuron.calculate_propagation_rate() - DEFAULT_PROPAGATION_RATE).abs() < 1e-12);
    }

    #[test]
    fn test_branches_add_endpoints() {
        let ctx = GrowthContext::new();
        let mut neuron = Neuron::create(&ctx, Position::ORIGIN);
        neuron.initialise(&ctx).unwrap();

        neuron.add_axon_branch(&ctx).unwrap();
        let branch = neuron.add_dendrite_branch(&ctx).unwrap();
        neuron.add_dendrite(&ctx, branch).unwrap();

        assert_eq!(neuron.synaptic_gaps().len(), 2);
        assert_eq!(neuron.dendrite_boutons().len(), 3);
    }

    #[test]
    fn test_ids_are_per_kind() {
        let ctx = GrowthContext::new();
        let mut a = Neuron::create(&ctx, Position::ORIGIN);
        let mut b = Neuron::create(&ctx, Position::uniform(3.0));
        a.initialise(&ctx).unwrap();
        b.initialise(&ctx).unwrap();

        assert_eq!((a.id(), b.id()), (0, 1));
        let soma_b = b.arena().get(b.soma().unwrap()).unwrap();
        assert_eq!(soma_b.id(), 1);
        assert_eq!(ctx.ids().issued(ComponentKind::SynapticGap), 2);
    }

    #[test]
    fn test_root_stimulation() {
        let ctx = GrowthContext::new();
        let mut neuron = Neuron::create(&ctx, Position::ORIGIN);
        assert!(neuron.receive_stimulation(1).unwrap());
        let rate = neuron.root_component().unwrap().propagation_rate();
        assert!((rate - 0.55).abs() < 1e-12);
    }
}

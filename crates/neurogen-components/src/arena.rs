// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Generational arena owning a tree of components.
//!
//! Parent/child links are plain keys with no ownership; the arena owns every
//! component it created until [`ComponentArena::remove`] frees the subtree.
//! Freed slots are tombstoned and reused with a bumped generation, so a key
//! that outlived its component is reported as [`ComponentError::StaleKey`].
//!
//! Links never form a cycle: [`ComponentArena::connect`] refuses to make a
//! component its own ancestor. A component may still hang below parents of
//! several kinds, so walks visit each key once.

use std::collections::HashSet;

use tracing::trace;

use crate::change::ChangeRecord;
use crate::component::Component;
use crate::context::GrowthContext;
use crate::energy::EnergyTick;
use crate::types::{
    ComponentError, ComponentKind, ComponentResult, EntityKey, KindMarker, Position, Relation,
};

#[derive(Debug)]
struct Slot {
    generation: u32,
    component: Option<Component>,
}

#[derive(Debug, Default)]
pub struct ComponentArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl ComponentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an uninitialised component. Call [`initialise`](Self::initialise)
    /// to grow its default subtree.
    pub fn create(&mut self, ctx: &GrowthContext, kind: ComponentKind, position: Position) -> EntityKey {
        let component = Component::new(ctx.next_id(kind), kind, position, ctx.initial_energy());
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.component = Some(component);
            return EntityKey::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            component: Some(component),
        });
        EntityKey::new(index, 0)
    }

    pub fn get(&self, key: EntityKey) -> ComponentResult<&Component> {
        self.slots
            .get(key.index())
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.component.as_ref())
            .ok_or(ComponentError::StaleKey(key))
    }

    pub fn get_mut(&mut self, key: EntityKey) -> ComponentResult<&mut Component> {
        self.slots
            .get_mut(key.index())
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.component.as_mut())
            .ok_or(ComponentError::StaleKey(key))
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.get(key).is_ok()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live components in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Component)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.component
                .as_ref()
                .map(|c| (EntityKey::new(index as u32, slot.generation), c))
        })
    }

    /// Link `parent` → `child`.
    ///
    /// Any existing child of the same kind as `child` under `parent`, and any
    /// existing parent of the same kind as `parent` above `child`, is unlinked
    /// on both sides first.
    pub fn connect(&mut self, parent: EntityKey, child: EntityKey) -> ComponentResult<()> {
        if parent == child {
            return Err(ComponentError::SelfParenting(parent));
        }
        self.check_acyclic(parent, child)?;
        let parent_kind = self.get(parent)?.kind();
        let child_kind = self.get(child)?.kind();

        if let Some(previous) = self.get(parent)?.children.get(child_kind) {
            if previous != child {
                self.unlink(parent, previous)?;
            }
        }
        if let Some(previous) = self.get(child)?.parents.get(parent_kind) {
            if previous != parent {
                self.unlink(previous, child)?;
            }
        }

        let p = self.get_mut(parent)?;
        p.children.set(child_kind, child);
        if !p.owned.contains(&child) {
            p.owned.push(child);
        }
        self.get_mut(child)?.parents.set(parent_kind, parent);
        Ok(())
    }

    /// Attach an additional sibling: the child points back at `parent` and is
    /// owned by it, while `parent`'s per-kind child slot keeps its first child.
    pub(crate) fn attach(&mut self, parent: EntityKey, child: EntityKey) -> ComponentResult<()> {
        let child_kind = self.get(child)?.kind();
        if self.get(parent)?.children.get(child_kind).is_none() {
            return self.connect(parent, child);
        }
        if parent == child {
            return Err(ComponentError::SelfParenting(parent));
        }
        self.check_acyclic(parent, child)?;
        let parent_kind = self.get(parent)?.kind();
        if let Some(previous) = self.get(child)?.parents.get(parent_kind) {
            if previous != parent {
                self.unlink(previous, child)?;
            }
        }
        self.get_mut(parent)?.owned.push(child);
        self.get_mut(child)?.parents.set(parent_kind, parent);
        Ok(())
    }

    /// Fails if `child` already sits above `parent` through any parent link
    fn check_acyclic(&self, parent: EntityKey, child: EntityKey) -> ComponentResult<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![parent];
        while let Some(next) = stack.pop() {
            if next == child {
                return Err(ComponentError::Cycle { parent, child });
            }
            if !seen.insert(next) {
                continue;
            }
            if let Ok(component) = self.get(next) {
                stack.extend(component.parents.iter().map(|(_, key)| key));
            }
        }
        Ok(())
    }

    /// Remove the link between `parent` and `child` on both sides
    pub fn unlink(&mut self, parent: EntityKey, child: EntityKey) -> ComponentResult<()> {
        let parent_kind = self.get(parent)?.kind();
        let child_kind = self.get(child)?.kind();

        let p = self.get_mut(parent)?;
        p.children.clear_if(child_kind, child);
        p.owned.retain(|k| *k != child);
        self.get_mut(child)?.parents.clear_if(parent_kind, parent);
        Ok(())
    }

    fn checked_link(
        &self,
        key: Option<EntityKey>,
        relation: Relation,
        expected: ComponentKind,
    ) -> ComponentResult<Option<EntityKey>> {
        let Some(key) = key else {
            return Ok(None);
        };
        let found = self.get(key)?.kind();
        if found != expected {
            return Err(ComponentError::KindMismatch {
                relation,
                expected,
                found,
            });
        }
        Ok(Some(key))
    }

    pub fn parent_of(&self, key: EntityKey, kind: ComponentKind) -> ComponentResult<Option<EntityKey>> {
        let link = self.get(key)?.parents.get(kind);
        self.checked_link(link, Relation::Parent, kind)
    }

    pub fn child_of(&self, key: EntityKey, kind: ComponentKind) -> ComponentResult<Option<EntityKey>> {
        let link = self.get(key)?.children.get(kind);
        self.checked_link(link, Relation::Child, kind)
    }

    /// Typed parent lookup, e.g. `arena.get_parent::<marker::Soma>(hillock)`
    pub fn get_parent<K: KindMarker>(&self, key: EntityKey) -> ComponentResult<Option<EntityKey>> {
        self.parent_of(key, K::KIND)
    }

    /// Typed child lookup, e.g. `arena.get_child::<marker::Axon>(hillock)`
    pub fn get_child<K: KindMarker>(&self, key: EntityKey) -> ComponentResult<Option<EntityKey>> {
        self.child_of(key, K::KIND)
    }

    /// Owned children of `key` with the given kind, in insertion order
    pub fn children_of_kind(&self, key: EntityKey, kind: ComponentKind) -> ComponentResult<Vec<EntityKey>> {
        let component = self.get(key)?;
        Ok(component
            .owned
            .iter()
            .copied()
            .filter(|child| self.get(*child).map(|c| c.kind() == kind).unwrap_or(false))
            .collect())
    }

    /// `key` and everything it owns, depth first in insertion order.
    /// A component owned through two parents appears once.
    pub fn subtree(&self, key: EntityKey) -> ComponentResult<Vec<EntityKey>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![key];
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            let component = self.get(next)?;
            out.push(next);
            stack.extend(
                component
                    .owned
                    .iter()
                    .rev()
                    .copied()
                    .filter(|child| !seen.contains(child)),
            );
        }
        Ok(out)
    }

    /// Members of `key`'s subtree with the given kind, in walk order
    pub fn descendants_of_kind(&self, key: EntityKey, kind: ComponentKind) -> ComponentResult<Vec<EntityKey>> {
        Ok(self
            .subtree(key)?
            .into_iter()
            .filter(|k| self.get(*k).map(|c| c.kind() == kind).unwrap_or(false))
            .collect())
    }

    /// Free `key` and its whole owned subtree. Links from outside the subtree
    /// are cleared on both sides. Returns the number of components freed.
    pub fn remove(&mut self, key: EntityKey) -> ComponentResult<usize> {
        let doomed = self.subtree(key)?;
        let doomed_set: HashSet<EntityKey> = doomed.iter().copied().collect();
        let root = self.get(key)?;
        let root_kind = root.kind();
        let parents: Vec<(ComponentKind, EntityKey)> = root.parents.iter().collect();
        for (_, parent) in parents {
            if let Ok(p) = self.get_mut(parent) {
                p.children.clear_if(root_kind, key);
                p.owned.retain(|k| *k != key);
            }
        }

        for doomed_key in &doomed {
            // children connected to something outside the subtree lose the link
            let links: Vec<(ComponentKind, EntityKey)> = match self.get(*doomed_key) {
                Ok(c) => c.children.iter().chain(c.parents.iter()).collect(),
                Err(_) => continue,
            };
            let doomed_kind = self.get(*doomed_key)?.kind();
            for (_, other) in links {
                if doomed_set.contains(&other) {
                    continue;
                }
                if let Ok(o) = self.get_mut(other) {
                    o.parents.clear_if(doomed_kind, *doomed_key);
                    o.children.clear_if(doomed_kind, *doomed_key);
                    o.owned.retain(|k| k != doomed_key);
                }
            }
        }

        for doomed_key in &doomed {
            let slot = &mut self.slots[doomed_key.index()];
            slot.component = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(doomed_key.index() as u32);
            self.live -= 1;
        }
        trace!(target: "neurogen-components", "Freed {} component(s) under {}", doomed.len(), key);
        Ok(doomed.len())
    }

    /// Energy tick for every component; each draws from its primary parent.
    pub fn update_energy(&self, dt: f64) -> EnergyTick {
        let tick_one = |component: &Component| {
            let parent = component
                .primary_parent()
                .and_then(|key| self.get(key).ok())
                .map(|p| p.energy_cell());
            let tick = component.energy_cell().update(dt, parent);
            if tick.changed() {
                component.mark_dirty();
            }
            tick
        };
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.slots
                .par_iter()
                .filter_map(|slot| slot.component.as_ref())
                .map(tick_one)
                .reduce(EnergyTick::default, EnergyTick::merge)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.slots
                .iter()
                .filter_map(|slot| slot.component.as_ref())
                .map(tick_one)
                .fold(EnergyTick::default(), EnergyTick::merge)
        }
    }

    /// Append a record for every dirty component and clear the flags
    pub fn drain_changes(&self, out: &mut Vec<ChangeRecord>) {
        out.extend(
            self.iter()
                .filter(|(_, c)| c.take_dirty())
                .map(|(_, c)| c.change_record()),
        );
    }

    /// Mean propagation rate across every live component
    pub fn mean_propagation_rate(&self) -> f64 {
        if self.live == 0 {
            return 0.0;
        }
        let total: f64 = self.iter().map(|(_, c)| c.propagation_rate()).sum();
        total / self.live as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::marker;

    fn setup() -> (GrowthContext, ComponentArena) {
        (GrowthContext::new(), ComponentArena::new())
    }

    #[test]
    fn test_create_is_uninitialised() {
        let (ctx, mut arena) = setup();
        let key = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let soma = arena.get(key).unwrap();
        assert!(!soma.is_initialised());
        assert_eq!(soma.id(), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_connect_installs_bidirectional_link() {
        let (ctx, mut arena) = setup();
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.connect(soma, hillock).unwrap();

        assert_eq!(arena.get_child::<marker::AxonHillock>(soma).unwrap(), Some(hillock));
        assert_eq!(arena.get_parent::<marker::Soma>(hillock).unwrap(), Some(soma));
        assert_eq!(arena.get_parent::<marker::Neuron>(hillock).unwrap(), None);
    }

    #[test]
    fn test_reconnect_evicts_previous_parent() {
        let (ctx, mut arena) = setup();
        let p = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let p2 = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let c = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);

        arena.connect(p, c).unwrap();
        arena.connect(p2, c).unwrap();

        assert_eq!(arena.get_parent::<marker::Soma>(c).unwrap(), Some(p2));
        assert_eq!(arena.get_child::<marker::AxonHillock>(p).unwrap(), None);
        assert!(arena.get(p).unwrap().owned_children().is_empty());
        assert_eq!(arena.get_child::<marker::AxonHillock>(p2).unwrap(), Some(c));
    }

    #[test]
    fn test_reconnect_evicts_previous_child() {
        let (ctx, mut arena) = setup();
        let p = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let c1 = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        let c2 = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);

        arena.connect(p, c1).unwrap();
        arena.connect(p, c2).unwrap();

        assert_eq!(arena.get_child::<marker::AxonHillock>(p).unwrap(), Some(c2));
        assert_eq!(arena.get_parent::<marker::Soma>(c1).unwrap(), None);
    }

    #[test]
    fn test_self_parenting_rejected() {
        let (ctx, mut arena) = setup();
        let s = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        assert_eq!(arena.connect(s, s), Err(ComponentError::SelfParenting(s)));
    }

    #[test]
    fn test_stale_key_rejected() {
        let (ctx, mut arena) = setup();
        let s = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let h = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.remove(h).unwrap();
        assert_eq!(arena.connect(s, h), Err(ComponentError::StaleKey(h)));

        // the slot is reused under a new generation
        let again = arena.create(&ctx, ComponentKind::Axon, Position::ORIGIN);
        assert_eq!(again.index(), h.index());
        assert_ne!(again, h);
        assert!(arena.get(h).is_err());
        assert!(arena.get(again).is_ok());
    }

    #[test]
    fn test_remove_frees_subtree_and_unlinks_parent() {
        let (ctx, mut arena) = setup();
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        let axon = arena.create(&ctx, ComponentKind::Axon, Position::ORIGIN);
        arena.connect(soma, hillock).unwrap();
        arena.connect(hillock, axon).unwrap();

        assert_eq!(arena.remove(hillock).unwrap(), 2);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get_child::<marker::AxonHillock>(soma).unwrap(), None);
        assert!(!arena.contains(axon));
    }

    #[test]
    fn test_shared_child_is_freed_once() {
        let (ctx, mut arena) = setup();
        let bystander = arena.create(&ctx, ComponentKind::Effector, Position::ORIGIN);
        let neuron = arena.create(&ctx, ComponentKind::Neuron, Position::ORIGIN);
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.connect(neuron, soma).unwrap();
        arena.connect(soma, hillock).unwrap();
        arena.connect(neuron, hillock).unwrap();

        assert_eq!(arena.subtree(neuron).unwrap(), vec![neuron, soma, hillock]);
        assert_eq!(arena.remove(neuron).unwrap(), 3);
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(bystander));

        let fresh: Vec<EntityKey> = (0..4)
            .map(|_| arena.create(&ctx, ComponentKind::Axon, Position::ORIGIN))
            .collect();
        let distinct: HashSet<EntityKey> = fresh.iter().copied().collect();
        assert_eq!(distinct.len(), 4);
        assert!(!distinct.contains(&bystander));
        assert_eq!(arena.len(), 5);
    }

    #[test]
    fn test_removing_one_parent_clears_shared_child_from_the_other() {
        let (ctx, mut arena) = setup();
        let neuron = arena.create(&ctx, ComponentKind::Neuron, Position::ORIGIN);
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.connect(neuron, soma).unwrap();
        arena.connect(soma, hillock).unwrap();
        arena.connect(neuron, hillock).unwrap();

        assert_eq!(arena.remove(soma).unwrap(), 2);
        assert_eq!(arena.get_child::<marker::AxonHillock>(neuron).unwrap(), None);
        assert!(arena.get(neuron).unwrap().owned_children().is_empty());
        assert_eq!(arena.subtree(neuron).unwrap(), vec![neuron]);
    }

    #[test]
    fn test_cycles_rejected() {
        let (ctx, mut arena) = setup();
        let neuron = arena.create(&ctx, ComponentKind::Neuron, Position::ORIGIN);
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.connect(neuron, soma).unwrap();
        arena.connect(soma, hillock).unwrap();

        assert_eq!(
            arena.connect(hillock, soma),
            Err(ComponentError::Cycle { parent: hillock, child: soma })
        );
        assert_eq!(
            arena.connect(hillock, neuron),
            Err(ComponentError::Cycle { parent: hillock, child: neuron })
        );
        assert_eq!(
            arena.attach(hillock, neuron),
            Err(ComponentError::Cycle { parent: hillock, child: neuron })
        );

        // nothing was linked, so walks and the energy tick still finish
        assert_eq!(arena.get_parent::<marker::AxonHillock>(soma).unwrap(), None);
        assert_eq!(arena.subtree(neuron).unwrap(), vec![neuron, soma, hillock]);
        arena.update_energy(0.1);
        assert_eq!(arena.remove(neuron).unwrap(), 3);
    }

    #[test]
    fn test_subtree_walk_order() {
        let (ctx, mut arena) = setup();
        let root = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let a = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        let b = arena.create(&ctx, ComponentKind::DendriteBranch, Position::ORIGIN);
        let a1 = arena.create(&ctx, ComponentKind::Axon, Position::ORIGIN);
        arena.connect(root, a).unwrap();
        arena.connect(root, b).unwrap();
        arena.connect(a, a1).unwrap();

        assert_eq!(arena.subtree(root).unwrap(), vec![root, a, a1, b]);
    }

    #[test]
    fn test_energy_flows_down_from_parent() {
        let (ctx, mut arena) = setup();
        let soma = arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        let hillock = arena.create(&ctx, ComponentKind::AxonHillock, Position::ORIGIN);
        arena.connect(soma, hillock).unwrap();

        let tick = arena.update_energy(1.0);
        assert!(tick.consumed > 0.0);
        // the hillock burns 1.0 and can refill 1.0 of headroom from the soma
        assert!((arena.get(hillock).unwrap().energy_level() - 100.0).abs() < 1e-9);
        assert!(arena.get(soma).unwrap().energy_level() < 100.0);
    }

    #[test]
    fn test_drain_changes_clears_flags() {
        let (ctx, mut arena) = setup();
        arena.create(&ctx, ComponentKind::Soma, Position::ORIGIN);
        arena.create(&ctx, ComponentKind::Axon, Position::ORIGIN);

        let mut out = Vec::new();
        arena.drain_changes(&mut out);
        assert_eq!(out.len(), 2);

        out.clear();
        arena.drain_changes(&mut out);
        assert!(out.is_empty());
    }
}

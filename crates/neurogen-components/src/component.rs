// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The entity every grown structure is made of.
//!
//! A [`Component`] carries identity, position, a clamped propagation rate,
//! an energy store and typed parent/child link tables. Links are plain
//! [`EntityKey`]s into the owning [`ComponentArena`](crate::arena::ComponentArena);
//! a component never owns another component directly.

use core::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::change::ChangeRecord;
use crate::energy::{EnergyCell, EnergyState};
use crate::synapse::{Envelope, SynapseLink};
use crate::types::{ComponentError, ComponentKind, ComponentResult, EntityKey, Position};

pub const DEFAULT_PROPAGATION_RATE: f64 = 0.5;
pub const DEFAULT_LOWER_CLAMP: f64 = 0.1;
pub const DEFAULT_UPPER_CLAMP: f64 = 0.9;

/// One optional link per component kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable([Option<EntityKey>; ComponentKind::COUNT]);

impl LinkTable {
    pub fn get(&self, kind: ComponentKind) -> Option<EntityKey> {
        self.0[kind.index()]
    }

    pub(crate) fn set(&mut self, kind: ComponentKind, key: EntityKey) -> Option<EntityKey> {
        self.0[kind.index()].replace(key)
    }

    /// Clear the slot only if it still points at `key`
    pub(crate) fn clear_if(&mut self, kind: ComponentKind, key: EntityKey) -> bool {
        let slot = &mut self.0[kind.index()];
        if *slot == Some(key) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, EntityKey)> + '_ {
        ComponentKind::ALL
            .iter()
            .zip(self.0.iter())
            .filter_map(|(kind, slot)| slot.map(|key| (*kind, key)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// Kind-specific state
#[derive(Debug)]
pub enum ComponentData {
    /// Somas, axons, branches, hillocks, neuron and receptor roots
    Structural,
    /// Dendrite boutons and effectors: the gaps linked onto this endpoint
    Receiving { synaptic_gaps: Mutex<Vec<SynapseLink>> },
    /// Transmitting endpoint; `associated` only ever goes false → true
    SynapticGap {
        associated: AtomicBool,
        envelope: Envelope,
    },
}

impl ComponentData {
    pub fn for_kind(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::DendriteBouton | ComponentKind::Effector => ComponentData::Receiving {
                synaptic_gaps: Mutex::new(Vec::new()),
            },
            ComponentKind::SynapticGap => ComponentData::SynapticGap {
                associated: AtomicBool::new(false),
                envelope: Envelope::default(),
            },
            _ => ComponentData::Structural,
        }
    }
}

#[derive(Debug)]
pub struct Component {
    id: usize,
    kind: ComponentKind,
    position: Position,
    propagation_rate: f64,
    lower_clamp: f64,
    upper_clamp: f64,
    pub(crate) initialised: bool,
    pub(crate) parents: LinkTable,
    pub(crate) children: LinkTable,
    /// Every child this component grew or was connected to, in insertion order
    pub(crate) owned: Vec<EntityKey>,
    energy: EnergyCell,
    dirty: AtomicBool,
    data: ComponentData,
}

impl Component {
    pub(crate) fn new(id: usize, kind: ComponentKind, position: Position, energy: EnergyState) -> Self {
        Self {
            id,
            kind,
            position,
            propagation_rate: DEFAULT_PROPAGATION_RATE,
            lower_clamp: DEFAULT_LOWER_CLAMP,
            upper_clamp: DEFAULT_UPPER_CLAMP,
            initialised: false,
            parents: LinkTable::default(),
            children: LinkTable::default(),
            owned: Vec::new(),
            energy: EnergyCell::new(energy),
            dirty: AtomicBool::new(true),
            data: ComponentData::for_kind(kind),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.mark_dirty();
    }

    pub fn propagation_rate(&self) -> f64 {
        self.propagation_rate
    }

    pub fn stimulation_clamp(&self) -> (f64, f64) {
        (self.lower_clamp, self.upper_clamp)
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn parents(&self) -> &LinkTable {
        &self.parents
    }

    pub fn children(&self) -> &LinkTable {
        &self.children
    }

    /// Owned children in the order they were attached
    pub fn owned_children(&self) -> &[EntityKey] {
        &self.owned
    }

    /// The parent energy is drawn from: the first linked parent in kind order.
    pub fn primary_parent(&self) -> Option<EntityKey> {
        self.parents.iter().next().map(|(_, key)| key)
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    /// Nudge the propagation rate by `rate * lower_clamp * stimulus` and
    /// clamp it into `[lower_clamp, upper_clamp]`.
    ///
    /// Returns `false` when the result had to be clamped to a bound.
    pub fn receive_stimulation(&mut self, stimulus: i8) -> bool {
        let next = self.propagation_rate
            + self.propagation_rate * self.lower_clamp * f64::from(stimulus);
        let clamped = next.clamp(self.lower_clamp, self.upper_clamp);
        self.propagation_rate = clamped;
        self.mark_dirty();
        clamped == next
    }

    /// Replace the stimulation bounds. Bounds given in the wrong order are
    /// swapped; equal bounds or bounds outside `[0, 1]` are rejected.
    pub fn set_stimulation_clamp(&mut self, lower: f64, upper: f64) -> ComponentResult<()> {
        let (lower, upper) = if lower > upper { (upper, lower) } else { (lower, upper) };
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(lower) || !in_unit(upper) || lower == upper {
            return Err(ComponentError::InvalidClamp { lower, upper });
        }
        self.lower_clamp = lower;
        self.upper_clamp = upper;
        self.propagation_rate = self.propagation_rate.clamp(lower, upper);
        self.mark_dirty();
        Ok(())
    }

    /// Time for a signal to reach `target` at `rate`
    pub fn calc_propagation_time(&self, target: &Position, rate: f64) -> ComponentResult<f64> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(ComponentError::InvalidRate(rate));
        }
        Ok(self.position.distance_to(target) / rate)
    }

    pub fn energy(&self) -> EnergyState {
        self.energy.snapshot()
    }

    pub fn energy_level(&self) -> f64 {
        self.energy.level()
    }

    pub(crate) fn energy_cell(&self) -> &EnergyCell {
        &self.energy
    }

    /// Add external energy (receptor drive); returns what fitted.
    pub fn deposit_energy(&self, amount: f64) -> f64 {
        let accepted = self.energy.deposit(amount);
        if accepted > 0.0 {
            self.mark_dirty();
        }
        accepted
    }

    pub fn is_associated(&self) -> bool {
        match &self.data {
            ComponentData::SynapticGap { associated, .. } => associated.load(Ordering::Acquire),
            _ => false,
        }
    }

    /// Claim this gap for association. Exactly one caller ever wins.
    pub fn try_associate(&self) -> bool {
        match &self.data {
            ComponentData::SynapticGap { associated, .. } => {
                let won = associated
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
                if won {
                    self.mark_dirty();
                }
                won
            }
            _ => false,
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.data {
            ComponentData::SynapticGap { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    pub fn set_envelope(&mut self, value: Envelope) -> ComponentResult<()> {
        value.validate()?;
        match &mut self.data {
            ComponentData::SynapticGap { envelope, .. } => {
                *envelope = value;
                Ok(())
            }
            _ => Err(ComponentError::WrongKind {
                expected: "SynapticGap",
                found: self.kind,
            }),
        }
    }

    /// Gap list of a receiving endpoint
    pub(crate) fn receiving_list(&self) -> Option<&Mutex<Vec<SynapseLink>>> {
        match &self.data {
            ComponentData::Receiving { synaptic_gaps } => Some(synaptic_gaps),
            _ => None,
        }
    }

    /// Link a synaptic gap onto this dendrite bouton or effector.
    pub fn add_synaptic_gap(&self, link: SynapseLink) -> ComponentResult<()> {
        let list = self.receiving_list().ok_or(ComponentError::WrongKind {
            expected: "DendriteBouton or Effector",
            found: self.kind,
        })?;
        list.lock().push(link);
        self.mark_dirty();
        Ok(())
    }

    pub fn synaptic_gaps(&self) -> Vec<SynapseLink> {
        self.receiving_list()
            .map(|list| list.lock().clone())
            .unwrap_or_default()
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag, returning whether it was set
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn change_record(&self) -> ChangeRecord {
        ChangeRecord {
            kind: self.kind,
            id: self.id,
            position: self.position,
            propagation_rate: self.propagation_rate,
            energy_level: self.energy.level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::EnergyParams;

    fn component(kind: ComponentKind) -> Component {
        Component::new(0, kind, Position::ORIGIN, EnergyState::full(&EnergyParams::default()))
    }

    #[test]
    fn test_defaults() {
        let c = component(ComponentKind::Soma);
        assert_eq!(c.propagation_rate(), DEFAULT_PROPAGATION_RATE);
        assert_eq!(c.stimulation_clamp(), (0.1, 0.9));
        assert!(!c.is_initialised());
        assert!(c.parents().is_empty());
    }

    #[test]
    fn test_stimulation_within_bounds() {
        let mut c = component(ComponentKind::Axon);
        assert!(c.receive_stimulation(1));
        assert!((c.propagation_rate() - 0.55).abs() < 1e-12);
        assert!(c.receive_stimulation(-1));
    }

    #[test]
    fn test_stimulation_clamps_to_bound_not_zero() {
        let mut c = component(ComponentKind::Axon);
        assert!(!c.receive_stimulation(100));
        assert_eq!(c.propagation_rate(), 0.9);
        assert!(!c.receive_stimulation(-100));
        assert_eq!(c.propagation_rate(), 0.1);
    }

    #[test]
    fn test_set_stimulation_clamp() {
        let mut c = component(ComponentKind::Axon);
        c.set_stimulation_clamp(0.8, 0.6).unwrap();
        assert_eq!(c.stimulation_clamp(), (0.6, 0.8));
        assert_eq!(c.propagation_rate(), 0.6);

        assert!(c.set_stimulation_clamp(0.5, 0.5).is_err());
        assert!(c.set_stimulation_clamp(-0.1, 0.5).is_err());
        assert!(c.set_stimulation_clamp(0.2, 1.1).is_err());
        // failed calls leave the bounds alone
        assert_eq!(c.stimulation_clamp(), (0.6, 0.8));
    }

    #[test]
    fn test_calc_propagation_time() {
        let c = component(ComponentKind::Axon);
        let target = Position::new(3.0, 4.0, 0.0);
        assert!((c.calc_propagation_time(&target, 0.5).unwrap() - 10.0).abs() < 1e-12);
        assert!((c.calc_propagation_time(&target, 1.0).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(
            c.calc_propagation_time(&target, 0.0),
            Err(ComponentError::InvalidRate(0.0))
        );
        assert!(c.calc_propagation_time(&target, 1.5).is_err());
        assert!(c.calc_propagation_time(&target, f64::NAN).is_err());
    }

    #[test]
    fn test_gap_association_is_write_once() {
        let gap = component(ComponentKind::SynapticGap);
        assert!(!gap.is_associated());
        assert!(gap.try_associate());
        assert!(!gap.try_associate());
        assert!(gap.is_associated());

        let soma = component(ComponentKind::Soma);
        assert!(!soma.try_associate());
    }

    #[test]
    fn test_only_receiving_kinds_accept_gaps() {
        let link = SynapseLink::new(
            crate::synapse::EndpointOwner::new(ComponentKind::Neuron, 1),
            EntityKey::new(4, 0),
            9,
        );
        let bouton = component(ComponentKind::DendriteBouton);
        bouton.add_synaptic_gap(link).unwrap();
        assert_eq!(bouton.synaptic_gaps(), vec![link]);

        let axon = component(ComponentKind::Axon);
        assert!(matches!(
            axon.add_synaptic_gap(link),
            Err(ComponentError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_dirty_flag() {
        let mut c = component(ComponentKind::Soma);
        assert!(c.take_dirty());
        assert!(!c.take_dirty());
        c.receive_stimulation(1);
        assert!(c.is_dirty());
        let record = c.change_record();
        assert_eq!(record.kind, ComponentKind::Soma);
        assert!((record.propagation_rate - 0.55).abs() < 1e-12);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Proximity-based synaptic association.

For every transmitting gap that is not yet associated, receivers are scanned
in their natural order and the *first* one closer than the proximity
threshold wins. There is no nearest-match search: results depend on
receiver order, and callers rely on that.

The `associated` flag is claimed with a compare-and-swap before the link is
installed, so two threads racing for the same gap can never both link it.
Receivers append under their own lock. Association of different neuron
pairs can therefore run fully in parallel over shared references.
*/

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::component::Component;
use crate::models::Neuron;
use crate::types::{ComponentError, ComponentKind, ComponentResult, EntityKey, Position};

/// Root of the tree a gap belongs to (a neuron or a sensory receptor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointOwner {
    pub kind: ComponentKind,
    pub id: usize,
}

impl EndpointOwner {
    pub const fn new(kind: ComponentKind, id: usize) -> Self {
        Self { kind, id }
    }
}

/// Non-owning reference from a receiving endpoint back to a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynapseLink {
    pub source: EndpointOwner,
    pub gap: EntityKey,
    pub gap_id: usize,
}

impl SynapseLink {
    pub const fn new(source: EndpointOwner, gap: EntityKey, gap_id: usize) -> Self {
        Self { source, gap, gap_id }
    }
}

pub trait SynapseTransmitter {
    fn position(&self) -> Position;
    fn is_associated(&self) -> bool;
    /// Claim the transmitter; `true` for exactly one caller
    fn try_associate(&self) -> bool;
    fn link(&self) -> SynapseLink;
}

pub trait SynapseReceiver {
    /// Position the receiver is matched at
    fn position(&self) -> Position;
    fn accept(&self, link: SynapseLink);
}

/// A synaptic gap viewed as a transmitter
#[derive(Debug, Clone, Copy)]
pub struct GapEndpoint<'a> {
    gap: &'a Component,
    link: SynapseLink,
}

impl<'a> GapEndpoint<'a> {
    pub fn new(owner: EndpointOwner, key: EntityKey, gap: &'a Component) -> ComponentResult<Self> {
        if gap.kind() != ComponentKind::SynapticGap {
            return Err(ComponentError::WrongKind {
                expected: "SynapticGap",
                found: gap.kind(),
            });
        }
        Ok(Self {
            gap,
            link: SynapseLink::new(owner, key, gap.id()),
        })
    }

    pub fn component(&self) -> &'a Component {
        self.gap
    }
}

impl SynapseTransmitter for GapEndpoint<'_> {
    fn position(&self) -> Position {
        self.gap.position()
    }

    fn is_associated(&self) -> bool {
        self.gap.is_associated()
    }

    fn try_associate(&self) -> bool {
        self.gap.try_associate()
    }

    fn link(&self) -> SynapseLink {
        self.link
    }
}

/// A dendrite bouton or effector viewed as a receiver.
///
/// `presented_at` defaults to the component's own position; neuron-pair
/// association shifts it by the guidance vector. An optional registry (the
/// owning neuron's incoming list) receives a copy of every accepted link.
#[derive(Debug, Clone, Copy)]
pub struct ReceivingEndpoint<'a> {
    component: &'a Component,
    list: &'a Mutex<Vec<SynapseLink>>,
    presented_at: Position,
    registry: Option<&'a Mutex<Vec<SynapseLink>>>,
}

impl<'a> ReceivingEndpoint<'a> {
    pub fn new(component: &'a Component) -> ComponentResult<Self> {
        let list = component.receiving_list().ok_or(ComponentError::WrongKind {
            expected: "DendriteBouton or Effector",
            found: component.kind(),
        })?;
        Ok(Self {
            component,
            list,
            presented_at: component.position(),
            registry: None,
        })
    }

    #[must_use]
    pub fn with_registry(mut self, registry: &'a Mutex<Vec<SynapseLink>>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn shifted_by(mut self, shift: Position) -> Self {
        self.presented_at = self.component.position() + shift;
        self
    }

    pub fn component(&self) -> &'a Component {
        self.component
    }
}

impl SynapseReceiver for ReceivingEndpoint<'_> {
    fn position(&self) -> Position {
        self.presented_at
    }

    fn accept(&self, link: SynapseLink) {
        self.list.lock().push(link);
        self.component.mark_dirty();
        if let Some(registry) = self.registry {
            registry.lock().push(link);
        }
    }
}

/// Link every unassociated transmitter to the first receiver within
/// `proximity_threshold`. Returns the number of new links.
pub fn associate<T, R>(transmitters: &[T], receivers: &[R], proximity_threshold: f64) -> usize
where
    T: SynapseTransmitter,
    R: SynapseReceiver,
{
    let mut linked = 0;
    for gap in transmitters {
        if gap.is_associated() {
            continue;
        }
        let origin = gap.position();
        let Some(target) = receivers
            .iter()
            .find(|receiver| origin.distance_to(&receiver.position()) < proximity_threshold)
        else {
            continue;
        };
        // a racing thread may have claimed the gap since the check above
        if gap.try_associate() {
            target.accept(gap.link());
            linked += 1;
        }
    }
    linked
}

/// Translation that carries the receiver's leading bouton onto the
/// soma-relative spot of the transmitter's leading gap.
///
/// With it applied, two neurons of identical shape are compared by their
/// separation alone, and any difference in tree shape adds to the distance.
pub fn guidance_vector(transmitter: &Neuron, receiver: &Neuron) -> Option<Position> {
    let gap = transmitter.lead_gap_position()?;
    let bouton = receiver.lead_bouton_position()?;
    Some((gap - transmitter.position()) - (bouton - receiver.position()))
}

/// Associate `transmitter`'s axon gaps with `receiver`'s dendrite boutons.
pub fn associate_neurons(transmitter: &Neuron, receiver: &Neuron, proximity_threshold: f64) -> usize {
    let Some(shift) = guidance_vector(transmitter, receiver) else {
        return 0;
    };
    let gaps = transmitter.gap_endpoints();
    let boutons: Vec<ReceivingEndpoint<'_>> = receiver
        .bouton_endpoints()
        .into_iter()
        .map(|endpoint| endpoint.shifted_by(shift))
        .collect();

    let linked = associate(&gaps, &boutons, proximity_threshold);
    if linked > 0 {
        trace!(
            target: "neurogen-components",
            "Neuron {} -> Neuron {}: {} synapse(s)",
            transmitter.id(),
            receiver.id(),
            linked
        );
    }
    linked
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Closed set of component kinds and their compile-time markers
//!
//! Link tables hold one slot per kind, so a kind doubles as the key for
//! "the Soma of this Neuron" or "the Axon of this AxonHillock".

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Neuron,
    Soma,
    AxonHillock,
    Axon,
    AxonBranch,
    AxonBouton,
    DendriteBranch,
    Dendrite,
    DendriteBouton,
    SynapticGap,
    SensoryReceptor,
    Effector,
}

impl ComponentKind {
    pub const COUNT: usize = 12;

    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Neuron,
        ComponentKind::Soma,
        ComponentKind::AxonHillock,
        ComponentKind::Axon,
        ComponentKind::AxonBranch,
        ComponentKind::AxonBouton,
        ComponentKind::DendriteBranch,
        ComponentKind::Dendrite,
        ComponentKind::DendriteBouton,
        ComponentKind::SynapticGap,
        ComponentKind::SensoryReceptor,
        ComponentKind::Effector,
    ];

    /// Slot index in per-kind tables
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Neuron => "Neuron",
            ComponentKind::Soma => "Soma",
            ComponentKind::AxonHillock => "AxonHillock",
            ComponentKind::Axon => "Axon",
            ComponentKind::AxonBranch => "AxonBranch",
            ComponentKind::AxonBouton => "AxonBouton",
            ComponentKind::DendriteBranch => "DendriteBranch",
            ComponentKind::Dendrite => "Dendrite",
            ComponentKind::DendriteBouton => "DendriteBouton",
            ComponentKind::SynapticGap => "SynapticGap",
            ComponentKind::SensoryReceptor => "SensoryReceptor",
            ComponentKind::Effector => "Effector",
        }
    }

    /// Kinds that grow nothing on initialisation
    pub const fn is_leaf(self) -> bool {
        matches!(
            self,
            ComponentKind::DendriteBouton
                | ComponentKind::SynapticGap
                | ComponentKind::Effector
                | ComponentKind::SensoryReceptor
        )
    }

    /// Kinds that can accept a synaptic gap
    pub const fn is_receiving(self) -> bool {
        matches!(self, ComponentKind::DendriteBouton | ComponentKind::Effector)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Parent,
    Child,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Parent => f.write_str("parent"),
            Relation::Child => f.write_str("child"),
        }
    }
}

/// Compile-time tag for a [`ComponentKind`], used by typed link lookups
/// such as `arena.get_child::<marker::Soma>(neuron)`.
pub trait KindMarker {
    const KIND: ComponentKind;
}

macro_rules! kind_markers {
    ($($name:ident),* $(,)?) => {
        /// Zero-sized kind markers
        pub mod marker {
            use super::{ComponentKind, KindMarker};
            $(
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub struct $name;

                impl KindMarker for $name {
                    const KIND: ComponentKind = ComponentKind::$name;
                }
            )*
        }
    };
}

kind_markers!(
    Neuron,
    Soma,
    AxonHillock,
    Axon,
    AxonBranch,
    AxonBouton,
    DendriteBranch,
    Dendrite,
    DendriteBouton,
    SynapticGap,
    SensoryReceptor,
    Effector,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_table_order() {
        for (i, kind) in ComponentKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_markers() {
        assert_eq!(<marker::Soma as KindMarker>::KIND, ComponentKind::Soma);
        assert_eq!(<marker::Effector as KindMarker>::KIND, ComponentKind::Effector);
    }

    #[test]
    fn test_leaf_kinds() {
        let leaves: Vec<_> = ComponentKind::ALL.iter().filter(|k| k.is_leaf()).collect();
        assert_eq!(leaves.len(), 4);
        assert!(!ComponentKind::Neuron.is_leaf());
    }
}

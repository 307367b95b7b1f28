// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for component graph operations

use super::ids::EntityKey;
use super::kind::{ComponentKind, Relation};

/// Placement errors from the layered sphere layout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("Invalid placement total: {0} (a layout needs at least one point)")]
    InvalidTotal(usize),

    #[error("Placement index {index} exceeds layout total {total}")]
    IndexOutOfRange { index: usize, total: usize },
}

/// Errors raised by components and the arena that owns them
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    #[error("Component {0} cannot be its own parent")]
    SelfParenting(EntityKey),

    #[error("Entity key {0} does not refer to a live component")]
    StaleKey(EntityKey),

    #[error("Linking {parent} -> {child} would make {child} its own ancestor")]
    Cycle { parent: EntityKey, child: EntityKey },

    /// A typed lookup found a component of another kind behind the slot.
    /// The arena never produces this itself; it indicates corrupted links.
    #[error("{relation} link of kind {expected} resolves to a {found} component")]
    KindMismatch {
        relation: Relation,
        expected: ComponentKind,
        found: ComponentKind,
    },

    #[error("Operation requires a {expected} component, got {found}")]
    WrongKind {
        expected: &'static str,
        found: ComponentKind,
    },

    #[error("Propagation rate {0} is outside (0, 1]")]
    InvalidRate(f64),

    #[error("Invalid stimulation clamp bounds: lower={lower}, upper={upper}")]
    InvalidClamp { lower: f64, upper: f64 },

    #[error("{parent} has no {child} child")]
    MissingChild {
        parent: ComponentKind,
        child: ComponentKind,
    },

    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error(transparent)]
    Position(#[from] PositionError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

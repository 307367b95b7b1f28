// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions shared by every component kind

pub mod error;
pub mod ids;
pub mod kind;
pub mod position;

pub use error::{ComponentError, ComponentResult, PositionError};
pub use ids::{EntityKey, IdRegistry};
pub use kind::{marker, ComponentKind, KindMarker, Relation};
pub use position::{
    layered_fibonacci_sphere_point, Position, SphereLayout, DEFAULT_UNIT, POSITION_EPSILON,
};

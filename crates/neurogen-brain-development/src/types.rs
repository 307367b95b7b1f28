// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for BDU operations.
*/

use neurogen_components::{ComponentError, PositionError};
use neurogen_config::ConfigError;
use neurogen_state_manager::StateError;

/// Result type for BDU operations
pub type BduResult<T> = Result<T, BduError>;

/// Errors that can occur during brain development and simulation
#[derive(Debug, thiserror::Error)]
pub enum BduError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    /// No candidate far enough from every placed cluster
    #[error("No cluster position at least {min_distance} from every other cluster after {attempts} attempts")]
    ClusterPlacement { attempts: usize, min_distance: f64 },

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

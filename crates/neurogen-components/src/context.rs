// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared state for growing components on many threads

use crate::energy::{EnergyParams, EnergyState};
use crate::types::{ComponentKind, IdRegistry};

/// Per-kind ID counters and defaults for every component created through it.
///
/// One context is shared (by reference or `Arc`) by everything that grows
/// into the same population. Separate contexts never share IDs, which keeps
/// tests independent of each other.
#[derive(Debug, Default)]
pub struct GrowthContext {
    ids: IdRegistry,
    energy: EnergyParams,
}

impl GrowthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_energy(energy: EnergyParams) -> Self {
        Self {
            ids: IdRegistry::new(),
            energy,
        }
    }

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn next_id(&self, kind: ComponentKind) -> usize {
        self.ids.next_id(kind)
    }

    pub fn energy_params(&self) -> &EnergyParams {
        &self.energy
    }

    pub(crate) fn initial_energy(&self) -> EnergyState {
        EnergyState::full(&self.energy)
    }
}

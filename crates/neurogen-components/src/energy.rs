// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-component energy store with replenishment from the parent
//!
//! Every component owns an [`EnergyCell`]. A tick first burns
//! `consumption_rate * dt`, then draws up to `replenish_rate * dt` from the
//! parent. A root with no parent that has run completely dry is refilled
//! from an implicit external supply.
//!
//! Lock order is always child before parent. Links form a tree, so two
//! updates can never wait on each other in a cycle.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Energy settings applied to newly created components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyParams {
    pub max_energy_level: f64,
    pub consumption_rate: f64,
    pub replenish_rate: f64,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            max_energy_level: 100.0,
            consumption_rate: 1.0,
            replenish_rate: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    pub energy_level: f64,
    pub max_energy_level: f64,
    pub consumption_rate: f64,
    pub replenish_rate: f64,
}

impl EnergyState {
    /// Start at full charge
    pub fn full(params: &EnergyParams) -> Self {
        Self {
            energy_level: params.max_energy_level,
            max_energy_level: params.max_energy_level,
            consumption_rate: params.consumption_rate,
            replenish_rate: params.replenish_rate,
        }
    }

    pub fn headroom(&self) -> f64 {
        (self.max_energy_level - self.energy_level).max(0.0)
    }

    /// Burn `consumption_rate * dt`, floored at zero. Returns the amount burnt.
    pub fn consume(&mut self, dt: f64) -> f64 {
        let burnt = (self.consumption_rate * dt).max(0.0).min(self.energy_level);
        self.energy_level -= burnt;
        burnt
    }

    /// Add up to the remaining headroom. Returns the amount accepted.
    pub fn deposit(&mut self, amount: f64) -> f64 {
        let accepted = amount.max(0.0).min(self.headroom());
        self.energy_level += accepted;
        accepted
    }
}

/// Outcome of one energy tick for a single component
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTick {
    pub consumed: f64,
    pub drawn_from_parent: f64,
    pub refilled: f64,
}

impl EnergyTick {
    pub fn changed(&self) -> bool {
        self.consumed > 0.0 || self.drawn_from_parent > 0.0 || self.refilled > 0.0
    }

    /// Field-wise sum of two ticks
    pub fn merge(self, other: EnergyTick) -> EnergyTick {
        EnergyTick {
            consumed: self.consumed + other.consumed,
            drawn_from_parent: self.drawn_from_parent + other.drawn_from_parent,
            refilled: self.refilled + other.refilled,
        }
    }
}

/// Lock-protected energy store
#[derive(Debug)]
pub struct EnergyCell(Mutex<EnergyState>);

impl EnergyCell {
    pub fn new(state: EnergyState) -> Self {
        Self(Mutex::new(state))
    }

    pub fn snapshot(&self) -> EnergyState {
        *self.0.lock()
    }

    pub fn level(&self) -> f64 {
        self.0.lock().energy_level
    }

    pub fn deposit(&self, amount: f64) -> f64 {
        self.0.lock().deposit(amount)
    }

    pub fn set_level(&self, level: f64) {
        let mut state = self.0.lock();
        state.energy_level = level.clamp(0.0, state.max_energy_level);
    }

    /// One tick: consume, then draw from `parent` (or refill a dry root).
    ///
    /// Both locks are held for the transfer so a parent drained by several
    /// children at once never loses an update.
    pub fn update(&self, dt: f64, parent: Option<&EnergyCell>) -> EnergyTick {
        let mut own = self.0.lock();
        let mut tick = EnergyTick {
            consumed: own.consume(dt),
            ..EnergyTick::default()
        };

        match parent {
            Some(parent) => {
                let mut upstream = parent.0.lock();
                let amount = (own.replenish_rate * dt)
                    .max(0.0)
                    .min(upstream.energy_level)
                    .min(own.headroom());
                upstream.energy_level -= amount;
                own.energy_level += amount;
                tick.drawn_from_parent = amount;
            }
            None => {
                if own.energy_level == 0.0 {
                    tick.refilled = own.max_energy_level;
                    own.energy_level = own.max_energy_level;
                }
            }
        }
        tick
    }
}

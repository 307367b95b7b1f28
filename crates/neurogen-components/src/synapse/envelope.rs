// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Attack/decay/sustain/release envelope carried by synaptic gaps.
//!
//! The values are kept as state only; nothing in the growth or association
//! path reads them.

use serde::{Deserialize, Serialize};

use crate::types::{ComponentError, ComponentResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
    pub frequency: f64,
    pub phase: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 0.7,
            release: 0.2,
            frequency: 440.0,
            phase: 0.0,
        }
    }
}

impl Envelope {
    pub fn new(
        attack: f64,
        decay: f64,
        sustain: f64,
        release: f64,
        frequency: f64,
        phase: f64,
    ) -> ComponentResult<Self> {
        let envelope = Self {
            attack,
            decay,
            sustain,
            release,
            frequency,
            phase,
        };
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn validate(&self) -> ComponentResult<()> {
        for (name, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
            ("frequency", self.frequency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ComponentError::InvalidEnvelope(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(ComponentError::InvalidEnvelope(format!(
                "sustain must be within [0, 1], got {}",
                self.sustain
            )));
        }
        if !self.phase.is_finite() {
            return Err(ComponentError::InvalidEnvelope("phase must be finite".into()));
        }
        Ok(())
    }
}

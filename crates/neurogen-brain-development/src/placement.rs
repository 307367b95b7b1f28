// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Rejection sampling of cluster centres.

Candidates are drawn uniformly from the cube `[-half_extent, half_extent]³`.
The first candidate at least `min_distance` from every accepted centre wins.
Sampling gives up after a bounded number of attempts, which is the only
retrying loop in brain development.
*/

use neurogen_components::Position;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::types::{BduError, BduResult};

pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

#[derive(Debug)]
pub struct ClusterPlacer {
    rng: StdRng,
    half_extent: f64,
    max_attempts: usize,
    placed: Vec<Position>,
}

impl ClusterPlacer {
    /// `seed = None` draws the generator state from the OS
    pub fn new(half_extent: f64, seed: Option<u64>) -> BduResult<Self> {
        if !(half_extent.is_finite() && half_extent > 0.0) {
            return Err(BduError::InvalidParameter {
                name: "cluster_half_extent",
                value: half_extent,
            });
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            half_extent,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            placed: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn half_extent(&self) -> f64 {
        self.half_extent
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Centres accepted so far, in acceptance order
    pub fn placed(&self) -> &[Position] {
        &self.placed
    }

    /// Accept and return a new centre at least `min_distance` from the others.
    ///
    /// # Errors
    ///
    /// `BduError::ClusterPlacement` after `max_attempts` rejected candidates.
    pub fn place(&mut self, min_distance: f64) -> BduResult<Position> {
        let h = self.half_extent;
        for attempt in 1..=self.max_attempts {
            let candidate = Position::new(
                self.rng.gen_range(-h..=h),
                self.rng.gen_range(-h..=h),
                self.rng.gen_range(-h..=h),
            );
            if self
                .placed
                .iter()
                .all(|other| other.distance_to(&candidate) >= min_distance)
            {
                debug!(
                    target: "neurogen-bdu",
                    "Placed cluster {} at {} after {} attempt(s)",
                    self.placed.len(),
                    candidate,
                    attempt
                );
                self.placed.push(candidate);
                return Ok(candidate);
            }
        }

        warn!(
            target: "neurogen-bdu",
            "Gave up placing cluster {} (min distance {}, half extent {})",
            self.placed.len(),
            min_distance,
            h
        );
        Err(BduError::ClusterPlacement {
            attempts: self.max_attempts,
            min_distance,
        })
    }
}

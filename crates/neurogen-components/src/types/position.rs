// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial types for 3D growth coordinates
//!
//! `Position` is a plain value type: every "mutation" returns a new value.
//! Layout of sibling lists and whole populations goes through
//! [`layered_fibonacci_sphere_point`], which is a pure function of its
//! arguments so that grown structures are reproducible.

use core::f64::consts::PI;
use core::fmt;
use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use super::error::PositionError;

/// Two positions are equal when the sum of absolute axis differences is below this.
pub const POSITION_EPSILON: f64 = 1e-12;

/// Radial spacing between concentric placement shells.
pub const DEFAULT_UNIT: f64 = 0.1;

/// 3D position (x, y, z) in simulation space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same offset on every axis, e.g. `uniform(1.0)` for the +1 growth step.
    pub const fn uniform(d: f64) -> Self {
        Self::new(d, d, d)
    }

    /// Translate by `(dx, dy, dz)`.
    #[must_use]
    pub fn move_by(&self, dx: f64, dy: f64, dz: f64) -> Position {
        Position::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Translate by `(dx + other.x, dy + other.y, dz + other.z)`.
    #[must_use]
    pub fn move_relative_to(&self, other: &Position, dx: f64, dy: f64, dz: f64) -> Position {
        self.move_by(dx + other.x, dy + other.y, dz + other.z)
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Position {
        Position::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean distance
    pub fn distance_to(&self, other: &Position) -> f64 {
        (*other - *self).length()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Move `step` units along the straight line toward `target`, never past it.
    #[must_use]
    pub fn step_toward(&self, target: &Position, step: f64) -> Position {
        let delta = *target - *self;
        let distance = delta.length();
        if distance <= step || distance == 0.0 {
            return *target;
        }
        *self + delta.scale(step / distance)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
            < POSITION_EPSILON
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Position::new(x, y, z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }
}

/// Shell parameters for layered Fibonacci placement.
///
/// Shell `k` (1-based) has radius `k * unit`. Its capacity is
/// `floor(4πk²)` (the shell area measured in `unit²`) unless
/// `points_per_layer` is non-zero, in which case every shell holds exactly
/// that many points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereLayout {
    pub unit: f64,
    pub points_per_layer: usize,
}

impl Default for SphereLayout {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            points_per_layer: 0,
        }
    }
}

impl SphereLayout {
    pub fn with_points_per_layer(points_per_layer: usize) -> Self {
        Self {
            points_per_layer,
            ..Self::default()
        }
    }

    /// Number of points shell `shell` (1-based) can hold.
    pub fn shell_capacity(&self, shell: usize) -> usize {
        if self.points_per_layer > 0 {
            return self.points_per_layer;
        }
        let k = shell as f64;
        ((4.0 * PI * k * k).floor() as usize).max(1)
    }

    /// Smallest shell count whose cumulative capacity reaches `total`.
    pub fn shell_count(&self, total: usize) -> usize {
        let mut shells = 0;
        let mut capacity = 0;
        while capacity < total {
            shells += 1;
            capacity += self.shell_capacity(shells);
        }
        shells.max(1)
    }

    /// Radius of the sphere enclosing a layout of `total` points.
    pub fn overall_radius(&self, total: usize) -> f64 {
        self.shell_count(total) as f64 * self.unit
    }

    /// (shell, index within shell, shell capacity) for a global index
    fn locate(&self, index: usize) -> (usize, usize, usize) {
        let mut shell = 1;
        let mut start = 0;
        loop {
            let capacity = self.shell_capacity(shell);
            if index < start + capacity {
                return (shell, index - start, capacity);
            }
            start += capacity;
            shell += 1;
        }
    }

    /// Place point `index` of a `total`-point layout.
    ///
    /// `index == total` is accepted so that "one more sibling" can be placed
    /// with `point(n + 1, n + 1)`.
    pub fn point(&self, index: usize, total: usize) -> Result<Position, PositionError> {
        if total == 0 {
            return Err(PositionError::InvalidTotal(total));
        }
        if index > total {
            return Err(PositionError::IndexOutOfRange { index, total });
        }

        let (shell, local, capacity) = self.locate(index);
        let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
        let theta = local as f64 * golden_angle;
        let y = if capacity > 1 {
            1.0 - 2.0 * local as f64 / (capacity - 1) as f64
        } else {
            1.0
        };
        let ring = (1.0 - y * y).max(0.0).sqrt();
        let radius = shell as f64 * self.unit;

        Ok(Position::new(theta.cos() * ring, y, theta.sin() * ring).scale(radius))
    }
}

/// Deterministic placement of point `index` out of `total` on concentric
/// golden-angle spiral shells, using the default shell unit.
pub fn layered_fibonacci_sphere_point(index: usize, total: usize) -> Result<Position, PositionError> {
    SphereLayout::default().point(index, total)
}

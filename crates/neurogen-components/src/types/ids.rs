// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types: arena keys and per-kind component IDs

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use super::kind::ComponentKind;

/// Generational index into a [`ComponentArena`](crate::arena::ComponentArena).
///
/// A key stays valid until its slot is freed; a reused slot carries a new
/// generation, so old keys are detected instead of silently aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    index: u32,
    generation: u32,
}

impl EntityKey {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(&self) -> usize {
        self.index as usize
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Monotonic ID counters, one per component kind.
///
/// IDs are unique within a kind only; a Soma and an Axon may both be `7`.
/// Counters are atomic so neurons can be grown on many threads at once.
#[derive(Debug)]
pub struct IdRegistry {
    counters: [AtomicUsize; ComponentKind::COUNT],
}

impl IdRegistry {
    pub fn new() -> Self {
        Self {
            counters: core::array::from_fn(|_| AtomicUsize::new(0)),
        }
    }

    /// Claim the next ID for `kind`
    pub fn next_id(&self, kind: ComponentKind) -> usize {
        self.counters[kind.index()].fetch_add(1, Ordering::Relaxed)
    }

    /// How many IDs have been handed out for `kind`
    pub fn issued(&self, kind: ComponentKind) -> usize {
        self.counters[kind.index()].load(Ordering::Relaxed)
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

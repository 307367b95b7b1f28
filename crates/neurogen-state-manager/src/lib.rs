// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurogen State Manager
//!
//! Hands mutated components from the simulation to persistence without
//! ever blocking the simulation thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Simulation tick                   │  ← drains dirty flags into ChangeRecords
//! └─────────────────────────────────────┘
//!           ↓ record()
//! ┌─────────────────────────────────────┐
//! │   ChangeTracker                     │  ← pending set, coalesced per (kind, id)
//! └─────────────────────────────────────┘
//!           ↓ flush() → try_send
//! ┌─────────────────────────────────────┐
//! │   Bounded channel of ChangeBatch    │
//! └─────────────────────────────────────┘
//!           ↓
//! ┌─────────────────────────────────────┐
//! │   PersistenceWorker → sink          │  ← memory or bincode snapshot file
//! └─────────────────────────────────────┘
//! ```
//!
//! A full channel never blocks the producer: the batch goes back into the
//! pending set and is retried on the next flush, merged with anything newer.

pub mod change_tracker;
pub mod run_control;
pub mod sink;
pub mod worker;

pub use change_tracker::{ChangeBatch, ChangeTracker, FlushOutcome};
pub use run_control::RunControl;
pub use sink::{read_snapshot_file, MemorySink, PersistenceSink, SnapshotFileSink, MAX_FRAME_BYTES};
pub use worker::{PersistenceStats, PersistenceWorker, WorkerThread};

/// State manager error types
#[derive(Debug)]
pub enum StateError {
    /// I/O error (file operations)
    Io(std::io::Error),

    /// Serialization error
    SerializationError(String),

    /// Persistence sink failure
    PersistenceError(String),

    /// The persistence side of the change channel is gone
    ChannelClosed,

    /// A worker thread could not be started
    WorkerSpawn(String),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::Io(e) => write!(f, "I/O error: {}", e),
            StateError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StateError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            StateError::ChannelClosed => write!(f, "Change channel closed"),
            StateError::WorkerSpawn(msg) => write!(f, "Failed to spawn worker: {}", msg),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(e: std::io::Error) -> Self {
        StateError::Io(e)
    }
}

impl From<bincode::Error> for StateError {
    fn from(e: bincode::Error) -> Self {
        StateError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Alias used by crates that import several result types
pub type StateResult<T> = Result<T>;

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pending-change set and batch hand-off
//!
//! Producers [`record`](ChangeTracker::record) changes under one lock; a later
//! record for the same `(kind, id)` replaces the earlier one.
//! [`flush`](ChangeTracker::flush) swaps the whole set out under the same lock
//! and offers it to the channel with `try_send`.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use neurogen_components::{ChangeRecord, ComponentKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Result, StateError};

/// Immutable set of records handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub sequence: u64,
    pub records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing pending
    Empty,
    /// A batch with this many records was queued
    Sent(usize),
    /// Channel full; this many records stay pending
    Deferred(usize),
}

pub struct ChangeTracker {
    pending: Mutex<AHashMap<(ComponentKind, usize), ChangeRecord>>,
    tx: Sender<ChangeBatch>,
    sequence: AtomicU64,
    deferred: AtomicU64,
}

impl ChangeTracker {
    /// Tracker plus the consuming end of a channel holding `capacity` batches
    pub fn new(capacity: usize) -> (Self, Receiver<ChangeBatch>) {
        let (tx, rx) = channel::bounded(capacity.max(1));
        let tracker = Self {
            pending: Mutex::new(AHashMap::new()),
            tx,
            sequence: AtomicU64::new(0),
            deferred: AtomicU64::new(0),
        };
        (tracker, rx)
    }

    pub fn record(&self, record: ChangeRecord) {
        self.pending.lock().insert(record.key(), record);
    }

    pub fn record_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = ChangeRecord>,
    {
        let mut pending = self.pending.lock();
        for record in records {
            pending.insert(record.key(), record);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of flushes that found the channel full
    pub fn deferred_flushes(&self) -> u64 {
        self.deferred.load(Ordering::Relaxed)
    }

    /// Offer everything pending as one batch. Never blocks.
    ///
    /// # Errors
    ///
    /// `StateError::ChannelClosed` if the consumer is gone; the records stay
    /// pending.
    pub fn flush(&self) -> Result<FlushOutcome> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let mut records: Vec<ChangeRecord> = pending.drain().map(|(_, r)| r).collect();
        records.sort_by_key(|r| (r.kind.index(), r.id));
        let count = records.len();
        let batch = ChangeBatch {
            sequence: self.sequence.load(Ordering::Relaxed),
            records,
        };

        match self.tx.try_send(batch) {
            Ok(()) => {
                self.sequence.fetch_add(1, Ordering::Relaxed);
                trace!(target: "neurogen-state", "Queued change batch of {} record(s)", count);
                Ok(FlushOutcome::Sent(count))
            }
            Err(TrySendError::Full(batch)) => {
                pending.extend(batch.records.into_iter().map(|r| (r.key(), r)));
                self.deferred.fetch_add(1, Ordering::Relaxed);
                debug!(
                    target: "neurogen-state",
                    "Change channel full, keeping {} record(s) pending",
                    count
                );
                Ok(FlushOutcome::Deferred(count))
            }
            Err(TrySendError::Disconnected(batch)) => {
                pending.extend(batch.records.into_iter().map(|r| (r.key(), r)));
                Err(StateError::ChannelClosed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurogen_components::Position;

    fn record(kind: ComponentKind, id: usize, rate: f64) -> ChangeRecord {
        ChangeRecord {
            kind,
            id,
            position: Position::ORIGIN,
            propagation_rate: rate,
            energy_level: 100.0,
        }
    }

    #[test]
    fn test_records_coalesce_per_kind_and_id() {
        let (tracker, rx) = ChangeTracker::new(4);
        tracker.record(record(ComponentKind::Soma, 1, 0.5));
        tracker.record(record(ComponentKind::Soma, 1, 0.6));
        tracker.record(record(ComponentKind::Axon, 1, 0.7));
        assert_eq!(tracker.pending_len(), 2);

        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Sent(2));
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.sequence, 0);
        // sorted by kind order: Soma before Axon
        assert_eq!(batch.records[0].kind, ComponentKind::Soma);
        assert_eq!(batch.records[0].propagation_rate, 0.6);
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn test_empty_flush() {
        let (tracker, rx) = ChangeTracker::new(1);
        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Empty);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_channel_defers_without_loss() {
        let (tracker, rx) = ChangeTracker::new(1);
        tracker.record(record(ComponentKind::Soma, 0, 0.5));
        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Sent(1));

        tracker.record(record(ComponentKind::Soma, 1, 0.5));
        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Deferred(1));
        assert_eq!(tracker.deferred_flushes(), 1);

        // newer value for the deferred record wins after merge
        tracker.record(record(ComponentKind::Soma, 1, 0.8));
        tracker.record(record(ComponentKind::Axon, 3, 0.5));

        assert_eq!(rx.try_recv().unwrap().sequence, 0);
        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Sent(2));
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.sequence, 1);
        assert_eq!(batch.records[0].propagation_rate, 0.8);
    }

    #[test]
    fn test_closed_channel_keeps_records() {
        let (tracker, rx) = ChangeTracker::new(1);
        drop(rx);
        tracker.record(record(ComponentKind::Soma, 0, 0.5));
        assert!(matches!(tracker.flush(), Err(StateError::ChannelClosed)));
        assert_eq!(tracker.pending_len(), 1);
    }

    #[test]
    fn test_concurrent_producers() {
        let (tracker, rx) = ChangeTracker::new(8);
        std::thread::scope(|scope| {
            for t in 0..4 {
                let tracker = &tracker;
                scope.spawn(move || {
                    for id in 0..100 {
                        tracker.record(record(ComponentKind::Dendrite, t * 100 + id, 0.5));
                    }
                });
            }
        });
        assert_eq!(tracker.flush().unwrap(), FlushOutcome::Sent(400));
        assert_eq!(rx.try_recv().unwrap().len(), 400);
    }
}

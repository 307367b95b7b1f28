// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Worker threads that consume change batches

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use crate::change_tracker::ChangeBatch;
use crate::sink::PersistenceSink;
use crate::{Result, StateError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A thread that pulls items from a channel and hands them to a handler.
///
/// The loop exits when the channel disconnects or [`stop`](Self::stop) is
/// called. On stop, items already queued are still handled before the thread
/// ends. Dropping the worker stops and joins it.
pub struct WorkerThread<T: Send + 'static> {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    name: String,
    _phantom: PhantomData<T>,
}

impl<T: Send + 'static> WorkerThread<T> {
    pub fn spawn<F, E>(name: String, rx: Receiver<T>, mut handler: F) -> Result<Self>
    where
        F: FnMut(T) -> std::result::Result<(), E> + Send + 'static,
        E: std::fmt::Display,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let name_clone = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut handle_item = |item: T| {
                    if let Err(e) = handler(item) {
                        warn!(target: "neurogen-state", "[{}] Handler error: {}", name_clone, e);
                    }
                };

                while !shutdown_clone.load(Ordering::Relaxed) {
                    match rx.recv_timeout(POLL_INTERVAL) {
                        Ok(item) => handle_item(item),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                for item in rx.try_iter() {
                    handle_item(item);
                }
                debug!(target: "neurogen-state", "[{}] Worker exiting", name_clone);
            })
            .map_err(|e| StateError::WorkerSpawn(format!("{}: {}", name, e)))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            name,
            _phantom: PhantomData,
        })
    }

    /// Signal the worker to stop and wait for it to finish
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(target: "neurogen-state", "[{}] Worker panicked", self.name);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed)
            && self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Send + 'static> Drop for WorkerThread<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Counters updated by the persistence thread
#[derive(Debug, Default)]
pub struct PersistenceStats {
    batches: AtomicU64,
    records: AtomicU64,
    failures: AtomicU64,
}

impl PersistenceStats {
    pub fn batches_written(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn records_written(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Writes every received [`ChangeBatch`] to a sink on its own thread
pub struct PersistenceWorker {
    worker: WorkerThread<ChangeBatch>,
    stats: Arc<PersistenceStats>,
}

impl PersistenceWorker {
    pub fn spawn<S>(rx: Receiver<ChangeBatch>, mut sink: S) -> Result<Self>
    where
        S: PersistenceSink + 'static,
    {
        let stats = Arc::new(PersistenceStats::default());
        let thread_stats = Arc::clone(&stats);

        let worker = WorkerThread::spawn("neurogen-persistence".to_string(), rx, move |batch| {
            let result = sink.write_batch(&batch).and_then(|_| sink.flush());
            match &result {
                Ok(()) => {
                    thread_stats.batches.fetch_add(1, Ordering::Relaxed);
                    thread_stats
                        .records
                        .fetch_add(batch.len() as u64, Ordering::Relaxed);
                }
                Err(_) => {
                    thread_stats.failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            result
        })?;

        info!(target: "neurogen-state", "Persistence worker started");
        Ok(Self { worker, stats })
    }

    pub fn stats(&self) -> Arc<PersistenceStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Drain what is queued, then join the thread
    pub fn stop(&mut self) {
        self.worker.stop();
        info!(
            target: "neurogen-state",
            "Persistence worker stopped: {} batch(es), {} record(s), {} failure(s)",
            self.stats.batches_written(),
            self.stats.records_written(),
            self.stats.failures()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crossbeam::channel;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_worker_thread() {
        let (tx, rx) = channel::bounded(10);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut worker = WorkerThread::spawn(
            "test-worker".to_string(),
            rx,
            move |n: usize| -> std::result::Result<(), String> {
                counter_clone.fetch_add(n, Ordering::Relaxed);
                Ok(())
            },
        )
        .unwrap();

        assert!(worker.is_running());

        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.send(3).unwrap();

        // stop drains what is already queued
        worker.stop();
        assert_eq!(counter.load(Ordering::Relaxed), 6);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_worker_exits_on_disconnect() {
        let (tx, rx) = channel::bounded::<u8>(1);
        let worker = WorkerThread::spawn(
            "test-disconnect".to_string(),
            rx,
            |_| -> std::result::Result<(), String> { Ok(()) },
        )
        .unwrap();
        drop(tx);
        for _ in 0..50 {
            if !worker.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!worker.is_running());
    }

    #[test]
    fn test_persistence_worker_writes_batches() {
        let (tx, rx) = channel::bounded(4);
        let sink = MemorySink::new();
        let mut worker = PersistenceWorker::spawn(rx, sink.clone()).unwrap();
        let stats = worker.stats();

        tx.send(ChangeBatch { sequence: 0, records: Vec::new() }).unwrap();
        tx.send(ChangeBatch { sequence: 1, records: Vec::new() }).unwrap();
        worker.stop();

        assert_eq!(stats.batches_written(), 2);
        assert_eq!(stats.failures(), 0);
        let sequences: Vec<u64> = sink.batches().iter().map(|b| b.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Tick loop driving a developed brain.

One tick runs, in order and with a barrier between each:

```text
receptor update → energy update (parallel) → aggregation → change collection
                                                                 ↓
                                                 ChangeTracker::flush (try_send)
```

`run` checks the run control between ticks only; a tick in progress always
completes.
*/

use std::sync::Arc;
use std::time::Duration;

use neurogen_components::EnergyTick;
use neurogen_config::SimulationConfig;
use neurogen_state_manager::{
    ChangeTracker, FlushOutcome, MemorySink, PersistenceSink, PersistenceStats, PersistenceWorker,
    RunControl, SnapshotFileSink,
};
use tracing::{debug, info, trace, warn};

use crate::brain::Brain;
use crate::connectivity::PoolTick;
use crate::types::{BduError, BduResult};

/// Flush retries made on shutdown while the channel is full
const SHUTDOWN_FLUSH_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub receptors: PoolTick,
    pub energy: EnergyTick,
    pub total_propagation_rate: f64,
    pub changes: usize,
    pub flush: Option<FlushOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub stopped_early: bool,
    pub changes: usize,
    pub total_propagation_rate: f64,
}

struct Persistence {
    tracker: ChangeTracker,
    worker: PersistenceWorker,
}

pub struct Simulation {
    brain: Brain,
    dt: f64,
    tick: u64,
    control: Arc<RunControl>,
    persistence: Option<Persistence>,
}

impl Simulation {
    /// Wrap `brain`, stepping by `dt` seconds per tick. Uses the process-wide
    /// run control.
    pub fn new(brain: Brain, dt: f64) -> BduResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(BduError::InvalidParameter { name: "dt", value: dt });
        }
        Ok(Self {
            brain,
            dt,
            tick: 0,
            control: RunControl::global(),
            persistence: None,
        })
    }

    /// Develop a brain and attach persistence as configured.
    ///
    /// With persistence enabled, batches go to `snapshot_path` when set and
    /// to an in-memory sink otherwise.
    pub fn from_config(config: &SimulationConfig) -> BduResult<Self> {
        let brain = Brain::from_config(config)?;
        let mut simulation = Self::new(brain, config.simulation.dt)?;
        let persistence = &config.persistence;
        if persistence.enabled {
            match &persistence.snapshot_path {
                Some(path) => {
                    let sink = SnapshotFileSink::create(path)?;
                    simulation.attach_persistence(persistence.channel_capacity, sink)?;
                }
                None => {
                    simulation.attach_persistence(persistence.channel_capacity, MemorySink::new())?;
                }
            }
        }
        Ok(simulation)
    }

    #[must_use]
    pub fn with_run_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = control;
        self
    }

    /// Start a persistence worker writing to `sink`, fed through a channel of
    /// `capacity` batches.
    pub fn attach_persistence<S>(&mut self, capacity: usize, sink: S) -> BduResult<Arc<PersistenceStats>>
    where
        S: PersistenceSink + 'static,
    {
        let (tracker, rx) = ChangeTracker::new(capacity);
        let worker = PersistenceWorker::spawn(rx, sink)?;
        let stats = worker.stats();
        self.persistence = Some(Persistence { tracker, worker });
        Ok(stats)
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn brain_mut(&mut self) -> &mut Brain {
        &mut self.brain
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn run_control(&self) -> &Arc<RunControl> {
        &self.control
    }

    pub fn tick(&mut self) -> BduResult<TickReport> {
        let receptors = self.brain.update_receptors(self.dt)?;
        let energy = self.brain.update_energy(self.dt);
        let total_propagation_rate = self.brain.aggregate_propagation_rate();

        let records = self.brain.drain_changes();
        let changes = records.len();
        let flush = match &self.persistence {
            Some(persistence) => {
                persistence.tracker.record_all(records);
                Some(persistence.tracker.flush()?)
            }
            None => None,
        };

        self.tick += 1;
        trace!(
            target: "neurogen-bdu",
            "Tick {}: {} receptor(s) fired, {} change(s), rate {:.4}",
            self.tick,
            receptors.fired,
            changes,
            total_propagation_rate
        );

        Ok(TickReport {
            tick: self.tick,
            receptors,
            energy,
            total_propagation_rate,
            changes,
            flush,
        })
    }

    /// Tick up to `max_ticks` times, stopping early when the run control is
    /// cleared.
    pub fn run(&mut self, max_ticks: u64) -> BduResult<RunSummary> {
        info!(target: "neurogen-bdu", "Running up to {} tick(s), dt {}", max_ticks, self.dt);
        let mut summary = RunSummary {
            ticks: 0,
            stopped_early: false,
            changes: 0,
            total_propagation_rate: self.brain.total_propagation_rate(),
        };

        for _ in 0..max_ticks {
            if !self.control.is_running() {
                info!(target: "neurogen-bdu", "Run stopped after {} tick(s)", summary.ticks);
                summary.stopped_early = true;
                break;
            }
            let report = self.tick()?;
            summary.ticks += 1;
            summary.changes += report.changes;
            summary.total_propagation_rate = report.total_propagation_rate;
        }

        debug!(
            target: "neurogen-bdu",
            "Run finished: {} tick(s), {} change(s)",
            summary.ticks,
            summary.changes
        );
        Ok(summary)
    }

    /// Flush everything still pending and join the persistence worker.
    pub fn shutdown(&mut self) -> BduResult<()> {
        let Some(mut persistence) = self.persistence.take() else {
            return Ok(());
        };

        let mut result = Ok(());
        for _ in 0..SHUTDOWN_FLUSH_ATTEMPTS {
            match persistence.tracker.flush() {
                Ok(FlushOutcome::Deferred(_)) => std::thread::sleep(Duration::from_millis(10)),
                Ok(_) => break,
                Err(e) => {
                    result = Err(e.into());
                    break;
                }
            }
        }
        if persistence.tracker.pending_len() > 0 {
            warn!(
                target: "neurogen-bdu",
                "Shutting down with {} unpersisted change(s)",
                persistence.tracker.pending_len()
            );
        }

        // closing the channel lets the worker finish draining
        drop(persistence.tracker);
        persistence.worker.stop();
        result
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(target: "neurogen-bdu", "Persistence shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurogen_components::{GrowthContext, Position};

    fn simulation() -> Simulation {
        let mut brain = Brain::new(Arc::new(GrowthContext::new()), 0.2).unwrap();
        brain.grow_neurons(4, 0, Position::ORIGIN).unwrap();
        Simulation::new(brain, 0.1)
            .unwrap()
            .with_run_control(Arc::new(RunControl::new()))
    }

    #[test]
    fn test_rejects_bad_dt() {
        let brain = Brain::new(Arc::new(GrowthContext::new()), 0.2).unwrap();
        assert!(Simulation::new(brain, 0.0).is_err());
    }

    #[test]
    fn test_tick_counts_and_collects() {
        let mut sim = simulation();
        let component_count = sim.brain().component_count();

        let first = sim.tick().unwrap();
        assert_eq!(first.tick, 1);
        assert_eq!(first.changes, component_count);
        assert!(first.flush.is_none());
        assert!((first.total_propagation_rate - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_honours_stop() {
        let mut sim = simulation();
        sim.run_control().stop();
        let summary = sim.run(10).unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.ticks, 0);

        sim.run_control().start();
        let summary = sim.run(3).unwrap();
        assert!(!summary.stopped_early);
        assert_eq!(sim.ticks(), 3);
    }

    #[test]
    fn test_persistence_receives_every_change() {
        let mut sim = simulation();
        let sink = MemorySink::new();
        let stats = sim.attach_persistence(2, sink.clone()).unwrap();

        let summary = sim.run(5).unwrap();
        sim.shutdown().unwrap();

        assert_eq!(stats.failures(), 0);
        assert!(sink.record_count() > 0);
        assert!(sink.record_count() <= summary.changes);
        let sequences: Vec<u64> = sink.batches().iter().map(|b| b.sequence).collect();
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        assert_eq!(sequences, sorted);
    }
}

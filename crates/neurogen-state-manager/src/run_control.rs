// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cooperative shutdown flag polled between ticks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::info;

static GLOBAL: Lazy<Arc<RunControl>> = Lazy::new(|| Arc::new(RunControl::new()));

/// `running` flag checked by long-lived loops between phases.
///
/// Nothing is interrupted mid-phase; a stop request takes effect at the next
/// check.
#[derive(Debug)]
pub struct RunControl {
    running: AtomicBool,
}

impl RunControl {
    /// A fresh control in the running state
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    /// Process-wide instance, e.g. for signal handlers
    pub fn global() -> Arc<RunControl> {
        Arc::clone(&GLOBAL)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!(target: "neurogen-state", "Stop requested");
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_seen_across_threads() {
        let control = Arc::new(RunControl::new());
        assert!(control.is_running());

        let remote = Arc::clone(&control);
        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(!control.is_running());

        control.start();
        assert!(control.is_running());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&RunControl::global(), &RunControl::global()));
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neurogen.toml`. Every section is `#[serde(default)]`, so a file only
//! needs the values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population: PopulationConfig,
    pub association: AssociationConfig,
    pub receptors: ReceptorsConfig,
    pub effectors: EffectorPoolConfig,
    pub energy: EnergyConfig,
    pub simulation: TickConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// Neuron population layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Neurons grown directly by the brain around the origin
    pub neuron_count: usize,
    pub cluster_count: usize,
    pub neurons_per_cluster: usize,
    /// Shell capacity override for layered placement (0 = area based)
    pub points_per_layer: usize,
    /// Cluster seeds are sampled in `[-half_extent, half_extent]³`
    pub cluster_half_extent: f64,
    pub min_cluster_distance: f64,
    /// Seed for cluster placement; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            neuron_count: 0,
            cluster_count: 2,
            neurons_per_cluster: 8,
            points_per_layer: 0,
            cluster_half_extent: 1000.0,
            min_cluster_distance: 100.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub proximity_threshold: f64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 0.2,
        }
    }
}

/// One receptor pool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceptorPoolConfig {
    pub count: usize,
    /// Every `stride`-th receptor is pre-wired to a neuron
    pub stride: usize,
    /// Added to the receptor index when picking its neuron
    pub offset: usize,
    pub gaps_per_receptor: usize,
    pub points_per_layer: usize,
}

impl Default for ReceptorPoolConfig {
    fn default() -> Self {
        Self {
            count: 4,
            stride: 2,
            offset: 0,
            gaps_per_receptor: 1,
            points_per_layer: 0,
        }
    }
}

impl ReceptorPoolConfig {
    fn with_offset(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceptorsConfig {
    pub visual: ReceptorPoolConfig,
    pub auditory: ReceptorPoolConfig,
    pub olfactory: ReceptorPoolConfig,
    pub tactile: ReceptorPoolConfig,
    pub gustatory: ReceptorPoolConfig,
    pub sensitivity: f64,
    pub threshold: f64,
}

impl Default for ReceptorsConfig {
    fn default() -> Self {
        Self {
            visual: ReceptorPoolConfig::with_offset(0),
            auditory: ReceptorPoolConfig::with_offset(1),
            olfactory: ReceptorPoolConfig::with_offset(2),
            tactile: ReceptorPoolConfig::with_offset(3),
            gustatory: ReceptorPoolConfig::with_offset(4),
            sensitivity: 1.0,
            threshold: 0.5,
        }
    }
}

impl ReceptorsConfig {
    /// Modality names in pool order
    pub const MODALITIES: [&'static str; 5] =
        ["visual", "auditory", "olfactory", "tactile", "gustatory"];

    pub fn pool(&self, modality: &str) -> Option<&ReceptorPoolConfig> {
        match modality {
            "visual" => Some(&self.visual),
            "auditory" => Some(&self.auditory),
            "olfactory" => Some(&self.olfactory),
            "tactile" => Some(&self.tactile),
            "gustatory" => Some(&self.gustatory),
            _ => None,
        }
    }

    pub fn pool_mut(&mut self, modality: &str) -> Option<&mut ReceptorPoolConfig> {
        match modality {
            "visual" => Some(&mut self.visual),
            "auditory" => Some(&mut self.auditory),
            "olfactory" => Some(&mut self.olfactory),
            "tactile" => Some(&mut self.tactile),
            "gustatory" => Some(&mut self.gustatory),
            _ => None,
        }
    }

    pub fn pools(&self) -> impl Iterator<Item = (&'static str, &ReceptorPoolConfig)> + '_ {
        Self::MODALITIES
            .iter()
            .filter_map(move |name| self.pool(name).map(|pool| (*name, pool)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EffectorPoolConfig {
    pub count: usize,
    pub stride: usize,
    pub offset: usize,
    pub points_per_layer: usize,
}

impl Default for EffectorPoolConfig {
    fn default() -> Self {
        Self {
            count: 4,
            stride: 2,
            offset: 0,
            points_per_layer: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max_energy_level: f64,
    pub consumption_rate: f64,
    pub replenish_rate: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy_level: 100.0,
            consumption_rate: 1.0,
            replenish_rate: 2.0,
        }
    }
}

/// Simulation tick loop
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds of simulated time per tick
    pub dt: f64,
    /// Ticks to run; 0 runs until stopped
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            max_ticks: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Batches buffered between the simulation and the persistence worker
    pub channel_capacity: usize,
    /// Snapshot file for the file sink; in-memory sink when unset
    pub snapshot_path: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: 64,
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files (requires the `file-logging` feature)
    pub log_dir: Option<PathBuf>,
    /// Crates to log at debug level, e.g. `["neurogen-bdu"]`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            debug_crates: Vec::new(),
        }
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Flat `key=value` parameter store
//!
//! ```text
//! # population
//! neurons_per_cluster = 64
//! proximity_threshold = 0.25
//! visual_receptor_count = 16
//! ```
//!
//! Blank lines and `#` comments are ignored, whitespace around keys and values
//! is trimmed, and the last occurrence of a duplicate key wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

use crate::types::SimulationConfig;
use crate::ConfigResult;

/// Errors from reading typed values out of a [`ParameterStore`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("Missing parameter: {0}")]
    MissingKey(String),

    #[error("Parameter {key} = {value:?} is not a valid {expected}")]
    WrongType {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Line {line} is not a key=value pair: {content:?}")]
    Malformed { line: usize, content: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    values: BTreeMap<String, String>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, ParameterError> {
        let mut store = Self::new();
        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ParameterError::Malformed {
                    line: number + 1,
                    content: raw.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ParameterError::Malformed {
                    line: number + 1,
                    content: raw.to_string(),
                });
            }
            store.insert(key, value.trim());
        }
        Ok(store)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ParameterError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ParameterError::MissingKey(key.to_string()))
    }

    /// Parse the value of `key` as `T`
    pub fn get<T: FromStr>(&self, key: &str) -> Result<T, ParameterError> {
        let raw = self.get_str(key)?;
        raw.parse().map_err(|_| ParameterError::WrongType {
            key: key.to_string(),
            value: raw.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ParameterError> {
        match self.get(key) {
            Err(ParameterError::MissingKey(_)) => Ok(default),
            other => other,
        }
    }

    /// Accepts `true/false`, `1/0` and `yes/no`
    pub fn get_bool(&self, key: &str) -> Result<bool, ParameterError> {
        let raw = self.get_str(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ParameterError::WrongType {
                key: key.to_string(),
                value: raw.to_string(),
                expected: "bool",
            }),
        }
    }

    /// Write every recognised key onto `config`.
    ///
    /// Unknown keys are logged and returned so callers can decide whether
    /// they matter.
    pub fn apply_to(&self, config: &mut SimulationConfig) -> Result<Vec<String>, ParameterError> {
        let mut unknown = Vec::new();
        for key in self.values.keys() {
            if !self.apply_key(key, config)? {
                warn!(target: "neurogen-config", "Ignoring unknown parameter '{}'", key);
                unknown.push(key.clone());
            }
        }
        Ok(unknown)
    }

    fn apply_key(&self, key: &str, config: &mut SimulationConfig) -> Result<bool, ParameterError> {
        let population = &mut config.population;
        match key {
            "neuron_count" => population.neuron_count = self.get(key)?,
            "cluster_count" => population.cluster_count = self.get(key)?,
            "neurons_per_cluster" => population.neurons_per_cluster = self.get(key)?,
            "points_per_layer" => population.points_per_layer = self.get(key)?,
            "cluster_half_extent" => population.cluster_half_extent = self.get(key)?,
            "min_cluster_distance" => population.min_cluster_distance = self.get(key)?,
            "seed" => population.seed = Some(self.get(key)?),
            "proximity_threshold" => config.association.proximity_threshold = self.get(key)?,
            "receptor_sensitivity" => config.receptors.sensitivity = self.get(key)?,
            "receptor_threshold" => config.receptors.threshold = self.get(key)?,
            "effector_count" => config.effectors.count = self.get(key)?,
            "effector_stride" => config.effectors.stride = self.get(key)?,
            "effector_offset" => config.effectors.offset = self.get(key)?,
            "effector_points_per_layer" => config.effectors.points_per_layer = self.get(key)?,
            "max_energy_level" => config.energy.max_energy_level = self.get(key)?,
            "consumption_rate" => config.energy.consumption_rate = self.get(key)?,
            "replenish_rate" => config.energy.replenish_rate = self.get(key)?,
            "dt" => config.simulation.dt = self.get(key)?,
            "max_ticks" => config.simulation.max_ticks = self.get(key)?,
            "persistence_enabled" => config.persistence.enabled = self.get_bool(key)?,
            "channel_capacity" => config.persistence.channel_capacity = self.get(key)?,
            "snapshot_path" => {
                config.persistence.snapshot_path = Some(PathBuf::from(self.get_str(key)?))
            }
            "log_level" => config.logging.level = self.get_str(key)?.to_string(),
            "log_dir" => config.logging.log_dir = Some(PathBuf::from(self.get_str(key)?)),
            _ => return self.apply_receptor_key(key, config),
        }
        Ok(true)
    }

    /// `<modality>_receptor_{count,stride,offset,points_per_layer}` and
    /// `<modality>_gaps_per_receptor`
    fn apply_receptor_key(&self, key: &str, config: &mut SimulationConfig) -> Result<bool, ParameterError> {
        let Some((modality, field)) = key.split_once('_') else {
            return Ok(false);
        };
        let Some(pool) = config.receptors.pool_mut(modality) else {
            return Ok(false);
        };
        match field {
            "receptor_count" => pool.count = self.get(key)?,
            "receptor_stride" => pool.stride = self.get(key)?,
            "receptor_offset" => pool.offset = self.get(key)?,
            "receptor_points_per_layer" => pool.points_per_layer = self.get(key)?,
            "gaps_per_receptor" => pool.gaps_per_receptor = self.get(key)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl FromStr for ParameterStore {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_trims() {
        let store = ParameterStore::parse(
            "# header\n\n  neuron_count =  12 \nproximity_threshold=0.3\n",
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get::<usize>("neuron_count").unwrap(), 12);
        assert_eq!(store.get::<f64>("proximity_threshold").unwrap(), 0.3);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let store = ParameterStore::parse("dt = 0.1\ndt = 0.5\n").unwrap();
        assert_eq!(store.get::<f64>("dt").unwrap(), 0.5);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let store = ParameterStore::parse("snapshot_path = /tmp/a=b.bin").unwrap();
        assert_eq!(store.get_str("snapshot_path").unwrap(), "/tmp/a=b.bin");
    }

    #[test]
    fn test_missing_and_wrong_type() {
        let store = ParameterStore::parse("neuron_count = many").unwrap();
        assert_eq!(
            store.get::<usize>("cluster_count"),
            Err(ParameterError::MissingKey("cluster_count".to_string()))
        );
        assert!(matches!(
            store.get::<usize>("neuron_count"),
            Err(ParameterError::WrongType { .. })
        ));
        assert_eq!(store.get_or("cluster_count", 3usize).unwrap(), 3);
        assert!(store.get_or("neuron_count", 3usize).is_err());
    }

    #[test]
    fn test_malformed_line_reports_number() {
        let err = ParameterStore::parse("a = 1\nnot a pair\n").unwrap_err();
        assert_eq!(
            err,
            ParameterError::Malformed {
                line: 2,
                content: "not a pair".to_string()
            }
        );
        assert!(ParameterStore::parse("= 4").is_err());
    }

    #[test]
    fn test_bool_spellings() {
        let store = ParameterStore::parse("a = yes\nb = 0\nc = maybe").unwrap();
        assert!(store.get_bool("a").unwrap());
        assert!(!store.get_bool("b").unwrap());
        assert!(store.get_bool("c").is_err());
    }

    #[test]
    fn test_apply_to_config() {
        let store = ParameterStore::parse(
            "neurons_per_cluster = 20\n\
             visual_receptor_count = 7\n\
             gustatory_receptor_stride = 3\n\
             auditory_gaps_per_receptor = 2\n\
             effector_count = 5\n\
             persistence_enabled = false\n\
             warp_drive = on\n",
        )
        .unwrap();
        let mut config = SimulationConfig::default();
        let unknown = store.apply_to(&mut config).unwrap();

        assert_eq!(unknown, vec!["warp_drive".to_string()]);
        assert_eq!(config.population.neurons_per_cluster, 20);
        assert_eq!(config.receptors.visual.count, 7);
        assert_eq!(config.receptors.gustatory.stride, 3);
        assert_eq!(config.receptors.auditory.gaps_per_receptor, 2);
        assert_eq!(config.effectors.count, 5);
        assert!(!config.persistence.enabled);
    }

    #[test]
    fn test_apply_to_stops_on_bad_value() {
        let store = ParameterStore::parse("proximity_threshold = close").unwrap();
        let mut config = SimulationConfig::default();
        assert!(store.apply_to(&mut config).is_err());
    }
}

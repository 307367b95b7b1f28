// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (`NEUROGEN_<KEY>` runtime overrides)
//! 3. `key=value` parameters (explicit user overrides)
//!
//! Environment variables reuse the parameter keys, upper-cased and prefixed:
//! `NEUROGEN_PROXIMITY_THRESHOLD=0.3` sets `proximity_threshold`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::parameters::ParameterStore;
use crate::{ConfigError, ConfigResult, SimulationConfig};

pub const CONFIG_FILE_NAME: &str = "neurogen.toml";
pub const CONFIG_PATH_ENV: &str = "NEUROGEN_CONFIG_PATH";
pub const ENV_PREFIX: &str = "NEUROGEN_";

/// Variables under the prefix that are not parameters
const RESERVED_ENV: [&str; 2] = ["NEUROGEN_CONFIG_PATH", "NEUROGEN_DEBUG"];

/// Find the configuration file
///
/// Search order:
/// 1. `NEUROGEN_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurogen.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration
///
/// * `config_path` - TOML file. `None` searches for one and falls back to
///   defaults when nothing is found.
/// * `overrides` - explicit parameters applied last
///
/// # Errors
///
/// Returns an error if the file is unreadable, the TOML is invalid, or an
/// override has the wrong type. Validation is left to the caller.
pub fn load_config(
    config_path: Option<&Path>,
    overrides: Option<&ParameterStore>,
) -> ConfigResult<SimulationConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::FileNotFound(reason)) if env::var(CONFIG_PATH_ENV).is_err() => {
                debug!(target: "neurogen-config", "Using built-in defaults: {}", reason);
                None
            }
            Err(err) => return Err(err),
        },
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            debug!(target: "neurogen-config", "Loaded configuration from {}", path.display());
            toml::from_str(&content)?
        }
        None => SimulationConfig::default(),
    };

    apply_environment_overrides(&mut config)?;

    if let Some(parameters) = overrides {
        parameters.apply_to(&mut config)?;
    }

    Ok(config)
}

/// Collect `NEUROGEN_<KEY>` variables as parameters
pub fn environment_parameters() -> ParameterStore {
    let mut store = ParameterStore::new();
    for (name, value) in env::vars() {
        if RESERVED_ENV.contains(&name.as_str()) {
            continue;
        }
        if let Some(key) = name.strip_prefix(ENV_PREFIX) {
            store.insert(key.to_ascii_lowercase(), value);
        }
    }
    store
}

/// Apply environment variable overrides to configuration
pub fn apply_environment_overrides(config: &mut SimulationConfig) -> ConfigResult<()> {
    environment_parameters().apply_to(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/definitely/not/here.toml");
        let result = load_config(None, None);
        env::remove_var(CONFIG_PATH_ENV);
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[population]").unwrap();
        writeln!(file, "cluster_count = 4").unwrap();
        writeln!(file, "[association]").unwrap();
        writeln!(file, "proximity_threshold = 0.5").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.population.cluster_count, 4);
        assert_eq!(config.association.proximity_threshold, 0.5);
        assert_eq!(config.population.neurons_per_cluster, 8);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[population\ncluster_count = ").unwrap();
        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SimulationConfig::default();

        env::set_var("NEUROGEN_NEURON_COUNT", "42");
        env::set_var("NEUROGEN_VISUAL_RECEPTOR_COUNT", "3");
        let result = apply_environment_overrides(&mut config);
        env::remove_var("NEUROGEN_NEURON_COUNT");
        env::remove_var("NEUROGEN_VISUAL_RECEPTOR_COUNT");

        result.unwrap();
        assert_eq!(config.population.neuron_count, 42);
        assert_eq!(config.receptors.visual.count, 3);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[population]").unwrap();
        writeln!(file, "cluster_count = 1").unwrap();
        writeln!(file, "neurons_per_cluster = 2").unwrap();

        env::set_var("NEUROGEN_CLUSTER_COUNT", "5");
        env::set_var("NEUROGEN_NEURONS_PER_CLUSTER", "6");

        let parameters = ParameterStore::parse("neurons_per_cluster = 9").unwrap();
        let config = load_config(Some(&config_path), Some(&parameters));

        env::remove_var("NEUROGEN_CLUSTER_COUNT");
        env::remove_var("NEUROGEN_NEURONS_PER_CLUSTER");

        // parameters win for neurons_per_cluster, env wins for cluster_count
        let config = config.unwrap();
        assert_eq!(config.population.neurons_per_cluster, 9);
        assert_eq!(config.population.cluster_count, 5);
    }
}

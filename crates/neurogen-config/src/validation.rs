// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every rule runs and every violation is reported at once, so a broken file
//! can be fixed in one pass.

use crate::{ConfigError, ConfigResult, SimulationConfig};

/// A single rule violation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    ZeroCount { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be a positive number", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must not be negative", field, value)
            }
            Self::ZeroCount { field } => write!(f, "{} must be at least 1", field),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &SimulationConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_population(config, &mut errors);
    validate_pools(config, &mut errors);
    validate_energy(config, &mut errors);
    validate_runtime(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_population(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let population = &config.population;
    positive(
        "association.proximity_threshold",
        config.association.proximity_threshold,
        errors,
    );
    positive("population.min_cluster_distance", population.min_cluster_distance, errors);
    positive("population.cluster_half_extent", population.cluster_half_extent, errors);

    if population.cluster_count > 0 && population.neurons_per_cluster == 0 {
        errors.push(ConfigValidationError::ZeroCount {
            field: "population.neurons_per_cluster".to_string(),
        });
    }
}

fn validate_pools(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    for (name, pool) in config.receptors.pools() {
        if pool.count > 0 && pool.stride == 0 {
            errors.push(ConfigValidationError::ZeroCount {
                field: format!("receptors.{}.stride", name),
            });
        }
    }
    if config.effectors.count > 0 && config.effectors.stride == 0 {
        errors.push(ConfigValidationError::ZeroCount {
            field: "effectors.stride".to_string(),
        });
    }
    non_negative("receptors.sensitivity", config.receptors.sensitivity, errors);
    non_negative("receptors.threshold", config.receptors.threshold, errors);
}

fn validate_energy(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let energy = &config.energy;
    positive("energy.max_energy_level", energy.max_energy_level, errors);
    non_negative("energy.consumption_rate", energy.consumption_rate, errors);
    non_negative("energy.replenish_rate", energy.replenish_rate, errors);
}

fn validate_runtime(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    positive("simulation.dt", config.simulation.dt, errors);
    if config.persistence.channel_capacity == 0 {
        errors.push(ConfigValidationError::ZeroCount {
            field: "persistence.channel_capacity".to_string(),
        });
    }
    if config.logging.level.trim().is_empty() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SimulationConfig::default()).is_ok());
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = SimulationConfig::default();
        config.association.proximity_threshold = 0.0;
        config.population.min_cluster_distance = -1.0;
        config.receptors.olfactory.stride = 0;
        config.simulation.dt = f64::NAN;
        config.persistence.channel_capacity = 0;

        let Err(ConfigError::ValidationError(message)) = validate_config(&config) else {
            panic!("expected a validation error");
        };
        assert!(message.contains("association.proximity_threshold"));
        assert!(message.contains("population.min_cluster_distance"));
        assert!(message.contains("receptors.olfactory.stride"));
        assert!(message.contains("simulation.dt"));
        assert!(message.contains("persistence.channel_capacity"));
    }

    #[test]
    fn test_zero_stride_allowed_for_empty_pool() {
        let mut config = SimulationConfig::default();
        config.effectors.count = 0;
        config.effectors.stride = 0;
        assert!(validate_config(&config).is_ok());
    }
}

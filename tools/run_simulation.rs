// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Develop a brain from configuration and run the tick loop.
//!
//! Configuration is layered: built-in defaults, then a TOML file (explicit or
//! discovered), then `NEUROGEN_<KEY>` environment variables, then an optional
//! `key=value` parameter file, then `--set key=value` overrides.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use neurogen::bdu::{Neuroembryogenesis, Simulation};
use neurogen::config::{load_config, validate_config, ParameterStore, SimulationConfig};
use neurogen::observability::{init_logging, CrateDebugFlags, LoggingSettings, DEBUG_ENV};
use neurogen::state_manager::RunControl;
use tracing::{info, warn};

/// Neurogen growth simulation runner
#[derive(Parser, Debug)]
#[command(name = "run_simulation", version, long_about = None)]
struct Args {
    /// TOML configuration file (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Flat key=value parameter file applied over the configuration
    #[arg(short, long)]
    parameters: Option<PathBuf>,

    /// Single parameter override, e.g. `--set neuron_count=64` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Ticks to run; overrides `max_ticks`
    #[arg(long)]
    ticks: Option<u64>,

    /// Enable debug logging for a crate, or `all` (repeatable)
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,
}

fn parameters_from(args: &Args) -> Result<ParameterStore> {
    let mut store = match &args.parameters {
        Some(path) => ParameterStore::from_file(path)
            .with_context(|| format!("Failed to read parameters from {}", path.display()))?,
        None => ParameterStore::new(),
    };
    for entry in &args.overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Override '{}' is not of the form key=value", entry);
        };
        store.insert(key.trim(), value.trim());
    }
    Ok(store)
}

fn debug_flags(args: &Args, config: &SimulationConfig) -> CrateDebugFlags {
    let requested = args
        .debug
        .iter()
        .chain(config.logging.debug_crates.iter())
        .map(|name| format!("--debug-{name}"));
    let mut flags = CrateDebugFlags::from_args(requested);
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

fn main() -> Result<()> {
    let args = Args::parse();

    let parameters = parameters_from(&args)?;
    let config = load_config(args.config.as_deref(), Some(&parameters))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let settings = LoggingSettings {
        level: config.logging.level.clone(),
        log_dir: config.logging.log_dir.clone(),
        ..LoggingSettings::default()
    };
    let _logging = init_logging(&debug_flags(&args, &config), &settings)?;

    info!(target: "neurogen", "🧬 neurogen {}", neurogen::VERSION);

    let control = RunControl::global();
    let handler_control = control.clone();
    ctrlc::set_handler(move || handler_control.stop())
        .context("Failed to install the interrupt handler")?;

    let mut embryo = Neuroembryogenesis::new();
    let brain = embryo.develop(&config)?;
    let progress = embryo.get_progress();

    let mut sim = Simulation::new(brain, config.simulation.dt)?.with_run_control(control);
    let persistence = &config.persistence;
    let stats = if persistence.enabled {
        let stats = match &persistence.snapshot_path {
            Some(path) => {
                info!(target: "neurogen", "Persisting changes to {}", path.display());
                let sink = neurogen::state_manager::SnapshotFileSink::create(path)?;
                sim.attach_persistence(persistence.channel_capacity, sink)?
            }
            None => sim.attach_persistence(
                persistence.channel_capacity,
                neurogen::state_manager::MemorySink::new(),
            )?,
        };
        Some(stats)
    } else {
        None
    };

    let initial_rate = sim.brain().perform_synaptic_association();
    info!(
        target: "neurogen",
        "Population associated: total propagation rate {:.4}",
        initial_rate
    );

    // zero ticks means run until interrupted
    let max_ticks = match args.ticks.unwrap_or(config.simulation.max_ticks) {
        0 => u64::MAX,
        n => n,
    };
    let summary = sim.run(max_ticks)?;
    sim.shutdown()?;

    if summary.stopped_early {
        warn!(target: "neurogen", "Interrupted after {} tick(s)", summary.ticks);
    }

    println!("clusters:                {}", progress.clusters_created);
    println!("neurons:                 {}", progress.neurons_created);
    println!("receptors:               {}", progress.receptors_created);
    println!("effectors:               {}", progress.effectors_created);
    println!("synapses at development: {}", progress.synapses_created);
    println!("ticks:                   {}", summary.ticks);
    println!("changes:                 {}", summary.changes);
    println!("total propagation rate:  {:.4}", summary.total_propagation_rate);
    if let Some(stats) = stats {
        println!(
            "persisted:               {} batch(es), {} record(s), {} failure(s)",
            stats.batches_written(),
            stats.records_written(),
            stats.failures()
        );
    }

    Ok(())
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Population-wide synaptogenesis and propagation-rate aggregation.

## Architecture

```text
associate_population(population, threshold)
   ↓  outer index i in parallel (rayon)
   ↓  for j in i+1..n: associate_neurons(population[i], population[j])
   ↓  lower index transmits, higher index receives
returns number of synapses formed
```

Every pair is visited exactly once, so the pass is `O(N²)` but has no
shared mutable state beyond each gap's compare-and-swap flag and each
receiving list's lock.

Aggregation splits the population into one contiguous range per available
core. Each range is summed locally and added to the shared accumulator once.
*/

use std::borrow::Borrow;

use neurogen_components::{
    associate_neurons, ComponentTree, GrowthContext, Neuron, Position, SphereLayout,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::types::BduResult;

/// Number of ranges aggregation splits a population into
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Create `n` uninitialised neurons, neuron `i` at `anchor + layout.point(i, n)`.
///
/// Creation runs in parallel; the returned order follows the layout index,
/// while per-kind IDs are handed out in whatever order threads reach them.
pub fn create_population(
    ctx: &GrowthContext,
    anchor: Position,
    layout: SphereLayout,
    n: usize,
) -> BduResult<Vec<Neuron>> {
    let create = |i: usize| -> BduResult<Neuron> {
        Ok(Neuron::create(ctx, anchor + layout.point(i, n)?))
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(create).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(create).collect()
    }
}

/// Grow every neuron's default tree. Neurons are independent of each other.
pub fn initialise_population(neurons: &mut [Neuron], ctx: &GrowthContext) -> BduResult<()> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        neurons
            .par_iter_mut()
            .try_for_each(|neuron| neuron.initialise(ctx))?;
    }

    #[cfg(not(feature = "parallel"))]
    {
        for neuron in neurons.iter_mut() {
            neuron.initialise(ctx)?;
        }
    }

    Ok(())
}

/// Associate every unordered pair of the population. Returns synapses formed.
pub fn associate_population<N>(population: &[N], proximity_threshold: f64) -> usize
where
    N: Borrow<Neuron> + Sync,
{
    let n = population.len();
    let row = |i: usize| -> usize {
        let transmitter = population[i].borrow();
        population[i + 1..]
            .iter()
            .map(|receiver| associate_neurons(transmitter, receiver.borrow(), proximity_threshold))
            .sum()
    };

    #[cfg(feature = "parallel")]
    let linked: usize = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(row).sum()
    };

    #[cfg(not(feature = "parallel"))]
    let linked: usize = (0..n).map(row).sum();

    debug!(
        target: "neurogen-bdu",
        "Associated {} neuron(s): {} synapse(s) formed",
        n,
        linked
    );
    linked
}

/// Sum of every neuron's propagation rate
pub fn aggregate_propagation_rate<N>(population: &[N]) -> f64
where
    N: Borrow<Neuron> + Sync,
{
    if population.is_empty() {
        return 0.0;
    }
    let chunk = population.len().div_ceil(worker_count()).max(1);
    let total = Mutex::new(0.0_f64);

    let sum_range = |range: &[N]| {
        let partial: f64 = range
            .iter()
            .map(|neuron| neuron.borrow().calculate_propagation_rate())
            .sum();
        *total.lock() += partial;
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        population.par_chunks(chunk).for_each(sum_range);
    }

    #[cfg(not(feature = "parallel"))]
    {
        population.chunks(chunk).for_each(sum_range);
    }

    total.into_inner()
}

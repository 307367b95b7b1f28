// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatially separated groups of neurons grown and associated together

use neurogen_components::{GrowthContext, Neuron, Position, SphereLayout};
use tracing::{debug, info};

use crate::connectivity::{
    aggregate_propagation_rate, associate_population, create_population, initialise_population,
};
use crate::placement::ClusterPlacer;
use crate::types::BduResult;

#[derive(Debug)]
pub struct Cluster {
    id: usize,
    position: Position,
    neurons: Vec<Neuron>,
}

impl Cluster {
    /// Place a new, empty cluster at least `min_distance` from every cluster
    /// `placer` has placed before.
    pub fn create(placer: &mut ClusterPlacer, min_distance: f64) -> BduResult<Self> {
        let position = placer.place(min_distance)?;
        Ok(Self {
            id: placer.placed().len() - 1,
            position,
            neurons: Vec::new(),
        })
    }

    /// Cluster centred at a known position
    pub fn at(id: usize, position: Position) -> Self {
        Self {
            id,
            position,
            neurons: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// Grow `n` neurons around the centre, initialise them, then associate
    /// every pair. Returns the number of synapses formed.
    ///
    /// Neuron `i` sits at `position + point(i, n)` of a layout capped at
    /// `points_per_layer` per shell (`0` for the default shell capacity).
    pub fn initialise(
        &mut self,
        ctx: &GrowthContext,
        n: usize,
        points_per_layer: usize,
        proximity_threshold: f64,
    ) -> BduResult<usize> {
        let layout = SphereLayout::with_points_per_layer(points_per_layer);
        let mut neurons = create_population(ctx, self.position, layout, n)?;
        initialise_population(&mut neurons, ctx)?;
        debug!(
            target: "neurogen-bdu",
            "Cluster {}: grew {} neuron(s) around {}",
            self.id,
            n,
            self.position
        );

        let linked = associate_population(&neurons, proximity_threshold);
        self.neurons.extend(neurons);
        info!(
            target: "neurogen-bdu",
            "Cluster {} ready: {} neuron(s), {} synapse(s)",
            self.id,
            self.neurons.len(),
            linked
        );
        Ok(linked)
    }

    /// Sum of every neuron's propagation rate
    pub fn calculate_propagation_rate(&self) -> f64 {
        aggregate_propagation_rate(&self.neurons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_keep_min_distance() {
        let mut placer = ClusterPlacer::new(1000.0, Some(3)).unwrap();
        let clusters: Vec<Cluster> = (0..8)
            .map(|_| Cluster::create(&mut placer, 100.0).unwrap())
            .collect();
        for (i, a) in clusters.iter().enumerate() {
            assert_eq!(a.id(), i);
            for b in &clusters[i + 1..] {
                assert!(a.position().distance_to(&b.position()) >= 100.0);
            }
        }
    }

    #[test]
    fn test_initialise_grows_and_associates() {
        let ctx = GrowthContext::new();
        let mut cluster = Cluster::at(0, Position::ORIGIN);
        let linked = cluster.initialise(&ctx, 6, 0, 0.2).unwrap();

        assert_eq!(cluster.len(), 6);
        assert!(cluster.neurons().iter().all(Neuron::is_initialised));
        assert!(linked > 0);
        let associated: usize = cluster.neurons().iter().map(Neuron::associated_gap_count).sum();
        assert_eq!(associated, linked);
        assert!((cluster.calculate_propagation_rate() - 6.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_neuron_positions_follow_layout() {
        let ctx = GrowthContext::new();
        let centre = Position::new(10.0, -3.0, 2.0);
        let mut cluster = Cluster::at(1, centre);
        cluster.initialise(&ctx, 4, 2, 0.2).unwrap();

        let layout = SphereLayout::with_points_per_layer(2);
        for (i, neuron) in cluster.neurons().iter().enumerate() {
            assert_eq!(neuron.position(), centre + layout.point(i, 4).unwrap());
        }
    }

    #[test]
    fn test_empty_cluster() {
        let ctx = GrowthContext::new();
        let mut cluster = Cluster::at(0, Position::ORIGIN);
        assert_eq!(cluster.initialise(&ctx, 0, 0, 0.2).unwrap(), 0);
        assert!(cluster.is_empty());
        assert_eq!(cluster.calculate_propagation_rate(), 0.0);
    }
}

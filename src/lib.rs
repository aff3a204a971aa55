//! # Xenobots - Evolving Soft-Bodied Organisms
//!
//! A real-time simulation of soft-bodied organisms whose morphology is encoded
//! in a grid genome. Bodies are particle/spring graphs driven by a Verlet
//! integrator with muscle actuation and bio-electric signaling; populations
//! evolve through a genetic algorithm with implicit speciation.
//!
//! ## Features
//!
//! - Grid genomes of structural, actuator and signaling cells
//! - Position-based soft-body physics with plastic springs
//! - Buoyancy, currents, ciliary propulsion and social separation forces
//! - Metabolism, feeding and starvation
//! - Per-species tournament selection, crossover and mutation
//! - Background runner delivering snapshots over a bounded channel
//!
//! ## Core Modules
//!
//! - [`simulation::genome`] - Genetic encoding, crossover and mutation
//! - [`simulation::body`] - Genome to particle/spring compiler
//! - [`simulation::integrator`] - Verlet physics stepper
//! - [`simulation::field`] - Environmental and social forces
//! - [`simulation::energy`] - Metabolic bookkeeping
//! - [`simulation::evolution`] - Genetic algorithm
//! - [`simulation::ecosystem`] - Fixed-timestep simulation instance

/// Core simulation logic and data structures.
pub mod simulation {
    /// Genome to particle/spring compiler.
    pub mod body;
    /// Fixed-timestep simulation instance.
    pub mod ecosystem;
    /// Metabolism, feeding and reproduction eligibility.
    pub mod energy;
    /// Selection, crossover, mutation and pool-size control.
    pub mod evolution;
    /// Environmental forces, social forces and bio-electric charge.
    pub mod field;
    /// Grid genomes, cell types and species.
    pub mod genome;
    /// Geometric utility functions for centroids and distances.
    pub mod geometric_utils;
    /// Verlet integration of one organism.
    pub mod integrator;
    /// Nutrient pellets organisms feed on.
    pub mod nutrient;
    /// Organism, particle and spring state.
    pub mod organism;
    /// Simulation parameters.
    pub mod params;
    /// Organisms partitioned into species pools.
    pub mod population;
    /// Background thread runner.
    pub mod runner;
    /// Snapshot and persistence formats.
    pub mod snapshot;
    /// KD-tree neighbour queries.
    pub mod spatial;
    /// Per-generation population statistics.
    pub mod stats;
}

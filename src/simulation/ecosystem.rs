//! The simulation instance: fixed-timestep clock over a population.
//!
//! One tick, in order:
//! - field forces and Verlet integration for every organism (in parallel
//!   with rayon; each organism only reads a per-tick summary of the others)
//! - metabolism for every organism in index order
//! - feeding and nutrient respawn
//! - every `evolution_interval` ticks, an evolutionary step

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::energy;
use super::evolution::EvolutionEngine;
use super::field::{self, SocialField};
use super::genome::{Genome, GenomeError, SpeciesId};
use super::integrator;
use super::nutrient::Nutrient;
use super::organism::Organism;
use super::params::{ConfigError, Params};
use super::population::{Population, species_home};
use super::snapshot::{OrganismSnapshot, SavedState, SnapshotError, WorldSnapshot};
use super::stats::{PopulationStats, StatsHistory};

/// Errors raised when adding an organism by hand.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The genome does not fit the configured grid.
    #[error(transparent)]
    Genome(#[from] GenomeError),
    /// The population is already at `population_size`.
    #[error("population is at its cap of {0}")]
    PopulationFull(usize),
    /// The species pool is already at `per_species_cap`.
    #[error("{species} is at its cap of {cap}")]
    SpeciesFull {
        /// Species of the rejected genome.
        species: SpeciesId,
        /// Configured per-species cap.
        cap: usize,
    },
}

/// A running xenobot world.
///
/// Owns all organism and particle state; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct Ecosystem {
    params: Params,
    population: Population,
    nutrients: Vec<Nutrient>,
    rng: StdRng,
    tick: u64,
    sim_time: f32,
    generation: u32,
    accumulator: f32,
    history: StatsHistory,
}

impl Ecosystem {
    /// Creates an ecosystem with `initial_per_species` random organisms for
    /// each of `species_count` species, fewer if the caps do not leave room
    /// for that many in every species.
    pub fn new(params: Params) -> Result<Self, ConfigError> {
        params.validate()?;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let species: Vec<SpeciesId> = (0..params.species_count)
            .map(|i| SpeciesId(i as u16))
            .collect();
        let mut population = Population::new(species.iter().copied());

        // Every species gets an equal share of the population cap.
        let per_species = params
            .initial_per_species
            .min(params.per_species_cap)
            .min(params.population_size / params.species_count);
        for &s in &species {
            let (x, y) = species_home(s, &params);
            for _ in 0..per_species {
                let genome = Genome::random(params.grid_size, s, 0, &mut rng).with_origin(x, y);
                population.spawn(genome, &params, &mut rng);
            }
        }

        let nutrients = (0..params.nutrient_count)
            .map(|_| Nutrient::new_random(&params, &mut rng))
            .collect();

        info!(
            organisms = population.len(),
            species = params.species_count,
            "ecosystem created"
        );

        Ok(Self {
            params,
            population,
            nutrients,
            rng,
            tick: 0,
            sim_time: 0.0,
            generation: 0,
            accumulator: 0.0,
            history: StatsHistory::default(),
        })
    }

    /// Restores an ecosystem from a saved state.
    ///
    /// Every genome is validated before any body is built. Genomes beyond the
    /// population cap or their species' cap are dropped.
    pub fn from_saved_state(state: SavedState) -> Result<Self, SnapshotError> {
        state.validate()?;
        let SavedState {
            config,
            genomes,
            generation,
            ..
        } = state;

        let mut ecosystem = Self::new(Params {
            initial_per_species: 0,
            ..config
        })?;
        ecosystem.params.initial_per_species = config.initial_per_species;
        ecosystem.generation = generation;

        let cap = ecosystem.params.population_size;
        let species_cap = ecosystem.params.per_species_cap;
        let mut per_species: BTreeMap<SpeciesId, usize> = BTreeMap::new();
        let (mut over_cap, mut over_species_cap) = (0usize, 0usize);
        for genome in genomes {
            if ecosystem.population.len() >= cap {
                over_cap += 1;
                continue;
            }
            let count = per_species.entry(genome.species).or_default();
            if *count >= species_cap {
                over_species_cap += 1;
                continue;
            }
            *count += 1;
            ecosystem
                .population
                .spawn(genome, &ecosystem.params, &mut ecosystem.rng);
        }
        if over_cap > 0 {
            warn!(
                dropped = over_cap,
                cap, "saved state exceeds the population cap, dropping the rest"
            );
        }
        if over_species_cap > 0 {
            warn!(
                dropped = over_species_cap,
                cap = species_cap,
                "saved state exceeds the per-species cap, dropping the rest"
            );
        }
        Ok(ecosystem)
    }

    /// Captures the genomes of all living organisms for persistence.
    pub fn to_saved_state(&self) -> SavedState {
        SavedState {
            config: self.params.clone(),
            genomes: self
                .population
                .organisms
                .iter()
                .filter(|o| o.is_alive())
                .map(|o| o.genome.clone())
                .collect(),
            generation: self.generation,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Builds `genome` at `(x, y)` and adds it to the population.
    pub fn create_organism(&mut self, genome: Genome, x: f32, y: f32) -> Result<&Organism, SpawnError> {
        genome.validate(self.params.grid_size)?;
        if self.population.len() >= self.params.population_size {
            return Err(SpawnError::PopulationFull(self.params.population_size));
        }
        if self.population.count_species(genome.species) >= self.params.per_species_cap {
            return Err(SpawnError::SpeciesFull {
                species: genome.species,
                cap: self.params.per_species_cap,
            });
        }
        self.population
            .spawn_at(genome, x, y, &self.params, &mut self.rng);
        let organism = &self.population.organisms[self.population.len() - 1];
        Ok(organism)
    }

    /// Advances one fixed tick with physics evaluated at `sim_time` seconds.
    pub fn step(&mut self, sim_time: f32) {
        let params = &self.params;
        let dt = params.fixed_dt;
        let social = SocialField::build(&self.population.organisms, params);
        let tick_seed: u64 = self.rng.random();

        self.population.organisms.par_iter_mut().for_each(|organism| {
            let stream = (organism.id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let mut rng = StdRng::seed_from_u64(tick_seed ^ stream);
            field::apply_forces(organism, &social, sim_time, params, &mut rng);
            integrator::step(organism, sim_time, dt, params);
        });

        for organism in &mut self.population.organisms {
            energy::tick(organism, params);
        }

        let eaten = energy::feed_all(&mut self.population.organisms, &mut self.nutrients, params);
        if eaten > 0 {
            self.nutrients.retain(|n| !n.is_consumed());
        }
        while self.nutrients.len() < params.nutrient_count {
            self.nutrients.push(Nutrient::new_random(params, &mut self.rng));
        }

        self.sim_time = sim_time;
        self.tick += 1;
        trace!(tick = self.tick, bodies = social.len(), eaten, "tick");

        if self.tick % self.params.evolution_interval == 0 {
            self.evolve_population(self.generation + 1);
        }
    }

    /// Advances one fixed tick past the current simulation time.
    pub fn step_fixed(&mut self) {
        self.step(self.sim_time + self.params.fixed_dt);
    }

    /// Feeds elapsed wall time into the fixed-timestep accumulator.
    ///
    /// Frame time is clamped to `max_frame_time` so a stalled caller does not
    /// trigger an unbounded burst of ticks. Returns the number of ticks run.
    pub fn advance(&mut self, frame_seconds: f32) -> usize {
        let frame = if frame_seconds.is_finite() {
            frame_seconds.clamp(0.0, self.params.max_frame_time)
        } else {
            0.0
        };
        self.accumulator += frame;

        let mut ticks = 0;
        while self.accumulator >= self.params.fixed_dt {
            self.step_fixed();
            self.accumulator -= self.params.fixed_dt;
            ticks += 1;
        }
        ticks
    }

    /// Replaces the population with its next generation.
    ///
    /// Dead organisms are evicted first. Returns `false` when there was
    /// nothing to evolve (no organisms and no known species).
    pub fn evolve_population(&mut self, generation: u32) -> bool {
        let evicted = self.population.evict_dead();
        if self.population.is_empty() && self.population.species().next().is_none() {
            debug!(generation, "nothing to evolve");
            return false;
        }

        let engine = EvolutionEngine::new(&self.params);
        self.population = engine.evolve(&self.population, generation, &mut self.rng);
        self.generation = generation;

        let stats = PopulationStats::collect(&self.population, generation);
        info!(
            generation,
            organisms = stats.total,
            evicted,
            species = stats.per_species.len(),
            "new generation"
        );
        self.history.record(stats);
        true
    }

    /// Cell-type totals and organism count of the living population.
    pub fn population_stats(&self, generation: u32) -> PopulationStats {
        PopulationStats::collect(&self.population, generation)
    }

    /// Captures a read-only snapshot of the world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            generation: self.generation,
            sim_time: self.sim_time,
            organisms: self
                .population
                .organisms
                .iter()
                .map(OrganismSnapshot::capture)
                .collect(),
            nutrients: self
                .nutrients
                .iter()
                .map(|n| [n.pos[0], n.pos[1]])
                .collect(),
            best_genome: self.population.best().map(|o| o.genome.clone()),
        }
    }

    /// Parameters in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The population.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// All organisms, dead ones included until evicted.
    pub fn organisms(&self) -> &[Organism] {
        &self.population.organisms
    }

    /// Mutable access to the organisms, e.g. for external feeding.
    pub fn organisms_mut(&mut self) -> &mut [Organism] {
        &mut self.population.organisms
    }

    /// Uneaten nutrient pellets.
    pub fn nutrients(&self) -> &[Nutrient] {
        &self.nutrients
    }

    /// Ticks processed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time of the last tick.
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Current generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Per-generation statistics recorded so far.
    pub fn history(&self) -> &StatsHistory {
        &self.history
    }
}

//! Read-only views of the simulation for renderers, UIs and persistence.
//!
//! [`WorldSnapshot`] is what the background runner sends to its consumer
//! after every batch of ticks. [`SavedState`] is the persistence format; this
//! crate only converts it to and from JSON and never touches storage itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::genome::{Genome, GenomeError, SpeciesId};
use super::organism::Organism;
use super::params::{ConfigError, Params};

/// Errors raised while decoding or restoring a [`SavedState`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The JSON could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// The stored configuration is invalid.
    #[error("snapshot has an invalid config: {0}")]
    Config(#[from] ConfigError),
    /// A stored genome cannot be compiled.
    #[error("snapshot genome {index} is invalid: {source}")]
    Genome {
        /// Position of the genome in the snapshot.
        index: usize,
        /// Underlying validation error.
        source: GenomeError,
    },
}

/// Render data of one particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    /// Smoothed position.
    pub pos: [f32; 2],
    /// Bio-electric charge.
    pub charge: f32,
}

/// Render data of one spring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringSnapshot {
    /// Index of the first particle.
    pub a: usize,
    /// Index of the second particle.
    pub b: usize,
    /// Whether the spring is a muscle.
    pub is_muscle: bool,
}

/// Render data of one organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismSnapshot {
    /// Organism identifier.
    pub id: usize,
    /// Breeding pool.
    pub species: SpeciesId,
    /// Display colour tag.
    pub color: String,
    /// Whether the organism is alive.
    pub alive: bool,
    /// Remaining energy.
    pub energy: f32,
    /// Mean bio-electric charge.
    pub charge: f32,
    /// Current fitness.
    pub fitness: f32,
    /// Center of mass.
    pub center: [f32; 2],
    /// Particles with finite positions. Springs refer to indices in the
    /// organism's full particle list; particles left out here are skipped by
    /// the consumer.
    pub particles: Vec<Option<ParticleSnapshot>>,
    /// Springs of the body.
    pub springs: Vec<SpringSnapshot>,
}

impl OrganismSnapshot {
    /// Captures an organism.
    pub fn capture(organism: &Organism) -> Self {
        let particles = organism
            .particles
            .iter()
            .map(|p| {
                let pos = [p.render_pos[0], p.render_pos[1]];
                pos.iter().all(|v| v.is_finite()).then_some(ParticleSnapshot {
                    pos,
                    charge: p.charge,
                })
            })
            .collect();
        let springs = organism
            .springs
            .iter()
            .map(|s| SpringSnapshot {
                a: s.a,
                b: s.b,
                is_muscle: s.is_muscle,
            })
            .collect();
        Self {
            id: organism.id,
            species: organism.species,
            color: organism.genome.color.clone(),
            alive: organism.is_alive(),
            energy: organism.energy,
            charge: organism.total_charge,
            fitness: organism.fitness(),
            center: [organism.center_of_mass[0], organism.center_of_mass[1]],
            particles,
            springs,
        }
    }
}

/// Immutable picture of the world after a batch of ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Ticks processed so far.
    pub tick: u64,
    /// Current generation.
    pub generation: u32,
    /// Simulation time in seconds.
    pub sim_time: f32,
    /// All organisms, dead ones included until evicted.
    pub organisms: Vec<OrganismSnapshot>,
    /// Positions of uneaten nutrient pellets.
    pub nutrients: Vec<[f32; 2]>,
    /// Genome of the fittest living organism.
    pub best_genome: Option<Genome>,
}

/// Persistence format of a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedState {
    /// Parameters the simulation ran with.
    pub config: Params,
    /// Genomes of all living organisms.
    pub genomes: Vec<Genome>,
    /// Generation at save time.
    pub generation: u32,
    /// Wall-clock time of the save.
    pub timestamp: DateTime<Utc>,
}

impl SavedState {
    /// Encodes the state as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a state from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the config and every genome against it.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.config.validate()?;
        for (index, genome) in self.genomes.iter().enumerate() {
            genome
                .validate(self.config.grid_size)
                .map_err(|source| SnapshotError::Genome { index, source })?;
        }
        Ok(())
    }
}

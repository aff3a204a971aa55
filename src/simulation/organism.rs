//! Organism state: particles, springs and lifecycle bookkeeping.
//!
//! Organisms are created by [`BodyBuilder`](super::body::BodyBuilder) and then
//! mutated every tick by the field model, the integrator and the energy model.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::genome::{Genome, SpeciesId};
use super::geometric_utils;

/// A point mass of a soft body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    /// Current position.
    pub pos: Array1<f32>,
    /// Position one tick ago; `pos - old_pos` is the Verlet velocity.
    pub old_pos: Array1<f32>,
    /// Smoothed position for consumers that draw the body.
    pub render_pos: Array1<f32>,
    /// Force accumulated for the next integration step.
    pub force: Array1<f32>,
    /// Bio-electric charge in `[0, 1]`.
    pub charge: f32,
}

impl Particle {
    /// Creates a particle at rest.
    pub fn new(x: f32, y: f32) -> Self {
        let pos = Array1::from_vec(vec![x, y]);
        Self {
            old_pos: pos.clone(),
            render_pos: pos.clone(),
            pos,
            force: Array1::zeros(2),
            charge: 0.0,
        }
    }

    /// Whether position and previous position are both finite.
    pub fn is_finite(&self) -> bool {
        geometric_utils::is_finite(&self.pos) && geometric_utils::is_finite(&self.old_pos)
    }

    /// Adds a force for the next step.
    pub fn apply_force(&mut self, fx: f32, fy: f32) {
        self.force[0] += fx;
        self.force[1] += fy;
    }
}

/// Elastic link between two particles of the same organism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spring {
    /// Index of the first particle.
    pub a: usize,
    /// Index of the second particle.
    pub b: usize,
    /// Length at build time.
    pub rest_length: f32,
    /// Plastic rest length that adapts under sustained strain.
    pub current_rest_length: f32,
    /// Fraction of the length error corrected per tick.
    pub stiffness: f32,
    /// Whether the spring contracts periodically.
    pub is_muscle: bool,
    /// Phase of the actuation wave at this spring.
    pub phase: f32,
    /// Relative deviation from `rest_length` measured in the last tick.
    pub strain: f32,
}

/// A physically simulated xenobot built from a [`Genome`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    /// Unique identifier within one ecosystem.
    pub id: usize,
    /// Genetic blueprint the body was compiled from.
    pub genome: Genome,
    /// Breeding pool, copied from the genome once at creation.
    pub species: SpeciesId,
    /// Point masses of the body.
    pub particles: Vec<Particle>,
    /// Links between the point masses.
    pub springs: Vec<Spring>,
    /// Center of mass of all finite particles.
    pub center_of_mass: Array1<f32>,
    /// Center of mass at creation.
    pub birth_pos: Array1<f32>,
    /// Cleared when energy runs out; dead organisms wait for eviction.
    pub alive: bool,
    /// Mean bio-electric charge of the body.
    pub total_charge: f32,
    /// Energy reserve.
    pub energy: f32,
    /// Ticks lived.
    pub age: u64,
}

impl Organism {
    /// Assembles an organism around a compiled body.
    ///
    /// `origin` is used as center of mass when the body has no particles;
    /// such organisms are never alive.
    pub fn new(
        id: usize,
        genome: Genome,
        particles: Vec<Particle>,
        springs: Vec<Spring>,
        origin: &Array1<f32>,
        energy: f32,
    ) -> Self {
        let center_of_mass = geometric_utils::centroid(particles.iter().map(|p| &p.pos))
            .unwrap_or_else(|| origin.clone());
        Self {
            id,
            species: genome.species,
            alive: !particles.is_empty(),
            genome,
            particles,
            springs,
            birth_pos: center_of_mass.clone(),
            center_of_mass,
            total_charge: 0.0,
            energy,
            age: 0,
        }
    }

    /// Checks if the organism is alive.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the body has any particles at all.
    pub fn is_viable(&self) -> bool {
        !self.particles.is_empty()
    }

    /// Whether any spring is a muscle.
    pub fn has_muscles(&self) -> bool {
        self.springs.iter().any(|s| s.is_muscle)
    }

    /// Net rightward displacement since birth, never negative.
    pub fn fitness(&self) -> f32 {
        let dx = self.center_of_mass[0] - self.birth_pos[0];
        if dx.is_finite() { dx.max(0.0) } else { 0.0 }
    }

    /// Recomputes center of mass and mean charge from finite particles.
    pub fn update_center_of_mass(&mut self) {
        if let Some(com) = geometric_utils::centroid(self.particles.iter().map(|p| &p.pos)) {
            self.center_of_mass = com;
        }
        let finite: Vec<f32> = self
            .particles
            .iter()
            .filter(|p| p.is_finite())
            .map(|p| p.charge)
            .collect();
        self.total_charge = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f32>() / finite.len() as f32
        };
    }

    /// Reduces the organism's energy, never below zero.
    pub fn consume_energy(&mut self, amount: f32) {
        self.energy = (self.energy - amount).max(0.0);
    }

    /// Increases the organism's energy up to a maximum.
    pub fn gain_energy(&mut self, amount: f32, max_energy: f32) {
        self.energy = (self.energy + amount).min(max_energy);
    }

    /// Marks the organism dead.
    pub fn kill(&mut self) {
        self.alive = false;
    }
}

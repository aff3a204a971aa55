//! Simulation parameters.
//!
//! Every recognised option lives in [`Params`]. Defaults are applied once via
//! [`Default`] (and `#[serde(default)]` when loading partial JSON), and
//! [`Params::validate`] rejects inconsistent values before an
//! [`Ecosystem`](super::ecosystem::Ecosystem) is built from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating [`Params`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A scalar option is NaN or infinite.
    #[error("option `{field}` must be finite")]
    NonFinite {
        /// Name of the offending option.
        field: &'static str,
    },
    /// An option lies outside its accepted range.
    #[error("option `{field}` is out of range: {reason}")]
    OutOfRange {
        /// Name of the offending option.
        field: &'static str,
        /// Human-readable description of the accepted range.
        reason: &'static str,
    },
}

/// Simulation parameters that control physics, metabolism and evolution.
///
/// Units: lengths in world units, forces in world units per second squared,
/// times in seconds unless the name says `ticks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seed for the simulation RNG. `None` draws one from OS entropy.
    pub seed: Option<u64>,

    // --- population ---
    /// Hard cap on the total number of organisms.
    pub population_size: usize,
    /// Hard cap on the number of organisms in one species pool.
    pub per_species_cap: usize,
    /// Number of breeding-isolated species created at startup.
    pub species_count: usize,
    /// Organisms per species in the initial population.
    pub initial_per_species: usize,
    /// Smallest size a species pool is grown to after a generation.
    pub min_viable_pool: usize,

    // --- world ---
    /// Width of the world (x extent).
    pub world_width: f32,
    /// Height of the world (y extent, floor at `y = world_height`).
    pub world_height: f32,
    /// Fixed physics timestep in seconds.
    pub fixed_dt: f32,
    /// Largest frame time accepted by the accumulator, in seconds.
    pub max_frame_time: f32,
    /// Ticks between two evolutionary steps.
    pub evolution_interval: u64,

    // --- body plan ---
    /// Side length of the square genome grid.
    pub grid_size: usize,
    /// Distance between neighbouring cells when a body is built.
    pub cell_spacing: f32,
    /// Maximum random offset applied to each particle at build time.
    pub build_jitter: f32,
    /// Maximum random offset of a newborn organism around its origin.
    pub spawn_scatter: f32,
    /// Spring stiffness when neither endpoint is a signaling cell.
    pub stiffness_base: f32,
    /// Spring stiffness when an endpoint is a signaling cell.
    pub stiffness_signaling: f32,
    /// Phase advance per grid column for muscle actuation.
    pub muscle_phase_step: f32,

    // --- integrator ---
    /// Downward acceleration.
    pub gravity: f32,
    /// Fraction of gravity cancelled by buoyancy in open water.
    pub buoyancy: f32,
    /// Height of the zone above the floor where buoyancy fades out.
    pub floor_zone: f32,
    /// Velocity lost per tick to the surrounding fluid (0..1).
    pub fluid_friction: f32,
    /// Relative contraction amplitude of muscle springs.
    pub muscle_strength: f32,
    /// Base angular frequency of muscle contraction (rad/s).
    pub muscle_speed: f32,
    /// Fraction of velocity kept (and reflected) on wall contact.
    pub wall_bounce: f32,
    /// Strain above which a spring's rest length adapts to its current length.
    pub plasticity_threshold: f32,
    /// Per-tick rate of structural plasticity.
    pub plasticity_rate: f32,
    /// Smoothing factor for render positions (1 = no smoothing).
    pub render_smoothing: f32,

    // --- field model ---
    /// Amplitude of the slow ambient current.
    pub current_strength: f32,
    /// Angular frequency of the ambient current (rad/s).
    pub current_frequency: f32,
    /// Amplitude of per-particle Brownian jitter.
    pub brownian_strength: f32,
    /// Distance from a wall inside which boundary repulsion acts.
    pub boundary_buffer: f32,
    /// Boundary repulsion at the wall itself.
    pub boundary_repulsion: f32,
    /// Peak forward force of the ciliary wave.
    pub cilia_strength: f32,
    /// Spatial frequency of the ciliary wave (rad per world unit).
    pub cilia_wavenumber: f32,
    /// Temporal frequency of the ciliary wave (rad/s).
    pub cilia_speed: f32,
    /// Pull towards the center of mass per unit distance.
    pub cohesion: f32,
    /// Fraction of bio-electric charge lost per tick.
    pub bio_decay: f32,
    /// Charge generated per unit spring strain.
    pub charge_gain: f32,
    /// Center-of-mass distance below which same-species organisms repel.
    pub same_species_radius: f32,
    /// Repulsion per unit overlap between same-species organisms.
    pub same_species_strength: f32,
    /// Center-of-mass distance below which different species repel.
    pub other_species_radius: f32,
    /// Repulsion per unit overlap between different species.
    pub other_species_strength: f32,

    // --- energy ---
    /// Energy of a newborn organism.
    pub initial_energy: f32,
    /// Upper bound on stored energy.
    pub max_energy: f32,
    /// Energy spent every tick just to stay alive.
    pub metabolic_cost: f32,
    /// Extra energy spent every tick while muscles are active.
    pub muscle_cost: f32,
    /// Energy required to be preferred as a parent.
    pub reproduction_energy: f32,
    /// Number of nutrient pellets kept in the world.
    pub nutrient_count: usize,
    /// Energy gained from one pellet.
    pub nutrient_energy: f32,
    /// Center-of-mass distance at which a pellet is eaten.
    pub feed_radius: f32,

    // --- evolution ---
    /// Individuals copied unchanged into the next generation per pool (1 or 2).
    pub elite_count: usize,
    /// Candidates sampled per tournament.
    pub tournament_size: usize,
    /// Lower bound of the random per-generation pool growth factor.
    pub growth_factor_min: f32,
    /// Upper bound of the random per-generation pool growth factor.
    pub growth_factor_max: f32,
    /// Probability that one grid cell is replaced by a random cell type.
    pub cell_mutation_rate: f32,
    /// Largest change applied to bio-electric memory by one mutation.
    pub memory_mutation_delta: f32,
    /// Probability of growing one new cell next to the existing body.
    pub growth_mutation_rate: f32,
    /// Parents closer than this average their origins for the child.
    pub origin_merge_radius: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: None,

            population_size: 40,
            per_species_cap: 12,
            species_count: 3,
            initial_per_species: 6,
            min_viable_pool: 2,

            world_width: 1200.0,
            world_height: 800.0,
            fixed_dt: 1.0 / 60.0,
            max_frame_time: 0.25,
            evolution_interval: 600,

            grid_size: 5,
            cell_spacing: 10.0,
            build_jitter: 0.5,
            spawn_scatter: 40.0,
            stiffness_base: 0.4,
            stiffness_signaling: 0.8,
            muscle_phase_step: 0.8,

            gravity: 120.0,
            buoyancy: 0.9,
            floor_zone: 60.0,
            fluid_friction: 0.04,
            muscle_strength: 0.15,
            muscle_speed: 4.0,
            wall_bounce: 0.5,
            plasticity_threshold: 0.1,
            plasticity_rate: 0.01,
            render_smoothing: 0.5,

            current_strength: 15.0,
            current_frequency: 0.2,
            brownian_strength: 20.0,
            boundary_buffer: 40.0,
            boundary_repulsion: 300.0,
            cilia_strength: 60.0,
            cilia_wavenumber: 0.15,
            cilia_speed: 3.0,
            cohesion: 2.0,
            bio_decay: 0.05,
            charge_gain: 0.5,
            same_species_radius: 50.0,
            same_species_strength: 1.0,
            other_species_radius: 150.0,
            other_species_strength: 4.0,

            initial_energy: 1.0,
            max_energy: 1.0,
            metabolic_cost: 0.0004,
            muscle_cost: 0.0002,
            reproduction_energy: 0.3,
            nutrient_count: 20,
            nutrient_energy: 0.25,
            feed_radius: 30.0,

            elite_count: 2,
            tournament_size: 4,
            growth_factor_min: 0.8,
            growth_factor_max: 1.5,
            cell_mutation_rate: 0.05,
            memory_mutation_delta: 0.1,
            growth_mutation_rate: 0.2,
            origin_merge_radius: 150.0,
        }
    }
}

impl Params {
    /// Checks every option for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("fixed_dt", self.fixed_dt),
            ("max_frame_time", self.max_frame_time),
            ("cell_spacing", self.cell_spacing),
            ("build_jitter", self.build_jitter),
            ("spawn_scatter", self.spawn_scatter),
            ("stiffness_base", self.stiffness_base),
            ("stiffness_signaling", self.stiffness_signaling),
            ("muscle_phase_step", self.muscle_phase_step),
            ("gravity", self.gravity),
            ("buoyancy", self.buoyancy),
            ("floor_zone", self.floor_zone),
            ("fluid_friction", self.fluid_friction),
            ("muscle_strength", self.muscle_strength),
            ("muscle_speed", self.muscle_speed),
            ("wall_bounce", self.wall_bounce),
            ("plasticity_threshold", self.plasticity_threshold),
            ("plasticity_rate", self.plasticity_rate),
            ("render_smoothing", self.render_smoothing),
            ("current_strength", self.current_strength),
            ("current_frequency", self.current_frequency),
            ("brownian_strength", self.brownian_strength),
            ("boundary_buffer", self.boundary_buffer),
            ("boundary_repulsion", self.boundary_repulsion),
            ("cilia_strength", self.cilia_strength),
            ("cilia_wavenumber", self.cilia_wavenumber),
            ("cilia_speed", self.cilia_speed),
            ("cohesion", self.cohesion),
            ("bio_decay", self.bio_decay),
            ("charge_gain", self.charge_gain),
            ("same_species_radius", self.same_species_radius),
            ("same_species_strength", self.same_species_strength),
            ("other_species_radius", self.other_species_radius),
            ("other_species_strength", self.other_species_strength),
            ("initial_energy", self.initial_energy),
            ("max_energy", self.max_energy),
            ("metabolic_cost", self.metabolic_cost),
            ("muscle_cost", self.muscle_cost),
            ("reproduction_energy", self.reproduction_energy),
            ("nutrient_energy", self.nutrient_energy),
            ("feed_radius", self.feed_radius),
            ("growth_factor_min", self.growth_factor_min),
            ("growth_factor_max", self.growth_factor_max),
            ("cell_mutation_rate", self.cell_mutation_rate),
            ("memory_mutation_delta", self.memory_mutation_delta),
            ("growth_mutation_rate", self.growth_mutation_rate),
            ("origin_merge_radius", self.origin_merge_radius),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        let fractions = [
            ("buoyancy", self.buoyancy),
            ("fluid_friction", self.fluid_friction),
            ("wall_bounce", self.wall_bounce),
            ("plasticity_rate", self.plasticity_rate),
            ("bio_decay", self.bio_decay),
            ("stiffness_base", self.stiffness_base),
            ("stiffness_signaling", self.stiffness_signaling),
            ("cell_mutation_rate", self.cell_mutation_rate),
            ("growth_mutation_rate", self.growth_mutation_rate),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must lie in [0, 1]",
                });
            }
        }
        if !(self.render_smoothing > 0.0 && self.render_smoothing <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "render_smoothing",
                reason: "must lie in (0, 1]",
            });
        }

        let positives = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("fixed_dt", self.fixed_dt),
            ("cell_spacing", self.cell_spacing),
            ("max_energy", self.max_energy),
        ];
        for (field, value) in positives {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be positive",
                });
            }
        }

        let non_negatives = [
            ("gravity", self.gravity),
            ("floor_zone", self.floor_zone),
            ("build_jitter", self.build_jitter),
            ("spawn_scatter", self.spawn_scatter),
            ("muscle_strength", self.muscle_strength),
            ("muscle_speed", self.muscle_speed),
            ("plasticity_threshold", self.plasticity_threshold),
            ("current_strength", self.current_strength),
            ("brownian_strength", self.brownian_strength),
            ("boundary_buffer", self.boundary_buffer),
            ("boundary_repulsion", self.boundary_repulsion),
            ("cilia_strength", self.cilia_strength),
            ("cohesion", self.cohesion),
            ("charge_gain", self.charge_gain),
            ("same_species_radius", self.same_species_radius),
            ("same_species_strength", self.same_species_strength),
            ("other_species_radius", self.other_species_radius),
            ("other_species_strength", self.other_species_strength),
            ("metabolic_cost", self.metabolic_cost),
            ("muscle_cost", self.muscle_cost),
            ("reproduction_energy", self.reproduction_energy),
            ("nutrient_energy", self.nutrient_energy),
            ("feed_radius", self.feed_radius),
            ("memory_mutation_delta", self.memory_mutation_delta),
            ("origin_merge_radius", self.origin_merge_radius),
        ];
        for (field, value) in non_negatives {
            if value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        if self.max_frame_time < self.fixed_dt {
            return Err(ConfigError::OutOfRange {
                field: "max_frame_time",
                reason: "must be at least fixed_dt",
            });
        }
        if self.initial_energy <= 0.0 || self.initial_energy > self.max_energy {
            return Err(ConfigError::OutOfRange {
                field: "initial_energy",
                reason: "must lie in (0, max_energy]",
            });
        }
        if self.population_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "population_size",
                reason: "must be at least 1",
            });
        }
        if self.species_count == 0 || self.species_count > self.population_size {
            return Err(ConfigError::OutOfRange {
                field: "species_count",
                reason: "must lie in [1, population_size]",
            });
        }
        if self.species_count > usize::from(u16::MAX) {
            return Err(ConfigError::OutOfRange {
                field: "species_count",
                reason: "must fit a 16-bit species id",
            });
        }
        if self.min_viable_pool == 0 || self.min_viable_pool > self.per_species_cap {
            return Err(ConfigError::OutOfRange {
                field: "min_viable_pool",
                reason: "must lie in [1, per_species_cap]",
            });
        }
        if !(1..=2).contains(&self.elite_count) {
            return Err(ConfigError::OutOfRange {
                field: "elite_count",
                reason: "must be 1 or 2",
            });
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tournament_size",
                reason: "must be at least 1",
            });
        }
        if self.evolution_interval == 0 {
            return Err(ConfigError::OutOfRange {
                field: "evolution_interval",
                reason: "must be at least 1",
            });
        }
        if self.grid_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "grid_size",
                reason: "must be at least 1",
            });
        }
        if self.growth_factor_min <= 0.0 || self.growth_factor_min > self.growth_factor_max {
            return Err(ConfigError::OutOfRange {
                field: "growth_factor_min",
                reason: "must be positive and not exceed growth_factor_max",
            });
        }

        Ok(())
    }

    /// Velocity retained per tick (`1 - fluid_friction`).
    pub fn damping(&self) -> f32 {
        1.0 - self.fluid_friction
    }
}

//! Environmental and inter-organism forces, plus bio-electric signaling.
//!
//! Per particle and tick: gravity against depth-dependent buoyancy, a slow
//! ambient current, Brownian jitter, soft repulsion near the walls, a ciliary
//! propulsion wave and a cohesion pull towards the body's center of mass.
//! Between organisms: linear repulsion within a species-dependent radius,
//! shared evenly by all particles of the pushed organism.

use ndarray::Array1;
use rand::Rng;

use super::genome::SpeciesId;
use super::geometric_utils;
use super::organism::Organism;
use super::params::Params;
use super::spatial::SpatialIndex;

/// Read-only view of an organism used for social forces.
#[derive(Debug, Clone)]
pub struct BodySummary {
    /// Organism identifier.
    pub id: usize,
    /// Breeding pool of the organism.
    pub species: SpeciesId,
    /// Center of mass at the start of the tick.
    pub center_of_mass: Array1<f32>,
}

/// Per-tick snapshot of all living organisms' centers of mass.
pub struct SocialField {
    bodies: Vec<BodySummary>,
    index: SpatialIndex,
    radius: f32,
}

impl SocialField {
    /// Captures the living, viable organisms of `organisms`.
    pub fn build(organisms: &[Organism], params: &Params) -> Self {
        let bodies: Vec<BodySummary> = organisms
            .iter()
            .filter(|o| o.is_alive() && o.is_viable())
            .map(|o| BodySummary {
                id: o.id,
                species: o.species,
                center_of_mass: o.center_of_mass.clone(),
            })
            .collect();
        let index = SpatialIndex::build(&bodies, |b| Some(b.center_of_mass.to_vec()));
        Self {
            bodies,
            index,
            radius: params.same_species_radius.max(params.other_species_radius),
        }
    }

    /// Bodies whose center of mass lies within the larger social radius.
    pub fn neighbours<'a>(&'a self, pos: &Array1<f32>) -> impl Iterator<Item = &'a BodySummary> {
        self.index
            .query(pos, self.radius)
            .into_iter()
            .map(move |(_, idx)| &self.bodies[idx])
    }

    /// Number of bodies captured.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether no body was captured.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Accumulates this tick's forces on every particle of `organism` and
/// updates its bio-electric charge.
pub fn apply_forces<R: Rng + ?Sized>(
    organism: &mut Organism,
    social: &SocialField,
    sim_time: f32,
    params: &Params,
    rng: &mut R,
) {
    if !organism.is_alive() || !organism.is_viable() {
        return;
    }

    update_charge(organism, params);

    let com = organism.center_of_mass.clone();
    let (width, height) = geometric_utils::extent(organism.particles.iter().map(|p| &p.pos));
    let horizontal = width >= height;
    let (sx, sy) = social_force(organism, social, params);

    for particle in &mut organism.particles {
        if !particle.is_finite() {
            continue;
        }
        let x = particle.pos[0];
        let y = particle.pos[1];

        // Buoyancy fades out close to the floor.
        let depth = if params.floor_zone > 0.0 {
            ((params.world_height - y) / params.floor_zone).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let mut fy = params.gravity * (1.0 - params.buoyancy * depth);
        let mut fx = params.current_strength * (sim_time * params.current_frequency + y * 0.01).sin();

        if params.brownian_strength > 0.0 {
            fx += rng.random_range(-1.0f32..1.0) * params.brownian_strength;
            fy += rng.random_range(-1.0f32..1.0) * params.brownian_strength;
        }

        let (bx, by) = boundary_force(x, y, params);
        fx += bx;
        fy += by;

        let along = if horizontal { x - com[0] } else { y - com[1] };
        let wave = 0.5 * (1.0 + (along * params.cilia_wavenumber - sim_time * params.cilia_speed).sin());
        fx += params.cilia_strength * wave * (0.5 + particle.charge);

        fx += (com[0] - x) * params.cohesion;
        fy += (com[1] - y) * params.cohesion;

        particle.apply_force(fx + sx, fy + sy);
    }
}

/// Decays charge geometrically, then adds charge from spring strain.
pub fn update_charge(organism: &mut Organism, params: &Params) {
    let keep = 1.0 - params.bio_decay;
    for particle in &mut organism.particles {
        particle.charge *= keep;
    }
    for spring in &organism.springs {
        if !spring.strain.is_finite() {
            continue;
        }
        let gain = spring.strain * params.charge_gain * 0.5;
        for idx in [spring.a, spring.b] {
            if let Some(p) = organism.particles.get_mut(idx) {
                p.charge += gain;
            }
        }
    }
    for particle in &mut organism.particles {
        particle.charge = if particle.charge.is_finite() {
            particle.charge.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}

/// Repulsion ramping linearly from zero at `boundary_buffer` to
/// `boundary_repulsion` at the wall.
fn boundary_force(x: f32, y: f32, params: &Params) -> (f32, f32) {
    let buffer = params.boundary_buffer;
    if buffer <= 0.0 {
        return (0.0, 0.0);
    }
    let push = |gap: f32| {
        if gap < buffer {
            params.boundary_repulsion * (buffer - gap.max(0.0)) / buffer
        } else {
            0.0
        }
    };
    let fx = push(x) - push(params.world_width - x);
    let fy = push(y) - push(params.world_height - y);
    (fx, fy)
}

/// Total social force on `organism`, already divided among its particles.
fn social_force(organism: &Organism, social: &SocialField, params: &Params) -> (f32, f32) {
    let finite = organism.particles.iter().filter(|p| p.is_finite()).count();
    if finite == 0 {
        return (0.0, 0.0);
    }
    let com = &organism.center_of_mass;

    let mut fx = 0.0;
    let mut fy = 0.0;
    for other in social.neighbours(com) {
        if other.id == organism.id {
            continue;
        }
        let (radius, strength) = if other.species == organism.species {
            (params.same_species_radius, params.same_species_strength)
        } else {
            (params.other_species_radius, params.other_species_strength)
        };
        let dist = geometric_utils::distance(com, &other.center_of_mass);
        if !dist.is_finite() || dist >= radius {
            continue;
        }
        let magnitude = strength * (radius - dist);
        let (dx, dy) = if dist > 1e-4 {
            (
                (com[0] - other.center_of_mass[0]) / dist,
                (com[1] - other.center_of_mass[1]) / dist,
            )
        } else if organism.id < other.id {
            (-1.0, 0.0)
        } else {
            (1.0, 0.0)
        };
        fx += dx * magnitude;
        fy += dy * magnitude;
    }

    let n = finite as f32;
    (fx / n, fy / n)
}

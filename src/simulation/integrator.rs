//! Position-based (Verlet) integration of one organism's particle graph.
//!
//! One call to [`step`] moves every particle by its Verlet velocity plus the
//! accumulated force, resolves each spring once, applies rest-length
//! plasticity and finally clamps the body into the world.
//!
//! The spring solve is a single proportional correction per spring and tick,
//! not an iterative relaxation. Bodies are therefore soft and slightly
//! stretchy; raising the stiffness options is the way to get firmer bodies.

use ndarray::Array1;
use tracing::warn;

use super::organism::{Organism, Particle, Spring};
use super::params::Params;

/// Springs shorter than this are skipped for the tick.
const MIN_SPRING_LENGTH: f32 = 1e-4;
/// Share of the plasticity rate used when relaxing back to the original length.
const FORGET_FACTOR: f32 = 0.5;
/// Plastic rest lengths stay within this factor of the original length.
const PLASTIC_RANGE: (f32, f32) = (0.5, 1.5);
/// How strongly body charge speeds up muscle contraction.
const CHARGE_FREQUENCY_GAIN: f32 = 1.0;

/// Advances `organism` by one tick of length `dt` at simulation time `sim_time`.
///
/// Dead and particle-less organisms are left untouched.
pub fn step(organism: &mut Organism, sim_time: f32, dt: f32, params: &Params) {
    if !organism.is_alive() || !organism.is_viable() {
        return;
    }

    let damping = params.damping();
    let com = organism.center_of_mass.clone();
    let mut reset = 0usize;
    for particle in &mut organism.particles {
        if !integrate(particle, &com, damping, dt) {
            reset += 1;
        }
    }
    if reset > 0 {
        warn!(
            organism = organism.id,
            particles = reset,
            "skipped integration of particles with non-finite state"
        );
    }

    let memory = organism.genome.bio_electric_memory;
    for spring in &mut organism.springs {
        solve_spring(spring, &mut organism.particles, sim_time, memory, params);
    }

    for particle in &mut organism.particles {
        constrain(particle, params);
        smooth_render(particle, params.render_smoothing);
    }

    organism.update_center_of_mass();
}

/// Verlet update of a single particle.
///
/// Returns `false` when the particle's state or the result is not finite; the
/// particle is then put back to its last finite position, or onto the body's
/// center of mass `com` if it has none, with zero velocity.
fn integrate(particle: &mut Particle, com: &Array1<f32>, damping: f32, dt: f32) -> bool {
    let fx = if particle.force[0].is_finite() { particle.force[0] } else { 0.0 };
    let fy = if particle.force[1].is_finite() { particle.force[1] } else { 0.0 };
    particle.force.fill(0.0);

    if !particle.is_finite() {
        if particle.old_pos.iter().all(|v| v.is_finite()) {
            particle.pos.assign(&particle.old_pos);
        } else if particle.pos.iter().all(|v| v.is_finite()) {
            particle.old_pos.assign(&particle.pos);
        } else if com.iter().all(|v| v.is_finite()) {
            particle.pos.assign(com);
            particle.old_pos.assign(com);
            particle.render_pos.assign(com);
        }
        return false;
    }

    let nx = particle.pos[0] + (particle.pos[0] - particle.old_pos[0]) * damping + fx * dt * dt;
    let ny = particle.pos[1] + (particle.pos[1] - particle.old_pos[1]) * damping + fy * dt * dt;
    if !(nx.is_finite() && ny.is_finite()) {
        particle.old_pos.assign(&particle.pos);
        return false;
    }

    particle.old_pos.assign(&particle.pos);
    particle.pos[0] = nx;
    particle.pos[1] = ny;
    true
}

/// Angular frequency of muscle contraction at the given local charge.
pub fn muscle_frequency(charge: f32, params: &Params) -> f32 {
    params.muscle_speed * (1.0 + CHARGE_FREQUENCY_GAIN * charge.clamp(0.0, 1.0))
}

/// Single-pass elastic correction of one spring plus plasticity.
fn solve_spring(
    spring: &mut Spring,
    particles: &mut [Particle],
    sim_time: f32,
    memory: f32,
    params: &Params,
) {
    let (a, b) = (spring.a, spring.b);
    if a == b || a >= particles.len() || b >= particles.len() {
        return;
    }
    if !particles[a].is_finite() || !particles[b].is_finite() {
        return;
    }

    let dx = particles[b].pos[0] - particles[a].pos[0];
    let dy = particles[b].pos[1] - particles[a].pos[1];
    let dist = (dx * dx + dy * dy).sqrt();
    if !dist.is_finite() || dist < MIN_SPRING_LENGTH {
        return;
    }

    let target = if spring.is_muscle {
        let charge = (particles[a].charge + particles[b].charge) / 2.0;
        let frequency = muscle_frequency(charge, params);
        spring.current_rest_length
            * (1.0 + params.muscle_strength * (sim_time * frequency + spring.phase).sin())
    } else {
        spring.current_rest_length
    };

    let correction = (dist - target) / dist * 0.5 * spring.stiffness;
    let ox = dx * correction;
    let oy = dy * correction;
    particles[a].pos[0] += ox;
    particles[a].pos[1] += oy;
    particles[b].pos[0] -= ox;
    particles[b].pos[1] -= oy;

    if spring.rest_length <= MIN_SPRING_LENGTH {
        spring.strain = 0.0;
        return;
    }
    spring.strain = (dist - spring.rest_length).abs() / spring.rest_length;

    // Sustained stretch is learned, otherwise the body slowly forgets it.
    let local_strain = (dist - spring.current_rest_length).abs() / spring.current_rest_length;
    if local_strain > params.plasticity_threshold {
        spring.current_rest_length += (dist - spring.current_rest_length) * params.plasticity_rate;
    } else {
        let forget = params.plasticity_rate * FORGET_FACTOR * (1.0 - memory);
        spring.current_rest_length += (spring.rest_length - spring.current_rest_length) * forget;
    }
    spring.current_rest_length = spring.current_rest_length.clamp(
        spring.rest_length * PLASTIC_RANGE.0,
        spring.rest_length * PLASTIC_RANGE.1,
    );
}

/// Hard clamps at the world edges.
///
/// Side walls and the ceiling reflect part of the velocity; the floor absorbs
/// all vertical motion.
fn constrain(particle: &mut Particle, params: &Params) {
    if !particle.is_finite() {
        return;
    }
    let bounce = params.wall_bounce;

    let x = particle.pos[0];
    if x < 0.0 || x > params.world_width {
        let vx = x - particle.old_pos[0];
        let clamped = x.clamp(0.0, params.world_width);
        particle.pos[0] = clamped;
        particle.old_pos[0] = clamped + vx * bounce;
    }

    let y = particle.pos[1];
    if y < 0.0 {
        let vy = y - particle.old_pos[1];
        particle.pos[1] = 0.0;
        particle.old_pos[1] = vy * bounce;
    } else if y > params.world_height {
        particle.pos[1] = params.world_height;
        particle.old_pos[1] = params.world_height;
    }
}

fn smooth_render(particle: &mut Particle, smoothing: f32) {
    if !particle.is_finite() {
        return;
    }
    if !particle.render_pos.iter().all(|v| v.is_finite()) {
        particle.render_pos.assign(&particle.pos);
        return;
    }
    for i in 0..2 {
        particle.render_pos[i] += (particle.pos[i] - particle.render_pos[i]) * smoothing;
    }
}

//! Compiles a [`Genome`] into a particle/spring graph.

use ndarray::{Array1, Array2};
use rand::Rng;

use super::genome::{CellType, Genome};
use super::organism::{Organism, Particle, Spring};
use super::params::Params;

/// Offsets of the four forward neighbours: right, down, down-right, down-left.
const FORWARD_NEIGHBOURS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Builds organisms from genomes.
#[derive(Debug, Clone, Copy)]
pub struct BodyBuilder<'a> {
    params: &'a Params,
}

impl<'a> BodyBuilder<'a> {
    /// Creates a builder using the given parameters.
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    /// Compiles `genome` into an organism centred on `(origin_x, origin_y)`.
    ///
    /// One particle per tissue cell, jittered slightly off the lattice; one
    /// spring per pair of forward neighbours. An all-empty grid yields an
    /// organism with no particles, which is never alive.
    pub fn build<R: Rng + ?Sized>(
        &self,
        id: usize,
        genome: Genome,
        origin_x: f32,
        origin_y: f32,
        rng: &mut R,
    ) -> Organism {
        let params = self.params;
        let grid = genome.grid();
        let (rows, cols) = grid.dim();
        let half_w = (cols as f32 - 1.0) / 2.0;
        let half_h = (rows as f32 - 1.0) / 2.0;

        let mut particles = Vec::new();
        let mut index: Array2<Option<usize>> = Array2::from_elem((rows, cols), None);

        for ((r, c), cell) in grid.indexed_iter() {
            if !cell.is_tissue() {
                continue;
            }
            let x = origin_x + (c as f32 - half_w) * params.cell_spacing + jitter(params, rng);
            let y = origin_y + (r as f32 - half_h) * params.cell_spacing + jitter(params, rng);
            index[(r, c)] = Some(particles.len());
            particles.push(Particle::new(x, y));
        }

        let mut springs = Vec::new();
        for ((r, c), cell) in grid.indexed_iter() {
            let Some(a) = index[(r, c)] else { continue };
            for (dr, dc) in FORWARD_NEIGHBOURS {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if nr >= rows || nc >= cols {
                    continue;
                }
                let Some(b) = index[(nr, nc)] else { continue };
                let other = grid[(nr, nc)];

                let dx = particles[b].pos[0] - particles[a].pos[0];
                let dy = particles[b].pos[1] - particles[a].pos[1];
                let rest_length = (dx * dx + dy * dy).sqrt();

                let signaling = *cell == CellType::Signaling || other == CellType::Signaling;
                springs.push(Spring {
                    a,
                    b,
                    rest_length,
                    current_rest_length: rest_length,
                    stiffness: if signaling {
                        params.stiffness_signaling
                    } else {
                        params.stiffness_base
                    },
                    is_muscle: *cell == CellType::Actuator || other == CellType::Actuator,
                    phase: (c + nc) as f32 / 2.0 * params.muscle_phase_step,
                    strain: 0.0,
                });
            }
        }

        let origin = Array1::from_vec(vec![origin_x, origin_y]);
        Organism::new(id, genome, particles, springs, &origin, params.initial_energy)
    }
}

fn jitter<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> f32 {
    if params.build_jitter > 0.0 {
        rng.random_range(-params.build_jitter..params.build_jitter)
    } else {
        0.0
    }
}

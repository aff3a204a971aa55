//! Nutrient pellets that organisms can absorb for energy.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::params::Params;

/// A nutrient pellet floating in the world.
///
/// When the center of mass of a living organism comes within `feed_radius`
/// of a pellet, the organism gains its energy and the pellet is used up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nutrient {
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Energy value remaining.
    pub energy: f32,
}

impl Nutrient {
    /// Creates a new pellet at a random position inside the world, away from
    /// the walls.
    pub fn new_random<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Self {
        let margin_x = params.boundary_buffer.min(params.world_width / 4.0);
        let margin_y = params.boundary_buffer.min(params.world_height / 4.0);
        let x = margin_x + rng.random::<f32>() * (params.world_width - 2.0 * margin_x);
        let y = margin_y + rng.random::<f32>() * (params.world_height - 2.0 * margin_y);
        Self {
            pos: Array1::from_vec(vec![x, y]),
            energy: params.nutrient_energy,
        }
    }

    /// Checks if this pellet has been consumed.
    pub fn is_consumed(&self) -> bool {
        self.energy <= 0.0
    }

    /// Marks this pellet as consumed and returns the energy it held.
    pub fn consume(&mut self) -> f32 {
        let energy = self.energy.max(0.0);
        self.energy = 0.0;
        energy
    }
}

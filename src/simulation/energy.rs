//! Metabolic bookkeeping: energy decay, feeding, death and reproduction
//! eligibility.

use tracing::trace;

use super::nutrient::Nutrient;
use super::organism::Organism;
use super::params::Params;
use super::spatial::SpatialIndex;

/// Charges one tick of metabolism to `organism`.
///
/// Energy drops by `metabolic_cost`, plus `muscle_cost` when the body has
/// active muscles, and never goes below zero. An organism at zero energy is
/// marked dead. Dead organisms are left untouched.
pub fn tick(organism: &mut Organism, params: &Params) {
    if !organism.is_alive() {
        return;
    }

    let mut cost = params.metabolic_cost;
    if params.muscle_strength > 0.0 && organism.has_muscles() {
        cost += params.muscle_cost;
    }
    organism.consume_energy(cost);
    organism.age += 1;

    if organism.energy <= 0.0 {
        organism.energy = 0.0;
        organism.kill();
        trace!(organism = organism.id, age = organism.age, "organism starved");
    }
}

/// Adds `amount` of energy to a living organism, capped at `max_energy`.
pub fn feed(organism: &mut Organism, amount: f32, params: &Params) {
    if organism.is_alive() && amount > 0.0 {
        organism.gain_energy(amount, params.max_energy);
    }
}

/// Whether an organism is preferred as a parent.
pub fn can_reproduce(organism: &Organism, params: &Params) -> bool {
    organism.is_alive() && organism.energy >= params.reproduction_energy
}

/// Lets organisms absorb nearby pellets.
///
/// Organisms are visited in index order, so the first one in range wins a
/// contested pellet. Returns the number of pellets eaten.
pub fn feed_all(organisms: &mut [Organism], nutrients: &mut [Nutrient], params: &Params) -> usize {
    if nutrients.is_empty() {
        return 0;
    }
    let index = SpatialIndex::build(nutrients, |n| {
        (!n.is_consumed()).then(|| n.pos.to_vec())
    });

    let mut eaten = 0;
    for organism in organisms.iter_mut() {
        if !organism.is_alive() || !organism.is_viable() {
            continue;
        }
        for (_, idx) in index.query(&organism.center_of_mass, params.feed_radius) {
            let pellet = &mut nutrients[idx];
            if pellet.is_consumed() {
                continue;
            }
            let energy = pellet.consume();
            feed(organism, energy, params);
            eaten += 1;
        }
    }
    eaten
}
